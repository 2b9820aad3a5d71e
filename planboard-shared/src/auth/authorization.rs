/// Role-gated permission checks
///
/// Every check is a pure function of the caller's [`AuthContext`] and the
/// resource, so handlers load the resource first and then ask here.
///
/// # Rules
///
/// | Resource | Create | Update | Delete |
/// |----------|--------|--------|--------|
/// | Project | Manager+ | owner or Admin+ | owner or Admin+ |
/// | Task | anyone | author, assignee or Manager+ | author or Manager+ |
/// | Team | Manager+ | Manager+ | Admin+ |
/// | Team member / project link | Manager+ | - | Manager+ |
/// | User | per [`UserRole::can_create`] | per [`UserRole::can_manage`] | per [`UserRole::can_manage`] |
///
/// # Example
///
/// ```
/// use planboard_shared::auth::authorization::require_role;
/// use planboard_shared::auth::context::AuthContext;
/// use planboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let dev = AuthContext::new(Uuid::new_v4(), "dev@example.com", UserRole::Developer);
/// assert!(require_role(&dev, UserRole::Manager).is_err());
/// ```

use uuid::Uuid;

use super::context::AuthContext;
use crate::models::{project::Project, task::Task, user::UserRole};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: UserRole,
        actual: UserRole,
    },

    #[error("Role {actor} cannot create {target} accounts")]
    CannotCreate { actor: UserRole, target: UserRole },

    #[error("Role {actor} cannot manage {target} accounts")]
    CannotManage { actor: UserRole, target: UserRole },

    #[error("You cannot perform this action on your own account")]
    SelfAction,

    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

pub fn require_role(auth: &AuthContext, required: UserRole) -> Result<(), AuthzError> {
    if !auth.role.has_permission(&required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        });
    }

    Ok(())
}

/// Passes for the owner, otherwise requires `role`
pub fn require_owner_or_role(
    auth: &AuthContext,
    owner_id: Uuid,
    role: UserRole,
) -> Result<(), AuthzError> {
    if auth.is(owner_id) || auth.role.has_permission(&role) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

pub fn require_can_create(auth: &AuthContext, target: UserRole) -> Result<(), AuthzError> {
    if !auth.role.can_create(&target) {
        return Err(AuthzError::CannotCreate {
            actor: auth.role,
            target,
        });
    }

    Ok(())
}

/// Block, delete or edit another account
///
/// Nobody manages their own account through these routes; `PATCH /users/me`
/// covers self-service edits.
pub fn require_can_manage(
    auth: &AuthContext,
    target_id: Uuid,
    target_role: UserRole,
) -> Result<(), AuthzError> {
    if auth.is(target_id) {
        return Err(AuthzError::SelfAction);
    }

    if !auth.role.can_manage(&target_role) {
        return Err(AuthzError::CannotManage {
            actor: auth.role,
            target: target_role,
        });
    }

    Ok(())
}

pub fn can_edit_project(auth: &AuthContext, project: &Project) -> Result<(), AuthzError> {
    require_owner_or_role(auth, project.owner_id, UserRole::Admin)
}

/// Update fields or move the card on the board
pub fn can_edit_task(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if task.is_involved(auth.user_id) || auth.role.has_permission(&UserRole::Manager) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

pub fn can_delete_task(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    require_owner_or_role(auth, task.author_id, UserRole::Manager)
}
