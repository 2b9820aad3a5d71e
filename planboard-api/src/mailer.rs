/// Outgoing email
///
/// Verification, password reset and welcome emails go through a [`Mailer`].
/// With `MAIL_API_URL` configured, messages are POSTed as JSON to an HTTP
/// mail provider:
///
/// ```json
/// { "from": "...", "to": "...", "subject": "...", "text": "..." }
/// ```
///
/// Without it, messages are written to the log so local development works
/// without a provider.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail provider rejected the message with status {0}")]
    Rejected(u16),
}

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Clone)]
enum Transport {
    Http {
        client: reqwest::Client,
        url: String,
        api_key: Option<String>,
    },
    Log,
    Memory(Arc<Mutex<Vec<Email>>>),
}

#[derive(Clone)]
pub struct Mailer {
    transport: Transport,
    from: String,
    frontend_url: String,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match &self.transport {
            Transport::Http { url, .. } => format!("http({})", url),
            Transport::Log => "log".to_string(),
            Transport::Memory(_) => "memory".to_string(),
        };
        f.debug_struct("Mailer")
            .field("transport", &transport)
            .field("from", &self.from)
            .finish()
    }
}

impl Mailer {
    pub fn from_config(config: &MailConfig, frontend_url: &str) -> anyhow::Result<Self> {
        let transport = match &config.api_url {
            Some(url) => Transport::Http {
                client: reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()?,
                url: url.clone(),
                api_key: config.api_key.clone(),
            },
            None => Transport::Log,
        };

        Ok(Self {
            transport,
            from: config.from.clone(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Mailer that keeps messages in memory, for tests
    pub fn memory(frontend_url: &str) -> Self {
        Self {
            transport: Transport::Memory(Arc::new(Mutex::new(Vec::new()))),
            from: "Planboard <test@planboard.local>".to_string(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Messages captured by a [`Mailer::memory`] mailer
    pub fn sent(&self) -> Vec<Email> {
        match &self.transport {
            Transport::Memory(outbox) => outbox.lock().map(|o| o.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub async fn send(&self, email: Email) -> Result<(), MailError> {
        match &self.transport {
            Transport::Http {
                client,
                url,
                api_key,
            } => {
                let mut request = client.post(url).json(&email);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }

                let response = request.send().await?;
                if !response.status().is_success() {
                    return Err(MailError::Rejected(response.status().as_u16()));
                }

                tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
            }
            Transport::Log => {
                tracing::info!(
                    to = %email.to,
                    subject = %email.subject,
                    body = %email.text,
                    "Mail provider not configured, logging email"
                );
            }
            Transport::Memory(outbox) => {
                if let Ok(mut outbox) = outbox.lock() {
                    outbox.push(email);
                }
            }
        }

        Ok(())
    }

    /// Sends and logs failures instead of returning them
    ///
    /// Used where the user-facing action already succeeded and the email can
    /// be requested again.
    pub async fn send_logged(&self, email: Email) {
        let to = email.to.clone();
        if let Err(e) = self.send(email).await {
            tracing::error!(to = %to, error = %e, "Failed to send email");
        }
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}{}?token={}", self.frontend_url, path, token)
    }

    pub fn verification_email(&self, to: &str, name: &str, token: &str) -> Email {
        Email {
            from: self.from.clone(),
            to: to.to_string(),
            subject: "Verify your Planboard email".to_string(),
            text: format!(
                "Hi {},\n\nConfirm your email address by opening the link below. \
                 It expires in 24 hours.\n\n{}\n",
                name,
                self.link("/verify-email", token)
            ),
        }
    }

    pub fn password_reset_email(&self, to: &str, token: &str) -> Email {
        Email {
            from: self.from.clone(),
            to: to.to_string(),
            subject: "Reset your Planboard password".to_string(),
            text: format!(
                "Someone asked to reset the password for this account. \
                 Open the link below within one hour to choose a new one.\n\n{}\n\n\
                 If this wasn't you, ignore this email.\n",
                self.link("/reset-password", token)
            ),
        }
    }

    /// Sent to accounts created by an admin, with their temporary password
    pub fn welcome_email(&self, to: &str, username: &str, role: &str, password: &str) -> Email {
        Email {
            from: self.from.clone(),
            to: to.to_string(),
            subject: "Your Planboard account".to_string(),
            text: format!(
                "An account with the {} role was created for you.\n\n\
                 Username: {}\nTemporary password: {}\n\n\
                 Sign in at {}/sign-in and choose a new password.\n",
                role, username, password, self.frontend_url
            ),
        }
    }
}
