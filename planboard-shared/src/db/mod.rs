/// Database layer for Planboard
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Schema migration runner (SQL files live in `migrations/` at the workspace root)
///
/// Models are in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
