pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;
pub mod seed;

pub use migrations::{MigrationError, MigrationRunner};
pub use models::{NewUser, User, UserRole};
pub use repository::{PgUserRepository, UserRepository};
