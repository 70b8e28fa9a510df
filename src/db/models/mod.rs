pub mod migration;

pub use migration::{AppliedMigrationRow, MigrationRecord};
