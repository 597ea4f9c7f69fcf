//! SQLite persistence: initialization, migrations, and the repository.
//!
//! Monetary values are stored as canonical decimal strings; see `repo` for
//! the lossy-with-warning parse-back convention.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
