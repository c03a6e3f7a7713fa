//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (name, sql_content), applied in order.
//!
//! IMPORTANT: When adding a new migration:
//! 1. Create the SQL file: NNN_description.sql in the matching directory
//! 2. Add an entry to the list below, in order

/// Migrations for the local storage database (pamomo.duckdb)
pub const STORAGE_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("storage/000_migrations.sql")),
    ("001_local_storage.sql", include_str!("storage/001_local_storage.sql")),
];

/// Migrations for the event log database (logs.duckdb)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("logs/000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("logs/001_initial_schema.sql")),
];
