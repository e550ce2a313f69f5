/// Database configuration and connection management
pub mod database;

/// Seed configuration (catalog, initial users, settings) loaded from a TOML file
pub mod seed;
