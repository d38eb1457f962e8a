pub mod cli;
pub mod config;
pub mod db;
pub mod episode;
pub mod input;
pub mod parse;
pub mod process;
pub mod record;
pub mod schema;
pub mod segment;
pub mod split;
pub mod status;
pub mod store;
pub mod summary;

#[derive(Debug)]
pub enum TeslalogError {
    Database(rusqlite::Error),
    Io(std::io::Error),
    Config(String),
}

impl std::fmt::Display for TeslalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeslalogError::Database(e) => write!(f, "database: {e}"),
            TeslalogError::Io(e) => write!(f, "io: {e}"),
            TeslalogError::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for TeslalogError {}

impl From<rusqlite::Error> for TeslalogError {
    fn from(e: rusqlite::Error) -> Self {
        TeslalogError::Database(e)
    }
}

impl From<std::io::Error> for TeslalogError {
    fn from(e: std::io::Error) -> Self {
        TeslalogError::Io(e)
    }
}

impl From<rusqlite_migration::Error> for TeslalogError {
    fn from(e: rusqlite_migration::Error) -> Self {
        match e {
            rusqlite_migration::Error::RusqliteError { query: _, err } => TeslalogError::Database(err),
            other => TeslalogError::Config(format!("migration: {other}")),
        }
    }
}

pub fn schema_migrations() -> &'static rusqlite_migration::Migrations<'static> {
    &schema::MIGRATIONS
}
