/// Database connection management and schema creation
pub mod database;

/// Application settings loaded from environment variables
pub mod settings;

pub use settings::AppConfig;
