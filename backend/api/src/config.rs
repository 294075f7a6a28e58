//! Application configuration loaded from environment variables.

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite journal database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Divisor for the students-impacted estimate, in whole dollars
    pub dollars_per_student: i64,
    /// Seed the demo fixture into an empty journal on startup
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./equilearn.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            dollars_per_student: env_var("DOLLARS_PER_STUDENT")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid DOLLARS_PER_STUDENT".to_string()))?,
            seed_demo_data: env_var("SEED_DEMO_DATA")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid SEED_DEMO_DATA".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
