// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;

/// Notification feed keeps only this many most-recent entries.
pub const NOTIFICATION_RETENTION: usize = 20;

/// A score at or above this percentage counts as a pass.
pub const PASSING_SCORE_PERCENTAGE: f64 = 60.0;

/// Time limit prefilled for quizzes created from a blank draft.
pub const NEW_QUIZ_TIME_LIMIT_SECS: u32 = 300;

/// Which `RecordStore` implementation backs the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Argon2 cost parameters for password secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub rust_log: String,
    /// Countdown length for every question of a quiz session.
    pub question_time_secs: u32,
    /// Delay applied before each collection call; zero disables it.
    pub simulated_latency_ms: u64,
    pub admin_email: String,
    pub admin_password: String,
    pub hash_cost: HashCost,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: PathBuf::from("data"),
            database_url: "sqlite://quizbox.db?mode=rwc".to_string(),
            rust_log: "info".to_string(),
            question_time_secs: 30,
            simulated_latency_ms: 0,
            admin_email: "admin@quiz.com".to_string(),
            admin_password: "password123".to_string(),
            hash_cost: HashCost::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let backend = env::var("STORE_BACKEND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(StoreBackend::File);

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);

        let admin_email = env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email);
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password);

        Self {
            backend,
            data_dir,
            database_url,
            rust_log,
            question_time_secs: parse_or("QUESTION_TIME_SECS", defaults.question_time_secs),
            simulated_latency_ms: parse_or("SIMULATED_LATENCY_MS", defaults.simulated_latency_ms),
            admin_email,
            admin_password,
            hash_cost: HashCost {
                memory_kib: parse_or("HASH_MEMORY_KIB", defaults.hash_cost.memory_kib),
                iterations: parse_or("HASH_ITERATIONS", defaults.hash_cost.iterations),
            },
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" sqlite ".parse::<StoreBackend>(), Ok(StoreBackend::Sqlite));
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.question_time_secs, 30);
        assert_eq!(config.admin_email, "admin@quiz.com");
        assert_eq!(config.simulated_latency_ms, 0);
    }
}
