use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub sql_logging: bool,
    pub log_filter: String,
    pub profile: String,
}

impl Config {
    pub fn from_env() -> Self {
        let profile = env::var("PROFILE").unwrap_or_else(|_| "default".to_string());

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://estacionamiento.db?mode=rwc".to_string()
            } else {
                format!("sqlite://estacionamiento_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(5),
            sql_logging: env::var("DB_SQL_LOGGING")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_filter: env::var("LOG_FILTER")
                .unwrap_or_else(|_| "estacionamiento=debug".to_string()),
            profile,
        }
    }
}
