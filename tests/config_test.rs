//! Configuration loading from the environment

use estacionamiento_persistence::config::Config;
use estacionamiento_persistence::domain::Repository;
use estacionamiento_persistence::infrastructure::{GenericRepository, PersistenceContext};
use estacionamiento_persistence::models::vehicle;
use serial_test::serial;

const VARS: [&str; 5] = [
    "PROFILE",
    "DATABASE_URL",
    "DB_MAX_CONNECTIONS",
    "DB_SQL_LOGGING",
    "LOG_FILTER",
];

fn clear_env() {
    for var in VARS {
        // SAFETY: tests touching the environment run serially
        unsafe { std::env::remove_var(var) };
    }
}

fn set(var: &str, value: &str) {
    // SAFETY: tests touching the environment run serially
    unsafe { std::env::set_var(var, value) };
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();

    let config = Config::from_env();

    assert_eq!(config.profile, "default");
    assert_eq!(config.database_url, "sqlite://estacionamiento.db?mode=rwc");
    assert_eq!(config.max_connections, 5);
    assert!(!config.sql_logging);
    assert_eq!(config.log_filter, "estacionamiento=debug");
}

#[test]
#[serial]
fn test_profile_selects_database_file() {
    clear_env();
    set("PROFILE", "night_shift");

    let config = Config::from_env();

    assert_eq!(config.profile, "night_shift");
    assert_eq!(
        config.database_url,
        "sqlite://estacionamiento_night_shift.db?mode=rwc"
    );
    clear_env();
}

#[test]
#[serial]
fn test_explicit_values_override_defaults() {
    clear_env();
    set("PROFILE", "night_shift");
    set("DATABASE_URL", "sqlite::memory:");
    set("DB_MAX_CONNECTIONS", "12");
    set("DB_SQL_LOGGING", "true");
    set("LOG_FILTER", "estacionamiento=info");

    let config = Config::from_env();

    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.max_connections, 12);
    assert!(config.sql_logging);
    assert_eq!(config.log_filter, "estacionamiento=info");
    clear_env();
}

#[test]
#[serial]
fn test_invalid_pool_size_falls_back() {
    clear_env();
    set("DB_MAX_CONNECTIONS", "0");
    assert_eq!(Config::from_env().max_connections, 5);

    set("DB_MAX_CONNECTIONS", "lots");
    assert_eq!(Config::from_env().max_connections, 5);
    clear_env();
}

#[tokio::test]
#[serial]
async fn test_connect_with_config_runs_migrations() {
    clear_env();
    set("DATABASE_URL", "sqlite::memory:");
    set("DB_MAX_CONNECTIONS", "1");
    let config = Config::from_env();
    clear_env();

    let db = estacionamiento_persistence::db::connect(&config)
        .await
        .expect("Failed to connect");

    let repo = GenericRepository::<vehicle::Entity>::new(PersistenceContext::new(db));
    assert_eq!(repo.count(None).await.unwrap(), 0);
}
