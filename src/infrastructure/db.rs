use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

use super::config::Config;

/// Connect to `database_url` and bring the schema up to date.
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    run_migrations(&db).await?;

    Ok(db)
}

/// Same as [`init_db`], with pool settings taken from the configuration.
pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(config.sql_logging);

    let db = Database::connect(options).await?;
    tracing::info!(
        "Connected to {} (max {} connection(s))",
        config.database_url,
        config.max_connections
    );

    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create vehicles table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            cylinder_capacity INTEGER,
            created_on TEXT NOT NULL,
            updated_on TEXT
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create parking_records table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS parking_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vehicle_id INTEGER NOT NULL,
            entered_at TEXT NOT NULL,
            exited_at TEXT,
            charge INTEGER,
            created_on TEXT NOT NULL,
            updated_on TEXT,
            FOREIGN KEY (vehicle_id) REFERENCES vehicles(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE INDEX IF NOT EXISTS idx_parking_records_vehicle ON parking_records(vehicle_id)"
            .to_owned(),
    ))
    .await?;

    tracing::debug!("Migrations applied");
    Ok(())
}
