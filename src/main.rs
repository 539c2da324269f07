use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estacionamiento_persistence::domain::{Filter, Operator, Repository};
use estacionamiento_persistence::infrastructure::{GenericRepository, PersistenceContext};
use estacionamiento_persistence::models::{parking_record, vehicle};
use estacionamiento_persistence::{config, db, seed};

#[tokio::main]
async fn main() {
    // Load configuration
    dotenvy::dotenv().ok();

    // Check for --profile CLI argument
    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--profile")
        && let Some(val) = args.get(pos + 1)
    {
        // SAFETY: no task has been spawned yet, nothing else reads the environment
        unsafe { std::env::set_var("PROFILE", val) };
    }

    let config = config::Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Profile: {}", config.profile);

    // Initialize database
    let db = db::connect(&config)
        .await
        .expect("Failed to initialize database");

    // Check for seed flag
    if std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        match seed::seed_demo_data(&db).await {
            Ok(count) => tracing::info!("Demo data seeded successfully ({} vehicle(s)).", count),
            Err(e) => tracing::error!("Failed to seed data: {}", e),
        }
    }

    let vehicles = GenericRepository::<vehicle::Entity>::new(PersistenceContext::new(db.clone()));
    match vehicles.count(None).await {
        Ok(total) => tracing::info!("{} vehicle(s) registered", total),
        Err(e) => tracing::error!("Failed to count vehicles: {}", e),
    }

    match vehicles
        .get_with_related(parking_record::Entity, None)
        .await
    {
        Ok(rows) => {
            for (vehicle, records) in rows {
                let open = records.iter().filter(|r| r.exited_at.is_none()).count();
                tracing::info!(
                    "{} ({}): {} stay(s), {} open",
                    vehicle.plate,
                    vehicle.kind,
                    records.len(),
                    open
                );
            }
        }
        Err(e) => tracing::error!("Failed to load vehicles: {}", e),
    }

    let records = GenericRepository::<parking_record::Entity>::new(vehicles.into_context());
    let open_stays = Filter::by(parking_record::Column::ExitedAt, Operator::IsNull);
    match records.count(Some(open_stays)).await {
        Ok(open) => tracing::info!("{} vehicle(s) currently parked", open),
        Err(e) => tracing::error!("Failed to count open stays: {}", e),
    }
    records.dispose();
}
