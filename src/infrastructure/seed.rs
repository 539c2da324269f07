use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;

use crate::domain::{DomainError, Filter, Operator, Repository};
use crate::infrastructure::{GenericRepository, PersistenceContext};
use crate::models::{parking_record, vehicle};

/// Insert a handful of vehicles with an open parking record each.
///
/// Vehicles whose plate already exists are skipped, so seeding twice is safe.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<usize, DomainError> {
    let demo = [
        ("ABC123", "car", None),
        ("XYZ987", "car", None),
        ("MTO45B", "motorcycle", Some(650)),
    ];

    let mut vehicles = GenericRepository::<vehicle::Entity>::new(PersistenceContext::new(db.clone()));
    let mut seeded = Vec::new();

    for (plate, kind, cylinder_capacity) in demo {
        let existing = vehicles
            .count(Some(Filter::by(vehicle::Column::Plate, Operator::Eq(plate.into()))))
            .await?;
        if existing > 0 {
            tracing::debug!("Vehicle {} already present, skipping", plate);
            continue;
        }

        let vehicle = vehicles
            .add(Some(vehicle::ActiveModel::new_vehicle(
                plate,
                kind,
                cylinder_capacity,
            )))
            .await?;
        seeded.push(vehicle.id);
    }

    let mut records =
        GenericRepository::<parking_record::Entity>::new(vehicles.into_context());
    let entered_at = Utc::now() - Duration::hours(2);
    for vehicle_id in &seeded {
        records
            .add(Some(parking_record::ActiveModel::check_in(
                *vehicle_id,
                entered_at,
            )))
            .await?;
    }
    records.dispose();

    Ok(seeded.len())
}
