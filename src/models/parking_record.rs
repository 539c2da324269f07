use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::domain::AuditTimestamps;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub vehicle_id: i32,
    pub entered_at: DateTimeUtc,
    pub exited_at: Option<DateTimeUtc>,
    pub charge: Option<i64>,
    pub created_on: DateTimeUtc,
    pub updated_on: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id",
        on_delete = "Cascade"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl AuditTimestamps for ActiveModel {
    fn set_created_on(&mut self, at: DateTimeUtc) {
        self.created_on = Set(at);
    }

    fn set_updated_on(&mut self, at: DateTimeUtc) {
        self.updated_on = Set(Some(at));
    }
}

impl ActiveModel {
    /// Open a parking record for a vehicle entering the lot.
    pub fn check_in(vehicle_id: i32, entered_at: DateTimeUtc) -> Self {
        Self {
            vehicle_id: Set(vehicle_id),
            entered_at: Set(entered_at),
            exited_at: Set(None),
            charge: Set(None),
            ..Default::default()
        }
    }
}
