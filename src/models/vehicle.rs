use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::domain::AuditTimestamps;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub plate: String,
    /// `car` or `motorcycle`
    pub kind: String,
    /// Engine displacement in cc, only meaningful for motorcycles.
    pub cylinder_capacity: Option<i32>,
    pub created_on: DateTimeUtc,
    pub updated_on: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parking_record::Entity")]
    ParkingRecords,
}

impl Related<super::parking_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingRecords.def()
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
    /// New vehicle ready for `Repository::add`.
    pub fn new_vehicle(plate: &str, kind: &str, cylinder_capacity: Option<i32>) -> Self {
        Self {
            plate: Set(plate.to_owned()),
            kind: Set(kind.to_owned()),
            cylinder_capacity: Set(cylinder_capacity),
            ..Default::default()
        }
    }
}
