pub mod parking_record;
pub mod vehicle;

pub use parking_record::Model as ParkingRecord;
pub use vehicle::Model as Vehicle;
