//! Repository implementations using SeaORM

pub mod generic_repository;

pub use generic_repository::GenericRepository;
