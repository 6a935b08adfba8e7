pub mod climate_repository;
pub mod error;
pub mod pool;

pub use climate_repository::{ClimateRepository, CLIMATE_TABLE};
pub use error::DbError;
pub use pool::connect;
