pub mod aggregate;

pub use aggregate::{Driver, DriverId, FALLBACK_DRIVER_CATEGORY};
