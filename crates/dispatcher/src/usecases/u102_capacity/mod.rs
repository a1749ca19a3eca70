pub mod aggregator;

pub use aggregator::{capacity_status, effective_max_per_day, evaluate_capacity, DEFAULT_MAX_PER_DAY};
