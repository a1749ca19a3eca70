pub mod aggregate;

pub use aggregate::CategoryGroup;
