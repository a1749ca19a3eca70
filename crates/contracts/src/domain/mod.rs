pub mod a001_driver;
pub mod a002_category_group;
