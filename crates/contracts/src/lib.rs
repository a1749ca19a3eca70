//! Wire contracts shared by the dispatcher core and its HTTP surface.

pub mod domain;
pub mod usecases;
