//! Category groups: resolution, filter sources and per-group channel routing.

pub mod channel;
pub mod filters;
pub mod resolver;

pub use channel::{ChannelConfig, ChannelDirectory};
pub use filters::{resolve_effective_category_group, CapacityFilterState, FilterSources};
pub use resolver::{normalize_category_key, CategoryRegistry};
pub(crate) use resolver::scalar_to_string;
