use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// GET capacity?from&to (обе границы включительно)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}
