use serde::{Deserialize, Serialize};

use crate::usecases::common::lenient;

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор водителя в справочнике бэкенда
pub type DriverId = String;

/// Категория, которую получает водитель без указанной категории
pub const FALLBACK_DRIVER_CATEGORY: &str = "TRAILER";

// ============================================================================
// Aggregate
// ============================================================================

/// Водитель из справочника (read-only копия, обновляется при загрузке)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DriverDto")]
pub struct Driver {
    pub driver_id: DriverId,
    pub display_name: String,
    /// Код категории, всегда в верхнем регистре
    pub category: String,
    pub phone_number: String,
    pub active: bool,
    pub updated_at: Option<String>,
}

impl Driver {
    pub fn new(driver_id: impl Into<String>, display_name: impl Into<String>, category: &str) -> Self {
        Self::from(DriverDto {
            driver_id: driver_id.into(),
            display_name: display_name.into(),
            category: Some(category.to_string()),
            ..DriverDto::default()
        })
    }
}

/// Raw shape from the backend: snake_case or camelCase keys, category under several names
#[derive(Debug, Clone, Default, Deserialize)]
struct DriverDto {
    #[serde(default, alias = "driverId", deserialize_with = "lenient::string")]
    driver_id: String,
    #[serde(default, alias = "displayName", deserialize_with = "lenient::string")]
    display_name: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        alias = "category_name",
        alias = "categoryName",
        alias = "category_code",
        alias = "categoryCode"
    )]
    category: Option<String>,
    #[serde(default, alias = "phoneNumber", deserialize_with = "lenient::string")]
    phone_number: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    active: Option<bool>,
    #[serde(default, alias = "updatedAt", deserialize_with = "lenient::opt_string")]
    updated_at: Option<String>,
}

impl From<DriverDto> for Driver {
    fn from(dto: DriverDto) -> Self {
        let category = dto
            .category
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| FALLBACK_DRIVER_CATEGORY.to_string());

        Self {
            driver_id: dto.driver_id,
            display_name: dto.display_name,
            category,
            phone_number: dto.phone_number,
            active: dto.active != Some(false),
            updated_at: dto.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_driver_is_normalized() {
        let driver: Driver = serde_json::from_str(
            r#"{"driverId":"D7","displayName":"Ali","categoryCode":" lowbed ","phoneNumber":"0123"}"#,
        )
        .unwrap();
        assert_eq!(driver.driver_id, "D7");
        assert_eq!(driver.display_name, "Ali");
        assert_eq!(driver.category, "LOWBED");
        assert_eq!(driver.phone_number, "0123");
        assert!(driver.active);
    }

    #[test]
    fn test_missing_category_falls_back_to_trailer() {
        let driver: Driver =
            serde_json::from_str(r#"{"driver_id":"D1","category":"  ","active":false}"#).unwrap();
        assert_eq!(driver.category, FALLBACK_DRIVER_CATEGORY);
        assert!(!driver.active);
    }

    #[test]
    fn test_null_fields_use_defaults() {
        let driver: Driver = serde_json::from_str(
            r#"{"driver_id":1042,"display_name":null,"category":null,"phone_number":null,"active":null,"updated_at":null}"#,
        )
        .unwrap();
        assert_eq!(driver.driver_id, "1042");
        assert_eq!(driver.display_name, "");
        assert_eq!(driver.category, FALLBACK_DRIVER_CATEGORY);
        assert_eq!(driver.phone_number, "");
        assert!(driver.active);
        assert_eq!(driver.updated_at, None);
    }
}
