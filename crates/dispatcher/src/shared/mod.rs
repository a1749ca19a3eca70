pub mod api_client;
pub mod config;
pub mod dates;
pub mod format;
pub mod json_value;

#[cfg(test)]
pub mod testing;
