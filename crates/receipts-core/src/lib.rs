pub mod analytics;
pub mod app_config;
pub mod config;
pub mod receipts;

pub use analytics::{
    brand_performance, pricing_discounts, shopping_habits, summarize, BrandPerformance,
    DatasetSummary, PricingDiscounts, ShoppingHabits, DEFAULT_TOP_N,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use receipts::{Dataset, LineItem, DERIVED_FIELDS, EXPECTED_FORMAT, REQUIRED_FIELDS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
