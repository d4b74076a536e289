pub mod date;
pub mod error;
pub mod normalize;
pub mod session;

pub use date::parse_receipt_date;
pub use error::IngestionError;
pub use normalize::{discount_percentage, normalize};
pub use session::Session;
