//! Domain types for indexload

pub mod market;
pub mod record;

pub use market::{DataSource, MarketIndex};
pub use record::{split_date, CanonicalRecord, DateFormatError, DatePieces, PredictionRecord};
