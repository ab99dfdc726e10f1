// Shared types for the EOD scanner workspace
// Bars, quotes, symbol universes, configuration and the error taxonomy

pub mod config;
pub mod error;
pub mod types;
pub mod universe;

pub use config::{load_config, save_config, ScannerConfig};
pub use error::ScanError;
pub use types::{Bar, Quote};
pub use universe::{sector_for, Universe, NIFTY50, NIFTY_NEXT50};
