// EOD scan core (indicators -> setups -> scores -> risk -> batch output)
// Everything here is a pure function of the input bar history; the only
// I/O lives in report.rs.

pub mod frame;
pub mod indicators;
pub mod pipeline;
pub mod report;
pub mod result;
pub mod risk;
pub mod scoring;
pub mod sector;
pub mod setups;
pub mod summary;

pub use frame::IndicatorFrame;
pub use pipeline::ScanPipeline;
pub use report::{read_batch, top_candidates, BatchPaths, BatchWriter};
pub use result::ScanResult;
pub use risk::{RiskPlan, TradeDirection};
pub use scoring::{assess_risk_level, calculate_scores};
pub use sector::{relative_strength, RsRating, SectorStrength};
pub use setups::SetupFlags;
