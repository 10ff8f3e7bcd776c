//! End-to-end page analysis.
mod analyzer;
mod params;
mod progress;
mod timing;

pub use analyzer::{PageAnalyzer, PageLayout};
pub use params::LayoutParams;
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use timing::{StageTiming, TimingBreakdown};
