//! Run summary output
//!
//! One compact JSON object per profiled statement, in statement order, written
//! to `<run_id>_summary.jsonl` next to the plan artifacts.

mod writer;

pub use writer::{SummaryWriter, write_summary};
