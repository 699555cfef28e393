//! Logging setup and the data files written during a run

mod data;
mod output;

pub use data::{default_filename, with_suffix, DataFiles};
pub use output::setup_output;
