pub mod captions;
pub mod config;
pub mod error;
pub mod fetch;
pub mod housekeeping;
pub mod interactive;
pub mod mux;
pub mod pipeline;
pub mod subtitle;
pub mod tools;
pub mod translate;

pub use config::Config;
pub use error::{Result, SubfetchError};
pub use pipeline::{print_summary, print_translate_summary, Pipeline, RunSummary, TranslateSummary};
