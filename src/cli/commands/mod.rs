//! CLI command implementations.

mod config;
mod doctor;
mod download;
mod init;
mod model;
mod preprocess;
mod run;
mod stats;
mod transcribe;

pub use config::run_config;
pub use doctor::run_doctor;
pub use download::run_download;
pub use init::run_init;
pub use model::run_model;
pub use preprocess::run_preprocess;
pub use run::run_pipeline;
pub use stats::run_stats;
pub use transcribe::run_transcribe;
