//! Process start-up: configuration loading, database preparation and the
//! first-run data tasks.

pub mod config;
pub mod startup;

pub use config::{AppConfig, ConfigError};
pub use startup::{
    StartupError, StartupReport, prepare_database, run_data_tasks, seed_defaults, session_tokens,
};
