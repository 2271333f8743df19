pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::PlanConfig;
#[cfg(feature = "cli")]
pub use config::ServerConfig;

pub use app::{run_server, AppState, ServerHandle};
pub use core::{engine::PlanEngine, pipeline::PlanPipeline};
pub use utils::error::{PlannerError, Result};
