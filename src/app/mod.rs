pub mod dto;
pub mod error;
pub mod probe;
pub mod server;

pub use probe::{health_url, probe_health};
pub use server::{run_server, AppState, ServerHandle, HEALTH_PATH};
