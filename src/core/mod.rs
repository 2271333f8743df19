pub mod engine;
pub mod export;
pub mod generator;
pub mod layout;
pub mod metrics;
pub mod optimizer;
pub mod pipeline;
pub mod preferences;

pub use crate::domain::model::{PlanInput, PlanOutcome};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
