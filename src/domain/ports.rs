use crate::core::export::ExportOptions;
use crate::core::optimizer::SolverOptions;
use crate::core::preferences::PreferenceSource;
use crate::domain::model::{CustomPair, LayoutSpec, PlanInput, PlanOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn names_file(&self) -> &str;
    fn name_column(&self) -> &str;
    fn preferences_file(&self) -> Option<&str>;
    fn preference_source(&self) -> PreferenceSource;
    fn manual_preferences(&self) -> &str;
    fn custom_pairs(&self) -> Vec<CustomPair>;
    fn like_weights(&self) -> &[f64];
    fn dislike_weights(&self) -> &[f64];
    fn layout_spec(&self, num_people: usize) -> LayoutSpec;
    fn solver_options(&self) -> SolverOptions;
    fn output_path(&self) -> &str;
    fn bundle_name(&self) -> &str;
    fn export_options(&self) -> ExportOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<PlanInput>;
    async fn transform(&self, input: PlanInput) -> Result<PlanOutcome>;
    async fn load(&self, outcome: PlanOutcome) -> Result<String>;
}
