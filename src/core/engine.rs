use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct PlanEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> PlanEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn monitor(&self) -> &SystemMonitor {
        &self.monitor
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting seat planning...");
        self.monitor.log_stats("Start");

        tracing::info!("📥 Reading roster and preferences...");
        let input = self.pipeline.extract().await?;
        tracing::info!(
            "📊 Loaded {} people ({} willing / {} unwilling pairs)",
            input.people.len(),
            input.preferences.willing_count(),
            input.preferences.unwilling_count()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("🧮 Solving seat assignment...");
        let outcome = self.pipeline.transform(input).await?;
        if let Some(best) = outcome.results.first() {
            tracing::info!(
                "🏆 Best plan: objective {:.2}, satisfaction {}%, status {}",
                best.objective,
                best.metrics.satisfaction_rate,
                best.status.label()
            );
        }
        tracing::info!("📋 {} plan(s) generated", outcome.results.len());
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Writing output bundle...");
        let output_path = self.pipeline.load(outcome).await?;
        tracing::info!("📁 Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
