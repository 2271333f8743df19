use crate::core::export::export_bundle;
use crate::core::layout::SeatLayout;
use crate::core::metrics::{
    compute_satisfaction_metrics, level_satisfaction, positive_pairs, validate_assignment,
};
use crate::core::optimizer::{solve_top_n, SolverOptions};
use crate::core::preferences::{
    compute_pair_weights, default_dislike_weights, default_like_weights, load_names,
    load_preferences, parse_manual_preferences, Sheet,
};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    CustomPair, LayoutSpec, PairWeights, PlanInput, PlanOutcome, Preferences,
};
use crate::utils::error::{PlannerError, Result};

/// 權重清單為空時依最高等級補上預設值
pub fn resolve_weights(
    prefs: &Preferences,
    like_weights: &[f64],
    dislike_weights: &[f64],
    custom_pairs: &[CustomPair],
) -> PairWeights {
    let like = if like_weights.is_empty() {
        default_like_weights(prefs.willing.keys().max().copied().unwrap_or(1))
    } else {
        like_weights.to_vec()
    };
    let dislike = if dislike_weights.is_empty() {
        default_dislike_weights(prefs.unwilling.keys().max().copied().unwrap_or(1))
    } else {
        dislike_weights.to_vec()
    };
    compute_pair_weights(prefs, &like, &dislike, custom_pairs)
}

/// 求解並計算每個方案的滿足度
pub fn plan_seats(
    people: Vec<String>,
    preferences: Preferences,
    weights: PairWeights,
    layout_spec: LayoutSpec,
    options: &SolverOptions,
    progress: Option<&mut dyn FnMut(f32, &str)>,
) -> Result<PlanOutcome> {
    let layout = SeatLayout::build(layout_spec, people.len())?;
    let mut results = solve_top_n(&people, &layout, &weights, options, progress)?;

    let positives = positive_pairs(&weights);
    for result in &mut results {
        validate_assignment(&result.assignment, &people, &layout.seats)?;
        result.metrics =
            compute_satisfaction_metrics(&result.assignment, &layout, &positives, &preferences.willing);
    }

    let levels = results
        .first()
        .map(|best| level_satisfaction(&best.assignment, &layout, &preferences))
        .unwrap_or_default();

    Ok(PlanOutcome {
        people,
        layout: layout.spec,
        preferences,
        weights,
        results,
        levels,
    })
}

pub struct PlanPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> PlanPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PlanPipeline<S, C> {
    async fn extract(&self) -> Result<PlanInput> {
        tracing::debug!("Reading roster from: {}", self.config.names_file());
        let roster = self.storage.read_file(self.config.names_file()).await?;
        let people = load_names(&Sheet::from_csv_bytes(&roster)?, self.config.name_column())?;

        if people.is_empty() {
            return Err(PlannerError::validation(format!(
                "No names found in {} column {}",
                self.config.names_file(),
                self.config.name_column()
            )));
        }

        let mut preferences = match self.config.preferences_file() {
            Some(path) => {
                tracing::debug!("Reading preferences from: {}", path);
                let data = self.storage.read_file(path).await?;
                load_preferences(&Sheet::from_csv_bytes(&data)?, &self.config.preference_source())?
            }
            None => Preferences::default(),
        };

        let (manual, mut custom_pairs) = parse_manual_preferences(self.config.manual_preferences());
        preferences.merge(manual);
        custom_pairs.extend(self.config.custom_pairs());

        tracing::debug!(
            "Loaded {} people, {} willing pairs, {} unwilling pairs, {} custom weights",
            people.len(),
            preferences.willing_count(),
            preferences.unwilling_count(),
            custom_pairs.len()
        );

        Ok(PlanInput {
            people,
            preferences,
            custom_pairs,
        })
    }

    async fn transform(&self, input: PlanInput) -> Result<PlanOutcome> {
        let weights = resolve_weights(
            &input.preferences,
            self.config.like_weights(),
            self.config.dislike_weights(),
            &input.custom_pairs,
        );
        let layout_spec = self.config.layout_spec(input.people.len());
        let options = self.config.solver_options();

        tracing::debug!(
            "Solving for {} people on {} seats with {} weighted pairs",
            input.people.len(),
            layout_spec.total_seats(),
            weights.len()
        );

        tokio::task::spawn_blocking(move || {
            let mut log_progress = |fraction: f32, message: &str| {
                tracing::debug!("[{:>3.0}%] {}", fraction * 100.0, message);
            };
            plan_seats(
                input.people,
                input.preferences,
                weights,
                layout_spec,
                &options,
                Some(&mut log_progress),
            )
        })
        .await
        .map_err(|e| PlannerError::ProcessingError {
            message: format!("Solver task failed: {}", e),
        })?
    }

    async fn load(&self, outcome: PlanOutcome) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), self.config.bundle_name());

        tracing::debug!("Creating ZIP bundle with {} plans", outcome.results.len());
        let zip_data = export_bundle(&outcome, self.config.export_options())?;

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage
            .write_file(self.config.bundle_name(), &zip_data)
            .await?;

        Ok(output_path)
    }
}
