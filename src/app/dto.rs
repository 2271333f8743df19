use crate::core::export::ExportOptions;
use crate::core::layout::{default_rows_per_col, validate_layout, MAX_COLUMNS};
use crate::core::metrics::AssignmentSummary;
use crate::core::optimizer::{SolverOptions, MAX_TOP_N};
use crate::core::preferences::{
    load_names, load_preferences, parse_custom_weights, parse_manual_preferences, PreferenceSource,
    Sheet, DEFAULT_UNWILLING_RANGE, DEFAULT_WILLING_RANGE,
};
use crate::domain::model::{
    Aisle, CustomPair, DetectedRanges, LayoutSpec, LevelSatisfaction, PlanInput, RankedPairs,
    SatisfactionMetrics,
};
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub columns: usize,
    pub rows_per_column: Option<Vec<usize>>,
    /// 未指定排數時用來推算
    pub num_people: Option<usize>,
    pub include_diagonal: Option<bool>,
    /// 以 1 起算的欄號
    #[serde(default)]
    pub aisles: Vec<[usize; 2]>,
}

impl LayoutRequest {
    /// 先檢查欄數上限再配置每列排數
    pub fn to_spec(&self, num_people: usize) -> Result<LayoutSpec> {
        if self.columns == 0 || self.columns > MAX_COLUMNS {
            return Err(PlannerError::layout(format!(
                "Number of columns must be between 1 and {}, got {}",
                MAX_COLUMNS, self.columns
            )));
        }

        let mut aisles = Vec::with_capacity(self.aisles.len());
        for &[left, right] in &self.aisles {
            if left == 0 || right == 0 {
                return Err(PlannerError::layout(format!(
                    "Aisle columns are numbered from 1, got [{}, {}]",
                    left, right
                )));
            }
            aisles.push(Aisle {
                left: left - 1,
                right: right - 1,
            });
        }

        let rows_per_col = match &self.rows_per_column {
            Some(rows) => rows.clone(),
            None => vec![default_rows_per_col(num_people, self.columns); self.columns],
        };
        validate_layout(self.columns, &rows_per_col, 0)?;

        Ok(LayoutSpec {
            n_cols: self.columns,
            rows_per_col,
            include_diagonal: self.include_diagonal.unwrap_or(true),
            aisles,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatInfo {
    pub index: usize,
    pub label: String,
    pub col: usize,
    pub row: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutResponse {
    pub total_seats: usize,
    pub adjacent_pairs: usize,
    pub seats: Vec<SeatInfo>,
    pub svg: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesRequest {
    /// 名單 CSV 內容，第一列為表頭
    pub roster_csv: Option<String>,
    /// 直接給定名單時略過 roster_csv
    pub people: Option<Vec<String>>,
    pub name_column: Option<String>,
    pub preferences_csv: Option<String>,
    pub willing_range: Option<String>,
    pub unwilling_range: Option<String>,
    pub auto_detect: Option<bool>,
    pub manual_preferences: Option<String>,
    pub custom_weights: Option<String>,
}

impl PreferencesRequest {
    pub fn parse(&self) -> Result<PlanInput> {
        let people = match (&self.people, &self.roster_csv) {
            (Some(people), _) => dedup_names(people),
            (None, Some(csv)) => load_names(
                &Sheet::from_csv_bytes(csv.as_bytes())?,
                self.name_column.as_deref().unwrap_or("A:A"),
            )?,
            (None, None) => {
                return Err(PlannerError::MissingConfigError {
                    field: "roster_csv".to_string(),
                })
            }
        };

        let mut preferences = match &self.preferences_csv {
            Some(csv) => {
                let source = PreferenceSource {
                    willing_range: self
                        .willing_range
                        .clone()
                        .unwrap_or_else(|| DEFAULT_WILLING_RANGE.to_string()),
                    unwilling_range: self
                        .unwilling_range
                        .clone()
                        .unwrap_or_else(|| DEFAULT_UNWILLING_RANGE.to_string()),
                    auto_detect: self.auto_detect.unwrap_or(true),
                };
                load_preferences(&Sheet::from_csv_bytes(csv.as_bytes())?, &source)?
            }
            None => Default::default(),
        };

        let (manual, mut custom_pairs) =
            parse_manual_preferences(self.manual_preferences.as_deref().unwrap_or(""));
        preferences.merge(manual);
        if let Some(text) = &self.custom_weights {
            custom_pairs.extend(parse_custom_weights(text));
        }

        Ok(PlanInput {
            people,
            preferences,
            custom_pairs,
        })
    }
}

fn dedup_names(people: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(people.len());
    for name in people.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[derive(Debug, Clone, Serialize)]
pub struct RankPairs {
    pub rank: usize,
    pub pairs: Vec<[String; 2]>,
}

fn ranked_to_dto(ranked: &RankedPairs) -> Vec<RankPairs> {
    ranked
        .iter()
        .map(|(rank, pairs)| RankPairs {
            rank: *rank,
            pairs: pairs
                .iter()
                .map(|p| [p.first().to_string(), p.second().to_string()])
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencesResponse {
    pub people: Vec<String>,
    pub willing: Vec<RankPairs>,
    pub unwilling: Vec<RankPairs>,
    pub willing_headers: Vec<String>,
    pub unwilling_headers: Vec<String>,
    pub detected: Option<DetectedRanges>,
    pub custom_pairs: Vec<CustomPair>,
}

impl From<PlanInput> for PreferencesResponse {
    fn from(input: PlanInput) -> Self {
        Self {
            willing: ranked_to_dto(&input.preferences.willing),
            unwilling: ranked_to_dto(&input.preferences.unwilling),
            willing_headers: input.preferences.willing_headers,
            unwilling_headers: input.preferences.unwilling_headers,
            detected: input.preferences.detected,
            people: input.people,
            custom_pairs: input.custom_pairs,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightsRequest {
    #[serde(default)]
    pub like: Vec<f64>,
    #[serde(default)]
    pub dislike: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverRequest {
    pub top_n: Option<usize>,
    pub time_limit_seconds: Option<u64>,
    pub seed: Option<u64>,
}

impl SolverRequest {
    pub fn to_options(&self, defaults: &SolverOptions) -> Result<SolverOptions> {
        let top_n = self.top_n.unwrap_or(defaults.top_n);
        validate_range("solver.top_n", top_n, 1, MAX_TOP_N)?;
        let time_limit = match self.time_limit_seconds {
            Some(seconds) => {
                validate_range("solver.time_limit_seconds", seconds, 1, 60)?;
                Duration::from_secs(seconds)
            }
            None => defaults.time_limit,
        };

        Ok(SolverOptions {
            top_n,
            time_limit,
            seed: self.seed.or(defaults.seed),
            exhaustive_limit: defaults.exhaustive_limit,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveRequest {
    pub input: PreferencesRequest,
    pub layout: LayoutRequest,
    #[serde(default)]
    pub weights: WeightsRequest,
    #[serde(default)]
    pub solver: SolverRequest,
    #[serde(default)]
    pub show_all_lines: bool,
    #[serde(default)]
    pub split_visualization: bool,
}

impl SolveRequest {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            show_all_lines: self.show_all_lines,
            split_visualization: self.split_visualization,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatAssignment {
    pub name: String,
    pub seat_index: usize,
    pub seat: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub plan: usize,
    pub summary: AssignmentSummary,
    pub metrics: SatisfactionMetrics,
    pub seats: Vec<SeatAssignment>,
    pub svg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_svg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_svg: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveResponse {
    pub people: usize,
    pub total_seats: usize,
    pub weighted_pairs: usize,
    pub plans: Vec<PlanView>,
    pub levels: Vec<LevelSatisfaction>,
}
