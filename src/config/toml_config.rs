use crate::core::export::ExportOptions;
use crate::core::layout::{default_rows_per_col, MAX_COLUMNS, MAX_ROWS_PER_COLUMN};
use crate::core::optimizer::{SolverOptions, MAX_TOP_N};
use crate::core::preferences::{
    parse_cell_range, parse_custom_weights, PreferenceSource, DEFAULT_UNWILLING_RANGE,
    DEFAULT_WILLING_RANGE,
};
use crate::core::ConfigProvider;
use crate::domain::model::{Aisle, CustomPair, LayoutSpec};
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub plan: PlanSection,
    pub input: InputConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    pub layout: LayoutConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSection {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// 相對路徑以此目錄為準
    pub base_dir: Option<String>,
    pub names_file: String,
    pub name_column: Option<String>,
    pub preferences_file: Option<String>,
    pub willing_range: Option<String>,
    pub unwilling_range: Option<String>,
    pub auto_detect: Option<bool>,
    /// 每行 "甲,喜欢,乙"
    pub manual_preferences: Option<String>,
    /// 每行 "甲,乙,權重"
    pub custom_weights: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default)]
    pub like: Vec<f64>,
    #[serde(default)]
    pub dislike: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub columns: usize,
    pub rows_per_column: Option<Vec<usize>>,
    pub include_diagonal: Option<bool>,
    /// 以 1 起算的欄號，例如 [[2, 3]]
    pub aisles: Option<Vec<[usize; 2]>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    pub top_n: Option<usize>,
    pub time_limit_seconds: Option<u64>,
    pub seed: Option<u64>,
    pub exhaustive_limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: String,
    pub bundle_name: Option<String>,
    pub show_all_lines: Option<bool>,
    /// 每個方案另外輸出正向與負向關係圖
    pub split_visualization: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

const DEFAULT_NAME_COLUMN: &str = "A:A";
const DEFAULT_BUNDLE_NAME: &str = "seat_plans.zip";

impl PlanConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PlannerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PlannerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| PlannerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("plan.name", &self.plan.name)?;
        validate_non_empty_string("input.names_file", &self.input.names_file)?;
        validate_file_extensions(
            "input.names_file",
            std::slice::from_ref(&self.input.names_file),
            &["csv"],
        )?;
        if let Some(file) = &self.input.preferences_file {
            validate_file_extensions("input.preferences_file", std::slice::from_ref(file), &["csv"])?;
        }

        let name_column = self.name_column();
        if parse_cell_range(name_column).is_none() {
            return Err(PlannerError::InvalidConfigValueError {
                field: "input.name_column".to_string(),
                value: name_column.to_string(),
                reason: "Expected a column range such as A:A".to_string(),
            });
        }
        for (field, value) in [
            ("input.willing_range", &self.input.willing_range),
            ("input.unwilling_range", &self.input.unwilling_range),
        ] {
            if let Some(range) = value {
                if parse_cell_range(range).is_none() {
                    return Err(PlannerError::InvalidConfigValueError {
                        field: field.to_string(),
                        value: range.clone(),
                        reason: "Expected a cell range such as A1:C10".to_string(),
                    });
                }
            }
        }

        validate_range("layout.columns", self.layout.columns, 1, MAX_COLUMNS)?;
        if let Some(rows) = &self.layout.rows_per_column {
            if rows.len() != self.layout.columns {
                return Err(PlannerError::ConfigValidationError {
                    field: "layout.rows_per_column".to_string(),
                    message: format!(
                        "Expected {} entries, found {}",
                        self.layout.columns,
                        rows.len()
                    ),
                });
            }
            for &r in rows {
                validate_range("layout.rows_per_column", r, 1, MAX_ROWS_PER_COLUMN)?;
            }
        }
        for [left, right] in self.layout.aisles.iter().flatten() {
            if *left == 0 || left >= right || *right > self.layout.columns {
                return Err(PlannerError::InvalidConfigValueError {
                    field: "layout.aisles".to_string(),
                    value: format!("[{}, {}]", left, right),
                    reason: format!(
                        "Aisle columns must satisfy 1 <= left < right <= {}",
                        self.layout.columns
                    ),
                });
            }
        }

        if let Some(top_n) = self.solver.top_n {
            validate_range("solver.top_n", top_n, 1, MAX_TOP_N)?;
        }
        if let Some(seconds) = self.solver.time_limit_seconds {
            validate_range("solver.time_limit_seconds", seconds, 1, 60)?;
        }

        validate_path("output.output_path", &self.output.output_path)?;
        validate_non_empty_string("output.bundle_name", self.bundle_name())?;

        Ok(())
    }

    pub fn base_dir(&self) -> &str {
        self.input.base_dir.as_deref().unwrap_or(".")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn aisles(&self) -> Vec<Aisle> {
        self.layout
            .aisles
            .iter()
            .flatten()
            .filter(|[left, right]| *left >= 1 && *right >= 1)
            .map(|[left, right]| Aisle {
                left: left - 1,
                right: right - 1,
            })
            .collect()
    }
}

impl ConfigProvider for PlanConfig {
    fn names_file(&self) -> &str {
        &self.input.names_file
    }

    fn name_column(&self) -> &str {
        self.input.name_column.as_deref().unwrap_or(DEFAULT_NAME_COLUMN)
    }

    fn preferences_file(&self) -> Option<&str> {
        self.input.preferences_file.as_deref()
    }

    fn preference_source(&self) -> PreferenceSource {
        PreferenceSource {
            willing_range: self
                .input
                .willing_range
                .clone()
                .unwrap_or_else(|| DEFAULT_WILLING_RANGE.to_string()),
            unwilling_range: self
                .input
                .unwilling_range
                .clone()
                .unwrap_or_else(|| DEFAULT_UNWILLING_RANGE.to_string()),
            auto_detect: self.input.auto_detect.unwrap_or(true),
        }
    }

    fn manual_preferences(&self) -> &str {
        self.input.manual_preferences.as_deref().unwrap_or("")
    }

    fn custom_pairs(&self) -> Vec<CustomPair> {
        self.input
            .custom_weights
            .as_deref()
            .map(parse_custom_weights)
            .unwrap_or_default()
    }

    fn like_weights(&self) -> &[f64] {
        &self.weights.like
    }

    fn dislike_weights(&self) -> &[f64] {
        &self.weights.dislike
    }

    fn layout_spec(&self, num_people: usize) -> LayoutSpec {
        let n_cols = self.layout.columns;
        let rows_per_col = self
            .layout
            .rows_per_column
            .clone()
            .unwrap_or_else(|| vec![default_rows_per_col(num_people, n_cols); n_cols]);

        LayoutSpec {
            n_cols,
            rows_per_col,
            include_diagonal: self.layout.include_diagonal.unwrap_or(true),
            aisles: self.aisles(),
        }
    }

    fn solver_options(&self) -> SolverOptions {
        let defaults = SolverOptions::default();
        SolverOptions {
            top_n: self.solver.top_n.unwrap_or(defaults.top_n),
            time_limit: self
                .solver
                .time_limit_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.time_limit),
            seed: self.solver.seed,
            exhaustive_limit: self
                .solver
                .exhaustive_limit
                .unwrap_or(defaults.exhaustive_limit),
        }
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn bundle_name(&self) -> &str {
        self.output.bundle_name.as_deref().unwrap_or(DEFAULT_BUNDLE_NAME)
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            show_all_lines: self.output.show_all_lines.unwrap_or(false),
            split_visualization: self.output.split_visualization.unwrap_or(false),
        }
    }
}

impl Validate for PlanConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
