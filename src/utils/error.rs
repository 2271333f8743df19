use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid layout: {message}")]
    LayoutError { message: String },

    #[error("No feasible seating: {message}")]
    InfeasibleError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Solver,
    Output,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 依嚴重程度決定的程序結束碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl PlannerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlannerError::ConfigError { .. }
            | PlannerError::MissingConfigError { .. }
            | PlannerError::InvalidConfigValueError { .. }
            | PlannerError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            PlannerError::CsvError(_)
            | PlannerError::ValidationError { .. }
            | PlannerError::ProcessingError { .. } => ErrorCategory::Input,
            PlannerError::LayoutError { .. } | PlannerError::InfeasibleError { .. } => {
                ErrorCategory::Solver
            }
            PlannerError::ZipError(_)
            | PlannerError::IoError(_)
            | PlannerError::SerializationError(_) => ErrorCategory::Output,
            PlannerError::HttpError(_) => ErrorCategory::Network,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Solver => {
                ErrorSeverity::High
            }
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlannerError::MissingConfigError { .. } => "Add the missing field to the configuration file",
            PlannerError::InvalidConfigValueError { .. }
            | PlannerError::ConfigValidationError { .. }
            | PlannerError::ConfigError { .. } => "Check the configuration values and try again",
            PlannerError::LayoutError { .. } => {
                "Check the column count, rows per column and aisle positions"
            }
            PlannerError::InfeasibleError { .. } => "Add more seats or reduce the roster",
            PlannerError::CsvError(_) | PlannerError::ProcessingError { .. } => {
                "Make sure the roster and preference sheets are valid CSV files"
            }
            PlannerError::ValidationError { .. } => "Review the input data for duplicates or typos",
            PlannerError::HttpError(_) => "Check that the server is running and reachable",
            PlannerError::IoError(_) | PlannerError::ZipError(_) => {
                "Check file paths and write permissions"
            }
            PlannerError::SerializationError(_) => "Report this issue with the input that caused it",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("配置錯誤: {}", self),
            ErrorCategory::Input => format!("輸入資料錯誤: {}", self),
            ErrorCategory::Solver => format!("無法產生座位方案: {}", self),
            ErrorCategory::Output => format!("輸出失敗: {}", self),
            ErrorCategory::Network => format!("網路錯誤: {}", self),
        }
    }

    /// 建立驗證錯誤的便捷方法
    pub fn validation(message: impl Into<String>) -> Self {
        PlannerError::ValidationError {
            message: message.into(),
        }
    }

    pub fn layout(message: impl Into<String>) -> Self {
        PlannerError::LayoutError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let err = PlannerError::layout("no columns");
        assert_eq!(err.category(), ErrorCategory::Solver);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = PlannerError::IoError(std::io::Error::other("disk full"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_friendly_message_contains_detail() {
        let err = PlannerError::InfeasibleError {
            message: "seats (4) fewer than people (5)".to_string(),
        };
        let msg = err.user_friendly_message();
        assert!(msg.contains("seats (4) fewer than people (5)"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorSeverity::Medium.exit_code(), 2);
        assert_eq!(PlannerError::validation("x").severity().exit_code(), 1);
        assert_eq!(ErrorSeverity::Critical.exit_code(), 3);
    }
}
