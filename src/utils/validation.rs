use crate::utils::error::{PlannerError, Result};
use std::collections::HashSet;
use std::net::IpAddr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_bind_address(field_name: &str, address: &str) -> Result<()> {
    address
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|e| PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: address.to_string(),
            reason: format!("Not an IP address: {}", e),
        })
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PlannerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        let extension = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if allowed_set.contains(ext.as_str()) => {}
            Some(ext) => {
                return Err(PlannerError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        ext,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(PlannerError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PlannerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bind_address() {
        assert!(validate_bind_address("server.address", "0.0.0.0").is_ok());
        assert!(validate_bind_address("server.address", "::1").is_ok());
        assert!(validate_bind_address("server.address", "localhost").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("health_url", "http://127.0.0.1:8501/_stcore/health").is_ok());
        assert!(validate_url("health_url", "").is_err());
        assert!(validate_url("health_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["roster.csv".to_string(), "prefs.CSV".to_string()];
        assert!(validate_file_extensions("input", &files, &["csv"]).is_ok());

        let invalid = vec!["roster.xlsx".to_string()];
        assert!(validate_file_extensions("input", &invalid, &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("solver.top_n", 3, 1, 10).is_ok());
        assert!(validate_range("solver.top_n", 0, 1, 10).is_err());
        assert!(validate_range("solver.time_limit_seconds", 61.0, 1.0, 60.0).is_err());
    }
}
