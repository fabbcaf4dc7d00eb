use std::path::Path;

use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Zone archives are only fetched over http(s).
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    let url = Url::parse(url_str.trim())
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        "http" | "https" => Err(invalid(field_name, url_str, "URL has no host")),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

/// Output file path: non-empty and not an existing directory.
pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    if Path::new(path).is_dir() {
        return Err(invalid(field_name, path, "Path points to a directory, expected a file"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
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
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// The report must never overwrite the dataset it is read from.
pub fn validate_distinct_paths(dataset: &str, report: &str) -> Result<()> {
    if Path::new(dataset.trim()) == Path::new(report.trim()) {
        return Err(EtlError::ConfigValidationError {
            field: "paths.report".to_string(),
            message: format!("report path must differ from dataset path ({})", dataset),
        });
    }
    Ok(())
}
