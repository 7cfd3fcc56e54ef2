//! Structural validation of a flag's filter list.
//!
//! Runs before persistence. Unlike the mapper, which must stay lenient at read
//! time, validation is strict: a blank or unparsable JSON filter is a hard
//! error here even though the mapper would silently skip it. Validators return
//! every failure as a value; an empty list means the filters are valid.

use serde_json::Value;

use crate::flags::{
    FeatureFlag, Filter, FilterSettings, JsonSettings, PercentageSettings, TargetingSettings,
};
use crate::recurrence::{validate_time_window, TimeWindowViolation};

/// A single validation failure, attributed to the filter it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Ordinal position of the offending filter in the stored filter list.
    pub filter_index: usize,
    pub kind: ValidationErrorKind,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter {}: {}", self.filter_index, self.kind)
    }
}

/// The kinds of validation failure a filter can produce.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationErrorKind {
    /// Targeting filter with neither included nor excluded users.
    #[error("targeting filter requires at least one included or excluded user")]
    EmptyTargetingAudience,

    /// A time-window inconsistency, carrying the field it concerns.
    #[error("{0}")]
    TimeWindow(TimeWindowViolation),

    /// Percentage value absent or outside `[0, 100]`.
    #[error("percentage value must be between 0 and 100")]
    PercentageOutOfRange,

    /// JSON filter with a blank body.
    #[error("JSON filter body is required")]
    MissingJson,

    /// JSON filter body that does not parse to an object with a non-blank
    /// `name` field.
    #[error("JSON filter body has an invalid format")]
    InvalidJsonFormat,
}

/// Validate every filter of a flag. The flag's master switch and name are the
/// store's concern; only filters are checked here.
pub fn validate_flag(flag: &FeatureFlag) -> Vec<ValidationError> {
    validate_filters(&flag.filters)
}

/// Validate a proposed filter list, returning all failures tagged with the
/// index of the filter they belong to.
pub fn validate_filters(filters: &[Filter]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (index, filter) in filters.iter().enumerate() {
        match &filter.settings {
            FilterSettings::Targeting(settings) => validate_targeting(index, settings, &mut errors),
            FilterSettings::TimeWindow(settings) => {
                errors.extend(validate_time_window(settings).into_iter().map(|violation| {
                    ValidationError {
                        filter_index: index,
                        kind: ValidationErrorKind::TimeWindow(violation),
                    }
                }));
            }
            FilterSettings::Percentage(settings) => {
                validate_percentage(index, settings, &mut errors)
            }
            FilterSettings::Json(settings) => validate_json(index, settings, &mut errors),
        }
    }

    errors
}

fn validate_targeting(
    index: usize,
    settings: &TargetingSettings,
    errors: &mut Vec<ValidationError>,
) {
    let has_audience = settings
        .included_users
        .iter()
        .chain(&settings.excluded_users)
        .any(|user| !user.trim().is_empty());
    if !has_audience {
        errors.push(ValidationError {
            filter_index: index,
            kind: ValidationErrorKind::EmptyTargetingAudience,
        });
    }
}

fn validate_percentage(
    index: usize,
    settings: &PercentageSettings,
    errors: &mut Vec<ValidationError>,
) {
    if !settings.value.is_some_and(|value| (0..=100).contains(&value)) {
        errors.push(ValidationError {
            filter_index: index,
            kind: ValidationErrorKind::PercentageOutOfRange,
        });
    }
}

fn validate_json(index: usize, settings: &JsonSettings, errors: &mut Vec<ValidationError>) {
    let blob = settings.json.as_deref().unwrap_or("").trim();
    if blob.is_empty() {
        errors.push(ValidationError {
            filter_index: index,
            kind: ValidationErrorKind::MissingJson,
        });
        return;
    }

    let has_name = serde_json::from_str::<Value>(blob)
        .ok()
        .as_ref()
        .and_then(|value| value.get("name"))
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        errors.push(ValidationError {
            filter_index: index,
            kind: ValidationErrorKind::InvalidJsonFormat,
        });
    }
}
