//! Stored flag model: what the Flag Store persists and returns.
//!
//! A [`FeatureFlag`] is a named master switch plus an ordered list of typed
//! [`Filter`]s. Filters are a closed set of variants ([`FilterSettings`]), each
//! carrying only the fields meaningful for its kind, so the mapper and the
//! validator can dispatch exhaustively.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[allow(missing_docs)]
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Maximum allowed length for a flag name.
pub const MAX_FLAG_NAME_LENGTH: usize = 100;

/// A stored feature flag with its filters.
///
/// `status` is the master on/off switch: when it is `false`, the flag is
/// disabled regardless of filter content. Filters are kept in their stored
/// order; the ordinal position of a filter is stable and is used to attribute
/// validation errors to the right filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub id: i64,
    /// Unique flag name, at most [`MAX_FLAG_NAME_LENGTH`] characters.
    pub name: String,
    /// Master switch. `false` means the flag never evaluates to enabled.
    pub status: bool,
    pub requirement_type: RequirementType,
    /// Optimistic-concurrency token; bumped by the store on every save.
    #[serde(default)]
    pub updated_date: Option<Timestamp>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// How multiple filters combine for a single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequirementType {
    /// Flag is enabled if any filter matches.
    #[default]
    Any,
    /// Flag is enabled only if all filters match.
    All,
}

/// A typed filter row belonging to exactly one flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub id: i64,
    #[serde(flatten)]
    pub settings: FilterSettings,
}

/// The closed set of filter kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filterType")]
pub enum FilterSettings {
    /// Per-user allow/deny lists.
    Targeting(TargetingSettings),
    /// Absolute or recurring time window.
    TimeWindow(TimeWindowSettings),
    /// Deterministic percentage rollout.
    Percentage(PercentageSettings),
    /// Escape hatch: an opaque JSON blob naming an externally-registered filter.
    Json(JsonSettings),
}

impl FilterSettings {
    /// Reconstruct filter settings from a raw store row: a type discriminator
    /// plus a JSON payload of the type-specific fields.
    ///
    /// A discriminator outside the known set is an invariant violation from
    /// upstream storage and is reported as [`Error::UnsupportedFilterType`].
    pub fn from_stored(kind: &str, payload: &serde_json::Value) -> Result<FilterSettings> {
        let settings = match kind {
            "Targeting" => FilterSettings::Targeting(serde_json::from_value(payload.clone())?),
            "TimeWindow" => FilterSettings::TimeWindow(serde_json::from_value(payload.clone())?),
            "Percentage" => FilterSettings::Percentage(serde_json::from_value(payload.clone())?),
            "Json" => FilterSettings::Json(serde_json::from_value(payload.clone())?),
            other => return Err(Error::UnsupportedFilterType(other.to_owned())),
        };
        Ok(settings)
    }

    /// The discriminator name for this filter kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FilterSettings::Targeting(_) => "Targeting",
            FilterSettings::TimeWindow(_) => "TimeWindow",
            FilterSettings::Percentage(_) => "Percentage",
            FilterSettings::Json(_) => "Json",
        }
    }
}

/// Included/excluded user lists for a targeting filter.
///
/// Stored as child rows (`user` + `include` flag); blank entries may appear in
/// storage and are skipped at mapping time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetingSettings {
    #[serde(default)]
    pub included_users: Vec<String>,
    #[serde(default)]
    pub excluded_users: Vec<String>,
}

/// Time-window filter fields, including the optional recurrence pattern and
/// range. All fields are optional in storage; [`crate::recurrence`] decides
/// which combinations are internally consistent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowSettings {
    #[serde(default)]
    pub start: Option<Timestamp>,
    #[serde(default)]
    pub end: Option<Timestamp>,
    #[serde(default)]
    pub recurrence_type: Option<RecurrenceType>,
    #[serde(default)]
    pub recurrence_interval: Option<i32>,
    #[serde(default)]
    pub days_of_week: Vec<DayOfWeek>,
    #[serde(default)]
    pub first_day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub recurrence_range_type: Option<RecurrenceRangeType>,
    #[serde(default)]
    pub recurrence_end_date: Option<Timestamp>,
    #[serde(default)]
    pub recurrence_occurrences: Option<i32>,
}

/// Repeating schedule kind for a time-window filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceType {
    Daily,
    Weekly,
}

impl RecurrenceType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "Daily",
            RecurrenceType::Weekly => "Weekly",
        }
    }
}

/// Bound on how long a recurrence continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceRangeType {
    /// Recur until `recurrence_end_date`.
    EndDate,
    /// Recur for `recurrence_occurrences` occurrences.
    Numbered,
}

impl RecurrenceRangeType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RecurrenceRangeType::EndDate => "EndDate",
            RecurrenceRangeType::Numbered => "Numbered",
        }
    }
}

/// Percentage filter fields. `value` must lie in `[0, 100]` to pass
/// validation; an absent value maps to 0 at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageSettings {
    #[serde(default)]
    pub value: Option<i32>,
}

/// Opaque JSON filter blob. Meaningful only when it deserializes to an object
/// with a non-blank `name` field and an optional `parameters` map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSettings {
    #[serde(default)]
    pub json: Option<String>,
}

/// Day of the week, ordered the way stores and wire parameters spell it
/// (full English day names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    /// Full day name, matching the wire parameter spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        }
    }

    fn index(self) -> u32 {
        match self {
            DayOfWeek::Sunday => 0,
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
        }
    }

    /// Offset in days from `first` to `self`, wrapping around the week.
    /// Always in `0..7`.
    pub fn days_from(self, first: DayOfWeek) -> u32 {
        (self.index() + 7 - first.index()) % 7
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(value: chrono::Weekday) -> DayOfWeek {
        match value {
            chrono::Weekday::Sun => DayOfWeek::Sunday,
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
