//! Mapping stored flags to evaluation-ready definitions.
//!
//! [`map_flag`] is a pure function: same stored flag in, byte-identical
//! definition out, including parameter ordering. It runs on every read path,
//! so it must tolerate whatever storage hands it; a JSON filter that fails to
//! parse contributes nothing here even though the validator rejects the same
//! blob before save.

use serde_json::Value;

use crate::definition::{
    format_rfc1123, DefinitionStatus, FeatureDefinition, FilterConfiguration, Parameters,
};
use crate::flags::{
    FeatureFlag, FilterSettings, JsonSettings, PercentageSettings, TargetingSettings,
    TimeWindowSettings,
};

/// Translate a stored flag and its filters into the wire definition consumed
/// by the filter runtime.
pub fn map_flag(flag: &FeatureFlag) -> FeatureDefinition {
    if !flag.status {
        return FeatureDefinition {
            name: flag.name.clone(),
            enabled_for: Vec::new(),
            requirement_type: flag.requirement_type,
            status: DefinitionStatus::Disabled,
            allocation: None,
            variants: None,
            telemetry: None,
        };
    }

    let mut enabled_for: Vec<FilterConfiguration> = flag
        .filters
        .iter()
        .filter_map(|filter| match &filter.settings {
            FilterSettings::Targeting(settings) => Some(map_targeting(settings)),
            FilterSettings::TimeWindow(settings) => Some(map_time_window(settings)),
            FilterSettings::Percentage(settings) => Some(map_percentage(settings)),
            FilterSettings::Json(settings) => map_json(&flag.name, settings),
        })
        .collect();

    // A conditional flag with nothing to condition on is unconditionally on.
    if enabled_for.is_empty() {
        enabled_for.push(FilterConfiguration::new("AlwaysOn"));
    }

    FeatureDefinition {
        name: flag.name.clone(),
        enabled_for,
        requirement_type: flag.requirement_type,
        status: DefinitionStatus::Conditional,
        allocation: None,
        variants: None,
        telemetry: None,
    }
}

fn map_targeting(settings: &TargetingSettings) -> FilterConfiguration {
    let mut configuration = FilterConfiguration::new("Targeting");

    for (i, user) in non_blank(&settings.included_users).enumerate() {
        configuration
            .parameters
            .insert(format!("Audience:Users:{i}"), user);
    }
    for (i, user) in non_blank(&settings.excluded_users).enumerate() {
        configuration
            .parameters
            .insert(format!("Audience:Exclusion:Users:{i}"), user);
    }

    configuration
}

fn non_blank(users: &[String]) -> impl Iterator<Item = &str> {
    users.iter().map(|user| user.trim()).filter(|user| !user.is_empty())
}

fn map_time_window(settings: &TimeWindowSettings) -> FilterConfiguration {
    let mut configuration = FilterConfiguration::new("TimeWindow");
    let parameters = &mut configuration.parameters;

    if let Some(start) = &settings.start {
        parameters.insert("Start", format_rfc1123(start));
    }
    if let Some(end) = &settings.end {
        parameters.insert("End", format_rfc1123(end));
    }

    if let Some(recurrence_type) = settings.recurrence_type {
        parameters.insert("Recurrence:Pattern:Type", recurrence_type.as_str());
        if let Some(interval) = settings.recurrence_interval {
            parameters.insert("Recurrence:Pattern:Interval", interval.to_string());
        }
        for (i, day) in settings.days_of_week.iter().enumerate() {
            parameters.insert(format!("Recurrence:Pattern:DaysOfWeek:{i}"), day.as_str());
        }
        if let Some(first_day) = settings.first_day_of_week {
            parameters.insert("Recurrence:Pattern:FirstDayOfWeek", first_day.as_str());
        }
    }

    if let Some(range_type) = settings.recurrence_range_type {
        parameters.insert("Recurrence:Range:Type", range_type.as_str());
        if let Some(end_date) = &settings.recurrence_end_date {
            parameters.insert("Recurrence:Range:EndDate", format_rfc1123(end_date));
        }
        if let Some(occurrences) = settings.recurrence_occurrences {
            parameters.insert(
                "Recurrence:Range:NumberOfOccurrences",
                occurrences.to_string(),
            );
        }
    }

    configuration
}

fn map_percentage(settings: &PercentageSettings) -> FilterConfiguration {
    let mut configuration = FilterConfiguration::new("Percentage");
    configuration
        .parameters
        .insert("Value", settings.value.unwrap_or(0).to_string());
    configuration
}

/// Map the JSON escape-hatch filter. A blank or unparsable blob, or one
/// without a non-blank `name`, contributes nothing: rejecting it is the
/// validator's job, but a flag that slipped past validation must still
/// evaluate.
fn map_json(flag_name: &str, settings: &JsonSettings) -> Option<FilterConfiguration> {
    let blob = settings.json.as_deref().unwrap_or("").trim();
    if blob.is_empty() {
        return None;
    }

    let parsed: Value = match serde_json::from_str(blob) {
        Ok(value) => value,
        Err(err) => {
            log::trace!(target: "featuregate",
                        flag_name;
                        "dropping unparsable JSON filter: {err}");
            return None;
        }
    };

    let name = parsed.get("name").and_then(Value::as_str).map(str::trim);
    let Some(name) = name.filter(|name| !name.is_empty()) else {
        log::trace!(target: "featuregate",
                    flag_name;
                    "dropping JSON filter without a name");
        return None;
    };

    let mut configuration = FilterConfiguration::new(name);
    if let Some(extra) = parsed.get("parameters") {
        flatten_value("parameters", extra, &mut configuration.parameters);
    }
    Some(configuration)
}

/// Flatten a JSON value into string parameters, joining object keys and array
/// indices into `:`-separated paths. Nulls carry no value and are skipped.
fn flatten_value(prefix: &str, value: &Value, parameters: &mut Parameters) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_value(&format!("{prefix}:{key}"), nested, parameters);
            }
        }
        Value::Array(items) => {
            for (i, nested) in items.iter().enumerate() {
                flatten_value(&format!("{prefix}:{i}"), nested, parameters);
            }
        }
        Value::String(s) => parameters.insert(prefix, s),
        Value::Number(n) => parameters.insert(prefix, n.to_string()),
        Value::Bool(b) => parameters.insert(prefix, b.to_string()),
        Value::Null => {}
    }
}
