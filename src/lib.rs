//! `featuregate_core` is the filter evaluation and validation engine behind
//! the FeatureGate flag management service.
//!
//! # Overview
//!
//! A stored [`FeatureFlag`] is a named master switch plus an ordered list of
//! typed filters (targeting, time window, percentage, or an opaque JSON
//! escape hatch). The engine's job is to turn that stored shape into an
//! evaluation-ready [`FeatureDefinition`](definition::FeatureDefinition) for a
//! generic filter runtime, and to check a proposed filter set before it is
//! persisted. It deliberately does *not* fetch flags on its own, cache
//! results, authorize anyone, or combine filters — those belong to the
//! surrounding service.
//!
//! [`mapper::map_flag`] is the read path: a pure function from a stored flag
//! to its wire definition, resilient to malformed data that slipped into
//! storage. [`validation::validate_filters`] is the write path: strict,
//! returning every violation at once, each tagged with the index of the
//! filter it belongs to. The asymmetry is intentional — validation runs once
//! before a save, mapping runs on every read and must never fail a flag that
//! has to keep evaluating.
//!
//! [`recurrence::validate_time_window`] checks that a recurring time window is
//! internally consistent (positive intervals, weekday gaps, the long-duration
//! guard). [`bucketing`] assigns identified subjects a deterministic rollout
//! bucket and randomizes anonymous ones.
//!
//! [`provider::DefinitionProvider`] is how a filter runtime reads
//! definitions: backed by a local [`store::FlagStore`], a remote flag service
//! ([`remote_provider::RemoteDefinitionProvider`]), or a preloaded static
//! set. Backend failures never reach the runtime; providers log them and
//! serve empty results instead.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod bucketing;
pub mod definition;
pub mod mapper;
pub mod provider;
pub mod recurrence;
pub mod remote_provider;
pub mod store;
pub mod validation;

mod error;
mod flags;

pub use error::{Error, Result};
pub use flags::{
    DayOfWeek, FeatureFlag, Filter, FilterSettings, JsonSettings, PercentageSettings,
    RecurrenceRangeType, RecurrenceType, RequirementType, TargetingSettings, TimeWindowSettings,
    Timestamp, MAX_FLAG_NAME_LENGTH,
};
