/// Observation validity rules.
///
/// Two stages, applied in order:
///   1. freshness - an observation older than `max_age` is stale
///   2. domain rule - a per-kind plausibility check (see `model::KIND_TABLE`)
///
/// A rejected observation is not an error: the fetch succeeded and the
/// resulting record is simply stored with `valid = false`.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Observation, ParameterKind};

// ---------------------------------------------------------------------------
// Domain rules
// ---------------------------------------------------------------------------

/// Plausibility rule attached to a parameter kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DomainRule {
    /// No check beyond freshness.
    Any,
    /// Value must be > 0.
    Positive,
    /// Value must be > 0 at stations above `elevation_m`. Stations at or
    /// near sea level may legitimately read zero or below.
    PositiveAboveElevation { elevation_m: f64 },
}

impl DomainRule {
    /// Returns a short reason when `value` violates the rule.
    pub fn check(self, value: f64, station_masl: f64) -> Option<&'static str> {
        match self {
            DomainRule::Any => None,
            DomainRule::Positive if value <= 0.0 => Some("non-positive value"),
            DomainRule::Positive => None,
            DomainRule::PositiveAboveElevation { elevation_m }
                if station_masl > elevation_m && value <= 0.0 =>
            {
                Some("non-positive value above sea level")
            }
            DomainRule::PositiveAboveElevation { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Outcome of validating one observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid,
    Stale { age: Duration },
    Implausible { reason: &'static str },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Validates an observation for a series of `kind` at a station with
/// elevation `station_masl`, as of `now`.
///
/// Observations timestamped in the future count as fresh.
pub fn assess(
    observation: &Observation,
    kind: ParameterKind,
    station_masl: f64,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Verdict {
    let age = now - observation.observed_at;
    if age > max_age {
        return Verdict::Stale { age };
    }

    match kind.rule().check(observation.value, station_masl) {
        Some(reason) => Verdict::Implausible { reason },
        None => Verdict::Valid,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
