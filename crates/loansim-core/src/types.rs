use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A point in the loan-approval workflow.
///
/// Forward order: `application` → `pre_approval` → `documents` →
/// `underwriting` → `approval_offer` → `disbursed`. `disqualified` is only
/// reachable from `underwriting`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Application,
    PreApproval,
    Documents,
    Underwriting,
    ApprovalOffer,
    Disbursed,
    Disqualified,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Application,
            Stage::PreApproval,
            Stage::Documents,
            Stage::Underwriting,
            Stage::ApprovalOffer,
            Stage::Disbursed,
            Stage::Disqualified,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Application => "application",
            Stage::PreApproval => "pre_approval",
            Stage::Documents => "documents",
            Stage::Underwriting => "underwriting",
            Stage::ApprovalOffer => "approval_offer",
            Stage::Disbursed => "disbursed",
            Stage::Disqualified => "disqualified",
        }
    }

    /// Terminal stages are permanently excluded from scheduling and their
    /// records are never mutated again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Disbursed | Stage::Disqualified)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application" => Ok(Stage::Application),
            "pre_approval" => Ok(Stage::PreApproval),
            "documents" => Ok(Stage::Documents),
            "underwriting" => Ok(Stage::Underwriting),
            "approval_offer" => Ok(Stage::ApprovalOffer),
            "disbursed" => Ok(Stage::Disbursed),
            "disqualified" => Ok(Stage::Disqualified),
            _ => Err(crate::error::SimError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DueTime
// ---------------------------------------------------------------------------

const WIRE_DISBURSED: &str = "DONE (Disbursed)";
const WIRE_DISQUALIFIED: &str = "DONE (Disqualified)";

/// When an actor's next handler may run: an absolute timestamp, or one of
/// the two terminal sentinels written to the ledger as
/// `"DONE (Disbursed)"` / `"DONE (Disqualified)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueTime {
    At(DateTime<Utc>),
    Disbursed,
    Disqualified,
}

impl DueTime {
    /// Timestamps strictly in the past are due; sentinels never are.
    pub fn is_due(self, now: DateTime<Utc>) -> bool {
        matches!(self, DueTime::At(t) if t < now)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DueTime::Disbursed | DueTime::Disqualified)
    }

    pub fn as_wire(&self) -> String {
        match self {
            DueTime::At(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
            DueTime::Disbursed => WIRE_DISBURSED.to_string(),
            DueTime::Disqualified => WIRE_DISQUALIFIED.to_string(),
        }
    }
}

impl fmt::Display for DueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire())
    }
}

impl std::str::FromStr for DueTime {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            WIRE_DISBURSED => Ok(DueTime::Disbursed),
            WIRE_DISQUALIFIED => Ok(DueTime::Disqualified),
            other => DateTime::parse_from_rfc3339(other)
                .map(|t| DueTime::At(t.with_timezone(&Utc)))
                .map_err(|_| crate::error::SimError::InvalidDueTime(other.to_string())),
        }
    }
}

impl Serialize for DueTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for DueTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
