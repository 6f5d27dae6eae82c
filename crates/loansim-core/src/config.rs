use crate::error::{Result, SimError};
use crate::types::{DueTime, Stage};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// DelayTable
// ---------------------------------------------------------------------------

/// Per-stage processing delays in minutes. These model realistic
/// stage-processing latency and are the pacing knob for the whole simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayTable {
    #[serde(default = "default_application_minutes")]
    pub application: i64,
    #[serde(default = "default_documents_minutes")]
    pub documents: i64,
    #[serde(default = "default_underwriting_minutes")]
    pub underwriting: i64,
    #[serde(default = "default_offer_minutes")]
    pub approval_offer: i64,
    /// Applied to any stage without its own entry.
    #[serde(default = "default_fallback_minutes")]
    pub fallback: i64,
}

fn default_application_minutes() -> i64 {
    1
}

fn default_documents_minutes() -> i64 {
    2
}

fn default_underwriting_minutes() -> i64 {
    5
}

fn default_offer_minutes() -> i64 {
    1
}

fn default_fallback_minutes() -> i64 {
    1
}

impl Default for DelayTable {
    fn default() -> Self {
        Self {
            application: default_application_minutes(),
            documents: default_documents_minutes(),
            underwriting: default_underwriting_minutes(),
            approval_offer: default_offer_minutes(),
            fallback: default_fallback_minutes(),
        }
    }
}

impl DelayTable {
    pub fn minutes_for(&self, stage: Stage) -> i64 {
        match stage {
            Stage::Application => self.application,
            Stage::Documents => self.documents,
            Stage::Underwriting => self.underwriting,
            Stage::ApprovalOffer => self.approval_offer,
            _ => self.fallback,
        }
    }

    /// The earliest time the next handler for an actor leaving `stage` may
    /// run: `now` plus that stage's configured delay.
    pub fn due_time(&self, stage: Stage, now: DateTime<Utc>) -> DueTime {
        DueTime::At(now + Duration::minutes(self.minutes_for(stage)))
    }
}

// ---------------------------------------------------------------------------
// ChaosConfig
// ---------------------------------------------------------------------------

/// Probabilities gating each chaos behavior at its call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Misclick on the non-interactive help icon during spawn.
    #[serde(default = "default_dead_click")]
    pub dead_click: f64,
    /// Type-then-correct thrashing on the income field.
    #[serde(default = "default_thrash_income")]
    pub thrash_income: f64,
    /// Submit a malformed email first to trigger the validation error.
    #[serde(default = "default_bad_email")]
    pub bad_email: f64,
    /// Rage-click the submit control instead of a single click.
    #[serde(default = "default_rage_submit")]
    pub rage_submit: f64,
    /// Disqualify the actor during underwriting.
    #[serde(default = "default_disqualify")]
    pub disqualify: f64,
    /// Spawn a new actor when below the active cap.
    #[serde(default = "default_spawn")]
    pub spawn: f64,
}

fn default_dead_click() -> f64 {
    0.5
}

fn default_thrash_income() -> f64 {
    0.3
}

fn default_bad_email() -> f64 {
    0.3
}

fn default_rage_submit() -> f64 {
    0.3
}

fn default_disqualify() -> f64 {
    0.1
}

fn default_spawn() -> f64 {
    0.5
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            dead_click: default_dead_click(),
            thrash_income: default_thrash_income(),
            bad_email: default_bad_email(),
            rage_submit: default_rage_submit(),
            disqualify: default_disqualify(),
            spawn: default_spawn(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL of the target loan application.
    #[serde(default = "default_target_url")]
    pub target_url: String,
    /// Path of the durable ledger file.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// localStorage key under which the target application persists its state.
    #[serde(default = "default_state_key")]
    pub state_key: String,
    #[serde(default)]
    pub delays: DelayTable,
    #[serde(default)]
    pub chaos: ChaosConfig,
    /// Spawn decisions only happen while fewer than this many actors are active.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
}

fn default_target_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("simulations.json")
}

fn default_state_key() -> String {
    "swiftloan_demo_state".to_string()
}

fn default_max_active() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            ledger_path: default_ledger_path(),
            state_key: default_state_key(),
            delays: DelayTable::default(),
            chaos: ChaosConfig::default(),
            max_active: default_max_active(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SimError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
