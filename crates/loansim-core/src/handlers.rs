//! One handler per workflow stage. Each pushes a single actor from its
//! current stage toward the next by driving the interaction surface, then
//! re-reads the application's persisted state and updates the record in
//! place — only on observable forward progress. Interaction failures never
//! propagate past the handler: the record is left unchanged and the actor
//! stays due for a later run.

use crate::chaos;
use crate::config::Config;
use crate::decision::Decider;
use crate::ledger::ActorRecord;
use crate::surface::{controls, Locator, Surface};
use crate::types::{DueTime, Stage};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

// Settle delays after state-changing actions, mirroring human pacing.
const SUBMIT_SETTLE: Duration = Duration::from_secs(2);
const INJECT_SETTLE: Duration = Duration::from_secs(1);
const UPLOAD_SETTLE: Duration = Duration::from_secs(5);
const OFFER_SETTLE: Duration = Duration::from_secs(1);
const READ_ERROR_PAUSE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// StageContext
// ---------------------------------------------------------------------------

/// Everything a stage handler needs for one actor: the live surface, the
/// decision source, configuration, and the run's invocation time.
pub struct StageContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub decider: &'a mut dyn Decider,
    pub config: &'a Config,
    pub now: DateTime<Utc>,
}

impl StageContext<'_> {
    fn due(&self, stage: Stage) -> DueTime {
        self.config.delays.due_time(stage, self.now)
    }

    /// Fill a field, treating failure as "this keystroke never landed".
    fn try_fill(&mut self, target: &Locator, text: &str) {
        if let Err(e) = self.surface.fill(target, text) {
            warn!("could not type into {target}: {e}");
        }
    }

    /// Click a control; `false` means the click observably did not happen.
    fn try_click(&mut self, target: &Locator) -> bool {
        match self.surface.click(target) {
            Ok(()) => true,
            Err(e) => {
                warn!("could not click {target}: {e}");
                false
            }
        }
    }

    /// Seed the target application with an actor's last known state:
    /// navigate, write the persisted snapshot, reload so the UI picks it
    /// up. `false` aborts the handler with the record untouched.
    fn inject(&mut self, state: &Value) -> bool {
        if let Err(e) = self.surface.navigate(&self.config.target_url) {
            error!(
                "could not reach target at {}: {e}",
                self.config.target_url
            );
            return false;
        }
        if let Err(e) = self.surface.write_state(state) {
            warn!("could not inject persisted state: {e}");
            return false;
        }
        if let Err(e) = self.surface.reload() {
            warn!("could not reload after state injection: {e}");
            return false;
        }
        self.surface.settle(INJECT_SETTLE);
        true
    }

    /// Read back the application's persisted snapshot after an action.
    fn read_back(&mut self) -> Option<Value> {
        match self.surface.read_state() {
            Ok(state) => state,
            Err(e) => {
                warn!("could not read back persisted state: {e}");
                None
            }
        }
    }
}

/// Parse the `status` field out of a read-back snapshot. `None` (with a log)
/// leaves the calling handler's record untouched.
fn parse_status(id: &str, state: &Value) -> Option<Stage> {
    match state.get("status").and_then(Value::as_str) {
        Some(raw) => match raw.parse::<Stage>() {
            Ok(stage) => Some(stage),
            Err(e) => {
                error!("read-back state for {id} has an unusable status: {e}");
                None
            }
        },
        None => {
            error!("read-back state for {id} has no status field");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// spawn_applicant
// ---------------------------------------------------------------------------

/// The new-user flow: fill and submit a fresh application with chaos mixed
/// in, then commit a ledger record only if the application observably
/// advanced past the initial stage.
pub fn spawn_applicant(ctx: &mut StageContext) -> Option<ActorRecord> {
    info!("spawning new applicant");
    if let Err(e) = ctx.surface.navigate(&ctx.config.target_url) {
        error!("could not reach target at {}: {e}", ctx.config.target_url);
        return None;
    }
    if let Err(e) = ctx.surface.clear_storage() {
        warn!("could not clear local storage: {e}");
    }
    if let Err(e) = ctx.surface.reload() {
        warn!("could not reload fresh page: {e}");
    }

    let chaos_cfg = ctx.config.chaos.clone();

    if ctx.decider.decide(chaos_cfg.dead_click) {
        chaos::dead_click(ctx.surface, &Locator::id(controls::HELP_ICON));
    }

    let income = Locator::id(controls::INCOME);
    if ctx.decider.decide(chaos_cfg.thrash_income) {
        chaos::thrash_input(ctx.surface, &income, "100", "75000");
    } else {
        ctx.try_fill(&income, "75000");
    }

    let name = format!("Auto User {}", ctx.decider.pick(1000, 9999));
    ctx.try_fill(&Locator::id(controls::APPLICANT_NAME), &name);

    let email_field = Locator::id(controls::EMAIL);
    let amount_field = Locator::id(controls::LOAN_AMOUNT);
    let submit = Locator::id(controls::SUBMIT_APPLICATION);
    let email = format!("auto{}@test.com", ctx.decider.pick(1000, 9999));

    if ctx.decider.decide(chaos_cfg.bad_email) {
        // Submit a malformed address first so the application shows its
        // validation error, let the "user" notice it, then correct it.
        info!("triggering a validation error with a malformed email");
        ctx.try_fill(&email_field, "invalid-email-format");
        ctx.try_fill(&amount_field, "20000");
        ctx.try_click(&submit);
        ctx.surface.settle(READ_ERROR_PAUSE);
        ctx.try_fill(&email_field, &email);
    } else {
        ctx.try_fill(&email_field, &email);
        ctx.try_fill(&amount_field, "20000");
    }

    if ctx.decider.decide(chaos_cfg.rage_submit) {
        chaos::rage_click(ctx.surface, &submit, chaos::DEFAULT_RAGE_CLICKS);
    } else {
        ctx.try_click(&submit);
    }
    ctx.surface.settle(SUBMIT_SETTLE);

    let Some(state) = ctx.read_back() else {
        info!("applicant failed to progress past application");
        return None;
    };
    let status = state.get("status").and_then(Value::as_str);
    if status.is_none() || status == Some(Stage::Application.as_str()) {
        info!("applicant failed to progress past application (likely validation stuck)");
        return None;
    }
    let id = match state.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            warn!("submitted application produced a state snapshot without an id");
            return None;
        }
    };

    let record = ActorRecord {
        id: id.clone(),
        status: Stage::PreApproval,
        next_action_due: ctx.due(Stage::Application),
        state_data: state,
    };
    info!("created applicant {id}");
    Some(record)
}

// ---------------------------------------------------------------------------
// documents
// ---------------------------------------------------------------------------

/// Upload documents for an actor. Idempotent on re-entry: if the target
/// reports no stage change, status stays put but the due time is refreshed.
pub fn documents(ctx: &mut StageContext, record: &mut ActorRecord) {
    info!("processing documents for {}", record.id);
    if !ctx.inject(&record.state_data) {
        return;
    }
    if !ctx.try_click(&Locator::id(controls::UPLOAD_DOCS)) {
        return;
    }
    ctx.surface.settle(UPLOAD_SETTLE);

    let Some(new_state) = ctx.read_back() else {
        return;
    };
    let Some(status) = parse_status(&record.id, &new_state) else {
        return;
    };
    record.state_data = new_state;
    record.status = status;
    record.next_action_due = ctx.due(Stage::Documents);
    info!("{} moved to {}", record.id, record.status);
}

// ---------------------------------------------------------------------------
// underwriting
// ---------------------------------------------------------------------------

/// Underwriting either disqualifies the actor outright (probability-gated)
/// or forces server-side approval via the admin control.
pub fn underwriting(ctx: &mut StageContext, record: &mut ActorRecord) {
    info!("processing underwriting for {}", record.id);
    if !ctx.inject(&record.state_data) {
        return;
    }

    if ctx.decider.decide(ctx.config.chaos.disqualify) {
        info!("{} failed underwriting: disqualified", record.id);
        record.status = Stage::Disqualified;
        record.next_action_due = DueTime::Disqualified;
        // Typed read-modify-write of the persisted snapshot so the target
        // application also shows the terminal status.
        match ctx.surface.read_state() {
            Ok(Some(mut state)) => {
                if let Some(obj) = state.as_object_mut() {
                    obj.insert("status".into(), Value::from(Stage::Disqualified.as_str()));
                    if let Err(e) = ctx.surface.write_state(&state) {
                        warn!("could not persist disqualification for {}: {e}", record.id);
                    }
                } else {
                    warn!(
                        "persisted state for {} is not an object; snapshot left as-is",
                        record.id
                    );
                }
            }
            Ok(None) => warn!("no persisted state to mark disqualified for {}", record.id),
            Err(e) => warn!("could not read state to disqualify {}: {e}", record.id),
        }
        ctx.surface.settle(READ_ERROR_PAUSE);
        return;
    }

    if !ctx.try_click(&Locator::button_label(controls::FORCE_APPROVE_LABEL)) {
        warn!("failed to force approval for {}", record.id);
        return;
    }
    ctx.surface.settle(READ_ERROR_PAUSE);

    let Some(new_state) = ctx.read_back() else {
        return;
    };
    let Some(status) = parse_status(&record.id, &new_state) else {
        return;
    };
    record.state_data = new_state;
    record.status = status;
    record.next_action_due = ctx.due(Stage::Underwriting);
    info!("{} approved, moved to {}", record.id, record.status);
}

// ---------------------------------------------------------------------------
// closing
// ---------------------------------------------------------------------------

/// Accept the offer, tick every disclosure checkbox one at a time, sign,
/// and archive the actor as disbursed. No chaos here: legal and consent
/// steps are modeled as deliberate, not hurried.
pub fn closing(ctx: &mut StageContext, record: &mut ActorRecord) {
    info!("closing loan for {}", record.id);
    if !ctx.inject(&record.state_data) {
        return;
    }
    if !ctx.try_click(&Locator::id(controls::ACCEPT_OFFER)) {
        return;
    }
    ctx.surface.settle(OFFER_SETTLE);

    let checkboxes = match ctx.surface.checkbox_count() {
        Ok(n) => n,
        Err(e) => {
            warn!("could not enumerate disclosure checkboxes: {e}");
            0
        }
    };
    for n in 0..checkboxes {
        ctx.try_click(&Locator::Checkbox(n));
    }
    ctx.try_click(&Locator::id(controls::SIGN_CLOSE));
    ctx.surface.settle(SUBMIT_SETTLE);

    record.status = Stage::Disbursed;
    record.next_action_due = DueTime::Disbursed;
    info!("loan for {} disbursed, archiving", record.id);
}
