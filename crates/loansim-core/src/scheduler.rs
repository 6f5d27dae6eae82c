//! The root of a run: select due actors, dispatch each to its stage
//! handler in stable ledger order, then decide whether to spawn a new
//! applicant. Strictly single-threaded; one browser session serves the
//! whole run.

use crate::config::Config;
use crate::decision::Decider;
use crate::handlers::{self, StageContext};
use crate::ledger::Ledger;
use crate::surface::Surface;
use crate::types::Stage;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

// ---------------------------------------------------------------------------
// RunOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Due actors dispatched to a handler this run.
    pub handled: usize,
    /// Whether a new applicant record was committed.
    pub spawned: bool,
}

// ---------------------------------------------------------------------------
// run_once
// ---------------------------------------------------------------------------

/// Advance every actor whose next action is due at `now`, then possibly
/// spawn one new applicant. The caller owns ledger persistence and session
/// teardown, which happen exactly once per run on every exit path.
pub fn run_once(
    config: &Config,
    ledger: &mut Ledger,
    surface: &mut dyn Surface,
    decider: &mut dyn Decider,
    now: DateTime<Utc>,
) -> RunOutcome {
    // Counted before any processing; the spawn decision uses this snapshot.
    let active = ledger.active_count();
    info!("run start: {active} active applicants in ledger");

    let mut outcome = RunOutcome::default();

    for record in ledger.records.iter_mut() {
        if !record.is_due(now) {
            continue;
        }
        let mut ctx = StageContext {
            surface: &mut *surface,
            decider: &mut *decider,
            config,
            now,
        };
        match record.status {
            Stage::Application | Stage::PreApproval => {
                // The two earliest stages fold into the documents flow: the
                // injected snapshot carries the advanced status so due-time
                // semantics stay anchored to the documents stage.
                if let Some(obj) = record.state_data.as_object_mut() {
                    obj.insert("status".into(), Value::from(Stage::Documents.as_str()));
                }
                handlers::documents(&mut ctx, record);
            }
            Stage::Documents => handlers::documents(&mut ctx, record),
            Stage::Underwriting => handlers::underwriting(&mut ctx, record),
            Stage::ApprovalOffer => handlers::closing(&mut ctx, record),
            // Terminal records are excluded upstream by the due filter.
            Stage::Disbursed | Stage::Disqualified => continue,
        }
        outcome.handled += 1;
    }

    let should_spawn =
        active == 0 || (active < config.max_active && decider.decide(config.chaos.spawn));
    if should_spawn {
        let mut ctx = StageContext {
            surface,
            decider,
            config,
            now,
        };
        if let Some(record) = handlers::spawn_applicant(&mut ctx) {
            ledger.records.push(record);
            outcome.spawned = true;
        }
    } else if outcome.handled == 0 {
        info!("no actions due and no new applicant created");
    }

    outcome
}
