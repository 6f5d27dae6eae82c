//! Interaction patterns that mimic frustrated or careless human input.
//!
//! Every behavior here is best-effort and non-fatal: chaos may degrade the
//! realism of a run, never its liveness. Probability gating happens at the
//! call sites in the stage handlers.

use crate::surface::{Locator, Surface, SurfaceError};
use std::time::Duration;
use tracing::{debug, warn};

/// Reference click count for [`rage_click`].
pub const DEFAULT_RAGE_CLICKS: u32 = 5;

const RAGE_INTERVAL: Duration = Duration::from_millis(100);
const HESITATION: Duration = Duration::from_millis(1500);
const RECONSIDER: Duration = Duration::from_millis(500);
const MISCLICK_DWELL: Duration = Duration::from_millis(500);

/// Click an element `times` times in rapid succession, modeling frustrated
/// repeated clicking on a slow-to-respond control. The first failure logs
/// and aborts the whole behavior; nothing is retried.
pub fn rage_click(surface: &mut dyn Surface, target: &Locator, times: u32) {
    debug!("rage clicking {target} {times} times");
    for n in 1..=times {
        if let Err(e) = surface.quick_click(target) {
            warn!("rage click {n}/{times} on {target} failed: {e}");
            return;
        }
        surface.settle(RAGE_INTERVAL);
    }
}

/// Move the pointer to a deliberately non-interactive element and click it,
/// modeling an accidental misclick. Failures are swallowed; this must never
/// affect the outer flow.
pub fn dead_click(surface: &mut dyn Surface, target: &Locator) {
    debug!("misclicking non-interactive element {target}");
    if surface.click(target).is_ok() {
        surface.settle(MISCLICK_DWELL);
    }
}

/// Type the wrong text, hesitate, select-all and delete, then type the
/// right text. Failures are logged, not propagated.
pub fn thrash_input(surface: &mut dyn Surface, target: &Locator, wrong: &str, right: &str) {
    debug!("thrashing input {target}");
    let attempt = (|| -> Result<(), SurfaceError> {
        surface.fill(target, wrong)?;
        surface.settle(HESITATION);
        surface.clear_field(target)?;
        surface.settle(RECONSIDER);
        surface.fill(target, right)?;
        Ok(())
    })();
    if let Err(e) = attempt {
        warn!("input thrash on {target} failed: {e}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    /// Records every surface call; clicks fail after `fail_after` successes.
    #[derive(Default)]
    struct Tape {
        calls: Vec<String>,
        fail_after: Option<usize>,
        clicks: usize,
    }

    impl Surface for Tape {
        fn navigate(&mut self, url: &str) -> Result<(), SurfaceError> {
            self.calls.push(format!("navigate {url}"));
            Ok(())
        }
        fn reload(&mut self) -> Result<(), SurfaceError> {
            self.calls.push("reload".into());
            Ok(())
        }
        fn click(&mut self, target: &Locator) -> Result<(), SurfaceError> {
            self.calls.push(format!("click {target}"));
            Ok(())
        }
        fn quick_click(&mut self, target: &Locator) -> Result<(), SurfaceError> {
            self.clicks += 1;
            if self.fail_after.is_some_and(|n| self.clicks > n) {
                return Err(SurfaceError::NotReady(target.clone()));
            }
            self.calls.push(format!("quick_click {target}"));
            Ok(())
        }
        fn fill(&mut self, target: &Locator, text: &str) -> Result<(), SurfaceError> {
            self.calls.push(format!("fill {target} '{text}'"));
            Ok(())
        }
        fn clear_field(&mut self, target: &Locator) -> Result<(), SurfaceError> {
            self.calls.push(format!("clear {target}"));
            Ok(())
        }
        fn checkbox_count(&mut self) -> Result<usize, SurfaceError> {
            Ok(0)
        }
        fn read_state(&mut self) -> Result<Option<Value>, SurfaceError> {
            Ok(None)
        }
        fn write_state(&mut self, _state: &Value) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn clear_storage(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn delete_cookies(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn settle(&mut self, _wait: Duration) {}
    }

    #[test]
    fn rage_click_clicks_n_times() {
        let mut tape = Tape::default();
        rage_click(&mut tape, &Locator::id("btn-submit-application"), 5);
        let clicks = tape
            .calls
            .iter()
            .filter(|c| c.starts_with("quick_click"))
            .count();
        assert_eq!(clicks, 5);
    }

    #[test]
    fn rage_click_aborts_on_first_failure() {
        let mut tape = Tape {
            fail_after: Some(2),
            ..Tape::default()
        };
        rage_click(&mut tape, &Locator::id("btn-submit-application"), 5);
        // Two successful clicks, then the third fails and the behavior stops.
        assert_eq!(tape.clicks, 3);
    }

    #[test]
    fn thrash_input_types_wrong_then_right() {
        let mut tape = Tape::default();
        thrash_input(&mut tape, &Locator::id("income"), "100", "75000");
        assert_eq!(
            tape.calls,
            vec![
                "fill #income '100'",
                "clear #income",
                "fill #income '75000'",
            ]
        );
    }

    #[test]
    fn dead_click_is_silent_on_failure() {
        struct NothingClickable;
        impl Surface for NothingClickable {
            fn navigate(&mut self, _: &str) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn reload(&mut self) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn click(&mut self, target: &Locator) -> Result<(), SurfaceError> {
                Err(SurfaceError::NotReady(target.clone()))
            }
            fn quick_click(&mut self, target: &Locator) -> Result<(), SurfaceError> {
                Err(SurfaceError::NotReady(target.clone()))
            }
            fn fill(&mut self, _: &Locator, _: &str) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn clear_field(&mut self, _: &Locator) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn checkbox_count(&mut self) -> Result<usize, SurfaceError> {
                Ok(0)
            }
            fn read_state(&mut self) -> Result<Option<Value>, SurfaceError> {
                Ok(None)
            }
            fn write_state(&mut self, _: &Value) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn clear_storage(&mut self) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn delete_cookies(&mut self) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn settle(&mut self, _: Duration) {}
        }

        // Must not panic or propagate anything.
        dead_click(&mut NothingClickable, &Locator::id("dead-click-help"));
    }
}
