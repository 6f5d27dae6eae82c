//! The production interaction surface: `loansim_core::surface::Surface`
//! implemented on top of a live WebDriver session.

use loansim_core::surface::{Locator, Surface, SurfaceError};
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};
use webdriver_client::{keys, By, Element, Session, WebDriverError};

const CHECKBOX_SELECTOR: &str = "input[type='checkbox']";

pub struct WebDriverSurface {
    session: Session,
    state_key: String,
}

impl WebDriverSurface {
    pub fn new(session: Session, state_key: impl Into<String>) -> Self {
        Self {
            session,
            state_key: state_key.into(),
        }
    }

    /// Clear session-local browser state and end the session. Best-effort:
    /// teardown runs on every exit path and must not mask the run result.
    pub fn teardown(self) {
        let _ = self.session.delete_cookies();
        let _ = self
            .session
            .execute("window.localStorage.clear();", vec![]);
        info!("closing browser session");
        if let Err(e) = self.session.quit() {
            warn!("browser session did not close cleanly: {e}");
        }
    }

    fn resolve(&self, target: &Locator) -> Result<Element, SurfaceError> {
        let by = match target {
            Locator::Id(id) => By::css(format!("#{id}")),
            Locator::ButtonLabel(label) => {
                By::xpath(format!("//button[contains(text(), '{label}')]"))
            }
            Locator::Checkbox(n) => {
                // Checkbox handles go stale across reloads; re-enumerate on
                // every resolution.
                let all = self
                    .session
                    .find_all(&By::css(CHECKBOX_SELECTOR))
                    .map_err(|e| locate_err(target, e))?;
                return all
                    .get(*n)
                    .cloned()
                    .ok_or_else(|| SurfaceError::NotReady(target.clone()));
            }
        };
        self.session.wait_for(&by).map_err(|e| locate_err(target, e))
    }

    /// Simulated pointer-travel latency so no interaction is instantaneous.
    fn pointer_pause() -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(500..=1500))
    }
}

fn locate_err(target: &Locator, e: WebDriverError) -> SurfaceError {
    match e {
        WebDriverError::WaitTimeout { .. } => SurfaceError::NotReady(target.clone()),
        WebDriverError::Http(e) => SurfaceError::Connection(e.to_string()),
        other => SurfaceError::Script(other.to_string()),
    }
}

fn wire_err(e: WebDriverError) -> SurfaceError {
    match e {
        WebDriverError::Http(e) => SurfaceError::Connection(e.to_string()),
        other => SurfaceError::Script(other.to_string()),
    }
}

impl Surface for WebDriverSurface {
    fn navigate(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.session
            .goto(url)
            .map_err(|e| SurfaceError::Connection(e.to_string()))
    }

    fn reload(&mut self) -> Result<(), SurfaceError> {
        self.session
            .refresh()
            .map_err(|e| SurfaceError::Connection(e.to_string()))
    }

    fn click(&mut self, target: &Locator) -> Result<(), SurfaceError> {
        let el = self.resolve(target)?;
        self.session
            .move_pause_click(&el, Self::pointer_pause())
            .map_err(wire_err)
    }

    fn quick_click(&mut self, target: &Locator) -> Result<(), SurfaceError> {
        let el = self.resolve(target)?;
        self.session.click(&el).map_err(wire_err)
    }

    fn fill(&mut self, target: &Locator, text: &str) -> Result<(), SurfaceError> {
        let el = self.resolve(target)?;
        // Focus with pointer travel first, then clear and type.
        self.session
            .move_pause_click(&el, Self::pointer_pause())
            .map_err(wire_err)?;
        self.session.clear(&el).map_err(wire_err)?;
        self.session.send_keys(&el, text).map_err(wire_err)
    }

    fn clear_field(&mut self, target: &Locator) -> Result<(), SurfaceError> {
        let el = self.resolve(target)?;
        let select_all_delete = format!("{}a{}{}", keys::CONTROL, keys::NULL, keys::DELETE);
        self.session
            .send_keys(&el, &select_all_delete)
            .map_err(wire_err)
    }

    fn checkbox_count(&mut self) -> Result<usize, SurfaceError> {
        self.session
            .find_all(&By::css(CHECKBOX_SELECTOR))
            .map(|els| els.len())
            .map_err(wire_err)
    }

    fn read_state(&mut self) -> Result<Option<Value>, SurfaceError> {
        let raw = self
            .session
            .execute(
                "return window.localStorage.getItem(arguments[0]);",
                vec![json!(self.state_key)],
            )
            .map_err(wire_err)?;
        match raw {
            Value::Null => Ok(None),
            Value::String(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| SurfaceError::State(e.to_string())),
            other => Err(SurfaceError::State(format!(
                "unexpected storage value: {other}"
            ))),
        }
    }

    fn write_state(&mut self, state: &Value) -> Result<(), SurfaceError> {
        // The snapshot travels as a structured script argument; no textual
        // serialization or escaping on this side.
        self.session
            .execute(
                "window.localStorage.setItem(arguments[0], JSON.stringify(arguments[1]));",
                vec![json!(self.state_key), state.clone()],
            )
            .map(drop)
            .map_err(wire_err)
    }

    fn clear_storage(&mut self) -> Result<(), SurfaceError> {
        self.session
            .execute("window.localStorage.clear();", vec![])
            .map(drop)
            .map_err(wire_err)
    }

    fn delete_cookies(&mut self) -> Result<(), SurfaceError> {
        self.session.delete_cookies().map_err(wire_err)
    }

    fn settle(&mut self, wait: Duration) {
        std::thread::sleep(wait);
    }
}
