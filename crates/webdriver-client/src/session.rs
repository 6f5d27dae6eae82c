use crate::{Result, WebDriverError};
use reqwest::blocking::Client;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// W3C element identifier key used in wire payloads.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// ─── SessionConfig ────────────────────────────────────────────────────────

/// Connection and wait settings for one browser session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the WebDriver endpoint (e.g. a local chromedriver).
    pub webdriver_url: String,
    pub headless: bool,
    pub page_load_timeout: Duration,
    /// Bounded wait applied by [`Session::wait_for`] before failing.
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            page_load_timeout: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

// ─── Element / By ─────────────────────────────────────────────────────────

/// An element handle returned by the remote end. Stale once the page
/// reloads; re-find rather than cache across navigations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) id: String,
}

/// Element location strategy.
#[derive(Debug, Clone)]
pub enum By {
    Css(String),
    XPath(String),
}

impl By {
    pub fn css(selector: impl Into<String>) -> Self {
        By::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        By::XPath(expr.into())
    }

    fn strategy(&self) -> (&'static str, &str) {
        match self {
            By::Css(s) => ("css selector", s),
            By::XPath(s) => ("xpath", s),
        }
    }

    fn describe(&self) -> String {
        let (using, value) = self.strategy();
        format!("{using} '{value}'")
    }
}

// ─── Session ──────────────────────────────────────────────────────────────

/// One live browser session against a WebDriver remote end.
///
/// All calls are blocking JSON-over-HTTP per the W3C protocol; every
/// response is unwrapped from the `{"value": …}` envelope, and non-2xx
/// responses surface as [`WebDriverError::Protocol`].
pub struct Session {
    http: Client,
    base: String,
    session_id: String,
    config: SessionConfig,
    open: bool,
}

impl Session {
    /// Create a new browser session with the configured Chrome options.
    pub fn start(config: SessionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let mut args = vec!["--remote-allow-origins=*".to_string()];
        if config.headless {
            args.extend(
                [
                    "--headless",
                    "--window-size=1920,1080",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                ]
                .map(String::from),
            );
        }
        let caps = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let value = decode(
            http.post(format!("{}/session", config.webdriver_url))
                .json(&caps)
                .send()?,
        )?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Decode("new session response without sessionId".into()))?
            .to_string();
        debug!("webdriver session {session_id} started");

        let session = Self {
            base: format!("{}/session/{}", config.webdriver_url, session_id),
            http,
            session_id,
            config,
            open: true,
        };
        session.post(
            "timeouts",
            &json!({ "pageLoad": session.config.page_load_timeout.as_millis() as u64 }),
        )?;
        Ok(session)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    // ── Navigation ──

    pub fn goto(&self, url: &str) -> Result<()> {
        self.post("url", &json!({ "url": url })).map(drop)
    }

    pub fn refresh(&self) -> Result<()> {
        self.post("refresh", &json!({})).map(drop)
    }

    // ── Elements ──

    /// Find a single element, failing immediately if absent.
    pub fn find(&self, by: &By) -> Result<Element> {
        let (using, value) = by.strategy();
        let v = self.post("element", &json!({ "using": using, "value": value }))?;
        element_from_value(&v)
    }

    /// Find all matching elements; absent matches yield an empty list.
    pub fn find_all(&self, by: &By) -> Result<Vec<Element>> {
        let (using, value) = by.strategy();
        let v = self.post("elements", &json!({ "using": using, "value": value }))?;
        let items = v
            .as_array()
            .ok_or_else(|| WebDriverError::Decode("elements response is not a list".into()))?;
        items.iter().map(element_from_value).collect()
    }

    /// Poll [`find`](Self::find) until the element appears or the bounded
    /// wait expires. Protocol errors (element not yet present) retry;
    /// transport errors propagate immediately.
    pub fn wait_for(&self, by: &By) -> Result<Element> {
        let deadline = Instant::now() + self.config.wait_timeout;
        loop {
            match self.find(by) {
                Ok(el) => return Ok(el),
                Err(WebDriverError::Protocol { .. }) if Instant::now() < deadline => {
                    std::thread::sleep(self.config.poll_interval);
                }
                Err(WebDriverError::Protocol { .. }) => {
                    return Err(WebDriverError::WaitTimeout {
                        what: by.describe(),
                        timeout: self.config.wait_timeout,
                    });
                }
                Err(other) => return Err(other),
            }
        }
    }

    pub fn click(&self, el: &Element) -> Result<()> {
        self.post(&format!("element/{}/click", el.id), &json!({}))
            .map(drop)
    }

    pub fn clear(&self, el: &Element) -> Result<()> {
        self.post(&format!("element/{}/clear", el.id), &json!({}))
            .map(drop)
    }

    pub fn send_keys(&self, el: &Element, text: &str) -> Result<()> {
        self.post(&format!("element/{}/value", el.id), &json!({ "text": text }))
            .map(drop)
    }

    // ── Actions ──

    /// Human-like click: pointer travel to the element, a dwell pause,
    /// then press and release.
    pub fn move_pause_click(&self, el: &Element, pause: Duration) -> Result<()> {
        let mut origin = Map::new();
        origin.insert(ELEMENT_KEY.to_string(), Value::String(el.id.clone()));
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [
                    { "type": "pointerMove", "duration": 250, "origin": origin, "x": 0, "y": 0 },
                    { "type": "pause", "duration": pause.as_millis() as u64 },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pointerUp", "button": 0 }
                ]
            }]
        });
        self.post("actions", &actions).map(drop)
    }

    // ── Script & storage ──

    /// Execute a synchronous script with JSON arguments, returning the
    /// script's result value.
    pub fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("execute/sync", &json!({ "script": script, "args": args }))
    }

    pub fn delete_cookies(&self) -> Result<()> {
        self.delete("cookie").map(drop)
    }

    // ── Lifecycle ──

    /// End the session. Consumes the handle; the Drop impl covers the
    /// abnormal exits.
    pub fn quit(mut self) -> Result<()> {
        self.open = false;
        self.delete("").map(drop)
    }

    // ── Wire helpers ──

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        decode(self.http.post(self.endpoint(path)).json(body).send()?)
    }

    fn delete(&self, path: &str) -> Result<Value> {
        decode(self.http.delete(self.endpoint(path)).send()?)
    }

    fn endpoint(&self, path: &str) -> String {
        if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, path)
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.http.delete(self.base.clone()).send() {
                warn!("could not close webdriver session {}: {e}", self.session_id);
            }
        }
    }
}

// ─── Envelope decoding ────────────────────────────────────────────────────

fn decode(resp: reqwest::blocking::Response) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp.json()?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(WebDriverError::Protocol { error, message });
    }
    Ok(value)
}

fn element_from_value(v: &Value) -> Result<Element> {
    v.get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| Element { id: id.to_string() })
        .ok_or_else(|| WebDriverError::Decode("response without an element id".into()))
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_SESSION_BODY: &str =
        r#"{"value":{"sessionId":"sess-1","capabilities":{"browserName":"chrome"}}}"#;

    /// Stand up a mockito server that accepts session creation plus the
    /// initial timeouts call, and return the live session.
    fn fake_session(server: &mut mockito::Server) -> Session {
        server
            .mock("POST", "/session")
            .with_status(200)
            .with_body(NEW_SESSION_BODY)
            .create();
        server
            .mock("POST", "/session/sess-1/timeouts")
            .with_status(200)
            .with_body(r#"{"value":null}"#)
            .create();
        let config = SessionConfig {
            webdriver_url: server.url(),
            wait_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
            ..SessionConfig::default()
        };
        Session::start(config).unwrap()
    }

    #[test]
    fn start_parses_the_session_id() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        assert_eq!(session.session_id(), "sess-1");
    }

    #[test]
    fn protocol_errors_carry_error_and_message() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        server
            .mock("POST", "/session/sess-1/url")
            .with_status(500)
            .with_body(r#"{"value":{"error":"unknown error","message":"boom"}}"#)
            .create();

        let err = session.goto("http://localhost:5173").unwrap_err();
        match err {
            WebDriverError::Protocol { error, message } => {
                assert_eq!(error, "unknown error");
                assert_eq!(message, "boom");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn find_unwraps_the_element_key() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        server
            .mock("POST", "/session/sess-1/element")
            .with_status(200)
            .with_body(format!(
                r#"{{"value":{{"{ELEMENT_KEY}":"el-9"}}}}"#
            ))
            .create();

        let el = session.find(&By::css("#income")).unwrap();
        assert_eq!(el, Element { id: "el-9".into() });
    }

    #[test]
    fn find_all_collects_every_element() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        server
            .mock("POST", "/session/sess-1/elements")
            .with_status(200)
            .with_body(format!(
                r#"{{"value":[{{"{ELEMENT_KEY}":"a"}},{{"{ELEMENT_KEY}":"b"}}]}}"#
            ))
            .create();

        let els = session.find_all(&By::css("input[type='checkbox']")).unwrap();
        assert_eq!(els.len(), 2);
    }

    #[test]
    fn wait_for_times_out_on_persistent_absence() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        server
            .mock("POST", "/session/sess-1/element")
            .with_status(404)
            .with_body(r#"{"value":{"error":"no such element","message":"not found"}}"#)
            .expect_at_least(2)
            .create();

        let err = session.wait_for(&By::css("#missing")).unwrap_err();
        assert!(matches!(err, WebDriverError::WaitTimeout { .. }));
    }

    #[test]
    fn execute_returns_the_script_value() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        server
            .mock("POST", "/session/sess-1/execute/sync")
            .with_status(200)
            .with_body(r#"{"value":"{\"id\":1}"}"#)
            .create();

        let v = session
            .execute("return window.localStorage.getItem(arguments[0]);", vec![])
            .unwrap();
        assert_eq!(v, Value::String("{\"id\":1}".into()));
    }

    #[test]
    fn quit_closes_the_session() {
        let mut server = mockito::Server::new();
        let session = fake_session(&mut server);
        let m = server
            .mock("DELETE", "/session/sess-1")
            .with_status(200)
            .with_body(r#"{"value":null}"#)
            .create();

        session.quit().unwrap();
        m.assert();
    }
}
