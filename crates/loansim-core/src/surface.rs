use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stable identifiers of the target application's addressable controls.
pub mod controls {
    pub const INCOME: &str = "income";
    pub const APPLICANT_NAME: &str = "applicantName";
    pub const EMAIL: &str = "email";
    pub const LOAN_AMOUNT: &str = "loanAmount";
    pub const SUBMIT_APPLICATION: &str = "btn-submit-application";
    pub const UPLOAD_DOCS: &str = "btn-upload-docs";
    pub const ACCEPT_OFFER: &str = "btn-accept-offer";
    pub const SIGN_CLOSE: &str = "btn-sign-close";
    /// Deliberately non-interactive; only ever a dead-click target.
    pub const HELP_ICON: &str = "dead-click-help";
    /// The force-approve control carries no stable id, only this label.
    pub const FORCE_APPROVE_LABEL: &str = "Force: Server Approves";
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// How a UI control is addressed on the target page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// A stable element id.
    Id(String),
    /// A button located by its visible label text.
    ButtonLabel(String),
    /// The nth checkbox currently present on the page.
    Checkbox(usize),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn button_label(label: impl Into<String>) -> Self {
        Locator::ButtonLabel(label.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{id}"),
            Locator::ButtonLabel(label) => write!(f, "button '{label}'"),
            Locator::Checkbox(n) => write!(f, "checkbox {n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// SurfaceError
// ---------------------------------------------------------------------------

/// A transient interaction failure. Handlers treat any of these as "this
/// attempted action did not happen" and leave the actor record unmodified.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("element not ready: {0}")]
    NotReady(Locator),

    #[error("connection to target failed: {0}")]
    Connection(String),

    #[error("script execution failed: {0}")]
    Script(String),

    #[error("persisted state unavailable: {0}")]
    State(String),
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Capability interface over the live browser session.
///
/// Every operation has bounded wait semantics before failing; `click` and
/// `fill` precede the interaction with simulated pointer travel and a short
/// random pause so nothing looks instantaneous. The production
/// implementation lives in the binary crate, on top of the WebDriver
/// session; tests substitute scripted fakes.
pub trait Surface {
    fn navigate(&mut self, url: &str) -> Result<(), SurfaceError>;
    fn reload(&mut self) -> Result<(), SurfaceError>;

    /// Move the pointer to the element, pause like a human, then click.
    fn click(&mut self, target: &Locator) -> Result<(), SurfaceError>;

    /// Click without pointer travel. Rage-click primitive.
    fn quick_click(&mut self, target: &Locator) -> Result<(), SurfaceError>;

    /// Focus the element, clear existing content, type `text`.
    fn fill(&mut self, target: &Locator, text: &str) -> Result<(), SurfaceError>;

    /// Select-all plus delete on the focused field.
    fn clear_field(&mut self, target: &Locator) -> Result<(), SurfaceError>;

    /// Number of checkbox controls currently present.
    fn checkbox_count(&mut self) -> Result<usize, SurfaceError>;

    /// Read the target application's persisted client snapshot, bypassing
    /// the UI. `None` when no snapshot has been written yet.
    fn read_state(&mut self) -> Result<Option<Value>, SurfaceError>;

    /// Write the persisted client snapshot directly, as structured data.
    fn write_state(&mut self, state: &Value) -> Result<(), SurfaceError>;

    fn clear_storage(&mut self) -> Result<(), SurfaceError>;
    fn delete_cookies(&mut self) -> Result<(), SurfaceError>;

    /// Wall-clock pause after a state-changing action. Fakes make this a
    /// no-op so tests run instantly.
    fn settle(&mut self, wait: Duration);
}
