//! `webdriver-client` — a minimal blocking W3C WebDriver client.
//!
//! Implements the slice of the WebDriver JSON-over-HTTP protocol that the
//! `loansim` workspace needs to drive a single Chrome session: session
//! lifecycle, navigation, element lookup with bounded waits, keyboard and
//! pointer input (including human-like move/pause/click action sequences),
//! synchronous script execution, and cookie cleanup.
//!
//! ```text
//! SessionConfig
//!     │
//!     ▼
//! Session      ← POST /session against a chromedriver endpoint
//!     │           every call unwraps the {"value": …} envelope
//!     ▼
//! Element      ← W3C element handles, re-found after navigations
//! ```

pub mod error;
pub mod session;

pub use error::{Result, WebDriverError};
pub use session::{By, Element, Session, SessionConfig, ELEMENT_KEY};

/// WebDriver key codepoints used for keyboard-driven editing.
pub mod keys {
    /// Releases any held modifier keys when sent.
    pub const NULL: &str = "\u{E000}";
    pub const CONTROL: &str = "\u{E009}";
    pub const DELETE: &str = "\u{E017}";
}
