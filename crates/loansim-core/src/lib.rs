pub mod chaos;
pub mod config;
pub mod decision;
pub mod error;
pub mod handlers;
pub mod io;
pub mod ledger;
pub mod scheduler;
pub mod surface;
pub mod types;

pub use error::{Result, SimError};
