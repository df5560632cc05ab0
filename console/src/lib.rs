//! `estate-admin`: terminal front end for the property listing backend.
//!
//! The core crate decides what to send and how to read the answer; this crate
//! executes requests with ureq, keeps the session token on disk and renders
//! results as text.

pub mod cli;
pub mod console;
pub mod render;
pub mod repl;
pub mod settings;
pub mod transport;

pub use console::Console;
pub use settings::Settings;
pub use transport::{Transport, UreqTransport};
