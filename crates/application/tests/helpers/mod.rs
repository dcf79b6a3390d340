#![allow(dead_code)]

mod log_capture;
mod stub_resolvers;

pub use log_capture::{capture_at, capture_warnings, LogCapture};
pub use stub_resolvers::{InstrumentedResolver, Outcome, ScriptedResolver};
