//! Headless ability-cast simulation.
//!
//! The `cast-sim` binary is the composition root: it loads content, builds a
//! [`cast_runtime::Runtime`] with manual stepping, runs a scripted scenario
//! for one hero and prints what happened.
//!
//! # Layout
//!
//! - [`config`]: environment-driven settings (`CAST_*` variables)
//! - [`logging`]: tracing subscriber with an optional file layer
//! - [`content`]: content directory loading through `cast-content`
//! - [`scenario`]: the scripted cast sequence and its report

pub mod config;
pub mod content;
pub mod logging;
pub mod scenario;

pub use config::SimConfig;
pub use content::Content;
pub use scenario::{ScenarioPlan, ScenarioReport, run_scenario};
