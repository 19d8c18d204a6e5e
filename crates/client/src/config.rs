//! Simulation settings read from the process environment.
use std::env;
use std::path::PathBuf;

use cast_core::CastConfig;
use cast_runtime::RuntimeConfig;

/// Settings for one simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Seconds per frame.
    pub frame_dt: f32,
    /// Directory for the log file. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// Per-topic event buffer.
    pub event_buffer: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_dt: RuntimeConfig::DEFAULT_FRAME_DT,
            log_dir: None,
            event_buffer: 256,
        }
    }
}

impl SimConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CAST_FRAME_DT` - Seconds per frame (default: 1/60)
    /// - `CAST_LOG_DIR` - Write logs to `<dir>/cast-sim.log` as well
    /// - `CAST_EVENT_BUFFER` - Per-topic event buffer (default: 256)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dt) = parse::<f32>(&lookup, "CAST_FRAME_DT")
            && dt.is_finite()
            && dt > 0.0
        {
            config.frame_dt = dt;
        }

        config.log_dir = lookup("CAST_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        if let Some(capacity) = parse::<usize>(&lookup, "CAST_EVENT_BUFFER") {
            config.event_buffer = capacity.max(1);
        }

        config
    }

    /// Runtime configuration for a manually stepped run.
    pub fn runtime_config(&self, cast: CastConfig) -> RuntimeConfig {
        RuntimeConfig {
            cast,
            frame_dt: self.frame_dt,
            event_buffer_size: self.event_buffer,
            auto_step: false,
            ..RuntimeConfig::default()
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}
