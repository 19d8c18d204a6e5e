//! High-level runtime orchestrator.
//!
//! The runtime owns the frame worker, wires up the command channel and the
//! event bus, and exposes a builder-based API for clients to drive the
//! simulation.

use std::sync::Arc;
use std::time::Duration;

use cast_content::AbilityCatalog;
use cast_core::CastConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::backend::SimWorld;
use crate::events::EventBus;
use crate::scheduler::Scheduler;
use crate::workers::{Command, FrameWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub cast: CastConfig,
    /// Seconds per frame.
    pub frame_dt: f32,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Step on a wall-clock interval. When off, frames only run on
    /// [`RuntimeHandle::step`].
    pub auto_step: bool,
}

impl RuntimeConfig {
    pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cast: CastConfig::default(),
            frame_dt: Self::DEFAULT_FRAME_DT,
            event_buffer_size: 100,
            command_buffer_size: 32,
            auto_step: true,
        }
    }
}

/// Main runtime that orchestrates the frame loop
///
/// Design: Runtime owns the worker and coordinates its lifetime.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        // The worker may already be gone; joining below reports the outcome.
        let _ = self.handle.request_shutdown().await;
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?;
        info!(target: "runtime", "runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    catalog: Option<Arc<AbilityCatalog>>,
    world: Option<SimWorld>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
            world: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the ability catalog (required)
    pub fn catalog(mut self, catalog: impl Into<Arc<AbilityCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Provide the initial world. Defaults to a flat ground at height zero.
    pub fn world(mut self, world: SimWorld) -> Self {
        self.world = Some(world);
        self
    }

    /// Disable wall-clock stepping; frames then only run on request.
    pub fn manual_stepping(mut self) -> Self {
        self.config.auto_step = false;
        self
    }

    /// Builds the scheduler without spawning a worker.
    ///
    /// Useful for synchronous embedding and tests that step frames by hand.
    pub fn build_scheduler(self) -> Result<Scheduler> {
        let (scheduler, _) = self.into_parts()?;
        Ok(scheduler)
    }

    fn into_parts(self) -> Result<(Scheduler, RuntimeConfig)> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;
        let dt = self.config.frame_dt;
        if !Duration::try_from_secs_f32(dt).is_ok_and(|period| !period.is_zero()) {
            return Err(RuntimeError::InvalidFrameDelta(dt));
        }
        if self.config.event_buffer_size == 0 {
            return Err(RuntimeError::ZeroBufferSize("event_buffer_size"));
        }
        if self.config.command_buffer_size == 0 {
            return Err(RuntimeError::ZeroBufferSize("command_buffer_size"));
        }

        let bus = EventBus::with_capacity(self.config.event_buffer_size);
        let world = self.world.unwrap_or_else(|| SimWorld::new().with_ground(0.0));
        let scheduler = Scheduler::new(self.config.cast.clone(), catalog, world, bus);
        Ok((scheduler, self.config))
    }

    /// Build the runtime and spawn the frame worker
    pub async fn build(self) -> Result<Runtime> {
        let (scheduler, config) = self.into_parts()?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let handle = RuntimeHandle::new(command_tx, scheduler.bus().clone(), scheduler.requests());

        let worker = FrameWorker::new(scheduler, command_rx, config.frame_dt, config.auto_step);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
