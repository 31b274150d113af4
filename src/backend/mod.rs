//! Command replay.
//!
//! The stack only records; a backend turns a [`CommandBuffer`] into pixels.

pub mod cpu;

pub use cpu::{CpuBackend, Image};

use crate::error::Result;
use crate::render::{CommandBuffer, CommandStats};

/// Anything that can replay recorded post-processing commands.
pub trait RenderBackend: Send {
    fn name(&self) -> &str;

    /// Replays the commands in recording order.
    fn execute(&mut self, commands: &CommandBuffer) -> Result<()>;
}

/// Backend that accepts every buffer and only counts what it saw.
#[derive(Debug, Default)]
pub struct NoopBackend {
    buffers: usize,
    totals: CommandStats,
}

impl NoopBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffers(&self) -> usize {
        self.buffers
    }

    pub fn totals(&self) -> CommandStats {
        self.totals
    }
}

impl RenderBackend for NoopBackend {
    fn name(&self) -> &str {
        "noop"
    }

    fn execute(&mut self, commands: &CommandBuffer) -> Result<()> {
        let stats = commands.stats();
        self.buffers += 1;
        self.totals.allocations += stats.allocations;
        self.totals.releases += stats.releases;
        self.totals.draws += stats.draws;
        self.totals.global_bindings += stats.global_bindings;
        self.totals.samples += stats.samples;
        Ok(())
    }
}
