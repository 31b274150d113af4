//! Deferred command recording.
//!
//! Nothing recorded here executes immediately; a [`crate::backend::RenderBackend`]
//! replays the list later in recording order.

use log::trace;

use super::{NameId, PropertySheet, RenderTarget, ShaderPass, TextureDesc};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    GetTemporary {
        id: NameId,
        desc: TextureDesc,
    },
    ReleaseTemporary {
        id: NameId,
    },
    /// Full-screen triangle draw. The sheet is captured at record time.
    Blit {
        source: RenderTarget,
        destination: RenderTarget,
        pass: ShaderPass,
        properties: PropertySheet,
    },
    SetGlobalTexture {
        name: NameId,
        target: RenderTarget,
    },
    BeginSample(&'static str),
    EndSample(&'static str),
}

/// Counts of each command kind in a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    pub allocations: usize,
    pub releases: usize,
    pub draws: usize,
    pub global_bindings: usize,
    pub samples: usize,
}

impl CommandStats {
    /// Allocations not matched by a release within the same buffer.
    pub fn outstanding(&self) -> usize {
        self.allocations.saturating_sub(self.releases)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    name: String,
    commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_temporary_rt(&mut self, id: NameId, desc: TextureDesc) {
        trace!(
            "[{}] get temporary {id} {}x{} {:?}",
            self.name,
            desc.width,
            desc.height,
            desc.format
        );
        self.commands.push(RenderCommand::GetTemporary { id, desc });
    }

    pub fn release_temporary_rt(&mut self, id: NameId) {
        trace!("[{}] release temporary {id}", self.name);
        self.commands.push(RenderCommand::ReleaseTemporary { id });
    }

    pub fn blit_fullscreen_triangle(
        &mut self,
        source: RenderTarget,
        destination: RenderTarget,
        properties: &PropertySheet,
        pass: ShaderPass,
    ) {
        trace!(
            "[{}] blit {source:?} -> {destination:?} ({pass:?})",
            self.name
        );
        self.commands.push(RenderCommand::Blit {
            source,
            destination,
            pass,
            properties: properties.clone(),
        });
    }

    pub fn set_global_texture(&mut self, name: NameId, target: RenderTarget) {
        self.commands
            .push(RenderCommand::SetGlobalTexture { name, target });
    }

    pub fn begin_sample(&mut self, label: &'static str) {
        self.commands.push(RenderCommand::BeginSample(label));
    }

    pub fn end_sample(&mut self, label: &'static str) {
        self.commands.push(RenderCommand::EndSample(label));
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Draws in recording order.
    pub fn blits(&self) -> impl Iterator<Item = (RenderTarget, RenderTarget, ShaderPass)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            RenderCommand::Blit {
                source,
                destination,
                pass,
                ..
            } => Some((*source, *destination, *pass)),
            _ => None,
        })
    }

    pub fn stats(&self) -> CommandStats {
        let mut stats = CommandStats::default();
        for command in &self.commands {
            match command {
                RenderCommand::GetTemporary { .. } => stats.allocations += 1,
                RenderCommand::ReleaseTemporary { .. } => stats.releases += 1,
                RenderCommand::Blit { .. } => stats.draws += 1,
                RenderCommand::SetGlobalTexture { .. } => stats.global_bindings += 1,
                RenderCommand::BeginSample(_) => stats.samples += 1,
                RenderCommand::EndSample(_) => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ids, BloomPass, TextureFormat};

    #[test]
    fn blit_captures_sheet_at_record_time() {
        let mut cmd = CommandBuffer::new("test");
        let mut sheet = PropertySheet::new();
        sheet.set_float(ids::SAMPLE_SCALE, 1.0);
        cmd.blit_fullscreen_triangle(
            RenderTarget::CameraSource,
            RenderTarget::CameraDestination,
            &sheet,
            ShaderPass::Bloom(BloomPass::Prefilter),
        );
        sheet.set_float(ids::SAMPLE_SCALE, 4.0);

        match &cmd.commands()[0] {
            RenderCommand::Blit { properties, .. } => {
                assert_eq!(properties.get_float(ids::SAMPLE_SCALE), Some(1.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn stats_count_each_kind() {
        let mut cmd = CommandBuffer::new("test");
        let id = NameId::from_name("_Temp");
        cmd.begin_sample("Test");
        cmd.get_temporary_rt(id, TextureDesc::bilinear(4, 4, TextureFormat::Rgba8));
        cmd.release_temporary_rt(id);
        cmd.end_sample("Test");

        let stats = cmd.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.outstanding(), 0);
    }
}
