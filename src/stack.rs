//! Ordered list of post-processing effects and per-frame recording.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::effects::{
    BloomEffect, CustomBloomEffect, DepthOfFieldEffect, EffectStage, PostProcessEffect,
};
use crate::profile::StackProfile;
use crate::render::{
    CameraFlags, CommandBuffer, FrameSetup, NameId, PropertySheet, RenderContext, RenderTarget,
    TextureDesc, TransientTarget,
};
use crate::utils::logging::{warn_if_frame_budget_exceeded, TraceSpan};
use crate::utils::profiling::{ScopedTimer, StackProfiler};

/// CPU time allowed for recording one frame before a warning is logged.
pub const DEFAULT_FRAME_BUDGET_MS: f32 = 1.0;

/// Everything a frame recorded, ready for a backend.
#[derive(Debug)]
pub struct FrameRecording {
    pub commands: CommandBuffer,
    pub uber_sheet: PropertySheet,
    /// Temporal buffers must be discarded before this frame is shown.
    pub history_invalidated: bool,
    pub profiler: StackProfiler,
}

pub struct PostProcessStack {
    effects: Vec<Box<dyn PostProcessEffect>>,
    frame_budget_ms: f32,
}

impl PostProcessStack {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
        }
    }

    /// Builds a stack with one effect per profile entry: depth of field, then bloom.
    pub fn from_profile(profile: &StackProfile) -> Self {
        let mut stack = Self::new();
        if let Some(settings) = &profile.depth_of_field {
            stack.add_effect(DepthOfFieldEffect::with_settings(settings.clone()));
        }
        if let Some(settings) = &profile.bloom {
            stack.add_effect(BloomEffect::with_settings(settings.clone()));
        }
        if let Some(settings) = &profile.custom_bloom {
            stack.add_effect(CustomBloomEffect::with_settings(settings.clone()));
        }
        stack
    }

    pub fn with_frame_budget(mut self, budget_ms: f32) -> Self {
        self.frame_budget_ms = budget_ms;
        self
    }

    pub fn add_effect<E: PostProcessEffect + 'static>(&mut self, mut effect: E) {
        effect.init();
        info!("effect added: {}", effect.name());
        self.effects.push(Box::new(effect));
    }

    /// Releases and drops the first effect called `name`.
    pub fn remove_effect(&mut self, name: &str) -> bool {
        let Some(index) = self.effects.iter().position(|e| e.name() == name) else {
            return false;
        };
        let mut effect = self.effects.remove(index);
        effect.release();
        info!("effect removed: {name}");
        true
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effect_names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    /// Camera buffers the host must render for the current effect set.
    pub fn camera_flags(&self) -> CameraFlags {
        self.effects
            .iter()
            .fold(CameraFlags::NONE, |flags, e| flags | e.camera_flags())
    }

    pub fn reset_history(&mut self) {
        for effect in &mut self.effects {
            effect.reset_history();
        }
    }

    /// Records one frame: chain effects in order, then uber effects, then the composite.
    pub fn render(&mut self, frame: &FrameSetup) -> FrameRecording {
        let _span = TraceSpan::enter("PostProcessStack::render");
        let frame_start = Instant::now();
        let mut profiler = StackProfiler::default();
        let mut ctx = RenderContext::new(frame);

        let mut intermediate: Option<TransientTarget> = None;
        let mut chain_index = 0usize;

        for effect in self
            .effects
            .iter_mut()
            .filter(|e| e.stage() == EffectStage::Chain)
        {
            if !effect.is_enabled_and_supported(&ctx) {
                debug!("{} skipped this frame", effect.name());
                profiler.effects_skipped += 1;
                continue;
            }

            let next = ctx.get_temporary(
                chain_target_id(chain_index),
                TextureDesc::bilinear(ctx.width, ctx.height, ctx.source_format),
            );
            ctx.destination = next.target();

            let mut elapsed = Duration::ZERO;
            {
                let _t = ScopedTimer::new(&mut elapsed);
                effect.render(&mut ctx);
            }
            profiler.record(effect.name(), elapsed);

            ctx.source = next.target();
            if let Some(previous) = intermediate.replace(next) {
                ctx.release(previous);
            }
            chain_index += 1;
        }

        ctx.destination = RenderTarget::CameraDestination;

        for effect in self
            .effects
            .iter_mut()
            .filter(|e| e.stage() == EffectStage::Uber)
        {
            if !effect.is_enabled_and_supported(&ctx) {
                debug!("{} skipped this frame", effect.name());
                profiler.effects_skipped += 1;
                continue;
            }

            let mut elapsed = Duration::ZERO;
            {
                let _t = ScopedTimer::new(&mut elapsed);
                effect.render(&mut ctx);
            }
            profiler.record(effect.name(), elapsed);
        }

        {
            let _t = ScopedTimer::new(&mut profiler.composite_time);
            ctx.begin_sample("Uber");
            let source = ctx.source;
            ctx.blit_uber(source, RenderTarget::CameraDestination);
            ctx.end_sample("Uber");

            if let Some(bloom) = ctx.take_published_bloom() {
                ctx.release(bloom.target);
            }
            if let Some(last) = intermediate.take() {
                ctx.release(last);
            }
        }

        if ctx.tracker().live_count() > 0 {
            let leaked: Vec<NameId> = ctx.tracker().live_ids().collect();
            warn!(
                "{} transient target(s) still live at end of frame: {leaked:?}",
                leaked.len()
            );
        }

        let (commands, uber_sheet, history_invalidated) = ctx.finish();

        profiler.total_frame_time = frame_start.elapsed();
        profiler.report();
        warn_if_frame_budget_exceeded(profiler.total_frame_time, self.frame_budget_ms);

        FrameRecording {
            commands,
            uber_sheet,
            history_invalidated,
            profiler,
        }
    }

    pub fn cleanup(&mut self) {
        for effect in &mut self.effects {
            effect.release();
            debug!("effect released: {}", effect.name());
        }
        self.effects.clear();
    }
}

impl Default for PostProcessStack {
    fn default() -> Self {
        Self::new()
    }
}

fn chain_target_id(index: usize) -> NameId {
    NameId::from_name(&format!("_PostChainTarget{index}"))
}
