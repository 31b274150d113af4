use approx::assert_abs_diff_eq;
use postfx::effects::{BloomSettings, CustomBloomSettings, DepthOfFieldEffect};
use postfx::render::{
    ids, FrameSetup, NameId, RenderCommand, RenderTarget, ShaderKeyword, ShaderPass,
};
use postfx::{
    BloomEffect, CpuBackend, CustomBloomEffect, Image, NoopBackend, PostProcessEffect,
    PostProcessStack, RenderBackend, StackProfile, Vec4,
};

fn full_profile() -> StackProfile {
    StackProfile {
        depth_of_field: Some(Default::default()),
        bloom: Some(BloomSettings {
            intensity: 1.0,
            bluriness: 2,
            ..Default::default()
        }),
        custom_bloom: None,
    }
}

#[test]
fn test_stack_from_profile_renders_without_leaks() {
    let mut stack = PostProcessStack::from_profile(&full_profile());
    assert_eq!(stack.effect_names(), vec!["DepthOfField", "Bloom"]);
    assert!(stack.camera_flags().depth);

    let recording = stack.render(&FrameSetup::new(640, 360));
    let stats = recording.commands.stats();
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(recording.profiler.effects_rendered, 2);
    assert!(recording.history_invalidated);
    assert!(recording
        .uber_sheet
        .is_keyword_enabled(ShaderKeyword::BloomLow));

    let mut backend = NoopBackend::new();
    backend
        .execute(&recording.commands)
        .expect("noop accepts everything");
    assert_eq!(backend.totals(), stats);
}

#[test]
fn test_chain_output_feeds_uber_stage() {
    let mut stack = PostProcessStack::from_profile(&full_profile());
    let recording = stack.render(&FrameSetup::new(256, 256));
    let chain = RenderTarget::Temporary(NameId::from_name("_PostChainTarget0"));

    let blits: Vec<_> = recording.commands.blits().collect();
    let dof_output = blits
        .iter()
        .rfind(|(_, _, pass)| matches!(pass, ShaderPass::DepthOfField(_)))
        .expect("depth of field recorded");
    assert_eq!(dof_output.1, chain);

    // Bloom prefilters from the chain target, not the camera source.
    let prefilter = blits
        .iter()
        .find(|(_, _, pass)| matches!(pass, ShaderPass::Bloom(_)))
        .expect("bloom recorded");
    assert_eq!(prefilter.0, chain);

    let uber = blits.last().expect("composite recorded");
    assert_eq!(*uber, (chain, RenderTarget::CameraDestination, ShaderPass::Uber));
}

#[test]
fn test_two_chain_effects_ping_pong() {
    let mut stack = PostProcessStack::new();
    stack.add_effect(DepthOfFieldEffect::new());
    stack.add_effect(DepthOfFieldEffect::new());

    let recording = stack.render(&FrameSetup::new(128, 128));
    let first = NameId::from_name("_PostChainTarget0");
    let second = NameId::from_name("_PostChainTarget1");

    let composites: Vec<_> = recording
        .commands
        .blits()
        .filter(|(_, _, pass)| {
            *pass == ShaderPass::DepthOfField(postfx::render::DofPass::Composite)
        })
        .collect();
    assert_eq!(composites[0].0, RenderTarget::CameraSource);
    assert_eq!(composites[0].1, RenderTarget::Temporary(first));
    assert_eq!(composites[1].0, RenderTarget::Temporary(first));
    assert_eq!(composites[1].1, RenderTarget::Temporary(second));

    // The first intermediate is released as soon as the second effect has consumed it.
    let commands = recording.commands.commands();
    let release_first = commands
        .iter()
        .position(|c| matches!(c, RenderCommand::ReleaseTemporary { id } if *id == first))
        .expect("first intermediate released");
    let second_composite = commands
        .iter()
        .position(|c| {
            matches!(c, RenderCommand::Blit { destination, .. } if *destination == RenderTarget::Temporary(second))
        })
        .expect("second composite recorded");
    assert!(release_first > second_composite);
    assert_eq!(recording.commands.stats().outstanding(), 0);
}

#[test]
fn test_disabled_effects_are_skipped() {
    let profile = StackProfile {
        depth_of_field: None,
        bloom: Some(BloomSettings::default()),
        custom_bloom: Some(CustomBloomSettings::default()),
    };
    let mut stack = PostProcessStack::from_profile(&profile);
    let recording = stack.render(&FrameSetup::default());

    assert_eq!(recording.profiler.effects_skipped, 2);
    assert_eq!(recording.profiler.effects_rendered, 0);
    assert_eq!(recording.commands.stats().draws, 1);
    assert!(recording.uber_sheet.keywords().next().is_none());
}

#[test]
fn test_low_shader_level_skips_depth_of_field() {
    let mut stack = PostProcessStack::from_profile(&full_profile());
    let recording = stack.render(&FrameSetup::default().with_shader_level(30));
    assert!(!recording
        .commands
        .blits()
        .any(|(_, _, pass)| matches!(pass, ShaderPass::DepthOfField(_))));
    assert!(!recording.history_invalidated);
}

#[test]
fn test_reset_history_forwards_to_effects() {
    let mut stack = PostProcessStack::from_profile(&full_profile());
    let frame = FrameSetup::new(64, 64);

    assert!(stack.render(&frame).history_invalidated);
    assert!(!stack.render(&frame).history_invalidated);
    stack.reset_history();
    assert!(stack.render(&frame).history_invalidated);
}

#[test]
fn test_bloom_texture_is_bound_globally_for_composite() {
    let mut stack = PostProcessStack::new();
    stack.add_effect(BloomEffect::with_settings(BloomSettings {
        intensity: 2.0,
        ..Default::default()
    }));
    let recording = stack.render(&FrameSetup::new(64, 64));

    let bound = recording.commands.commands().iter().find_map(|c| match c {
        RenderCommand::SetGlobalTexture { name, target } if *name == ids::BLOOM_TEX => {
            Some(*target)
        }
        _ => None,
    });
    assert_eq!(
        bound,
        Some(RenderTarget::Temporary(NameId::from_name("_BloomMipUp0")))
    );

    // Released after the composite reads it.
    let commands = recording.commands.commands();
    let uber = commands
        .iter()
        .position(|c| matches!(c, RenderCommand::Blit { pass: ShaderPass::Uber, .. }))
        .expect("composite recorded");
    let release = commands
        .iter()
        .rposition(|c| matches!(c, RenderCommand::ReleaseTemporary { .. }))
        .expect("bloom released");
    assert!(release > uber);
}

#[test]
fn test_cleanup_empties_stack() {
    let mut stack = PostProcessStack::from_profile(&full_profile());
    assert_eq!(stack.len(), 2);
    stack.cleanup();
    assert!(stack.is_empty());
    assert!(stack.camera_flags().is_empty());
}

fn hot_spot_source() -> Image {
    let mut source = Image::filled(16, 16, Vec4::new(0.1, 0.1, 0.1, 1.0));
    source.set(8, 8, Vec4::new(40.0, 40.0, 40.0, 1.0));
    source
}

fn replay_stack(effects: impl Fn(&mut PostProcessStack)) -> Image {
    let mut stack = PostProcessStack::new();
    effects(&mut stack);
    let recording = stack.render(&FrameSetup::new(16, 16));
    assert_eq!(recording.commands.stats().outstanding(), 0);

    let mut backend = CpuBackend::new(hot_spot_source());
    backend
        .execute(&recording.commands)
        .expect("published bloom is live at the composite");
    assert_eq!(backend.live_temporaries(), 0);
    backend.take_destination().expect("destination written")
}

fn assert_same_image(a: &Image, b: &Image) {
    for (x, y) in a.pixels().iter().zip(b.pixels()) {
        assert_abs_diff_eq!(x.x, y.x, epsilon = 1e-5);
        assert_abs_diff_eq!(x.w, y.w, epsilon = 1e-5);
    }
}

fn add_twice<E: PostProcessEffect + 'static>(stack: &mut PostProcessStack, make: impl Fn() -> E) {
    stack.add_effect(make());
    stack.add_effect(make());
}

#[test]
fn test_second_bloom_of_same_kind_replaces_first() {
    let bloom = || {
        BloomEffect::with_settings(BloomSettings {
            intensity: 1.0,
            bluriness: 1,
            ..Default::default()
        })
    };
    let single = replay_stack(|stack| stack.add_effect(bloom()));
    let double = replay_stack(|stack| add_twice(stack, bloom));
    assert_same_image(&single, &double);
    assert!(double.texel(8, 8).x > 40.0);
}

#[test]
fn test_second_custom_bloom_of_same_kind_replaces_first() {
    let custom = || {
        CustomBloomEffect::with_settings(CustomBloomSettings {
            intensity: 10.0,
            threshold: 1.0,
            ..Default::default()
        })
    };
    let single = replay_stack(|stack| stack.add_effect(custom()));
    let double = replay_stack(|stack| add_twice(stack, custom));
    assert_same_image(&single, &double);
    assert!(double.texel(8, 8).x > 40.0);
}

#[test]
fn test_reused_bloom_id_survives_until_composite() {
    let mut stack = PostProcessStack::new();
    add_twice(&mut stack, || {
        BloomEffect::with_settings(BloomSettings {
            intensity: 1.0,
            ..Default::default()
        })
    });
    let recording = stack.render(&FrameSetup::new(64, 64));
    let output = NameId::from_name("_BloomMipUp0");

    let commands = recording.commands.commands();
    let uber = commands
        .iter()
        .position(|c| matches!(c, RenderCommand::Blit { pass: ShaderPass::Uber, .. }))
        .expect("composite recorded");
    let last_alloc = commands
        .iter()
        .rposition(|c| matches!(c, RenderCommand::GetTemporary { id, .. } if *id == output))
        .expect("bloom output allocated");
    let first_release_after = commands[last_alloc..]
        .iter()
        .position(|c| matches!(c, RenderCommand::ReleaseTemporary { id } if *id == output))
        .map(|i| i + last_alloc)
        .expect("bloom output released");
    assert!(first_release_after > uber);
}
