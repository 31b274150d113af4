use approx::assert_relative_eq;
use postfx::effects::{
    CocBand, DepthOfFieldEffect, DepthOfFieldSettings, DistanceBand, DofModel, KernelSize,
    LensParams, PhysicalLens,
};
use postfx::render::{
    ids, DofPass, FrameSetup, RenderCommand, RenderContext, RenderTarget, ShaderPass,
    TextureFormat,
};
use postfx::PostProcessEffect;

fn dof_ctx(frame: &FrameSetup) -> RenderContext {
    let mut ctx = RenderContext::new(frame);
    ctx.destination = RenderTarget::Temporary(postfx::render::NameId::from_name("_Out"));
    ctx
}

#[test]
fn test_distance_band_breakpoints() {
    let band = CocBand::from_distance_band(20.0, &DistanceBand::default());
    assert_eq!(band.to_vector().to_array(), [-31.0, 19.0, 21.0, 71.0]);

    let mut effect = DepthOfFieldEffect::new();
    let mut ctx = dof_ctx(&FrameSetup::default());
    effect.render(&mut ctx);
    let uploaded = ctx.command.commands().iter().find_map(|c| match c {
        RenderCommand::Blit { properties, .. } => properties.get_vector(ids::DOF_DEPTH),
        _ => None,
    });
    assert_eq!(uploaded, Some(band.to_vector()));
}

#[test]
fn test_band_stays_ordered_for_extreme_regions() {
    let settings = DepthOfFieldSettings {
        focus_distance: 1.0,
        model: DofModel::DistanceBand(DistanceBand {
            focal_region: 1000.0,
            near_transition: 0.05,
            far_transition: 0.05,
        }),
        ..Default::default()
    };
    let band = match &settings.model {
        DofModel::DistanceBand(band) => CocBand::from_distance_band(settings.focus_distance, band),
        DofModel::PhysicalLens(_) => unreachable!(),
    };
    assert!(band.ordered().is_ordered());
    assert_eq!(band.ordered().near_end, -499.0);
}

#[test]
fn test_dof_pass_sequence() {
    let mut effect = DepthOfFieldEffect::new();
    let mut ctx = dof_ctx(&FrameSetup::new(1920, 1080));
    let destination = ctx.destination;
    effect.render(&mut ctx);

    let half = RenderTarget::Temporary(ids::DEPTH_OF_FIELD_TEX);
    let quarter = RenderTarget::Temporary(ids::DEPTH_OF_FIELD_TEMP);
    let blits: Vec<_> = ctx.command.blits().collect();
    assert_eq!(
        blits,
        vec![
            (RenderTarget::CameraSource, half, ShaderPass::DepthOfField(DofPass::Downsample)),
            (
                half,
                quarter,
                ShaderPass::DepthOfField(DofPass::Blur(KernelSize::Medium))
            ),
            (quarter, half, ShaderPass::DepthOfField(DofPass::Upsample)),
            (RenderTarget::CameraSource, destination, ShaderPass::DepthOfField(DofPass::Composite)),
        ]
    );

    // The quarter buffer goes before the composite, the half buffer after it.
    let order: Vec<&RenderCommand> = ctx
        .command
        .commands()
        .iter()
        .filter(|c| {
            matches!(
                c,
                RenderCommand::ReleaseTemporary { .. }
                    | RenderCommand::Blit {
                        pass: ShaderPass::DepthOfField(DofPass::Composite),
                        ..
                    }
            )
        })
        .collect();
    assert!(matches!(order[0], RenderCommand::ReleaseTemporary { id } if *id == ids::DEPTH_OF_FIELD_TEMP));
    assert!(matches!(order[1], RenderCommand::Blit { .. }));
    assert!(matches!(order[2], RenderCommand::ReleaseTemporary { id } if *id == ids::DEPTH_OF_FIELD_TEX));
    assert_eq!(order.len(), 3);
    assert_eq!(ctx.tracker().live_count(), 0);
}

#[test]
fn test_dof_buffers_follow_render_scale_and_hdr() {
    let frame = FrameSetup::new(1920, 1080)
        .with_render_scale(0.5)
        .with_hdr(false);
    let mut effect = DepthOfFieldEffect::new();
    let mut ctx = dof_ctx(&frame);
    effect.render(&mut ctx);

    let descs: Vec<_> = ctx
        .command
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::GetTemporary { desc, .. } => Some(*desc),
            _ => None,
        })
        .collect();
    assert_eq!((descs[0].width, descs[0].height), (480, 270));
    assert_eq!((descs[1].width, descs[1].height), (240, 135));
    assert!(descs.iter().all(|d| d.format == TextureFormat::Rgba8));
}

#[test]
fn test_history_invalidated_on_first_frame_only() {
    let mut effect = DepthOfFieldEffect::new();
    assert!(effect.history_reset_pending());

    let mut ctx = dof_ctx(&FrameSetup::default());
    effect.render(&mut ctx);
    assert!(ctx.history_invalidated());
    assert!(!effect.history_reset_pending());

    let mut ctx = dof_ctx(&FrameSetup::default());
    effect.render(&mut ctx);
    assert!(!ctx.history_invalidated());

    effect.reset_history();
    let mut ctx = dof_ctx(&FrameSetup::default());
    effect.render(&mut ctx);
    assert!(ctx.history_invalidated());
}

#[test]
fn test_dof_requires_shader_level_35() {
    let effect = DepthOfFieldEffect::new();
    let low = RenderContext::new(&FrameSetup::default().with_shader_level(30));
    let ok = RenderContext::new(&FrameSetup::default().with_shader_level(35));
    assert!(!effect.is_enabled_and_supported(&low));
    assert!(effect.is_enabled_and_supported(&ok));
    assert!(effect.camera_flags().depth);
}

#[test]
fn test_physical_lens_uniforms() {
    let settings = DepthOfFieldSettings {
        focus_distance: 10.0,
        model: DofModel::PhysicalLens(PhysicalLens {
            kernel_size: KernelSize::Large,
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut effect = DepthOfFieldEffect::with_settings(settings);
    let mut ctx = dof_ctx(&FrameSetup::new(1920, 1080));
    effect.render(&mut ctx);

    let (sheet, kernel) = ctx
        .command
        .commands()
        .iter()
        .find_map(|c| match c {
            RenderCommand::Blit {
                properties,
                pass: ShaderPass::DepthOfField(DofPass::Blur(kernel)),
                ..
            } => Some((properties.clone(), *kernel)),
            _ => None,
        })
        .expect("blur recorded");
    assert_eq!(kernel, KernelSize::Large);
    assert_relative_eq!(sheet.get_float(ids::MAX_COC).unwrap(), 14.0 / 1080.0, epsilon = 1e-7);
    assert_relative_eq!(sheet.get_float(ids::DISTANCE).unwrap(), 10.0);
    assert_relative_eq!(sheet.get_float(ids::RCP_ASPECT).unwrap(), 0.5625, epsilon = 1e-6);
    assert!(sheet.get_vector(ids::DOF_DEPTH).is_none());

    let lens = LensParams::from_physical_lens(10.0, &PhysicalLens::default(), 1920, 1080, 1080);
    assert_relative_eq!(
        sheet.get_float(ids::LENS_COEFF).unwrap(),
        lens.lens_coeff,
        epsilon = 1e-7
    );
}

#[test]
fn test_max_coc_for_each_kernel() {
    let expected = [6.0, 10.0, 14.0, 18.0];
    for (i, px) in expected.iter().enumerate() {
        let kernel = KernelSize::from_index(i);
        assert_eq!(kernel.radius_in_pixels(), *px);
        assert_relative_eq!(
            LensParams::max_coc_radius(kernel, 2160),
            px / 2160.0,
            epsilon = 1e-7
        );
    }
    // Small screens hit the 5% cap.
    assert_eq!(LensParams::max_coc_radius(KernelSize::VeryLarge, 200), 0.05);
}
