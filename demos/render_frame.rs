use postfx::effects::{BloomSettings, DepthOfFieldSettings, DistanceBand, DofModel};
use postfx::render::FrameSetup;
use postfx::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let profile = match std::env::args().nth(1) {
        Some(path) => StackProfile::load(path)?,
        None => StackProfile {
            depth_of_field: Some(DepthOfFieldSettings {
                focus_distance: 8.0,
                model: DofModel::DistanceBand(DistanceBand {
                    focal_region: 2.0,
                    near_transition: 4.0,
                    far_transition: 20.0,
                }),
                ..Default::default()
            }),
            bloom: Some(BloomSettings {
                intensity: 0.8,
                threshold: 0.9,
                bluriness: 2,
                ..Default::default()
            }),
            custom_bloom: None,
        },
    };

    let (width, height) = (160, 90);
    let mut stack = PostProcessStack::from_profile(&profile);
    let frame = FrameSetup::new(width, height);
    let recording = stack.render(&frame);

    let stats = recording.commands.stats();
    println!(
        "recorded {} commands: {} draws, {} allocations, {} releases",
        recording.commands.len(),
        stats.draws,
        stats.allocations,
        stats.releases
    );
    println!("camera needs depth: {}", stack.camera_flags().depth);

    // A dim gradient with a few hot spots, receding from 1 to 60 units.
    let source = Image::from_fn(width, height, |uv| {
        let hot = ((uv.x * 7.0).fract() < 0.05 && (uv.y * 3.0).fract() < 0.1) as u32 as f32;
        Vec4::new(0.2 + uv.x * 0.3 + hot * 12.0, 0.2 + hot * 10.0, 0.3 + hot * 6.0, 1.0)
    });
    let depth = Image::depth_from_fn(width, height, |uv| 1.0 + uv.y * 59.0);

    let mut backend = CpuBackend::new(source.clone()).with_depth(depth);
    backend.execute(&recording.commands)?;
    let output = backend.take_destination().ok_or(PostFxError::MissingTarget(
        RenderTarget::CameraDestination,
    ))?;

    println!(
        "source average {:?}, peak {:.2}",
        source.average(),
        source.max_element()
    );
    println!(
        "output average {:?}, peak {:.2}",
        output.average(),
        output.max_element()
    );

    stack.cleanup();
    Ok(())
}
