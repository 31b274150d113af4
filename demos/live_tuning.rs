use std::thread;
use std::time::Duration;

use postfx::effects::{CustomBloomSettings, DepthOfFieldSettings};
use postfx::render::{ids, FrameSetup};
use postfx::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bloom = SharedSettings::new(CustomBloomSettings {
        intensity: 2.0,
        ..Default::default()
    });
    let dof = SharedSettings::new(DepthOfFieldSettings::default());

    let mut stack = PostProcessStack::new();
    stack.add_effect(DepthOfFieldEffect::with_shared(dof.clone()));
    stack.add_effect(CustomBloomEffect::with_shared(bloom.clone()));

    for panel in [
        InspectorPanel::build(&dof.snapshot(), 30),
        InspectorPanel::build(&bloom.snapshot(), 50),
    ] {
        println!("[{}]", panel.title);
        if let Some(warning) = panel.warning {
            println!("  ! {warning}");
        }
        for field in &panel.fields {
            println!("  {:<16} {:?}", field.label, field.value);
        }
    }

    // Editor thread: sweeps the sliders while frames are recorded.
    let editor = {
        let bloom = bloom.clone();
        let dof = dof.clone();
        thread::spawn(move || -> Result<()> {
            for step in 0..20 {
                bloom.update(|s| s.set("intensity", ParameterValue::Float(step as f32)))?;
                dof.update(|s| {
                    s.set("focus_distance", ParameterValue::Float(5.0 + step as f32))
                })?;
                thread::sleep(Duration::from_millis(2));
            }
            dof.update(|s| s.set("model", ParameterValue::Choice(1)))
        })
    };

    let frame = FrameSetup::new(1280, 720);
    for index in 0..20 {
        let recording = stack.render(&frame);
        let intensity = recording
            .uber_sheet
            .get_vector(ids::BLOOM_SETTINGS)
            .map_or(0.0, |v| v.y);
        println!(
            "frame {index:>2}: {} draws, bloom {intensity:.3}, history reset {}",
            recording.commands.stats().draws,
            recording.history_invalidated
        );
        thread::sleep(Duration::from_millis(3));
    }

    match editor.join() {
        Ok(result) => result?,
        Err(_) => log::error!("editor thread panicked"),
    }
    println!("final depth of field model: {:?}", dof.snapshot().model);

    stack.cleanup();
    Ok(())
}
