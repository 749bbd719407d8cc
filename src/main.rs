use logo_stage::cli::CliOverrides;
use logo_stage::time::{FrameClock, Millis};
use logo_stage::{HeadlessBackend, LogoStage, StageConfig, Theme};

const FRAME_MS: Millis = 1000.0 / 60.0;

fn main() {
    env_logger::init();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(&cli) {
        eprintln!("Application error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: &CliOverrides) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    let mut config =
        if config_path.exists() { StageConfig::load(&config_path)? } else { StageConfig::default() };
    let overrides = cli.config_overrides();
    if !overrides.is_empty() {
        log::info!("[cli] Applying overrides: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }

    let mut stage = LogoStage::load(cli.scene_path(), config)?;
    let mut backend = HeadlessBackend::new();
    let frames = cli.frames();
    let mut clock = FrameClock::new();

    for frame in 0..frames {
        let now = frame as Millis * FRAME_MS;
        script_input(&mut stage, frame, frames, now);
        stage.tick(now, &mut backend)?;
        for event in stage.drain_events() {
            log::info!("[stage] {event}");
        }
    }

    let wall_ms = clock.tick();
    let report = stage.camera_report();
    log::info!(
        "[stage] Session finished: frames={} simulated_ms={:.0} wall_ms={:.1} bursts={} camera={:?} shadow_opacity={:.3}",
        backend.frame_count(),
        frames as Millis * FRAME_MS,
        wall_ms,
        stage.glitch().stats().triggered,
        report.position,
        stage.shadow().opacity()
    );
    Ok(())
}

/// Pointer sweep across the stage, a stay in the menu region, then two theme flips.
fn script_input(stage: &mut LogoStage, frame: u32, frames: u32, now: Millis) {
    let sweep_end = frames * 2 / 5;
    let menu_end = frames * 4 / 5;
    if frame < sweep_end {
        let x = frame as f32 / sweep_end.max(1) as f32;
        stage.pointer_moved(x, false, now);
    } else if frame < menu_end {
        stage.pointer_moved(1.0, true, now);
    } else if frame == menu_end {
        stage.pointer_moved(0.5, false, now);
        stage.theme_changed(Theme::Dark, now);
    } else if frame == menu_end + (frames - menu_end) / 2 {
        stage.theme_changed(Theme::Light, now);
    }
}
