pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod output_dir;
pub mod recorder;

pub use error::{RecorderError, Result};

use recorder::rdev_hooks::RdevHooks;
use recorder::xcap_capture::XcapCapture;
use recorder::{EngineEvent, SessionEngine, StopOutcome};
use std::sync::Arc;
use tracing::{error, info};

/// Headless front-end: record one session until the stop hotkey or Ctrl+C.
pub fn run() -> Result<()> {
    logging::init();

    let config = config::load();
    let base_dir = output_dir::resolve_base_dir(&config);
    let engine = Arc::new(SessionEngine::new(
        base_dir,
        config,
        RdevHooks::new(),
        XcapCapture::new(),
    ));
    let events = engine.subscribe();
    info!(base_dir = %engine.base_dir().display(), "engine ready");

    let signal_engine = Arc::clone(&engine);
    ctrlc::set_handler(move || {
        if let Err(err) = signal_engine.stop() {
            error!("stop from Ctrl+C failed: {err}");
        }
    })?;

    let output_dir = engine.start()?;
    println!("Recording to {}", output_dir.display());
    println!(
        "Press [{}] or Ctrl+C to stop.",
        engine.config().stop_hotkey
    );

    for event in events {
        match event {
            EngineEvent::StepCaptured(step) => {
                println!("STEP {}: {}", step.step, step.wiki_entry);
            }
            EngineEvent::Stopped(Ok(StopOutcome::Exported { output_dir, steps })) => {
                println!("Saved {steps} steps. Files generated in:\n{}", output_dir.display());
                break;
            }
            EngineEvent::Stopped(Ok(StopOutcome::EmptySession { .. })) => {
                println!("No clicks were recorded; nothing was saved.");
                break;
            }
            EngineEvent::Stopped(Ok(StopOutcome::NotRecording)) => break,
            EngineEvent::Stopped(Err(err)) => {
                return Err(err.into());
            }
            EngineEvent::Started { .. } => {}
        }
    }

    info!("session finished");
    Ok(())
}
