//! The recording session engine.
//!
//! All mutable session data (state, clock, folder, steps) sits behind one
//! mutex. Hook callbacks and the foreground both go through it, so `stop()`
//! racing a click either sees the click fully recorded or not at all, and only
//! one of two concurrent `stop()` calls exports.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::capture::{CaptureWorker, ScreenshotProvider};
use super::click_event::ClickEvent;
use super::hooks::{ClickHandler, HotkeyHandler, InputHooks};
use super::session::Session;
use super::state::{RecorderState, SessionState};
use super::types::Step;
use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use crate::export::{self, ExportError};

/// How a `stop()` call ended, when it did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// Nothing was recording; the call did nothing.
    NotRecording,
    /// The session had no clicks, so no files were written.
    EmptySession { output_dir: PathBuf },
    /// All artifacts were written.
    Exported { output_dir: PathBuf, steps: usize },
}

/// Notifications for a front-end.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Started { output_dir: PathBuf },
    StepCaptured(Step),
    Stopped(std::result::Result<StopOutcome, ExportError>),
}

/// Read-only view of the engine for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub output_dir: Option<PathBuf>,
    pub elapsed: Option<Duration>,
    pub steps: Vec<Step>,
}

struct Slot {
    state: RecorderState,
    /// The current session, or the last finished one while idle.
    session: Option<Session>,
    worker: Option<CaptureWorker>,
}

struct EngineCore {
    slot: Mutex<Slot>,
    hooks: Box<dyn InputHooks>,
    capture: Arc<dyn ScreenshotProvider>,
    base_dir: PathBuf,
    config: RecorderConfig,
    subscribers: Mutex<Vec<Sender<EngineEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns one recording at a time; construct once and reuse across sessions.
pub struct SessionEngine {
    core: Arc<EngineCore>,
}

impl SessionEngine {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        config: RecorderConfig,
        hooks: impl InputHooks + 'static,
        capture: impl ScreenshotProvider + 'static,
    ) -> Self {
        Self {
            core: Arc::new(EngineCore {
                slot: Mutex::new(Slot {
                    state: RecorderState::new(),
                    session: None,
                    worker: None,
                }),
                hooks: Box::new(hooks),
                capture: Arc::new(capture),
                base_dir: base_dir.into(),
                config,
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Begin recording into a fresh `recording_<timestamp>` folder.
    ///
    /// Returns the session folder. Fails with [`RecorderError::AlreadyRecording`]
    /// without touching the running session.
    pub fn start(&self) -> Result<PathBuf> {
        self.core.start()
    }

    /// Stop recording, unregister hooks and export. Safe to call from any thread,
    /// any number of times.
    pub fn stop(&self) -> Result<StopOutcome> {
        self.core.stop()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.core.slot).state.current_state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let slot = lock(&self.core.slot);
        let recording = slot.state.is_recording();
        SessionSnapshot {
            state: slot.state.current_state(),
            output_dir: slot.session.as_ref().map(|s| s.output_dir.clone()),
            elapsed: slot
                .session
                .as_ref()
                .filter(|_| recording)
                .map(Session::elapsed),
            steps: slot
                .session
                .as_ref()
                .map(|s| s.steps.clone())
                .unwrap_or_default(),
        }
    }

    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.core.subscribers).push(tx);
        rx
    }

    pub fn base_dir(&self) -> &Path {
        &self.core.base_dir
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.core.config
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.core.hooks.unregister_all();
    }
}

impl EngineCore {
    fn emit(&self, event: EngineEvent) {
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn start(self: &Arc<Self>) -> Result<PathBuf> {
        let mut slot = lock(&self.slot);
        if slot.state.start().is_err() {
            debug!("start ignored: already recording");
            return Err(RecorderError::AlreadyRecording);
        }

        // The slot stays locked until setup is done, so no click can observe
        // `Recording` before the session exists.
        let session = match Session::create(&self.base_dir, Local::now()) {
            Ok(session) => session,
            Err(err) => {
                slot.state.reset_idle();
                warn!("start aborted: {err}");
                return Err(err);
            }
        };
        let span = info_span!("session", session_id = %session.id);
        let _enter = span.enter();

        let setup = self
            .register_hooks()
            .and_then(|()| Ok(CaptureWorker::spawn(Arc::clone(&self.capture))?));
        let worker = match setup {
            Ok(worker) => worker,
            Err(err) => {
                self.hooks.unregister_all();
                session.discard_if_empty();
                slot.state.reset_idle();
                warn!("start aborted: {err}");
                return Err(err);
            }
        };

        let output_dir = session.output_dir.clone();
        slot.session = Some(session);
        slot.worker = Some(worker);
        drop(slot);

        info!(dir = %output_dir.display(), hotkey = %self.config.stop_hotkey, "recording started");
        self.emit(EngineEvent::Started {
            output_dir: output_dir.clone(),
        });
        Ok(output_dir)
    }

    fn register_hooks(self: &Arc<Self>) -> Result<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let on_click: ClickHandler = Arc::new(move |click| {
            if let Some(core) = weak.upgrade() {
                core.record_click(click);
            }
        });
        self.hooks.register_click(on_click)?;

        let weak: Weak<Self> = Arc::downgrade(self);
        let on_hotkey: HotkeyHandler = Arc::new(move || {
            if let Some(core) = weak.upgrade() {
                if let Err(err) = core.stop() {
                    error!("stop from hotkey failed: {err}");
                }
            }
        });
        self.hooks
            .register_hotkey(self.config.stop_hotkey, on_hotkey)?;
        Ok(())
    }

    /// Record one press notification. Releases and clicks while idle are ignored.
    fn record_click(&self, click: ClickEvent) {
        if !click.pressed {
            return;
        }

        let step = {
            let mut slot = lock(&self.slot);
            if !slot.state.is_recording() {
                return;
            }
            let Slot {
                session, worker, ..
            } = &mut *slot;
            let Some(session) = session.as_mut() else {
                return;
            };
            let (step, job) = session.record(&click, Local::now(), self.config.capture_half_size);
            let queued = worker
                .as_ref()
                .map(|worker| worker.submit(job))
                .unwrap_or(false);
            if !queued {
                warn!(step = step.step, "capture worker unavailable");
            }
            debug!(session_id = %session.id, step = step.step, x = click.x, y = click.y, "click recorded");
            step
        };

        self.emit(EngineEvent::StepCaptured(step));
    }

    fn stop(&self) -> Result<StopOutcome> {
        // Check-and-set: only the caller that flips the state does the rest.
        let (session_id, output_dir, mut steps, worker) = {
            let mut slot = lock(&self.slot);
            if slot.state.stop().is_err() {
                debug!("stop ignored: not recording");
                return Ok(StopOutcome::NotRecording);
            }
            // Detach under the lock so a `start()` waiting on it registers
            // after this, never before.
            self.hooks.unregister_all();
            let worker = slot.worker.take();
            match slot.session.as_ref() {
                Some(session) => (
                    session.id,
                    session.output_dir.clone(),
                    session.steps.clone(),
                    worker,
                ),
                None => {
                    error!("recording state without a session");
                    return Ok(StopOutcome::NotRecording);
                }
            }
        };

        let span = info_span!("session", session_id = %session_id);
        let _enter = span.enter();

        let saved = worker.map(CaptureWorker::finish).unwrap_or_default();
        Session::apply_capture_results(&mut steps, &saved);
        self.store_final_steps(session_id, &steps);

        let result = if steps.is_empty() {
            info!("recording stopped with no clicks; nothing exported");
            Ok(StopOutcome::EmptySession { output_dir })
        } else {
            info!(steps = steps.len(), "recording stopped; exporting");
            export::export_session(&output_dir, &steps, Local::now()).map(|()| {
                StopOutcome::Exported {
                    output_dir,
                    steps: steps.len(),
                }
            })
        };

        self.emit(EngineEvent::Stopped(result.clone()));
        result.map_err(RecorderError::from)
    }

    /// Write capture results back, unless a newer session already replaced this one.
    fn store_final_steps(&self, session_id: Uuid, steps: &[Step]) {
        let mut slot = lock(&self.slot);
        if let Some(session) = slot.session.as_mut().filter(|s| s.id == session_id) {
            session.steps = steps.to_vec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::capture::{CaptureError, Region};
    use crate::recorder::click_event::MouseButton;
    use crate::recorder::hooks::HookError;
    use crate::recorder::hotkey::Hotkey;

    #[derive(Default, Clone)]
    struct ManualHooks {
        click: Arc<Mutex<Option<ClickHandler>>>,
        fail_hotkey: bool,
    }

    impl InputHooks for ManualHooks {
        fn register_click(&self, handler: ClickHandler) -> std::result::Result<(), HookError> {
            *self.click.lock().unwrap() = Some(handler);
            Ok(())
        }

        fn register_hotkey(
            &self,
            _hotkey: Hotkey,
            _handler: HotkeyHandler,
        ) -> std::result::Result<(), HookError> {
            if self.fail_hotkey {
                return Err(HookError::Unavailable("denied".into()));
            }
            Ok(())
        }

        fn unregister_all(&self) {
            *self.click.lock().unwrap() = None;
        }
    }

    struct NoCapture;

    impl ScreenshotProvider for NoCapture {
        fn capture_region(
            &self,
            _region: Region,
            _output: &Path,
        ) -> std::result::Result<(), CaptureError> {
            Err(CaptureError::Backend("headless".into()))
        }
    }

    #[test]
    fn release_and_idle_clicks_are_ignored() {
        let base = tempfile::tempdir().unwrap();
        let hooks = ManualHooks::default();
        let engine = SessionEngine::new(
            base.path(),
            RecorderConfig::default(),
            hooks.clone(),
            NoCapture,
        );

        engine
            .core
            .record_click(ClickEvent::press(1, 1, MouseButton::Left));
        assert!(engine.snapshot().steps.is_empty());

        engine.start().unwrap();
        engine
            .core
            .record_click(ClickEvent::release(1, 1, MouseButton::Left));
        engine
            .core
            .record_click(ClickEvent::press(5, 6, MouseButton::Middle));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, SessionState::Recording);
        assert_eq!(snapshot.steps.len(), 1);
        assert_eq!(snapshot.steps[0].action, "middle click");
        assert!(snapshot.elapsed.is_some());

        let outcome = engine.stop().unwrap();
        assert!(matches!(outcome, StopOutcome::Exported { steps: 1, .. }));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert!(snapshot.elapsed.is_none());
        assert_eq!(snapshot.steps[0].screenshot, "MISSING_SCREENSHOT");
    }

    #[test]
    fn hotkey_failure_leaves_engine_idle_and_unhooked() {
        let base = tempfile::tempdir().unwrap();
        let hooks = ManualHooks {
            fail_hotkey: true,
            ..ManualHooks::default()
        };
        let engine = SessionEngine::new(
            base.path(),
            RecorderConfig::default(),
            hooks.clone(),
            NoCapture,
        );

        let err = engine.start().unwrap_err();
        assert!(matches!(err, RecorderError::HookRegistration(_)));
        assert_eq!(engine.state(), SessionState::Idle);
        assert!(hooks.click.lock().unwrap().is_none());
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn dropping_engine_detaches_hooks() {
        let base = tempfile::tempdir().unwrap();
        let hooks = ManualHooks::default();
        let engine = SessionEngine::new(
            base.path(),
            RecorderConfig::default(),
            hooks.clone(),
            NoCapture,
        );
        engine.start().unwrap();
        assert!(hooks.click.lock().unwrap().is_some());

        drop(engine);
        assert!(hooks.click.lock().unwrap().is_none());
    }
}
