//! Global mouse and hotkey hooks on top of `rdev`.
//!
//! `rdev::listen` installs the OS hook on the calling thread and never returns
//! while it is healthy, so a single listener thread is started on first
//! registration and kept for the life of the process. Sessions only swap the
//! handlers it dispatches to.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use rdev::{Button, Event, EventType, Key};
use tracing::{debug, error, info, warn};

use super::click_event::{ClickEvent, MouseButton};
use super::hooks::{ClickHandler, HookError, HotkeyHandler, InputHooks};
use super::hotkey::{Hotkey, Modifiers};

/// How long a fresh listener gets to report a setup failure before it is
/// considered installed.
const SETUP_GRACE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
enum ListenerStatus {
    NotStarted,
    Running,
    Failed(String),
}

#[derive(Default)]
struct Handlers {
    click: Option<ClickHandler>,
    hotkey: Option<(Hotkey, HotkeyHandler)>,
}

struct Dispatch {
    handlers: Mutex<Handlers>,
    status: Mutex<ListenerStatus>,
}

static DISPATCH: OnceLock<Arc<Dispatch>> = OnceLock::new();

/// Per-listener input state that `rdev` events do not carry themselves.
#[derive(Default)]
struct Tracker {
    cursor: Option<(i32, i32)>,
    ctrl: [bool; 2],
    alt: [bool; 2],
    shift: [bool; 2],
    meta: [bool; 2],
}

impl Tracker {
    fn set_modifier(&mut self, key: Key, down: bool) {
        match key {
            Key::ControlLeft => self.ctrl[0] = down,
            Key::ControlRight => self.ctrl[1] = down,
            Key::Alt => self.alt[0] = down,
            Key::AltGr => self.alt[1] = down,
            Key::ShiftLeft => self.shift[0] = down,
            Key::ShiftRight => self.shift[1] = down,
            Key::MetaLeft => self.meta[0] = down,
            Key::MetaRight => self.meta[1] = down,
            _ => {}
        }
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl.iter().any(|held| *held),
            alt: self.alt.iter().any(|held| *held),
            shift: self.shift.iter().any(|held| *held),
            meta: self.meta.iter().any(|held| *held),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn map_button(button: Button) -> MouseButton {
    match button {
        Button::Left => MouseButton::Left,
        Button::Right => MouseButton::Right,
        Button::Middle => MouseButton::Middle,
        Button::Unknown(number) => MouseButton::Other(number),
    }
}

fn key_char(key: Key) -> Option<char> {
    let c = match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 => '0',
        Key::Num1 => '1',
        Key::Num2 => '2',
        Key::Num3 => '3',
        Key::Num4 => '4',
        Key::Num5 => '5',
        Key::Num6 => '6',
        Key::Num7 => '7',
        Key::Num8 => '8',
        Key::Num9 => '9',
        _ => return None,
    };
    Some(c)
}

impl Dispatch {
    fn click(&self, tracker: &Tracker, button: Button, pressed: bool) {
        let Some((x, y)) = tracker.cursor else {
            debug!("click before any pointer movement; position unknown");
            return;
        };
        // Clone the handler out so it never runs under the lock.
        let handler = lock(&self.handlers).click.clone();
        if let Some(handler) = handler {
            handler(ClickEvent {
                x,
                y,
                button: map_button(button),
                pressed,
            });
        }
    }

    fn handle(&self, tracker: &mut Tracker, event: Event) {
        match event.event_type {
            EventType::MouseMove { x, y } => {
                tracker.cursor = Some((x.round() as i32, y.round() as i32));
            }
            EventType::ButtonPress(button) => self.click(tracker, button, true),
            EventType::ButtonRelease(button) => self.click(tracker, button, false),
            EventType::KeyPress(key) => {
                tracker.set_modifier(key, true);
                let Some(c) = key_char(key) else {
                    return;
                };
                let hotkey = lock(&self.handlers).hotkey.clone();
                if let Some((hotkey, handler)) = hotkey {
                    if hotkey.matches(tracker.modifiers(), c) {
                        info!("stop hotkey {hotkey} pressed");
                        // Keep the OS hook thread free while the session shuts down.
                        let spawned = thread::Builder::new()
                            .name("stepsnap-hotkey".to_string())
                            .spawn(move || handler());
                        if let Err(err) = spawned {
                            error!("could not run hotkey handler: {err}");
                        }
                    }
                }
            }
            EventType::KeyRelease(key) => tracker.set_modifier(key, false),
            EventType::Wheel { .. } => {}
        }
    }
}

/// [`InputHooks`] backed by the process-wide `rdev` listener.
#[derive(Clone)]
pub struct RdevHooks {
    dispatch: Arc<Dispatch>,
}

impl RdevHooks {
    pub fn new() -> Self {
        let dispatch = DISPATCH.get_or_init(|| {
            Arc::new(Dispatch {
                handlers: Mutex::new(Handlers::default()),
                status: Mutex::new(ListenerStatus::NotStarted),
            })
        });
        Self {
            dispatch: Arc::clone(dispatch),
        }
    }

    /// Start the listener thread if it is not running yet.
    ///
    /// A failed start is remembered; `rdev` cannot be re-armed in-process.
    fn ensure_listening(&self) -> Result<(), HookError> {
        let mut status = lock(&self.dispatch.status);
        match &*status {
            ListenerStatus::Running => return Ok(()),
            ListenerStatus::Failed(reason) => return Err(HookError::Unavailable(reason.clone())),
            ListenerStatus::NotStarted => {}
        }

        let (setup_tx, setup_rx) = mpsc::channel::<String>();
        let dispatch = Arc::clone(&self.dispatch);
        thread::Builder::new()
            .name("stepsnap-input-hook".to_string())
            .spawn(move || {
                let mut tracker = Tracker::default();
                let result = rdev::listen(move |event| dispatch.handle(&mut tracker, event));
                match result {
                    Err(err) => {
                        let _ = setup_tx.send(format!("{err:?}"));
                    }
                    Ok(()) => {
                        let _ = setup_tx.send("listener exited".to_string());
                    }
                }
            })
            .map_err(|err| HookError::Thread(err.to_string()))?;

        match setup_rx.recv_timeout(SETUP_GRACE) {
            Err(RecvTimeoutError::Timeout) => {
                info!("global input hook installed");
                *status = ListenerStatus::Running;
                Ok(())
            }
            Ok(reason) => {
                warn!("global input hook failed: {reason}");
                *status = ListenerStatus::Failed(reason.clone());
                Err(HookError::Unavailable(reason))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let reason = "listener thread ended during setup".to_string();
                *status = ListenerStatus::Failed(reason.clone());
                Err(HookError::Unavailable(reason))
            }
        }
    }
}

impl Default for RdevHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHooks for RdevHooks {
    fn register_click(&self, handler: ClickHandler) -> Result<(), HookError> {
        self.ensure_listening()?;
        lock(&self.dispatch.handlers).click = Some(handler);
        Ok(())
    }

    fn register_hotkey(&self, hotkey: Hotkey, handler: HotkeyHandler) -> Result<(), HookError> {
        self.ensure_listening()?;
        lock(&self.dispatch.handlers).hotkey = Some((hotkey, handler));
        Ok(())
    }

    fn unregister_all(&self) {
        let mut handlers = lock(&self.dispatch.handlers);
        handlers.click = None;
        handlers.hotkey = None;
    }
}
