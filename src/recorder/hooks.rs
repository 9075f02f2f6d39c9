use std::sync::Arc;

use thiserror::Error;

use super::click_event::ClickEvent;
use super::hotkey::Hotkey;

#[derive(Debug, Clone, Error)]
pub enum HookError {
    /// The OS refused the global hook, usually for lack of input-monitoring permission.
    #[error("global input hook unavailable: {0}")]
    Unavailable(String),
    #[error("could not start hook thread: {0}")]
    Thread(String),
}

pub type ClickHandler = Arc<dyn Fn(ClickEvent) + Send + Sync>;
pub type HotkeyHandler = Arc<dyn Fn() + Send + Sync>;

/// Global mouse and hotkey subscriptions.
///
/// Handlers run on the provider's own threads and may be invoked concurrently
/// with each other and with the caller of these methods. A provider holds at
/// most one handler of each kind; registering again replaces it.
pub trait InputHooks: Send + Sync {
    fn register_click(&self, handler: ClickHandler) -> Result<(), HookError>;

    fn register_hotkey(&self, hotkey: Hotkey, handler: HotkeyHandler) -> Result<(), HookError>;

    /// Detach both handlers. Must return promptly and succeed even if the OS
    /// already tore the hooks down. The engine calls this with its session
    /// lock held, so it must not wait on a running handler.
    fn unregister_all(&self);
}
