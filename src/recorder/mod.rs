pub mod capture;
pub mod click_event;
pub mod engine;
pub mod hooks;
pub mod hotkey;
pub mod rdev_hooks;
pub mod session;
pub mod state;
pub mod types;
pub mod xcap_capture;

pub use engine::{EngineEvent, SessionEngine, SessionSnapshot, StopOutcome};
pub use state::SessionState;
