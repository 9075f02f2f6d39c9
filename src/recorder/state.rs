use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderAction {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStateError {
    InvalidTransition {
        from: SessionState,
        action: RecorderAction,
    },
}

pub struct RecorderState {
    state: SessionState,
}

impl RecorderState {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    fn transition(
        &mut self,
        allowed: &[SessionState],
        to: SessionState,
        action: RecorderAction,
    ) -> Result<(), RecorderStateError> {
        if allowed.contains(&self.state) {
            self.state = to;
            Ok(())
        } else {
            Err(RecorderStateError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    pub fn start(&mut self) -> Result<(), RecorderStateError> {
        self.transition(
            &[SessionState::Idle],
            SessionState::Recording,
            RecorderAction::Start,
        )
    }

    pub fn stop(&mut self) -> Result<(), RecorderStateError> {
        self.transition(
            &[SessionState::Recording],
            SessionState::Idle,
            RecorderAction::Stop,
        )
    }

    /// Roll back to `Idle` after a start that could not complete.
    pub fn reset_idle(&mut self) {
        self.state = SessionState::Idle;
    }
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::new()
    }
}
