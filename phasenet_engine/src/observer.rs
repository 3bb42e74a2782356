//! Run notifications.

use crate::lifecycle::RunState;

/// Position of a run: a step index or a continuous time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cursor {
    Step(u64),
    Time(f64),
}

impl Cursor {
    /// Key under which time-series values are recorded.
    pub fn as_f64(self) -> f64 {
        match self {
            Cursor::Step(step) => step as f64,
            Cursor::Time(time) => time,
        }
    }
}

/// Callbacks fired by the run loop on its own thread.
///
/// `on_step` runs between steps, with no engine lock held, so it may query
/// the engine or call `stop()`.
pub trait RunObserver: Send + Sync {
    fn on_start(&self) {}
    
    fn on_step(&self, _cursor: Cursor) {}
    
    fn on_stop(&self, _state: RunState) {}
}
