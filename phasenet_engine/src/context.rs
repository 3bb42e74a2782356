//! State shared between an engine handle, its run loop and the dynamics.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::lifecycle::{RunControl, RunState};
use crate::observer::{Cursor, RunObserver};
use crate::timeseries::TimeSeries;

/// Decimals used for continuous time keys in exported series.
const TIME_DIGITS: usize = 6;

/// Engine internals behind an `Arc`, so a background run and the caller's
/// handle see the same state.
pub(crate) struct EngineShared {
    pub config: EngineConfig,
    pub control: Arc<RunControl>,
    series: Mutex<TimeSeries>,
    observers: RwLock<Vec<Arc<dyn RunObserver>>>,
    /// Completed steps
    steps: AtomicU64,
    /// Current time as f64 bits (continuous engine only)
    time_bits: AtomicU64,
    continuous: bool,
}

impl EngineShared {
    pub fn new(config: EngineConfig, continuous: bool) -> Self {
        Self {
            config,
            control: Arc::new(RunControl::new()),
            series: Mutex::new(if continuous {
                TimeSeries::new().with_key_digits(TIME_DIGITS)
            } else {
                TimeSeries::new()
            }),
            observers: RwLock::new(Vec::new()),
            steps: AtomicU64::new(0),
            time_bits: AtomicU64::new(0f64.to_bits()),
            continuous,
        }
    }
    
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }
    
    pub fn advance_step(&self) {
        self.steps.fetch_add(1, Ordering::AcqRel);
    }
    
    pub fn time(&self) -> f64 {
        f64::from_bits(self.time_bits.load(Ordering::Acquire))
    }
    
    pub fn set_time(&self, time: f64) {
        self.time_bits.store(time.to_bits(), Ordering::Release);
    }
    
    /// Where data points are recorded right now.
    pub fn cursor(&self) -> Cursor {
        if self.continuous {
            Cursor::Time(self.time())
        } else {
            Cursor::Step(self.steps())
        }
    }
    
    /// Whether the configured step budget is used up.
    pub fn budget_exhausted(&self) -> bool {
        self.config.max_steps.is_some_and(|max| self.steps() >= max)
    }
    
    pub fn record(&self, key: f64, column: &str, value: f64) {
        self.series.lock().add(key, column, value);
    }
    
    pub fn series(&self) -> TimeSeries {
        self.series.lock().clone()
    }
    
    pub fn render_series(&self) -> String {
        self.series.lock().render()
    }
    
    /// Writes the series, logging a failure and keeping the data for a
    /// later attempt.
    pub fn write_series(&self, path: &Path) -> Result<(), EngineError> {
        let result = self.series.lock().write_to(path);
        match result {
            Ok(()) => {
                info!("[{}] wrote time series to {}", self.config.name, path.display());
                Ok(())
            }
            Err(e) => {
                error!("[{}] failed to write time series to {}: {}", self.config.name, path.display(), e);
                Err(EngineError::Io(e))
            }
        }
    }
    
    pub fn subscribe(&self, observer: Arc<dyn RunObserver>) {
        self.observers.write().push(observer);
    }
    
    fn observers(&self) -> Vec<Arc<dyn RunObserver>> {
        self.observers.read().clone()
    }
    
    pub fn notify_start(&self) {
        for o in self.observers() {
            o.on_start();
        }
    }
    
    pub fn notify_step(&self, cursor: Cursor) {
        for o in self.observers() {
            o.on_step(cursor);
        }
    }
    
    pub fn notify_stop(&self, state: RunState) {
        for o in self.observers() {
            o.on_stop(state);
        }
    }
}

/// What a dynamics object sees of the engine while it is being called.
pub struct StepContext<'a> {
    shared: &'a EngineShared,
    cursor: Cursor,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(shared: &'a EngineShared) -> Self {
        Self {
            cursor: shared.cursor(),
            shared,
        }
    }
    
    /// Current step (discrete) or time (continuous).
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
    
    /// Records a value at the current cursor.
    pub fn add_data_point(&mut self, column: &str, value: f64) {
        self.shared.record(self.cursor.as_f64(), column, value);
    }
    
    /// Requests a cooperative stop after the current step.
    pub fn stop(&self) -> bool {
        self.shared.control.stop()
    }
    
    /// Integration step of the engine.
    pub fn dt(&self) -> f64 {
        self.shared.config.dt
    }
}

/// Cloneable handle that can stop a run from anywhere.
#[derive(Clone)]
pub struct StopHandle {
    control: Arc<RunControl>,
}

impl StopHandle {
    pub(crate) fn new(control: Arc<RunControl>) -> Self {
        Self { control }
    }
    
    pub fn stop(&self) -> bool {
        self.control.stop()
    }
    
    pub fn state(&self) -> RunState {
        self.control.state()
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
