//! Discrete-step engine.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::context::{panic_message, EngineShared, StepContext, StopHandle};
use crate::error::{DynamicsResult, EngineError};
use crate::lifecycle::RunState;
use crate::observer::{Cursor, RunObserver};
use crate::timeseries::TimeSeries;

/// A model advanced one discrete step at a time.
pub trait DiscreteDynamics: Send + 'static {
    /// Caller-defined summary of the final state.
    type Summary;
    
    /// Called once before the first step.
    fn init(&mut self, _ctx: &mut StepContext<'_>) -> DynamicsResult<()> {
        Ok(())
    }
    
    /// Advances the model by one step.
    fn step(&mut self, ctx: &mut StepContext<'_>) -> DynamicsResult<()>;
    
    /// Called once after a run ends in `Stopped` (never after `Error`).
    fn finish(&mut self, _ctx: &mut StepContext<'_>) {}
    
    fn collect(&self) -> Self::Summary;
}

/// Runs a [`DiscreteDynamics`] until stopped.
///
/// The loop owns step advancement and is single-threaded; whatever the
/// dynamics do inside one step (parallel or not) is their business.
pub struct DiscreteEngine<D: DiscreteDynamics> {
    shared: Arc<EngineShared>,
    dynamics: Arc<Mutex<D>>,
}

impl<D: DiscreteDynamics> DiscreteEngine<D> {
    pub fn new(dynamics: D, config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(EngineShared::new(config, false)),
            dynamics: Arc::new(Mutex::new(dynamics)),
        }
    }
    
    /// Runs to completion on the calling thread and returns the terminal
    /// state.
    pub fn run(&self) -> Result<RunState, EngineError> {
        self.begin()?;
        Ok(drive(&self.shared, &self.dynamics))
    }
    
    /// Starts the run on a named background thread.
    ///
    /// The engine is already `Running` when this returns, so an immediate
    /// `stop()` cannot be lost.
    pub fn run_in_background(&self) -> Result<JoinHandle<RunState>, EngineError> {
        self.begin()?;
        let shared = self.shared.clone();
        let dynamics = self.dynamics.clone();
        thread::Builder::new()
            .name(self.shared.config.name.clone())
            .spawn(move || drive(&shared, &dynamics))
            .map_err(|e| {
                self.shared.control.fail();
                EngineError::Spawn(e)
            })
    }
    
    fn begin(&self) -> Result<(), EngineError> {
        self.shared.config.validate()?;
        self.shared.control.start().map_err(EngineError::NotIdle)
    }
    
    /// Requests a stop between steps. No-op unless running.
    pub fn stop(&self) -> bool {
        self.shared.control.stop()
    }
    
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.shared.control.clone())
    }
    
    pub fn state(&self) -> RunState {
        self.shared.control.state()
    }
    
    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.shared.steps()
    }
    
    pub fn subscribe(&self, observer: Arc<dyn RunObserver>) {
        self.shared.subscribe(observer);
    }
    
    /// Summary of the dynamics; waits for an in-flight step to finish.
    pub fn collect(&self) -> D::Summary {
        self.dynamics.lock().collect()
    }
    
    /// Runs `f` on the dynamics between steps.
    pub fn with_dynamics<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.dynamics.lock())
    }
    
    /// Records a value keyed by the current step.
    pub fn add_data_point(&self, column: &str, value: f64) {
        self.shared.record(self.shared.cursor().as_f64(), column, value);
    }
    
    pub fn time_series(&self) -> TimeSeries {
        self.shared.series()
    }
    
    pub fn render_time_series(&self) -> String {
        self.shared.render_series()
    }
    
    /// Writes the time series; failures are logged and the in-memory data
    /// is kept for a retry.
    pub fn write_time_series(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.shared.write_series(path.as_ref())
    }
}

/// Runs a dynamics callback, turning both errors and panics into a message.
pub(crate) fn guarded<F>(f: F) -> Result<(), String>
where
    F: FnOnce() -> DynamicsResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panic: {}", panic_message(payload.as_ref()))),
    }
}

fn drive<D: DiscreteDynamics>(shared: &EngineShared, dynamics: &Mutex<D>) -> RunState {
    let name = &shared.config.name;
    info!("[{}] discrete run started", name);
    shared.notify_start();
    
    if let Err(msg) = guarded(|| dynamics.lock().init(&mut StepContext::new(shared))) {
        error!("[{}] init failed: {}", name, msg);
        shared.control.fail();
    }
    
    while shared.control.is_running() {
        if shared.budget_exhausted() {
            shared.control.stop();
            break;
        }
        
        let step = shared.steps();
        if let Err(msg) = guarded(|| dynamics.lock().step(&mut StepContext::new(shared))) {
            error!("[{}] step {} failed: {}", name, step, msg);
            shared.control.fail();
            break;
        }
        
        shared.notify_step(Cursor::Step(step));
        shared.advance_step();
        debug!("[{}] step {} done", name, step);
    }
    
    let state = shared.control.state();
    if state == RunState::Stopped {
        dynamics.lock().finish(&mut StepContext::new(shared));
    }
    info!("[{}] discrete run ended in {:?} after {} steps", name, state, shared.steps());
    shared.notify_stop(state);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DynamicsError;
    use std::sync::atomic::{AtomicU64, Ordering};
    
    #[derive(Default)]
    struct Counter {
        inits: u32,
        steps: u64,
        finished: bool,
        fail_at: Option<u64>,
        panic_at: Option<u64>,
    }
    
    impl DiscreteDynamics for Counter {
        type Summary = (u32, u64, bool);
        
        fn init(&mut self, _ctx: &mut StepContext<'_>) -> DynamicsResult<()> {
            self.inits += 1;
            Ok(())
        }
        
        fn step(&mut self, ctx: &mut StepContext<'_>) -> DynamicsResult<()> {
            if self.fail_at == Some(self.steps) {
                return Err(DynamicsError::failed("boom"));
            }
            if self.panic_at == Some(self.steps) {
                panic!("step exploded");
            }
            self.steps += 1;
            ctx.add_data_point("count", self.steps as f64);
            Ok(())
        }
        
        fn finish(&mut self, _ctx: &mut StepContext<'_>) {
            self.finished = true;
        }
        
        fn collect(&self) -> Self::Summary {
            (self.inits, self.steps, self.finished)
        }
    }
    
    #[test]
    fn test_run_to_budget() {
        let engine = DiscreteEngine::new(Counter::default(), EngineConfig::default().with_max_steps(5));
        assert_eq!(engine.state(), RunState::Idle);
        
        let state = engine.run().unwrap();
        assert_eq!(state, RunState::Stopped);
        assert_eq!(engine.step_count(), 5);
        assert_eq!(engine.collect(), (1, 5, true));
        
        let series = engine.time_series();
        assert_eq!(series.get(0.0, "count"), Some(1.0));
        assert_eq!(series.get(4.0, "count"), Some(5.0));
    }
    
    #[test]
    fn test_cannot_run_twice() {
        let engine = DiscreteEngine::new(Counter::default(), EngineConfig::default().with_max_steps(1));
        engine.run().unwrap();
        assert!(matches!(engine.run(), Err(EngineError::NotIdle(RunState::Stopped))));
    }
    
    #[test]
    fn test_error_in_step_ends_run_without_finish() {
        let dynamics = Counter {
            fail_at: Some(3),
            ..Default::default()
        };
        let engine = DiscreteEngine::new(dynamics, EngineConfig::default().with_max_steps(10));
        assert_eq!(engine.run().unwrap(), RunState::Error);
        assert_eq!(engine.step_count(), 3);
        assert_eq!(engine.collect(), (1, 3, false));
    }
    
    #[test]
    fn test_panic_in_step_is_caught() {
        let dynamics = Counter {
            panic_at: Some(0),
            ..Default::default()
        };
        let engine = DiscreteEngine::new(dynamics, EngineConfig::default());
        assert_eq!(engine.run().unwrap(), RunState::Error);
        assert_eq!(engine.step_count(), 0);
    }
    
    struct StopAt {
        at: u64,
        stop: parking_lot::Mutex<Option<StopHandle>>,
        seen: AtomicU64,
    }
    
    impl RunObserver for StopAt {
        fn on_step(&self, cursor: Cursor) {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if cursor == Cursor::Step(self.at) {
                if let Some(handle) = self.stop.lock().as_ref() {
                    handle.stop();
                }
            }
        }
    }
    
    #[test]
    fn test_observer_stops_run() {
        let engine = DiscreteEngine::new(Counter::default(), EngineConfig::default());
        let observer = Arc::new(StopAt {
            at: 7,
            stop: parking_lot::Mutex::new(Some(engine.stop_handle())),
            seen: AtomicU64::new(0),
        });
        engine.subscribe(observer.clone());
        
        assert_eq!(engine.run().unwrap(), RunState::Stopped);
        assert_eq!(engine.step_count(), 8);
        assert_eq!(observer.seen.load(Ordering::SeqCst), 8);
    }
    
    #[test]
    fn test_background_run_and_stop() {
        let engine = DiscreteEngine::new(Counter::default(), EngineConfig::default());
        let handle = engine.run_in_background().unwrap();
        assert_eq!(engine.state(), RunState::Running);
        
        while engine.step_count() < 10 {
            std::thread::yield_now();
        }
        assert!(engine.stop());
        assert_eq!(handle.join().unwrap(), RunState::Stopped);
        assert!(engine.collect().2);
    }
}
