//! Fixed-step continuous engine (RK4).

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use nalgebra::DVector;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::context::{EngineShared, StepContext, StopHandle};
use crate::discrete::guarded;
use crate::error::{DynamicsResult, EngineError};
use crate::integrator::{check_finite, rk4_step};
use crate::lifecycle::RunState;
use crate::observer::{Cursor, RunObserver};
use crate::timeseries::TimeSeries;

/// A model described by `dy/dt = f(t, y)` over a real state vector.
pub trait ContinuousDynamics: Send + 'static {
    type Summary;
    
    /// Builds the initial state vector.
    fn init(&mut self, ctx: &mut StepContext<'_>) -> DynamicsResult<DVector<f64>>;
    
    /// Runs before each integration step. Random choices that must stay
    /// fixed across the four RK4 stages are made here, and pending edits
    /// may be written into the state.
    fn prepare(&mut self, _time: f64, _state: &mut DVector<f64>) -> DynamicsResult<()> {
        Ok(())
    }
    
    /// Time derivative of the state. Must not have side effects.
    fn derivative(&self, time: f64, state: &DVector<f64>) -> DynamicsResult<DVector<f64>>;
    
    /// Sees the accepted state after each step.
    fn observe(&mut self, _state: &DVector<f64>, _ctx: &mut StepContext<'_>) {}
    
    fn finish(&mut self, _state: &DVector<f64>, _ctx: &mut StepContext<'_>) {}
    
    fn collect(&self, state: &DVector<f64>) -> Self::Summary;
}

/// Runs a [`ContinuousDynamics`] with a fixed RK4 step of `config.dt`.
pub struct ContinuousEngine<D: ContinuousDynamics> {
    shared: Arc<EngineShared>,
    dynamics: Arc<Mutex<D>>,
    state: Arc<Mutex<DVector<f64>>>,
}

impl<D: ContinuousDynamics> ContinuousEngine<D> {
    pub fn new(dynamics: D, config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(EngineShared::new(config, true)),
            dynamics: Arc::new(Mutex::new(dynamics)),
            state: Arc::new(Mutex::new(DVector::zeros(0))),
        }
    }
    
    pub fn run(&self) -> Result<RunState, EngineError> {
        self.begin()?;
        Ok(integrate(&self.shared, &self.dynamics, &self.state))
    }
    
    /// Starts the run on a named background thread. The engine is already
    /// `Running` when this returns.
    pub fn run_in_background(&self) -> Result<JoinHandle<RunState>, EngineError> {
        self.begin()?;
        let shared = self.shared.clone();
        let dynamics = self.dynamics.clone();
        let state = self.state.clone();
        thread::Builder::new()
            .name(self.shared.config.name.clone())
            .spawn(move || integrate(&shared, &dynamics, &state))
            .map_err(|e| {
                self.shared.control.fail();
                EngineError::Spawn(e)
            })
    }
    
    fn begin(&self) -> Result<(), EngineError> {
        self.shared.config.validate()?;
        self.shared.control.start().map_err(EngineError::NotIdle)
    }
    
    pub fn stop(&self) -> bool {
        self.shared.control.stop()
    }
    
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.shared.control.clone())
    }
    
    pub fn state(&self) -> RunState {
        self.shared.control.state()
    }
    
    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.shared.time()
    }
    
    pub fn step_count(&self) -> u64 {
        self.shared.steps()
    }
    
    /// Snapshot of the state vector.
    pub fn state_vector(&self) -> DVector<f64> {
        self.state.lock().clone()
    }
    
    pub fn subscribe(&self, observer: Arc<dyn RunObserver>) {
        self.shared.subscribe(observer);
    }
    
    pub fn collect(&self) -> D::Summary {
        let state = self.state.lock();
        self.dynamics.lock().collect(&state)
    }
    
    pub fn with_dynamics<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.dynamics.lock())
    }
    
    /// Records a value keyed by the current time.
    pub fn add_data_point(&self, column: &str, value: f64) {
        self.shared.record(self.shared.cursor().as_f64(), column, value);
    }
    
    pub fn time_series(&self) -> TimeSeries {
        self.shared.series()
    }
    
    pub fn render_time_series(&self) -> String {
        self.shared.render_series()
    }
    
    pub fn write_time_series(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.shared.write_series(path.as_ref())
    }
}

fn integrate<D: ContinuousDynamics>(
    shared: &EngineShared,
    dynamics: &Mutex<D>,
    state: &Mutex<DVector<f64>>,
) -> RunState {
    let name = &shared.config.name;
    let dt = shared.config.dt;
    info!("[{}] continuous run started (dt={})", name, dt);
    shared.notify_start();
    
    let init = guarded(|| {
        let initial = dynamics.lock().init(&mut StepContext::new(shared))?;
        check_finite(&initial, 0.0)?;
        *state.lock() = initial;
        Ok(())
    });
    if let Err(msg) = init {
        error!("[{}] init failed: {}", name, msg);
        shared.control.fail();
    }
    
    while shared.control.is_running() {
        if shared.budget_exhausted() {
            shared.control.stop();
            break;
        }
        
        let t = shared.time();
        let stepped = guarded(|| {
            let mut dynamics = dynamics.lock();
            let mut y = state.lock();
            dynamics.prepare(t, &mut y)?;
            let next = rk4_step(|time, s| dynamics.derivative(time, s), t, &y, dt)?;
            check_finite(&next, t + dt)?;
            *y = next;
            Ok(())
        });
        if let Err(msg) = stepped {
            error!("[{}] integration failed at t={}: {}", name, t, msg);
            shared.control.fail();
            break;
        }
        
        // Multiplying avoids drift from summing dt repeatedly.
        let now = (shared.steps() + 1) as f64 * dt;
        shared.set_time(now);
        {
            let mut dynamics = dynamics.lock();
            let y = state.lock();
            dynamics.observe(&y, &mut StepContext::new(shared));
        }
        shared.notify_step(Cursor::Time(now));
        shared.advance_step();
        debug!("[{}] t={:.4}", name, now);
    }
    
    let final_state = shared.control.state();
    if final_state == RunState::Stopped {
        let mut dynamics = dynamics.lock();
        let y = state.lock();
        dynamics.finish(&y, &mut StepContext::new(shared));
    }
    info!("[{}] continuous run ended in {:?} at t={}", name, final_state, shared.time());
    shared.notify_stop(final_state);
    final_state
}
