//! PhaseNet simulation engines
//!
//! Two run loops share one lifecycle ([`RunState`]) and one output format
//! ([`TimeSeries`]):
//!
//! - [`DiscreteEngine`] calls [`DiscreteDynamics::step`] once per step.
//! - [`ContinuousEngine`] integrates a [`ContinuousDynamics`] with a fixed
//!   RK4 step.
//!
//! Errors and panics raised by a dynamics object are caught at the loop
//! boundary, logged, and end the run in [`RunState::Error`].
//!
//! # Example
//!
//! ```
//! use phasenet_engine::{DiscreteDynamics, DiscreteEngine, DynamicsResult, EngineConfig, RunState, StepContext};
//!
//! struct Countdown(u32);
//!
//! impl DiscreteDynamics for Countdown {
//!     type Summary = u32;
//!
//!     fn step(&mut self, ctx: &mut StepContext<'_>) -> DynamicsResult<()> {
//!         self.0 -= 1;
//!         if self.0 == 0 {
//!             ctx.stop();
//!         }
//!         Ok(())
//!     }
//!
//!     fn collect(&self) -> u32 {
//!         self.0
//!     }
//! }
//!
//! let engine = DiscreteEngine::new(Countdown(3), EngineConfig::default());
//! assert_eq!(engine.run().unwrap(), RunState::Stopped);
//! assert_eq!(engine.step_count(), 3);
//! ```

mod config;
mod context;
mod continuous;
mod discrete;
mod error;
mod integrator;
mod lifecycle;
mod observer;
mod timeseries;

pub use config::EngineConfig;
pub use context::{StepContext, StopHandle};
pub use continuous::{ContinuousDynamics, ContinuousEngine};
pub use discrete::{DiscreteDynamics, DiscreteEngine};
pub use error::{DynamicsError, DynamicsResult, EngineError};
pub use integrator::{check_finite, rk4_step};
pub use lifecycle::{RunControl, RunState};
pub use observer::{Cursor, RunObserver};
pub use timeseries::TimeSeries;
