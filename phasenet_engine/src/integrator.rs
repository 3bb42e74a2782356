//! Classic fourth-order Runge–Kutta.

use nalgebra::DVector;

use crate::error::{DynamicsError, DynamicsResult};

/// Advances `y` from `t` to `t + dt`.
///
/// Stages are evaluated in order, each scaled by `dt`:
///
/// ```text
/// k1 = dt·f(t,        y)
/// k2 = dt·f(t + dt/2, y + k1/2)
/// k3 = dt·f(t + dt/2, y + k2/2)
/// k4 = dt·f(t + dt,   y + k3)
/// y' = y + (k1 + 2·k2 + 2·k3 + k4) / 6
/// ```
pub fn rk4_step<F>(f: F, t: f64, y: &DVector<f64>, dt: f64) -> DynamicsResult<DVector<f64>>
where
    F: Fn(f64, &DVector<f64>) -> DynamicsResult<DVector<f64>>,
{
    let stage = |time: f64, at: &DVector<f64>| -> DynamicsResult<DVector<f64>> {
        let delta = f(time, at)?;
        if delta.len() != at.len() {
            return Err(DynamicsError::DimensionMismatch {
                expected: at.len(),
                found: delta.len(),
            });
        }
        Ok(delta * dt)
    };
    
    let half = dt / 2.0;
    let k1 = stage(t, y)?;
    let k2 = stage(t + half, &(y + &k1 * 0.5))?;
    let k3 = stage(t + half, &(y + &k2 * 0.5))?;
    let k4 = stage(t + dt, &(y + &k3))?;
    
    Ok(y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0)
}

/// Fails on the first NaN or infinite component.
pub fn check_finite(state: &DVector<f64>, time: f64) -> DynamicsResult<()> {
    match state.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(DynamicsError::NonFinite { index, time }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    
    #[test]
    fn test_constant_derivative_is_exact() {
        let y0 = DVector::from_vec(vec![0.3, -1.0]);
        let omega = DVector::from_vec(vec![2.0, 0.5]);
        let y1 = rk4_step(|_, _| Ok(omega.clone()), 0.0, &y0, 0.1).unwrap();
        assert_relative_eq!(y1[0], 0.3 + 0.2, epsilon = 1e-12);
        assert_relative_eq!(y1[1], -1.0 + 0.05, epsilon = 1e-12);
    }
    
    #[test]
    fn test_exponential_decay_accuracy() {
        // dy/dt = -y, y(1) = e^-1
        let mut y = DVector::from_vec(vec![1.0]);
        let dt = 0.01;
        for i in 0..100 {
            y = rk4_step(|_, y| Ok(-y), i as f64 * dt, &y, dt).unwrap();
        }
        assert_relative_eq!(y[0], (-1.0f64).exp(), epsilon = 1e-9);
    }
    
    #[test]
    fn test_time_dependent_derivative() {
        // dy/dt = t, exact for polynomials of degree <= 4
        let y0 = DVector::from_vec(vec![0.0]);
        let y1 = rk4_step(|t, _| Ok(DVector::from_vec(vec![t])), 0.0, &y0, 1.0).unwrap();
        assert_relative_eq!(y1[0], 0.5, epsilon = 1e-12);
    }
    
    #[test]
    fn test_dimension_mismatch() {
        let y0 = DVector::from_vec(vec![0.0, 0.0]);
        let result = rk4_step(|_, _| Ok(DVector::from_vec(vec![1.0])), 0.0, &y0, 0.1);
        assert_eq!(
            result,
            Err(DynamicsError::DimensionMismatch { expected: 2, found: 1 })
        );
    }
    
    #[test]
    fn test_check_finite() {
        let state = DVector::from_vec(vec![1.0, f64::NAN]);
        assert_eq!(
            check_finite(&state, 0.5),
            Err(DynamicsError::NonFinite { index: 1, time: 0.5 })
        );
    }
}
