//! Phase helpers shared by the oscillator models.

use std::f64::consts::TAU;

/// Time-series column holding the order parameter.
pub const ORDER_COLUMN: &str = "order";

/// Kuramoto order parameter of a set of phases.
///
/// `r = sqrt((Σsin θ / n)² + (Σcos θ / n)²)`, in `[0, 1]`; 1 means perfect
/// alignment. An empty set has order 0.
pub fn order_parameter<I>(phases: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (mut sin, mut cos, mut n) = (0.0, 0.0, 0usize);
    for theta in phases {
        sin += theta.sin();
        cos += theta.cos();
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    let (s, c) = (sin / n as f64, cos / n as f64);
    (s * s + c * c).sqrt().min(1.0)
}

/// Maps an angle into `[0, 2π)`.
pub fn wrap_phase(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
