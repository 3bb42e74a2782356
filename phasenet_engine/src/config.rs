//! Engine configuration.

use crate::error::EngineError;

/// Configuration shared by both engine flavors.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name used for log output and the background thread
    pub name: String,
    
    /// Fixed integration step of the continuous engine
    pub dt: f64,
    
    /// Stop automatically after this many steps (None = until stopped)
    pub max_steps: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "engine".to_string(),
            dt: 0.01,
            max_steps: None,
        }
    }
}

impl EngineConfig {
    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
    
    /// Sets the integration step.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }
    
    /// Bounds the run to `steps` steps.
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }
    
    /// Checks that time can advance.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "dt must be positive and finite, got {}",
                self.dt
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_validate_dt() {
        assert!(EngineConfig::default().validate().is_ok());
        for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let err = EngineConfig::default().with_dt(dt).validate().unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfig(_)));
        }
    }
}
