// src/filter.rs

/// First-order exponential low-pass filter.
///
/// `rc` is the time constant in seconds. The step size is passed on every
/// update so a late or skipped tick integrates the real elapsed time.
#[derive(Debug, Clone)]
pub struct FirstOrderFilter {
    pub x: f32,
    rc: f32,
}

impl FirstOrderFilter {
    pub fn new(x0: f32, rc: f32) -> Self {
        Self { x: x0, rc }
    }

    pub fn update(&mut self, measurement: f32, dt: f32) -> f32 {
        if dt > 0.0 {
            let alpha = dt / (self.rc + dt);
            self.x = (1.0 - alpha) * self.x + alpha * measurement;
        }
        self.x
    }

    /// Snap the state to a measurement (e.g. on disengage)
    pub fn reset(&mut self, x: f32) {
        self.x = x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_converges_to_input() {
        let mut f = FirstOrderFilter::new(0.0, 2.0);
        for _ in 0..2000 {
            f.update(10.0, 0.05);
        }
        assert!((f.x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_filter_step_response() {
        let mut f = FirstOrderFilter::new(0.0, 2.0);
        let y = f.update(10.0, 0.05);
        // alpha = 0.05 / 2.05
        assert!((y - 10.0 * 0.05 / 2.05).abs() < 1e-5);
    }

    #[test]
    fn test_zero_dt_holds_state() {
        let mut f = FirstOrderFilter::new(3.0, 2.0);
        assert_eq!(f.update(100.0, 0.0), 3.0);
        f.reset(7.5);
        assert_eq!(f.x, 7.5);
    }
}
