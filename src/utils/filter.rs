//! Discrete first-order low-pass filter

#[derive(Debug, Clone)]
pub struct FirstOrderFilter {
    x: f64,
    alpha: f64,
}

impl FirstOrderFilter {
    /// `rc` is the time constant and `dt` the update period, both in seconds
    pub fn new(x0: f64, rc: f64, dt: f64) -> Self {
        FirstOrderFilter {
            x: x0,
            alpha: dt / (rc + dt),
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        self.x = (1.0 - self.alpha) * self.x + self.alpha * x;
        self.x
    }

    pub fn x(&self) -> f64 {
        self.x
    }
}
