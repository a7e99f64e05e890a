//! Solution watchdog
//!
//! Two independent checks run after every solve:
//!
//! - Fault recovery: a non-finite curvature column or a nonzero solver
//!   status resets the solver immediately and reseeds its curvature with the
//!   measured one, so the next warm start does not inherit garbage.
//! - Trust: consecutive invalid solutions (non-finite curvature or cost above
//!   the ceiling) are counted; the plan is trusted while the count stays
//!   below the threshold.

use tracing::warn;

use crate::common::{LateralSolver, LateralState, TrajectorySolution};
use crate::config::WatchdogConfig;
use crate::lateral_planning::lateral_mpc::LateralMpc;

/// Consecutive invalid-solution counter
#[derive(Debug, Clone)]
pub struct ValidityCounter {
    count: u32,
    threshold: u32,
}

impl ValidityCounter {
    pub fn new(threshold: u32) -> Self {
        ValidityCounter { count: 0, threshold }
    }

    pub fn record(&mut self, invalid: bool) {
        if invalid {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_trusted(&self) -> bool {
        self.count < self.threshold
    }
}

/// Lets an event through at most once per `interval`
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: f64,
    last: Option<f64>,
}

impl RateLimiter {
    pub fn new(interval: f64) -> Self {
        RateLimiter { interval, last: None }
    }

    /// True, and arms the limiter, when `now` is past the quiet period
    pub fn ready(&mut self, now: f64) -> bool {
        match self.last {
            Some(last) if now <= last + self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// What the watchdog found in one solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogVerdict {
    pub nan_curvature: bool,
    /// Solver state was reset this cycle
    pub fault: bool,
    /// Solution counted against the trust counter
    pub invalid: bool,
    /// A warning was logged this cycle
    pub warned: bool,
}

#[derive(Debug, Clone)]
pub struct SolutionWatchdog {
    cost_ceiling: f64,
    counter: ValidityCounter,
    warnings: RateLimiter,
}

impl SolutionWatchdog {
    pub fn new(config: &WatchdogConfig) -> Self {
        SolutionWatchdog {
            cost_ceiling: config.cost_ceiling,
            counter: ValidityCounter::new(config.invalid_threshold),
            warnings: RateLimiter::new(config.warning_interval),
        }
    }

    /// Classify a solution without acting on it
    pub fn classify(&self, solution: &TrajectorySolution) -> (bool, bool, bool) {
        let nan_curvature = solution.has_nan_curvature();
        let fault = nan_curvature || solution.status != 0;
        let invalid = nan_curvature || solution.cost > self.cost_ceiling;
        (nan_curvature, fault, invalid)
    }

    /// Inspect the latest solution of `mpc` and repair its state on faults
    pub fn check<S: LateralSolver>(&mut self, mpc: &mut LateralMpc<S>, measured_curvature: f64, now: f64) -> WatchdogVerdict {
        let (nan_curvature, fault, invalid) = self.classify(mpc.solution());
        let status = mpc.solution().status;

        let mut warned = false;
        if fault {
            mpc.reset(LateralState::zeros());
            mpc.set_curvature(measured_curvature);
            if self.warnings.ready(now) {
                warned = true;
                warn!(nan = nan_curvature, status, measured_curvature, "lateral mpc solution invalid, solver reset");
            }
        }

        self.counter.record(invalid);

        WatchdogVerdict {
            nan_curvature,
            fault,
            invalid,
            warned,
        }
    }

    /// Plan may be acted upon by downstream controllers
    pub fn solution_valid(&self) -> bool {
        self.counter.is_trusted()
    }

    pub fn invalid_count(&self) -> u32 {
        self.counter.count()
    }
}
