use std::cell::Cell;
use std::rc::Rc;

use crate::error::{PhysicsError, Result};

/// Shared simulation clock: the one source of "now" for a grid and its coordinator.
///
/// Clones share the same underlying value. Time only moves forward.
#[derive(Clone, Debug, Default)]
pub struct SimClock(Rc<Cell<f64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    pub fn starting_at(t: f64) -> Self {
        Self(Rc::new(Cell::new(t)))
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.0.get()
    }

    /// Move to absolute time `t`. Moving backwards is an error.
    pub fn advance_to(&self, t: f64) -> Result<()> {
        let now = self.now();
        if t.is_nan() || t < now {
            return Err(PhysicsError::TimeRegression { time: t, now });
        }
        self.0.set(t);
        Ok(())
    }

    /// Move forward by `dt` and return the new time.
    pub fn advance_by(&self, dt: f64) -> Result<f64> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(PhysicsError::InvalidTime(dt));
        }
        let t = self.now() + dt;
        self.0.set(t);
        Ok(t)
    }
}
