use serde::Serialize;
use std::f64::consts::PI;

use crate::model::Task;

/// Radius of the progress ring, in SVG user units.
pub const RING_RADIUS: f64 = 52.0;

/// Share of tasks marked done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// `round(100 * done / total)`, 0 when there are no tasks.
    pub pct: u8,
}

impl Progress {
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let done = tasks.iter().filter(|task| task.is_done()).count();
        Self {
            done,
            total,
            pct: percent(done, total),
        }
    }

    #[must_use]
    pub fn ring(self) -> RingGauge {
        RingGauge::new(self.pct)
    }
}

/// Integer half-up rounding of `100 * done / total`.
#[allow(clippy::cast_possible_truncation)]
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u128;
    let total = total as u128;
    ((200 * done + total) / (2 * total)) as u8
}

/// Stroke geometry for the circular gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RingGauge {
    pub radius: f64,
    pub circumference: f64,
    pub arc: f64,
}

impl RingGauge {
    #[must_use]
    pub fn new(pct: u8) -> Self {
        let circumference = 2.0 * PI * RING_RADIUS;
        Self {
            radius: RING_RADIUS,
            circumference,
            arc: circumference * f64::from(pct.min(100)) / 100.0,
        }
    }

    /// Value for the SVG `stroke-dasharray` attribute: `"<arc> <rest>"`.
    #[must_use]
    pub fn dasharray(&self) -> String {
        format!("{} {}", self.arc, self.circumference - self.arc)
    }
}
