use easel_common::{Point, Vector};
use std::collections::VecDeque;
use std::time::Duration;
use web_time::Instant;

/// Pointer velocity over a sliding time window
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    window: Duration,
    samples: VecDeque<(Instant, Point)>,
}

impl VelocityTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, now: Instant, point: Point) {
        self.samples.push_back((now, point));
        while let Some((at, _)) = self.samples.front() {
            if now.duration_since(*at) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Pixels per second between the oldest and newest samples in the window
    pub fn velocity(&self) -> Vector {
        let (Some((t0, p0)), Some((t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return Vector::ZERO;
        };
        let elapsed = t1.duration_since(*t0).as_secs_f64();
        if elapsed <= f64::EPSILON {
            return Vector::ZERO;
        }
        Vector::between(*p0, *p1).scale(1.0 / elapsed)
    }

    pub fn speed(&self) -> f64 {
        self.velocity().length()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
