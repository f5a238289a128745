/// One scheduled linear ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Ramp {
    from: f32,
    to: f32,
    start: f64,
    duration: f64,
}

/// Gain parameter with at most one scheduled linear ramp, on the audio clock.
///
/// Before the ramp starts the value is `from`; after it ends the value holds at `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainParam {
    base: f32,
    ramp: Option<Ramp>,
}

impl GainParam {
    pub fn new(value: f32) -> Self {
        Self {
            base: value,
            ramp: None,
        }
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let Some(r) = self.ramp else {
            return self.base;
        };
        if t <= r.start {
            return r.from;
        }
        if r.duration <= 0.0 || t >= r.start + r.duration {
            return r.to;
        }
        let k = ((t - r.start) / r.duration) as f32;
        r.from + (r.to - r.from) * k
    }

    /// Cancel any scheduled ramp and jump to `value`.
    pub fn set(&mut self, value: f32) {
        self.base = value;
        self.ramp = None;
    }

    /// Cancel any scheduled ramp, holding the value it had reached at `t`.
    pub fn cancel_and_hold(&mut self, t: f64) {
        self.base = self.value_at(t);
        self.ramp = None;
    }

    /// Schedule a linear ramp `from -> to` over `[start, start + duration]`.
    pub fn ramp(&mut self, from: f32, to: f32, start: f64, duration: f64) {
        self.base = to;
        self.ramp = Some(Ramp {
            from,
            to,
            start,
            duration: duration.max(0.0),
        });
    }

    pub fn is_ramping_at(&self, t: f64) -> bool {
        self.ramp
            .is_some_and(|r| t < r.start + r.duration)
    }
}

impl Default for GainParam {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/automation.rs"]
mod tests;
