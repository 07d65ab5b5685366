//! Automated gain parameter with scheduled and smoothed transitions.

/// Smallest level an exponential ramp may start from or land on; an
/// exponential curve is undefined at zero.
const MIN_LEVEL: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    /// No transition scheduled; the value holds.
    Hold,
    /// Exponential approach toward a target with a fixed time constant.
    /// Never terminates on its own; a new target simply replaces it.
    Target { target: f64, coeff: f64 },
    /// Straight-line ramp ending exactly on the target.
    Linear { target: f64, step: f64 },
    /// Multiplicative ramp ending on the target.
    Exponential { target: f64, factor: f64 },
}

/// A gain value advanced one sample at a time.
///
/// Mirrors the automation styles of an audio-graph gain parameter: linear
/// ramps for fade-in, exponential ramps for fade-out, and a smoothed
/// exponential approach for per-frame target changes, which avoids audible
/// clicks no matter how often a new target arrives. Exactly one automation is
/// active at a time, so repeated scheduling cannot accumulate state.
#[derive(Debug, Clone)]
pub struct SmoothedGain {
    value: f64,
    sample_rate: f64,
    automation: Automation,
}

impl SmoothedGain {
    pub fn new(sample_rate: f64, value: f64) -> Self {
        Self {
            value,
            sample_rate,
            automation: Automation::Hold,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Jump immediately to `value`, dropping any scheduled transition.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.automation = Automation::Hold;
    }

    /// Glide toward `target` with the given time constant in seconds. After
    /// one time constant the value has covered ~63% of the distance.
    pub fn set_target(&mut self, target: f64, time_constant: f64) {
        let coeff = 1.0 - (-1.0 / (time_constant * self.sample_rate)).exp();
        self.automation = Automation::Target { target, coeff };
    }

    /// Ramp linearly from the current value to `target` over `seconds`.
    pub fn linear_ramp(&mut self, target: f64, seconds: f64) {
        let samples = (seconds * self.sample_rate).max(1.0);
        self.automation = Automation::Linear {
            target,
            step: (target - self.value) / samples,
        };
    }

    /// Ramp exponentially from the current value to `target` over `seconds`.
    /// Both ends are floored at a small positive level.
    pub fn exponential_ramp(&mut self, target: f64, seconds: f64) {
        let target = target.max(MIN_LEVEL);
        self.value = self.value.max(MIN_LEVEL);
        let samples = (seconds * self.sample_rate).max(1.0);
        self.automation = Automation::Exponential {
            target,
            factor: (target / self.value).powf(1.0 / samples),
        };
    }

    /// Drop any scheduled transition, freezing the parameter at its current
    /// value. Safe to call when nothing is scheduled.
    pub fn cancel_scheduled(&mut self) {
        self.automation = Automation::Hold;
    }

    /// Advance one sample and return the new value.
    pub fn next(&mut self) -> f64 {
        match self.automation {
            Automation::Hold => {}
            Automation::Target { target, coeff } => {
                self.value += (target - self.value) * coeff;
            }
            Automation::Linear { target, step } => {
                self.value += step;
                let done = step == 0.0
                    || (step > 0.0 && self.value >= target)
                    || (step < 0.0 && self.value <= target);
                if done {
                    self.value = target;
                    self.automation = Automation::Hold;
                }
            }
            Automation::Exponential { target, factor } => {
                self.value *= factor;
                let done = factor == 1.0
                    || (factor > 1.0 && self.value >= target)
                    || (factor < 1.0 && self.value <= target);
                if done {
                    self.value = target;
                    self.automation = Automation::Hold;
                }
            }
        }
        self.value
    }
}
