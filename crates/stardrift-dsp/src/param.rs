//! Automatable node parameters.
//!
//! An [`AudioParam`] holds a timeline of automation events. The renderer
//! evaluates it once per frame with monotonically increasing times, so the
//! param keeps a running anchor (the time and value where the current
//! segment started) instead of re-scanning its whole history.
//!
//! Ramp semantics follow the usual audio-graph convention: a ramp runs from
//! the time and value of the previous event to its own end time and value.

use crate::errors::{Result, SynthError};
use crate::node::NodeId;
use std::collections::VecDeque;
use std::fmt;

/// Which parameter of a node is being addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Oscillator or filter frequency in Hz.
    Frequency,
    /// Oscillator detune in cents.
    Detune,
    /// Linear gain.
    Gain,
    /// Filter quality factor.
    Q,
    /// Stereo position, -1.0 (left) to 1.0 (right).
    Pan,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Frequency => "frequency",
            ParamKind::Detune => "detune",
            ParamKind::Gain => "gain",
            ParamKind::Q => "Q",
            ParamKind::Pan => "pan",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Automation {
    SetValue { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
    ExponentialRamp { time: f64, value: f32 },
    SetTarget { time: f64, target: f32, time_constant: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. }
            | Automation::LinearRamp { time, .. }
            | Automation::ExponentialRamp { time, .. }
            | Automation::SetTarget { time, .. } => time,
        }
    }

    fn end_value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
            Automation::SetTarget { target, .. } => target,
        }
    }
}

/// An exponential approach that has started and runs until the next event.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveTarget {
    start_time: f64,
    start_value: f32,
    target: f32,
    time_constant: f64,
}

impl ActiveTarget {
    fn value_at(&self, time: f64) -> f32 {
        let elapsed = (time - self.start_time).max(0.0);
        let decay = (-elapsed / self.time_constant).exp() as f32;
        self.target + (self.start_value - self.target) * decay
    }
}

/// A node parameter with sample-accurate automation.
#[derive(Clone, Debug)]
pub struct AudioParam {
    default: f32,
    value: f32,
    anchor_time: f64,
    anchor_value: f32,
    active_target: Option<ActiveTarget>,
    events: VecDeque<Automation>,
    /// Nodes whose output is added to this param at audio rate.
    pub(crate) modulators: Vec<NodeId>,
}

impl AudioParam {
    /// Create a param resting at `default`.
    pub fn new(default: f32) -> Self {
        Self {
            default,
            value: default,
            anchor_time: 0.0,
            anchor_value: default,
            active_target: None,
            events: VecDeque::new(),
            modulators: Vec::new(),
        }
    }

    /// The value the param was created with.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// The most recently rendered automation value (modulators excluded).
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The value the param will settle at once all scheduled events have run.
    pub fn target(&self) -> f32 {
        self.events
            .back()
            .map(Automation::end_value)
            .or_else(|| self.active_target.map(|t| t.target))
            .unwrap_or(self.anchor_value)
    }

    /// Number of automation events still pending.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Whether any node drives this param at audio rate.
    pub fn is_modulated(&self) -> bool {
        !self.modulators.is_empty()
    }

    /// Jump to `value` immediately, discarding all scheduled automation.
    pub fn set_value(&mut self, value: f32) {
        self.events.clear();
        self.active_target = None;
        self.value = value;
        self.anchor_value = value;
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> Result<()> {
        check_finite(value, time)?;
        self.insert(Automation::SetValue { time, value });
        Ok(())
    }

    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> Result<()> {
        check_finite(value, time)?;
        self.insert(Automation::LinearRamp { time, value });
        Ok(())
    }

    /// Ramp exponentially from the previous event to `value`, arriving at `time`.
    ///
    /// Exponential curves cannot cross or reach zero, so `value` must be non-zero.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> Result<()> {
        check_finite(value, time)?;
        if value == 0.0 {
            return Err(SynthError::InvalidValue(
                "exponential ramp target must be non-zero".to_string(),
            ));
        }
        self.insert(Automation::ExponentialRamp { time, value });
        Ok(())
    }

    /// Approach `target` exponentially starting at `time`.
    pub fn set_target_at_time(&mut self, target: f32, time: f64, time_constant: f64) -> Result<()> {
        check_finite(target, time)?;
        if !(time_constant > 0.0) {
            return Err(SynthError::InvalidValue(format!(
                "time constant must be positive, got {}",
                time_constant
            )));
        }
        self.insert(Automation::SetTarget {
            time,
            target,
            time_constant,
        });
        Ok(())
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    fn insert(&mut self, event: Automation) {
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
    }

    /// Evaluate the automation at `time`, consuming events that have finished.
    ///
    /// Calls must use non-decreasing times.
    pub(crate) fn next_value(&mut self, time: f64) -> f32 {
        while let Some(event) = self.events.front().copied() {
            if event.time() > time {
                break;
            }
            self.events.pop_front();
            match event {
                Automation::SetValue { time: at, value }
                | Automation::LinearRamp { time: at, value }
                | Automation::ExponentialRamp { time: at, value } => {
                    self.anchor_time = at;
                    self.anchor_value = value;
                    self.active_target = None;
                }
                Automation::SetTarget {
                    time: at,
                    target,
                    time_constant,
                } => {
                    let start_value = match self.active_target {
                        Some(active) => active.value_at(at),
                        None => self.anchor_value,
                    };
                    self.active_target = Some(ActiveTarget {
                        start_time: at,
                        start_value,
                        target,
                        time_constant,
                    });
                }
            }
        }

        let value = match self.events.front().copied() {
            Some(Automation::LinearRamp { time: end, value: to }) => {
                self.settle_target(time);
                let from = self.anchor_value;
                from + (to - from) * self.progress(time, end)
            }
            Some(Automation::ExponentialRamp { time: end, value: to }) => {
                self.settle_target(time);
                let from = self.anchor_value;
                if from == 0.0 || (from < 0.0) != (to < 0.0) {
                    from
                } else {
                    from * (to / from).powf(self.progress(time, end))
                }
            }
            _ => match self.active_target {
                Some(active) => active.value_at(time),
                None => self.anchor_value,
            },
        };
        self.value = value;
        value
    }

    /// End a running set-target curve so a following ramp starts from where it is now.
    fn settle_target(&mut self, time: f64) {
        if let Some(active) = self.active_target.take() {
            self.anchor_time = time;
            self.anchor_value = active.value_at(time);
        }
    }

    fn progress(&self, time: f64, end: f64) -> f32 {
        let span = end - self.anchor_time;
        if span <= 0.0 {
            return 1.0;
        }
        ((time - self.anchor_time) / span).clamp(0.0, 1.0) as f32
    }
}

fn check_finite(value: f32, time: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SynthError::InvalidValue(format!("non-finite value {}", value)));
    }
    if !time.is_finite() || time < 0.0 {
        return Err(SynthError::InvalidValue(format!("invalid time {}", time)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_param_holds_default() {
        let mut p = AudioParam::new(0.5);
        assert!(approx(p.next_value(0.0), 0.5));
        assert!(approx(p.next_value(10.0), 0.5));
        assert!(approx(p.target(), 0.5));
    }

    #[test]
    fn test_set_value_at_time_waits_for_its_time() {
        let mut p = AudioParam::new(0.0);
        p.set_value_at_time(1.0, 0.5).unwrap();
        assert!(approx(p.next_value(0.25), 0.0));
        assert!(approx(p.next_value(0.5), 1.0));
        assert_eq!(p.pending_events(), 0);
    }

    #[test]
    fn test_linear_ramp_from_previous_event() {
        let mut p = AudioParam::new(0.0);
        p.set_value_at_time(0.5, 1.0).unwrap();
        p.linear_ramp_to_value_at_time(0.8, 1.1).unwrap();
        assert!(approx(p.next_value(1.0), 0.5));
        assert!(approx(p.next_value(1.05), 0.65));
        assert!(approx(p.next_value(1.1), 0.8));
        assert!(approx(p.next_value(2.0), 0.8));
    }

    #[test]
    fn test_exponential_ramp_decays() {
        let mut p = AudioParam::new(0.0);
        p.set_value_at_time(1.0, 0.0).unwrap();
        p.exponential_ramp_to_value_at_time(0.001, 3.0).unwrap();
        p.next_value(0.0);
        let mid = p.next_value(1.5);
        assert!(approx(mid, (0.001f32).sqrt()));
        assert!(approx(p.next_value(3.0), 0.001));
    }

    #[test]
    fn test_exponential_ramp_rejects_zero() {
        let mut p = AudioParam::new(1.0);
        assert!(matches!(
            p.exponential_ramp_to_value_at_time(0.0, 1.0),
            Err(SynthError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_exponential_ramp_from_zero_holds() {
        let mut p = AudioParam::new(0.0);
        p.set_value_at_time(0.0, 0.0).unwrap();
        p.exponential_ramp_to_value_at_time(1.0, 1.0).unwrap();
        assert!(approx(p.next_value(0.5), 0.0));
        assert!(approx(p.next_value(1.0), 1.0));
    }

    #[test]
    fn test_set_target_approaches() {
        let mut p = AudioParam::new(1.0);
        p.set_target_at_time(0.0, 0.0, 0.5).unwrap();
        p.next_value(0.0);
        let v = p.next_value(0.5);
        assert!(approx(v, (-1.0f32).exp()));
        assert!(p.next_value(10.0) < 0.001);
    }

    #[test]
    fn test_cancel_scheduled_values() {
        let mut p = AudioParam::new(0.2);
        p.set_value_at_time(0.2, 0.0).unwrap();
        p.linear_ramp_to_value_at_time(1.0, 5.0).unwrap();
        p.next_value(0.0);
        p.cancel_scheduled_values(1.0);
        assert_eq!(p.pending_events(), 0);
        assert!(approx(p.next_value(2.0), 0.2));
    }

    #[test]
    fn test_ramp_after_set_target_starts_from_current_curve() {
        let mut p = AudioParam::new(1.0);
        p.set_target_at_time(0.0, 0.0, 1.0).unwrap();
        p.next_value(0.0);
        let at_one = p.next_value(1.0);
        p.linear_ramp_to_value_at_time(1.0, 2.0).unwrap();
        let start = p.next_value(1.0);
        assert!(approx(start, at_one));
        assert!(approx(p.next_value(2.0), 1.0));
    }

    #[test]
    fn test_target_reports_last_event() {
        let mut p = AudioParam::new(0.5);
        p.linear_ramp_to_value_at_time(0.8, 0.1).unwrap();
        assert!(approx(p.target(), 0.8));
        assert!(approx(p.value(), 0.5));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut p = AudioParam::new(0.0);
        assert!(p.set_value_at_time(f32::NAN, 0.0).is_err());
        assert!(p.set_value_at_time(1.0, -1.0).is_err());
        assert!(p.set_target_at_time(1.0, 0.0, 0.0).is_err());
    }
}
