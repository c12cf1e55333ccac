use std::sync::Arc;

use crate::{
    cents, Fingering, Instrument, InstrumentCalculator, Note, PhysicalParameters, Result, Tuning,
};

use super::playing_range::{predict, Bracket, PlayingRange};
use super::{InstrumentTuner, TunerConfig, TunerContext};

/// Refines a resonance by linear interpolation of the reactance between the
/// bracket ends (regula falsi), halving the value held at a stale end
/// (the Illinois variant) so both ends keep moving.
#[derive(Debug, Clone, Default)]
pub struct LinearVTuner {
    context: TunerContext,
}

impl LinearVTuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TunerConfig) -> Self {
        Self {
            context: TunerContext::with_config(config),
        }
    }
}

fn interpolate(low: f64, low_value: f64, high: f64, high_value: f64) -> f64 {
    (low * high_value - high * low_value) / (high_value - low_value)
}

fn refine(range: &PlayingRange<'_>, bracket: Bracket) -> Result<f64> {
    let Bracket {
        mut low,
        mut high,
        mut low_value,
        mut high_value,
    } = bracket;
    let config = range.config();
    // -1 when the last step moved `low`, +1 when it moved `high`.
    let mut last_side = 0;

    for iteration in 0..config.max_iterations {
        let estimate = interpolate(low, low_value, high, high_value);
        if cents(low, high) < config.tolerance_cents {
            return Ok(estimate);
        }
        let value = range.reactance(estimate)?;
        tracing::trace!(iteration, frequency = estimate, reactance = value, "linear-v step");
        if value == 0.0 {
            return Ok(estimate);
        }
        if value < 0.0 {
            low = estimate;
            low_value = value;
            if last_side == -1 {
                high_value *= 0.5;
            }
            last_side = -1;
        } else {
            high = estimate;
            high_value = value;
            if last_side == 1 {
                low_value *= 0.5;
            }
            last_side = 1;
        }
    }

    Err(range.failure(format!(
        "linear interpolation did not converge in {} iterations",
        config.max_iterations
    )))
}

impl InstrumentTuner for LinearVTuner {
    fn set_calculator(&mut self, calculator: Arc<dyn InstrumentCalculator>) {
        self.context.calculator = Some(calculator);
    }

    fn set_instrument(&mut self, instrument: Arc<Instrument>) {
        self.context.instrument = Some(instrument);
    }

    fn set_physical_parameters(&mut self, params: Arc<PhysicalParameters>) {
        self.context.params = Some(params);
    }

    fn set_tuning(&mut self, tuning: Tuning) {
        self.context.tuning = Some(tuning);
    }

    fn tuning(&self) -> Option<&Tuning> {
        self.context.tuning.as_ref()
    }

    fn predicted_note(&self, fingering: &Fingering) -> Result<Note> {
        predict(&self.context, fingering, refine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_finds_the_root_of_a_line() {
        // Line through (100, -1) and (200, 3) crosses zero at 125.
        assert!((interpolate(100.0, -1.0, 200.0, 3.0) - 125.0).abs() < 1e-12);
        assert_eq!(interpolate(100.0, -1.0, 200.0, 0.0), 200.0);
    }
}
