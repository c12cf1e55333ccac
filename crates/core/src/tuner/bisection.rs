use std::sync::Arc;

use crate::{
    cents, Fingering, Instrument, InstrumentCalculator, Note, PhysicalParameters, Result, Tuning,
};

use super::playing_range::{predict, Bracket, PlayingRange};
use super::{InstrumentTuner, TunerConfig, TunerContext};

/// Refines a resonance by halving the bracket in log frequency. Slower than
/// [`super::LinearVTuner`] but indifferent to the shape of the reactance curve.
#[derive(Debug, Clone, Default)]
pub struct BisectionTuner {
    context: TunerContext,
}

impl BisectionTuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TunerConfig) -> Self {
        Self {
            context: TunerContext::with_config(config),
        }
    }
}

fn refine(range: &PlayingRange<'_>, bracket: Bracket) -> Result<f64> {
    let (mut low, mut high) = (bracket.low, bracket.high);
    let config = range.config();

    for iteration in 0..config.max_iterations {
        let middle = (low * high).sqrt();
        if cents(low, high) < config.tolerance_cents {
            return Ok(middle);
        }
        let value = range.reactance(middle)?;
        tracing::trace!(iteration, frequency = middle, reactance = value, "bisection step");
        if value < 0.0 {
            low = middle;
        } else {
            high = middle;
        }
    }

    Err(range.failure(format!(
        "bisection did not converge in {} iterations",
        config.max_iterations
    )))
}

impl InstrumentTuner for BisectionTuner {
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
