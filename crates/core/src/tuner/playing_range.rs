use std::sync::Arc;

use crate::{cents, DesignerError, Fingering, InstrumentCalculator, Note, Result};

use super::{TunerConfig, TunerContext};

/// Frequencies either side of a rising reactance zero crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Bracket {
    pub low: f64,
    pub high: f64,
    /// Reactance at `low`, always negative.
    pub low_value: f64,
    /// Reactance at `high`, never negative.
    pub high_value: f64,
}

impl Bracket {
    pub fn width_cents(&self) -> f64 {
        cents(self.low, self.high)
    }
}

fn same<T: PartialEq>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

/// One fingering's resonance search: the window to scan and the reactance
/// to scan it with.
pub(super) struct PlayingRange<'a> {
    calculator: &'a dyn InstrumentCalculator,
    fingering: &'a Fingering,
    config: &'a TunerConfig,
    target: Option<f64>,
    low: f64,
    high: f64,
}

impl<'a> PlayingRange<'a> {
    fn new(context: &'a TunerContext, fingering: &'a Fingering) -> Result<Self> {
        let calculator = context
            .calculator
            .as_deref()
            .ok_or(DesignerError::Configuration("calculator"))?;
        let instrument = context
            .instrument
            .as_ref()
            .ok_or(DesignerError::Configuration("instrument"))?;
        let params = context
            .params
            .as_ref()
            .ok_or(DesignerError::Configuration("physical parameters"))?;
        // The window is sized from the wired instrument and air, so they must
        // be the ones the calculator models.
        if !same(calculator.instrument(), instrument) {
            return Err(DesignerError::Configuration("instrument"));
        }
        if !same(calculator.physical_parameters(), params) {
            return Err(DesignerError::Configuration("physical parameters"));
        }
        instrument.check_fingering(fingering)?;

        let config = &context.config;
        let target = fingering.note.as_ref().and_then(Note::target_frequency);
        let (low, high) = match target {
            Some(target) if target.is_finite() && target > 0.0 => {
                let half_width = 2f64.powf(config.search_range_cents / 1200.0);
                (target / half_width, target * half_width)
            }
            Some(target) => {
                return Err(DesignerError::convergence(
                    fingering.label(),
                    format!("target frequency {target} is not a positive number"),
                ))
            }
            None => {
                // Quarter-wave estimate of the lowest resonance.
                let length = instrument.bore_length() * instrument.length_type.metres_per_unit();
                let fundamental = params.speed_of_sound() / (4.0 * length);
                (fundamental / 2.0, fundamental * 16.0)
            }
        };

        let low = low.max(config.min_frequency);
        let high = high.min(config.max_frequency);
        if !(low < high) {
            return Err(DesignerError::convergence(
                fingering.label(),
                format!(
                    "search window lies outside {} to {} Hz",
                    config.min_frequency, config.max_frequency
                ),
            ));
        }

        Ok(Self {
            calculator,
            fingering,
            config,
            target,
            low,
            high,
        })
    }

    pub fn config(&self) -> &TunerConfig {
        self.config
    }

    pub fn failure(&self, reason: impl Into<String>) -> DesignerError {
        DesignerError::convergence(self.fingering.label(), reason)
    }

    /// Reactance at `frequency`. A numerically unstable point means no
    /// reliable resonance can be reported for this fingering.
    pub fn reactance(&self, frequency: f64) -> Result<f64> {
        match self.calculator.calc_reactance(frequency, self.fingering) {
            Err(DesignerError::NumericInstability { frequency, detail }) => {
                Err(self.failure(format!("{detail} at {frequency} Hz")))
            }
            other => other,
        }
    }

    /// Coarse logarithmic scan of the window for rising zero crossings.
    fn scan(&self) -> Result<Vec<Bracket>> {
        let ratio = 2f64.powf(self.config.coarse_step_cents / 1200.0);
        if !(ratio > 1.0 && ratio.is_finite()) {
            return Err(self.failure("coarse scan step must be positive"));
        }

        let mut brackets = Vec::new();
        let mut frequency = self.low;
        let mut value = self.reactance(frequency)?;
        while frequency < self.high {
            let next = (frequency * ratio).min(self.high);
            let next_value = self.reactance(next)?;
            if value < 0.0 && next_value >= 0.0 {
                brackets.push(Bracket {
                    low: frequency,
                    high: next,
                    low_value: value,
                    high_value: next_value,
                });
            }
            frequency = next;
            value = next_value;
        }
        Ok(brackets)
    }

    /// The bracket closest to the target, or the lowest without one.
    fn select(&self, brackets: &[Bracket]) -> Option<Bracket> {
        match self.target {
            Some(target) => brackets.iter().copied().min_by(|a, b| {
                let distance = |bracket: &Bracket| {
                    cents(target, (bracket.low * bracket.high).sqrt()).abs()
                };
                distance(a).total_cmp(&distance(b))
            }),
            None => brackets.first().copied(),
        }
    }
}

/// Runs the shared search for `fingering` and hands the chosen bracket to
/// `refine`.
pub(super) fn predict<F>(context: &TunerContext, fingering: &Fingering, refine: F) -> Result<Note>
where
    F: FnOnce(&PlayingRange<'_>, Bracket) -> Result<f64>,
{
    let range = PlayingRange::new(context, fingering)?;
    let brackets = range.scan()?;
    tracing::debug!(
        fingering = %fingering.label(),
        low = range.low,
        high = range.high,
        brackets = brackets.len(),
        "scanned playing range"
    );

    let Some(bracket) = range.select(&brackets) else {
        tracing::warn!(fingering = %fingering.label(), "no resonance in search window");
        return Err(range.failure(format!(
            "no resonance between {:.2} and {:.2} Hz",
            range.low, range.high
        )));
    };

    let frequency = refine(&range, bracket)?;
    tracing::debug!(fingering = %fingering.label(), frequency, "predicted note");

    let name = fingering.note.as_ref().and_then(|note| note.name.clone());
    Ok(Note {
        name,
        frequency: Some(frequency),
        frequency_min: Some(frequency),
        frequency_max: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{fixtures, PhysicalParameters, TransmissionLineCalculator};

    fn context() -> TunerContext {
        let instrument = Arc::new(fixtures::whistle());
        let params = Arc::new(PhysicalParameters::default());
        let calculator =
            TransmissionLineCalculator::new(Arc::clone(&instrument), Arc::clone(&params)).unwrap();
        TunerContext {
            calculator: Some(Arc::new(calculator)),
            instrument: Some(instrument),
            params: Some(params),
            ..TunerContext::default()
        }
    }

    #[test]
    fn window_is_centred_on_the_target() {
        let context = context();
        let fingering = Fingering::new(vec![false; 6]).with_note(Note::new("A4", 440.0));
        let range = PlayingRange::new(&context, &fingering).unwrap();
        assert!((cents(range.low, 440.0) - 700.0).abs() < 1e-9);
        assert!((cents(440.0, range.high) - 700.0).abs() < 1e-9);
    }

    #[test]
    fn window_is_clamped_to_the_playing_range() {
        let context = context();
        let fingering = Fingering::new(vec![false; 6]).with_note(Note::new("high", 19_000.0));
        let range = PlayingRange::new(&context, &fingering).unwrap();
        assert_eq!(range.high, 20_000.0);
    }

    #[test]
    fn scan_ignores_falling_crossings() {
        let context = context();
        let fingering = Fingering::new(vec![false; 6]);
        let range = PlayingRange::new(&context, &fingering).unwrap();
        let brackets = range.scan().unwrap();
        assert!(brackets.len() > 1);
        for bracket in &brackets {
            assert!(bracket.low_value < 0.0 && bracket.high_value >= 0.0);
            assert!(bracket.width_cents() <= 25.0 + 1e-9);
        }
        // Without a target the lowest resonance wins.
        assert_eq!(range.select(&brackets), brackets.first().copied());
    }

    #[test]
    fn target_selects_the_nearest_bracket() {
        let context = context();
        // Second register of the closed fingering sits near 1000 Hz.
        let fingering = Fingering::new(vec![false; 6]).with_note(Note::new("B5", 990.0));
        let range = PlayingRange::new(&context, &fingering).unwrap();
        let brackets = range.scan().unwrap();
        let chosen = range.select(&brackets).unwrap();
        assert!(chosen.low > 900.0 && chosen.high < 1100.0, "{chosen:?}");
    }
}
