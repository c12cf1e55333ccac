//! Scoring predicted tunings against their targets.
//!
//! An evaluator turns a list of fingerings into one error per fingering, in
//! cents, for an optimiser to minimise. Fingerings without a target score
//! exactly 0.0; a fingering whose note cannot be predicted fails the whole
//! evaluation.

use std::fmt;
use std::sync::Arc;

use crate::{
    cents, DesignerError, Fingering, InstrumentCalculator, InstrumentTuner, LinearVTuner, Note,
    Result, Tuning,
};

/// Produces an error vector for an ordered list of fingerings.
pub trait Evaluator: fmt::Debug {
    /// One signed deviation in cents per fingering, in input order.
    fn calculate_error_vector(&mut self, fingerings: &[Fingering]) -> Result<Vec<f64>>;
}

/// A tuner kept wired to one calculator's instrument and environment.
#[derive(Debug)]
struct WiredTuner {
    calculator: Arc<dyn InstrumentCalculator>,
    tuner: Box<dyn InstrumentTuner>,
}

impl WiredTuner {
    fn new(calculator: Arc<dyn InstrumentCalculator>, tuner: Box<dyn InstrumentTuner>) -> Self {
        let mut wired = Self { calculator, tuner };
        wired.wire();
        wired
    }

    fn wire(&mut self) {
        self.tuner.set_calculator(Arc::clone(&self.calculator));
        self.tuner.set_instrument(Arc::clone(self.calculator.instrument()));
        self.tuner
            .set_physical_parameters(Arc::clone(self.calculator.physical_parameters()));
    }

    fn replace(&mut self, tuner: Box<dyn InstrumentTuner>) {
        self.tuner = tuner;
        self.wire();
    }

    /// Scores every fingering on the frequency `metric` picks out of a note.
    fn errors(
        &mut self,
        fingerings: &[Fingering],
        metric: fn(&Note) -> Option<f64>,
    ) -> Result<Vec<f64>> {
        self.tuner.set_tuning(Tuning::from_fingerings(fingerings.to_vec()));

        fingerings
            .iter()
            .map(|fingering| {
                let Some(target) = fingering.note.as_ref().and_then(metric) else {
                    return Ok(0.0);
                };
                if !(target.is_finite() && target > 0.0) {
                    return Err(DesignerError::convergence(
                        fingering.label(),
                        format!("target frequency {target} is not a positive number"),
                    ));
                }
                let predicted = self.tuner.predicted_note(fingering)?;
                let frequency = metric(&predicted).ok_or_else(|| {
                    DesignerError::convergence(fingering.label(), "tuner returned no frequency")
                })?;
                let error = cents(target, frequency);
                tracing::debug!(
                    fingering = %fingering.label(),
                    target,
                    frequency,
                    error,
                    "scored fingering"
                );
                Ok(error)
            })
            .collect()
    }
}

/// Scores the lowest playable frequency (`frequency_min`) of each note.
#[derive(Debug)]
pub struct FminEvaluator {
    inner: WiredTuner,
}

impl FminEvaluator {
    /// Evaluator predicting with a [`LinearVTuner`].
    pub fn new(calculator: Arc<dyn InstrumentCalculator>) -> Self {
        Self::with_tuner(calculator, Box::new(LinearVTuner::new()))
    }

    pub fn with_tuner(
        calculator: Arc<dyn InstrumentCalculator>,
        tuner: Box<dyn InstrumentTuner>,
    ) -> Self {
        Self {
            inner: WiredTuner::new(calculator, tuner),
        }
    }

    /// Swaps the prediction strategy, wiring it to this evaluator's calculator.
    pub fn set_tuner(&mut self, tuner: Box<dyn InstrumentTuner>) {
        self.inner.replace(tuner);
    }

    pub fn tuner(&self) -> &dyn InstrumentTuner {
        self.inner.tuner.as_ref()
    }
}

impl Evaluator for FminEvaluator {
    fn calculate_error_vector(&mut self, fingerings: &[Fingering]) -> Result<Vec<f64>> {
        self.inner.errors(fingerings, |note| note.frequency_min)
    }
}

/// Scores the nominal `frequency` of each note.
#[derive(Debug)]
pub struct CentDeviationEvaluator {
    inner: WiredTuner,
}

impl CentDeviationEvaluator {
    pub fn new(calculator: Arc<dyn InstrumentCalculator>) -> Self {
        Self::with_tuner(calculator, Box::new(LinearVTuner::new()))
    }

    pub fn with_tuner(
        calculator: Arc<dyn InstrumentCalculator>,
        tuner: Box<dyn InstrumentTuner>,
    ) -> Self {
        Self {
            inner: WiredTuner::new(calculator, tuner),
        }
    }

    pub fn set_tuner(&mut self, tuner: Box<dyn InstrumentTuner>) {
        self.inner.replace(tuner);
    }

    pub fn tuner(&self) -> &dyn InstrumentTuner {
        self.inner.tuner.as_ref()
    }
}

impl Evaluator for CentDeviationEvaluator {
    fn calculate_error_vector(&mut self, fingerings: &[Fingering]) -> Result<Vec<f64>> {
        self.inner.errors(fingerings, |note| note.frequency)
    }
}

/// Sum of squared errors weighted by each fingering's optimisation weight.
/// Extra entries on either side are ignored.
pub fn weighted_error_norm(fingerings: &[Fingering], errors: &[f64]) -> f64 {
    fingerings
        .iter()
        .zip(errors)
        .map(|(fingering, error)| f64::from(fingering.weight()) * error * error)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, BisectionTuner, PhysicalParameters, TransmissionLineCalculator};

    fn calculator() -> Arc<dyn InstrumentCalculator> {
        Arc::new(
            TransmissionLineCalculator::new(
                Arc::new(fixtures::whistle()),
                Arc::new(PhysicalParameters::default()),
            )
            .unwrap(),
        )
    }

    fn predictions(fingerings: &[Fingering]) -> Vec<f64> {
        let mut tuner = LinearVTuner::new();
        let calculator = calculator();
        tuner.set_calculator(Arc::clone(&calculator));
        tuner.set_instrument(Arc::clone(calculator.instrument()));
        tuner.set_physical_parameters(Arc::clone(calculator.physical_parameters()));
        fingerings
            .iter()
            .map(|fingering| tuner.predicted_note(fingering).unwrap().frequency.unwrap())
            .collect()
    }

    #[test]
    fn fingerings_without_targets_score_zero() {
        let mut evaluator = FminEvaluator::new(calculator());
        let fingerings: Vec<Fingering> = fixtures::whistle_fingerings()
            .into_iter()
            .map(Fingering::new)
            .collect();
        let errors = evaluator.calculate_error_vector(&fingerings).unwrap();
        assert_eq!(errors, vec![0.0; fingerings.len()]);

        // A nominal frequency alone is not a minimum-frequency target.
        let nominal = vec![Fingering::new(vec![false; 6]).with_note(Note::new("B4", 500.0))];
        assert_eq!(evaluator.calculate_error_vector(&nominal).unwrap(), vec![0.0]);
    }

    #[test]
    fn error_vector_follows_input_order() {
        let mut evaluator = FminEvaluator::new(calculator());
        let fingerings = fixtures::whistle_tuning().fingerings;
        let forward = evaluator.calculate_error_vector(&fingerings).unwrap();
        assert_eq!(forward.len(), fingerings.len());

        let mut reversed_input = fingerings.clone();
        reversed_input.reverse();
        let mut backward = evaluator.calculate_error_vector(&reversed_input).unwrap();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn matching_target_scores_zero() {
        let mut fingerings = fixtures::whistle_tuning().fingerings;
        let predicted = predictions(&fingerings);
        for (fingering, frequency) in fingerings.iter_mut().zip(&predicted) {
            fingering.note = Some(Note::with_min("exact", *frequency));
        }
        let mut evaluator = FminEvaluator::new(calculator());
        for error in evaluator.calculate_error_vector(&fingerings).unwrap() {
            assert!(error.abs() < 0.05, "{error}");
        }
    }

    #[test]
    fn flat_target_scores_positive_cents() {
        let closed = Fingering::new(vec![false; 6]);
        let predicted = predictions(&[closed.clone()])[0];
        let semitone_below = predicted / 2f64.powf(1.0 / 12.0);
        let fingering = closed.with_note(Note::with_min("flat", semitone_below));

        let mut evaluator = FminEvaluator::new(calculator());
        let errors = evaluator.calculate_error_vector(&[fingering]).unwrap();
        assert!((errors[0] - 100.0).abs() < 0.05, "{}", errors[0]);
    }

    #[test]
    fn convergence_failure_is_not_masked() {
        let mut fingerings = fixtures::whistle_tuning().fingerings;
        fingerings[3].note = Some(Note::with_min("unreachable", 1.0));
        let mut evaluator = FminEvaluator::new(calculator());
        let error = evaluator.calculate_error_vector(&fingerings).unwrap_err();
        match error {
            DesignerError::ConvergenceFailure { fingering, .. } => {
                assert_eq!(fingering, "unreachable")
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unstable_calculator_fails_the_evaluation() {
        let mut evaluator = FminEvaluator::new(Arc::new(fixtures::UnstableCalculator::new(600.0)));
        let fingerings = vec![
            Fingering::new(vec![false; 6]),
            Fingering::new(vec![false; 6]).with_note(Note::with_min("B4", 500.0)),
        ];
        match evaluator.calculate_error_vector(&fingerings) {
            Err(DesignerError::ConvergenceFailure { fingering, .. }) => assert_eq!(fingering, "B4"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let mut evaluator = FminEvaluator::new(calculator());
        let fingerings = fixtures::whistle_tuning().fingerings;
        let first = evaluator.calculate_error_vector(&fingerings).unwrap();
        let second = evaluator.calculate_error_vector(&fingerings).unwrap();
        assert_eq!(first, second);
        assert_eq!(evaluator.tuner().tuning().unwrap().fingerings, fingerings);
    }

    #[test]
    fn tuner_can_be_swapped() {
        let fingerings = fixtures::whistle_tuning().fingerings;
        let mut evaluator = FminEvaluator::new(calculator());
        let linear_v = evaluator.calculate_error_vector(&fingerings).unwrap();
        evaluator.set_tuner(Box::new(BisectionTuner::new()));
        let bisection = evaluator.calculate_error_vector(&fingerings).unwrap();
        for (a, b) in linear_v.iter().zip(&bisection) {
            assert!((a - b).abs() < 0.1, "{a} vs {b}");
        }
    }

    #[test]
    fn nominal_evaluator_scores_frequency_field() {
        let closed = Fingering::new(vec![false; 6]);
        let predicted = predictions(&[closed.clone()])[0];
        let fingerings = vec![
            closed.clone().with_note(Note::new("nominal", predicted)),
            closed.with_note(Note::with_min("minimum only", predicted)),
        ];
        let mut evaluator = CentDeviationEvaluator::new(calculator());
        let errors = evaluator.calculate_error_vector(&fingerings).unwrap();
        assert!(errors[0].abs() < 0.05);
        assert_eq!(errors[1], 0.0);
    }

    #[test]
    fn weighted_norm_uses_optimisation_weights() {
        let mut heavy = Fingering::new(Vec::new());
        heavy.optimization_weight = Some(3);
        let fingerings = vec![Fingering::new(Vec::new()), heavy];
        assert_eq!(weighted_error_norm(&fingerings, &[2.0, -1.0]), 4.0 + 3.0);
        assert_eq!(weighted_error_norm(&fingerings, &[]), 0.0);
    }
}
