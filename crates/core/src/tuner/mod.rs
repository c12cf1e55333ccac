//! Locating the frequency an instrument plays for a fingering.
//!
//! Every tuner shares the same search: a window around the target note, a
//! coarse logarithmic scan of the calculator's reactance for rising zero
//! crossings, and a choice of bracket. Strategies differ only in how they
//! refine that bracket.

mod bisection;
mod linear_v;
mod playing_range;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    DesignerError, Fingering, Instrument, InstrumentCalculator, Note, PhysicalParameters, Result,
    Tuning,
};

pub use bisection::BisectionTuner;
pub use linear_v::LinearVTuner;

/// Search and refinement limits shared by every tuner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Half-width of the search window around a target note.
    pub search_range_cents: f64,
    /// Spacing of the coarse scan.
    pub coarse_step_cents: f64,
    /// Refinement stops once the bracket is narrower than this.
    pub tolerance_cents: f64,
    pub max_iterations: usize,
    pub min_frequency: f64,
    pub max_frequency: f64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            search_range_cents: 700.0,
            coarse_step_cents: 25.0,
            tolerance_cents: 0.01,
            max_iterations: 60,
            min_frequency: 20.0,
            max_frequency: 20_000.0,
        }
    }
}

/// Predicts the sounding note of a fingering.
///
/// The calculator, instrument and physical parameters must be wired before
/// the first prediction; a missing piece is reported as
/// [`DesignerError::Configuration`].
pub trait InstrumentTuner: Send + fmt::Debug {
    fn set_calculator(&mut self, calculator: Arc<dyn InstrumentCalculator>);

    fn set_instrument(&mut self, instrument: Arc<Instrument>);

    fn set_physical_parameters(&mut self, params: Arc<PhysicalParameters>);

    fn set_tuning(&mut self, tuning: Tuning);

    fn tuning(&self) -> Option<&Tuning>;

    /// The note the instrument plays for `fingering`. The prediction keeps
    /// the target's name and carries the located resonance in both
    /// `frequency` and `frequency_min`.
    fn predicted_note(&self, fingering: &Fingering) -> Result<Note>;

    /// The wired tuning with every note replaced by its prediction.
    fn predicted_tuning(&self) -> Result<Tuning> {
        let tuning = self.tuning().ok_or(DesignerError::Configuration("tuning"))?;
        let fingerings = tuning
            .fingerings
            .iter()
            .map(|fingering| {
                let note = self.predicted_note(fingering)?;
                Ok(Fingering {
                    note: Some(note),
                    ..fingering.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Tuning {
            fingerings,
            ..tuning.clone()
        })
    }
}

/// Collaborators and limits every tuner carries.
#[derive(Debug, Clone, Default)]
struct TunerContext {
    calculator: Option<Arc<dyn InstrumentCalculator>>,
    instrument: Option<Arc<Instrument>>,
    params: Option<Arc<PhysicalParameters>>,
    tuning: Option<Tuning>,
    config: TunerConfig,
}

impl TunerContext {
    fn with_config(config: TunerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}
