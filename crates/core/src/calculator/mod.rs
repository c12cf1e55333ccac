//! Input impedance of an instrument under one fingering.
//!
//! [`TransmissionLineCalculator`] flattens the bore into conical sections and
//! tone holes once, then for every trial frequency walks the transfer
//! matrices from the far end up to the mouthpiece.

mod models;
mod transfer_matrix;

use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;

use crate::geometry::{build_components, Component};
use crate::{DesignerError, Fingering, Instrument, MouthpieceKind, PhysicalParameters, Result};

pub use transfer_matrix::{StateVector, TransferMatrix};

/// Which extremum of the input impedance the instrument sounds at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayingCondition {
    /// Flutes and whistles: open at the mouthpiece.
    ImpedanceMinimum,
    /// Reed instruments: closed at the mouthpiece.
    ImpedanceMaximum,
}

impl PlayingCondition {
    pub fn for_mouthpiece(kind: &MouthpieceKind) -> Self {
        if kind.is_pressure_node() {
            PlayingCondition::ImpedanceMinimum
        } else {
            PlayingCondition::ImpedanceMaximum
        }
    }
}

/// Acoustic response of one instrument in one environment.
///
/// Implementations are pure: the same frequency and fingering always give the
/// same result, and calls may run concurrently.
pub trait InstrumentCalculator: Send + Sync + fmt::Debug {
    fn instrument(&self) -> &Arc<Instrument>;

    fn physical_parameters(&self) -> &Arc<PhysicalParameters>;

    fn playing_condition(&self) -> PlayingCondition;

    /// Characteristic impedance of the bore at the mouthpiece, used to
    /// normalise impedances.
    fn characteristic_impedance(&self) -> f64;

    /// Complex input impedance seen from the mouthpiece, in Pa·s/m³.
    fn calc_z(&self, frequency: f64, fingering: &Fingering) -> Result<Complex64>;

    /// Normalised reactance whose rising zero crossing marks a playable
    /// resonance: `Im(Z)/Z0` at an impedance minimum, `Im(1/Z)·Z0` at an
    /// impedance maximum.
    fn calc_reactance(&self, frequency: f64, fingering: &Fingering) -> Result<f64> {
        let z = self.calc_z(frequency, fingering)?;
        let z0 = self.characteristic_impedance();
        let value = match self.playing_condition() {
            PlayingCondition::ImpedanceMinimum => z.im / z0,
            PlayingCondition::ImpedanceMaximum => z.inv().im * z0,
        };
        if !value.is_finite() {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "normalised reactance is not finite",
            });
        }
        Ok(value)
    }

    /// Pressure reflection coefficient `(Z - Z0) / (Z + Z0)` at the mouthpiece.
    fn calc_reflection_coefficient(
        &self,
        frequency: f64,
        fingering: &Fingering,
    ) -> Result<Complex64> {
        let z = self.calc_z(frequency, fingering)?;
        let z0 = self.characteristic_impedance();
        let reflection = (z - z0) / (z + z0);
        if !reflection.is_finite() {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "reflection coefficient is not finite",
            });
        }
        Ok(reflection)
    }
}

/// Transfer-matrix model of bore, tone holes, mouthpiece and radiating end.
#[derive(Debug, Clone)]
pub struct TransmissionLineCalculator {
    instrument: Arc<Instrument>,
    params: Arc<PhysicalParameters>,
    components: Vec<Component>,
    mouthpiece: MouthpieceKind,
    mouthpiece_radius: f64,
    termination_radius: f64,
    flange_diameter: f64,
}

impl TransmissionLineCalculator {
    /// Validates the geometry and prepares it for repeated evaluation.
    pub fn new(instrument: Arc<Instrument>, params: Arc<PhysicalParameters>) -> Result<Self> {
        let metric = instrument.to_metres();
        let components = build_components(&metric)?;

        let (_, end) = metric.bore_extent();
        let radius_at = |position: f64| {
            metric
                .diameter_at(position)
                .map(|diameter| diameter / 2.0)
                .ok_or_else(|| {
                    DesignerError::geometry(format!("position {position} lies outside the bore"))
                })
        };
        let mouthpiece_radius = radius_at(metric.mouthpiece.position)?;
        let termination_radius = radius_at(end)?;

        tracing::debug!(
            instrument = %instrument.name,
            components = components.len(),
            "prepared transmission line"
        );

        Ok(Self {
            mouthpiece: metric.mouthpiece.kind.clone(),
            flange_diameter: metric.termination.flange_diameter,
            instrument,
            params,
            components,
            mouthpiece_radius,
            termination_radius,
        })
    }
}

impl InstrumentCalculator for TransmissionLineCalculator {
    fn instrument(&self) -> &Arc<Instrument> {
        &self.instrument
    }

    fn physical_parameters(&self) -> &Arc<PhysicalParameters> {
        &self.params
    }

    fn playing_condition(&self) -> PlayingCondition {
        PlayingCondition::for_mouthpiece(&self.mouthpiece)
    }

    fn characteristic_impedance(&self) -> f64 {
        self.params.wave_impedance(self.mouthpiece_radius)
    }

    fn calc_z(&self, frequency: f64, fingering: &Fingering) -> Result<Complex64> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "trial frequency must be positive and finite",
            });
        }
        self.instrument.check_fingering(fingering)?;

        let params = self.params.as_ref();
        let mut state = if fingering.is_open_end() {
            StateVector::with_load(models::radiation_impedance(
                params,
                frequency,
                self.termination_radius,
                self.flange_diameter,
            ))
        } else {
            StateVector::closed_end()
        };

        for component in self.components.iter().rev() {
            let matrix = match component {
                Component::Bore(section) => models::bore_section(params, frequency, section),
                Component::Hole { index, geometry } => {
                    models::tone_hole(params, frequency, geometry, fingering.open_holes[*index])?
                }
            };
            state = matrix.apply(state);
        }

        if !state.is_finite() {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "state vector is not finite",
            });
        }
        if !(state.flow.norm() > f64::MIN_POSITIVE) {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "volume flow at the mouthpiece vanished",
            });
        }

        let z = state.impedance()
            + models::mouthpiece_impedance(params, frequency, &self.mouthpiece);
        if !z.is_finite() {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "input impedance is not finite",
            });
        }
        Ok(z)
    }
}
