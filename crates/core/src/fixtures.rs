//! Instruments and tunings shared by the unit tests.

use std::sync::Arc;

use num_complex::Complex64;

use crate::{
    BorePoint, DesignerError, Fingering, Hole, Instrument, InstrumentCalculator, LengthType,
    Mouthpiece, MouthpieceKind, Note, PhysicalParameters, PlayingCondition, ReedType, Result,
    Termination, Tuning,
};

/// Reed-blown cylinder in metres: closed at the mouthpiece, open at the far end.
pub fn cylinder(length: f64, diameter: f64) -> Instrument {
    Instrument {
        name: "Cylinder".to_string(),
        description: None,
        length_type: LengthType::M,
        mouthpiece: Mouthpiece {
            position: 0.0,
            kind: MouthpieceKind::Reed(ReedType::Single),
        },
        bore_points: vec![BorePoint::new(0.0, diameter), BorePoint::new(length, diameter)],
        holes: Vec::new(),
        termination: Termination::default(),
    }
}

/// Six-hole fipple whistle in millimetres, 300 mm long with a 16 mm bore.
pub fn whistle() -> Instrument {
    let holes = [140.0, 160.0, 180.0, 200.0, 220.0, 240.0]
        .iter()
        .enumerate()
        .map(|(i, &position)| Hole::new(position, 7.0, 4.0).named(format!("Hole {}", i + 1)))
        .collect();

    Instrument {
        name: "Six hole whistle".to_string(),
        description: Some("Cylindrical test whistle".to_string()),
        length_type: LengthType::Mm,
        mouthpiece: Mouthpiece {
            position: 0.0,
            kind: MouthpieceKind::Fipple {
                window_length: 5.0,
                window_width: 12.0,
                window_height: Some(4.0),
                windway_height: None,
                fipple_factor: None,
            },
        },
        bore_points: vec![BorePoint::new(0.0, 16.0), BorePoint::new(300.0, 16.0)],
        holes,
        termination: Termination::default(),
    }
}

/// Closed-to-open hole patterns for the whistle, lowest note first.
pub fn whistle_fingerings() -> Vec<Vec<bool>> {
    (0..=6)
        .map(|open| (0..6).map(|hole| hole >= 6 - open).collect())
        .collect()
}

/// A scale for [`whistle`], its targets within a semitone of the model.
pub fn whistle_tuning() -> Tuning {
    let notes = [
        ("B4", 493.88),
        ("C#5", 554.37),
        ("D5", 587.33),
        ("E5", 659.26),
        ("F#5", 739.99),
        ("G5", 783.99),
        ("A5", 880.0),
    ];
    let fingerings = whistle_fingerings()
        .into_iter()
        .zip(notes)
        .map(|(holes, (name, frequency))| {
            Fingering::new(holes).with_note(Note::with_min(name, frequency))
        })
        .collect();
    Tuning::new("Whistle scale", 6, fingerings)
}

/// Calculator for the whistle whose reactance rises without crossing zero
/// and becomes numerically unstable above `limit` Hz.
#[derive(Debug)]
pub struct UnstableCalculator {
    instrument: Arc<Instrument>,
    params: Arc<PhysicalParameters>,
    limit: f64,
}

impl UnstableCalculator {
    pub fn new(limit: f64) -> Self {
        Self {
            instrument: Arc::new(whistle()),
            params: Arc::new(PhysicalParameters::default()),
            limit,
        }
    }
}

impl InstrumentCalculator for UnstableCalculator {
    fn instrument(&self) -> &Arc<Instrument> {
        &self.instrument
    }

    fn physical_parameters(&self) -> &Arc<PhysicalParameters> {
        &self.params
    }

    fn playing_condition(&self) -> PlayingCondition {
        PlayingCondition::ImpedanceMinimum
    }

    fn characteristic_impedance(&self) -> f64 {
        1.0
    }

    fn calc_z(&self, frequency: f64, _fingering: &Fingering) -> Result<Complex64> {
        if frequency > self.limit {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "state vector is not finite",
            });
        }
        Ok(Complex64::new(1.0, frequency - 2.0 * self.limit))
    }
}
