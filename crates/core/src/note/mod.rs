//! Notes, fingerings and tunings: what an instrument is asked to play.

use serde::{Deserialize, Serialize};

use crate::{DesignerError, Instrument, Result};

/// Signed interval from `f1` to `f2` in cents (100 cents per semitone).
///
/// Positive when `f2` is above `f1`; `cents(f, 2.0 * f)` is exactly 1200.
pub fn cents(f1: f64, f2: f64) -> f64 {
    1200.0 * (f2 / f1).log2()
}

/// A target or predicted note. Every frequency is in Hz and may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_max: Option<f64>,
}

impl Note {
    /// A named note with a nominal frequency.
    pub fn new(name: impl Into<String>, frequency: f64) -> Self {
        Self {
            name: Some(name.into()),
            frequency: Some(frequency),
            ..Default::default()
        }
    }

    /// A named note whose lowest playable frequency is the target.
    pub fn with_min(name: impl Into<String>, frequency_min: f64) -> Self {
        Self {
            name: Some(name.into()),
            frequency_min: Some(frequency_min),
            ..Default::default()
        }
    }

    /// The frequency a search should centre on: nominal first, then the
    /// minimum, then the maximum.
    pub fn target_frequency(&self) -> Option<f64> {
        self.frequency.or(self.frequency_min).or(self.frequency_max)
    }
}

/// One pattern of open and closed tone holes, optionally paired with the note
/// it should produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    /// One entry per hole, in increasing hole-position order; `true` is open.
    pub open_holes: Vec<bool>,
    /// `Some(false)` closes the far end of the bore. Absent means open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_end: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_weight: Option<u32>,
}

impl Fingering {
    pub fn new(open_holes: Vec<bool>) -> Self {
        Self {
            open_holes,
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.note = Some(note);
        self
    }

    pub fn is_open_end(&self) -> bool {
        self.open_end.unwrap_or(true)
    }

    pub fn weight(&self) -> u32 {
        self.optimization_weight.unwrap_or(1)
    }

    /// Human readable identification: the note name, or the hole pattern
    /// written with `X` for closed and `O` for open holes.
    pub fn label(&self) -> String {
        match self.note.as_ref().and_then(|note| note.name.as_deref()) {
            Some(name) => name.to_string(),
            None => {
                let pattern: String = self
                    .open_holes
                    .iter()
                    .map(|&open| if open { 'O' } else { 'X' })
                    .collect();
                if pattern.is_empty() {
                    "(no holes)".to_string()
                } else {
                    pattern
                }
            }
        }
    }
}

/// An ordered scale of fingerings for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tuning {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub number_of_holes: usize,
    pub fingerings: Vec<Fingering>,
}

impl Tuning {
    pub fn new(name: impl Into<String>, number_of_holes: usize, fingerings: Vec<Fingering>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            number_of_holes,
            fingerings,
        }
    }

    /// Wraps a bare fingering list, taking the hole count from the first
    /// fingering.
    pub fn from_fingerings(fingerings: Vec<Fingering>) -> Self {
        let number_of_holes = fingerings
            .first()
            .map(|fingering| fingering.open_holes.len())
            .unwrap_or(0);
        Self::new(String::new(), number_of_holes, fingerings)
    }

    /// Fails unless the hole count and every fingering fit `instrument`.
    pub fn check_instrument(&self, instrument: &Instrument) -> Result<()> {
        if self.number_of_holes != instrument.hole_count() {
            return Err(DesignerError::geometry(format!(
                "tuning `{}` is for {} holes but instrument `{}` has {}",
                self.name,
                self.number_of_holes,
                instrument.name,
                instrument.hole_count()
            )));
        }
        self.fingerings
            .iter()
            .try_for_each(|fingering| instrument.check_fingering(fingering))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_is_twelve_hundred_cents() {
        assert_eq!(cents(440.0, 880.0), 1200.0);
        assert_eq!(cents(880.0, 440.0), -1200.0);
        assert_eq!(cents(261.63, 261.63), 0.0);
    }

    #[test]
    fn semitone_is_one_hundred_cents() {
        let semitone = 2f64.powf(1.0 / 12.0);
        assert!((cents(440.0, 440.0 * semitone) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cents_grow_with_frequency_ratio() {
        let ratios = [1.01, 1.1, 1.5, 2.0, 3.0];
        let values: Vec<f64> = ratios.iter().map(|r| cents(300.0, 300.0 * r)).collect();
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn target_frequency_prefers_nominal_value() {
        let mut note = Note {
            frequency_min: Some(430.0),
            frequency_max: Some(450.0),
            ..Default::default()
        };
        assert_eq!(note.target_frequency(), Some(430.0));
        note.frequency = Some(440.0);
        assert_eq!(note.target_frequency(), Some(440.0));
        assert_eq!(Note::default().target_frequency(), None);
    }

    #[test]
    fn labels_unnamed_fingerings_by_pattern() {
        let fingering = Fingering::new(vec![false, false, true]);
        assert_eq!(fingering.label(), "XXO");
        let named = fingering.with_note(Note::new("D5", 587.33));
        assert_eq!(named.label(), "D5");
        assert_eq!(Fingering::default().label(), "(no holes)");
    }

    #[test]
    fn fingering_defaults() {
        let fingering = Fingering::new(vec![true]);
        assert!(fingering.is_open_end());
        assert_eq!(fingering.weight(), 1);
    }

    #[test]
    fn tuning_from_fingerings_counts_holes() {
        let tuning = Tuning::from_fingerings(vec![Fingering::new(vec![false; 6])]);
        assert_eq!(tuning.number_of_holes, 6);
        assert_eq!(Tuning::from_fingerings(Vec::new()).number_of_holes, 0);
    }

    #[test]
    fn tuning_must_fit_the_instrument() {
        let instrument = crate::fixtures::whistle();
        let mut tuning = crate::fixtures::whistle_tuning();
        assert!(tuning.check_instrument(&instrument).is_ok());

        tuning.fingerings[2].open_holes.pop();
        assert!(matches!(
            tuning.check_instrument(&instrument),
            Err(DesignerError::InvalidGeometry(_))
        ));
        tuning.number_of_holes = 5;
        assert!(tuning.check_instrument(&instrument).is_err());
    }
}
