//! Physical description of an instrument: bore profile, tone holes,
//! mouthpiece and termination.

mod components;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DesignerError, Fingering, Result};

pub(crate) use components::{build_components, BoreSection, Component, HoleGeometry};

/// Unit every length in an [`Instrument`] document is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LengthType {
    #[default]
    Mm,
    Cm,
    In,
    Ft,
    M,
}

impl LengthType {
    pub fn metres_per_unit(self) -> f64 {
        match self {
            LengthType::Mm => 0.001,
            LengthType::Cm => 0.01,
            LengthType::In => 0.0254,
            LengthType::Ft => 0.3048,
            LengthType::M => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LengthType::Mm => "MM",
            LengthType::Cm => "CM",
            LengthType::In => "IN",
            LengthType::Ft => "FT",
            LengthType::M => "M",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MM" => Some(LengthType::Mm),
            "CM" => Some(LengthType::Cm),
            "IN" => Some(LengthType::In),
            "FT" => Some(LengthType::Ft),
            "M" => Some(LengthType::M),
            _ => None,
        }
    }
}

impl fmt::Display for LengthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorePoint {
    pub position: f64,
    pub diameter: f64,
}

impl BorePoint {
    pub fn new(position: f64, diameter: f64) -> Self {
        Self { position, diameter }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub position: f64,
    pub diameter: f64,
    /// Chimney height, the wall thickness at the hole.
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_curvature_radius: Option<f64>,
}

impl Hole {
    pub fn new(position: f64, diameter: f64, height: f64) -> Self {
        Self {
            name: None,
            position,
            diameter,
            height,
            inner_curvature_radius: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReedType {
    Single,
    Double,
    Lip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouthpieceKind {
    /// Duct flute window (recorder, whistle, native american flute).
    #[serde(rename_all = "camelCase")]
    Fipple {
        window_length: f64,
        window_width: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window_height: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        windway_height: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fipple_factor: Option<f64>,
    },
    /// Transverse flute embouchure hole.
    #[serde(rename_all = "camelCase")]
    EmbouchureHole {
        length: f64,
        width: f64,
        height: f64,
        airstream_length: f64,
        airstream_height: f64,
    },
    Reed(ReedType),
}

impl MouthpieceKind {
    /// Reed instruments are closed at the mouthpiece; flutes are open.
    pub fn is_pressure_node(&self) -> bool {
        !matches!(self, MouthpieceKind::Reed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mouthpiece {
    pub position: f64,
    pub kind: MouthpieceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Termination {
    /// Outside diameter at the open end; zero or the bore diameter means
    /// no flange.
    pub flange_diameter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub length_type: LengthType,
    pub mouthpiece: Mouthpiece,
    pub bore_points: Vec<BorePoint>,
    #[serde(default)]
    pub holes: Vec<Hole>,
    #[serde(default)]
    pub termination: Termination,
}

impl Instrument {
    /// Checks the geometric invariants every calculation relies on.
    pub fn validate(&self) -> Result<()> {
        if self.bore_points.len() < 2 {
            return Err(DesignerError::geometry(
                "bore needs at least two bore points",
            ));
        }
        for point in &self.bore_points {
            if !(point.position.is_finite() && point.diameter.is_finite() && point.diameter > 0.0)
            {
                return Err(DesignerError::geometry(format!(
                    "bore point at {} has invalid diameter {}",
                    point.position, point.diameter
                )));
            }
        }
        if let Some(pair) = self
            .bore_points
            .windows(2)
            .find(|pair| pair[1].position <= pair[0].position)
        {
            return Err(DesignerError::geometry(format!(
                "bore positions must be strictly increasing ({} then {})",
                pair[0].position, pair[1].position
            )));
        }

        let (start, end) = self.bore_extent();
        let mouthpiece = self.mouthpiece.position;
        if !(mouthpiece >= start && mouthpiece < end) {
            return Err(DesignerError::geometry(format!(
                "mouthpiece at {mouthpiece} lies outside the bore [{start}, {end})"
            )));
        }

        for (index, hole) in self.holes.iter().enumerate() {
            let label = hole.name.clone().unwrap_or_else(|| format!("#{}", index + 1));
            if !(hole.position > mouthpiece && hole.position < end) {
                return Err(DesignerError::geometry(format!(
                    "hole {label} at {} lies outside the bore ({mouthpiece}, {end})",
                    hole.position
                )));
            }
            if !(hole.diameter.is_finite() && hole.diameter > 0.0) {
                return Err(DesignerError::geometry(format!(
                    "hole {label} has invalid diameter {}",
                    hole.diameter
                )));
            }
            if !(hole.height.is_finite() && hole.height >= 0.0) {
                return Err(DesignerError::geometry(format!(
                    "hole {label} has invalid height {}",
                    hole.height
                )));
            }
        }

        Ok(())
    }

    /// Returns a copy with every length converted to metres.
    pub fn to_metres(&self) -> Instrument {
        let scale = self.length_type.metres_per_unit();
        let kind = match &self.mouthpiece.kind {
            MouthpieceKind::Fipple {
                window_length,
                window_width,
                window_height,
                windway_height,
                fipple_factor,
            } => MouthpieceKind::Fipple {
                window_length: window_length * scale,
                window_width: window_width * scale,
                window_height: window_height.map(|h| h * scale),
                windway_height: windway_height.map(|h| h * scale),
                fipple_factor: *fipple_factor,
            },
            MouthpieceKind::EmbouchureHole {
                length,
                width,
                height,
                airstream_length,
                airstream_height,
            } => MouthpieceKind::EmbouchureHole {
                length: length * scale,
                width: width * scale,
                height: height * scale,
                airstream_length: airstream_length * scale,
                airstream_height: airstream_height * scale,
            },
            MouthpieceKind::Reed(reed) => MouthpieceKind::Reed(*reed),
        };

        Instrument {
            name: self.name.clone(),
            description: self.description.clone(),
            length_type: LengthType::M,
            mouthpiece: Mouthpiece {
                position: self.mouthpiece.position * scale,
                kind,
            },
            bore_points: self
                .bore_points
                .iter()
                .map(|p| BorePoint::new(p.position * scale, p.diameter * scale))
                .collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| Hole {
                    name: hole.name.clone(),
                    position: hole.position * scale,
                    diameter: hole.diameter * scale,
                    height: hole.height * scale,
                    inner_curvature_radius: hole.inner_curvature_radius.map(|r| r * scale),
                })
                .collect(),
            termination: Termination {
                flange_diameter: self.termination.flange_diameter * scale,
            },
        }
    }

    /// First and last bore positions.
    pub fn bore_extent(&self) -> (f64, f64) {
        let start = self.bore_points.first().map(|p| p.position).unwrap_or(0.0);
        let end = self.bore_points.last().map(|p| p.position).unwrap_or(0.0);
        (start, end)
    }

    /// Sounding length, from the mouthpiece to the end of the bore, in
    /// document units.
    pub fn bore_length(&self) -> f64 {
        self.bore_extent().1 - self.mouthpiece.position
    }

    /// Bore diameter at `position`, linearly interpolated between bore
    /// points. `None` outside the bore.
    pub fn diameter_at(&self, position: f64) -> Option<f64> {
        self.bore_points.windows(2).find_map(|pair| {
            let (left, right) = (pair[0], pair[1]);
            if position < left.position || position > right.position {
                return None;
            }
            let span = right.position - left.position;
            if span <= 0.0 {
                return Some(left.diameter);
            }
            let fraction = (position - left.position) / span;
            Some(left.diameter + (right.diameter - left.diameter) * fraction)
        })
    }

    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    /// Hole indices ordered by increasing position; fingering entries follow
    /// this order.
    pub fn hole_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.holes.len()).collect();
        order.sort_by(|&a, &b| self.holes[a].position.total_cmp(&self.holes[b].position));
        order
    }

    /// Fails when `fingering` does not describe exactly one state per hole.
    pub fn check_fingering(&self, fingering: &Fingering) -> Result<()> {
        if fingering.open_holes.len() != self.holes.len() {
            return Err(DesignerError::geometry(format!(
                "fingering `{}` has {} hole states but the instrument has {} holes",
                fingering.label(),
                fingering.open_holes.len(),
                self.holes.len()
            )));
        }
        Ok(())
    }
}
