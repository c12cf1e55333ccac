use crate::{DesignerError, Instrument, Result};

/// Conical (or cylindrical) stretch of bore between two cut points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoreSection {
    pub length: f64,
    /// Radius at the end nearer the mouthpiece.
    pub left_radius: f64,
    pub right_radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HoleGeometry {
    /// Main bore radius at the hole.
    pub bore_radius: f64,
    pub radius: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Component {
    Bore(BoreSection),
    /// `index` is the hole's rank in position order, which is also its index
    /// in a fingering.
    Hole { index: usize, geometry: HoleGeometry },
}

/// Flattens an instrument (already in metres) into the sequence of bore
/// sections and holes from the mouthpiece to the far end.
pub(crate) fn build_components(instrument: &Instrument) -> Result<Vec<Component>> {
    instrument.validate()?;

    let start = instrument.mouthpiece.position;
    let order = instrument.hole_order();

    let mut cuts: Vec<(f64, Option<usize>)> = instrument
        .bore_points
        .iter()
        .filter(|point| point.position > start)
        .map(|point| (point.position, None))
        .collect();
    cuts.extend(
        order
            .iter()
            .enumerate()
            .map(|(rank, &hole)| (instrument.holes[hole].position, Some(rank))),
    );
    // At equal positions the bore point comes first so the hole sits after
    // the section that ends there.
    cuts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.is_some().cmp(&b.1.is_some())));

    let radius_at = |position: f64| -> Result<f64> {
        instrument
            .diameter_at(position)
            .map(|diameter| diameter / 2.0)
            .ok_or_else(|| {
                DesignerError::geometry(format!("position {position} lies outside the bore"))
            })
    };

    let mut components = Vec::with_capacity(cuts.len() * 2);
    let mut cursor = start;
    for (position, hole) in cuts {
        if position > cursor {
            components.push(Component::Bore(BoreSection {
                length: position - cursor,
                left_radius: radius_at(cursor)?,
                right_radius: radius_at(position)?,
            }));
            cursor = position;
        }
        if let Some(rank) = hole {
            let source = &instrument.holes[order[rank]];
            components.push(Component::Hole {
                index: rank,
                geometry: HoleGeometry {
                    bore_radius: radius_at(position)?,
                    radius: source.diameter / 2.0,
                    height: source.height,
                },
            });
        }
    }

    Ok(components)
}
