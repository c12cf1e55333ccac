//! Transfer matrices and impedances of the individual acoustic elements.
//!
//! Every function works in SI units with lengths in metres. Lossy
//! propagation uses the complex wave number `k (1 + eps - j eps)` where `eps`
//! is the boundary-layer loss factor of [`PhysicalParameters::epsilon`].

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::geometry::{BoreSection, HoleGeometry};
use crate::{DesignerError, MouthpieceKind, PhysicalParameters, Result};

use super::TransferMatrix;

const J: Complex64 = Complex64::new(0.0, 1.0);

/// Relative radius difference below which a cone is treated as a cylinder.
const CONE_TOLERANCE: f64 = 1e-6;

const UNFLANGED_END_CORRECTION: f64 = 0.6133;
const FLANGED_END_CORRECTION: f64 = 0.8216;
const UNFLANGED_RADIATION_RESISTANCE: f64 = 0.25;
const FLANGED_RADIATION_RESISTANCE: f64 = 0.5;

fn loss_factor(params: &PhysicalParameters, frequency: f64, radius: f64) -> Complex64 {
    let eps = params.epsilon(frequency, radius);
    Complex64::new(1.0 + eps, -eps)
}

pub(crate) fn bore_section(
    params: &PhysicalParameters,
    frequency: f64,
    section: &BoreSection,
) -> TransferMatrix {
    let r1 = section.left_radius;
    let r2 = section.right_radius;
    let mean_radius = 0.5 * (r1 + r2);
    let loss = loss_factor(params, frequency, mean_radius);
    let k = loss * params.wave_number(frequency);
    let kl = k * section.length;
    let (sin_kl, cos_kl) = (kl.sin(), kl.cos());

    if (r2 - r1).abs() <= CONE_TOLERANCE * r1.max(r2) {
        let zc = loss * params.wave_impedance(mean_radius);
        return TransferMatrix::new(cos_kl, J * zc * sin_kl, J * sin_kl / zc, cos_kl);
    }

    // Distances from the apex; negative for a converging cone.
    let length = section.length;
    let x1 = r1 * length / (r2 - r1);
    let x2 = x1 + length;
    let zc = loss * (params.air_density() * params.speed_of_sound() / (PI * r1 * r2));

    let pp = cos_kl * (r2 / r1) - sin_kl / (k * x1);
    let pu = J * zc * sin_kl;
    let up = (J / zc)
        * (sin_kl * (Complex64::new(1.0, 0.0) + 1.0 / (k * k * (x1 * x2)))
            - cos_kl * length / (k * (x1 * x2)));
    let uu = cos_kl * (r1 / r2) + sin_kl / (k * x2);
    TransferMatrix::new(pp, pu, up, uu)
}

pub(crate) fn tone_hole(
    params: &PhysicalParameters,
    frequency: f64,
    hole: &HoleGeometry,
    open: bool,
) -> Result<TransferMatrix> {
    let k = params.wave_number(frequency);
    let b = hole.radius;
    let t = hole.height;
    let delta = b / hole.bore_radius;
    let z_hole = params.wave_impedance(b);
    let z_bore = params.wave_impedance(hole.bore_radius);

    let inner_correction = b * (0.82 - 1.4 * delta.powi(2) + 0.75 * delta.powf(2.7));
    let chimney_ratio = 1.84 * t / b;

    let (shunt_admittance, series_length) = if open {
        let effective_height = t + inner_correction + FLANGED_END_CORRECTION * b;
        let shunt_impedance =
            z_hole * Complex64::new(0.25 * (k * b).powi(2), k * effective_height);
        if !(shunt_impedance.norm() > f64::MIN_POSITIVE) {
            return Err(DesignerError::NumericInstability {
                frequency,
                detail: "open tone hole impedance vanished",
            });
        }
        let series = 0.47 * b * delta.powi(4)
            / (chimney_ratio.tanh() + 0.62 * delta.powi(2) + 0.64 * delta);
        (1.0 / shunt_impedance, series)
    } else {
        let admittance = J * (k * (t + inner_correction)).tan() / z_hole;
        // coth(x) = 1/tanh(x); an infinitely thin wall leaves no series term.
        let coth = if chimney_ratio > 0.0 {
            1.0 / chimney_ratio.tanh()
        } else {
            f64::INFINITY
        };
        let series = 0.47 * b * delta.powi(4) / (coth + 0.62 * delta.powi(2) + 0.64 * delta);
        (admittance, series)
    };

    let half_series = TransferMatrix::series(-J * z_bore * k * series_length * 0.5);
    let matrix = half_series * TransferMatrix::shunt(shunt_admittance) * half_series;
    if !matrix.is_finite() {
        return Err(DesignerError::NumericInstability {
            frequency,
            detail: "tone hole transfer matrix is not finite",
        });
    }
    Ok(matrix)
}

/// Radiation impedance of the open end. The end correction and radiation
/// resistance interpolate between an unflanged pipe and an infinite flange
/// by the ratio of bore diameter to flange diameter.
pub(crate) fn radiation_impedance(
    params: &PhysicalParameters,
    frequency: f64,
    radius: f64,
    flange_diameter: f64,
) -> Complex64 {
    let ratio = if flange_diameter > 2.0 * radius {
        2.0 * radius / flange_diameter
    } else {
        1.0
    };
    let end_correction =
        FLANGED_END_CORRECTION - (FLANGED_END_CORRECTION - UNFLANGED_END_CORRECTION) * ratio;
    let resistance = FLANGED_RADIATION_RESISTANCE
        - (FLANGED_RADIATION_RESISTANCE - UNFLANGED_RADIATION_RESISTANCE) * ratio;
    let ka = params.wave_number(frequency) * radius;
    params.wave_impedance(radius) * Complex64::new(resistance * ka * ka, end_correction * ka)
}

/// Series impedance the mouthpiece adds in front of the bore: the inertance
/// of the air plug in a fipple window or embouchure hole. Zero for reeds.
pub(crate) fn mouthpiece_impedance(
    params: &PhysicalParameters,
    frequency: f64,
    kind: &MouthpieceKind,
) -> Complex64 {
    let (area, height, factor) = match kind {
        MouthpieceKind::Fipple {
            window_length,
            window_width,
            window_height,
            fipple_factor,
            ..
        } => (
            window_length * window_width,
            window_height.unwrap_or(0.0),
            fipple_factor.unwrap_or(1.0),
        ),
        MouthpieceKind::EmbouchureHole {
            length,
            width,
            height,
            ..
        } => (PI * 0.25 * length * width, *height, 1.0),
        MouthpieceKind::Reed(_) => return Complex64::new(0.0, 0.0),
    };
    if area <= 0.0 {
        return Complex64::new(0.0, 0.0);
    }
    let equivalent_radius = (area / PI).sqrt();
    let effective_length = (height + 1.7 * equivalent_radius) * factor;
    let omega = 2.0 * PI * frequency;
    J * (omega * params.air_density() * effective_length / area)
}
