use std::ops::Mul;

use num_complex::Complex64;

/// Acoustic pressure and volume flow at one point of the air column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub pressure: Complex64,
    pub flow: Complex64,
}

impl StateVector {
    /// State just inside an end radiating into `impedance`.
    pub fn with_load(impedance: Complex64) -> Self {
        Self {
            pressure: impedance,
            flow: Complex64::new(1.0, 0.0),
        }
    }

    /// State at a rigidly closed end.
    pub fn closed_end() -> Self {
        Self {
            pressure: Complex64::new(1.0, 0.0),
            flow: Complex64::new(0.0, 0.0),
        }
    }

    /// Pressure over flow. Infinite at a closed end.
    pub fn impedance(&self) -> Complex64 {
        self.pressure / self.flow
    }

    pub fn is_finite(&self) -> bool {
        self.pressure.is_finite() && self.flow.is_finite()
    }
}

/// 2x2 matrix mapping the downstream state of an element to its upstream
/// state: `[P_in, U_in] = T [P_out, U_out]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMatrix {
    pub pp: Complex64,
    pub pu: Complex64,
    pub up: Complex64,
    pub uu: Complex64,
}

impl TransferMatrix {
    pub fn new(pp: Complex64, pu: Complex64, up: Complex64, uu: Complex64) -> Self {
        Self { pp, pu, up, uu }
    }

    pub fn identity() -> Self {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        Self::new(one, zero, zero, one)
    }

    /// Element in series with the flow path.
    pub fn series(impedance: Complex64) -> Self {
        Self {
            pu: impedance,
            ..Self::identity()
        }
    }

    /// Element branching off the flow path.
    pub fn shunt(admittance: Complex64) -> Self {
        Self {
            up: admittance,
            ..Self::identity()
        }
    }

    pub fn determinant(&self) -> Complex64 {
        self.pp * self.uu - self.pu * self.up
    }

    pub fn apply(&self, state: StateVector) -> StateVector {
        StateVector {
            pressure: self.pp * state.pressure + self.pu * state.flow,
            flow: self.up * state.pressure + self.uu * state.flow,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pp.is_finite() && self.pu.is_finite() && self.up.is_finite() && self.uu.is_finite()
    }
}

impl Mul for TransferMatrix {
    type Output = TransferMatrix;

    fn mul(self, rhs: TransferMatrix) -> TransferMatrix {
        TransferMatrix {
            pp: self.pp * rhs.pp + self.pu * rhs.up,
            pu: self.pp * rhs.pu + self.pu * rhs.uu,
            up: self.up * rhs.pp + self.uu * rhs.up,
            uu: self.up * rhs.pu + self.uu * rhs.uu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn identity_leaves_state_unchanged() {
        let state = StateVector::with_load(c(2.0, -1.0));
        assert_eq!(TransferMatrix::identity().apply(state), state);
    }

    #[test]
    fn product_applies_right_matrix_first() {
        let a = TransferMatrix::series(c(0.0, 3.0));
        let b = TransferMatrix::shunt(c(0.5, 0.0));
        let state = StateVector::with_load(c(1.0, 1.0));
        let chained = a.apply(b.apply(state));
        let combined = (a * b).apply(state);
        assert!((chained.pressure - combined.pressure).norm() < 1e-12);
        assert!((chained.flow - combined.flow).norm() < 1e-12);
    }

    #[test]
    fn series_and_shunt_are_unimodular() {
        let product = TransferMatrix::series(c(1.0, 2.0)) * TransferMatrix::shunt(c(-0.3, 0.7));
        assert!((product.determinant() - c(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn series_impedance_adds_to_load() {
        let state = TransferMatrix::series(c(0.0, 5.0)).apply(StateVector::with_load(c(1.0, 0.0)));
        assert_eq!(state.impedance(), c(1.0, 5.0));
    }

    #[test]
    fn closed_end_has_no_flow() {
        let state = StateVector::closed_end();
        assert!(state.impedance().is_infinite() || state.impedance().is_nan());
        assert!(state.is_finite());
    }
}
