//! Scalar types the kinematics and cost path are generic over.

use nalgebra::Scalar;
use num_dual::{DualDVec64, DualNum};

/// A real scalar that may carry derivatives.
///
/// Implemented for `f64` (plain evaluation) and for the dual number types of
/// `num_dual`, in particular [`Gradient`]. Everything on the cost path
/// (poses, rotations, the kinematic model) is written against this trait, so
/// one implementation serves both value and gradient evaluation.
pub trait Real: DualNum<f64> + Scalar {}

impl<T: DualNum<f64> + Scalar> Real for T {}

/// Dual number with one derivative lane per configuration entry.
pub type Gradient = DualDVec64;

/// `atan2` built from `atan` so derivatives stay finite away from the origin.
pub fn atan2<T: Real>(y: T, x: T) -> T {
    use std::f64::consts::{FRAC_PI_2, PI};

    let (yr, xr) = (y.re(), x.re());
    if xr.abs() >= yr.abs() {
        if xr == 0.0 {
            return T::from(0.0);
        }
        let base = (y / x).atan();
        if xr > 0.0 {
            base
        } else if yr >= 0.0 {
            base + PI
        } else {
            base - PI
        }
    } else {
        let base = -(x / y).atan();
        if yr > 0.0 { base + FRAC_PI_2 } else { base - FRAC_PI_2 }
    }
}
