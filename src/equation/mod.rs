//! Equation plug-in capability set.
//!
//! A conservation law supplies its physics through [`Equation`]: the volume
//! flux, the numerical facet flux, the cylinder-to-tent inverse map, and
//! the boundary/viscosity capabilities. Kernels are monomorphized per
//! equation; `DIM`, `COMP` and `ECOMP` are associated constants so the
//! per-quadrature loops compile with fixed shapes.
//!
//! The inverse map and the entropy pair are generic over [`Scalar`] so the
//! same implementation serves plain values and [`Dual`] value/derivative
//! pairs — the entropy residual threads `(u, ∂_t u)` through them without a
//! second code path.
//!
//! Optional capabilities default to the failure behavior of the error
//! design: transparent boundaries are an `UnsupportedOperation` unless the
//! equation defines them, while missing entropy overloads log a diagnostic
//! and produce a zero residual.

mod dual;

pub use dual::Dual;

use std::ops::{Add, Div, Mul, Neg, Sub};

use tracing::warn;

use crate::basis::MappedRule;
use crate::error::{Result, TentError};

/// Arithmetic abstraction threaded through the inverse map and entropy
/// machinery: implemented by `f64` and by [`Dual`].
pub trait Scalar:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn from_f64(v: f64) -> Self;
    /// Primal part.
    fn value(self) -> f64;
    fn sqrt(self) -> Self;
    /// Multiply by a plain constant.
    fn scale(self, a: f64) -> Self;
}

impl Scalar for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }

    fn value(self) -> f64 {
        self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn scale(self, a: f64) -> Self {
        self * a
    }
}

/// Capability set of a hyperbolic conservation law.
///
/// All per-point arrays are row-major with stride `mir.nq_pad`; padded tail
/// columns hold zeros on entry and implementations may write anything there
/// (callers re-zero where it matters).
pub trait Equation: Send + Sync + 'static {
    /// Spatial dimension.
    const DIM: usize;
    /// Number of conserved variables.
    const COMP: usize;
    /// Number of entropy variables (0 disables the viscosity pipeline).
    const ECOMP: usize;
    /// Whether the flux depends on the spatial point. The SIMD volume-flux
    /// path is only provided for x-independent equations.
    const X_DEPENDENT: bool = false;

    fn name(&self) -> &'static str;

    /// Volume flux `F(u)`: `u` has `COMP` rows, `flux` has `DIM·COMP` rows
    /// with row `k·COMP + l` holding component `l` of the direction-`k`
    /// flux.
    fn flux(&self, mir: &MappedRule, u: &[f64], flux: &mut [f64]);

    /// Numerical flux `F̂(u_l, u_r, n)·n`: `COMP` rows.
    fn num_flux(&self, mir: &MappedRule, ul: &[f64], ur: &[f64], normals: &[f64], fna: &mut [f64]);

    /// Solve `y = u - F(u)·∇φ` for `u` pointwise, in place: on entry `u`
    /// holds cylinder values `y`, on exit tent values. `gradphi` has `DIM`
    /// rows.
    fn inverse_map<S: Scalar>(&self, mir: &MappedRule, gradphi: &[S], u: &mut [S]);

    /// Exterior trace for a slip/reflecting wall.
    fn u_reflect(&self, mir: &MappedRule, u: &[f64], normals: &[f64], out: &mut [f64]);

    /// Exterior trace for a transparent (absorbing) boundary. Defined only
    /// for the wave equation; everything else fails fast.
    fn u_transparent(
        &self,
        _mir: &MappedRule,
        _u: &[f64],
        _normals: &[f64],
        _out: &mut [f64],
    ) -> Result<()> {
        Err(TentError::UnsupportedOperation(format!(
            "transparent boundary just available for wave equation (equation: {})",
            self.name()
        )))
    }

    /// Entropy pair evaluated on dual values: writes `∂_τ E` (`ECOMP` rows)
    /// and the entropy flux (`DIM·ECOMP` rows). The default logs a
    /// diagnostic and leaves both zero; callers should not enable the
    /// viscosity pipeline in that case.
    fn calc_entropy(
        &self,
        _adu: &[Dual],
        _adgrad: &[Dual],
        dedt: &mut [f64],
        f: &mut [f64],
        _nq_pad: usize,
    ) {
        warn!(equation = self.name(), "no overload for CalcEntropy");
        dedt.fill(0.0);
        f.fill(0.0);
    }

    /// Entropy numerical flux on a facet (`ECOMP` rows). Defaults to a
    /// diagnostic and zero, like [`Equation::calc_entropy`].
    fn entropy_flux(
        &self,
        _ul: &[f64],
        _ur: &[f64],
        _normals: &[f64],
        flux: &mut [f64],
        _nq_pad: usize,
    ) {
        warn!(equation = self.name(), "no overload for EntropyFlux");
        flux.fill(0.0);
    }

    /// Per-element artificial-viscosity coefficient from the scaled entropy
    /// residual. `hi` is the element length scale.
    fn calc_visc_coeff_el(&self, _mir: &MappedRule, _u: &[f64], _res: &[f64], _hi: f64) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_scalar_ops() {
        let a = <f64 as Scalar>::from_f64(4.0);
        assert_eq!(a.value(), 4.0);
        assert_eq!(Scalar::sqrt(a), 2.0);
        assert_eq!(a.scale(0.5), 2.0);
    }
}
