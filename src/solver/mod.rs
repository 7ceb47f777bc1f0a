//! Tent solvers: per-tent time advance in the cylinder frame.
//!
//! A tent solver composes the kernels into `propagate_tent`: map the
//! bottom-front state into the cylinder, advance the mapped system
//! `∂_τ ŷ = A(û)` with `û = cyl2tent(ŷ)` across pseudotime τ ∈ [0, 1],
//! and leave the top-front tent values in the local matrix.
//!
//! Two variants:
//! - [`TentSolverKind::Picard`]: Gauss-Lobatto collocation with fixed-point
//!   iteration, including the entropy-viscosity pipeline for equations
//!   that carry entropy machinery.
//! - [`TentSolverKind::Sark`]: explicit structure-aware Runge-Kutta on the
//!   tent values, using the `apply_m1` height-rate correction for the
//!   pseudotime derivative of the map. Exact for linear fluxes.

mod picard;
mod sark;

use crate::arena::ScratchArena;
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::Result;
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::tent::Tent;

/// Tent solver selection with its tunables.
#[derive(Clone, Copy, Debug)]
pub enum TentSolverKind {
    /// Collocation Picard iteration.
    Picard {
        /// Pseudotime subintervals per tent.
        substeps: usize,
        /// Fixed-point sweeps per subinterval.
        iterations: usize,
        /// Collocation nodes (Gauss-Lobatto points on [0, 1]).
        stages: usize,
    },
    /// Structure-aware explicit RK4.
    Sark {
        /// Pseudotime subintervals per tent.
        substeps: usize,
    },
}

impl TentSolverKind {
    /// Default Picard configuration for a spatial order.
    pub fn default_for_order(order: usize) -> Self {
        let stages = (order + 2).clamp(2, 7);
        TentSolverKind::Picard {
            substeps: 2,
            iterations: 4 * stages,
            stages,
        }
    }

    /// Collocation node count the driver builds tables for.
    pub fn stages(&self) -> usize {
        match self {
            TentSolverKind::Picard { stages, .. } => *stages,
            TentSolverKind::Sark { .. } => 2,
        }
    }

    /// Advance one tent: `local_u` holds bottom-front tent values on entry
    /// and top-front values on return; `local_nu` receives the per-element
    /// viscosity coefficients.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn propagate_tent<E: Equation, M: MeshAccess>(
        &self,
        cl: &ConservationLaw<E, M>,
        tent: &Tent,
        fd: &TentFeData,
        local_u: &mut [f64],
        local_u0: &[f64],
        local_nu: &mut [f64],
        h: &ScratchArena,
    ) -> Result<()> {
        match *self {
            TentSolverKind::Picard {
                substeps,
                iterations,
                ..
            } => picard::propagate(
                cl, tent, fd, substeps, iterations, local_u, local_u0, local_nu, h,
            ),
            TentSolverKind::Sark { substeps } => {
                sark::propagate(cl, tent, fd, substeps, local_u, local_u0, local_nu, h)
            }
        }
    }
}
