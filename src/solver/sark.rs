//! Structure-aware explicit Runge-Kutta tent solver.
//!
//! Advances the tent values û directly. Differentiating `ŷ = M(τ)(û)`
//! along the evolution gives
//!
//!   L_û(∂_τ û) = A(û) + F(û)·∇δ
//!
//! where `L_û` is the linearized cylinder map at û and the second term is
//! the height-rate correction assembled by `apply_m1`. The stage
//! derivative applies `cyl2tent` to `A + M1`, which inverts `L` exactly
//! for linear fluxes (advection, wave); classic RK4 integrates the stages.

use crate::arena::ScratchArena;
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::Result;
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::simd::axpy;
use crate::tent::Tent;

/// Classic RK4 nodes and weights.
const RK_C: [f64; 4] = [0.0, 0.5, 0.5, 1.0];
const RK_B: [f64; 4] = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];
/// Subdiagonal coupling: stage i uses `u + Δτ·a_i·k_{i-1}`.
const RK_A: [f64; 4] = [0.0, 0.5, 0.5, 1.0];

#[allow(clippy::too_many_arguments)]
pub(crate) fn propagate<E: Equation, M: MeshAccess>(
    cl: &ConservationLaw<E, M>,
    tent: &Tent,
    fd: &TentFeData,
    substeps: usize,
    local_u: &mut [f64],
    local_u0: &[f64],
    local_nu: &mut [f64],
    h: &ScratchArena,
) -> Result<()> {
    let comp = E::COMP;
    let n = fd.nd * comp;
    let dtau = 1.0 / substeps as f64;

    let ustage = h.alloc(n);
    let rhs = h.alloc(n);
    let m1 = h.alloc(n);
    let mut ks: Vec<&mut [f64]> = (0..4).map(|_| h.alloc(n)).collect();

    // The SARK variant has no viscosity pipeline; coefficients stay zero.
    local_nu.fill(0.0);

    for step in 0..substeps {
        let a0 = step as f64 * dtau;

        for i in 0..4 {
            let tau = a0 + RK_C[i] * dtau;
            ustage.copy_from_slice(local_u);
            if i > 0 {
                axpy(dtau * RK_A[i], ks[i - 1], ustage);
            }

            cl.calc_flux_tent(tent, fd, ustage, local_u0, rhs, tau, h)?;
            cl.apply_m1(tent, fd, tau, ustage, m1, h)?;
            for (r, v) in rhs.iter_mut().zip(m1.iter()) {
                *r += v;
            }
            cl.cyl2tent(tent, fd, tau, rhs, ks[i], h)?;
        }

        for i in 0..4 {
            axpy(dtau * RK_B[i], ks[i], local_u);
        }
    }
    Ok(())
}
