//! Collocation Picard tent solver.
//!
//! On each pseudotime subinterval the mapped system `∂_τ ŷ = A(û)` is
//! collocated at Gauss-Lobatto nodes and solved by fixed-point iteration:
//!
//!   ŷ_j = ŷ_a + Δτ Σ_k I[j][k] A(û_k),   û_j = cyl2tent(ŷ_j, τ_j)
//!
//! with `I` the Lagrange integration matrix of the node set. The endpoint
//! node at τ = 1 hands the next subinterval (or the tent top) its state
//! without extrapolation.
//!
//! For equations with entropy machinery the solver computes the entropy
//! residual at the mid node — `∂_τ ŷ` is available for free as the current
//! flux — derives the viscosity coefficients, and when the tent exceeds
//! the viscosity threshold repeats the sweeps with the interior-penalty
//! term folded into the update.

use crate::arena::ScratchArena;
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::Result;
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::simd::axpy;
use crate::tent::Tent;

#[allow(clippy::too_many_arguments)]
pub(crate) fn propagate<E: Equation, M: MeshAccess>(
    cl: &ConservationLaw<E, M>,
    tent: &Tent,
    fd: &TentFeData,
    substeps: usize,
    iterations: usize,
    local_u: &mut [f64],
    local_u0: &[f64],
    local_nu: &mut [f64],
    h: &ScratchArena,
) -> Result<()> {
    let comp = E::COMP;
    let nd = fd.nd;
    let n = nd * comp;
    let tab = cl.collocation();
    let s = tab.n;

    // Cylinder state at the tent bottom.
    let ya = h.alloc(n);
    cl.tent2cyl(tent, fd, 0.0, local_u, ya, true, h)?;

    let mut us: Vec<&mut [f64]> = (0..s).map(|_| h.alloc(n)).collect();
    let mut ys: Vec<&mut [f64]> = (0..s).map(|_| h.alloc(n)).collect();
    let mut fs: Vec<&mut [f64]> = (0..s).map(|_| h.alloc(n)).collect();
    let ytmp = h.alloc(n);
    let yprev = h.alloc(n);
    let vtmp = h.alloc(n);
    let res = h.alloc(nd * E::ECOMP.max(1));

    let dtau = 1.0 / substeps as f64;
    let mut use_visc = false;

    for step in 0..substeps {
        let a = step as f64 * dtau;
        let taus: Vec<f64> = tab.nodes.iter().map(|&x| a + dtau * x).collect();

        for j in 0..s {
            ys[j].copy_from_slice(ya);
            cl.cyl2tent(tent, fd, taus[j], ya, us[j], h)?;
        }

        // Round 0 runs inviscid; if the entropy residual asks for
        // viscosity, round 1 repeats the sweeps with it.
        for round in 0..2 {
            for _ in 0..iterations {
                yprev.copy_from_slice(ys[s - 1]);
                for j in 0..s {
                    cl.calc_flux_tent(tent, fd, us[j], local_u0, fs[j], taus[j], h)?;
                    if use_visc {
                        cl.calc_viscosity_tent(tent, fd, us[j], local_u0, local_nu, vtmp, h)?;
                        for (f, v) in fs[j].iter_mut().zip(vtmp.iter()) {
                            *f -= v;
                        }
                    }
                }
                for j in 1..s {
                    ytmp.copy_from_slice(ya);
                    for k in 0..s {
                        let c = dtau * tab.integrate[j * s + k];
                        if c != 0.0 {
                            axpy(c, fs[k], ytmp);
                        }
                    }
                    ys[j].copy_from_slice(ytmp);
                    cl.cyl2tent(tent, fd, taus[j], ytmp, us[j], h)?;
                }
                // fixed-point stall check at the subinterval endpoint
                let mut diff: f64 = 0.0;
                let mut scale: f64 = 1.0;
                for (ynew, yold) in ys[s - 1].iter().zip(yprev.iter()) {
                    diff = diff.max((ynew - yold).abs());
                    scale = scale.max(ynew.abs());
                }
                if diff < 1e-13 * scale {
                    break;
                }
            }

            if round == 0 && E::ECOMP > 0 {
                let m = s / 2;
                cl.calc_entropy_residual_tent(
                    tent, fd, ys[m], fs[m], res, local_u0, taus[m], h,
                )?;
                let nu_tent = cl.calc_viscosity_coefficient_tent(
                    tent, fd, ys[m], res, taus[m], local_nu, h,
                )?;
                if nu_tent > cl.config.viscosity_threshold {
                    use_visc = true;
                    continue;
                }
            }
            break;
        }

        // The last collocation node is the subinterval end.
        ya.copy_from_slice(ys[s - 1]);
    }

    local_u[..n].copy_from_slice(us[s - 1]);
    Ok(())
}
