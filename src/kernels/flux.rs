//! DG spatial operator on a tent: `calc_flux_tent`.
//!
//! Assembles the tent-height-scaled flux form applied to `u`,
//!
//!   volume:  + ∫ δ F(u) · ∇v
//!   facets:  - Σ_f ∫ δ_f F̂(u1, u2, n) [v]
//!
//! and closes with the per-element mass solve. Boundary facets construct
//! the exterior trace through the boundary-condition dispatch.

use crate::arena::ScratchArena;
use crate::basis::{add_grad_trans_multi, add_trans, evaluate};
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::{Result, TentError};
use crate::fedata::{TentFeData, SENTINEL};
use crate::mesh::MeshAccess;
use crate::simd::mul_assign;
use crate::tent::Tent;

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Assemble `M^{-1}` times the δ-scaled DG flux form of `u` into `flux`.
    ///
    /// `u`, `u0`, `flux` are tent-local `nd × COMP` matrices; `u0` feeds
    /// inflow boundaries. `tstar` is accepted for interface symmetry with
    /// the other kernels; the assembled form does not depend on it.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_flux_tent(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        u: &[f64],
        u0: &[f64],
        flux: &mut [f64],
        _tstar: f64,
        h: &ScratchArena,
    ) -> Result<()> {
        if E::X_DEPENDENT {
            return Err(TentError::UnsupportedOperation(
                "simd volume flux not implemented for x-dependent equations".into(),
            ));
        }

        let comp = E::COMP;
        let dim = E::DIM;
        flux[..fd.nd * comp].fill(0.0);

        // volume terms
        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];

            let u_ipts = h.alloc(comp * nqp);
            let flux_ipts = h.alloc(dim * comp * nqp);
            let flux_relay = h.alloc(comp * dim * nqp);

            evaluate(rule, &u[dn.start * comp..dn.end * comp], comp, u_ipts);
            self.equation.flux(mir, u_ipts, flux_ipts);

            // column scale by w(q)·δ(q)
            let fac = h.alloc(nqp);
            for q in 0..rule.nq {
                fac[q] = mir.weight[q] * fd.adelta[i][q];
            }
            for r in 0..dim * comp {
                mul_assign(&mut flux_ipts[r * nqp..(r + 1) * nqp], fac);
            }

            // re-layout (direction-major) -> (component-major) for the
            // gradient transpose
            for l in 0..comp {
                for k in 0..dim {
                    flux_relay[(l * dim + k) * nqp..(l * dim + k + 1) * nqp]
                        .copy_from_slice(&flux_ipts[(k * comp + l) * nqp..(k * comp + l + 1) * nqp]);
                }
            }
            add_grad_trans_multi(
                rule,
                mir,
                flux_relay,
                comp,
                &mut flux[dn.start * comp..dn.end * comp],
            );
        }

        // facet terms
        for fi in 0..fd.n_facets() {
            let el1 = fd.felpos[fi][0];
            let el2 = fd.felpos[fi][1];
            let r1 = fd.firi[fi][0];
            let nqp = r1.nq_pad;
            let dn1 = &fd.ranges[el1];
            let mir1 = &fd.mfiri1[fi];

            let u1 = h.alloc(comp * nqp);
            let u2 = h.alloc(comp * nqp);
            let fna = h.alloc(comp * nqp);

            evaluate(r1, &u[dn1.start * comp..dn1.end * comp], comp, u1);

            if el2 != SENTINEL {
                // inner facet
                let r2 = fd.firi[fi][1];
                let dn2 = &fd.ranges[el2];
                evaluate(r2, &u[dn2.start * comp..dn2.end * comp], comp, u2);

                self.equation.num_flux(mir1, u1, u2, &fd.anormals[fi], fna);

                let fac = h.alloc(nqp);
                for q in 0..r1.nq {
                    fac[q] = -fd.adelta_facet[fi][q] * mir1.weight[q];
                }
                for c in 0..comp {
                    mul_assign(&mut fna[c * nqp..(c + 1) * nqp], fac);
                }

                add_trans(r1, fna, comp, &mut flux[dn1.start * comp..dn1.end * comp]);
                for v in fna.iter_mut() {
                    *v = -*v;
                }
                add_trans(r2, fna, comp, &mut flux[dn2.start * comp..dn2.end * comp]);
            } else {
                // boundary facet
                self.boundary_trace(tent, fd, fi, u0, u1, u2)?;
                self.equation.num_flux(mir1, u1, u2, &fd.anormals[fi], fna);

                let fac = h.alloc(nqp);
                for q in 0..r1.nq {
                    fac[q] = -fd.adelta_facet[fi][q] * mir1.weight[q];
                }
                for c in 0..comp {
                    mul_assign(&mut fna[c * nqp..(c + 1) * nqp], fac);
                }
                add_trans(r1, fna, comp, &mut flux[dn1.start * comp..dn1.end * comp]);
            }
        }

        for i in 0..fd.n_els() {
            let dn = fd.ranges[i].clone();
            self.solve_m(
                tent,
                fd,
                i,
                &mut flux[dn.start * comp..dn.end * comp],
                comp,
                h,
            );
        }
        Ok(())
    }
}
