//! Entropy residual: `calc_entropy_residual_tent`.
//!
//! Drives the artificial-viscosity coefficient. The state and its
//! pseudotime derivative are paired into dual numbers and threaded through
//! the equation's inverse map and entropy pair; the front gradient enters
//! as the dual field `((1-t*)∇φ_bot + t*∇φ_top, ∇φ_top - ∇φ_bot)` so the
//! map's own time dependence differentiates along. Facets accumulate the
//! entropy numerical flux on both sides; on wall boundaries (code 1) the
//! contribution is omitted — a slip wall produces no entropy.

use crate::arena::ScratchArena;
use crate::basis::{add_grad_trans, add_trans, evaluate};
use crate::driver::ConservationLaw;
use crate::equation::{Dual, Equation};
use crate::error::{Result, TentError};
use crate::fedata::{TentFeData, SENTINEL};
use crate::mesh::MeshAccess;
use crate::simd::mul_assign;
use crate::tent::Tent;

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Assemble the entropy residual of `(u, ut)` into `res`
    /// (`nd × ECOMP`). `u` is in cylinder DOFs; `u0` feeds inflow facets.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_entropy_residual_tent(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        u: &[f64],
        ut: &[f64],
        res: &mut [f64],
        u0: &[f64],
        tstar: f64,
        h: &ScratchArena,
    ) -> Result<()> {
        let ecomp = E::ECOMP;
        if ecomp == 0 {
            res.fill(0.0);
            return Ok(());
        }
        if ecomp > 1 {
            return Err(TentError::UnsupportedOperation(
                "not yet implemented for more than one entropy function".into(),
            ));
        }
        let comp = E::COMP;
        let dim = E::DIM;

        res[..fd.nd * ecomp].fill(0.0);

        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];

            let ui = h.alloc(comp * nqp);
            let uti = h.alloc(comp * nqp);
            evaluate(rule, &u[dn.start * comp..dn.end * comp], comp, ui);
            evaluate(rule, &ut[dn.start * comp..dn.end * comp], comp, uti);

            // pair value and pseudotime derivative
            let mut adu: Vec<Dual> = ui
                .iter()
                .zip(uti.iter())
                .map(|(&v, &dv)| Dual::new(v, dv))
                .collect();

            // dual front field: value interpolates, derivative is ∇δ
            let mut adgrad: Vec<Dual> = Vec::with_capacity(dim * nqp);
            for k in 0..dim * nqp {
                let b = fd.agradphi_bot[i][k];
                let t = fd.agradphi_top[i][k];
                adgrad.push(Dual::new((1.0 - tstar) * b + tstar * t, t - b));
            }

            self.equation.inverse_map(mir, &adgrad, &mut adu);

            let ei = h.alloc(ecomp * nqp);
            let fi = h.alloc(dim * ecomp * nqp);
            self.equation.calc_entropy(&adu, &adgrad, ei, fi, nqp);

            for q in 0..rule.nq {
                ei[q] *= mir.weight[q];
                let fac = -mir.weight[q] * fd.adelta[i][q];
                for k in 0..dim {
                    fi[k * nqp + q] *= fac;
                }
            }

            add_trans(rule, ei, ecomp, &mut res[dn.start * ecomp..dn.end * ecomp]);
            add_grad_trans(
                rule,
                mir,
                fi,
                ecomp,
                0,
                &mut res[dn.start * ecomp..dn.end * ecomp],
            );
        }

        // facet entropy fluxes act on the tent-frame values
        let temp = h.alloc(fd.nd * comp);
        self.cyl2tent(tent, fd, tstar, u, temp, h)?;

        for fi_idx in 0..fd.n_facets() {
            let el1 = fd.felpos[fi_idx][0];
            let el2 = fd.felpos[fi_idx][1];
            let r1 = fd.firi[fi_idx][0];
            let nqp = r1.nq_pad;
            let dn1 = &fd.ranges[el1];
            let mir1 = &fd.mfiri1[fi_idx];

            let u1 = h.alloc(comp * nqp);
            let u2 = h.alloc(comp * nqp);
            let fln = h.alloc(ecomp * nqp);

            evaluate(r1, &temp[dn1.start * comp..dn1.end * comp], comp, u1);

            if el2 != SENTINEL {
                let r2 = fd.firi[fi_idx][1];
                let dn2 = &fd.ranges[el2];
                evaluate(r2, &temp[dn2.start * comp..dn2.end * comp], comp, u2);
                self.equation
                    .entropy_flux(u1, u2, &fd.anormals[fi_idx], fln, nqp);

                let fac = h.alloc(nqp);
                for q in 0..r1.nq {
                    fac[q] = fd.adelta_facet[fi_idx][q] * mir1.weight[q];
                }
                for c in 0..ecomp {
                    mul_assign(&mut fln[c * nqp..(c + 1) * nqp], fac);
                }

                add_trans(r1, fln, ecomp, &mut res[dn1.start * ecomp..dn1.end * ecomp]);
                for v in fln.iter_mut() {
                    *v = -*v;
                }
                add_trans(r2, fln, ecomp, &mut res[dn2.start * ecomp..dn2.end * ecomp]);
            } else {
                let bc = self.bc_code(tent.internal_facets[fi_idx]);
                self.boundary_trace(tent, fd, fi_idx, u0, u1, u2)?;
                self.equation
                    .entropy_flux(u1, u2, &fd.anormals[fi_idx], fln, nqp);

                let fac = h.alloc(nqp);
                for q in 0..r1.nq {
                    fac[q] = fd.adelta_facet[fi_idx][q] * mir1.weight[q];
                }
                for c in 0..ecomp {
                    mul_assign(&mut fln[c * nqp..(c + 1) * nqp], fac);
                }

                // slip walls produce no entropy flux
                if bc != 1 {
                    add_trans(r1, fln, ecomp, &mut res[dn1.start * ecomp..dn1.end * ecomp]);
                }
            }
        }

        for i in 0..fd.n_els() {
            let dn = fd.ranges[i].clone();
            self.solve_m(
                tent,
                fd,
                i,
                &mut res[dn.start * ecomp..dn.end * ecomp],
                ecomp,
                h,
            );
        }
        Ok(())
    }
}
