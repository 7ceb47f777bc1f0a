//! Artificial viscosity: interior-penalty Laplacian and the per-tent
//! viscosity coefficient.
//!
//! `calc_viscosity_tent` assembles the symmetric interior-penalty form
//!
//!   ∫ ν ∇u·∇v - Σ_f ( ⟨ν∇u⟩·n [v] + ⟨ν∇v⟩·n [u] - (α/h) [u][v] )
//!
//! with piecewise-constant ν and penalty α = 4p². Patch-boundary facets
//! that are not internal to the tent get a penalty contribution against
//! `ubnd` as the exterior trace. The form closes with the δ-weighted mass
//! solve, which realizes the 1/δ time scaling of the viscous term in the
//! cylinder frame.
//!
//! `calc_viscosity_coefficient_tent` scales the entropy residual by the
//! tent height, maps the state back to physical form, and asks the
//! equation for the element coefficient.

use crate::arena::ScratchArena;
use crate::basis::{add_grad_trans, add_trans, evaluate, evaluate_grad, DgFiniteElement};
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::Result;
use crate::fedata::{TentFeData, SENTINEL};
use crate::mesh::MeshAccess;
use crate::tent::Tent;

use super::gradphi_at;

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Interior-penalty viscosity form applied to `u`, ν piecewise constant
    /// per tent element (`nu_loc`), written to `visc`.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_viscosity_tent(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        u: &[f64],
        ubnd: &[f64],
        nu_loc: &[f64],
        visc: &mut [f64],
        h: &ScratchArena,
    ) -> Result<()> {
        let comp = E::COMP;
        let dim = E::DIM;
        let order = self.space().order();
        let alpha = 4.0 * (order * order) as f64;

        visc[..fd.nd * comp].fill(0.0);

        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];
            let urows = &u[dn.start * comp..dn.end * comp];

            // volume: ∫ ν ∇u·∇v
            let gradu = h.alloc(dim * nqp);
            for j in 0..comp {
                evaluate_grad(rule, mir, urows, comp, j, gradu);
                for k in 0..dim {
                    for q in 0..rule.nq {
                        gradu[k * nqp + q] *= nu_loc[i] * mir.weight[q];
                    }
                }
                add_grad_trans(
                    rule,
                    mir,
                    gradu,
                    comp,
                    j,
                    &mut visc[dn.start * comp..dn.end * comp],
                );
            }

            // quick hack for the patch-boundary facets not internal to the
            // tent: penalty against ubnd as the exterior trace
            let e = tent.els[i];
            let fel = fd.fei[i];
            for (lf, f) in self.mesh.el_facets(e).into_iter().enumerate() {
                if tent.internal_facets.contains(&f) {
                    continue;
                }
                let rf = fel.facet_rule(lf);
                let nqf = rf.nq_pad;
                let mfir = self.mesh.map_facet_rule(e, lf, rf);
                let normal = self.mesh.facet_normal(e, lf);

                let u1 = h.alloc(comp * nqf);
                let u2 = h.alloc(comp * nqf);
                let jumpu = h.alloc(comp * nqf);
                let gradf = h.alloc(dim * nqf);
                let dudn = h.alloc(comp * nqf);
                let temp = h.alloc(dim * nqf);
                let fac = h.alloc(nqf);

                evaluate(rf, urows, comp, u1);
                evaluate(rf, &ubnd[dn.start * comp..dn.end * comp], comp, u2);
                for q in 0..rf.nq {
                    fac[q] = nu_loc[i] * mfir.weight[q];
                }
                for j in 0..comp {
                    for q in 0..rf.nq {
                        jumpu[j * nqf + q] = (u1[j * nqf + q] - u2[j * nqf + q]) * fac[q];
                    }
                }

                for j in 0..comp {
                    evaluate_grad(rf, &mfir, urows, comp, j, gradf);
                    for q in 0..rf.nq {
                        let mut gn = 0.0;
                        for k in 0..dim {
                            gn += gradf[k * nqf + q] * normal[k];
                            temp[k * nqf + q] = -jumpu[j * nqf + q] * normal[k];
                        }
                        dudn[j * nqf + q] = -fac[q] * gn;
                    }
                    add_grad_trans(
                        rf,
                        &mfir,
                        temp,
                        comp,
                        j,
                        &mut visc[dn.start * comp..dn.end * comp],
                    );
                }

                let hpen = mfir.jac_det[0].abs() / mfir.measure[0];
                for j in 0..comp {
                    for q in 0..rf.nq {
                        dudn[j * nqf + q] += jumpu[j * nqf + q] * alpha / hpen;
                    }
                }
                add_trans(rf, dudn, comp, &mut visc[dn.start * comp..dn.end * comp]);
            }
        }

        // interior facets of the tent
        for fi in 0..fd.n_facets() {
            let el1 = fd.felpos[fi][0];
            let el2 = fd.felpos[fi][1];
            if el2 == SENTINEL {
                continue;
            }
            let r1 = fd.firi[fi][0];
            let r2 = fd.firi[fi][1];
            let mir1 = &fd.mfiri1[fi];
            let mir2 = &fd.mfiri2[fi];
            let nqf = r1.nq_pad;
            let dn1 = &fd.ranges[el1];
            let dn2 = &fd.ranges[el2];
            let u1rows = &u[dn1.start * comp..dn1.end * comp];
            let u2rows = &u[dn2.start * comp..dn2.end * comp];
            let (nu1, nu2) = (nu_loc[el1], nu_loc[el2]);

            let u1 = h.alloc(comp * nqf);
            let u2 = h.alloc(comp * nqf);
            let jumpu = h.alloc(comp * nqf);
            let grad1 = h.alloc(dim * nqf);
            let grad2 = h.alloc(dim * nqf);
            let dudn = h.alloc(comp * nqf);
            let temp = h.alloc(dim * nqf);
            let fac = h.alloc(nqf);

            evaluate(r1, u1rows, comp, u1);
            evaluate(r2, u2rows, comp, u2);
            for q in 0..r1.nq {
                fac[q] = mir1.weight[q];
            }
            for j in 0..comp {
                for q in 0..r1.nq {
                    jumpu[j * nqf + q] = (nu1 * u1[j * nqf + q] - nu2 * u2[j * nqf + q]) * fac[q];
                }
            }

            let normals = &fd.anormals[fi];
            for j in 0..comp {
                evaluate_grad(r1, mir1, u1rows, comp, j, grad1);
                evaluate_grad(r2, mir2, u2rows, comp, j, grad2);
                for q in 0..r1.nq {
                    let mut gn = 0.0;
                    for k in 0..dim {
                        let n_k = normals[k * nqf + q];
                        gn += (nu1 * grad1[k * nqf + q] + nu2 * grad2[k * nqf + q]) * n_k;
                        temp[k * nqf + q] = -0.5 * jumpu[j * nqf + q] * n_k;
                    }
                    dudn[j * nqf + q] = -0.5 * fac[q] * gn;
                }
                add_grad_trans(
                    r1,
                    mir1,
                    temp,
                    comp,
                    j,
                    &mut visc[dn1.start * comp..dn1.end * comp],
                );
                for t in temp.iter_mut() {
                    *t = -*t;
                }
                add_grad_trans(
                    r2,
                    mir2,
                    temp,
                    comp,
                    j,
                    &mut visc[dn2.start * comp..dn2.end * comp],
                );
            }

            let hpen = mir1.jac_det[0].abs() / mir1.measure[0];
            for j in 0..comp {
                for q in 0..r1.nq {
                    dudn[j * nqf + q] += jumpu[j * nqf + q] * alpha / hpen;
                }
            }
            add_trans(r1, dudn, comp, &mut visc[dn1.start * comp..dn1.end * comp]);
            for v in dudn.iter_mut() {
                *v = -*v;
            }
            add_trans(r2, dudn, comp, &mut visc[dn2.start * comp..dn2.end * comp]);
        }

        for i in 0..fd.n_els() {
            let dn = fd.ranges[i].clone();
            self.solve_m_delta(
                fd,
                i,
                &fd.adelta[i],
                &mut visc[dn.start * comp..dn.end * comp],
                comp,
                h,
            );
        }
        Ok(())
    }

    /// Per-element viscosity coefficients from the entropy residual;
    /// returns the tent maximum and fills `nu_loc`.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_viscosity_coefficient_tent(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        u: &[f64],
        res: &[f64],
        tstar: f64,
        nu_loc: &mut [f64],
        h: &ScratchArena,
    ) -> Result<f64> {
        if E::ECOMP == 0 {
            nu_loc.fill(0.0);
            return Ok(0.0);
        }
        debug_assert_eq!(tent.els.len(), fd.n_els());
        let comp = E::COMP;
        let ecomp = E::ECOMP;
        let order = self.space().order();

        let mut nu_tent: f64 = 0.0;
        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];

            let mut hi = fd.mesh_size[i];
            if order > 0 {
                hi /= order as f64;
            }

            let ui = h.alloc(comp * nqp);
            let resi = h.alloc(ecomp * nqp);
            evaluate(rule, &u[dn.start * comp..dn.end * comp], comp, ui);
            evaluate(rule, &res[dn.start * ecomp..dn.end * ecomp], ecomp, resi);

            // scale by the inverse tent height; δ vanishes at the patch
            // rim (a Lobatto node), where the residual vanishes as well
            for c in 0..ecomp {
                for q in 0..rule.nq {
                    let d = fd.adelta[i][q];
                    resi[c * nqp + q] = if d > 1e-13 {
                        resi[c * nqp + q] / d
                    } else {
                        0.0
                    };
                }
                // clear the SIMD overhead beyond the logical points
                for q in rule.nq..nqp {
                    resi[c * nqp + q] = 0.0;
                }
            }
            for c in 0..comp {
                for q in rule.nq..nqp {
                    ui[c * nqp + q] = 0.0;
                }
            }

            let gradphi = gradphi_at(h, &fd.agradphi_bot[i], &fd.agradphi_top[i], tstar);
            self.equation.inverse_map(mir, gradphi, ui);

            let nu_e = self.equation.calc_visc_coeff_el(mir, ui, resi, hi);
            nu_loc[i] = nu_e;
            nu_tent = nu_tent.max(nu_e);
        }
        Ok(nu_tent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::Burgers1D;
    use crate::mesh::IntervalMesh;

    fn setup() -> (ConservationLaw<Burgers1D, IntervalMesh>, Tent) {
        let mesh = IntervalMesh::uniform(0.0, 1.0, 4);
        let cl = ConservationLaw::new(Burgers1D::new(), mesh, 2).unwrap();
        let tent = Tent::new(&cl.mesh, 2, 0.0, 0.05, vec![1, 3], vec![0.0, 0.0], 0);
        (cl, tent)
    }

    #[test]
    fn test_viscosity_of_constant_state_is_zero() {
        // Constant u: zero gradient, zero jumps (ubnd = u) — the whole
        // form vanishes.
        let (cl, tent) = setup();
        let fd = TentFeData::new(&tent, cl.space(), &cl.mesh).unwrap();
        let h = ScratchArena::with_capacity_bytes(1 << 18);

        let mut u = vec![0.0; fd.nd];
        for i in 0..fd.n_els() {
            u[fd.ranges[i].start] = 2.0f64.sqrt() * 0.7;
        }
        let nu = vec![1.0; fd.n_els()];
        let mut visc = vec![0.0; fd.nd];
        cl.calc_viscosity_tent(&tent, &fd, &u, &u.clone(), &nu, &mut visc, &h)
            .unwrap();
        for &v in &visc {
            assert!(v.abs() < 1e-11, "visc = {}", v);
        }
    }

    #[test]
    fn test_viscosity_damps_facet_jump() {
        // Piecewise-constant state with a jump at the pole facet: the
        // assembled form is pure penalty there, and an explicit relaxation
        // step u - ε·visc must shrink the jump.
        let (cl, tent) = setup();
        let fd = TentFeData::new(&tent, cl.space(), &cl.mesh).unwrap();
        let h = ScratchArena::with_capacity_bytes(1 << 18);

        let c = 1.0;
        let mut u = vec![0.0; fd.nd];
        u[fd.ranges[0].start] = 2.0f64.sqrt() * c;
        u[fd.ranges[1].start] = -(2.0f64.sqrt()) * c;

        let nu = vec![0.3; fd.n_els()];
        let mut visc = vec![0.0; fd.nd];
        // ubnd = u zeroes the patch-rim quick-hack jumps; the pole facet
        // carries the only contribution.
        cl.calc_viscosity_tent(&tent, &fd, &u, &u.clone(), &nu, &mut visc, &h)
            .unwrap();

        let jump_at_pole = |v: &[f64]| -> f64 {
            // Trace of el 0 at its right endpoint minus el 1 at its left.
            let r1 = fd.firi[0][0];
            let r2 = fd.firi[0][1];
            let nd = cl.space().el_ndof();
            let mut t1 = 0.0;
            let mut t2 = 0.0;
            for d in 0..nd {
                t1 += r1.basis[d * r1.nq_pad] * v[fd.ranges[0].start + d];
                t2 += r2.basis[d * r2.nq_pad] * v[fd.ranges[1].start + d];
            }
            t1 - t2
        };

        let before = jump_at_pole(&u).abs();
        let eps = 1e-3;
        let u_new: Vec<f64> = u.iter().zip(visc.iter()).map(|(a, b)| a - eps * b).collect();
        let after = jump_at_pole(&u_new).abs();
        assert!(
            after < before,
            "penalty failed to damp the jump: {} -> {}",
            before,
            after
        );
    }

    #[test]
    fn test_coefficient_scales_with_residual() {
        let (cl, tent) = setup();
        let fd = TentFeData::new(&tent, cl.space(), &cl.mesh).unwrap();
        let h = ScratchArena::with_capacity_bytes(1 << 18);

        let mut u = vec![0.0; fd.nd];
        for i in 0..fd.n_els() {
            u[fd.ranges[i].start] = 2.0f64.sqrt() * 0.5;
        }
        let res_small = vec![1e-8; fd.nd];
        let res_large = vec![1.0; fd.nd];
        let mut nu_small = vec![0.0; fd.n_els()];
        let mut nu_large = vec![0.0; fd.n_els()];

        let s = cl
            .calc_viscosity_coefficient_tent(&tent, &fd, &u, &res_small, 0.5, &mut nu_small, &h)
            .unwrap();
        let l = cl
            .calc_viscosity_coefficient_tent(&tent, &fd, &u, &res_large, 0.5, &mut nu_large, &h)
            .unwrap();
        assert!(l >= s, "larger residual must not lower ν: {} vs {}", l, s);
        assert!(l > 0.0);
    }
}
