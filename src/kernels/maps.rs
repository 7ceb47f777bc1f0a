//! Cylinder coordinate maps: `cyl2tent`, `tent2cyl`, `apply_m1`.
//!
//! The tent is mapped to the reference cylinder by the interpolated front
//! `φ(t*) = (1-t*)φ_bot + t*φ_top`. In the cylinder frame the evolved
//! quantity is `ŷ = û - F(û)·∇φ`; `tent2cyl` assembles it weakly,
//! `cyl2tent` inverts it pointwise through the equation's inverse map, and
//! `apply_m1` assembles the height-rate correction `F(û)·∇δ` that couples
//! the time derivative of the map to the flux.

use crate::arena::ScratchArena;
use crate::basis::{add_trans, evaluate};
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::Result;
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::simd::mul_assign;
use crate::tent::Tent;

use super::{gradphi_at, graddelta_of};

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Map cylinder DOFs `uhat` to tent values `u` at pseudotime `tstar`.
    pub fn cyl2tent(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        tstar: f64,
        uhat: &[f64],
        u: &mut [f64],
        h: &ScratchArena,
    ) -> Result<()> {
        let comp = E::COMP;
        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];

            let u_ipts = h.alloc(comp * nqp);
            evaluate(rule, &uhat[dn.start * comp..dn.end * comp], comp, u_ipts);

            let gradphi = gradphi_at(h, &fd.agradphi_bot[i], &fd.agradphi_top[i], tstar);
            self.equation.inverse_map(mir, gradphi, u_ipts);

            for c in 0..comp {
                mul_assign(&mut u_ipts[c * nqp..(c + 1) * nqp], &mir.weight);
            }

            u[dn.start * comp..dn.end * comp].fill(0.0);
            add_trans(rule, u_ipts, comp, &mut u[dn.start * comp..dn.end * comp]);
            self.solve_m(tent, fd, i, &mut u[dn.start * comp..dn.end * comp], comp, h);
        }
        Ok(())
    }

    /// Map tent values `u` to cylinder DOFs `uhat`:
    /// weak form of `u - F(u)·∇φ(t*)`, optionally mass-solved.
    #[allow(clippy::too_many_arguments)]
    pub fn tent2cyl(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        tstar: f64,
        u: &[f64],
        uhat: &mut [f64],
        solvemass: bool,
        h: &ScratchArena,
    ) -> Result<()> {
        let comp = E::COMP;
        let dim = E::DIM;
        uhat[..fd.nd * comp].fill(0.0);

        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];

            let u_ipts = h.alloc(comp * nqp);
            let flux = h.alloc(comp * dim * nqp);
            let res = h.alloc(comp * nqp);
            let gradphi = gradphi_at(h, &fd.agradphi_bot[i], &fd.agradphi_top[i], tstar);

            evaluate(rule, &u[dn.start * comp..dn.end * comp], comp, u_ipts);
            self.equation.flux(mir, u_ipts, flux);

            for l in 0..comp {
                for q in 0..rule.nq {
                    let wq = mir.weight[q];
                    let mut hsum = 0.0;
                    for k in 0..dim {
                        hsum += gradphi[k * nqp + q] * wq * flux[(k * comp + l) * nqp + q];
                    }
                    res[l * nqp + q] = u_ipts[l * nqp + q] * wq - hsum;
                }
            }

            add_trans(rule, res, comp, &mut uhat[dn.start * comp..dn.end * comp]);
            if solvemass {
                self.solve_m(tent, fd, i, &mut uhat[dn.start * comp..dn.end * comp], comp, h);
            }
        }
        Ok(())
    }

    /// Height-rate correction: `res = M^{-1} weak(F(u)·∇δ)` with
    /// `∇δ = ∇φ_top - ∇φ_bot`.
    pub fn apply_m1(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        _tstar: f64,
        u: &[f64],
        res: &mut [f64],
        h: &ScratchArena,
    ) -> Result<()> {
        let comp = E::COMP;
        let dim = E::DIM;
        res[..fd.nd * comp].fill(0.0);

        for i in 0..fd.n_els() {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let nqp = rule.nq_pad;
            let dn = &fd.ranges[i];

            let u_ipts = h.alloc(comp * nqp);
            let flux = h.alloc(comp * dim * nqp);
            let temp = h.alloc(comp * nqp);
            let graddelta = graddelta_of(h, &fd.agradphi_bot[i], &fd.agradphi_top[i]);

            evaluate(rule, &u[dn.start * comp..dn.end * comp], comp, u_ipts);
            self.equation.flux(mir, u_ipts, flux);

            for l in 0..comp {
                for q in 0..rule.nq {
                    let wq = mir.weight[q];
                    let mut hsum = 0.0;
                    for k in 0..dim {
                        hsum += graddelta[k * nqp + q] * wq * flux[(k * comp + l) * nqp + q];
                    }
                    temp[l * nqp + q] = hsum;
                }
            }

            add_trans(rule, temp, comp, &mut res[dn.start * comp..dn.end * comp]);
            self.solve_m(tent, fd, i, &mut res[dn.start * comp..dn.end * comp], comp, h);
        }
        Ok(())
    }
}
