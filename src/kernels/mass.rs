//! Per-element DG mass solve.
//!
//! The DG mass matrix is block-diagonal per element. On straight elements
//! the reference diagonal times the element measure is the exact block, so
//! the solve is a row scaling. On curved elements (and for the δ-weighted
//! variant) a two-pass projection recovers the exact inverse against the
//! non-constant Jacobian: scale by the lumped diagonal, evaluate at the
//! volume rule, reweight pointwise, transpose back, scale again.

use crate::arena::ScratchArena;
use crate::basis::{add_trans, evaluate, DgFiniteElement};
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::tent::Tent;

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Overwrite `mat` (shape `ndof × w` of element `i`) with `M^{-1} mat`.
    pub fn solve_m(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        i: usize,
        mat: &mut [f64],
        w: usize,
        h: &ScratchArena,
    ) {
        let fel = fd.fei[i];
        let nd = fel.ndof();
        let diagmass = h.alloc(nd);
        fel.diag_mass(diagmass);

        if self.mesh.is_curved(tent.els[i]) {
            let rule = fd.iri[i];
            let mir = &fd.miri[i];
            let pntvals = h.alloc(w * rule.nq_pad);

            for d in 0..nd {
                let inv = 1.0 / diagmass[d];
                for c in 0..w {
                    mat[d * w + c] *= inv;
                }
            }
            evaluate(rule, mat, w, pntvals);
            for c in 0..w {
                let row = &mut pntvals[c * rule.nq_pad..(c + 1) * rule.nq_pad];
                for q in 0..rule.nq {
                    row[q] *= rule.weights[q] / mir.measure[q];
                }
            }
            mat[..nd * w].fill(0.0);
            add_trans(rule, pntvals, w, mat);
            for d in 0..nd {
                let inv = 1.0 / diagmass[d];
                for c in 0..w {
                    mat[d * w + c] *= inv;
                }
            }
        } else {
            // Straight element: the block is diag · measure.
            let measure = fd.miri[i].measure[0];
            for d in 0..nd {
                let inv = 1.0 / (diagmass[d] * measure);
                for c in 0..w {
                    mat[d * w + c] *= inv;
                }
            }
        }
    }

    /// δ-weighted variant: overwrite `mat` with `M_δ^{-1} mat`, the inverse
    /// of the mass matrix weighted by `1/δ` at the quadrature points.
    pub fn solve_m_delta(
        &self,
        fd: &TentFeData,
        i: usize,
        delta: &[f64],
        mat: &mut [f64],
        w: usize,
        h: &ScratchArena,
    ) {
        let fel = fd.fei[i];
        let nd = fel.ndof();
        let rule = fd.iri[i];
        let mir = &fd.miri[i];

        let diagmass = h.alloc(nd);
        fel.diag_mass(diagmass);
        let pntvals = h.alloc(w * rule.nq_pad);

        for d in 0..nd {
            let inv = 1.0 / diagmass[d];
            for c in 0..w {
                mat[d * w + c] *= inv;
            }
        }
        evaluate(rule, mat, w, pntvals);
        for c in 0..w {
            let row = &mut pntvals[c * rule.nq_pad..(c + 1) * rule.nq_pad];
            for q in 0..rule.nq {
                row[q] *= rule.weights[q] * delta[q] / mir.measure[q];
            }
        }
        mat[..nd * w].fill(0.0);
        add_trans(rule, pntvals, w, mat);
        for d in 0..nd {
            let inv = 1.0 / diagmass[d];
            for c in 0..w {
                mat[d * w + c] *= inv;
            }
        }
    }
}
