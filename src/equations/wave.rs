//! First-order acoustic wave system: ∂_t p + ∂_x q = 0, ∂_t q + ∂_x p = 0.
//!
//! The linear system with unit wavespeed; the one equation that defines
//! the transparent (absorbing) boundary trace. Components are ordered
//! `(p, q)` with `q` the normal-direction velocity.

use crate::basis::MappedRule;
use crate::equation::{Equation, Scalar};
use crate::error::Result;

/// 1-D acoustic wave system with unit wavespeed.
#[derive(Clone, Debug, Default)]
pub struct Wave1D;

impl Wave1D {
    pub fn new() -> Self {
        Self
    }
}

impl Equation for Wave1D {
    const DIM: usize = 1;
    const COMP: usize = 2;
    const ECOMP: usize = 0;

    fn name(&self) -> &'static str {
        "wave"
    }

    fn flux(&self, mir: &MappedRule, u: &[f64], flux: &mut [f64]) {
        // F(p, q) = (q, p).
        let nqp = mir.nq_pad;
        for q in 0..nqp {
            flux[q] = u[nqp + q];
            flux[nqp + q] = u[q];
        }
    }

    fn num_flux(&self, mir: &MappedRule, ul: &[f64], ur: &[f64], normals: &[f64], fna: &mut [f64]) {
        // Characteristic (Lax-Friedrichs with λ = 1, exact upwind here):
        // F̂_p = ½(q_l + q_r)·n - ½(p_r - p_l)
        // F̂_q = ½(p_l + p_r)·n - ½(q_r - q_l)
        let nqp = mir.nq_pad;
        for q in 0..nqp {
            let n = normals[q];
            let (pl, vl) = (ul[q], ul[nqp + q]);
            let (pr, vr) = (ur[q], ur[nqp + q]);
            fna[q] = 0.5 * (vl + vr) * n - 0.5 * (pr - pl);
            fna[nqp + q] = 0.5 * (pl + pr) * n - 0.5 * (vr - vl);
        }
    }

    fn inverse_map<S: Scalar>(&self, mir: &MappedRule, gradphi: &[S], u: &mut [S]) {
        // (y_p, y_q) = (p - g q, q - g p); invert the 2×2 system, with
        // det = 1 - g² > 0 under the causality bound |g| < 1.
        let nqp = mir.nq_pad;
        for q in 0..nqp {
            let g = gradphi[q];
            let det = S::from_f64(1.0) - g * g;
            let yp = u[q];
            let yq = u[nqp + q];
            u[q] = (yp + g * yq) / det;
            u[nqp + q] = (yq + g * yp) / det;
        }
    }

    fn u_reflect(&self, mir: &MappedRule, u: &[f64], _normals: &[f64], out: &mut [f64]) {
        // Hard wall: mirror the normal velocity, keep the pressure.
        let nqp = mir.nq_pad;
        for q in 0..nqp {
            out[q] = u[q];
            out[nqp + q] = -u[nqp + q];
        }
    }

    fn u_transparent(
        &self,
        mir: &MappedRule,
        u: &[f64],
        normals: &[f64],
        out: &mut [f64],
    ) -> Result<()> {
        // Absorbing trace: keep the outgoing characteristic p + q·n,
        // zero the incoming one. The exterior state is
        // p = (p₁ + q₁·n)/2, q·n = (p₁ + q₁·n)/2.
        let nqp = mir.nq_pad;
        for q in 0..nqp {
            let n = normals[q];
            let w_out = 0.5 * (u[q] + u[nqp + q] * n);
            out[q] = w_out;
            out[nqp + q] = w_out * n;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::padded;
    use crate::equation::Dual;

    fn point_rule() -> MappedRule {
        let nq_pad = padded(1);
        MappedRule {
            dim: 1,
            nq: 1,
            nq_pad,
            points: vec![0.0; nq_pad],
            weight: vec![1.0, 0.0, 0.0, 0.0],
            measure: vec![1.0; nq_pad],
            jac_inv: vec![1.0; nq_pad],
            jac_det: vec![1.0; nq_pad],
        }
    }

    fn state(p: f64, q: f64) -> Vec<f64> {
        let mut u = vec![0.0; 8];
        u[0] = p;
        u[4] = q;
        u
    }

    #[test]
    fn test_num_flux_consistency() {
        let eq = Wave1D::new();
        let mir = point_rule();
        let u = state(1.2, -0.4);
        let n = vec![1.0, 0.0, 0.0, 0.0];
        let mut f = vec![0.0; 8];
        eq.num_flux(&mir, &u, &u, &n, &mut f);
        assert!((f[0] - (-0.4)).abs() < 1e-14); // F_p = q·n
        assert!((f[4] - 1.2).abs() < 1e-14); // F_q = p·n
    }

    #[test]
    fn test_wall_reflection_kills_pressure_flux() {
        // With the reflected exterior trace, the numerical flux of the
        // pressure equation (the mass-like component) vanishes: no flow
        // through the wall.
        let eq = Wave1D::new();
        let mir = point_rule();
        let u1 = state(0.9, 0.35);
        let n = vec![1.0, 0.0, 0.0, 0.0];
        let mut u2 = vec![0.0; 8];
        eq.u_reflect(&mir, &u1, &n, &mut u2);
        assert!((u2[0] - 0.9).abs() < 1e-14);
        assert!((u2[4] + 0.35).abs() < 1e-14);

        let mut f = vec![0.0; 8];
        eq.num_flux(&mir, &u1, &u2, &n, &mut f);
        assert!(f[0].abs() < 1e-14, "pressure flux through wall: {}", f[0]);
    }

    #[test]
    fn test_transparent_absorbs_incoming() {
        // For a purely outgoing wave (p = q·n) the transparent trace equals
        // the interior trace; the boundary is invisible.
        let eq = Wave1D::new();
        let mir = point_rule();
        let n = vec![1.0, 0.0, 0.0, 0.0];
        let u1 = state(0.6, 0.6);
        let mut u2 = vec![0.0; 8];
        eq.u_transparent(&mir, &u1, &n, &mut u2).unwrap();
        assert!((u2[0] - 0.6).abs() < 1e-14);
        assert!((u2[4] - 0.6).abs() < 1e-14);

        // For a purely incoming wave the exterior trace is silent.
        let u1 = state(0.6, -0.6);
        eq.u_transparent(&mir, &u1, &n, &mut u2).unwrap();
        assert!(u2[0].abs() < 1e-14);
        assert!(u2[4].abs() < 1e-14);
    }

    #[test]
    fn test_inverse_map_roundtrip_dual() {
        let eq = Wave1D::new();
        let mir = point_rule();
        let (p, q, g) = (0.8, -0.3, 0.4);
        // forward: y = (p - g q, q - g p)
        let mut u = vec![Dual::constant(0.0); 8];
        u[0] = Dual::new(p - g * q, 0.0);
        u[4] = Dual::new(q - g * p, 0.0);
        let gv = vec![Dual::constant(g); 4];
        eq.inverse_map(&mir, &gv, &mut u);
        assert!((u[0].v - p).abs() < 1e-13);
        assert!((u[4].v - q).abs() < 1e-13);
    }
}
