//! DG finite-element basis: quadrature-rule tables and evaluation kernels.
//!
//! A [`QRule`] bundles an integration rule with the basis (and reference-
//! gradient) values tabulated at its points, stored in SIMD-lane layout:
//! every per-point array is padded to a multiple of [`SIMD_LANES`] and the
//! padded tail rows are zero, so transpose-accumulations can run over the
//! full padded width without branching.
//!
//! A [`MappedRule`] carries the geometric factors of a rule pushed onto a
//! mesh element (physical points, `w·|J|` weights, measures, inverse
//! Jacobians). Evaluation, gradient evaluation, and their transposes are
//! free functions over flat row-major slices — the same shape the tent
//! kernels allocate from the scratch arena.

mod segment;
mod space;

pub use segment::SegmentElement;
pub use space::DgSpace;

/// Logical SIMD width for quadrature-point storage.
///
/// Four f64 lanes (one AVX2 register); the `simd` feature's pulp kernels
/// process the padded arrays in hardware-sized chunks regardless.
pub const SIMD_LANES: usize = 4;

/// Round a point count up to a multiple of the lane width.
pub fn padded(nq: usize) -> usize {
    nq.div_ceil(SIMD_LANES) * SIMD_LANES
}

/// Integration rule plus tabulated basis values.
#[derive(Clone, Debug)]
pub struct QRule {
    /// Spatial dimension of the reference element.
    pub dim: usize,
    /// Number of basis functions tabulated.
    pub ndof: usize,
    /// Logical number of integration points.
    pub nq: usize,
    /// Padded point count (multiple of [`SIMD_LANES`]).
    pub nq_pad: usize,
    /// Reference coordinates, `dim × nq_pad` row-major.
    pub points: Vec<f64>,
    /// Reference weights, length `nq_pad`, zero tail.
    pub weights: Vec<f64>,
    /// Basis values `φ_d(r_q)`, `ndof × nq_pad` row-major, zero tail.
    pub basis: Vec<f64>,
    /// Reference gradients `∂φ_d/∂r_l`, rows `d*dim + l`, zero tail.
    pub dbasis: Vec<f64>,
}

/// Geometric factors of a rule mapped onto a mesh element or facet.
#[derive(Clone, Debug)]
pub struct MappedRule {
    pub dim: usize,
    pub nq: usize,
    pub nq_pad: usize,
    /// Physical coordinates, `dim × nq_pad`.
    pub points: Vec<f64>,
    /// Integration weight times measure, `w_q · |J|_q`, zero tail.
    pub weight: Vec<f64>,
    /// Measure `|J|_q`; tail entries are 1 so divisions stay finite.
    pub measure: Vec<f64>,
    /// Inverse Jacobian, rows `l*dim + k` = `∂r_l/∂x_k`; tail entries 0.
    pub jac_inv: Vec<f64>,
    /// Volume-element Jacobian determinant at the points (facet rules carry
    /// the adjacent element's value for penalty length scales); tail 1.
    pub jac_det: Vec<f64>,
}

/// Evaluate coefficients at the rule points.
///
/// `coeffs` is `ndof × w` row-major, `vals` is `w × nq_pad` row-major.
pub fn evaluate(rule: &QRule, coeffs: &[f64], w: usize, vals: &mut [f64]) {
    let nq = rule.nq_pad;
    debug_assert!(coeffs.len() >= rule.ndof * w);
    debug_assert!(vals.len() >= w * nq);
    for row in vals[..w * nq].iter_mut() {
        *row = 0.0;
    }
    for d in 0..rule.ndof {
        let b = &rule.basis[d * nq..(d + 1) * nq];
        for c in 0..w {
            let uc = coeffs[d * w + c];
            if uc == 0.0 {
                continue;
            }
            let out = &mut vals[c * nq..(c + 1) * nq];
            crate::simd::axpy(uc, b, out);
        }
    }
}

/// Transpose of [`evaluate`]: accumulate `coeffs[d][c] += Σ_q φ_d(q) vals[c][q]`.
pub fn add_trans(rule: &QRule, vals: &[f64], w: usize, coeffs: &mut [f64]) {
    let nq = rule.nq_pad;
    debug_assert!(coeffs.len() >= rule.ndof * w);
    for d in 0..rule.ndof {
        let b = &rule.basis[d * nq..(d + 1) * nq];
        for c in 0..w {
            let v = &vals[c * nq..(c + 1) * nq];
            coeffs[d * w + c] += crate::simd::dot(b, v);
        }
    }
}

/// Physical gradient of one solution component at the mapped points.
///
/// `grads` receives `dim × nq_pad`: `grads[k][q] = ∂_{x_k} u_comp(q)`.
pub fn evaluate_grad(
    rule: &QRule,
    mr: &MappedRule,
    coeffs: &[f64],
    w: usize,
    comp: usize,
    grads: &mut [f64],
) {
    let nq = rule.nq_pad;
    let dim = rule.dim;
    for g in grads[..dim * nq].iter_mut() {
        *g = 0.0;
    }
    // Reference-gradient contraction first, then push through J^{-1}.
    for d in 0..rule.ndof {
        let uc = coeffs[d * w + comp];
        if uc == 0.0 {
            continue;
        }
        for l in 0..dim {
            let db = &rule.dbasis[(d * dim + l) * nq..(d * dim + l + 1) * nq];
            for k in 0..dim {
                let jinv = &mr.jac_inv[(l * dim + k) * nq..(l * dim + k + 1) * nq];
                let out = &mut grads[k * nq..(k + 1) * nq];
                for q in 0..nq {
                    out[q] += uc * db[q] * jinv[q];
                }
            }
        }
    }
}

/// Transpose of [`evaluate_grad`] for one component:
/// `coeffs[d][comp] += Σ_q Σ_k ∂_{x_k} φ_d(q) · grads[k][q]`.
pub fn add_grad_trans(
    rule: &QRule,
    mr: &MappedRule,
    grads: &[f64],
    w: usize,
    comp: usize,
    coeffs: &mut [f64],
) {
    let nq = rule.nq_pad;
    let dim = rule.dim;
    for d in 0..rule.ndof {
        let mut acc = 0.0;
        for l in 0..dim {
            let db = &rule.dbasis[(d * dim + l) * nq..(d * dim + l + 1) * nq];
            for k in 0..dim {
                let jinv = &mr.jac_inv[(l * dim + k) * nq..(l * dim + k + 1) * nq];
                let g = &grads[k * nq..(k + 1) * nq];
                for q in 0..nq {
                    acc += db[q] * jinv[q] * g[q];
                }
            }
        }
        coeffs[d * w + comp] += acc;
    }
}

/// Multi-component gradient transpose.
///
/// `vals` holds `w·dim` rows, row `i*dim + k` being the direction-`k`
/// integrand of component `i`; accumulates into `coeffs` (`ndof × w`).
pub fn add_grad_trans_multi(
    rule: &QRule,
    mr: &MappedRule,
    vals: &[f64],
    w: usize,
    coeffs: &mut [f64],
) {
    let nq = rule.nq_pad;
    let dim = rule.dim;
    for i in 0..w {
        let rows = &vals[i * dim * nq..(i + 1) * dim * nq];
        add_grad_trans(rule, mr, rows, w, i, coeffs);
    }
}

/// Finite element consumed by the tent kernels.
///
/// Mirrors the `DGFiniteElement` surface the propagation code needs:
/// DOF count, polynomial order, the diagonal reference mass matrix, and
/// the tabulated volume/facet rules.
pub trait DgFiniteElement: Send + Sync {
    fn ndof(&self) -> usize;
    fn order(&self) -> usize;
    /// Diagonal of the reference-element mass matrix (length `ndof`).
    fn diag_mass(&self, out: &mut [f64]);
    /// Volume integration rule with tabulated basis.
    fn vol_rule(&self) -> &QRule;
    /// Facet rule for the local facet `lf`, tabulated in this element's
    /// reference coordinates.
    fn facet_rule(&self, lf: usize) -> &QRule;
    /// Number of local facets.
    fn n_facets(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::GaussLobattoCatalog;

    fn unit_mapped(rule: &QRule) -> MappedRule {
        // Identity geometry: |J| = 1, J^{-1} = I.
        let nq = rule.nq_pad;
        let mut weight = vec![0.0; nq];
        weight[..rule.nq].copy_from_slice(&rule.weights[..rule.nq]);
        MappedRule {
            dim: rule.dim,
            nq: rule.nq,
            nq_pad: nq,
            points: rule.points.clone(),
            weight,
            measure: vec![1.0; nq],
            jac_inv: vec![1.0; nq],
            jac_det: vec![1.0; nq],
        }
    }

    #[test]
    fn test_evaluate_constant() {
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(3, &cat);
        let rule = el.vol_rule();
        // u ≡ 1 is carried by the constant mode alone: φ_0 = 1/√2, so the
        // coefficient is √2.
        let mut coeffs = vec![0.0; el.ndof()];
        coeffs[0] = 2.0f64.sqrt();
        let mut vals = vec![0.0; rule.nq_pad];
        evaluate(rule, &coeffs, 1, &mut vals);
        for q in 0..rule.nq {
            assert!((vals[q] - 1.0).abs() < 1e-13, "q={}: {}", q, vals[q]);
        }
        // Padded tail stays zero because basis tails are zero.
        for q in rule.nq..rule.nq_pad {
            assert_eq!(vals[q], 0.0);
        }
    }

    #[test]
    fn test_add_trans_is_weighted_projection() {
        // With an orthonormal basis and exact quadrature,
        // add_trans(w ∘ evaluate(coeffs)) reproduces coeffs.
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(4, &cat);
        let rule = el.vol_rule();
        let coeffs: Vec<f64> = (0..el.ndof()).map(|d| 0.3 + 0.7 * d as f64).collect();
        let mut vals = vec![0.0; rule.nq_pad];
        evaluate(rule, &coeffs, 1, &mut vals);
        for q in 0..rule.nq {
            vals[q] *= rule.weights[q];
        }
        let mut out = vec![0.0; el.ndof()];
        add_trans(rule, &vals, 1, &mut out);
        for d in 0..el.ndof() {
            assert!(
                (out[d] - coeffs[d]).abs() < 1e-12,
                "d={}: {} vs {}",
                d,
                out[d],
                coeffs[d]
            );
        }
    }

    #[test]
    fn test_evaluate_grad_linear() {
        // u(r) = r has gradient 1 under identity geometry.
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(2, &cat);
        let rule = el.vol_rule();
        let mr = unit_mapped(rule);
        // r = √(2/3)·φ_1 since φ_1(r) = √(3/2)·r.
        let mut coeffs = vec![0.0; el.ndof()];
        coeffs[1] = (2.0f64 / 3.0).sqrt();
        let mut grads = vec![0.0; rule.nq_pad];
        evaluate_grad(rule, &mr, &coeffs, 1, 0, &mut grads);
        for q in 0..rule.nq {
            assert!((grads[q] - 1.0).abs() < 1e-13);
        }
    }

    #[test]
    fn test_grad_trans_adjoint() {
        // <evaluate_grad(u), g> == <u, add_grad_trans(g)> for any u, g.
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(3, &cat);
        let rule = el.vol_rule();
        let mr = unit_mapped(rule);
        let nd = el.ndof();
        let u: Vec<f64> = (0..nd).map(|d| (d as f64 + 1.0).sin()).collect();
        let g: Vec<f64> = (0..rule.nq_pad)
            .map(|q| if q < rule.nq { (q as f64).cos() } else { 0.0 })
            .collect();

        let mut gu = vec![0.0; rule.nq_pad];
        evaluate_grad(rule, &mr, &u, 1, 0, &mut gu);
        let lhs: f64 = (0..rule.nq).map(|q| gu[q] * g[q]).sum();

        let mut gt = vec![0.0; nd];
        add_grad_trans(rule, &mr, &g, 1, 0, &mut gt);
        let rhs: f64 = (0..nd).map(|d| gt[d] * u[d]).sum();

        assert!((lhs - rhs).abs() < 1e-12, "{} vs {}", lhs, rhs);
    }
}
