//! Modal DG segment element.
//!
//! Basis: orthonormal Legendre polynomials φ_d(r) = √((2d+1)/2) · P_d(r) on
//! the reference segment [-1, 1]. The reference mass matrix is exactly the
//! identity, so the lumped-diagonal mass solve is exact on straight
//! elements and the two-pass projection handles everything else.

use super::{padded, DgFiniteElement, QRule};
use crate::polynomial::{legendre, legendre_derivative, GaussLobattoCatalog};

/// Orthonormal-Legendre DG element on the reference segment.
#[derive(Clone, Debug)]
pub struct SegmentElement {
    order: usize,
    ndof: usize,
    vol_rule: QRule,
    facet_rules: [QRule; 2],
}

fn tabulate(ndof: usize, points: &[f64], weights: &[f64]) -> QRule {
    let nq = points.len();
    let nq_pad = padded(nq);

    let mut pts = vec![0.0; nq_pad];
    pts[..nq].copy_from_slice(points);
    let mut w = vec![0.0; nq_pad];
    w[..nq].copy_from_slice(weights);

    let mut basis = vec![0.0; ndof * nq_pad];
    let mut dbasis = vec![0.0; ndof * nq_pad];
    for d in 0..ndof {
        let norm = ((2 * d + 1) as f64 / 2.0).sqrt();
        for (q, &r) in points.iter().enumerate() {
            basis[d * nq_pad + q] = norm * legendre(d, r);
            dbasis[d * nq_pad + q] = norm * legendre_derivative(d, r);
        }
    }

    QRule {
        dim: 1,
        ndof,
        nq,
        nq_pad,
        points: pts,
        weights: w,
        basis,
        dbasis,
    }
}

impl SegmentElement {
    /// Element of polynomial order `order`; the volume rule is the catalog's
    /// Gauss-Lobatto rule with `order + 2` points (exact for the degree-2p
    /// mass integrand).
    pub fn new(order: usize, catalog: &GaussLobattoCatalog) -> Self {
        let ndof = order + 1;
        let rule = catalog.rule(order + 2);
        let vol_rule = tabulate(ndof, &rule.nodes, &rule.weights);

        // Facets of a segment are its endpoints: a single point with unit
        // weight, local facet 0 at r = -1 and local facet 1 at r = +1.
        let left = tabulate(ndof, &[-1.0], &[1.0]);
        let right = tabulate(ndof, &[1.0], &[1.0]);

        Self {
            order,
            ndof,
            vol_rule,
            facet_rules: [left, right],
        }
    }
}

impl DgFiniteElement for SegmentElement {
    fn ndof(&self) -> usize {
        self.ndof
    }

    fn order(&self) -> usize {
        self.order
    }

    fn diag_mass(&self, out: &mut [f64]) {
        // Orthonormal basis: reference mass is the identity.
        out[..self.ndof].fill(1.0);
    }

    fn vol_rule(&self) -> &QRule {
        &self.vol_rule
    }

    fn facet_rule(&self, lf: usize) -> &QRule {
        &self.facet_rules[lf]
    }

    fn n_facets(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_mass_is_identity() {
        // Quadrature of φ_i φ_j over the volume rule must be δ_ij.
        let cat = GaussLobattoCatalog::new();
        for order in 0..=5 {
            let el = SegmentElement::new(order, &cat);
            let r = el.vol_rule();
            for i in 0..el.ndof() {
                for j in 0..el.ndof() {
                    let mut m = 0.0;
                    for q in 0..r.nq {
                        m += r.weights[q] * r.basis[i * r.nq_pad + q] * r.basis[j * r.nq_pad + q];
                    }
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!(
                        (m - expected).abs() < 1e-12,
                        "order {} ({},{}) = {}",
                        order,
                        i,
                        j,
                        m
                    );
                }
            }
        }
    }

    #[test]
    fn test_facet_rules_are_endpoint_traces() {
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(3, &cat);
        let left = el.facet_rule(0);
        let right = el.facet_rule(1);
        assert_eq!(left.nq, 1);
        // φ_d(-1) = ±norm, φ_d(+1) = norm.
        for d in 0..el.ndof() {
            let norm = ((2 * d + 1) as f64 / 2.0).sqrt();
            let sign = if d % 2 == 0 { 1.0 } else { -1.0 };
            assert!((left.basis[d * left.nq_pad] - sign * norm).abs() < 1e-13);
            assert!((right.basis[d * right.nq_pad] - norm).abs() < 1e-13);
        }
    }

    #[test]
    fn test_padded_tail_is_zero() {
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(4, &cat);
        let r = el.vol_rule();
        for d in 0..el.ndof() {
            for q in r.nq..r.nq_pad {
                assert_eq!(r.basis[d * r.nq_pad + q], 0.0);
                assert_eq!(r.dbasis[d * r.nq_pad + q], 0.0);
                assert_eq!(r.weights[q], 0.0);
            }
        }
    }
}
