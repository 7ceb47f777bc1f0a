//! Lagrange collocation tables on Gauss-Lobatto nodes mapped to [0, 1].
//!
//! The Picard tent solver advances `ŷ_j = ŷ_0 + Σ_k I[j][k] f_k` where `I`
//! integrates the Lagrange cardinal functions of the collocation nodes, and
//! differentiates the collocation values to obtain `∂_τ û` for the entropy
//! residual. Both tables are built by expanding the cardinal functions in
//! the orthonormal Legendre basis: the nodal-to-modal map is the inverse
//! Vandermonde matrix, integrals come from the Legendre antiderivative, and
//! derivatives from P'_m.

use faer::linalg::solvers::Solve;
use faer::Mat;

use super::catalog::GaussLobattoRule;
use super::legendre::{legendre, legendre_antiderivative, legendre_derivative};

/// Collocation tables for one Gauss-Lobatto rule on [0, 1].
#[derive(Clone, Debug)]
pub struct CollocationTable {
    /// Number of collocation nodes.
    pub n: usize,
    /// Nodes τ_j in [0, 1]; τ_0 = 0 and τ_{n-1} = 1.
    pub nodes: Vec<f64>,
    /// Integration matrix, row-major: I[j*n + k] = ∫_0^{τ_j} ℓ_k(τ) dτ.
    pub integrate: Vec<f64>,
    /// Differentiation matrix, row-major: D[j*n + k] = ℓ'_k(τ_j).
    pub differentiate: Vec<f64>,
}

impl CollocationTable {
    /// Build the tables for the given Gauss-Lobatto rule.
    pub fn new(rule: &GaussLobattoRule) -> Self {
        let n = rule.npoints;
        let xs = &rule.nodes; // on [-1, 1]

        // Vandermonde of the orthonormal Legendre basis at the nodes.
        let mut v = Mat::zeros(n, n);
        for (i, &x) in xs.iter().enumerate() {
            for m in 0..n {
                let norm = ((2 * m + 1) as f64 / 2.0).sqrt();
                v[(i, m)] = norm * legendre(m, x);
            }
        }

        // Modal coefficients of the cardinal functions: column k of V^{-1}.
        let lu = v.as_ref().full_piv_lu();
        let mut c = Mat::zeros(n, n);
        for k in 0..n {
            let mut rhs = Mat::zeros(n, 1);
            rhs[(k, 0)] = 1.0;
            let col = lu.solve(&rhs);
            for m in 0..n {
                c[(m, k)] = col[(m, 0)];
            }
        }

        // ∫_0^{τ_j} ℓ_k dτ = 1/2 ∫_{-1}^{x_j} ℓ_k dx (chain rule τ = (x+1)/2);
        // ℓ'_k(τ_j) = 2 ℓ'_k(x_j).
        let mut integrate = vec![0.0; n * n];
        let mut differentiate = vec![0.0; n * n];
        for (j, &x) in xs.iter().enumerate() {
            for k in 0..n {
                let mut int = 0.0;
                let mut diff = 0.0;
                for m in 0..n {
                    let norm = ((2 * m + 1) as f64 / 2.0).sqrt();
                    int += c[(m, k)] * norm * legendre_antiderivative(m, x);
                    diff += c[(m, k)] * norm * legendre_derivative(m, x);
                }
                integrate[j * n + k] = 0.5 * int;
                differentiate[j * n + k] = 2.0 * diff;
            }
        }

        Self {
            n,
            nodes: rule.unit_nodes(),
            integrate,
            differentiate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::GaussLobattoCatalog;

    #[test]
    fn test_first_row_is_zero() {
        // τ_0 = 0, so the first integration row must vanish.
        let cat = GaussLobattoCatalog::new();
        let tab = CollocationTable::new(cat.rule(5));
        for k in 0..tab.n {
            assert!(tab.integrate[k].abs() < 1e-13);
        }
    }

    #[test]
    fn test_last_row_matches_unit_weights() {
        // ∫_0^1 ℓ_k = w_k (the rule's own weights on [0, 1]).
        let cat = GaussLobattoCatalog::new();
        let rule = cat.rule(6);
        let tab = CollocationTable::new(rule);
        let w = rule.unit_weights();
        let last = &tab.integrate[(tab.n - 1) * tab.n..];
        for k in 0..tab.n {
            assert!(
                (last[k] - w[k]).abs() < 1e-12,
                "k={}: {} vs {}",
                k,
                last[k],
                w[k]
            );
        }
    }

    #[test]
    fn test_integrates_polynomials_exactly() {
        // For g(τ) = τ^d with d < n, Σ_k I[j][k] g(τ_k) = τ_j^{d+1}/(d+1).
        let cat = GaussLobattoCatalog::new();
        let tab = CollocationTable::new(cat.rule(5));
        let n = tab.n;
        for d in 0..n {
            let g: Vec<f64> = tab.nodes.iter().map(|&t| t.powi(d as i32)).collect();
            for j in 0..n {
                let approx: f64 = (0..n).map(|k| tab.integrate[j * n + k] * g[k]).sum();
                let exact = tab.nodes[j].powi(d as i32 + 1) / (d as f64 + 1.0);
                assert!(
                    (approx - exact).abs() < 1e-12,
                    "d={} j={}: {} vs {}",
                    d,
                    j,
                    approx,
                    exact
                );
            }
        }
    }

    #[test]
    fn test_differentiates_polynomials_exactly() {
        let cat = GaussLobattoCatalog::new();
        let tab = CollocationTable::new(cat.rule(5));
        let n = tab.n;
        for d in 1..n {
            let g: Vec<f64> = tab.nodes.iter().map(|&t| t.powi(d as i32)).collect();
            for j in 0..n {
                let approx: f64 = (0..n).map(|k| tab.differentiate[j * n + k] * g[k]).sum();
                let exact = d as f64 * tab.nodes[j].powi(d as i32 - 1);
                assert!(
                    (approx - exact).abs() < 1e-10,
                    "d={} j={}: {} vs {}",
                    d,
                    j,
                    approx,
                    exact
                );
            }
        }
    }
}
