//! Gauss-Lobatto-Legendre nodes and weights.
//!
//! The N+1 Gauss-Lobatto-Legendre (GLL) nodes are the roots of (1-x²)P'_N(x),
//! which include the endpoints x = ±1. Endpoint membership is what makes the
//! rules usable both for element quadrature and for collocation in tent
//! pseudotime, where the solution at τ = 0 and τ = 1 must sit on a node.

use super::legendre::{legendre, legendre_and_derivative};
use std::f64::consts::PI;

/// Compute Gauss-Lobatto-Legendre nodes for polynomial order N.
///
/// Returns N+1 nodes in [-1, 1], including the endpoints.
/// Uses Newton iteration starting from Chebyshev-Lobatto nodes.
pub fn gauss_lobatto_nodes(order: usize) -> Vec<f64> {
    let n = order;

    if n == 0 {
        return vec![0.0];
    }
    if n == 1 {
        return vec![-1.0, 1.0];
    }

    // Initial guess: Chebyshev-Lobatto nodes x_j = -cos(π j / N).
    let mut nodes: Vec<f64> = (0..=n).map(|j| -(PI * j as f64 / n as f64).cos()).collect();

    // Endpoints are exact.
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    // Newton iteration for the interior nodes: zeros of L_N(x) = (1-x²)P'_N(x).
    // Using P''_N = (n(n+1) P_N - 2x P'_N)/(x² - 1) one gets L'_N = -n(n+1) P_N,
    // so the update is x += (1-x²) P'_N / (n(n+1) P_N).
    for node in nodes.iter_mut().take(n).skip(1) {
        let mut x = *node;

        for _ in 0..100 {
            let (p_n, dp_n) = legendre_and_derivative(n, x);
            let update = (1.0 - x * x) * dp_n / (n as f64 * (n + 1) as f64 * p_n);
            if update.abs() < 1e-15 {
                break;
            }
            x += update;
        }

        *node = x;
    }

    nodes
}

/// Compute Gauss-Lobatto-Legendre weights: w_j = 2 / (N(N+1) [P_N(x_j)]²).
pub fn gauss_lobatto_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    let n = order;

    if n == 0 {
        return vec![2.0];
    }

    let denom = (n * (n + 1)) as f64;

    nodes
        .iter()
        .map(|&x| {
            let p_n = legendre(n, x);
            2.0 / (denom * p_n * p_n)
        })
        .collect()
}
