//! Precomputed Gauss-Lobatto rule catalog.
//!
//! The solver needs the same small family of rules over and over: once per
//! element for spatial quadrature and once per tent solver for collocation
//! in pseudotime. They are computed eagerly at startup and served by point
//! count, mirroring the rule table the propagation driver keeps.

use super::nodes::{gauss_lobatto_nodes, gauss_lobatto_weights};

/// Smallest rule in the catalog (2 points: the endpoints).
pub const MIN_RULE_POINTS: usize = 2;
/// Largest rule in the catalog.
pub const MAX_RULE_POINTS: usize = 7;

/// A single Gauss-Lobatto rule on [-1, 1].
#[derive(Clone, Debug)]
pub struct GaussLobattoRule {
    /// Number of quadrature points (= polynomial order + 1).
    pub npoints: usize,
    /// Nodes in [-1, 1], endpoints included.
    pub nodes: Vec<f64>,
    /// Weights summing to 2.
    pub weights: Vec<f64>,
}

impl GaussLobattoRule {
    fn with_points(npoints: usize) -> Self {
        let order = npoints - 1;
        let nodes = gauss_lobatto_nodes(order);
        let weights = gauss_lobatto_weights(order, &nodes);
        Self {
            npoints,
            nodes,
            weights,
        }
    }

    /// Degree of polynomial exactness: 2n - 3 for an n-point rule.
    pub fn exactness(&self) -> usize {
        2 * self.npoints - 3
    }

    /// Nodes mapped to [0, 1] (used for the pseudotime axis).
    pub fn unit_nodes(&self) -> Vec<f64> {
        self.nodes.iter().map(|&x| 0.5 * (x + 1.0)).collect()
    }

    /// Weights scaled to integrate over [0, 1].
    pub fn unit_weights(&self) -> Vec<f64> {
        self.weights.iter().map(|&w| 0.5 * w).collect()
    }
}

/// Catalog of Gauss-Lobatto rules with 2..=7 points.
#[derive(Clone, Debug)]
pub struct GaussLobattoCatalog {
    rules: Vec<GaussLobattoRule>,
}

impl GaussLobattoCatalog {
    pub fn new() -> Self {
        let rules = (MIN_RULE_POINTS..=MAX_RULE_POINTS)
            .map(GaussLobattoRule::with_points)
            .collect();
        Self { rules }
    }

    /// Rule with exactly `npoints` points. Requests outside the catalog are
    /// clamped; every supported spatial order maps inside it.
    pub fn rule(&self, npoints: usize) -> &GaussLobattoRule {
        let n = npoints.clamp(MIN_RULE_POINTS, MAX_RULE_POINTS);
        &self.rules[n - MIN_RULE_POINTS]
    }

    /// Smallest catalog rule that integrates degree `deg` exactly.
    pub fn rule_for_degree(&self, deg: usize) -> &GaussLobattoRule {
        let npoints = (deg + 3).div_ceil(2);
        self.rule(npoints)
    }
}

impl Default for GaussLobattoCatalog {
    fn default() -> Self {
        Self::new()
    }
}
