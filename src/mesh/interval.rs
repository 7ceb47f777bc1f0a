//! 1-D interval mesh.
//!
//! A partition of [x_min, x_max] into affine segments. Facets are the
//! element endpoints; facet `f` sits at vertex `f`. On a periodic mesh the
//! two domain endpoints are the same vertex, so there are `n_elements`
//! vertices (and facets) and no boundary facets at all.

use smallvec::smallvec;

use super::{Adjacency, MeshAccess};
use crate::basis::{MappedRule, QRule};

/// Uniform 1-D mesh of an interval, optionally periodic.
#[derive(Clone, Debug)]
pub struct IntervalMesh {
    /// Left endpoint of the domain.
    pub x_min: f64,
    /// Right endpoint of the domain.
    pub x_max: f64,
    /// Number of elements.
    pub n_elements: usize,
    /// Vertex coordinates; `n_elements + 1` entries (the last one is the
    /// ghost image of vertex 0 on periodic meshes).
    pub vertices: Vec<f64>,
    /// Element sizes.
    pub element_sizes: Vec<f64>,
    /// Whether the endpoints are identified.
    pub is_periodic: bool,
}

impl IntervalMesh {
    /// Uniform mesh of [x_min, x_max] with `n_elements` elements.
    pub fn uniform(x_min: f64, x_max: f64, n_elements: usize) -> Self {
        Self::build(x_min, x_max, n_elements, false)
    }

    /// Uniform periodic mesh: the endpoints are the same vertex.
    pub fn uniform_periodic(x_min: f64, x_max: f64, n_elements: usize) -> Self {
        Self::build(x_min, x_max, n_elements, true)
    }

    fn build(x_min: f64, x_max: f64, n_elements: usize, periodic: bool) -> Self {
        assert!(n_elements > 0, "Need at least one element");
        assert!(x_max > x_min, "x_max must be greater than x_min");

        let h = (x_max - x_min) / n_elements as f64;
        let vertices: Vec<f64> = (0..=n_elements).map(|i| x_min + i as f64 * h).collect();
        let element_sizes = vec![h; n_elements];

        Self {
            x_min,
            x_max,
            n_elements,
            vertices,
            element_sizes,
            is_periodic: periodic,
        }
    }

    /// Left and right vertex of element `e` (canonical indices).
    fn el_verts(&self, e: usize) -> (usize, usize) {
        let right = if self.is_periodic {
            (e + 1) % self.n_elements
        } else {
            e + 1
        };
        (e, right)
    }

    /// Physical coordinate of reference point r in element `e`.
    pub fn reference_to_physical(&self, e: usize, r: f64) -> f64 {
        self.vertices[e] + (1.0 + r) * self.element_sizes[e] / 2.0
    }

    /// Minimum element size.
    pub fn h_min(&self) -> f64 {
        self.element_sizes
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// Coordinate of (canonical) vertex `v`.
    pub fn vertex_coord(&self, v: usize) -> f64 {
        self.vertices[v]
    }
}

impl MeshAccess for IntervalMesh {
    fn dim(&self) -> usize {
        1
    }

    fn n_elements(&self) -> usize {
        self.n_elements
    }

    fn n_vertices(&self) -> usize {
        if self.is_periodic {
            self.n_elements
        } else {
            self.n_elements + 1
        }
    }

    fn n_facets(&self) -> usize {
        self.n_vertices()
    }

    fn el_vertices(&self, e: usize) -> Adjacency {
        let (l, r) = self.el_verts(e);
        smallvec![l, r]
    }

    fn el_facets(&self, e: usize) -> Adjacency {
        // Facet f lives at vertex f.
        let (l, r) = self.el_verts(e);
        smallvec![l, r]
    }

    fn facet_vertices(&self, f: usize) -> Adjacency {
        smallvec![f]
    }

    fn facet_els(&self, f: usize) -> (usize, Option<usize>) {
        let n = self.n_elements;
        if self.is_periodic {
            ((f + n - 1) % n, Some(f % n))
        } else if f == 0 {
            (0, None)
        } else if f == n {
            (n - 1, None)
        } else {
            (f - 1, Some(f))
        }
    }

    fn vertex_els(&self, v: usize) -> Adjacency {
        let (e1, e2) = self.facet_els(v);
        match e2 {
            Some(e2) if e2 != e1 => smallvec![e1, e2],
            _ => smallvec![e1],
        }
    }

    fn vertex_nbs(&self, v: usize) -> Adjacency {
        let n = self.n_elements;
        if self.is_periodic {
            if n == 1 {
                return smallvec![];
            }
            let left = (v + n - 1) % n;
            let right = (v + 1) % n;
            if left == right {
                smallvec![left]
            } else {
                smallvec![left, right]
            }
        } else {
            let mut nbs = Adjacency::new();
            if v > 0 {
                nbs.push(v - 1);
            }
            if v < n {
                nbs.push(v + 1);
            }
            nbs
        }
    }

    fn vertex_dist(&self, v: usize, w: usize) -> f64 {
        // Neighbouring vertices share exactly one element; its size is the
        // edge length (robust against the periodic wrap).
        for e in self.vertex_els(v) {
            let (l, r) = self.el_verts(e);
            if l == w || r == w {
                return self.element_sizes[e];
            }
        }
        panic!("vertices {} and {} are not neighbours", v, w);
    }

    fn vertex_coords(&self, v: usize) -> Vec<f64> {
        vec![self.vertices[v]]
    }

    fn is_curved(&self, _e: usize) -> bool {
        false
    }

    fn el_measure(&self, e: usize) -> f64 {
        self.element_sizes[e]
    }

    fn local_facet(&self, e: usize, f: usize) -> usize {
        let (l, r) = self.el_verts(e);
        if f == l {
            0
        } else if f == r {
            1
        } else {
            panic!("facet {} not on element {}", f, e);
        }
    }

    fn el_linear_gradient(&self, e: usize, vals: &dyn Fn(usize) -> f64) -> Vec<f64> {
        let (l, r) = self.el_verts(e);
        vec![(vals(r) - vals(l)) / self.element_sizes[e]]
    }

    fn el_interpolate(
        &self,
        e: usize,
        vals: &dyn Fn(usize) -> f64,
        points: &[f64],
        nq: usize,
        out: &mut [f64],
    ) {
        let (l, r) = self.el_verts(e);
        let (vl, vr) = (vals(l), vals(r));
        for q in 0..nq {
            let s = 0.5 * (points[q] + 1.0);
            out[q] = vl + s * (vr - vl);
        }
    }

    fn boundary_facets(&self) -> Vec<(usize, usize)> {
        if self.is_periodic {
            Vec::new()
        } else {
            vec![(0, 0), (self.n_elements, 1)]
        }
    }

    fn map_rule(&self, e: usize, rule: &QRule) -> MappedRule {
        let h = self.element_sizes[e];
        let jac = h / 2.0;
        let nq = rule.nq;
        let nq_pad = rule.nq_pad;

        let mut points = vec![0.0; nq_pad];
        let mut weight = vec![0.0; nq_pad];
        let mut measure = vec![1.0; nq_pad];
        let mut jac_inv = vec![0.0; nq_pad];
        let mut jac_det = vec![1.0; nq_pad];
        for q in 0..nq {
            points[q] = self.reference_to_physical(e, rule.points[q]);
            weight[q] = rule.weights[q] * jac;
            measure[q] = jac;
            jac_inv[q] = 1.0 / jac;
            jac_det[q] = jac;
        }

        MappedRule {
            dim: 1,
            nq,
            nq_pad,
            points,
            weight,
            measure,
            jac_inv,
            jac_det,
        }
    }

    fn map_facet_rule(&self, e: usize, lf: usize, rule: &QRule) -> MappedRule {
        let h = self.element_sizes[e];
        let jac = h / 2.0;
        let nq = rule.nq;
        let nq_pad = rule.nq_pad;
        debug_assert_eq!(nq, 1, "1-D facets are points");

        let r = if lf == 0 { -1.0 } else { 1.0 };
        let mut points = vec![0.0; nq_pad];
        points[0] = self.reference_to_physical(e, r);

        // A point facet integrates with unit weight and unit measure; the
        // adjacent element's Jacobian rides along for penalty scales.
        let mut weight = vec![0.0; nq_pad];
        weight[0] = 1.0;
        let measure = vec![1.0; nq_pad];
        let mut jac_inv = vec![0.0; nq_pad];
        jac_inv[0] = 1.0 / jac;
        let mut jac_det = vec![1.0; nq_pad];
        jac_det[0] = jac;

        MappedRule {
            dim: 1,
            nq,
            nq_pad,
            points,
            weight,
            measure,
            jac_inv,
            jac_det,
        }
    }

    fn facet_normal(&self, _e: usize, lf: usize) -> Vec<f64> {
        if lf == 0 {
            vec![-1.0]
        } else {
            vec![1.0]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_mesh_counts() {
        let mesh = IntervalMesh::uniform(0.0, 1.0, 4);
        assert_eq!(mesh.n_elements(), 4);
        assert_eq!(mesh.n_vertices(), 5);
        assert_eq!(mesh.n_facets(), 5);
        assert!((mesh.h_min() - 0.25).abs() < 1e-14);
    }

    #[test]
    fn test_facet_adjacency() {
        let mesh = IntervalMesh::uniform(0.0, 1.0, 4);
        assert_eq!(mesh.facet_els(0), (0, None));
        assert_eq!(mesh.facet_els(2), (1, Some(2)));
        assert_eq!(mesh.facet_els(4), (3, None));
        assert_eq!(mesh.local_facet(1, 2), 1);
        assert_eq!(mesh.local_facet(2, 2), 0);
    }

    #[test]
    fn test_periodic_wraps() {
        let mesh = IntervalMesh::uniform_periodic(0.0, 1.0, 4);
        assert_eq!(mesh.n_vertices(), 4);
        assert_eq!(mesh.n_facets(), 4);
        assert_eq!(mesh.facet_els(0), (3, Some(0)));
        assert!(mesh.boundary_facets().is_empty());
        let nbs = mesh.vertex_nbs(0);
        assert!(nbs.contains(&3) && nbs.contains(&1));
        assert!((mesh.vertex_dist(0, 3) - 0.25).abs() < 1e-14);
    }

    #[test]
    fn test_vertex_patch() {
        let mesh = IntervalMesh::uniform(0.0, 1.0, 4);
        assert_eq!(mesh.vertex_els(0).as_slice(), &[0]);
        assert_eq!(mesh.vertex_els(2).as_slice(), &[1, 2]);
        assert_eq!(mesh.vertex_els(4).as_slice(), &[3]);
    }

    #[test]
    fn test_linear_gradient() {
        let mesh = IntervalMesh::uniform(0.0, 2.0, 4);
        // Vertex values 3x (+1) → gradient 3 on every element.
        let g = mesh.el_linear_gradient(2, &|v| 3.0 * mesh.vertex_coord(v) + 1.0);
        assert_eq!(g.len(), 1);
        assert!((g[0] - 3.0).abs() < 1e-13);
    }

    #[test]
    fn test_mapped_rule_geometry() {
        use crate::basis::{DgFiniteElement, SegmentElement};
        use crate::polynomial::GaussLobattoCatalog;

        let mesh = IntervalMesh::uniform(0.0, 2.0, 4);
        let cat = GaussLobattoCatalog::new();
        let el = SegmentElement::new(2, &cat);
        let mr = mesh.map_rule(1, el.vol_rule());

        // Weights integrate the element length.
        let total: f64 = mr.weight[..mr.nq].iter().sum();
        assert!((total - 0.5).abs() < 1e-13);
        // Points stay inside [0.5, 1.0].
        for q in 0..mr.nq {
            assert!(mr.points[q] >= 0.5 - 1e-13 && mr.points[q] <= 1.0 + 1e-13);
        }
        // Padded tail keeps measures positive.
        for q in mr.nq..mr.nq_pad {
            assert_eq!(mr.weight[q], 0.0);
            assert_eq!(mr.measure[q], 1.0);
        }
    }

    #[test]
    fn test_facet_normals_oppose() {
        let mesh = IntervalMesh::uniform(0.0, 1.0, 4);
        let n_right = mesh.facet_normal(1, 1);
        let n_left = mesh.facet_normal(2, 0);
        assert!((n_right[0] + n_left[0]).abs() < 1e-15);
    }
}
