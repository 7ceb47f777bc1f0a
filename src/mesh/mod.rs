//! Mesh collaborator interface.
//!
//! The tent machinery consumes mesh topology and geometry through
//! [`MeshAccess`]: adjacency queries for building vertex patches and the
//! dependency DAG, and mapping of integration rules onto elements and
//! facets. The crate ships [`IntervalMesh`], a 1-D uniform interval mesh
//! (optionally periodic); higher-dimensional meshes plug in through the
//! same trait.

mod interval;

pub use interval::IntervalMesh;

use smallvec::SmallVec;

use crate::basis::{MappedRule, QRule};

/// Adjacency list sized for low-dimensional vertex patches.
pub type Adjacency = SmallVec<[usize; 8]>;

/// Mesh topology and geometry consumed by tents, FE data, and kernels.
pub trait MeshAccess: Send + Sync {
    /// Spatial dimension.
    fn dim(&self) -> usize;

    fn n_elements(&self) -> usize;
    fn n_vertices(&self) -> usize;
    fn n_facets(&self) -> usize;

    /// Vertices of element `e`.
    fn el_vertices(&self, e: usize) -> Adjacency;

    /// Facets of element `e`, ordered by local facet number.
    fn el_facets(&self, e: usize) -> Adjacency;

    /// Vertices of facet `f`.
    fn facet_vertices(&self, f: usize) -> Adjacency;

    /// Elements adjacent to facet `f`; `None` second slot on the domain
    /// boundary.
    fn facet_els(&self, f: usize) -> (usize, Option<usize>);

    /// Elements of the vertex patch of `v`.
    fn vertex_els(&self, v: usize) -> Adjacency;

    /// Vertices sharing an edge with `v`.
    fn vertex_nbs(&self, v: usize) -> Adjacency;

    /// Length of the edge between neighbouring vertices `v` and `w`.
    fn vertex_dist(&self, v: usize, w: usize) -> f64;

    /// Physical coordinates of vertex `v` (`dim` components).
    fn vertex_coords(&self, v: usize) -> Vec<f64>;

    /// Whether element `e` has a non-affine geometry map.
    fn is_curved(&self, e: usize) -> bool;

    /// Measure (length/area/volume) of element `e`.
    fn el_measure(&self, e: usize) -> f64;

    /// Local facet number of facet `f` within element `e`.
    fn local_facet(&self, e: usize, f: usize) -> usize;

    /// Gradient of the piecewise-linear interpolant of per-vertex values
    /// on element `e`; returns `dim` components.
    fn el_linear_gradient(&self, e: usize, vals: &dyn Fn(usize) -> f64) -> Vec<f64>;

    /// Piecewise-linear interpolation of per-vertex values at reference
    /// points of element `e`. `points` is `dim × nq_pad` row-major; the
    /// first `nq` entries of `out` are written.
    fn el_interpolate(
        &self,
        e: usize,
        vals: &dyn Fn(usize) -> f64,
        points: &[f64],
        nq: usize,
        out: &mut [f64],
    );

    /// Domain-boundary facets with their boundary region index.
    fn boundary_facets(&self) -> Vec<(usize, usize)>;

    /// Push an integration rule onto element `e`.
    fn map_rule(&self, e: usize, rule: &QRule) -> MappedRule;

    /// Push a facet rule (tabulated in `e`'s reference coordinates at local
    /// facet `lf`) onto the mesh. The mapped rule carries `e`'s volume
    /// Jacobian in `jac_det` for penalty length scales.
    fn map_facet_rule(&self, e: usize, lf: usize, rule: &QRule) -> MappedRule;

    /// Outward normal of local facet `lf` seen from element `e`
    /// (constant per facet for affine elements).
    fn facet_normal(&self, e: usize, lf: usize) -> Vec<f64>;
}
