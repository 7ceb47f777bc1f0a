//! Space-time tents and the tent-pitched slab.
//!
//! A tent is a macroelement over a spatial vertex patch: the tentpole is
//! erected at a central vertex, and the tent is bounded below and above by
//! piecewise-linear advancing fronts. We represent it by its projection on
//! space (the patch), the central vertex, and the front heights of the
//! neighbouring vertices.
//!
//! The advancing fronts are piecewise linear, so their spatial gradients
//! are constant per element; the tent stores those per-element gradients
//! together with the front height difference `δ = φ_top - φ_bot` at the
//! element (and facet) vertices. Per-quadrature-point tables are built from
//! these by `TentFeData` just before propagation.

mod pitcher;

pub use pitcher::{pitch_tents, PitchingParams};

use smallvec::SmallVec;

use crate::mesh::MeshAccess;
use crate::propagate::DependencyDag;

/// One space-time tent.
#[derive(Clone, Debug)]
pub struct Tent {
    /// Central vertex.
    pub vertex: usize,
    /// Bottom and top times of the central vertex.
    pub tbot: f64,
    pub ttop: f64,
    /// Neighbour vertices and their front heights when the tent was pitched.
    pub nbv: Vec<usize>,
    pub nbtime: Vec<f64>,
    /// All elements of the vertex patch.
    pub els: Vec<usize>,
    /// Facets of the patch carrying tent height: interior facets of the
    /// patch plus domain-boundary facets at the central vertex.
    pub internal_facets: Vec<usize>,
    /// For each element of `els`, the internal facets incident to it.
    pub elfnums: Vec<SmallVec<[usize; 4]>>,

    /// Per-element gradient of the bottom/top front (length `dim` each).
    pub gradphi_bot: Vec<Vec<f64>>,
    pub gradphi_top: Vec<Vec<f64>>,
    /// Per-element gradient of δ = φ_top - φ_bot.
    pub graddelta: Vec<Vec<f64>>,
    /// δ at the vertices of each element (ordered as `el_vertices`).
    pub delta: Vec<SmallVec<[f64; 4]>>,
    /// δ at the vertices of each internal facet.
    pub delta_facet: Vec<SmallVec<[f64; 4]>>,
    /// Front gradients per internal facet and side (side = adjacent element
    /// position in `els`; boundary facets carry one side).
    pub gradphi_facet_bot: Vec<SmallVec<[Vec<f64>; 2]>>,
    pub gradphi_facet_top: Vec<SmallVec<[Vec<f64>; 2]>>,

    /// BFS layer in the dependency DAG.
    pub level: usize,
    /// Tents that read this tent's output (outgoing DAG edges).
    pub dependent_tents: Vec<usize>,
}

impl Tent {
    /// Build a tent with all geometric front data for the given heights.
    pub fn new<M: MeshAccess>(
        mesh: &M,
        vertex: usize,
        tbot: f64,
        ttop: f64,
        nbv: Vec<usize>,
        nbtime: Vec<f64>,
        level: usize,
    ) -> Self {
        debug_assert!(ttop > tbot, "tent pole must have positive height");

        let phi_bot = |w: usize| -> f64 {
            if w == vertex {
                tbot
            } else {
                let i = nbv.iter().position(|&n| n == w).expect("patch vertex");
                nbtime[i]
            }
        };
        let phi_top = |w: usize| -> f64 {
            if w == vertex {
                ttop
            } else {
                phi_bot(w)
            }
        };

        let els: Vec<usize> = mesh.vertex_els(vertex).into_iter().collect();

        // Facets carrying tent height are exactly those touching the pole.
        let mut internal_facets: Vec<usize> = Vec::new();
        for &e in &els {
            for f in mesh.el_facets(e) {
                if mesh.facet_vertices(f).contains(&vertex) && !internal_facets.contains(&f) {
                    internal_facets.push(f);
                }
            }
        }

        let elfnums: Vec<SmallVec<[usize; 4]>> = els
            .iter()
            .map(|&e| {
                mesh.el_facets(e)
                    .into_iter()
                    .filter(|f| internal_facets.contains(f))
                    .collect()
            })
            .collect();

        let mut gradphi_bot = Vec::with_capacity(els.len());
        let mut gradphi_top = Vec::with_capacity(els.len());
        let mut graddelta = Vec::with_capacity(els.len());
        let mut delta = Vec::with_capacity(els.len());
        for &e in &els {
            let gb = mesh.el_linear_gradient(e, &phi_bot);
            let gt = mesh.el_linear_gradient(e, &phi_top);
            let gd: Vec<f64> = gt.iter().zip(gb.iter()).map(|(t, b)| t - b).collect();
            let dv: SmallVec<[f64; 4]> = mesh
                .el_vertices(e)
                .into_iter()
                .map(|w| phi_top(w) - phi_bot(w))
                .collect();
            gradphi_bot.push(gb);
            gradphi_top.push(gt);
            graddelta.push(gd);
            delta.push(dv);
        }

        let mut delta_facet = Vec::with_capacity(internal_facets.len());
        let mut gradphi_facet_bot = Vec::with_capacity(internal_facets.len());
        let mut gradphi_facet_top = Vec::with_capacity(internal_facets.len());
        for &f in &internal_facets {
            let dv: SmallVec<[f64; 4]> = mesh
                .facet_vertices(f)
                .into_iter()
                .map(|w| phi_top(w) - phi_bot(w))
                .collect();
            delta_facet.push(dv);

            let (e1, e2) = mesh.facet_els(f);
            let mut gb: SmallVec<[Vec<f64>; 2]> = SmallVec::new();
            let mut gt: SmallVec<[Vec<f64>; 2]> = SmallVec::new();
            for e in std::iter::once(e1).chain(e2) {
                if let Some(i) = els.iter().position(|&el| el == e) {
                    gb.push(gradphi_bot[i].clone());
                    gt.push(gradphi_top[i].clone());
                }
            }
            gradphi_facet_bot.push(gb);
            gradphi_facet_top.push(gt);
        }

        Self {
            vertex,
            tbot,
            ttop,
            nbv,
            nbtime,
            els,
            internal_facets,
            elfnums,
            gradphi_bot,
            gradphi_top,
            graddelta,
            delta,
            delta_facet,
            gradphi_facet_bot,
            gradphi_facet_top,
            level,
            dependent_tents: Vec::new(),
        }
    }

    /// Steepest front gradient over the tent's elements.
    pub fn max_slope(&self) -> f64 {
        let mut slope: f64 = 0.0;
        for g in self.gradphi_top.iter().chain(self.gradphi_bot.iter()) {
            let norm = g.iter().map(|c| c * c).sum::<f64>().sqrt();
            slope = slope.max(norm);
        }
        slope
    }
}

impl std::fmt::Display for Tent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tent(vertex {}, t = [{:.6}, {:.6}], {} els, level {})",
            self.vertex,
            self.tbot,
            self.ttop,
            self.els.len(),
            self.level
        )
    }
}

/// All tents between two time slices, with their dependency DAG.
#[derive(Clone, Debug)]
pub struct TentPitchedSlab {
    /// Slab height.
    pub dt: f64,
    pub tents: Vec<Tent>,
    /// Forward dependency table: `dag.dependents[i]` are the tents that must
    /// wait for tent `i`.
    pub dag: DependencyDag,
}

impl TentPitchedSlab {
    pub fn n_tents(&self) -> usize {
        self.tents.len()
    }

    /// Number of parallel layers.
    pub fn n_levels(&self) -> usize {
        self.tents.iter().map(|t| t.level + 1).max().unwrap_or(0)
    }

    /// Steepest advancing-front gradient over the slab.
    pub fn max_slope(&self) -> f64 {
        self.tents
            .iter()
            .map(Tent::max_slope)
            .fold(0.0, f64::max)
    }
}
