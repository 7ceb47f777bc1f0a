//! Greedy advancing-front tent pitching.
//!
//! Builds the tents of one slab and their dependency DAG. The front height
//! `tau[v]` starts at zero everywhere; repeatedly the lowest vertex of the
//! front is picked and advanced to its causal bound
//! `min_nb(tau[nb] + safety · dist(v, nb) / c)`, capped at the slab end.
//! Picking the global minimum guarantees strict progress (every neighbour
//! is at least as high, so the bound exceeds the current height), and the
//! safety factor keeps the front gradient strictly below `1/c` so the
//! cylinder inverse map stays solvable.
//!
//! A new tent depends on the previous tent pitched at any vertex of its
//! patch; that covers every element it shares with earlier tents, which is
//! exactly the write-set ordering the propagator needs.

use super::{Tent, TentPitchedSlab};
use crate::error::{Result, TentError};
use crate::mesh::MeshAccess;
use crate::propagate::DependencyDag;

/// Tunables of the pitching loop.
#[derive(Clone, Copy, Debug)]
pub struct PitchingParams {
    /// Fraction of the causal height bound actually pitched; must be < 1.
    pub safety: f64,
}

impl Default for PitchingParams {
    fn default() -> Self {
        Self { safety: 0.9 }
    }
}

/// Pitch all tents of a slab of height `dt`.
///
/// `wavespeed` returns an upper bound of the characteristic speed at a
/// vertex; a constant closure recovers the scalar-wavespeed variant.
pub fn pitch_tents<M: MeshAccess>(
    mesh: &M,
    dt: f64,
    wavespeed: &dyn Fn(usize) -> f64,
    params: PitchingParams,
) -> Result<TentPitchedSlab> {
    if dt <= 0.0 {
        return Err(TentError::ConfigurationError(format!(
            "slab height must be positive, got {}",
            dt
        )));
    }
    if !(params.safety > 0.0 && params.safety < 1.0) {
        return Err(TentError::ConfigurationError(format!(
            "pitching safety factor must lie in (0, 1), got {}",
            params.safety
        )));
    }

    let nv = mesh.n_vertices();
    let mut tau = vec![0.0f64; nv];
    let mut latest_tent: Vec<Option<usize>> = vec![None; nv];
    let mut tents: Vec<Tent> = Vec::new();
    let mut dependents: Vec<Vec<usize>> = Vec::new();

    let eps = 1e-12 * dt;

    loop {
        // Lowest vertex of the front that has not reached the slab top.
        let mut v = usize::MAX;
        let mut tmin = f64::INFINITY;
        for (w, &t) in tau.iter().enumerate() {
            if t < dt - eps && t < tmin {
                tmin = t;
                v = w;
            }
        }
        if v == usize::MAX {
            break; // front is flat at the slab top
        }

        let nbv: Vec<usize> = mesh.vertex_nbs(v).into_iter().collect();
        if nbv.is_empty() {
            return Err(TentError::InvariantViolation(format!(
                "vertex {} has no neighbours; cannot pitch",
                v
            )));
        }

        // Causal bound over the patch edges.
        let mut ttop = f64::INFINITY;
        for &nb in &nbv {
            let c = wavespeed(v).max(wavespeed(nb));
            if !(c > 0.0) {
                return Err(TentError::ConfigurationError(format!(
                    "wavespeed must be positive near vertex {}",
                    v
                )));
            }
            ttop = ttop.min(tau[nb] + params.safety * mesh.vertex_dist(v, nb) / c);
        }
        let ttop = ttop.min(dt);
        let tbot = tau[v];
        debug_assert!(
            ttop > tbot,
            "no progress at vertex {} (tbot {}, ttop {})",
            v,
            tbot,
            ttop
        );

        let nbtime: Vec<f64> = nbv.iter().map(|&nb| tau[nb]).collect();

        // Dependencies: previous tents at any patch vertex.
        let tent_id = tents.len();
        let mut level = 0usize;
        for &w in std::iter::once(&v).chain(nbv.iter()) {
            if let Some(dep) = latest_tent[w] {
                if !dependents[dep].contains(&tent_id) {
                    dependents[dep].push(tent_id);
                }
                level = level.max(tents[dep].level + 1);
            }
        }

        tents.push(Tent::new(mesh, v, tbot, ttop, nbv, nbtime, level));
        dependents.push(Vec::new());
        latest_tent[v] = Some(tent_id);
        tau[v] = ttop;
    }

    for (i, deps) in dependents.iter().enumerate() {
        tents[i].dependent_tents = deps.clone();
    }

    Ok(TentPitchedSlab {
        dt,
        tents,
        dag: DependencyDag::from_dependents(dependents),
    })
}
