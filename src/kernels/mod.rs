//! Per-tent numerical kernels.
//!
//! The six maps of the tent solver plus the per-element mass solve, all
//! implemented as methods on [`crate::driver::ConservationLaw`] and
//! monomorphized per equation:
//!
//! - [`mass`]: `solve_m` / `solve_m_delta` (lumped and two-pass projections)
//! - [`flux`]: `calc_flux_tent` (DG spatial operator scaled by tent height)
//! - [`maps`]: `cyl2tent`, `tent2cyl`, `apply_m1` (cylinder coordinate maps)
//! - [`viscosity`]: interior-penalty Laplacian and the viscosity coefficient
//! - [`entropy`]: entropy residual through the dual-number pipeline
//!
//! All temporaries live on the worker's scratch arena; quadrature-point
//! matrices are flat row-major slices with the padded stride of their rule.

pub mod entropy;
pub mod flux;
pub mod maps;
pub mod mass;
pub mod viscosity;

use crate::arena::ScratchArena;

/// Interpolate the front gradient at pseudotime `tstar`:
/// `(1 - t*) ∇φ_bot + t* ∇φ_top`, allocated on the arena.
pub(crate) fn gradphi_at<'h>(
    h: &'h ScratchArena,
    bot: &[f64],
    top: &[f64],
    tstar: f64,
) -> &'h mut [f64] {
    let out = h.alloc(bot.len());
    for ((o, &b), &t) in out.iter_mut().zip(bot.iter()).zip(top.iter()) {
        *o = (1.0 - tstar) * b + tstar * t;
    }
    out
}

/// `∇δ = ∇φ_top - ∇φ_bot`, allocated on the arena.
pub(crate) fn graddelta_of<'h>(h: &'h ScratchArena, bot: &[f64], top: &[f64]) -> &'h mut [f64] {
    let out = h.alloc(bot.len());
    for ((o, &b), &t) in out.iter_mut().zip(bot.iter()).zip(top.iter()) {
        *o = t - b;
    }
    out
}
