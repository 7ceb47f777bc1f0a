//! # tent-dg
//!
//! A Mapped Tent Pitching (MTP) discontinuous-Galerkin solver for
//! hyperbolic conservation laws.
//!
//! Instead of advancing a global semi-discrete system in time, the space-
//! time slab is partitioned into tents — macroelements erected over a
//! spatial vertex patch, bounded by piecewise-linear advancing fronts —
//! and the solution propagates tent by tent in an order that respects the
//! hyperbolic domain of influence. Each tent is mapped onto a flat
//! reference cylinder, where a DG-in-space / collocation-in-pseudotime
//! solver runs.
//!
//! The crate provides:
//! - Gauss-Lobatto quadrature and collocation tables ([`polynomial`])
//! - a per-thread scratch arena with scope marks ([`arena`])
//! - the modal DG segment element and SIMD-padded rule tables ([`basis`])
//! - the mesh collaborator interface and a 1-D interval mesh ([`mesh`])
//! - tents, greedy tent pitching, and the slab DAG ([`tent`])
//! - the per-tent FE working set ([`fedata`])
//! - the equation capability set with dual-number support ([`equation`]),
//!   and advection/Burgers/wave plug-ins ([`equations`])
//! - the per-tent numerical kernels: flux, viscosity, entropy residual,
//!   coordinate maps and mass solves ([`kernels`])
//! - Picard and structure-aware RK tent solvers ([`solver`])
//! - the dependency-driven parallel propagator ([`propagate`])
//! - the driver state tying it all together ([`driver`])

pub mod arena;
pub mod basis;
pub mod bc;
pub mod driver;
pub mod equation;
pub mod equations;
pub mod error;
pub mod fedata;
pub mod kernels;
pub mod mesh;
pub mod polynomial;
pub mod propagate;
pub mod simd;
pub mod solver;
pub mod tent;
pub mod vtk;

// Re-export the main types for convenience
pub use arena::{Mark, ScratchArena};
pub use bc::BoundaryCf;
pub use driver::{ConservationLaw, SolverConfig};
pub use equation::{Dual, Equation, Scalar};
pub use equations::{Advection1D, Burgers1D, Wave1D};
pub use error::{Result, TentError};
pub use fedata::TentFeData;
pub use mesh::{IntervalMesh, MeshAccess};
pub use polynomial::{CollocationTable, GaussLobattoCatalog};
pub use propagate::{run_parallel_dependency, DependencyDag};
pub use solver::TentSolverKind;
pub use tent::{pitch_tents, PitchingParams, Tent, TentPitchedSlab};
