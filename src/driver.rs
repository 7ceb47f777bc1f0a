//! Driver state for a conservation law on a tent-pitched slab.
//!
//! [`ConservationLaw`] owns the mesh handle, the DG space, the current
//! slab with its dependency DAG, the global solution vectors, the boundary
//! condition table, and the artificial-viscosity field. Propagation walks
//! the tent DAG with [`crate::propagate::run_parallel_dependency`]; each
//! tent gathers its DOF ranges from the global vectors, advances through
//! the tent solver, and scatters the top-front values back. Concurrent
//! tents never share an element, so the scatter targets are disjoint and
//! the DAG's happens-before makes the unsynchronized writes sound.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::arena::{ScratchArena, DEFAULT_ARENA_BYTES};
use crate::basis::{DgFiniteElement, DgSpace};
use crate::bc::BoundaryCf;
use crate::equation::Equation;
use crate::error::{Result, TentError};
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::polynomial::{CollocationTable, GaussLobattoCatalog};
use crate::propagate::run_parallel_dependency;
use crate::solver::TentSolverKind;
use crate::tent::{pitch_tents, PitchingParams, TentPitchedSlab};
use crate::vtk::write_tents_vtk;

/// Tunables of slab propagation.
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    /// Scratch arena capacity per worker thread, in bytes.
    pub arena_bytes: usize,
    /// Viscosity is applied only where the tent coefficient exceeds this.
    pub viscosity_threshold: f64,
    /// Tent pitching parameters.
    pub pitching: PitchingParams,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            arena_bytes: DEFAULT_ARENA_BYTES,
            viscosity_threshold: 1e-10,
            pitching: PitchingParams::default(),
        }
    }
}

/// Unsynchronized view of a global vector partitioned into disjoint
/// per-tent write regions. The dependency DAG provides the required
/// happens-before between any two accesses of the same region.
pub(crate) struct SharedRows {
    ptr: *mut f64,
    len: usize,
}

unsafe impl Send for SharedRows {}
unsafe impl Sync for SharedRows {}

impl SharedRows {
    fn new(v: &mut [f64]) -> Self {
        Self {
            ptr: v.as_mut_ptr(),
            len: v.len(),
        }
    }

    /// Mutable view of `[start, end)`.
    ///
    /// SAFETY (caller): no concurrently executing tent may touch an
    /// overlapping range — guaranteed by the DAG since two tents sharing
    /// an element are always ordered.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slice_mut(&self, start: usize, end: usize) -> &mut [f64] {
        debug_assert!(start <= end && end <= self.len);
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(start), end - start) }
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &[f64] {
        debug_assert!(start <= end && end <= self.len);
        unsafe { std::slice::from_raw_parts(self.ptr.add(start), end - start) }
    }
}

/// Conservation-law driver over a tent-pitched slab.
pub struct ConservationLaw<E: Equation, M: MeshAccess> {
    pub equation: E,
    pub mesh: M,
    space: DgSpace,
    catalog: GaussLobattoCatalog,
    slab: Option<TentPitchedSlab>,

    /// Current solution u(n), dof-major with `COMP` components per DOF.
    pub u: Vec<f64>,
    /// Initial data, also used as the inflow/Dirichlet reservoir.
    pub uinit: Vec<f64>,
    /// Piecewise-constant artificial viscosity per element.
    nu: Vec<f64>,

    /// Boundary-condition code per facet; -1 on interior facets.
    bcnr: Vec<i32>,
    def_bcnr: bool,
    cf_bnd: HashMap<i32, BoundaryCf>,

    solver: TentSolverKind,
    pub config: SolverConfig,
    colloc: CollocationTable,
}

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Set up the driver: DG space of the given order, zeroed vectors,
    /// interior `-1` boundary table, and the default Picard tent solver.
    pub fn new(equation: E, mesh: M, order: usize) -> Result<Self> {
        if E::DIM != mesh.dim() {
            return Err(TentError::ConfigurationError(format!(
                "equation dimension {} does not match mesh dimension {}",
                E::DIM,
                mesh.dim()
            )));
        }

        let catalog = GaussLobattoCatalog::new();
        let space = DgSpace::new(mesh.n_elements(), order, &catalog);
        let ndof = space.total_ndof();

        let solver = TentSolverKind::default_for_order(order);
        let colloc = CollocationTable::new(catalog.rule(solver.stages()));

        Ok(Self {
            u: vec![0.0; ndof * E::COMP],
            uinit: vec![0.0; ndof * E::COMP],
            nu: vec![0.0; mesh.n_elements()],
            bcnr: vec![-1; mesh.n_facets()],
            def_bcnr: false,
            cf_bnd: HashMap::new(),
            solver,
            config: SolverConfig::default(),
            colloc,
            equation,
            mesh,
            space,
            catalog,
            slab: None,
        })
    }

    pub fn space(&self) -> &DgSpace {
        &self.space
    }

    pub fn catalog(&self) -> &GaussLobattoCatalog {
        &self.catalog
    }

    pub(crate) fn collocation(&self) -> &CollocationTable {
        &self.colloc
    }

    pub(crate) fn boundary_cf(&self, bc: i32) -> Option<&BoundaryCf> {
        self.cf_bnd.get(&bc)
    }

    pub(crate) fn bc_code(&self, facet: usize) -> i32 {
        self.bcnr[facet]
    }

    /// Per-element artificial-viscosity field.
    pub fn viscosity(&self) -> &[f64] {
        &self.nu
    }

    /// Select the tent solver variant.
    pub fn set_tentsolver(&mut self, solver: TentSolverKind) {
        self.colloc = CollocationTable::new(self.catalog.rule(solver.stages()));
        self.solver = solver;
    }

    /// Assign a boundary code to every facet of a mesh boundary region.
    pub fn set_bc(&mut self, region: usize, code: i32) {
        for (f, r) in self.mesh.boundary_facets() {
            if r == region {
                self.bcnr[f] = code;
            }
        }
        self.def_bcnr = true;
    }

    /// Default boundary codes from the mesh boundary indices unless the
    /// caller already assigned them.
    pub fn check_bc(&mut self) {
        if !self.def_bcnr {
            for (f, region) in self.mesh.boundary_facets() {
                self.bcnr[f] = region as i32;
            }
        }
    }

    /// Register a boundary coefficient function for a custom code (>= 4).
    pub fn set_boundary_cf(&mut self, code: i32, f: BoundaryCf) {
        self.cf_bnd.insert(code, f);
    }

    /// L2-project initial data into the DG space; fills `u` and `uinit`.
    /// The closure writes `COMP` values for a physical point.
    pub fn set_initial(&mut self, f: &dyn Fn(&[f64], &mut [f64])) {
        let el = self.space.element();
        let rule = el.vol_rule();
        let nd = el.ndof();
        let comp = E::COMP;
        let dim = E::DIM;

        let mut point = vec![0.0; dim];
        let mut vals = vec![0.0; comp];

        for e in 0..self.mesh.n_elements() {
            let mr = self.mesh.map_rule(e, rule);
            let grange = self.space.element_range(e);
            let coeffs = &mut self.u[grange.start * comp..grange.end * comp];
            coeffs.fill(0.0);
            for q in 0..rule.nq {
                for k in 0..dim {
                    point[k] = mr.points[k * mr.nq_pad + q];
                }
                f(&point, &mut vals);
                // Orthonormal reference basis: the element mass is |J|·I,
                // so projecting uses plain reference weights.
                for d in 0..nd {
                    let phi = rule.basis[d * rule.nq_pad + q] * rule.weights[q];
                    for (c, &v) in vals.iter().enumerate() {
                        coeffs[d * comp + c] += phi * v;
                    }
                }
            }
        }
        self.uinit.copy_from_slice(&self.u);
        self.nu.fill(0.0);
    }

    /// Pitch the tents of one slab with a scalar wavespeed bound.
    pub fn pitch_tents(&mut self, dt: f64, wavespeed: f64) -> Result<()> {
        self.pitch_tents_cf(dt, &|_| wavespeed)
    }

    /// Pitch with a per-vertex wavespeed bound (coefficient function).
    pub fn pitch_tents_cf(&mut self, dt: f64, wavespeed: &dyn Fn(usize) -> f64) -> Result<()> {
        let slab = pitch_tents(&self.mesh, dt, wavespeed, self.config.pitching)?;
        debug!(
            tents = slab.n_tents(),
            levels = slab.n_levels(),
            dt,
            "pitched slab"
        );
        self.slab = Some(slab);
        Ok(())
    }

    pub fn n_tents(&self) -> usize {
        self.slab.as_ref().map_or(0, TentPitchedSlab::n_tents)
    }

    /// Tent data of the current slab.
    pub fn slab(&self) -> Option<&TentPitchedSlab> {
        self.slab.as_ref()
    }

    /// Steepest advancing-front gradient of the current slab.
    pub fn max_slope(&self) -> f64 {
        self.slab.as_ref().map_or(0.0, TentPitchedSlab::max_slope)
    }

    /// Dump the pitched tents of the current slab to a legacy VTK file.
    pub fn draw_pitched_tents_vtk(&self, path: &std::path::Path) -> Result<()> {
        let slab = self.slab.as_ref().ok_or_else(|| {
            TentError::ConfigurationError("no slab pitched; call pitch_tents first".into())
        })?;
        write_tents_vtk(slab, &self.mesh, path)
            .map_err(|e| TentError::ConfigurationError(format!("vtk dump failed: {}", e)))
    }

    /// Advance the solution by one slab.
    pub fn propagate(&mut self) -> Result<()> {
        self.check_bc();

        let mut u = std::mem::take(&mut self.u);
        let mut nu = std::mem::take(&mut self.nu);
        let result = {
            let u_rows = SharedRows::new(&mut u);
            let nu_rows = SharedRows::new(&mut nu);
            self.propagate_vectors(&u_rows, &nu_rows)
        };
        self.u = u;
        self.nu = nu;
        result
    }

    fn propagate_vectors(&self, u: &SharedRows, nu: &SharedRows) -> Result<()> {
        let slab = self.slab.as_ref().ok_or_else(|| {
            TentError::ConfigurationError("no slab pitched; call pitch_tents first".into())
        })?;

        thread_local! {
            static ARENA: RefCell<Option<ScratchArena>> = const { RefCell::new(None) };
        }

        let arena_bytes = self.config.arena_bytes;
        run_parallel_dependency(&slab.dag, |i| {
            ARENA.with(|cell| {
                let mut slot = cell.borrow_mut();
                let arena = slot
                    .get_or_insert_with(|| ScratchArena::with_capacity_bytes(arena_bytes));
                self.propagate_tent(&slab.tents[i], u, nu, arena)
            })
        })
    }

    /// Propagate a single tent: build the FE working set on the worker
    /// arena, gather the tent DOFs, run the tent solver, scatter back.
    fn propagate_tent(
        &self,
        tent: &crate::tent::Tent,
        u: &SharedRows,
        nu: &SharedRows,
        arena: &mut ScratchArena,
    ) -> Result<()> {
        let mark = arena.mark();
        let result = (|| {
            let h: &ScratchArena = &*arena;
            let fd = TentFeData::new(tent, &self.space, &self.mesh)?;
            let comp = E::COMP;

            let local_u = h.alloc(fd.nd * comp);
            let local_u0 = h.alloc(fd.nd * comp);
            let local_nu = h.alloc(fd.n_els());
            for i in 0..fd.n_els() {
                let lr = &fd.ranges[i];
                let gr = &fd.granges[i];
                local_u[lr.start * comp..lr.end * comp]
                    .copy_from_slice(u.slice(gr.start * comp, gr.end * comp));
                local_u0[lr.start * comp..lr.end * comp]
                    .copy_from_slice(&self.uinit[gr.start * comp..gr.end * comp]);
            }

            self.solver
                .propagate_tent(self, tent, &fd, local_u, local_u0, local_nu, h)?;

            for i in 0..fd.n_els() {
                let lr = &fd.ranges[i];
                let gr = &fd.granges[i];
                // SAFETY: the DAG orders any two tents sharing an element,
                // so this range has no concurrent reader or writer.
                let dst = unsafe { u.slice_mut(gr.start * comp, gr.end * comp) };
                dst.copy_from_slice(&local_u[lr.start * comp..lr.end * comp]);
                if E::ECOMP > 0 {
                    let e = tent.els[i];
                    // SAFETY: as above; ν is per element.
                    let dst = unsafe { nu.slice_mut(e, e + 1) };
                    dst[0] = local_nu[i];
                }
            }
            Ok(())
        })();
        arena.reset(mark);
        result
    }

    // ------------------------------------------------------------------
    // diagnostics used by tests and callers
    // ------------------------------------------------------------------

    /// ∫ u_c dx over the whole domain.
    pub fn integrate_component(&self, c: usize) -> f64 {
        let el = self.space.element();
        let rule = el.vol_rule();
        let comp = E::COMP;
        let mut total = 0.0;
        let mut vals = vec![0.0; comp * rule.nq_pad];
        for e in 0..self.mesh.n_elements() {
            let mr = self.mesh.map_rule(e, rule);
            let grange = self.space.element_range(e);
            crate::basis::evaluate(
                rule,
                &self.u[grange.start * comp..grange.end * comp],
                comp,
                &mut vals,
            );
            for q in 0..rule.nq {
                total += mr.weight[q] * vals[c * rule.nq_pad + q];
            }
        }
        total
    }

    /// L2 distance between component `c` of the solution and a reference
    /// profile.
    pub fn l2_error(&self, c: usize, reference: &dyn Fn(&[f64]) -> f64) -> f64 {
        let el = self.space.element();
        let rule = el.vol_rule();
        let comp = E::COMP;
        let dim = E::DIM;
        let mut err2 = 0.0;
        let mut vals = vec![0.0; comp * rule.nq_pad];
        let mut point = vec![0.0; dim];
        for e in 0..self.mesh.n_elements() {
            let mr = self.mesh.map_rule(e, rule);
            let grange = self.space.element_range(e);
            crate::basis::evaluate(
                rule,
                &self.u[grange.start * comp..grange.end * comp],
                comp,
                &mut vals,
            );
            for q in 0..rule.nq {
                for k in 0..dim {
                    point[k] = mr.points[k * mr.nq_pad + q];
                }
                let diff = vals[c * rule.nq_pad + q] - reference(&point);
                err2 += mr.weight[q] * diff * diff;
            }
        }
        err2.sqrt()
    }

    /// Max-norm of component `c` of the DG solution at quadrature points.
    pub fn max_component(&self, c: usize) -> f64 {
        let el = self.space.element();
        let rule = el.vol_rule();
        let comp = E::COMP;
        let mut m: f64 = 0.0;
        let mut vals = vec![0.0; comp * rule.nq_pad];
        for e in 0..self.mesh.n_elements() {
            let grange = self.space.element_range(e);
            crate::basis::evaluate(
                rule,
                &self.u[grange.start * comp..grange.end * comp],
                comp,
                &mut vals,
            );
            for q in 0..rule.nq {
                m = m.max(vals[c * rule.nq_pad + q].abs());
            }
        }
        m
    }
}
