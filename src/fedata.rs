//! Per-tent finite-element working set.
//!
//! [`TentFeData`] binds everything a tent propagation touches: element and
//! facet integration rules, mapped geometric factors, tent-local DOF
//! ranges, and the advancing-front fields broadcast to quadrature points in
//! SIMD-lane layout. It is built at the start of `propagate_tent` on the
//! worker thread, owned exclusively by that worker, and dropped at the end
//! — a strictly scoped companion of the tent, not a back-pointer from it.

use std::ops::Range;

use crate::basis::{DgFiniteElement, DgSpace, MappedRule, QRule, SegmentElement};
use crate::error::{Result, TentError};
use crate::mesh::MeshAccess;
use crate::tent::Tent;

/// Second-side marker for domain-boundary facets.
pub const SENTINEL: usize = usize::MAX;

/// FE and geometry data of one tent, valid for one propagation.
pub struct TentFeData<'a> {
    /// Total tent-local DOF count (per solution component).
    pub nd: usize,

    // element data -------------------------------------------------------
    /// Finite element per patch element.
    pub fei: Vec<&'a SegmentElement>,
    /// Volume rule per element.
    pub iri: Vec<&'a QRule>,
    /// Mapped volume rule per element.
    pub miri: Vec<MappedRule>,
    /// Tent-local DOF range per element.
    pub ranges: Vec<Range<usize>>,
    /// Global DOF range per element.
    pub granges: Vec<Range<usize>>,
    /// Element length scale `(measure/dim)^(1/dim)`.
    pub mesh_size: Vec<f64>,
    /// Bottom/top front gradients at volume points, `dim × nq_pad`.
    pub agradphi_bot: Vec<Vec<f64>>,
    pub agradphi_top: Vec<Vec<f64>>,
    /// Tent height δ at volume points, `nq_pad`.
    pub adelta: Vec<Vec<f64>>,

    // facet data ---------------------------------------------------------
    /// Local element positions `(e1, e2)` per internal facet; `e2 =`
    /// [`SENTINEL`] on the domain boundary.
    pub felpos: Vec<[usize; 2]>,
    /// Facet rules per side, in each neighbour's reference coordinates.
    pub firi: Vec<[&'a QRule; 2]>,
    /// Mapped facet rule seen from side 1 / side 2.
    pub mfiri1: Vec<MappedRule>,
    pub mfiri2: Vec<MappedRule>,
    /// Front gradients on the facet per side, `dim × nq_pad`.
    pub agradphi_botf1: Vec<Vec<f64>>,
    pub agradphi_topf1: Vec<Vec<f64>>,
    pub agradphi_botf2: Vec<Vec<f64>>,
    pub agradphi_topf2: Vec<Vec<f64>>,
    /// Facet normals (from side 1 into side 2), `dim × nq_pad`.
    pub anormals: Vec<Vec<f64>>,
    /// Tent height δ at facet points, `nq_pad`.
    pub adelta_facet: Vec<Vec<f64>>,
}

/// Broadcast a constant `dim`-vector across the logical points of a rule.
fn broadcast(g: &[f64], nq: usize, nq_pad: usize) -> Vec<f64> {
    let dim = g.len();
    let mut out = vec![0.0; dim * nq_pad];
    for (k, &gk) in g.iter().enumerate() {
        for q in 0..nq {
            out[k * nq_pad + q] = gk;
        }
    }
    out
}

impl<'a> TentFeData<'a> {
    /// Assemble the working set of `tent`.
    pub fn new<M: MeshAccess>(tent: &Tent, space: &'a DgSpace, mesh: &M) -> Result<Self> {
        if tent.els.is_empty() {
            return Err(TentError::InvariantViolation(format!(
                "tent at vertex {} has an empty element patch",
                tent.vertex
            )));
        }

        let dim = mesh.dim();
        let el = space.element();
        let nel = tent.els.len();

        let delta_of = |w: usize| -> f64 {
            if w == tent.vertex {
                tent.ttop - tent.tbot
            } else {
                0.0
            }
        };

        let mut fei = Vec::with_capacity(nel);
        let mut iri = Vec::with_capacity(nel);
        let mut miri = Vec::with_capacity(nel);
        let mut ranges = Vec::with_capacity(nel);
        let mut granges = Vec::with_capacity(nel);
        let mut mesh_size = Vec::with_capacity(nel);
        let mut agradphi_bot = Vec::with_capacity(nel);
        let mut agradphi_top = Vec::with_capacity(nel);
        let mut adelta = Vec::with_capacity(nel);

        let mut offset = 0usize;
        for (i, &e) in tent.els.iter().enumerate() {
            let rule = el.vol_rule();
            let mr = mesh.map_rule(e, rule);

            let mut d = vec![0.0; rule.nq_pad];
            mesh.el_interpolate(e, &delta_of, &rule.points, rule.nq, &mut d);

            agradphi_bot.push(broadcast(&tent.gradphi_bot[i], rule.nq, rule.nq_pad));
            agradphi_top.push(broadcast(&tent.gradphi_top[i], rule.nq, rule.nq_pad));
            adelta.push(d);
            mesh_size.push((mesh.el_measure(e) / dim as f64).powf(1.0 / dim as f64));

            fei.push(el);
            iri.push(rule);
            miri.push(mr);
            ranges.push(offset..offset + el.ndof());
            granges.push(space.element_range(e));
            offset += el.ndof();
        }
        let nd = offset;

        let nfac = tent.internal_facets.len();
        let mut felpos = Vec::with_capacity(nfac);
        let mut firi = Vec::with_capacity(nfac);
        let mut mfiri1 = Vec::with_capacity(nfac);
        let mut mfiri2 = Vec::with_capacity(nfac);
        let mut agradphi_botf1 = Vec::with_capacity(nfac);
        let mut agradphi_topf1 = Vec::with_capacity(nfac);
        let mut agradphi_botf2 = Vec::with_capacity(nfac);
        let mut agradphi_topf2 = Vec::with_capacity(nfac);
        let mut anormals = Vec::with_capacity(nfac);
        let mut adelta_facet = Vec::with_capacity(nfac);

        for &f in &tent.internal_facets {
            let (e1, e2) = mesh.facet_els(f);
            let p1 = tent.els.iter().position(|&e| e == e1).ok_or_else(|| {
                TentError::InvariantViolation(format!(
                    "facet {} of tent at vertex {} touches element {} outside the patch",
                    f, tent.vertex, e1
                ))
            })?;
            // On periodic meshes a single-element patch can see itself on
            // both sides of a facet; the position lookup handles it since
            // both sides resolve to the same local element.
            let p2 = match e2 {
                Some(e2) => tent
                    .els
                    .iter()
                    .position(|&e| e == e2)
                    .ok_or_else(|| {
                        TentError::InvariantViolation(format!(
                            "facet {} of tent at vertex {} touches element {} outside the patch",
                            f, tent.vertex, e2
                        ))
                    })?,
                None => SENTINEL,
            };

            let lf1 = mesh.local_facet(e1, f);
            let r1 = el.facet_rule(lf1);
            let m1 = mesh.map_facet_rule(e1, lf1, r1);

            let (r2, m2) = match e2 {
                Some(e2) => {
                    let lf2 = mesh.local_facet(e2, f);
                    let r2 = el.facet_rule(lf2);
                    (r2, mesh.map_facet_rule(e2, lf2, r2))
                }
                None => (r1, m1.clone()),
            };

            let normal = mesh.facet_normal(e1, lf1);
            anormals.push(broadcast(&normal, r1.nq, r1.nq_pad));

            let mut df = vec![0.0; r1.nq_pad];
            mesh.el_interpolate(e1, &delta_of, &r1.points, r1.nq, &mut df);
            adelta_facet.push(df);

            agradphi_botf1.push(broadcast(&tent.gradphi_bot[p1], r1.nq, r1.nq_pad));
            agradphi_topf1.push(broadcast(&tent.gradphi_top[p1], r1.nq, r1.nq_pad));
            let pg2 = if p2 == SENTINEL { p1 } else { p2 };
            agradphi_botf2.push(broadcast(&tent.gradphi_bot[pg2], r2.nq, r2.nq_pad));
            agradphi_topf2.push(broadcast(&tent.gradphi_top[pg2], r2.nq, r2.nq_pad));

            felpos.push([p1, p2]);
            firi.push([r1, r2]);
            mfiri1.push(m1);
            mfiri2.push(m2);
        }

        Ok(Self {
            nd,
            fei,
            iri,
            miri,
            ranges,
            granges,
            mesh_size,
            agradphi_bot,
            agradphi_top,
            adelta,
            felpos,
            firi,
            mfiri1,
            mfiri2,
            agradphi_botf1,
            agradphi_topf1,
            agradphi_botf2,
            agradphi_topf2,
            anormals,
            adelta_facet,
        })
    }

    /// Number of patch elements.
    pub fn n_els(&self) -> usize {
        self.fei.len()
    }

    /// Number of internal facets.
    pub fn n_facets(&self) -> usize {
        self.felpos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::IntervalMesh;
    use crate::polynomial::GaussLobattoCatalog;

    fn setup() -> (IntervalMesh, DgSpace, GaussLobattoCatalog) {
        let cat = GaussLobattoCatalog::new();
        let mesh = IntervalMesh::uniform(0.0, 1.0, 4);
        let space = DgSpace::new(4, 2, &cat);
        (mesh, space, cat)
    }

    #[test]
    fn test_interior_tent_working_set() {
        let (mesh, space, _cat) = setup();
        let tent = Tent::new(&mesh, 2, 0.0, 0.1, vec![1, 3], vec![0.0, 0.0], 0);
        let fd = TentFeData::new(&tent, &space, &mesh).unwrap();

        assert_eq!(fd.n_els(), 2);
        assert_eq!(fd.nd, 6);
        assert_eq!(fd.ranges[0], 0..3);
        assert_eq!(fd.ranges[1], 3..6);
        assert_eq!(fd.granges[0], 3..6); // element 1 of the mesh
        assert_eq!(fd.granges[1], 6..9);

        // Single internal facet between the two patch elements.
        assert_eq!(fd.n_facets(), 1);
        assert_eq!(fd.felpos[0], [0, 1]);
        // Normal points from element 1 (left) into element 2 (right).
        assert!((fd.anormals[0][0] - 1.0).abs() < 1e-14);
        // δ at the pole facet is the full pole height.
        assert!((fd.adelta_facet[0][0] - 0.1).abs() < 1e-14);
    }

    #[test]
    fn test_delta_vanishes_at_patch_rim() {
        let (mesh, space, _cat) = setup();
        let tent = Tent::new(&mesh, 2, 0.0, 0.1, vec![1, 3], vec![0.0, 0.0], 0);
        let fd = TentFeData::new(&tent, &space, &mesh).unwrap();

        // δ is linear from 0 at the rim to the pole height at the vertex;
        // it must be nonnegative and vanish nowhere inside except the rim.
        for (i, d) in fd.adelta.iter().enumerate() {
            let rule = fd.iri[i];
            for q in 0..rule.nq {
                assert!(d[q] >= -1e-15, "delta negative at el {} q {}", i, q);
                assert!(d[q] <= 0.1 + 1e-15);
            }
            // Padded tail zeroed.
            for q in rule.nq..rule.nq_pad {
                assert_eq!(d[q], 0.0);
            }
        }
    }

    #[test]
    fn test_boundary_tent_sentinel() {
        let (mesh, space, _cat) = setup();
        let tent = Tent::new(&mesh, 0, 0.0, 0.05, vec![1], vec![0.0], 0);
        let fd = TentFeData::new(&tent, &space, &mesh).unwrap();
        assert_eq!(fd.n_facets(), 1);
        assert_eq!(fd.felpos[0], [0, SENTINEL]);
        // Outward normal at the left domain boundary.
        assert!((fd.anormals[0][0] + 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_front_gradient_broadcast() {
        let (mesh, space, _cat) = setup();
        let tent = Tent::new(&mesh, 2, 0.0, 0.1, vec![1, 3], vec![0.0, 0.0], 0);
        let fd = TentFeData::new(&tent, &space, &mesh).unwrap();
        let rule = fd.iri[0];
        for q in 0..rule.nq {
            assert!((fd.agradphi_top[0][q] - 0.4).abs() < 1e-12);
            assert!(fd.agradphi_bot[0][q].abs() < 1e-14);
        }
        // Facet sides carry the adjacent elements' gradients.
        assert!((fd.agradphi_topf1[0][0] - 0.4).abs() < 1e-12);
        assert!((fd.agradphi_topf2[0][0] + 0.4).abs() < 1e-12);
    }
}
