//! Global DG space with contiguous per-element DOF layout.
//!
//! All elements carry the same order, and every element's DOFs are stored
//! together (`all_dofs_together`), so a tent's DOF set is a union of
//! contiguous per-element ranges and gather/scatter between the global
//! vectors and the tent-local matrices is a couple of memcpys.

use std::ops::Range;

use super::{DgFiniteElement, SegmentElement};
use crate::polynomial::GaussLobattoCatalog;

/// Uniform-order DG space over a mesh.
#[derive(Clone, Debug)]
pub struct DgSpace {
    order: usize,
    n_elements: usize,
    element: SegmentElement,
    ndof_per_el: usize,
}

impl DgSpace {
    pub fn new(n_elements: usize, order: usize, catalog: &GaussLobattoCatalog) -> Self {
        let element = SegmentElement::new(order, catalog);
        let ndof_per_el = element.ndof();
        Self {
            order,
            n_elements,
            element,
            ndof_per_el,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn n_elements(&self) -> usize {
        self.n_elements
    }

    /// Total number of scalar DOFs (per solution component).
    pub fn total_ndof(&self) -> usize {
        self.n_elements * self.ndof_per_el
    }

    /// Number of DOFs on each element.
    pub fn el_ndof(&self) -> usize {
        self.ndof_per_el
    }

    /// Global DOF range of element `e`.
    pub fn element_range(&self, e: usize) -> Range<usize> {
        let start = e * self.ndof_per_el;
        start..start + self.ndof_per_el
    }

    /// The shared finite element (uniform order).
    pub fn element(&self) -> &SegmentElement {
        &self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_are_contiguous_and_disjoint() {
        let cat = GaussLobattoCatalog::new();
        let space = DgSpace::new(5, 3, &cat);
        assert_eq!(space.total_ndof(), 20);
        let mut next = 0;
        for e in 0..5 {
            let r = space.element_range(e);
            assert_eq!(r.start, next);
            assert_eq!(r.len(), 4);
            next = r.end;
        }
        assert_eq!(next, space.total_ndof());
    }
}
