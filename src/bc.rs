//! Boundary-condition dispatch.
//!
//! Every boundary facet carries a code in `bcnr`; the dispatch prescribes
//! the exterior trace `u2` a facet kernel couples against:
//!
//! | code | name        | `u2`                                    |
//! |------|-------------|-----------------------------------------|
//! | 0    | outflow     | interior trace                          |
//! | 1    | wall        | equation's reflection map               |
//! | 2    | inflow      | trace of the initial/Dirichlet reservoir|
//! | 3    | transparent | equation's absorbing map (wave only)    |
//! | >= 4 | custom      | registered boundary coefficient function|
//!
//! A code with no registered handler is a configuration error naming the
//! offending (1-based) code.

use crate::basis::{evaluate, MappedRule};
use crate::driver::ConservationLaw;
use crate::equation::Equation;
use crate::error::{Result, TentError};
use crate::fedata::TentFeData;
use crate::mesh::MeshAccess;
use crate::tent::Tent;

/// Boundary coefficient function: writes `COMP × nq_pad` exterior-trace
/// values at the mapped facet points.
pub type BoundaryCf = Box<dyn Fn(&MappedRule, &mut [f64]) + Send + Sync>;

impl<E: Equation, M: MeshAccess> ConservationLaw<E, M> {
    /// Prescribe the exterior trace `u2` on boundary facet `fi` of the tent.
    ///
    /// `u1` is the interior trace at the facet points, `u0` the tent-local
    /// reservoir coefficients (for inflow).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn boundary_trace(
        &self,
        tent: &Tent,
        fd: &TentFeData,
        fi: usize,
        u0: &[f64],
        u1: &[f64],
        u2: &mut [f64],
    ) -> Result<()> {
        let comp = E::COMP;
        let bc = self.bc_code(tent.internal_facets[fi]);
        let mir = &fd.mfiri1[fi];
        let normals = &fd.anormals[fi];

        match bc {
            0 => {
                // outflow: use the interior values
                u2[..comp * mir.nq_pad].copy_from_slice(&u1[..comp * mir.nq_pad]);
            }
            1 => {
                self.equation.u_reflect(mir, u1, normals, u2);
            }
            2 => {
                // inflow: trace of the initial data
                let el1 = fd.felpos[fi][0];
                let dn1 = &fd.ranges[el1];
                evaluate(
                    fd.firi[fi][0],
                    &u0[dn1.start * comp..dn1.end * comp],
                    comp,
                    u2,
                );
            }
            3 => {
                self.equation.u_transparent(mir, u1, normals, u2)?;
            }
            bc => match self.boundary_cf(bc) {
                Some(cf) => cf(mir, u2),
                None => return Err(TentError::no_bc_handler(bc)),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TentError;

    #[test]
    fn test_missing_handler_names_code() {
        let err = TentError::no_bc_handler(7);
        match err {
            TentError::ConfigurationError(msg) => assert!(msg.contains("number 8")),
            _ => panic!("wrong error class"),
        }
    }
}
