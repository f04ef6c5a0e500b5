//! Fluid state types: conservative cell states, 1D sweep-basis states,
//! primitive states, and the equation-of-state handle.
//!
//! The shape of every state struct follows the build-time feature set:
//! magnetic components exist only with the `mhd` feature, and the total
//! energy / pressure exist only without the `isothermal` feature, so
//! absent components cost zero memory.

mod cons1d;
mod gas;
mod prim1d;

pub use cons1d::Cons1D;
pub use gas::Gas;
pub use prim1d::Prim1D;

use crate::Real;

/// Equation-of-state handle.
///
/// Adiabatic builds carry the ratio of specific heats `gamma`; isothermal
/// builds carry the constant sound speed instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Eos {
    /// Ratio of specific heats.
    #[cfg(not(feature = "isothermal"))]
    pub gamma: Real,
    /// Isothermal sound speed.
    #[cfg(feature = "isothermal")]
    pub iso_csound: Real,
}

#[cfg(not(feature = "isothermal"))]
impl Eos {
    /// Adiabatic (gamma-law) equation of state.
    pub fn adiabatic(gamma: Real) -> Self {
        Self { gamma }
    }

    /// gamma - 1, used by every pressure/energy conversion.
    #[inline(always)]
    pub fn gm1(&self) -> Real {
        self.gamma - 1.0
    }
}

#[cfg(feature = "isothermal")]
impl Eos {
    /// Isothermal equation of state with constant sound speed.
    pub fn isothermal(iso_csound: Real) -> Self {
        Self { iso_csound }
    }
}

/// Which physical quantity went non-positive during a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonPhysicalKind {
    Density,
    Pressure,
}

/// A non-physical (non-positive) density or pressure encountered while
/// converting between conservative and primitive variables.
///
/// Carries no grid position; the integrator attaches the offending zone
/// and sweep when it surfaces the failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NonPhysical {
    pub kind: NonPhysicalKind,
    pub value: Real,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "isothermal"))]
    #[test]
    fn test_eos_gm1() {
        let eos = Eos::adiabatic(5.0 / 3.0);
        assert!((eos.gm1() - 2.0 / 3.0).abs() < 1e-14);
    }

    #[cfg(feature = "isothermal")]
    #[test]
    fn test_eos_isothermal() {
        let eos = Eos::isothermal(0.5);
        assert!((eos.iso_csound - 0.5).abs() < 1e-14);
    }
}
