//! Rusanov (local Lax-Friedrichs) solver.

use super::{physical_flux, RiemannSolver};
use crate::state::{Cons1D, Eos, NonPhysical};
use crate::Real;

/// Rusanov flux: symmetric average plus maximum-wavespeed dissipation.
///
/// Simple and very robust, at the price of extra diffusion. A good
/// fallback when HLLE struggles near vacuum states.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rusanov;

impl RiemannSolver for Rusanov {
    fn flux(
        &self,
        bxi: Real,
        ul: &Cons1D,
        ur: &Cons1D,
        etah: Real,
        eos: &Eos,
    ) -> Result<Cons1D, NonPhysical> {
        let wl = ul.to_prim(bxi, eos)?;
        let wr = ur.to_prim(bxi, eos)?;

        let sl = wl.vx.abs() + ul.cfast(bxi, eos);
        let sr = wr.vx.abs() + ur.cfast(bxi, eos);
        let a = sl.max(sr).max(etah);

        let fl = physical_flux(ul, &wl, bxi, eos);
        let fr = physical_flux(ur, &wr, bxi, eos);

        let mut f = ((fl + fr) - (*ur - *ul) * a) * 0.5;
        for n in 0..crate::NSCALARS {
            f.s[n] = if f.d >= 0.0 {
                f.d * wl.r[n]
            } else {
                f.d * wr.r[n]
            };
        }
        Ok(f)
    }

    fn name(&self) -> &'static str {
        "rusanov"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "isothermal"))]
    fn eos() -> Eos {
        Eos::adiabatic(1.4)
    }
    #[cfg(feature = "isothermal")]
    fn eos() -> Eos {
        Eos::isothermal(1.0)
    }

    #[test]
    fn test_static_jump_diffuses_toward_low_density() {
        let ul = Cons1D {
            d: 1.0,
            #[cfg(not(feature = "isothermal"))]
            e: 2.5,
            ..Cons1D::default()
        };
        let ur = Cons1D {
            d: 0.5,
            #[cfg(not(feature = "isothermal"))]
            e: 1.25,
            ..Cons1D::default()
        };
        let f = Rusanov.flux(0.0, &ul, &ur, 0.0, &eos()).unwrap();
        assert!(f.d > 0.0);
    }
}
