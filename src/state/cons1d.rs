//! Conservative state in the local 1D sweep basis.

use std::ops::{Add, Mul, Sub};

use super::{Eos, NonPhysical, NonPhysicalKind, Prim1D};
use crate::{Real, NSCALARS};

/// Conservative variables along one sweep: `x` is the sweep direction,
/// `y`/`z` the two transverse directions in cyclic order.
///
/// The normal magnetic field is not part of the vector; it is carried
/// separately as the face value `bxi` because constrained transport owns
/// its evolution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cons1D {
    /// Mass density.
    pub d: Real,
    /// Momentum density along the sweep.
    pub mx: Real,
    /// First transverse momentum density.
    pub my: Real,
    /// Second transverse momentum density.
    pub mz: Real,
    /// Total energy density.
    #[cfg(not(feature = "isothermal"))]
    pub e: Real,
    /// First transverse magnetic field component.
    #[cfg(feature = "mhd")]
    pub by: Real,
    /// Second transverse magnetic field component.
    #[cfg(feature = "mhd")]
    pub bz: Real,
    /// Passive scalar densities.
    pub s: [Real; NSCALARS],
}

impl Cons1D {
    /// Convert to primitive variables.
    ///
    /// Fails if the density, or (adiabatic) the recovered gas pressure,
    /// is non-positive; the integrator attaches the zone index and sweep.
    #[cfg_attr(
        any(not(feature = "mhd"), feature = "isothermal"),
        allow(unused_variables)
    )]
    pub fn to_prim(&self, bx: Real, eos: &Eos) -> Result<Prim1D, NonPhysical> {
        if self.d <= 0.0 {
            return Err(NonPhysical {
                kind: NonPhysicalKind::Density,
                value: self.d,
            });
        }
        let di = 1.0 / self.d;
        let vx = self.mx * di;
        let vy = self.my * di;
        let vz = self.mz * di;

        #[cfg(not(feature = "isothermal"))]
        let p = {
            let ke = 0.5 * self.d * (vx * vx + vy * vy + vz * vz);
            #[cfg(feature = "mhd")]
            let me = 0.5 * (bx * bx + self.by * self.by + self.bz * self.bz);
            #[cfg(not(feature = "mhd"))]
            let me = 0.0;
            let p = eos.gm1() * (self.e - ke - me);
            if p <= 0.0 {
                return Err(NonPhysical {
                    kind: NonPhysicalKind::Pressure,
                    value: p,
                });
            }
            p
        };

        let mut r = [0.0; NSCALARS];
        for (n, v) in r.iter_mut().enumerate() {
            *v = self.s[n] * di;
        }

        Ok(Prim1D {
            d: self.d,
            vx,
            vy,
            vz,
            #[cfg(not(feature = "isothermal"))]
            p,
            #[cfg(feature = "mhd")]
            by: self.by,
            #[cfg(feature = "mhd")]
            bz: self.bz,
            r,
        })
    }

    /// Fast magnetosonic speed for the sweep direction.
    ///
    /// Used by the H-correction and for wavespeed bounds; clamps the
    /// pressure at zero rather than failing, so it stays total.
    #[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
    pub fn cfast(&self, bx: Real, eos: &Eos) -> Real {
        let di = 1.0 / self.d;
        #[cfg(not(feature = "isothermal"))]
        let asq = {
            let ke = 0.5 * (self.mx * self.mx + self.my * self.my + self.mz * self.mz) * di;
            #[cfg(feature = "mhd")]
            let me = 0.5 * (bx * bx + self.by * self.by + self.bz * self.bz);
            #[cfg(not(feature = "mhd"))]
            let me = 0.0;
            let p = (eos.gm1() * (self.e - ke - me)).max(0.0);
            eos.gamma * p * di
        };
        #[cfg(feature = "isothermal")]
        let asq = eos.iso_csound * eos.iso_csound;

        #[cfg(feature = "mhd")]
        {
            let vaxsq = bx * bx * di;
            let vtsq = (self.by * self.by + self.bz * self.bz) * di;
            let tsum = asq + vaxsq + vtsq;
            let disc = (tsum * tsum - 4.0 * asq * vaxsq).max(0.0);
            (0.5 * (tsum + disc.sqrt())).sqrt()
        }
        #[cfg(not(feature = "mhd"))]
        {
            asq.sqrt()
        }
    }
}

impl Add for Cons1D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.s[n] + other.s[n];
        }
        Self {
            d: self.d + other.d,
            mx: self.mx + other.mx,
            my: self.my + other.my,
            mz: self.mz + other.mz,
            #[cfg(not(feature = "isothermal"))]
            e: self.e + other.e,
            #[cfg(feature = "mhd")]
            by: self.by + other.by,
            #[cfg(feature = "mhd")]
            bz: self.bz + other.bz,
            s,
        }
    }
}

impl Sub for Cons1D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.s[n] - other.s[n];
        }
        Self {
            d: self.d - other.d,
            mx: self.mx - other.mx,
            my: self.my - other.my,
            mz: self.mz - other.mz,
            #[cfg(not(feature = "isothermal"))]
            e: self.e - other.e,
            #[cfg(feature = "mhd")]
            by: self.by - other.by,
            #[cfg(feature = "mhd")]
            bz: self.bz - other.bz,
            s,
        }
    }
}

impl Mul<Real> for Cons1D {
    type Output = Self;

    fn mul(self, q: Real) -> Self {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.s[n] * q;
        }
        Self {
            d: self.d * q,
            mx: self.mx * q,
            my: self.my * q,
            mz: self.mz * q,
            #[cfg(not(feature = "isothermal"))]
            e: self.e * q,
            #[cfg(feature = "mhd")]
            by: self.by * q,
            #[cfg(feature = "mhd")]
            bz: self.bz * q,
            s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "isothermal"))]
    fn eos() -> Eos {
        Eos::adiabatic(5.0 / 3.0)
    }
    #[cfg(feature = "isothermal")]
    fn eos() -> Eos {
        Eos::isothermal(1.0)
    }

    #[test]
    fn test_to_prim_rejects_negative_density() {
        let u = Cons1D {
            d: -1.0,
            ..Cons1D::default()
        };
        let err = u.to_prim(0.0, &eos()).unwrap_err();
        assert_eq!(err.kind, NonPhysicalKind::Density);
    }

    #[cfg(not(feature = "isothermal"))]
    #[test]
    fn test_to_prim_rejects_negative_pressure() {
        let u = Cons1D {
            d: 1.0,
            mx: 10.0, // kinetic energy alone exceeds e
            e: 1.0,
            ..Cons1D::default()
        };
        let err = u.to_prim(0.0, &eos()).unwrap_err();
        assert_eq!(err.kind, NonPhysicalKind::Pressure);
    }

    #[test]
    fn test_prim_cons_roundtrip() {
        let mut u = Cons1D {
            d: 2.0,
            mx: 1.0,
            my: -0.5,
            mz: 0.25,
            ..Cons1D::default()
        };
        u.s[0] = 0.4;
        #[cfg(not(feature = "isothermal"))]
        {
            u.e = 5.0;
        }
        #[cfg(feature = "mhd")]
        {
            u.by = 0.3;
            u.bz = -0.7;
        }
        let bx = 0.9;
        let w = u.to_prim(bx, &eos()).unwrap();
        let u2 = w.to_cons(bx, &eos());
        assert!((u.d - u2.d).abs() < 1e-14);
        assert!((u.mx - u2.mx).abs() < 1e-14);
        assert!((u.my - u2.my).abs() < 1e-14);
        assert!((u.mz - u2.mz).abs() < 1e-14);
        assert!((u.s[0] - u2.s[0]).abs() < 1e-14);
        #[cfg(not(feature = "isothermal"))]
        assert!((u.e - u2.e).abs() < 1e-12);
    }

    #[test]
    fn test_cfast_positive() {
        let mut u = Cons1D {
            d: 1.0,
            ..Cons1D::default()
        };
        #[cfg(not(feature = "isothermal"))]
        {
            u.e = 2.0;
        }
        assert!(u.cfast(0.5, &eos()) > 0.0);
    }
}
