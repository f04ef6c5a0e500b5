//! Primitive state in the local 1D sweep basis.

use std::ops::{Add, Mul, Sub};

use super::{Cons1D, Eos};
use crate::{Real, NSCALARS};

/// Primitive variables along one sweep: velocities instead of momenta and
/// (adiabatic) gas pressure instead of total energy. Passive scalars are
/// stored as concentrations `r = s / d`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Prim1D {
    /// Mass density.
    pub d: Real,
    /// Velocity along the sweep.
    pub vx: Real,
    /// First transverse velocity.
    pub vy: Real,
    /// Second transverse velocity.
    pub vz: Real,
    /// Gas pressure.
    #[cfg(not(feature = "isothermal"))]
    pub p: Real,
    /// First transverse magnetic field component.
    #[cfg(feature = "mhd")]
    pub by: Real,
    /// Second transverse magnetic field component.
    #[cfg(feature = "mhd")]
    pub bz: Real,
    /// Passive scalar concentrations.
    pub r: [Real; NSCALARS],
}

impl Prim1D {
    /// Convert to conservative variables.
    #[cfg_attr(
        any(not(feature = "mhd"), feature = "isothermal"),
        allow(unused_variables)
    )]
    pub fn to_cons(&self, bx: Real, eos: &Eos) -> Cons1D {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.r[n] * self.d;
        }
        Cons1D {
            d: self.d,
            mx: self.d * self.vx,
            my: self.d * self.vy,
            mz: self.d * self.vz,
            #[cfg(not(feature = "isothermal"))]
            e: {
                let ke =
                    0.5 * self.d * (self.vx * self.vx + self.vy * self.vy + self.vz * self.vz);
                #[cfg(feature = "mhd")]
                let me = 0.5 * (bx * bx + self.by * self.by + self.bz * self.bz);
                #[cfg(not(feature = "mhd"))]
                let me = 0.0;
                self.p / eos.gm1() + ke + me
            },
            #[cfg(feature = "mhd")]
            by: self.by,
            #[cfg(feature = "mhd")]
            bz: self.bz,
            s,
        }
    }

    /// Sound speed of this state.
    pub fn sound_speed(&self, eos: &Eos) -> Real {
        #[cfg(not(feature = "isothermal"))]
        {
            (eos.gamma * self.p.max(0.0) / self.d).sqrt()
        }
        #[cfg(feature = "isothermal")]
        {
            eos.iso_csound
        }
    }

    /// Fast magnetosonic speed of this state for the sweep direction.
    #[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
    pub fn cfast(&self, bx: Real, eos: &Eos) -> Real {
        let a = self.sound_speed(eos);
        #[cfg(feature = "mhd")]
        {
            let di = 1.0 / self.d;
            let asq = a * a;
            let vaxsq = bx * bx * di;
            let vtsq = (self.by * self.by + self.bz * self.bz) * di;
            let tsum = asq + vaxsq + vtsq;
            let disc = (tsum * tsum - 4.0 * asq * vaxsq).max(0.0);
            (0.5 * (tsum + disc.sqrt())).sqrt()
        }
        #[cfg(not(feature = "mhd"))]
        {
            a
        }
    }
}

impl Add for Prim1D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut r = [0.0; NSCALARS];
        for (n, v) in r.iter_mut().enumerate() {
            *v = self.r[n] + other.r[n];
        }
        Self {
            d: self.d + other.d,
            vx: self.vx + other.vx,
            vy: self.vy + other.vy,
            vz: self.vz + other.vz,
            #[cfg(not(feature = "isothermal"))]
            p: self.p + other.p,
            #[cfg(feature = "mhd")]
            by: self.by + other.by,
            #[cfg(feature = "mhd")]
            bz: self.bz + other.bz,
            r,
        }
    }
}

impl Sub for Prim1D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let mut r = [0.0; NSCALARS];
        for (n, v) in r.iter_mut().enumerate() {
            *v = self.r[n] - other.r[n];
        }
        Self {
            d: self.d - other.d,
            vx: self.vx - other.vx,
            vy: self.vy - other.vy,
            vz: self.vz - other.vz,
            #[cfg(not(feature = "isothermal"))]
            p: self.p - other.p,
            #[cfg(feature = "mhd")]
            by: self.by - other.by,
            #[cfg(feature = "mhd")]
            bz: self.bz - other.bz,
            r,
        }
    }
}

impl Mul<Real> for Prim1D {
    type Output = Self;

    fn mul(self, q: Real) -> Self {
        let mut r = [0.0; NSCALARS];
        for (n, v) in r.iter_mut().enumerate() {
            *v = self.r[n] * q;
        }
        Self {
            d: self.d * q,
            vx: self.vx * q,
            vy: self.vy * q,
            vz: self.vz * q,
            #[cfg(not(feature = "isothermal"))]
            p: self.p * q,
            #[cfg(feature = "mhd")]
            by: self.by * q,
            #[cfg(feature = "mhd")]
            bz: self.bz * q,
            r,
        }
    }
}
