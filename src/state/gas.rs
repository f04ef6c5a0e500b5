//! Conservative cell state.

use std::ops::{Add, Mul, Sub};

use super::Eos;
use crate::types::Direction;
use crate::{Real, NSCALARS};

/// Conservative variables in one grid cell.
///
/// Momenta and (with `mhd`) cell-centered field components are stored in
/// grid coordinates; the 1D sweep types rotate them into the local sweep
/// basis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gas {
    /// Mass density.
    pub d: Real,
    /// x1-momentum density.
    pub m1: Real,
    /// x2-momentum density.
    pub m2: Real,
    /// x3-momentum density.
    pub m3: Real,
    /// Total energy density (kinetic + internal + magnetic).
    #[cfg(not(feature = "isothermal"))]
    pub e: Real,
    /// Cell-centered x1 magnetic field.
    #[cfg(feature = "mhd")]
    pub b1c: Real,
    /// Cell-centered x2 magnetic field.
    #[cfg(feature = "mhd")]
    pub b2c: Real,
    /// Cell-centered x3 magnetic field.
    #[cfg(feature = "mhd")]
    pub b3c: Real,
    /// Passive scalar densities.
    pub s: [Real; NSCALARS],
}

impl Gas {
    /// Velocity components (v1, v2, v3).
    #[inline(always)]
    pub fn velocity(&self) -> (Real, Real, Real) {
        let di = 1.0 / self.d;
        (self.m1 * di, self.m2 * di, self.m3 * di)
    }

    /// Kinetic energy density 0.5 * |M|^2 / d.
    #[inline(always)]
    pub fn kinetic_energy(&self) -> Real {
        0.5 * (self.m1 * self.m1 + self.m2 * self.m2 + self.m3 * self.m3) / self.d
    }

    /// Magnetic energy density 0.5 * |B|^2 of the cell-centered field.
    #[cfg(feature = "mhd")]
    #[inline(always)]
    pub fn magnetic_energy(&self) -> Real {
        0.5 * (self.b1c * self.b1c + self.b2c * self.b2c + self.b3c * self.b3c)
    }

    /// Gas pressure from the total energy.
    #[cfg(not(feature = "isothermal"))]
    #[inline]
    pub fn pressure(&self, eos: &Eos) -> Real {
        #[cfg(feature = "mhd")]
        let me = self.magnetic_energy();
        #[cfg(not(feature = "mhd"))]
        let me = 0.0;
        eos.gm1() * (self.e - self.kinetic_energy() - me)
    }

    /// Squared sound speed.
    #[inline]
    pub fn sound_speed_sq(&self, eos: &Eos) -> Real {
        #[cfg(not(feature = "isothermal"))]
        {
            (eos.gamma * self.pressure(eos) / self.d).max(0.0)
        }
        #[cfg(feature = "isothermal")]
        {
            eos.iso_csound * eos.iso_csound
        }
    }

    /// Fast magnetosonic speed for a wave normal to `dir`.
    ///
    /// Reduces to the adiabatic/isothermal sound speed without `mhd`.
    pub fn cfast(&self, dir: Direction, eos: &Eos) -> Real {
        let asq = self.sound_speed_sq(eos);
        #[cfg(feature = "mhd")]
        {
            let di = 1.0 / self.d;
            let (bn, bt1, bt2) = match dir {
                Direction::X1 => (self.b1c, self.b2c, self.b3c),
                Direction::X2 => (self.b2c, self.b3c, self.b1c),
                Direction::X3 => (self.b3c, self.b1c, self.b2c),
            };
            let vaxsq = bn * bn * di;
            let vtsq = (bt1 * bt1 + bt2 * bt2) * di;
            let tsum = asq + vaxsq + vtsq;
            let disc = (tsum * tsum - 4.0 * asq * vaxsq).max(0.0);
            (0.5 * (tsum + disc.sqrt())).sqrt()
        }
        #[cfg(not(feature = "mhd"))]
        {
            let _ = dir;
            asq.sqrt()
        }
    }
}

impl Add for Gas {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.s[n] + other.s[n];
        }
        Self {
            d: self.d + other.d,
            m1: self.m1 + other.m1,
            m2: self.m2 + other.m2,
            m3: self.m3 + other.m3,
            #[cfg(not(feature = "isothermal"))]
            e: self.e + other.e,
            #[cfg(feature = "mhd")]
            b1c: self.b1c + other.b1c,
            #[cfg(feature = "mhd")]
            b2c: self.b2c + other.b2c,
            #[cfg(feature = "mhd")]
            b3c: self.b3c + other.b3c,
            s,
        }
    }
}

impl Sub for Gas {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.s[n] - other.s[n];
        }
        Self {
            d: self.d - other.d,
            m1: self.m1 - other.m1,
            m2: self.m2 - other.m2,
            m3: self.m3 - other.m3,
            #[cfg(not(feature = "isothermal"))]
            e: self.e - other.e,
            #[cfg(feature = "mhd")]
            b1c: self.b1c - other.b1c,
            #[cfg(feature = "mhd")]
            b2c: self.b2c - other.b2c,
            #[cfg(feature = "mhd")]
            b3c: self.b3c - other.b3c,
            s,
        }
    }
}

impl Mul<Real> for Gas {
    type Output = Self;

    fn mul(self, q: Real) -> Self {
        let mut s = [0.0; NSCALARS];
        for (n, v) in s.iter_mut().enumerate() {
            *v = self.s[n] * q;
        }
        Self {
            d: self.d * q,
            m1: self.m1 * q,
            m2: self.m2 * q,
            m3: self.m3 * q,
            #[cfg(not(feature = "isothermal"))]
            e: self.e * q,
            #[cfg(feature = "mhd")]
            b1c: self.b1c * q,
            #[cfg(feature = "mhd")]
            b2c: self.b2c * q,
            #[cfg(feature = "mhd")]
            b3c: self.b3c * q,
            s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_gas(d: Real) -> Gas {
        Gas {
            d,
            ..Gas::default()
        }
    }

    #[test]
    fn test_velocity() {
        let g = Gas {
            d: 2.0,
            m1: 4.0,
            m2: -2.0,
            m3: 1.0,
            ..Gas::default()
        };
        let (v1, v2, v3) = g.velocity();
        assert!((v1 - 2.0).abs() < 1e-14);
        assert!((v2 + 1.0).abs() < 1e-14);
        assert!((v3 - 0.5).abs() < 1e-14);
    }

    #[cfg(not(feature = "isothermal"))]
    #[test]
    fn test_pressure_still_gas() {
        let eos = Eos::adiabatic(5.0 / 3.0);
        let mut g = still_gas(1.0);
        g.e = 1.5; // pure internal energy
        assert!((g.pressure(&eos) - 1.0).abs() < 1e-14);
    }

    #[cfg(all(feature = "mhd", not(feature = "isothermal")))]
    #[test]
    fn test_cfast_reduces_to_sound_speed_without_field() {
        let eos = Eos::adiabatic(1.4);
        let mut g = still_gas(1.0);
        g.e = 1.0 / eos.gm1(); // p = 1
        let a = (1.4_f64).sqrt();
        assert!((g.cfast(Direction::X1, &eos) - a).abs() < 1e-12);
        assert!((g.cfast(Direction::X2, &eos) - a).abs() < 1e-12);
    }

    #[cfg(all(feature = "mhd", not(feature = "isothermal")))]
    #[test]
    fn test_cfast_exceeds_alfven_speed() {
        let eos = Eos::adiabatic(5.0 / 3.0);
        let mut g = still_gas(1.0);
        g.b1c = 2.0;
        g.e = 1.5 + g.magnetic_energy();
        let va = 2.0;
        assert!(g.cfast(Direction::X1, &eos) >= va);
    }

    #[test]
    fn test_arithmetic() {
        let a = Gas {
            d: 1.0,
            m1: 2.0,
            ..Gas::default()
        };
        let b = Gas {
            d: 3.0,
            m1: -1.0,
            ..Gas::default()
        };
        let sum = a + b;
        assert!((sum.d - 4.0).abs() < 1e-14);
        assert!((sum.m1 - 1.0).abs() < 1e-14);
        let diff = a - b;
        assert!((diff.d + 2.0).abs() < 1e-14);
        let scaled = a * 2.0;
        assert!((scaled.m1 - 4.0).abs() < 1e-14);
    }
}
