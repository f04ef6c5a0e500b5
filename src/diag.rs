//! Grid diagnostics: the divergence monitor and conserved-quantity sums
//! used by validation tests and run-time health checks.

use tracing::warn;

use crate::grid::Grid;
use crate::Real;

/// Maximum |div B| over the active zones, from the face-centered fields.
///
/// Constrained transport keeps this at round-off; anything larger
/// indicates corrupted face fields (for example, ghost faces filled by
/// an inconsistent user boundary).
#[cfg(feature = "mhd")]
pub fn max_div_b(g: &Grid) -> Real {
    let mut max_div: Real = 0.0;
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let mut div = (g.b1i[(k, j, i + 1)] - g.b1i[(k, j, i)]) / g.dx1
                    + (g.b2i[(k, j + 1, i)] - g.b2i[(k, j, i)]) / g.dx2;
                if g.three_d() {
                    div += (g.b3i[(k + 1, j, i)] - g.b3i[(k, j, i)]) / g.dx3;
                }
                max_div = max_div.max(div.abs());
            }
        }
    }
    max_div
}

/// Report div B drift beyond `tol`. Diagnostic only, never fatal.
#[cfg(feature = "mhd")]
pub fn check_div_b(g: &Grid, tol: Real) -> Real {
    let max_div = max_div_b(g);
    if max_div > tol {
        warn!(max_div, tol, time = g.time, "div B drift beyond tolerance");
    }
    max_div
}

/// Total mass over the active zones.
pub fn total_mass(g: &Grid) -> Real {
    let mut sum = 0.0;
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                sum += g.u[(k, j, i)].d;
            }
        }
    }
    sum * g.dx1 * g.dx2 * if g.three_d() { g.dx3 } else { 1.0 }
}

/// Total momentum components over the active zones.
pub fn total_momentum(g: &Grid) -> (Real, Real, Real) {
    let (mut m1, mut m2, mut m3) = (0.0, 0.0, 0.0);
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let q = g.u[(k, j, i)];
                m1 += q.m1;
                m2 += q.m2;
                m3 += q.m3;
            }
        }
    }
    let vol = g.dx1 * g.dx2 * if g.three_d() { g.dx3 } else { 1.0 };
    (m1 * vol, m2 * vol, m3 * vol)
}

/// Total energy over the active zones (zero for isothermal builds,
/// where no energy is evolved).
pub fn total_energy(g: &Grid) -> Real {
    #[cfg(not(feature = "isothermal"))]
    {
        let mut sum = 0.0;
        for k in g.ks..=g.ke {
            for j in g.js..=g.je {
                for i in g.is..=g.ie {
                    sum += g.u[(k, j, i)].e;
                }
            }
        }
        sum * g.dx1 * g.dx2 * if g.three_d() { g.dx3 } else { 1.0 }
    }
    #[cfg(feature = "isothermal")]
    {
        let _ = g;
        0.0
    }
}

/// Magnetic energy over the active zones, from the cell-centered field.
#[cfg(feature = "mhd")]
pub fn magnetic_energy(g: &Grid) -> Real {
    let mut sum = 0.0;
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                sum += g.u[(k, j, i)].magnetic_energy();
            }
        }
    }
    sum * g.dx1 * g.dx2 * if g.three_d() { g.dx3 } else { 1.0 }
}

/// Minimum and maximum density over the active zones.
pub fn min_max_density(g: &Grid) -> (Real, Real) {
    let mut min = Real::INFINITY;
    let mut max = Real::NEG_INFINITY;
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let d = g.u[(k, j, i)].d;
                min = min.min(d);
                max = max.max(d);
            }
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Gas;

    #[test]
    fn test_total_mass_uniform() {
        let mut g = Grid::new([8, 4, 1], [0.0, 0.0, 0.0], [0.125, 0.25, 1.0]);
        g.init_with(|_, _, _| Gas {
            d: 2.0,
            ..Gas::default()
        });
        // 8*4 cells * 2.0 * dx1*dx2 = 32 * 2 * 0.03125 = 2.0
        assert!((total_mass(&g) - 2.0).abs() < 1e-13);
    }

    #[cfg(feature = "mhd")]
    #[test]
    fn test_div_b_zero_for_uniform_field() {
        let mut g = Grid::new([8, 8, 1], [0.0, 0.0, 0.0], [0.125, 0.125, 1.0]);
        g.init_face_b(|_, _, _| 1.0, |_, _, _| -0.5, |_, _, _| 0.25);
        g.sync_cell_b();
        assert!(max_div_b(&g) < 1e-14);
    }

    #[cfg(feature = "mhd")]
    #[test]
    fn test_div_b_detects_monopole() {
        let mut g = Grid::new([8, 8, 1], [0.0, 0.0, 0.0], [0.125, 0.125, 1.0]);
        g.init_face_b(|_, _, _| 0.0, |_, _, _| 0.0, |_, _, _| 0.0);
        g.b1i[(0, g.js + 2, g.is + 3)] = 1.0;
        assert!(max_div_b(&g) > 1.0);
    }

    #[test]
    fn test_min_max_density() {
        let mut g = Grid::new([4, 4, 1], [0.0, 0.0, 0.0], [0.25, 0.25, 1.0]);
        g.init_with(|x1, _, _| Gas {
            d: 1.0 + x1,
            ..Gas::default()
        });
        let (min, max) = min_max_density(&g);
        assert!(min < max);
        assert!(min > 1.0 && max < 2.0);
    }
}
