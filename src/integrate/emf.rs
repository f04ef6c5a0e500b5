//! Upwind integration of face-flux EMFs to cell edges.
//!
//! The edge EMF is the average of the four adjacent face-flux EMFs plus
//! four upwind derivative corrections `(face EMF - cell-centered EMF)`,
//! divided by four. The upwind side is chosen by the sign of the mass
//! flux on the transverse face; a vanishing mass flux averages both
//! sides. This stencil is what makes the face-field update preserve
//! div B = 0 to round-off.
//!
//! Flux-component signs: `x1Flux.by = -E3`, `x1Flux.bz = +E2`,
//! `x2Flux.by = -E1`, `x2Flux.bz = +E3`, `x3Flux.by = -E2`,
//! `x3Flux.bz = +E1`.

use super::Integrator;
use crate::grid::Grid;
use crate::Real;

/// Upwind selection of a derivative correction by the sign of the
/// transverse mass flux.
#[inline]
fn upwind(mass_flux: Real, minus_side: Real, plus_side: Real) -> Real {
    if mass_flux > 0.0 {
        minus_side
    } else if mass_flux < 0.0 {
        plus_side
    } else {
        0.5 * (minus_side + plus_side)
    }
}

impl Integrator {
    /// emf1 on x1-aligned edges (3D only).
    pub(crate) fn integrate_emf1_corner(&mut self, g: &Grid) {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        for k in (ks - 1)..=(ke + 2) {
            for j in (js - 1)..=(je + 2) {
                for i in (is - 2)..=(ie + 2) {
                    let de_l3 = upwind(
                        self.work.x2_flux[(k - 1, j, i)].d,
                        self.work.x3_flux[(k, j - 1, i)].bz - self.work.emf1_cc[(k - 1, j - 1, i)],
                        self.work.x3_flux[(k, j, i)].bz - self.work.emf1_cc[(k - 1, j, i)],
                    );
                    let de_r3 = upwind(
                        self.work.x2_flux[(k, j, i)].d,
                        self.work.x3_flux[(k, j - 1, i)].bz - self.work.emf1_cc[(k, j - 1, i)],
                        self.work.x3_flux[(k, j, i)].bz - self.work.emf1_cc[(k, j, i)],
                    );
                    let de_l2 = upwind(
                        self.work.x3_flux[(k, j - 1, i)].d,
                        -self.work.x2_flux[(k - 1, j, i)].by
                            - self.work.emf1_cc[(k - 1, j - 1, i)],
                        -self.work.x2_flux[(k, j, i)].by - self.work.emf1_cc[(k, j - 1, i)],
                    );
                    let de_r2 = upwind(
                        self.work.x3_flux[(k, j, i)].d,
                        -self.work.x2_flux[(k - 1, j, i)].by - self.work.emf1_cc[(k - 1, j, i)],
                        -self.work.x2_flux[(k, j, i)].by - self.work.emf1_cc[(k, j, i)],
                    );
                    self.work.emf1[(k, j, i)] = 0.25
                        * (self.work.x3_flux[(k, j, i)].bz
                            + self.work.x3_flux[(k, j - 1, i)].bz
                            - self.work.x2_flux[(k, j, i)].by
                            - self.work.x2_flux[(k - 1, j, i)].by
                            + de_l2
                            + de_r2
                            + de_l3
                            + de_r3);
                }
            }
        }
    }

    /// emf2 on x2-aligned edges (3D only).
    pub(crate) fn integrate_emf2_corner(&mut self, g: &Grid) {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        for k in (ks - 1)..=(ke + 2) {
            for j in (js - 2)..=(je + 2) {
                for i in (is - 1)..=(ie + 2) {
                    let de_l3 = upwind(
                        self.work.x1_flux[(k - 1, j, i)].d,
                        -self.work.x3_flux[(k, j, i - 1)].by
                            - self.work.emf2_cc[(k - 1, j, i - 1)],
                        -self.work.x3_flux[(k, j, i)].by - self.work.emf2_cc[(k - 1, j, i)],
                    );
                    let de_r3 = upwind(
                        self.work.x1_flux[(k, j, i)].d,
                        -self.work.x3_flux[(k, j, i - 1)].by - self.work.emf2_cc[(k, j, i - 1)],
                        -self.work.x3_flux[(k, j, i)].by - self.work.emf2_cc[(k, j, i)],
                    );
                    let de_l1 = upwind(
                        self.work.x3_flux[(k, j, i - 1)].d,
                        self.work.x1_flux[(k - 1, j, i)].bz - self.work.emf2_cc[(k - 1, j, i - 1)],
                        self.work.x1_flux[(k, j, i)].bz - self.work.emf2_cc[(k, j, i - 1)],
                    );
                    let de_r1 = upwind(
                        self.work.x3_flux[(k, j, i)].d,
                        self.work.x1_flux[(k - 1, j, i)].bz - self.work.emf2_cc[(k - 1, j, i)],
                        self.work.x1_flux[(k, j, i)].bz - self.work.emf2_cc[(k, j, i)],
                    );
                    self.work.emf2[(k, j, i)] = 0.25
                        * (self.work.x1_flux[(k, j, i)].bz
                            + self.work.x1_flux[(k - 1, j, i)].bz
                            - self.work.x3_flux[(k, j, i)].by
                            - self.work.x3_flux[(k, j, i - 1)].by
                            + de_l1
                            + de_r1
                            + de_l3
                            + de_r3);
                }
            }
        }
    }

    /// emf3 on x3-aligned edges (both 2D and 3D).
    pub(crate) fn integrate_emf3_corner(&mut self, g: &Grid) {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let (kl, ku) = if g.three_d() {
            (ks - 2, ke + 2)
        } else {
            (ks, ke)
        };
        for k in kl..=ku {
            for j in (js - 1)..=(je + 2) {
                for i in (is - 1)..=(ie + 2) {
                    let de_l2 = upwind(
                        self.work.x1_flux[(k, j - 1, i)].d,
                        self.work.x2_flux[(k, j, i - 1)].bz - self.work.emf3_cc[(k, j - 1, i - 1)],
                        self.work.x2_flux[(k, j, i)].bz - self.work.emf3_cc[(k, j - 1, i)],
                    );
                    let de_r2 = upwind(
                        self.work.x1_flux[(k, j, i)].d,
                        self.work.x2_flux[(k, j, i - 1)].bz - self.work.emf3_cc[(k, j, i - 1)],
                        self.work.x2_flux[(k, j, i)].bz - self.work.emf3_cc[(k, j, i)],
                    );
                    let de_l1 = upwind(
                        self.work.x2_flux[(k, j, i - 1)].d,
                        -self.work.x1_flux[(k, j - 1, i)].by
                            - self.work.emf3_cc[(k, j - 1, i - 1)],
                        -self.work.x1_flux[(k, j, i)].by - self.work.emf3_cc[(k, j, i - 1)],
                    );
                    let de_r1 = upwind(
                        self.work.x2_flux[(k, j, i)].d,
                        -self.work.x1_flux[(k, j - 1, i)].by - self.work.emf3_cc[(k, j - 1, i)],
                        -self.work.x1_flux[(k, j, i)].by - self.work.emf3_cc[(k, j, i)],
                    );
                    self.work.emf3[(k, j, i)] = 0.25
                        * (self.work.x2_flux[(k, j, i - 1)].bz
                            + self.work.x2_flux[(k, j, i)].bz
                            - self.work.x1_flux[(k, j - 1, i)].by
                            - self.work.x1_flux[(k, j, i)].by
                            + de_l1
                            + de_r1
                            + de_l2
                            + de_r2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::integrate::{Integrator, IntegratorConfig};
    use crate::state::{Eos, Gas};
    use crate::Grid;

    #[cfg(not(feature = "isothermal"))]
    fn eos() -> Eos {
        Eos::adiabatic(5.0 / 3.0)
    }
    #[cfg(feature = "isothermal")]
    fn eos() -> Eos {
        Eos::isothermal(1.0)
    }

    /// A uniform field advected by a uniform flow has a spatially
    /// constant EMF, so a full step must leave the face fields intact.
    #[test]
    fn test_uniform_advection_leaves_faces_unchanged() {
        let mut g = Grid::new([8, 8, 1], [0.0, 0.0, 0.0], [0.125, 0.125, 1.0]);
        g.init_with(|_, _, _| Gas {
            d: 1.0,
            m1: 1.0,
            m2: 0.5,
            #[cfg(not(feature = "isothermal"))]
            e: 3.0,
            ..Gas::default()
        });
        g.init_face_b(|_, _, _| 0.3, |_, _, _| -0.2, |_, _, _| 0.1);
        g.sync_cell_b();
        #[cfg(not(feature = "isothermal"))]
        {
            // account for the magnetic contribution in the total energy
            let (n3, n2, n1) = g.dims();
            for k in 0..n3 {
                for j in 0..n2 {
                    for i in 0..n1 {
                        let me = g.u[(k, j, i)].magnetic_energy();
                        g.u[(k, j, i)].e = 3.0 + me;
                    }
                }
            }
        }
        g.dt = 0.02;
        let cfg = IntegratorConfig::new(eos());
        let b1_before = g.b1i[(0, g.js + 3, g.is + 3)];
        let b2_before = g.b2i[(0, g.js + 3, g.is + 3)];
        let mut integ = Integrator::new(&g);
        integ.step(&mut g, &cfg).unwrap();
        assert!((g.b1i[(0, g.js + 3, g.is + 3)] - b1_before).abs() < 1e-13);
        assert!((g.b2i[(0, g.js + 3, g.is + 3)] - b2_before).abs() < 1e-13);
        // Cell/face consistency after the step.
        let c = g.u[(0, g.js + 3, g.is + 3)];
        let want = 0.5 * (g.b1i[(0, g.js + 3, g.is + 3)] + g.b1i[(0, g.js + 3, g.is + 4)]);
        assert_eq!(c.b1c, want);
    }
}
