//! The unsplit CTU step.
//!
//! Advances one tile from `t` to `t + dt` with second-order accuracy:
//! longitudinal predictor sweeps, transverse flux corrections with the
//! limited MHD source terms, two rounds of corner-EMF constrained
//! transport, gravity and shearing-box sources, and the conservative
//! update. The x3 machinery is elided on `Nx3 = 1` grids; everything
//! else is shared between 2D and 3D.

use super::{IntegratorConfig, StepError, Sweep};
use crate::grid::Grid;
use crate::state::Cons1D;
use crate::{NGHOST, NSCALARS};

#[cfg(feature = "mhd")]
use super::mdb;

use super::Integrator;

impl Integrator {
    /// Advance `g` by one step of size `g.dt`.
    ///
    /// Ghost zones must have been filled by the boundary subsystem
    /// beforehand. On failure the tile is left partially updated; the
    /// caller restores its own checkpoint before retrying with a
    /// smaller step.
    pub fn step(&mut self, g: &mut Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        assert!(
            g.nx2 > 1,
            "the CTU integrator requires at least a 2D grid (nx2 > 1)"
        );
        if cfg.h_correction {
            self.ensure_eta(g);
        }

        // Step 1-3: longitudinal predictor sweeps.
        self.sweep_x1(g, cfg)?;
        self.sweep_x2(g, cfg)?;
        if g.three_d() {
            self.sweep_x3(g, cfg)?;
        }

        // Step 4-5: cell-centered EMFs at t^n, corner integration, and
        // the half-step face-field update.
        #[cfg(feature = "mhd")]
        {
            self.cc_emfs_initial(g);
            self.integrate_emf3_corner(g);
            if g.three_d() {
                self.integrate_emf1_corner(g);
                self.integrate_emf2_corner(g);
            }
            self.half_step_faces(g);
        }

        // Step 6-8: transverse flux corrections of the face states.
        self.correct_x1_faces(g, cfg);
        self.correct_x2_faces(g, cfg);
        if g.three_d() {
            self.correct_x3_faces(g, cfg);
        }

        // Step 9: half-step density and cell-centered EMFs at t^{n+1/2}.
        self.half_step_density(g, cfg)?;
        #[cfg(feature = "mhd")]
        self.cc_emfs_half(g, cfg);

        // Step 10: H-correction wavespeeds and final fluxes.
        if cfg.h_correction {
            self.compute_eta(g, cfg);
        }
        self.final_fluxes(g, cfg)?;

        // Step 11: corner EMFs at t^{n+1/2} and the full face update.
        #[cfg(feature = "mhd")]
        {
            self.integrate_emf3_corner(g);
            if g.three_d() {
                self.integrate_emf1_corner(g);
                self.integrate_emf2_corner(g);
            }
            self.full_step_faces(g);
        }

        // Step 12: full-step gravity / shearing-box sources.
        self.source_full_step(g, cfg);

        // Step 13: conservative update from all direction fluxes.
        self.conservative_update(g);

        // Step 14: cell-centered field synchronization and positivity.
        #[cfg(feature = "mhd")]
        self.finalize_b(g);
        self.check_positivity(g, cfg)
    }

    // ---------------------------------------------------------------
    // Predictor sweeps
    // ---------------------------------------------------------------

    /// Load x1 rows, reconstruct, add half-dt sources, compute fluxes.
    /// Local basis: (Mx, My, Mz) = (M1, M2, M3), (By, Bz) = (B2c, B3c).
    fn sweep_x1(&mut self, g: &Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let dt = g.dt;
        #[cfg(feature = "mhd")]
        let hdt = 0.5 * dt;
        let dtodx1 = dt / g.dx1;
        let (kl, ku) = if three_d { (ks - 2, ke + 2) } else { (ks, ke) };

        for k in kl..=ku {
            for j in (js - 2)..=(je + 2) {
                for i in (is - NGHOST)..=(ie + NGHOST) {
                    let q = g.u[(k, j, i)];
                    let mut u1 = Cons1D {
                        d: q.d,
                        mx: q.m1,
                        my: q.m2,
                        mz: q.m3,
                        ..Cons1D::default()
                    };
                    #[cfg(not(feature = "isothermal"))]
                    {
                        u1.e = q.e;
                    }
                    #[cfg(feature = "mhd")]
                    {
                        u1.by = q.b2c;
                        u1.bz = q.b3c;
                        self.work.bxc[i] = q.b1c;
                        self.work.bxi[i] = g.b1i[(k, j, i)];
                        self.work.b1_x1[(k, j, i)] = g.b1i[(k, j, i)];
                    }
                    u1.s = q.s;
                    self.work.u1d[i] = u1;
                }

                for i in (is - NGHOST)..=(ie + NGHOST) {
                    self.work.w[i] = self.work.u1d[i]
                        .to_prim(self.work.bxc[i], &cfg.eos)
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X1))?;
                }
                self.recon.reconstruct(
                    &self.work.w,
                    &self.work.bxc,
                    dt,
                    dtodx1,
                    is - 1,
                    ie + 1,
                    &cfg.eos,
                    &mut self.work.wl,
                    &mut self.work.wr,
                );

                // Multidimensional field source terms for dt/2, with the
                // same-sign-zero limiting of the transverse gradients.
                #[cfg(feature = "mhd")]
                for i in (is - 1)..=(ie + 2) {
                    for (cell_i, face) in [(i - 1, 0usize), (i, 1usize)] {
                        let db1 =
                            (g.b1i[(k, j, cell_i + 1)] - g.b1i[(k, j, cell_i)]) / g.dx1;
                        let db2 =
                            (g.b2i[(k, j + 1, cell_i)] - g.b2i[(k, j, cell_i)]) / g.dx2;
                        let db3 = if three_d {
                            (g.b3i[(k + 1, j, cell_i)] - g.b3i[(k, j, cell_i)]) / g.dx3
                        } else {
                            0.0
                        };
                        let (l2, l3) = if db1 >= 0.0 {
                            (db1.min(-db2).max(0.0), db1.min(-db3).max(0.0))
                        } else {
                            (db1.max(-db2).min(0.0), db1.max(-db3).min(0.0))
                        };
                        let q = g.u[(k, j, cell_i)];
                        let src_by = q.m2 / q.d * l2;
                        let src_bz = q.m3 / q.d * l3;
                        let target = if face == 0 {
                            &mut self.work.wl[i]
                        } else {
                            &mut self.work.wr[i]
                        };
                        target.by += hdt * src_by;
                        target.bz += hdt * src_bz;
                    }
                }

                // Gravity acceleration for dt/2 on the normal velocity.
                if let Some(phi) = cfg.gravity {
                    for i in (is - 1)..=(ie + 2) {
                        let (x1, x2, x3) = g.cc_pos(i, j, k);
                        let phicr = phi(x1, x2, x3);
                        let phicl = phi(x1 - g.dx1, x2, x3);
                        let phifc = phi(x1 - 0.5 * g.dx1, x2, x3);
                        self.work.wl[i].vx -= dtodx1 * (phifc - phicl);
                        self.work.wr[i].vx -= dtodx1 * (phicr - phifc);
                    }
                }

                // Shearing-box Coriolis terms for dt/2.
                if let Some(sb) = cfg.shearing {
                    for i in (is - 1)..=(ie + 2) {
                        let om = sb.omega;
                        self.work.wl[i].vx += dt * om * self.work.w[i - 1].vy;
                        self.work.wl[i].vy -= dt * om * self.work.w[i - 1].vx;
                        self.work.wr[i].vx += dt * om * self.work.w[i].vy;
                        self.work.wr[i].vy -= dt * om * self.work.w[i].vx;
                    }
                }

                for i in (is - 1)..=(ie + 2) {
                    self.work.ul_x1[(k, j, i)] =
                        self.work.wl[i].to_cons(self.work.bxi[i], &cfg.eos);
                    self.work.ur_x1[(k, j, i)] =
                        self.work.wr[i].to_cons(self.work.bxi[i], &cfg.eos);
                }
                for i in (is - 1)..=(ie + 2) {
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b1_x1[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    self.work.x1_flux[(k, j, i)] = self
                        .solver
                        .flux(
                            bn,
                            &self.work.ul_x1[(k, j, i)],
                            &self.work.ur_x1[(k, j, i)],
                            0.0,
                            &cfg.eos,
                        )
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X1))?;
                }
            }
        }
        Ok(())
    }

    /// x2 sweep. Local basis: (Mx, My, Mz) = (M2, M3, M1),
    /// (By, Bz) = (B3c, B1c).
    fn sweep_x2(&mut self, g: &Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let dt = g.dt;
        #[cfg(feature = "mhd")]
        let hdt = 0.5 * dt;
        let dtodx2 = dt / g.dx2;
        let (kl, ku) = if three_d { (ks - 2, ke + 2) } else { (ks, ke) };

        for k in kl..=ku {
            for i in (is - 2)..=(ie + 2) {
                for j in (js - NGHOST)..=(je + NGHOST) {
                    let q = g.u[(k, j, i)];
                    let mut u1 = Cons1D {
                        d: q.d,
                        mx: q.m2,
                        my: q.m3,
                        mz: q.m1,
                        ..Cons1D::default()
                    };
                    #[cfg(not(feature = "isothermal"))]
                    {
                        u1.e = q.e;
                    }
                    #[cfg(feature = "mhd")]
                    {
                        u1.by = q.b3c;
                        u1.bz = q.b1c;
                        self.work.bxc[j] = q.b2c;
                        self.work.bxi[j] = g.b2i[(k, j, i)];
                        self.work.b2_x2[(k, j, i)] = g.b2i[(k, j, i)];
                    }
                    u1.s = q.s;
                    self.work.u1d[j] = u1;
                }

                for j in (js - NGHOST)..=(je + NGHOST) {
                    self.work.w[j] = self.work.u1d[j]
                        .to_prim(self.work.bxc[j], &cfg.eos)
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X2))?;
                }
                self.recon.reconstruct(
                    &self.work.w,
                    &self.work.bxc,
                    dt,
                    dtodx2,
                    js - 1,
                    je + 1,
                    &cfg.eos,
                    &mut self.work.wl,
                    &mut self.work.wr,
                );

                #[cfg(feature = "mhd")]
                for j in (js - 1)..=(je + 2) {
                    for (cell_j, face) in [(j - 1, 0usize), (j, 1usize)] {
                        let db1 =
                            (g.b1i[(k, cell_j, i + 1)] - g.b1i[(k, cell_j, i)]) / g.dx1;
                        let db2 =
                            (g.b2i[(k, cell_j + 1, i)] - g.b2i[(k, cell_j, i)]) / g.dx2;
                        let db3 = if three_d {
                            (g.b3i[(k + 1, cell_j, i)] - g.b3i[(k, cell_j, i)]) / g.dx3
                        } else {
                            0.0
                        };
                        let (l1, l3) = if db2 >= 0.0 {
                            (db2.min(-db1).max(0.0), db2.min(-db3).max(0.0))
                        } else {
                            (db2.max(-db1).min(0.0), db2.max(-db3).min(0.0))
                        };
                        let q = g.u[(k, cell_j, i)];
                        let src_by = q.m3 / q.d * l3;
                        let src_bz = q.m1 / q.d * l1;
                        let target = if face == 0 {
                            &mut self.work.wl[j]
                        } else {
                            &mut self.work.wr[j]
                        };
                        target.by += hdt * src_by;
                        target.bz += hdt * src_bz;
                    }
                }

                if let Some(phi) = cfg.gravity {
                    for j in (js - 1)..=(je + 2) {
                        let (x1, x2, x3) = g.cc_pos(i, j, k);
                        let phicr = phi(x1, x2, x3);
                        let phicl = phi(x1, x2 - g.dx2, x3);
                        let phifc = phi(x1, x2 - 0.5 * g.dx2, x3);
                        self.work.wl[j].vx -= dtodx2 * (phifc - phicl);
                        self.work.wr[j].vx -= dtodx2 * (phicr - phifc);
                    }
                }

                for j in (js - 1)..=(je + 2) {
                    self.work.ul_x2[(k, j, i)] =
                        self.work.wl[j].to_cons(self.work.bxi[j], &cfg.eos);
                    self.work.ur_x2[(k, j, i)] =
                        self.work.wr[j].to_cons(self.work.bxi[j], &cfg.eos);
                }
                for j in (js - 1)..=(je + 2) {
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b2_x2[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    self.work.x2_flux[(k, j, i)] = self
                        .solver
                        .flux(
                            bn,
                            &self.work.ul_x2[(k, j, i)],
                            &self.work.ur_x2[(k, j, i)],
                            0.0,
                            &cfg.eos,
                        )
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X2))?;
                }
            }
        }
        Ok(())
    }

    /// x3 sweep (3D only). Local basis: (Mx, My, Mz) = (M3, M1, M2),
    /// (By, Bz) = (B1c, B2c).
    fn sweep_x3(&mut self, g: &Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let dt = g.dt;
        #[cfg(feature = "mhd")]
        let hdt = 0.5 * dt;
        let dtodx3 = dt / g.dx3;

        for j in (js - 2)..=(je + 2) {
            for i in (is - 2)..=(ie + 2) {
                for k in (ks - NGHOST)..=(ke + NGHOST) {
                    let q = g.u[(k, j, i)];
                    let mut u1 = Cons1D {
                        d: q.d,
                        mx: q.m3,
                        my: q.m1,
                        mz: q.m2,
                        ..Cons1D::default()
                    };
                    #[cfg(not(feature = "isothermal"))]
                    {
                        u1.e = q.e;
                    }
                    #[cfg(feature = "mhd")]
                    {
                        u1.by = q.b1c;
                        u1.bz = q.b2c;
                        self.work.bxc[k] = q.b3c;
                        self.work.bxi[k] = g.b3i[(k, j, i)];
                        self.work.b3_x3[(k, j, i)] = g.b3i[(k, j, i)];
                    }
                    u1.s = q.s;
                    self.work.u1d[k] = u1;
                }

                for k in (ks - NGHOST)..=(ke + NGHOST) {
                    self.work.w[k] = self.work.u1d[k]
                        .to_prim(self.work.bxc[k], &cfg.eos)
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X3))?;
                }
                self.recon.reconstruct(
                    &self.work.w,
                    &self.work.bxc,
                    dt,
                    dtodx3,
                    ks - 1,
                    ke + 1,
                    &cfg.eos,
                    &mut self.work.wl,
                    &mut self.work.wr,
                );

                #[cfg(feature = "mhd")]
                for k in (ks - 1)..=(ke + 2) {
                    for (cell_k, face) in [(k - 1, 0usize), (k, 1usize)] {
                        let db1 =
                            (g.b1i[(cell_k, j, i + 1)] - g.b1i[(cell_k, j, i)]) / g.dx1;
                        let db2 =
                            (g.b2i[(cell_k, j + 1, i)] - g.b2i[(cell_k, j, i)]) / g.dx2;
                        let db3 =
                            (g.b3i[(cell_k + 1, j, i)] - g.b3i[(cell_k, j, i)]) / g.dx3;
                        let (l1, l2) = if db3 >= 0.0 {
                            (db3.min(-db1).max(0.0), db3.min(-db2).max(0.0))
                        } else {
                            (db3.max(-db1).min(0.0), db3.max(-db2).min(0.0))
                        };
                        let q = g.u[(cell_k, j, i)];
                        let src_by = q.m1 / q.d * l1;
                        let src_bz = q.m2 / q.d * l2;
                        let target = if face == 0 {
                            &mut self.work.wl[k]
                        } else {
                            &mut self.work.wr[k]
                        };
                        target.by += hdt * src_by;
                        target.bz += hdt * src_bz;
                    }
                }

                if let Some(phi) = cfg.gravity {
                    for k in (ks - 1)..=(ke + 2) {
                        let (x1, x2, x3) = g.cc_pos(i, j, k);
                        let phicr = phi(x1, x2, x3);
                        let phicl = phi(x1, x2, x3 - g.dx3);
                        let phifc = phi(x1, x2, x3 - 0.5 * g.dx3);
                        self.work.wl[k].vx -= dtodx3 * (phifc - phicl);
                        self.work.wr[k].vx -= dtodx3 * (phicr - phifc);
                    }
                }

                for k in (ks - 1)..=(ke + 2) {
                    self.work.ul_x3[(k, j, i)] =
                        self.work.wl[k].to_cons(self.work.bxi[k], &cfg.eos);
                    self.work.ur_x3[(k, j, i)] =
                        self.work.wr[k].to_cons(self.work.bxi[k], &cfg.eos);
                }
                for k in (ks - 1)..=(ke + 2) {
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b3_x3[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    self.work.x3_flux[(k, j, i)] = self
                        .solver
                        .flux(
                            bn,
                            &self.work.ul_x3[(k, j, i)],
                            &self.work.ur_x3[(k, j, i)],
                            0.0,
                            &cfg.eos,
                        )
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X3))?;
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Constrained transport
    // ---------------------------------------------------------------

    /// Cell-centered EMFs at t^n: emf3 = (B1c M2 - B2c M1)/d, cyclic.
    #[cfg(feature = "mhd")]
    fn cc_emfs_initial(&mut self, g: &Grid) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let (kl, ku) = if three_d { (ks - 2, ke + 2) } else { (ks, ke) };
        for k in kl..=ku {
            for j in (js - 2)..=(je + 2) {
                for i in (is - 2)..=(ie + 2) {
                    let q = g.u[(k, j, i)];
                    let di = 1.0 / q.d;
                    self.work.emf3_cc[(k, j, i)] = (q.b1c * q.m2 - q.b2c * q.m1) * di;
                    if three_d {
                        self.work.emf1_cc[(k, j, i)] = (q.b2c * q.m3 - q.b3c * q.m2) * di;
                        self.work.emf2_cc[(k, j, i)] = (q.b3c * q.m1 - q.b1c * q.m3) * di;
                    }
                }
            }
        }
    }

    /// Half-dt update of the working face fields from the edge EMFs.
    #[cfg(feature = "mhd")]
    fn half_step_faces(&mut self, g: &Grid) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let q1 = 0.5 * g.dt / g.dx1;
        let q2 = 0.5 * g.dt / g.dx2;
        if three_d {
            let q3 = 0.5 * g.dt / g.dx3;
            for k in (ks - 1)..=(ke + 1) {
                for j in (js - 1)..=(je + 1) {
                    for i in (is - 1)..=(ie + 1) {
                        self.work.b1_x1[(k, j, i)] += q3
                            * (self.work.emf2[(k + 1, j, i)] - self.work.emf2[(k, j, i)])
                            - q2 * (self.work.emf3[(k, j + 1, i)] - self.work.emf3[(k, j, i)]);
                        self.work.b2_x2[(k, j, i)] += q1
                            * (self.work.emf3[(k, j, i + 1)] - self.work.emf3[(k, j, i)])
                            - q3 * (self.work.emf1[(k + 1, j, i)] - self.work.emf1[(k, j, i)]);
                        self.work.b3_x3[(k, j, i)] += q2
                            * (self.work.emf1[(k, j + 1, i)] - self.work.emf1[(k, j, i)])
                            - q1 * (self.work.emf2[(k, j, i + 1)] - self.work.emf2[(k, j, i)]);
                    }
                    let iu = ie + 2;
                    self.work.b1_x1[(k, j, iu)] += q3
                        * (self.work.emf2[(k + 1, j, iu)] - self.work.emf2[(k, j, iu)])
                        - q2 * (self.work.emf3[(k, j + 1, iu)] - self.work.emf3[(k, j, iu)]);
                }
                let ju = je + 2;
                for i in (is - 1)..=(ie + 1) {
                    self.work.b2_x2[(k, ju, i)] += q1
                        * (self.work.emf3[(k, ju, i + 1)] - self.work.emf3[(k, ju, i)])
                        - q3 * (self.work.emf1[(k + 1, ju, i)] - self.work.emf1[(k, ju, i)]);
                }
            }
            let ku = ke + 2;
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 1) {
                    self.work.b3_x3[(ku, j, i)] += q2
                        * (self.work.emf1[(ku, j + 1, i)] - self.work.emf1[(ku, j, i)])
                        - q1 * (self.work.emf2[(ku, j, i + 1)] - self.work.emf2[(ku, j, i)]);
                }
            }
        } else {
            let k = ks;
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 1) {
                    self.work.b1_x1[(k, j, i)] -=
                        q2 * (self.work.emf3[(k, j + 1, i)] - self.work.emf3[(k, j, i)]);
                    self.work.b2_x2[(k, j, i)] +=
                        q1 * (self.work.emf3[(k, j, i + 1)] - self.work.emf3[(k, j, i)]);
                }
                let iu = ie + 2;
                self.work.b1_x1[(k, j, iu)] -=
                    q2 * (self.work.emf3[(k, j + 1, iu)] - self.work.emf3[(k, j, iu)]);
            }
            let ju = je + 2;
            for i in (is - 1)..=(ie + 1) {
                self.work.b2_x2[(k, ju, i)] +=
                    q1 * (self.work.emf3[(k, ju, i + 1)] - self.work.emf3[(k, ju, i)]);
            }
        }
    }

    // ---------------------------------------------------------------
    // Transverse corrections
    // ---------------------------------------------------------------

    /// Correct the x1-face states with x2 (and x3) flux gradients, the
    /// limited field source terms, and transverse gravity.
    /// x2-flux rotation: (Mx,My,Mz) <- (Mz,Mx,My); x3: (My,Mz,Mx).
    fn correct_x1_faces(&mut self, g: &Grid, cfg: &IntegratorConfig) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        #[cfg(feature = "mhd")]
        let hdt = 0.5 * g.dt;
        let q2 = 0.5 * g.dt / g.dx2;
        let q3 = 0.5 * g.dt / g.dx3;
        let (kl, ku) = if three_d { (ks - 1, ke + 1) } else { (ks, ke) };

        for k in kl..=ku {
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 2) {
                    // x2-flux gradients
                    for (ci, left) in [(i - 1, true), (i, false)] {
                        let du =
                            self.work.x2_flux[(k, j + 1, ci)] - self.work.x2_flux[(k, j, ci)];
                        let t = if left {
                            &mut self.work.ul_x1[(k, j, i)]
                        } else {
                            &mut self.work.ur_x1[(k, j, i)]
                        };
                        t.d -= q2 * du.d;
                        t.mx -= q2 * du.mz;
                        t.my -= q2 * du.mx;
                        t.mz -= q2 * du.my;
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e -= q2 * du.e;
                        }
                        for n in 0..NSCALARS {
                            t.s[n] -= q2 * du.s[n];
                        }
                        #[cfg(feature = "mhd")]
                        {
                            if three_d {
                                let de = (self.work.emf1[(k, j + 1, ci)]
                                    - self.work.emf1[(k, j, ci)])
                                    + (self.work.emf1[(k + 1, j + 1, ci)]
                                        - self.work.emf1[(k + 1, j, ci)]);
                                let t = if left {
                                    &mut self.work.ul_x1[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x1[(k, j, i)]
                                };
                                t.bz += q2 * 0.5 * de;
                            } else {
                                let t = if left {
                                    &mut self.work.ul_x1[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x1[(k, j, i)]
                                };
                                t.bz -= q2 * du.by;
                            }
                        }
                    }

                    // x3-flux gradients (3D)
                    if three_d {
                        for (ci, left) in [(i - 1, true), (i, false)] {
                            let du = self.work.x3_flux[(k + 1, j, ci)]
                                - self.work.x3_flux[(k, j, ci)];
                            let t = if left {
                                &mut self.work.ul_x1[(k, j, i)]
                            } else {
                                &mut self.work.ur_x1[(k, j, i)]
                            };
                            t.d -= q3 * du.d;
                            t.mx -= q3 * du.my;
                            t.my -= q3 * du.mz;
                            t.mz -= q3 * du.mx;
                            #[cfg(not(feature = "isothermal"))]
                            {
                                t.e -= q3 * du.e;
                            }
                            for n in 0..NSCALARS {
                                t.s[n] -= q3 * du.s[n];
                            }
                            #[cfg(feature = "mhd")]
                            {
                                let de = (self.work.emf1[(k + 1, j, ci)]
                                    - self.work.emf1[(k, j, ci)])
                                    + (self.work.emf1[(k + 1, j + 1, ci)]
                                        - self.work.emf1[(k, j + 1, ci)]);
                                let t = if left {
                                    &mut self.work.ul_x1[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x1[(k, j, i)]
                                };
                                t.by -= q3 * 0.5 * de;
                            }
                        }
                    }

                    // Limited field source terms on the face states.
                    #[cfg(feature = "mhd")]
                    for (ci, left) in [(i - 1, true), (i, false)] {
                        let db1 = (g.b1i[(k, j, ci + 1)] - g.b1i[(k, j, ci)]) / g.dx1;
                        let db2 = (g.b2i[(k, j + 1, ci)] - g.b2i[(k, j, ci)]) / g.dx2;
                        let db3 = if three_d {
                            (g.b3i[(k + 1, j, ci)] - g.b3i[(k, j, ci)]) / g.dx3
                        } else {
                            0.0
                        };
                        let q = g.u[(k, j, ci)];
                        let v2 = q.m2 / q.d;
                        let v3 = q.m3 / q.d;
                        let mdb2 = mdb(db1, db2);
                        let mdb3 = mdb(db1, db3);
                        let t = if left {
                            &mut self.work.ul_x1[(k, j, i)]
                        } else {
                            &mut self.work.ur_x1[(k, j, i)]
                        };
                        t.mx += hdt * q.b1c * db1;
                        t.my += hdt * q.b2c * db1;
                        t.mz += hdt * q.b3c * db1;
                        t.by += hdt * v2 * (-mdb3);
                        t.bz += hdt * v3 * (-mdb2);
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e += hdt * (q.b2c * v2 * (-mdb3) + q.b3c * v3 * (-mdb2));
                        }
                    }

                    // Transverse gravity.
                    if let Some(phi) = cfg.gravity {
                        for (ci, left) in [(i - 1, true), (i, false)] {
                            let (x1, x2, x3) = g.cc_pos(ci, j, k);
                            let phic = phi(x1, x2, x3);
                            let phir = phi(x1, x2 + 0.5 * g.dx2, x3);
                            let phil = phi(x1, x2 - 0.5 * g.dx2, x3);
                            let d = g.u[(k, j, ci)].d;
                            #[cfg(not(feature = "isothermal"))]
                            let e_src2 = q2
                                * (self.work.x2_flux[(k, j, ci)].d * (phic - phil)
                                    + self.work.x2_flux[(k, j + 1, ci)].d * (phir - phic));
                            {
                                let t = if left {
                                    &mut self.work.ul_x1[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x1[(k, j, i)]
                                };
                                t.my -= q2 * (phir - phil) * d;
                                #[cfg(not(feature = "isothermal"))]
                                {
                                    t.e -= e_src2;
                                }
                            }
                            if three_d {
                                let phir = phi(x1, x2, x3 + 0.5 * g.dx3);
                                let phil = phi(x1, x2, x3 - 0.5 * g.dx3);
                                #[cfg(not(feature = "isothermal"))]
                                let e_src3 = q3
                                    * (self.work.x3_flux[(k, j, ci)].d * (phic - phil)
                                        + self.work.x3_flux[(k + 1, j, ci)].d
                                            * (phir - phic));
                                let t = if left {
                                    &mut self.work.ul_x1[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x1[(k, j, i)]
                                };
                                t.mz -= q3 * (phir - phil) * d;
                                #[cfg(not(feature = "isothermal"))]
                                {
                                    t.e -= e_src3;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Correct the x2-face states with x1 (and x3) flux gradients.
    /// x1-flux rotation: (Mx,My,Mz) <- (My,Mz,Mx); x3: (Mz,Mx,My).
    fn correct_x2_faces(&mut self, g: &Grid, cfg: &IntegratorConfig) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        #[cfg(feature = "mhd")]
        let hdt = 0.5 * g.dt;
        let q1 = 0.5 * g.dt / g.dx1;
        let q3 = 0.5 * g.dt / g.dx3;
        let (kl, ku) = if three_d { (ks - 1, ke + 1) } else { (ks, ke) };

        for k in kl..=ku {
            for j in (js - 1)..=(je + 2) {
                for i in (is - 1)..=(ie + 1) {
                    // x1-flux gradients
                    for (cj, left) in [(j - 1, true), (j, false)] {
                        let du =
                            self.work.x1_flux[(k, cj, i + 1)] - self.work.x1_flux[(k, cj, i)];
                        let t = if left {
                            &mut self.work.ul_x2[(k, j, i)]
                        } else {
                            &mut self.work.ur_x2[(k, j, i)]
                        };
                        t.d -= q1 * du.d;
                        t.mx -= q1 * du.my;
                        t.my -= q1 * du.mz;
                        t.mz -= q1 * du.mx;
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e -= q1 * du.e;
                        }
                        for n in 0..NSCALARS {
                            t.s[n] -= q1 * du.s[n];
                        }
                        #[cfg(feature = "mhd")]
                        {
                            if three_d {
                                let de = (self.work.emf2[(k, cj, i + 1)]
                                    - self.work.emf2[(k, cj, i)])
                                    + (self.work.emf2[(k + 1, cj, i + 1)]
                                        - self.work.emf2[(k + 1, cj, i)]);
                                let t = if left {
                                    &mut self.work.ul_x2[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x2[(k, j, i)]
                                };
                                t.by -= q1 * 0.5 * de;
                            } else {
                                let t = if left {
                                    &mut self.work.ul_x2[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x2[(k, j, i)]
                                };
                                t.by -= q1 * du.bz;
                            }
                        }
                    }

                    // x3-flux gradients (3D)
                    if three_d {
                        for (cj, left) in [(j - 1, true), (j, false)] {
                            let du = self.work.x3_flux[(k + 1, cj, i)]
                                - self.work.x3_flux[(k, cj, i)];
                            let t = if left {
                                &mut self.work.ul_x2[(k, j, i)]
                            } else {
                                &mut self.work.ur_x2[(k, j, i)]
                            };
                            t.d -= q3 * du.d;
                            t.mx -= q3 * du.mz;
                            t.my -= q3 * du.mx;
                            t.mz -= q3 * du.my;
                            #[cfg(not(feature = "isothermal"))]
                            {
                                t.e -= q3 * du.e;
                            }
                            for n in 0..NSCALARS {
                                t.s[n] -= q3 * du.s[n];
                            }
                            #[cfg(feature = "mhd")]
                            {
                                let de = (self.work.emf2[(k + 1, cj, i)]
                                    - self.work.emf2[(k, cj, i)])
                                    + (self.work.emf2[(k + 1, cj, i + 1)]
                                        - self.work.emf2[(k, cj, i + 1)]);
                                let t = if left {
                                    &mut self.work.ul_x2[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x2[(k, j, i)]
                                };
                                t.bz += q3 * 0.5 * de;
                            }
                        }
                    }

                    // Limited field source terms.
                    #[cfg(feature = "mhd")]
                    for (cj, left) in [(j - 1, true), (j, false)] {
                        let db1 = (g.b1i[(k, cj, i + 1)] - g.b1i[(k, cj, i)]) / g.dx1;
                        let db2 = (g.b2i[(k, cj + 1, i)] - g.b2i[(k, cj, i)]) / g.dx2;
                        let db3 = if three_d {
                            (g.b3i[(k + 1, cj, i)] - g.b3i[(k, cj, i)]) / g.dx3
                        } else {
                            0.0
                        };
                        let q = g.u[(k, cj, i)];
                        let v1 = q.m1 / q.d;
                        let v3 = q.m3 / q.d;
                        let mdb1 = mdb(db2, db1);
                        let mdb3 = mdb(db2, db3);
                        let t = if left {
                            &mut self.work.ul_x2[(k, j, i)]
                        } else {
                            &mut self.work.ur_x2[(k, j, i)]
                        };
                        t.mz += hdt * q.b1c * db2;
                        t.mx += hdt * q.b2c * db2;
                        t.my += hdt * q.b3c * db2;
                        t.by += hdt * v3 * (-mdb1);
                        t.bz += hdt * v1 * (-mdb3);
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e += hdt * (q.b3c * v3 * (-mdb1) + q.b1c * v1 * (-mdb3));
                        }
                    }

                    // Transverse gravity.
                    if let Some(phi) = cfg.gravity {
                        for (cj, left) in [(j - 1, true), (j, false)] {
                            let (x1, x2, x3) = g.cc_pos(i, cj, k);
                            let phic = phi(x1, x2, x3);
                            let phir = phi(x1 + 0.5 * g.dx1, x2, x3);
                            let phil = phi(x1 - 0.5 * g.dx1, x2, x3);
                            let d = g.u[(k, cj, i)].d;
                            #[cfg(not(feature = "isothermal"))]
                            let e_src1 = q1
                                * (self.work.x1_flux[(k, cj, i)].d * (phic - phil)
                                    + self.work.x1_flux[(k, cj, i + 1)].d * (phir - phic));
                            {
                                let t = if left {
                                    &mut self.work.ul_x2[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x2[(k, j, i)]
                                };
                                t.mz -= q1 * (phir - phil) * d;
                                #[cfg(not(feature = "isothermal"))]
                                {
                                    t.e -= e_src1;
                                }
                            }
                            if three_d {
                                let phir = phi(x1, x2, x3 + 0.5 * g.dx3);
                                let phil = phi(x1, x2, x3 - 0.5 * g.dx3);
                                #[cfg(not(feature = "isothermal"))]
                                let e_src3 = q3
                                    * (self.work.x3_flux[(k, cj, i)].d * (phic - phil)
                                        + self.work.x3_flux[(k + 1, cj, i)].d
                                            * (phir - phic));
                                let t = if left {
                                    &mut self.work.ul_x2[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x2[(k, j, i)]
                                };
                                t.my -= q3 * (phir - phil) * d;
                                #[cfg(not(feature = "isothermal"))]
                                {
                                    t.e -= e_src3;
                                }
                            }
                        }
                    }

                    // Shearing-box Coriolis terms on the x2-face states.
                    if let Some(sb) = cfg.shearing {
                        let om_dt = sb.omega * g.dt;
                        for (cj, left) in [(j - 1, true), (j, false)] {
                            let q = g.u[(k, cj, i)];
                            let t = if left {
                                &mut self.work.ul_x2[(k, j, i)]
                            } else {
                                &mut self.work.ur_x2[(k, j, i)]
                            };
                            t.mz += om_dt * q.m2;
                            t.mx -= om_dt * q.m1;
                        }
                    }
                }
            }
        }
    }

    /// Correct the x3-face states with x1 and x2 flux gradients (3D).
    /// x1-flux rotation: (Mx,My,Mz) <- (Mz,Mx,My); x2: (My,Mz,Mx).
    fn correct_x3_faces(&mut self, g: &Grid, cfg: &IntegratorConfig) {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        #[cfg(feature = "mhd")]
        let hdt = 0.5 * g.dt;
        let q1 = 0.5 * g.dt / g.dx1;
        let q2 = 0.5 * g.dt / g.dx2;

        for k in (ks - 1)..=(ke + 2) {
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 1) {
                    // x1-flux gradients
                    for (ck, left) in [(k - 1, true), (k, false)] {
                        let du =
                            self.work.x1_flux[(ck, j, i + 1)] - self.work.x1_flux[(ck, j, i)];
                        let t = if left {
                            &mut self.work.ul_x3[(k, j, i)]
                        } else {
                            &mut self.work.ur_x3[(k, j, i)]
                        };
                        t.d -= q1 * du.d;
                        t.mx -= q1 * du.mz;
                        t.my -= q1 * du.mx;
                        t.mz -= q1 * du.my;
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e -= q1 * du.e;
                        }
                        for n in 0..NSCALARS {
                            t.s[n] -= q1 * du.s[n];
                        }
                        #[cfg(feature = "mhd")]
                        {
                            let de = (self.work.emf3[(ck, j, i + 1)]
                                - self.work.emf3[(ck, j, i)])
                                + (self.work.emf3[(ck, j + 1, i + 1)]
                                    - self.work.emf3[(ck, j + 1, i)]);
                            let t = if left {
                                &mut self.work.ul_x3[(k, j, i)]
                            } else {
                                &mut self.work.ur_x3[(k, j, i)]
                            };
                            t.bz += q1 * 0.5 * de;
                        }
                    }

                    // x2-flux gradients
                    for (ck, left) in [(k - 1, true), (k, false)] {
                        let du =
                            self.work.x2_flux[(ck, j + 1, i)] - self.work.x2_flux[(ck, j, i)];
                        let t = if left {
                            &mut self.work.ul_x3[(k, j, i)]
                        } else {
                            &mut self.work.ur_x3[(k, j, i)]
                        };
                        t.d -= q2 * du.d;
                        t.mx -= q2 * du.my;
                        t.my -= q2 * du.mz;
                        t.mz -= q2 * du.mx;
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e -= q2 * du.e;
                        }
                        for n in 0..NSCALARS {
                            t.s[n] -= q2 * du.s[n];
                        }
                        #[cfg(feature = "mhd")]
                        {
                            let de = (self.work.emf3[(ck, j + 1, i)]
                                - self.work.emf3[(ck, j, i)])
                                + (self.work.emf3[(ck, j + 1, i + 1)]
                                    - self.work.emf3[(ck, j, i + 1)]);
                            let t = if left {
                                &mut self.work.ul_x3[(k, j, i)]
                            } else {
                                &mut self.work.ur_x3[(k, j, i)]
                            };
                            t.by -= q2 * 0.5 * de;
                        }
                    }

                    // Limited field source terms.
                    #[cfg(feature = "mhd")]
                    for (ck, left) in [(k - 1, true), (k, false)] {
                        let db1 = (g.b1i[(ck, j, i + 1)] - g.b1i[(ck, j, i)]) / g.dx1;
                        let db2 = (g.b2i[(ck, j + 1, i)] - g.b2i[(ck, j, i)]) / g.dx2;
                        let db3 = (g.b3i[(ck + 1, j, i)] - g.b3i[(ck, j, i)]) / g.dx3;
                        let q = g.u[(ck, j, i)];
                        let v1 = q.m1 / q.d;
                        let v2 = q.m2 / q.d;
                        let mdb1 = mdb(db3, db1);
                        let mdb2 = mdb(db3, db2);
                        let t = if left {
                            &mut self.work.ul_x3[(k, j, i)]
                        } else {
                            &mut self.work.ur_x3[(k, j, i)]
                        };
                        t.my += hdt * q.b1c * db3;
                        t.mz += hdt * q.b2c * db3;
                        t.mx += hdt * q.b3c * db3;
                        t.by += hdt * v1 * (-mdb2);
                        t.bz += hdt * v2 * (-mdb1);
                        #[cfg(not(feature = "isothermal"))]
                        {
                            t.e += hdt * (q.b1c * v1 * (-mdb2) + q.b2c * v2 * (-mdb1));
                        }
                    }

                    // Transverse gravity.
                    if let Some(phi) = cfg.gravity {
                        for (ck, left) in [(k - 1, true), (k, false)] {
                            let (x1, x2, x3) = g.cc_pos(i, j, ck);
                            let phic = phi(x1, x2, x3);
                            let phir = phi(x1 + 0.5 * g.dx1, x2, x3);
                            let phil = phi(x1 - 0.5 * g.dx1, x2, x3);
                            let d = g.u[(ck, j, i)].d;
                            #[cfg(not(feature = "isothermal"))]
                            let e_src1 = q1
                                * (self.work.x1_flux[(ck, j, i)].d * (phic - phil)
                                    + self.work.x1_flux[(ck, j, i + 1)].d * (phir - phic));
                            {
                                let t = if left {
                                    &mut self.work.ul_x3[(k, j, i)]
                                } else {
                                    &mut self.work.ur_x3[(k, j, i)]
                                };
                                t.my -= q1 * (phir - phil) * d;
                                #[cfg(not(feature = "isothermal"))]
                                {
                                    t.e -= e_src1;
                                }
                            }
                            let phir = phi(x1, x2 + 0.5 * g.dx2, x3);
                            let phil = phi(x1, x2 - 0.5 * g.dx2, x3);
                            #[cfg(not(feature = "isothermal"))]
                            let e_src2 = q2
                                * (self.work.x2_flux[(ck, j, i)].d * (phic - phil)
                                    + self.work.x2_flux[(ck, j + 1, i)].d * (phir - phic));
                            let t = if left {
                                &mut self.work.ul_x3[(k, j, i)]
                            } else {
                                &mut self.work.ur_x3[(k, j, i)]
                            };
                            t.mz -= q2 * (phir - phil) * d;
                            #[cfg(not(feature = "isothermal"))]
                            {
                                t.e -= e_src2;
                            }
                        }
                    }

                    // Shearing-box Coriolis terms on the x3-face states.
                    if let Some(sb) = cfg.shearing {
                        let om_dt = sb.omega * g.dt;
                        for (ck, left) in [(k - 1, true), (k, false)] {
                            let q = g.u[(ck, j, i)];
                            let t = if left {
                                &mut self.work.ul_x3[(k, j, i)]
                            } else {
                                &mut self.work.ur_x3[(k, j, i)]
                            };
                            t.my += om_dt * q.m2;
                            t.mz -= om_dt * q.m1;
                        }
                    }
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Half-step quantities
    // ---------------------------------------------------------------

    /// Density at t^{n+1/2} from the predictor flux divergences.
    fn half_step_density(&mut self, g: &Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        let needed = cfg!(feature = "mhd") || cfg.gravity.is_some() || cfg.shearing.is_some();
        if !needed {
            return Ok(());
        }
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let q1 = 0.5 * g.dt / g.dx1;
        let q2 = 0.5 * g.dt / g.dx2;
        let q3 = 0.5 * g.dt / g.dx3;
        let (kl, ku) = if three_d { (ks - 1, ke + 1) } else { (ks, ke) };

        for k in kl..=ku {
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 1) {
                    let mut d = g.u[(k, j, i)].d
                        - q1 * (self.work.x1_flux[(k, j, i + 1)].d
                            - self.work.x1_flux[(k, j, i)].d)
                        - q2 * (self.work.x2_flux[(k, j + 1, i)].d
                            - self.work.x2_flux[(k, j, i)].d);
                    if three_d {
                        d -= q3
                            * (self.work.x3_flux[(k + 1, j, i)].d
                                - self.work.x3_flux[(k, j, i)].d);
                    }
                    if d <= 0.0 {
                        return Err(StepError::NegativeDensity {
                            i,
                            j,
                            k,
                            value: d,
                            sweep: Sweep::HalfStep,
                        });
                    }
                    self.work.dhalf[(k, j, i)] = d;
                }
            }
        }
        Ok(())
    }

    /// Cell-centered EMFs at t^{n+1/2} from half-step momenta and the
    /// half-updated face fields.
    #[cfg(feature = "mhd")]
    fn cc_emfs_half(&mut self, g: &Grid, cfg: &IntegratorConfig) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let q1 = 0.5 * g.dt / g.dx1;
        let q2 = 0.5 * g.dt / g.dx2;
        let q3 = 0.5 * g.dt / g.dx3;
        let (kl, ku) = if three_d { (ks - 1, ke + 1) } else { (ks, ke) };

        for k in kl..=ku {
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 1) {
                    let q = g.u[(k, j, i)];
                    let d = self.work.dhalf[(k, j, i)];

                    let mut m1 = q.m1
                        - q1 * (self.work.x1_flux[(k, j, i + 1)].mx
                            - self.work.x1_flux[(k, j, i)].mx)
                        - q2 * (self.work.x2_flux[(k, j + 1, i)].mz
                            - self.work.x2_flux[(k, j, i)].mz);
                    let mut m2 = q.m2
                        - q1 * (self.work.x1_flux[(k, j, i + 1)].my
                            - self.work.x1_flux[(k, j, i)].my)
                        - q2 * (self.work.x2_flux[(k, j + 1, i)].mx
                            - self.work.x2_flux[(k, j, i)].mx);
                    if three_d {
                        m1 -= q3
                            * (self.work.x3_flux[(k + 1, j, i)].my
                                - self.work.x3_flux[(k, j, i)].my);
                        m2 -= q3
                            * (self.work.x3_flux[(k + 1, j, i)].mz
                                - self.work.x3_flux[(k, j, i)].mz);
                    }
                    if let Some(phi) = cfg.gravity {
                        let (x1, x2, x3) = g.cc_pos(i, j, k);
                        let phir = phi(x1 + 0.5 * g.dx1, x2, x3);
                        let phil = phi(x1 - 0.5 * g.dx1, x2, x3);
                        m1 -= q1 * (phir - phil) * q.d;
                        let phir = phi(x1, x2 + 0.5 * g.dx2, x3);
                        let phil = phi(x1, x2 - 0.5 * g.dx2, x3);
                        m2 -= q2 * (phir - phil) * q.d;
                    }
                    if let Some(sb) = cfg.shearing {
                        let om_dt = sb.omega * g.dt;
                        m1 += om_dt * q.m2;
                        m2 -= om_dt * q.m1;
                    }

                    let b1c =
                        0.5 * (self.work.b1_x1[(k, j, i)] + self.work.b1_x1[(k, j, i + 1)]);
                    let b2c =
                        0.5 * (self.work.b2_x2[(k, j, i)] + self.work.b2_x2[(k, j + 1, i)]);
                    self.work.emf3_cc[(k, j, i)] = (b1c * m2 - b2c * m1) / d;

                    if three_d {
                        let mut m3 = q.m3
                            - q1 * (self.work.x1_flux[(k, j, i + 1)].mz
                                - self.work.x1_flux[(k, j, i)].mz)
                            - q2 * (self.work.x2_flux[(k, j + 1, i)].my
                                - self.work.x2_flux[(k, j, i)].my)
                            - q3 * (self.work.x3_flux[(k + 1, j, i)].mx
                                - self.work.x3_flux[(k, j, i)].mx);
                        if let Some(phi) = cfg.gravity {
                            let (x1, x2, x3) = g.cc_pos(i, j, k);
                            let phir = phi(x1, x2, x3 + 0.5 * g.dx3);
                            let phil = phi(x1, x2, x3 - 0.5 * g.dx3);
                            m3 -= q3 * (phir - phil) * q.d;
                        }
                        let b3c =
                            0.5 * (self.work.b3_x3[(k, j, i)] + self.work.b3_x3[(k + 1, j, i)]);
                        self.work.emf1_cc[(k, j, i)] = (b2c * m3 - b3c * m2) / d;
                        self.work.emf2_cc[(k, j, i)] = (b3c * m1 - b1c * m3) / d;
                    }
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Final fluxes
    // ---------------------------------------------------------------

    /// Per-face maximum wavespeed differences for the H-correction.
    fn compute_eta(&mut self, g: &Grid, cfg: &IntegratorConfig) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let (kl, ku) = if three_d { (ks - 1, ke + 1) } else { (ks, ke) };

        let eta1 = self.work.eta1.as_mut().expect("eta fields allocated");
        for k in kl..=ku {
            for j in (js - 1)..=(je + 1) {
                for i in (is - 1)..=(ie + 2) {
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b1_x1[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    let ur = &self.work.ur_x1[(k, j, i)];
                    let ul = &self.work.ul_x1[(k, j, i)];
                    let cfr = ur.cfast(bn, &cfg.eos);
                    let cfl = ul.cfast(bn, &cfg.eos);
                    let vr = ur.mx / ur.d;
                    let vl = ul.mx / ul.d;
                    eta1[(k, j, i)] = 0.5 * ((vr - vl).abs() + (cfr - cfl).abs());
                }
            }
        }

        let eta2 = self.work.eta2.as_mut().expect("eta fields allocated");
        for k in kl..=ku {
            for j in (js - 1)..=(je + 2) {
                for i in (is - 1)..=(ie + 1) {
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b2_x2[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    let ur = &self.work.ur_x2[(k, j, i)];
                    let ul = &self.work.ul_x2[(k, j, i)];
                    let cfr = ur.cfast(bn, &cfg.eos);
                    let cfl = ul.cfast(bn, &cfg.eos);
                    let vr = ur.mx / ur.d;
                    let vl = ul.mx / ul.d;
                    eta2[(k, j, i)] = 0.5 * ((vr - vl).abs() + (cfr - cfl).abs());
                }
            }
        }

        if three_d {
            let eta3 = self.work.eta3.as_mut().expect("eta fields allocated");
            for k in (ks - 1)..=(ke + 2) {
                for j in (js - 1)..=(je + 1) {
                    for i in (is - 1)..=(ie + 1) {
                        #[cfg(feature = "mhd")]
                        let bn = self.work.b3_x3[(k, j, i)];
                        #[cfg(not(feature = "mhd"))]
                        let bn = 0.0;
                        let ur = &self.work.ur_x3[(k, j, i)];
                        let ul = &self.work.ul_x3[(k, j, i)];
                        let cfr = ur.cfast(bn, &cfg.eos);
                        let cfl = ul.cfast(bn, &cfg.eos);
                        let vr = ur.mx / ur.d;
                        let vl = ul.mx / ul.d;
                        eta3[(k, j, i)] = 0.5 * ((vr - vl).abs() + (cfr - cfl).abs());
                    }
                }
            }
        }
    }

    /// Final fluxes from the corrected face states, seeding the
    /// H-correction wavespeed from the stencil neighbors.
    fn final_fluxes(&mut self, g: &Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let (kl, ku) = if three_d { (ks - 1, ke + 1) } else { (ks, ke) };

        // x1 faces
        for k in kl..=ku {
            for j in (js - 1)..=(je + 1) {
                for i in is..=(ie + 1) {
                    let etah = if cfg.h_correction {
                        let eta1 = self.work.eta1.as_ref().expect("eta fields allocated");
                        let eta2 = self.work.eta2.as_ref().expect("eta fields allocated");
                        let mut etah = eta2[(k, j, i - 1)]
                            .max(eta2[(k, j, i)])
                            .max(eta2[(k, j + 1, i - 1)])
                            .max(eta2[(k, j + 1, i)]);
                        if three_d {
                            let eta3 = self.work.eta3.as_ref().expect("eta fields allocated");
                            etah = etah
                                .max(eta3[(k, j, i - 1)])
                                .max(eta3[(k, j, i)])
                                .max(eta3[(k + 1, j, i - 1)])
                                .max(eta3[(k + 1, j, i)]);
                        }
                        etah.max(eta1[(k, j, i)])
                    } else {
                        0.0
                    };
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b1_x1[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    self.work.x1_flux[(k, j, i)] = self
                        .solver
                        .flux(
                            bn,
                            &self.work.ul_x1[(k, j, i)],
                            &self.work.ur_x1[(k, j, i)],
                            etah,
                            &cfg.eos,
                        )
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X1))?;
                }
            }
        }

        // x2 faces
        for k in kl..=ku {
            for j in js..=(je + 1) {
                for i in (is - 1)..=(ie + 1) {
                    let etah = if cfg.h_correction {
                        let eta1 = self.work.eta1.as_ref().expect("eta fields allocated");
                        let eta2 = self.work.eta2.as_ref().expect("eta fields allocated");
                        let mut etah = eta1[(k, j - 1, i)]
                            .max(eta1[(k, j, i)])
                            .max(eta1[(k, j - 1, i + 1)])
                            .max(eta1[(k, j, i + 1)]);
                        if three_d {
                            let eta3 = self.work.eta3.as_ref().expect("eta fields allocated");
                            etah = etah
                                .max(eta3[(k, j - 1, i)])
                                .max(eta3[(k, j, i)])
                                .max(eta3[(k + 1, j - 1, i)])
                                .max(eta3[(k + 1, j, i)]);
                        }
                        etah.max(eta2[(k, j, i)])
                    } else {
                        0.0
                    };
                    #[cfg(feature = "mhd")]
                    let bn = self.work.b2_x2[(k, j, i)];
                    #[cfg(not(feature = "mhd"))]
                    let bn = 0.0;
                    self.work.x2_flux[(k, j, i)] = self
                        .solver
                        .flux(
                            bn,
                            &self.work.ul_x2[(k, j, i)],
                            &self.work.ur_x2[(k, j, i)],
                            etah,
                            &cfg.eos,
                        )
                        .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X2))?;
                }
            }
        }

        // x3 faces
        if three_d {
            for k in ks..=(ke + 1) {
                for j in (js - 1)..=(je + 1) {
                    for i in (is - 1)..=(ie + 1) {
                        let etah = if cfg.h_correction {
                            let eta1 = self.work.eta1.as_ref().expect("eta fields allocated");
                            let eta2 = self.work.eta2.as_ref().expect("eta fields allocated");
                            let eta3 = self.work.eta3.as_ref().expect("eta fields allocated");
                            eta1[(k - 1, j, i)]
                                .max(eta1[(k, j, i)])
                                .max(eta1[(k - 1, j, i + 1)])
                                .max(eta1[(k, j, i + 1)])
                                .max(eta2[(k - 1, j, i)])
                                .max(eta2[(k, j, i)])
                                .max(eta2[(k - 1, j + 1, i)])
                                .max(eta2[(k, j + 1, i)])
                                .max(eta3[(k, j, i)])
                        } else {
                            0.0
                        };
                        #[cfg(feature = "mhd")]
                        let bn = self.work.b3_x3[(k, j, i)];
                        #[cfg(not(feature = "mhd"))]
                        let bn = 0.0;
                        self.work.x3_flux[(k, j, i)] = self
                            .solver
                            .flux(
                                bn,
                                &self.work.ul_x3[(k, j, i)],
                                &self.work.ur_x3[(k, j, i)],
                                etah,
                                &cfg.eos,
                            )
                            .map_err(|np| StepError::from_nonphys(np, i, j, k, Sweep::X3))?;
                    }
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Full-step updates
    // ---------------------------------------------------------------

    /// Full-dt constrained-transport update of the grid face fields.
    #[cfg(feature = "mhd")]
    fn full_step_faces(&mut self, g: &mut Grid) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let dtodx1 = g.dt / g.dx1;
        let dtodx2 = g.dt / g.dx2;
        if three_d {
            let dtodx3 = g.dt / g.dx3;
            for k in ks..=ke {
                for j in js..=je {
                    for i in is..=ie {
                        g.b1i[(k, j, i)] += dtodx3
                            * (self.work.emf2[(k + 1, j, i)] - self.work.emf2[(k, j, i)])
                            - dtodx2
                                * (self.work.emf3[(k, j + 1, i)] - self.work.emf3[(k, j, i)]);
                        g.b2i[(k, j, i)] += dtodx1
                            * (self.work.emf3[(k, j, i + 1)] - self.work.emf3[(k, j, i)])
                            - dtodx3
                                * (self.work.emf1[(k + 1, j, i)] - self.work.emf1[(k, j, i)]);
                        g.b3i[(k, j, i)] += dtodx2
                            * (self.work.emf1[(k, j + 1, i)] - self.work.emf1[(k, j, i)])
                            - dtodx1
                                * (self.work.emf2[(k, j, i + 1)] - self.work.emf2[(k, j, i)]);
                    }
                    let iu = ie + 1;
                    g.b1i[(k, j, iu)] += dtodx3
                        * (self.work.emf2[(k + 1, j, iu)] - self.work.emf2[(k, j, iu)])
                        - dtodx2 * (self.work.emf3[(k, j + 1, iu)] - self.work.emf3[(k, j, iu)]);
                }
                let ju = je + 1;
                for i in is..=ie {
                    g.b2i[(k, ju, i)] += dtodx1
                        * (self.work.emf3[(k, ju, i + 1)] - self.work.emf3[(k, ju, i)])
                        - dtodx3 * (self.work.emf1[(k + 1, ju, i)] - self.work.emf1[(k, ju, i)]);
                }
            }
            let ku = ke + 1;
            for j in js..=je {
                for i in is..=ie {
                    g.b3i[(ku, j, i)] += dtodx2
                        * (self.work.emf1[(ku, j + 1, i)] - self.work.emf1[(ku, j, i)])
                        - dtodx1 * (self.work.emf2[(ku, j, i + 1)] - self.work.emf2[(ku, j, i)]);
                }
            }
        } else {
            let k = ks;
            for j in js..=je {
                for i in is..=ie {
                    g.b1i[(k, j, i)] -=
                        dtodx2 * (self.work.emf3[(k, j + 1, i)] - self.work.emf3[(k, j, i)]);
                    g.b2i[(k, j, i)] +=
                        dtodx1 * (self.work.emf3[(k, j, i + 1)] - self.work.emf3[(k, j, i)]);
                }
                let iu = ie + 1;
                g.b1i[(k, j, iu)] -=
                    dtodx2 * (self.work.emf3[(k, j + 1, iu)] - self.work.emf3[(k, j, iu)]);
            }
            let ju = je + 1;
            for i in is..=ie {
                g.b2i[(k, ju, i)] +=
                    dtodx1 * (self.work.emf3[(k, ju, i + 1)] - self.work.emf3[(k, ju, i)]);
            }
        }
    }

    /// Full-step gravity (second order via the half-step density) or the
    /// shearing-box Crank-Nicholson momentum update.
    fn source_full_step(&mut self, g: &mut Grid, cfg: &IntegratorConfig) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let dt = g.dt;
        let dtodx1 = dt / g.dx1;
        let dtodx2 = dt / g.dx2;
        let dtodx3 = dt / g.dx3;

        if let Some(sb) = cfg.shearing {
            // Coriolis + tidal update of (M1, M2): evolve the y-momentum
            // fluctuation dM2 = M2 + rho (3/2) Omega x1 by dt/2, then
            // apply the Crank-Nicholson rotation.
            let om = sb.omega;
            let om_dt = om * dt;
            let fact = om_dt / (1.0 + 0.25 * om_dt * om_dt);
            let h1 = 0.5 * dtodx1;
            let h2 = 0.5 * dtodx2;
            let h3 = 0.5 * dtodx3;
            for k in ks..=ke {
                for j in js..=je {
                    for i in is..=ie {
                        let (x1, x2, x3) = g.cc_pos(i, j, k);
                        let q = g.u[(k, j, i)];
                        let m1n = q.m1;
                        let dm2n = q.m2 + q.d * 1.5 * om * x1;

                        let fl = &self.work.x1_flux[(k, j, i)];
                        let fr = &self.work.x1_flux[(k, j, i + 1)];
                        let gl = &self.work.x2_flux[(k, j, i)];
                        let gr = &self.work.x2_flux[(k, j + 1, i)];
                        let flx1 = fl.my + 1.5 * om * (x1 - 0.5 * g.dx1) * fl.d;
                        let frx1 = fr.my + 1.5 * om * (x1 + 0.5 * g.dx1) * fr.d;
                        let flx2 = gl.mx + 1.5 * om * x1 * gl.d;
                        let frx2 = gr.mx + 1.5 * om * x1 * gr.d;

                        let mut m1e = m1n - h1 * (fr.mx - fl.mx) - h2 * (gr.mz - gl.mz);
                        let mut dm2e = dm2n - h1 * (frx1 - flx1) - h2 * (frx2 - flx2);
                        if three_d {
                            let hl = &self.work.x3_flux[(k, j, i)];
                            let hr = &self.work.x3_flux[(k + 1, j, i)];
                            m1e -= h3 * (hr.my - hl.my);
                            let flx3 = hl.mz + 1.5 * om * x1 * hl.d;
                            let frx3 = hr.mz + 1.5 * om * x1 * hr.d;
                            dm2e -= h3 * (frx3 - flx3);
                        }

                        let fl_d = fl.d;
                        let fr_d = fr.d;
                        let cell = &mut g.u[(k, j, i)];
                        cell.m1 += (2.0 * dm2e - 0.5 * om_dt * m1e) * fact;
                        cell.m2 += -0.5 * (m1e + om_dt * dm2e) * fact
                            - 0.75 * om * dt * (fl_d + fr_d);

                        if let Some(phi) = cfg.gravity {
                            let phic = phi(x1, x2, x3);
                            #[cfg(not(feature = "isothermal"))]
                            {
                                let phir = phi(x1 + 0.5 * g.dx1, x2, x3);
                                let phil = phi(x1 - 0.5 * g.dx1, x2, x3);
                                let e1 = dtodx1
                                    * (self.work.x1_flux[(k, j, i)].d * (phil - phic)
                                        + self.work.x1_flux[(k, j, i + 1)].d * (phic - phir));
                                let phir = phi(x1, x2 + 0.5 * g.dx2, x3);
                                let phil = phi(x1, x2 - 0.5 * g.dx2, x3);
                                let e2 = dtodx2
                                    * (self.work.x2_flux[(k, j, i)].d * (phil - phic)
                                        + self.work.x2_flux[(k, j + 1, i)].d * (phic - phir));
                                let cell = &mut g.u[(k, j, i)];
                                cell.e += e1 + e2;
                            }
                            if three_d {
                                let phir = phi(x1, x2, x3 + 0.5 * g.dx3);
                                let phil = phi(x1, x2, x3 - 0.5 * g.dx3);
                                let m3_src =
                                    dtodx3 * (phir - phil) * self.work.dhalf[(k, j, i)];
                                #[cfg(not(feature = "isothermal"))]
                                let e3 = dtodx3
                                    * (self.work.x3_flux[(k, j, i)].d * (phil - phic)
                                        + self.work.x3_flux[(k + 1, j, i)].d * (phic - phir));
                                let cell = &mut g.u[(k, j, i)];
                                cell.m3 -= m3_src;
                                #[cfg(not(feature = "isothermal"))]
                                {
                                    cell.e += e3;
                                }
                            }
                            #[cfg(feature = "isothermal")]
                            let _ = phic;
                        }
                    }
                }
            }
        } else if let Some(phi) = cfg.gravity {
            for k in ks..=ke {
                for j in js..=je {
                    for i in is..=ie {
                        let (x1, x2, x3) = g.cc_pos(i, j, k);
                        let dhalf = self.work.dhalf[(k, j, i)];
                        #[cfg(not(feature = "isothermal"))]
                        let phic = phi(x1, x2, x3);

                        let phir = phi(x1 + 0.5 * g.dx1, x2, x3);
                        let phil = phi(x1 - 0.5 * g.dx1, x2, x3);
                        let m1_src = dtodx1 * (phir - phil) * dhalf;
                        #[cfg(not(feature = "isothermal"))]
                        let e1 = dtodx1
                            * (self.work.x1_flux[(k, j, i)].d * (phic - phil)
                                + self.work.x1_flux[(k, j, i + 1)].d * (phir - phic));

                        let phir = phi(x1, x2 + 0.5 * g.dx2, x3);
                        let phil = phi(x1, x2 - 0.5 * g.dx2, x3);
                        let m2_src = dtodx2 * (phir - phil) * dhalf;
                        #[cfg(not(feature = "isothermal"))]
                        let e2 = dtodx2
                            * (self.work.x2_flux[(k, j, i)].d * (phic - phil)
                                + self.work.x2_flux[(k, j + 1, i)].d * (phir - phic));

                        let cell = &mut g.u[(k, j, i)];
                        cell.m1 -= m1_src;
                        cell.m2 -= m2_src;
                        #[cfg(not(feature = "isothermal"))]
                        {
                            cell.e -= e1 + e2;
                        }

                        if three_d {
                            let phir = phi(x1, x2, x3 + 0.5 * g.dx3);
                            let phil = phi(x1, x2, x3 - 0.5 * g.dx3);
                            let m3_src = dtodx3 * (phir - phil) * dhalf;
                            #[cfg(not(feature = "isothermal"))]
                            let e3 = dtodx3
                                * (self.work.x3_flux[(k, j, i)].d * (phic - phil)
                                    + self.work.x3_flux[(k + 1, j, i)].d * (phir - phic));
                            let cell = &mut g.u[(k, j, i)];
                            cell.m3 -= m3_src;
                            #[cfg(not(feature = "isothermal"))]
                            {
                                cell.e -= e3;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Conservative update of the cell states from all direction fluxes.
    fn conservative_update(&mut self, g: &mut Grid) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let dtodx1 = g.dt / g.dx1;
        let dtodx2 = g.dt / g.dx2;
        let dtodx3 = g.dt / g.dx3;

        for k in ks..=ke {
            for j in js..=je {
                for i in is..=ie {
                    let d1 = self.work.x1_flux[(k, j, i + 1)] - self.work.x1_flux[(k, j, i)];
                    let d2 = self.work.x2_flux[(k, j + 1, i)] - self.work.x2_flux[(k, j, i)];
                    let cell = &mut g.u[(k, j, i)];

                    cell.d -= dtodx1 * d1.d + dtodx2 * d2.d;
                    cell.m1 -= dtodx1 * d1.mx + dtodx2 * d2.mz;
                    cell.m2 -= dtodx1 * d1.my + dtodx2 * d2.mx;
                    cell.m3 -= dtodx1 * d1.mz + dtodx2 * d2.my;
                    #[cfg(not(feature = "isothermal"))]
                    {
                        cell.e -= dtodx1 * d1.e + dtodx2 * d2.e;
                    }
                    #[cfg(feature = "mhd")]
                    {
                        cell.b2c -= dtodx1 * d1.by;
                        cell.b3c -= dtodx1 * d1.bz + dtodx2 * d2.by;
                        cell.b1c -= dtodx2 * d2.bz;
                    }
                    for n in 0..NSCALARS {
                        cell.s[n] -= dtodx1 * d1.s[n] + dtodx2 * d2.s[n];
                    }

                    if three_d {
                        let d3 =
                            self.work.x3_flux[(k + 1, j, i)] - self.work.x3_flux[(k, j, i)];
                        let cell = &mut g.u[(k, j, i)];
                        cell.d -= dtodx3 * d3.d;
                        cell.m1 -= dtodx3 * d3.my;
                        cell.m2 -= dtodx3 * d3.mz;
                        cell.m3 -= dtodx3 * d3.mx;
                        #[cfg(not(feature = "isothermal"))]
                        {
                            cell.e -= dtodx3 * d3.e;
                        }
                        #[cfg(feature = "mhd")]
                        {
                            cell.b1c -= dtodx3 * d3.by;
                            cell.b2c -= dtodx3 * d3.bz;
                        }
                        for n in 0..NSCALARS {
                            cell.s[n] -= dtodx3 * d3.s[n];
                        }
                    }
                }
            }
        }
    }

    /// Cell-centered fields from the averaged updated faces; in 2D the
    /// x3 face field mirrors the cell value.
    #[cfg(feature = "mhd")]
    fn finalize_b(&mut self, g: &mut Grid) {
        let three_d = g.three_d();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        for k in ks..=ke {
            for j in js..=je {
                for i in is..=ie {
                    let b1 = 0.5 * (g.b1i[(k, j, i)] + g.b1i[(k, j, i + 1)]);
                    let b2 = 0.5 * (g.b2i[(k, j, i)] + g.b2i[(k, j + 1, i)]);
                    let b3 = if three_d {
                        0.5 * (g.b3i[(k, j, i)] + g.b3i[(k + 1, j, i)])
                    } else {
                        g.u[(k, j, i)].b3c
                    };
                    let cell = &mut g.u[(k, j, i)];
                    cell.b1c = b1;
                    cell.b2c = b2;
                    cell.b3c = b3;
                    if !three_d {
                        g.b3i[(k, j, i)] = b3;
                    }
                }
            }
        }
    }

    /// Final positivity scan over the active zones.
    #[cfg_attr(feature = "isothermal", allow(unused_variables))]
    fn check_positivity(&self, g: &Grid, cfg: &IntegratorConfig) -> Result<(), StepError> {
        for k in g.ks..=g.ke {
            for j in g.js..=g.je {
                for i in g.is..=g.ie {
                    let q = g.u[(k, j, i)];
                    if q.d <= 0.0 {
                        return Err(StepError::NegativeDensity {
                            i,
                            j,
                            k,
                            value: q.d,
                            sweep: Sweep::FinalUpdate,
                        });
                    }
                    #[cfg(not(feature = "isothermal"))]
                    {
                        let p = q.pressure(&cfg.eos);
                        if p <= 0.0 {
                            return Err(StepError::NegativePressure {
                                i,
                                j,
                                k,
                                value: p,
                                sweep: Sweep::FinalUpdate,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Eos, Gas};

    #[cfg(not(feature = "isothermal"))]
    fn eos() -> Eos {
        Eos::adiabatic(5.0 / 3.0)
    }
    #[cfg(feature = "isothermal")]
    fn eos() -> Eos {
        Eos::isothermal(1.0)
    }

    fn uniform_grid() -> Grid {
        let mut g = Grid::new([8, 8, 1], [0.0, 0.0, 0.0], [0.125, 0.125, 1.0]);
        g.init_with(|_, _, _| Gas {
            d: 1.0,
            m1: 0.3,
            m2: -0.2,
            #[cfg(not(feature = "isothermal"))]
            e: 2.0 + 0.5 * (0.3_f64 * 0.3 + 0.2 * 0.2),
            s: [0.5; crate::NSCALARS],
            ..Gas::default()
        });
        #[cfg(feature = "mhd")]
        g.sync_cell_b();
        g
    }

    /// A spatially uniform state is a fixed point of the step.
    #[test]
    fn test_uniform_state_is_stationary() {
        let mut g = uniform_grid();
        let cfg = IntegratorConfig::new(eos());
        g.dt = 0.01;
        let before = g.u[(0, g.js + 2, g.is + 3)];
        let mut integ = Integrator::new(&g);
        integ.step(&mut g, &cfg).unwrap();
        let after = g.u[(0, g.js + 2, g.is + 3)];
        assert!((after.d - before.d).abs() < 1e-13);
        assert!((after.m1 - before.m1).abs() < 1e-13);
        assert!((after.m2 - before.m2).abs() < 1e-13);
        assert!((after.s[0] - before.s[0]).abs() < 1e-13);
        #[cfg(not(feature = "isothermal"))]
        assert!((after.e - before.e).abs() < 1e-13);
    }

    /// The step reports the offending zone on a corrupted input.
    #[test]
    fn test_bad_state_reported_with_zone() {
        let mut g = uniform_grid();
        let cfg = IntegratorConfig::new(eos());
        g.dt = 0.01;
        let (j, i) = (g.js + 1, g.is + 1);
        g.u[(0, j, i)].d = -1.0;
        let mut integ = Integrator::new(&g);
        let err = integ.step(&mut g, &cfg).unwrap_err();
        match err {
            StepError::NegativeDensity { sweep, .. } => assert_eq!(sweep, Sweep::X1),
            other => panic!("expected density error, got {other:?}"),
        }
    }
}
