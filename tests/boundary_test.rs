//! Boundary subsystem validation: flag handling, idempotence, mirror
//! symmetry under reflecting walls, user hooks, and the decomposed
//! periodic exchange round trip.

use ctu_rs::{
    new_dt, BoundaryConditions, BoundarySide, Eos, FaceBoundaries, Gas, Grid, Integrator,
    IntegratorConfig, LocalCluster, SerialTransport, NGHOST,
};

#[cfg(not(feature = "isothermal"))]
fn eos() -> Eos {
    Eos::adiabatic(1.4)
}
#[cfg(feature = "isothermal")]
fn eos() -> Eos {
    Eos::isothermal(1.0)
}

fn gas(d: f64, v1: f64) -> Gas {
    Gas {
        d,
        m1: d * v1,
        #[cfg(not(feature = "isothermal"))]
        e: 1.0 / 0.4 + 0.5 * d * v1 * v1,
        ..Gas::default()
    }
}

/// Filling ghosts twice without an intervening update is a no-op.
#[test]
fn test_boundary_apply_is_idempotent() {
    let mut g = Grid::new([16, 12, 1], [0.0, 0.0, 0.0], [0.0625, 0.0625, 1.0]);
    g.init_with(|x1, x2, _| gas(1.0 + 0.3 * (x1 + 2.0 * x2).sin(), 0.2));
    #[cfg(feature = "mhd")]
    {
        g.init_face_b(|_, x2, _| 0.1 * x2, |x1, _, _| -0.1 * x1, |_, _, _| 0.0);
        g.sync_cell_b();
    }
    // Mixed physical policies on every face.
    let mut bc =
        BoundaryConditions::from_flags(FaceBoundaries::new(1, 2, 4, 4, 4, 4), &g).unwrap();
    let mut tr = SerialTransport;

    bc.apply(&mut g, &mut tr).unwrap();
    let once = g.clone();
    bc.apply(&mut g, &mut tr).unwrap();
    assert_eq!(g, once);
}

/// A mirror-symmetric pulse between reflecting walls stays mirror
/// symmetric to round-off.
#[test]
fn test_reflecting_walls_preserve_mirror_symmetry() {
    let nx = 64;
    let dx = 1.0 / nx as f64;
    let mut g = Grid::new([nx, 4, 1], [0.0, 0.0, 0.0], [dx, dx, 1.0]);
    g.init_with(|x1, _, _| {
        let r = (x1 - 0.5) / 0.1;
        gas(1.0 + 0.5 * (-r * r).exp(), 0.0)
    });
    #[cfg(feature = "mhd")]
    g.sync_cell_b();

    let mut bc =
        BoundaryConditions::from_flags(FaceBoundaries::new(1, 1, 4, 4, 4, 4), &g).unwrap();
    let cfg = IntegratorConfig::new(eos());
    let mut integ = Integrator::new(&g);
    let mut tr = SerialTransport;

    for _ in 0..30 {
        g.dt = new_dt(&g, &cfg);
        bc.apply(&mut g, &mut tr).unwrap();
        integ.step(&mut g, &cfg).unwrap();
        g.time += g.dt;
    }

    for m in 0..(nx / 2) {
        let a = g.u[(0, g.js, g.is + m)];
        let b = g.u[(0, g.js, g.ie - m)];
        assert!(
            (a.d - b.d).abs() < 1e-12,
            "density asymmetry {:.3e} at offset {m}",
            (a.d - b.d).abs()
        );
        assert!(
            (a.m1 + b.m1).abs() < 1e-12,
            "momentum asymmetry at offset {m}"
        );
    }
}

fn mark_inner_x1(g: &mut Grid) {
    for j in g.js..=g.je {
        for i in 1..=NGHOST {
            g.u[(0, j, g.is - i)].d = 42.0;
        }
    }
}

#[test]
fn test_user_boundary_is_invoked() {
    let mut g = Grid::new([8, 4, 1], [0.0, 0.0, 0.0], [0.125, 0.125, 1.0]);
    g.init_with(|_, _, _| gas(1.0, 0.0));
    let mut bc =
        BoundaryConditions::from_flags(FaceBoundaries::new(2, 2, 4, 4, 4, 4), &g).unwrap();
    bc.enroll_user(BoundarySide::InnerX1, mark_inner_x1);
    let mut tr = SerialTransport;
    bc.apply(&mut g, &mut tr).unwrap();
    assert_eq!(g.u[(0, g.js, g.is - 1)].d, 42.0);
    assert_eq!(g.u[(0, g.js + 1, g.is - NGHOST)].d, 42.0);
    // The outer face still used its outflow policy.
    assert_eq!(g.u[(0, g.js, g.ie + 1)].d, 1.0);
}

mod round_trip {
    use super::*;
    use std::thread;

    const NX: usize = 32; // per-tile zones
    const NP: usize = 2; // ranks per direction

    fn global_cell(ig: usize, jg: usize) -> f64 {
        (ig * 1000 + jg) as f64 + 0.25
    }

    #[cfg(feature = "mhd")]
    fn global_b1(ig: usize, jg: usize) -> f64 {
        (ig * 1000 + jg) as f64 + 0.5
    }

    #[cfg(feature = "mhd")]
    fn global_b2(ig: usize, jg: usize) -> f64 {
        (ig * 1000 + jg) as f64 + 0.75
    }

    fn make_tile(ib: usize, jb: usize) -> Grid {
        let dx = 1.0 / (NX * NP) as f64;
        let mut g = Grid::new(
            [NX, NX, 1],
            [ib as f64 * NX as f64 * dx, jb as f64 * NX as f64 * dx, 0.0],
            [dx, dx, 1.0],
        );
        // Wrap-around neighbors of a doubly periodic 2x2 decomposition;
        // with two ranks per direction both neighbors coincide.
        let rank = |ibx: usize, jbx: usize| jbx * NP + ibx;
        g.lx1_id = Some(rank((ib + NP - 1) % NP, jb));
        g.rx1_id = Some(rank((ib + 1) % NP, jb));
        g.lx2_id = Some(rank(ib, (jb + NP - 1) % NP));
        g.rx2_id = Some(rank(ib, (jb + 1) % NP));

        // Active zones tagged by global index; ghosts poisoned.
        let (n3, n2, n1) = g.dims();
        for k in 0..n3 {
            for j in 0..n2 {
                for i in 0..n1 {
                    g.u[(k, j, i)] = Gas {
                        d: -1.0,
                        ..Gas::default()
                    };
                }
            }
        }
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let ig = ib * NX + (i - g.is);
                let jg = jb * NX + (j - g.js);
                g.u[(0, j, i)].d = global_cell(ig, jg);
                #[cfg(feature = "mhd")]
                {
                    g.b1i[(0, j, i)] = global_b1(ig, jg);
                    g.b2i[(0, j, i)] = global_b2(ig, jg);
                }
            }
        }
        // Face rows at ie+1 / je+1 belong to the active mesh too.
        #[cfg(feature = "mhd")]
        {
            for j in g.js..=g.je {
                let ig = ib * NX + NX;
                let jg = jb * NX + (j - g.js);
                g.b1i[(0, j, g.ie + 1)] = global_b1(ig, jg);
            }
            for i in g.is..=g.ie {
                let ig = ib * NX + (i - g.is);
                let jg = jb * NX + NX;
                g.b2i[(0, g.je + 1, i)] = global_b2(ig, jg);
            }
        }
        g
    }

    /// After one exchange, every ghost cell matches the corresponding
    /// active cell on the neighbor rank bit-exactly.
    #[test]
    fn test_doubly_periodic_2x2_exchange() {
        let transports = LocalCluster::ranks(NP * NP);
        let mut handles = Vec::new();
        for (rank, mut tr) in transports.into_iter().enumerate() {
            handles.push(thread::spawn(move || {
                let (ib, jb) = (rank % NP, rank / NP);
                let mut g = make_tile(ib, jb);
                let mut bc = BoundaryConditions::from_flags(
                    FaceBoundaries::new(4, 4, 4, 4, 4, 4),
                    &g,
                )
                .unwrap();
                bc.apply(&mut g, &mut tr).unwrap();
                (rank, g)
            }));
        }

        let n_glob = NX * NP;
        let wrap = |v: isize| -> usize { v.rem_euclid(n_glob as isize) as usize };

        for h in handles {
            let (rank, g) = h.join().unwrap();
            let (ib, jb) = (rank % NP, rank / NP);
            // Every zone in the ghost-extended interior region must now
            // carry the wrapped global value.
            for j in (g.js - NGHOST)..=(g.je + NGHOST) {
                for i in (g.is - NGHOST)..=(g.ie + NGHOST) {
                    let ig = wrap((ib * NX) as isize + i as isize - g.is as isize);
                    let jg = wrap((jb * NX) as isize + j as isize - g.js as isize);
                    let got = g.u[(0, j, i)].d;
                    let want = global_cell(ig, jg);
                    assert_eq!(
                        got, want,
                        "rank {rank}: ghost mismatch at local ({i},{j}) -> global ({ig},{jg})"
                    );
                }
            }
            // Interface fields in the x1 ghost strips match the
            // neighbor's faces bit-exactly.
            #[cfg(feature = "mhd")]
            for j in g.js..=g.je {
                let jg = jb * NX + (j - g.js);
                for off in 1..=NGHOST {
                    let ig = wrap((ib * NX) as isize - off as isize);
                    assert_eq!(g.b1i[(0, j, g.is - off)], global_b1(ig, jg));
                }
            }
        }
    }
}
