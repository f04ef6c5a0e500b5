//! Isothermal-build checks: the state vector carries no energy, and the
//! integrator advects an isothermal sound wave cleanly.

#![cfg(feature = "isothermal")]

use ctu_rs::{
    new_dt, total_mass, BoundaryConditions, Eos, FaceBoundaries, Gas, Grid, Integrator,
    IntegratorConfig, SerialTransport,
};

const AMP: f64 = 1.0e-4;

#[test]
fn test_isothermal_sound_wave_round_trip() {
    let n = 32;
    let dx = 1.0 / n as f64;
    let mut g = Grid::new([n, 4, 1], [0.0, 0.0, 0.0], [dx, dx, 1.0]);
    let two_pi = 2.0 * std::f64::consts::PI;
    // Right-moving wave at cs = 1: delta v = delta rho / rho0.
    g.init_with(|x1, _, _| {
        let s = AMP * (two_pi * x1).sin();
        Gas {
            d: 1.0 + s,
            m1: (1.0 + s) * s,
            ..Gas::default()
        }
    });
    #[cfg(feature = "mhd")]
    g.sync_cell_b();

    let mut bc = BoundaryConditions::from_flags(FaceBoundaries::uniform(4), &g).unwrap();
    let cfg = IntegratorConfig::new(Eos::isothermal(1.0));
    let mut integ = Integrator::new(&g);
    let mut tr = SerialTransport;

    let mass0 = total_mass(&g);
    let t_end = 1.0;
    while g.time < t_end {
        let dt = new_dt(&g, &cfg).min(t_end - g.time);
        g.dt = dt;
        bc.apply(&mut g, &mut tr).unwrap();
        integ.step(&mut g, &cfg).unwrap();
        g.time += dt;
    }

    // Mass conserved to round-off under periodic boundaries.
    assert!(((total_mass(&g) - mass0) / mass0).abs() < 1e-12);

    // The wave returned to its starting phase with small L1 error.
    let mut err = 0.0;
    for i in g.is..=g.ie {
        let (x1, _, _) = g.cc_pos(i, g.js, 0);
        let want = 1.0 + AMP * (two_pi * x1).sin();
        err += (g.u[(0, g.js, i)].d - want).abs();
    }
    err *= dx;
    assert!(err < 0.2 * AMP, "L1 error {err:.3e} too large");
    for i in g.is..=g.ie {
        assert!(g.u[(0, g.js, i)].d > 0.0);
    }
}
