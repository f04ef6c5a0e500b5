//! Riemann-solver microbenchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ctu_rs::{Cons1D, Eos, Hlle, RiemannSolver, Rusanov};

#[cfg(not(feature = "isothermal"))]
fn eos() -> Eos {
    Eos::adiabatic(5.0 / 3.0)
}
#[cfg(feature = "isothermal")]
fn eos() -> Eos {
    Eos::isothermal(1.0)
}

fn states() -> (Cons1D, Cons1D) {
    let mut ul = Cons1D {
        d: 1.0,
        mx: 0.3,
        my: -0.1,
        mz: 0.05,
        ..Cons1D::default()
    };
    let mut ur = Cons1D {
        d: 0.6,
        mx: -0.2,
        my: 0.15,
        mz: 0.0,
        ..Cons1D::default()
    };
    #[cfg(not(feature = "isothermal"))]
    {
        ul.e = 2.2;
        ur.e = 1.4;
    }
    #[cfg(feature = "mhd")]
    {
        ul.by = 0.4;
        ul.bz = -0.2;
        ur.by = -0.3;
        ur.bz = 0.1;
    }
    (ul, ur)
}

fn bench_solvers(c: &mut Criterion) {
    let (ul, ur) = states();
    let eos = eos();
    let bx = 0.5;

    c.bench_function("hlle_flux", |b| {
        b.iter(|| {
            Hlle.flux(
                black_box(bx),
                black_box(&ul),
                black_box(&ur),
                0.0,
                &eos,
            )
            .unwrap()
        })
    });

    c.bench_function("rusanov_flux", |b| {
        b.iter(|| {
            Rusanov
                .flux(black_box(bx), black_box(&ul), black_box(&ur), 0.0, &eos)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_solvers);
criterion_main!(benches);
