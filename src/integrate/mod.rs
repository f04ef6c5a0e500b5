//! The directionally unsplit CTU integrator.
//!
//! One [`Integrator`] advances one [`Grid`] tile per call to
//! [`Integrator::step`]: a half-step predictor in every direction,
//! transverse flux corrections, constrained-transport face-field updates
//! driven by corner-integrated EMFs, gravitational/Coriolis source terms,
//! and the final conservative update. The same code path serves 2D
//! (`Nx3 = 1`, x3 sweep elided) and 3D grids.
//!
//! Scratch storage lives in an arena owned by the integrator, allocated
//! at construction (the H-correction fields lazily on first use) and
//! reused every step; nothing allocates on the hot path.

mod ctu;
#[cfg(feature = "mhd")]
mod emf;

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::flux::{BoxedSolver, Hlle};
use crate::grid::{Field3, Grid};
use crate::recon::{BoxedReconstruction, Plm};
use crate::state::{Cons1D, Eos, NonPhysical, NonPhysicalKind, Prim1D};
use crate::types::{Direction, GravityPotentialFn};
use crate::{Real, NGHOST};

#[cfg(feature = "mhd")]
use crate::grid::ScalarField;

/// Shearing-box parameters: local sheet rotating at `omega` with the
/// standard Keplerian shear rate `q = 3/2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShearingBox {
    /// Orbital frequency of the sheet.
    pub omega: Real,
}

/// Per-run integrator configuration. Explicit handle, no globals.
#[derive(Clone, Copy)]
pub struct IntegratorConfig {
    /// Equation of state.
    pub eos: Eos,
    /// Courant number used by [`new_dt`].
    pub courant: Real,
    /// Static gravitational potential, if any.
    pub gravity: Option<GravityPotentialFn>,
    /// Enable the H-correction dissipation switch.
    pub h_correction: bool,
    /// Enable shearing-box Coriolis/tidal source terms.
    pub shearing: Option<ShearingBox>,
}

impl IntegratorConfig {
    /// Configuration with defaults: Courant number 0.4, no gravity, no
    /// H-correction, no shearing box.
    pub fn new(eos: Eos) -> Self {
        Self {
            eos,
            courant: 0.4,
            gravity: None,
            h_correction: false,
            shearing: None,
        }
    }

    /// Set the Courant number.
    pub fn with_courant(mut self, courant: Real) -> Self {
        self.courant = courant;
        self
    }

    /// Enroll a static gravitational potential.
    pub fn with_gravity(mut self, phi: GravityPotentialFn) -> Self {
        self.gravity = Some(phi);
        self
    }

    /// Enable the H-correction.
    pub fn with_h_correction(mut self) -> Self {
        self.h_correction = true;
        self
    }

    /// Enable shearing-box source terms.
    pub fn with_shearing(mut self, omega: Real) -> Self {
        self.shearing = Some(ShearingBox { omega });
        self
    }
}

/// Which stage of the step produced a non-physical state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sweep {
    X1,
    X2,
    X3,
    /// The half-step density used by gravity and the CT EMFs.
    HalfStep,
    /// The final conservative update.
    FinalUpdate,
}

impl fmt::Display for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sweep::X1 => write!(f, "x1"),
            Sweep::X2 => write!(f, "x2"),
            Sweep::X3 => write!(f, "x3"),
            Sweep::HalfStep => write!(f, "half-step"),
            Sweep::FinalUpdate => write!(f, "final-update"),
        }
    }
}

/// A failed time step.
///
/// The grid contents are not rolled back; the caller owns recovery
/// (typically: restore the previous state, halve `dt`, retry).
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum StepError {
    #[error("non-positive density {value:.3e} at zone ({i},{j},{k}) in {sweep} sweep")]
    NegativeDensity {
        i: usize,
        j: usize,
        k: usize,
        value: Real,
        sweep: Sweep,
    },
    #[error("non-positive pressure {value:.3e} at zone ({i},{j},{k}) in {sweep} sweep")]
    NegativePressure {
        i: usize,
        j: usize,
        k: usize,
        value: Real,
        sweep: Sweep,
    },
}

impl StepError {
    pub(crate) fn from_nonphys(np: NonPhysical, i: usize, j: usize, k: usize, sweep: Sweep) -> Self {
        match np.kind {
            NonPhysicalKind::Density => StepError::NegativeDensity {
                i,
                j,
                k,
                value: np.value,
                sweep,
            },
            NonPhysicalKind::Pressure => StepError::NegativePressure {
                i,
                j,
                k,
                value: np.value,
                sweep,
            },
        }
    }
}

/// Scratch arena for one tile: face L/R states and fluxes for every
/// direction, the CT fields, the half-step density, and the 1D sweep
/// rows.
pub(crate) struct Work {
    pub ul_x1: Field3<Cons1D>,
    pub ur_x1: Field3<Cons1D>,
    pub ul_x2: Field3<Cons1D>,
    pub ur_x2: Field3<Cons1D>,
    pub ul_x3: Field3<Cons1D>,
    pub ur_x3: Field3<Cons1D>,
    pub x1_flux: Field3<Cons1D>,
    pub x2_flux: Field3<Cons1D>,
    pub x3_flux: Field3<Cons1D>,
    #[cfg(feature = "mhd")]
    pub b1_x1: ScalarField,
    #[cfg(feature = "mhd")]
    pub b2_x2: ScalarField,
    #[cfg(feature = "mhd")]
    pub b3_x3: ScalarField,
    #[cfg(feature = "mhd")]
    pub emf1: ScalarField,
    #[cfg(feature = "mhd")]
    pub emf2: ScalarField,
    #[cfg(feature = "mhd")]
    pub emf3: ScalarField,
    #[cfg(feature = "mhd")]
    pub emf1_cc: ScalarField,
    #[cfg(feature = "mhd")]
    pub emf2_cc: ScalarField,
    #[cfg(feature = "mhd")]
    pub emf3_cc: ScalarField,
    pub dhalf: Field3<Real>,
    pub eta1: Option<Field3<Real>>,
    pub eta2: Option<Field3<Real>>,
    pub eta3: Option<Field3<Real>>,
    pub u1d: Vec<Cons1D>,
    pub w: Vec<Prim1D>,
    pub wl: Vec<Prim1D>,
    pub wr: Vec<Prim1D>,
    pub bxc: Vec<Real>,
    pub bxi: Vec<Real>,
}

impl Work {
    fn new(g: &Grid) -> Self {
        let (n3, n2, n1) = g.dims();
        let nmax = n1.max(n2).max(n3);
        let (e3, e2, e1) = if g.three_d() {
            (n3, n2, n1)
        } else {
            // x3 sweep arrays are untouched in 2D
            (1, 1, 1)
        };
        Self {
            ul_x1: Field3::new(n3, n2, n1),
            ur_x1: Field3::new(n3, n2, n1),
            ul_x2: Field3::new(n3, n2, n1),
            ur_x2: Field3::new(n3, n2, n1),
            ul_x3: Field3::new(e3, e2, e1),
            ur_x3: Field3::new(e3, e2, e1),
            x1_flux: Field3::new(n3, n2, n1),
            x2_flux: Field3::new(n3, n2, n1),
            x3_flux: Field3::new(e3, e2, e1),
            #[cfg(feature = "mhd")]
            b1_x1: Field3::new(n3, n2, n1),
            #[cfg(feature = "mhd")]
            b2_x2: Field3::new(n3, n2, n1),
            #[cfg(feature = "mhd")]
            b3_x3: Field3::new(e3, e2, e1),
            #[cfg(feature = "mhd")]
            emf1: Field3::new(e3, e2, e1),
            #[cfg(feature = "mhd")]
            emf2: Field3::new(e3, e2, e1),
            #[cfg(feature = "mhd")]
            emf3: Field3::new(n3, n2, n1),
            #[cfg(feature = "mhd")]
            emf1_cc: Field3::new(e3, e2, e1),
            #[cfg(feature = "mhd")]
            emf2_cc: Field3::new(e3, e2, e1),
            #[cfg(feature = "mhd")]
            emf3_cc: Field3::new(n3, n2, n1),
            dhalf: Field3::new(n3, n2, n1),
            eta1: None,
            eta2: None,
            eta3: None,
            u1d: vec![Cons1D::default(); nmax],
            w: vec![Prim1D::default(); nmax],
            wl: vec![Prim1D::default(); nmax + 1],
            wr: vec![Prim1D::default(); nmax + 1],
            bxc: vec![0.0; nmax],
            bxi: vec![0.0; nmax],
        }
    }
}

/// The CTU integrator for one grid tile.
pub struct Integrator {
    pub(crate) work: Work,
    pub(crate) recon: BoxedReconstruction,
    pub(crate) solver: BoxedSolver,
}

impl Integrator {
    /// Allocate the scratch arena for `g` with the default operators
    /// (PLM reconstruction, HLLE fluxes).
    pub fn new(g: &Grid) -> Self {
        let (n3, n2, n1) = g.dims();
        debug!(n1, n2, n3, "allocating integrator scratch arena");
        Self {
            work: Work::new(g),
            recon: Box::new(Plm),
            solver: Box::new(Hlle),
        }
    }

    /// Replace the reconstruction operator.
    pub fn with_reconstruction(mut self, recon: BoxedReconstruction) -> Self {
        self.recon = recon;
        self
    }

    /// Replace the Riemann solver.
    pub fn with_solver(mut self, solver: BoxedSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Allocate the H-correction wavespeed fields on first use.
    pub(crate) fn ensure_eta(&mut self, g: &Grid) {
        if self.work.eta1.is_none() {
            let (n3, n2, n1) = g.dims();
            self.work.eta1 = Some(Field3::new(n3, n2, n1));
            self.work.eta2 = Some(Field3::new(n3, n2, n1));
            self.work.eta3 = Some(Field3::new(n3, n2, n1));
        }
    }
}

/// CFL-limited step size for the local tile.
///
/// The global step is the reduced minimum over all tiles; see
/// [`sync_dt`].
pub fn new_dt(g: &Grid, cfg: &IntegratorConfig) -> Real {
    let mut max_dti: Real = 0.0;
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let q = g.u[(k, j, i)];
                let (v1, v2, v3) = q.velocity();
                let c1 = q.cfast(Direction::X1, &cfg.eos);
                max_dti = max_dti.max((v1.abs() + c1) / g.dx1);
                if g.nx2 > 1 {
                    let c2 = q.cfast(Direction::X2, &cfg.eos);
                    max_dti = max_dti.max((v2.abs() + c2) / g.dx2);
                }
                if g.nx3 > 1 {
                    let c3 = q.cfast(Direction::X3, &cfg.eos);
                    max_dti = max_dti.max((v3.abs() + c3) / g.dx3);
                }
            }
        }
    }
    cfg.courant / max_dti
}

/// Compute the local CFL step, reduce the minimum across all ranks, and
/// store it on the grid. All tiles must call this collectively.
pub fn sync_dt<T: crate::boundary::Transport>(
    g: &mut Grid,
    cfg: &IntegratorConfig,
    tr: &mut T,
) -> Result<Real, crate::boundary::ExchangeError> {
    let local = new_dt(g, cfg);
    let global = tr.allreduce_min(local)?;
    g.dt = global;
    Ok(global)
}

/// Same-sign minmod of `(-dbn, dbt)`: the transverse-field source-term
/// limiter. Inputs with the same sign yield zero.
#[cfg(feature = "mhd")]
#[inline]
pub(crate) fn mdb(dbn: Real, dbt: Real) -> Real {
    if dbn > 0.0 && dbt < 0.0 {
        dbt.max(-dbn)
    } else if dbn < 0.0 && dbt > 0.0 {
        dbt.min(-dbn)
    } else {
        0.0
    }
}

/// Ghost-zone count required by the integrator stencils.
pub const fn required_nghost() -> usize {
    NGHOST
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Gas;

    #[cfg(not(feature = "isothermal"))]
    fn eos() -> Eos {
        Eos::adiabatic(5.0 / 3.0)
    }
    #[cfg(feature = "isothermal")]
    fn eos() -> Eos {
        Eos::isothermal(1.0)
    }

    #[test]
    fn test_new_dt_uniform_gas() {
        let mut g = Grid::new([8, 8, 1], [0.0, 0.0, 0.0], [0.125, 0.125, 1.0]);
        g.init_with(|_, _, _| Gas {
            d: 1.0,
            #[cfg(not(feature = "isothermal"))]
            e: 1.5,
            ..Gas::default()
        });
        let cfg = IntegratorConfig::new(eos());
        let dt = new_dt(&g, &cfg);
        assert!(dt > 0.0 && dt.is_finite());
        // Still gas: dt = C0 * dx / cs.
        let cs = g.u[(0, g.js, g.is)].cfast(Direction::X1, &cfg.eos);
        assert!((dt - cfg.courant * 0.125 / cs).abs() < 1e-12);
    }

    #[cfg(feature = "mhd")]
    #[test]
    fn test_mdb_limiter_convention() {
        // Same-sign inputs give zero.
        assert_eq!(mdb(1.0, 2.0), 0.0);
        assert_eq!(mdb(-1.0, -2.0), 0.0);
        // Opposite signs: the smaller magnitude, with dbt's sign.
        assert!((mdb(1.0, -0.5) + 0.5).abs() < 1e-15);
        assert!((mdb(1.0, -2.0) + 1.0).abs() < 1e-15);
        assert!((mdb(-1.0, 0.5) - 0.5).abs() < 1e-15);
        assert!((mdb(-0.25, 2.0) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_step_error_display() {
        let e = StepError::NegativeDensity {
            i: 3,
            j: 4,
            k: 0,
            value: -1.0e-3,
            sweep: Sweep::X2,
        };
        let msg = e.to_string();
        assert!(msg.contains("(3,4,0)"));
        assert!(msg.contains("x2"));
    }
}
