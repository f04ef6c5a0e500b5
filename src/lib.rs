//! # ctu-rs
//!
//! A finite-volume magnetohydrodynamics library for logically Cartesian
//! structured grids, built around:
//! - The directionally unsplit corner-transport-upwind (CTU) integrator
//!   with transverse flux corrections (2D and 3D in one implementation)
//! - Constrained transport (CT) of face-centered magnetic fields via
//!   upwind corner EMF integration, keeping div B = 0 to round-off
//! - Static gravitational potentials and shearing-box source terms
//! - Passive scalar advection
//! - The H-correction multidimensional dissipation switch
//! - Ghost-zone boundary conditions (reflecting, outflow, periodic,
//!   user-defined) and neighbor exchange for domain-decomposed runs
//!
//! The Riemann solver and interface-state reconstruction are injected
//! operators behind the [`flux::RiemannSolver`] and
//! [`recon::Reconstruction`] traits; HLLE/Rusanov and PLM/donor-cell
//! implementations are bundled.

pub mod boundary;
pub mod diag;
pub mod flux;
pub mod grid;
pub mod integrate;
pub mod recon;
pub mod state;
pub mod types;

/// Floating-point type used throughout.
pub type Real = f64;

/// Ghost-zone depth on each side of every decomposed direction.
pub const NGHOST: usize = 4;

/// Number of passive scalar densities advected with the fluid.
pub const NSCALARS: usize = 2;

/// Number of variables in the cell state vector.
#[cfg(all(feature = "mhd", not(feature = "isothermal")))]
pub const NVAR: usize = 8 + NSCALARS;
#[cfg(all(feature = "mhd", feature = "isothermal"))]
pub const NVAR: usize = 7 + NSCALARS;
#[cfg(all(not(feature = "mhd"), not(feature = "isothermal")))]
pub const NVAR: usize = 5 + NSCALARS;
#[cfg(all(not(feature = "mhd"), feature = "isothermal"))]
pub const NVAR: usize = 4 + NSCALARS;

/// Number of values exchanged per cell between neighboring tiles.
/// Three extra slots carry the interface magnetic fields.
#[cfg(feature = "mhd")]
pub const NVAR_SHARE: usize = NVAR + 3;
#[cfg(not(feature = "mhd"))]
pub const NVAR_SHARE: usize = NVAR;

// Re-export main types for convenience

pub use boundary::{
    do_nothing_bc, BcKind, BoundaryConditions, BoundaryError, ConfigError, ExchangeError,
    LocalCluster, LocalTransport, RecvToken, SerialTransport, Transport, UserBcFn,
    BOUNDARY_CELLS_TAG,
};
pub use diag::{min_max_density, total_energy, total_mass, total_momentum};
#[cfg(feature = "mhd")]
pub use diag::{check_div_b, magnetic_energy, max_div_b};
pub use flux::{create_solver, BoxedSolver, Hlle, RiemannSolver, Rusanov, StandardSolver};
pub use grid::{Field3, Grid, ScalarField};
pub use integrate::{new_dt, sync_dt, Integrator, IntegratorConfig, ShearingBox, StepError, Sweep};
pub use recon::{BoxedReconstruction, DonorCell, Plm, Reconstruction};
pub use state::{Cons1D, Eos, Gas, NonPhysical, NonPhysicalKind, Prim1D};
pub use types::{BoundarySide, Direction, FaceBoundaries, GravityPotentialFn};
