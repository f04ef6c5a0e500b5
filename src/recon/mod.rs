//! Interface-state reconstruction.
//!
//! The integrator consumes reconstruction through the [`Reconstruction`]
//! trait: given a row of primitive states it produces the left/right
//! states at each interface, already traced forward by half a time step
//! in the sweep direction. Any total-variation-limiting implementation
//! satisfies the contract; [`Plm`] is the bundled second-order operator
//! and [`DonorCell`] the first-order reference.

mod donor;
mod plm;

pub use donor::DonorCell;
pub use plm::Plm;

use crate::state::{Eos, Prim1D};
use crate::Real;

/// Reconstruction of interface states along one sweep.
///
/// # Contract
///
/// For every interface index `i` in `lo..=hi + 1`, fill `wl[i]` and
/// `wr[i]` with the left and right primitive states at interface
/// `i - 1/2` (between cells `i - 1` and `i`), traced by `dt / 2` along
/// the sweep. Implementations may read `w` and `bxc` over
/// `lo - 2..=hi + 2`.
pub trait Reconstruction: Send + Sync {
    /// Produce the interface states. `bxc` is the cell-centered normal
    /// field row (all zeros for hydrodynamics), `dtodx = dt / dx`.
    #[allow(clippy::too_many_arguments)]
    fn reconstruct(
        &self,
        w: &[Prim1D],
        bxc: &[Real],
        dt: Real,
        dtodx: Real,
        lo: usize,
        hi: usize,
        eos: &Eos,
        wl: &mut [Prim1D],
        wr: &mut [Prim1D],
    );

    /// Human-readable name for debugging and logging.
    fn name(&self) -> &'static str;
}

/// Type alias for boxed reconstruction (runtime selection).
pub type BoxedReconstruction = Box<dyn Reconstruction>;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "isothermal"))]
    fn eos() -> Eos {
        Eos::adiabatic(5.0 / 3.0)
    }
    #[cfg(feature = "isothermal")]
    fn eos() -> Eos {
        Eos::isothermal(1.0)
    }

    fn uniform_row(n: usize) -> Vec<Prim1D> {
        let w = Prim1D {
            d: 1.3,
            vx: 0.4,
            vy: -0.2,
            vz: 0.1,
            #[cfg(not(feature = "isothermal"))]
            p: 0.9,
            ..Prim1D::default()
        };
        vec![w; n]
    }

    /// A flat row must reconstruct to the same flat states for any
    /// limiting operator (consistency).
    fn assert_flat_preserved<R: Reconstruction>(recon: &R) {
        let n = 16;
        let w = uniform_row(n);
        let bxc = vec![0.0; n];
        let mut wl = vec![Prim1D::default(); n];
        let mut wr = vec![Prim1D::default(); n];
        let (lo, hi) = (4, 10);
        recon.reconstruct(&w, &bxc, 0.01, 0.1, lo, hi, &eos(), &mut wl, &mut wr);
        for i in lo..=hi + 1 {
            assert!((wl[i].d - w[i].d).abs() < 1e-13, "{}", recon.name());
            assert!((wr[i].d - w[i].d).abs() < 1e-13);
            assert!((wl[i].vx - w[i].vx).abs() < 1e-13);
            assert!((wr[i].vx - w[i].vx).abs() < 1e-13);
        }
    }

    #[test]
    fn test_flat_row_preserved() {
        assert_flat_preserved(&Plm);
        assert_flat_preserved(&DonorCell);
    }

    #[test]
    fn test_plm_monotone_at_jump() {
        // Interface states at a discontinuity must stay within the
        // neighboring cell values (no new extrema).
        let n = 16;
        let mut w = uniform_row(n);
        for (i, wi) in w.iter_mut().enumerate() {
            wi.d = if i < 8 { 2.0 } else { 0.5 };
        }
        let bxc = vec![0.0; n];
        let mut wl = vec![Prim1D::default(); n];
        let mut wr = vec![Prim1D::default(); n];
        Plm.reconstruct(&w, &bxc, 0.0, 0.0, 4, 10, &eos(), &mut wl, &mut wr);
        for i in 5..=10 {
            assert!(wl[i].d <= 2.0 + 1e-13 && wl[i].d >= 0.5 - 1e-13);
            assert!(wr[i].d <= 2.0 + 1e-13 && wr[i].d >= 0.5 - 1e-13);
        }
    }
}
