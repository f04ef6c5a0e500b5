//! First-order donor-cell reconstruction.

use super::Reconstruction;
use crate::state::{Eos, Prim1D};
use crate::Real;

/// Piecewise-constant interface states.
///
/// First-order accurate and unconditionally monotone; useful as a
/// reference operator when isolating reconstruction effects.
#[derive(Clone, Copy, Debug, Default)]
pub struct DonorCell;

impl Reconstruction for DonorCell {
    fn reconstruct(
        &self,
        w: &[Prim1D],
        _bxc: &[Real],
        _dt: Real,
        _dtodx: Real,
        lo: usize,
        hi: usize,
        _eos: &Eos,
        wl: &mut [Prim1D],
        wr: &mut [Prim1D],
    ) {
        for i in (lo - 1)..=(hi + 1) {
            wl[i + 1] = w[i];
            wr[i] = w[i];
        }
    }

    fn name(&self) -> &'static str {
        "donor_cell"
    }
}
