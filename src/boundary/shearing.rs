//! Shearing-sheet remap support.
//!
//! The sheet hooks themselves are problem-registered functions (see
//! [`super::BoundaryConditions::enroll_shearing_sheet`]); this module
//! provides the integer-zone remap a hook typically builds on: after the
//! periodic x1 wrap, the ghost columns on an outer x1 rank are shifted
//! in x2 by the distance the opposite edge has sheared past.

use crate::grid::Grid;
use crate::state::Gas;
use crate::{Real, NGHOST};

/// Shift the x1 ghost columns of one side by whole zones in x2.
///
/// `inner` selects the ghost region (`true` = inner x1 side); `shift`
/// is the sheared distance `q * omega * Lx * t`, remapped into the
/// domain and rounded to zones. Sub-zone interpolation, when needed,
/// belongs to the problem's own hook.
pub fn integer_shift_remap(g: &mut Grid, inner: bool, shift: Real) {
    if g.nx2 <= 1 {
        return;
    }
    let ny = g.nx2;
    let ly = ny as Real * g.dx2;
    let wrapped = shift.rem_euclid(ly);
    let zones = (wrapped / g.dx2).round() as usize % ny;
    if zones == 0 {
        return;
    }

    let (il, iu) = if inner {
        (g.is - NGHOST, g.is - 1)
    } else {
        (g.ie + 1, g.ie + NGHOST)
    };
    let signed = if inner { zones } else { ny - zones };

    let mut column: Vec<Gas> = vec![Gas::default(); ny];
    for k in g.ks..=g.ke {
        for i in il..=iu {
            for j in 0..ny {
                column[j] = g.u[(k, g.js + j, i)];
            }
            for j in 0..ny {
                g.u[(k, g.js + j, i)] = column[(j + signed) % ny];
            }
        }
    }
}
