//! One tile of a structured Cartesian mesh.
//!
//! A [`Grid`] owns the conservative cell states and (with `mhd`) the three
//! face-centered magnetic field arrays for one subdomain, plus the index
//! geometry: active ranges, spacings, tile origin, and the six neighbor
//! identifiers used by the boundary exchange.

mod field;

pub use field::{Field3, ScalarField};

use crate::state::Gas;
use crate::{Real, NGHOST};

/// One tile of the computational domain, owned by one process.
///
/// Index layout: every decomposed direction (extent > 1) carries
/// [`NGHOST`] ghost zones on each side; `is..=ie` (and j, k analogues)
/// span the active zones. A direction with a single zone carries no
/// ghosts and collapses to index 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Active zone counts.
    pub nx1: usize,
    pub nx2: usize,
    pub nx3: usize,
    /// Active index ranges (inclusive).
    pub is: usize,
    pub ie: usize,
    pub js: usize,
    pub je: usize,
    pub ks: usize,
    pub ke: usize,
    /// Cell spacings.
    pub dx1: Real,
    pub dx2: Real,
    pub dx3: Real,
    /// Physical position of the inner edge of the first active zone.
    pub x1_min: Real,
    pub x2_min: Real,
    pub x3_min: Real,
    /// Current time and step size.
    pub time: Real,
    pub dt: Real,
    /// Conservative cell states, ghost zones included.
    pub u: Field3<Gas>,
    /// Face-centered x1 field; `b1i[(k,j,i)]` sits on the -x1 face of
    /// cell `(i,j,k)`.
    #[cfg(feature = "mhd")]
    pub b1i: ScalarField,
    /// Face-centered x2 field on the -x2 face.
    #[cfg(feature = "mhd")]
    pub b2i: ScalarField,
    /// Face-centered x3 field on the -x3 face.
    #[cfg(feature = "mhd")]
    pub b3i: ScalarField,
    /// Neighbor tile ranks; `None` means the face is a physical boundary.
    pub lx1_id: Option<usize>,
    pub rx1_id: Option<usize>,
    pub lx2_id: Option<usize>,
    pub rx2_id: Option<usize>,
    pub lx3_id: Option<usize>,
    pub rx3_id: Option<usize>,
}

impl Grid {
    /// Create a tile with `nx = [nx1, nx2, nx3]` active zones, inner-edge
    /// origin `xmin`, and spacings `dx`. All states start at zero; all
    /// faces start as physical boundaries.
    pub fn new(nx: [usize; 3], xmin: [Real; 3], dx: [Real; 3]) -> Self {
        let [nx1, nx2, nx3] = nx;
        assert!(nx1 > 1, "the x1 direction must have at least two zones");
        let n1 = nx1 + 2 * NGHOST;
        let n2 = if nx2 > 1 { nx2 + 2 * NGHOST } else { 1 };
        let n3 = if nx3 > 1 { nx3 + 2 * NGHOST } else { 1 };
        let is = NGHOST;
        let js = if nx2 > 1 { NGHOST } else { 0 };
        let ks = if nx3 > 1 { NGHOST } else { 0 };
        Self {
            nx1,
            nx2,
            nx3,
            is,
            ie: is + nx1 - 1,
            js,
            je: js + nx2 - 1,
            ks,
            ke: ks + nx3 - 1,
            dx1: dx[0],
            dx2: dx[1],
            dx3: dx[2],
            x1_min: xmin[0],
            x2_min: xmin[1],
            x3_min: xmin[2],
            time: 0.0,
            dt: 0.0,
            u: Field3::new(n3, n2, n1),
            #[cfg(feature = "mhd")]
            b1i: Field3::new(n3, n2, n1),
            #[cfg(feature = "mhd")]
            b2i: Field3::new(n3, n2, n1),
            #[cfg(feature = "mhd")]
            b3i: Field3::new(n3, n2, n1),
            lx1_id: None,
            rx1_id: None,
            lx2_id: None,
            rx2_id: None,
            lx3_id: None,
            rx3_id: None,
        }
    }

    /// Whether the tile extends in x3.
    #[inline(always)]
    pub fn three_d(&self) -> bool {
        self.nx3 > 1
    }

    /// Cell-center position of zone `(i, j, k)`.
    #[inline]
    pub fn cc_pos(&self, i: usize, j: usize, k: usize) -> (Real, Real, Real) {
        (
            self.x1_min + (i as Real - self.is as Real + 0.5) * self.dx1,
            self.x2_min + (j as Real - self.js as Real + 0.5) * self.dx2,
            self.x3_min + (k as Real - self.ks as Real + 0.5) * self.dx3,
        )
    }

    /// Allocated array dimensions `(n3, n2, n1)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        self.u.dims()
    }

    /// Initialize every zone (ghosts included) from a cell-center
    /// position function.
    pub fn init_with<F>(&mut self, f: F)
    where
        F: Fn(Real, Real, Real) -> Gas,
    {
        let (n3, n2, n1) = self.dims();
        for k in 0..n3 {
            for j in 0..n2 {
                for i in 0..n1 {
                    let (x1, x2, x3) = self.cc_pos(i, j, k);
                    self.u[(k, j, i)] = f(x1, x2, x3);
                }
            }
        }
    }

    /// Initialize the face-centered fields from functions evaluated at
    /// face centers; `f1(x1_face, x2_cc, x3_cc)` and analogues.
    #[cfg(feature = "mhd")]
    pub fn init_face_b<F1, F2, F3>(&mut self, f1: F1, f2: F2, f3: F3)
    where
        F1: Fn(Real, Real, Real) -> Real,
        F2: Fn(Real, Real, Real) -> Real,
        F3: Fn(Real, Real, Real) -> Real,
    {
        let (n3, n2, n1) = self.dims();
        for k in 0..n3 {
            for j in 0..n2 {
                for i in 0..n1 {
                    let (x1, x2, x3) = self.cc_pos(i, j, k);
                    let hd1 = 0.5 * self.dx1;
                    let hd2 = 0.5 * self.dx2;
                    let hd3 = 0.5 * self.dx3;
                    self.b1i[(k, j, i)] = f1(x1 - hd1, x2, x3);
                    self.b2i[(k, j, i)] = f2(x1, x2 - hd2, x3);
                    self.b3i[(k, j, i)] = if self.three_d() {
                        f3(x1, x2, x3 - hd3)
                    } else {
                        f3(x1, x2, x3)
                    };
                }
            }
        }
    }

    /// Set the cell-centered field to the average of the surrounding
    /// faces, establishing the cell/face consistency invariant. Call
    /// after initializing face fields.
    #[cfg(feature = "mhd")]
    pub fn sync_cell_b(&mut self) {
        let (n3, n2, n1) = self.dims();
        for k in 0..n3 {
            for j in 0..n2 {
                for i in 0..n1 {
                    let b1 = if i + 1 < n1 {
                        0.5 * (self.b1i[(k, j, i)] + self.b1i[(k, j, i + 1)])
                    } else {
                        self.b1i[(k, j, i)]
                    };
                    let b2 = if j + 1 < n2 {
                        0.5 * (self.b2i[(k, j, i)] + self.b2i[(k, j + 1, i)])
                    } else {
                        self.b2i[(k, j, i)]
                    };
                    let b3 = if self.three_d() && k + 1 < n3 {
                        0.5 * (self.b3i[(k, j, i)] + self.b3i[(k + 1, j, i)])
                    } else {
                        self.b3i[(k, j, i)]
                    };
                    let cell = &mut self.u[(k, j, i)];
                    cell.b1c = b1;
                    cell.b2c = b2;
                    cell.b3c = b3;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_ranges_2d() {
        let g = Grid::new([8, 6, 1], [0.0, 0.0, 0.0], [0.1, 0.1, 1.0]);
        assert_eq!(g.is, NGHOST);
        assert_eq!(g.ie, NGHOST + 7);
        assert_eq!(g.js, NGHOST);
        assert_eq!(g.je, NGHOST + 5);
        assert_eq!(g.ks, 0);
        assert_eq!(g.ke, 0);
        assert!(!g.three_d());
        assert_eq!(g.dims(), (1, 6 + 2 * NGHOST, 8 + 2 * NGHOST));
    }

    #[test]
    fn test_cc_pos_centers() {
        let g = Grid::new([4, 4, 1], [0.0, -1.0, 0.0], [0.25, 0.5, 1.0]);
        let (x1, x2, _x3) = g.cc_pos(g.is, g.js, g.ks);
        assert!((x1 - 0.125).abs() < 1e-14);
        assert!((x2 + 0.75).abs() < 1e-14);
        let (x1e, _, _) = g.cc_pos(g.ie, g.js, g.ks);
        assert!((x1e - (1.0 - 0.125)).abs() < 1e-14);
    }

    #[test]
    fn test_init_with_fills_ghosts() {
        let mut g = Grid::new([4, 4, 1], [0.0, 0.0, 0.0], [0.25, 0.25, 1.0]);
        g.init_with(|x1, _x2, _x3| Gas {
            d: 1.0 + x1,
            ..Gas::default()
        });
        // Ghost zone left of the active region got a (negative-x) value.
        let ghost = g.u[(0, g.js, g.is - 1)];
        assert!(ghost.d < 1.0);
    }

    #[cfg(feature = "mhd")]
    #[test]
    fn test_sync_cell_b_consistency() {
        let mut g = Grid::new([4, 4, 1], [0.0, 0.0, 0.0], [0.25, 0.25, 1.0]);
        g.init_face_b(
            |x1, _, _| x1,
            |_, x2, _| 2.0 * x2,
            |_, _, _| 0.0,
        );
        g.sync_cell_b();
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let c = g.u[(0, j, i)];
                let want1 = 0.5 * (g.b1i[(0, j, i)] + g.b1i[(0, j, i + 1)]);
                let want2 = 0.5 * (g.b2i[(0, j, i)] + g.b2i[(0, j + 1, i)]);
                assert_eq!(c.b1c, want1);
                assert_eq!(c.b2c, want2);
            }
        }
    }
}
