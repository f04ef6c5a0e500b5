//! Ghost-zone boundary conditions and neighbor exchange.
//!
//! Each face of a tile is either a physical boundary, filled by one of a
//! closed set of policies (reflecting with or without a normal field,
//! outflow, periodic, or a user-registered function), or an interior
//! boundary, filled by message exchange with the neighbor rank.
//!
//! Directions are processed strictly x1 then x2 then x3, inner and outer
//! face within each direction, so that a later direction's copy ranges
//! include the ghost zones the earlier direction just filled; that is
//! what makes edge and corner ghosts correct.

mod exchange;
mod outflow;
mod periodic;
mod reflect;
mod shearing;

pub use exchange::{
    ExchangeError, LocalCluster, LocalTransport, RecvToken, SerialTransport, Transport,
    BOUNDARY_CELLS_TAG,
};
pub use shearing::integer_shift_remap;

use thiserror::Error;
use tracing::debug;

use crate::grid::Grid;
use crate::types::{BoundarySide, FaceBoundaries};
use crate::{Real, NGHOST, NVAR_SHARE};

/// A user-registered boundary function: fills the ghost zones of the
/// face it was enrolled on.
pub type UserBcFn = fn(&mut Grid);

/// A user boundary that leaves the ghost zones untouched, for problems
/// that maintain a face themselves.
pub fn do_nothing_bc(_g: &mut Grid) {}

/// Physical boundary policy for one face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BcKind {
    /// Flag 1: reflect, with the normal interface field zeroed on the
    /// boundary face.
    ReflectZeroB,
    /// Flag 2: copy the last active cell outward.
    Outflow,
    /// Flag 4: wrap around the domain (or exchange with the wrapped
    /// neighbor when decomposed).
    Periodic,
    /// Flag 5: reflect, preserving the normal interface field.
    ReflectB,
    /// Problem-registered function.
    User(UserBcFn),
}

impl BcKind {
    /// Decode an integer boundary flag. Unknown values are fatal at
    /// initialization.
    pub fn from_flag(side: BoundarySide, flag: i32) -> Result<Self, ConfigError> {
        match flag {
            1 => Ok(BcKind::ReflectZeroB),
            2 => Ok(BcKind::Outflow),
            4 => Ok(BcKind::Periodic),
            5 => Ok(BcKind::ReflectB),
            _ => Err(ConfigError::UnknownBcFlag { side, flag }),
        }
    }
}

/// Invalid boundary configuration, fatal at initialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown boundary condition flag {flag} on face {side}")]
    UnknownBcFlag { side: BoundarySide, flag: i32 },
}

/// A failed boundary fill.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// The boundary subsystem for one tile: per-face policies, the shearing
/// sheet hooks, and the owned exchange staging buffers.
pub struct BoundaryConditions {
    kinds: FaceBoundaries<BcKind>,
    shearing_ix1: Option<UserBcFn>,
    shearing_ox1: Option<UserBcFn>,
    shearing_box: bool,
    send_buf: Vec<Real>,
    recv_buf: Vec<Real>,
}

impl BoundaryConditions {
    /// Build the subsystem for `g`, sizing the exchange buffers from the
    /// largest per-face tile.
    pub fn new(kinds: FaceBoundaries<BcKind>, g: &Grid) -> Self {
        let cnt2_face = if g.nx2 > 1 { g.nx2 + 1 } else { 1 };
        let cnt3_face = if g.nx3 > 1 { g.nx3 + 1 } else { 1 };
        let cnt1_ext = if g.nx1 > 1 { g.nx1 + 2 * NGHOST } else { 1 };
        let cnt2_ext = if g.nx2 > 1 { g.nx2 + 2 * NGHOST } else { 1 };
        let x1cnt = cnt2_face * cnt3_face;
        let x2cnt = cnt1_ext * cnt3_face;
        let x3cnt = cnt1_ext * cnt2_ext;
        let size = NGHOST * x1cnt.max(x2cnt).max(x3cnt) * NVAR_SHARE;
        debug!(size, "sized boundary exchange buffers");
        Self {
            kinds,
            shearing_ix1: None,
            shearing_ox1: None,
            shearing_box: false,
            send_buf: Vec::with_capacity(size),
            recv_buf: Vec::with_capacity(size),
        }
    }

    /// Build from integer flags, rejecting unknown values.
    pub fn from_flags(flags: FaceBoundaries<i32>, g: &Grid) -> Result<Self, ConfigError> {
        let kinds = FaceBoundaries::new(
            BcKind::from_flag(BoundarySide::InnerX1, flags.ix1)?,
            BcKind::from_flag(BoundarySide::OuterX1, flags.ox1)?,
            BcKind::from_flag(BoundarySide::InnerX2, flags.ix2)?,
            BcKind::from_flag(BoundarySide::OuterX2, flags.ox2)?,
            BcKind::from_flag(BoundarySide::InnerX3, flags.ix3)?,
            BcKind::from_flag(BoundarySide::OuterX3, flags.ox3)?,
        );
        Ok(Self::new(kinds, g))
    }

    /// Replace the policy on one face with a user function.
    pub fn enroll_user(&mut self, side: BoundarySide, f: UserBcFn) {
        *self.kinds.get_mut(side) = BcKind::User(f);
    }

    /// Enroll the shearing sheet hooks, invoked after the x2 stage on
    /// the tiles where they are registered (the two outer-x1 ranks of
    /// the sheet). Also switches the x1 receive path to leave the
    /// remap-owned `B1i` face untouched.
    pub fn enroll_shearing_sheet(&mut self, ix1: UserBcFn, ox1: UserBcFn) {
        self.shearing_ix1 = Some(ix1);
        self.shearing_ox1 = Some(ox1);
        self.shearing_box = true;
    }

    /// Fill all ghost zones of `g`.
    ///
    /// Physical faces use their policies; interior faces exchange with
    /// the neighbor ranks through `tr`.
    pub fn apply<T: Transport>(&mut self, g: &mut Grid, tr: &mut T) -> Result<(), BoundaryError> {
        self.step_x1(g, tr)?;
        self.step_x2(g, tr)?;
        if self.shearing_box {
            if let Some(f) = self.shearing_ix1 {
                f(g);
            }
            if let Some(f) = self.shearing_ox1 {
                f(g);
            }
        }
        self.step_x3(g, tr)?;
        Ok(())
    }

    fn step_x1<T: Transport>(&mut self, g: &mut Grid, tr: &mut T) -> Result<(), BoundaryError> {
        if g.nx1 <= 1 {
            return Ok(());
        }
        match (g.lx1_id, g.rx1_id) {
            (Some(l), Some(r)) => {
                let tk = tr.post_recv(l, BOUNDARY_CELLS_TAG)?;
                self.send_ox1(g, tr, r)?;
                self.recv_ix1(g, tr, tk)?;
                let tk = tr.post_recv(r, BOUNDARY_CELLS_TAG)?;
                self.send_ix1(g, tr, l)?;
                self.recv_ox1(g, tr, tk)?;
            }
            (None, Some(r)) => {
                let tk = tr.post_recv(r, BOUNDARY_CELLS_TAG)?;
                self.send_ox1(g, tr, r)?;
                self.apply_physical(g, BoundarySide::InnerX1);
                self.recv_ox1(g, tr, tk)?;
            }
            (Some(l), None) => {
                let tk = tr.post_recv(l, BOUNDARY_CELLS_TAG)?;
                self.send_ix1(g, tr, l)?;
                self.apply_physical(g, BoundarySide::OuterX1);
                self.recv_ix1(g, tr, tk)?;
            }
            (None, None) => {
                self.apply_physical(g, BoundarySide::InnerX1);
                self.apply_physical(g, BoundarySide::OuterX1);
            }
        }
        Ok(())
    }

    fn step_x2<T: Transport>(&mut self, g: &mut Grid, tr: &mut T) -> Result<(), BoundaryError> {
        if g.nx2 <= 1 {
            return Ok(());
        }
        match (g.lx2_id, g.rx2_id) {
            (Some(l), Some(r)) => {
                let tk = tr.post_recv(l, BOUNDARY_CELLS_TAG)?;
                self.send_ox2(g, tr, r)?;
                self.recv_ix2(g, tr, tk)?;
                let tk = tr.post_recv(r, BOUNDARY_CELLS_TAG)?;
                self.send_ix2(g, tr, l)?;
                self.recv_ox2(g, tr, tk)?;
            }
            (None, Some(r)) => {
                let tk = tr.post_recv(r, BOUNDARY_CELLS_TAG)?;
                self.send_ox2(g, tr, r)?;
                self.apply_physical(g, BoundarySide::InnerX2);
                self.recv_ox2(g, tr, tk)?;
            }
            (Some(l), None) => {
                let tk = tr.post_recv(l, BOUNDARY_CELLS_TAG)?;
                self.send_ix2(g, tr, l)?;
                self.apply_physical(g, BoundarySide::OuterX2);
                self.recv_ix2(g, tr, tk)?;
            }
            (None, None) => {
                self.apply_physical(g, BoundarySide::InnerX2);
                self.apply_physical(g, BoundarySide::OuterX2);
            }
        }
        Ok(())
    }

    fn step_x3<T: Transport>(&mut self, g: &mut Grid, tr: &mut T) -> Result<(), BoundaryError> {
        if g.nx3 <= 1 {
            return Ok(());
        }
        match (g.lx3_id, g.rx3_id) {
            (Some(l), Some(r)) => {
                let tk = tr.post_recv(l, BOUNDARY_CELLS_TAG)?;
                self.send_ox3(g, tr, r)?;
                self.recv_ix3(g, tr, tk)?;
                let tk = tr.post_recv(r, BOUNDARY_CELLS_TAG)?;
                self.send_ix3(g, tr, l)?;
                self.recv_ox3(g, tr, tk)?;
            }
            (None, Some(r)) => {
                let tk = tr.post_recv(r, BOUNDARY_CELLS_TAG)?;
                self.send_ox3(g, tr, r)?;
                self.apply_physical(g, BoundarySide::InnerX3);
                self.recv_ox3(g, tr, tk)?;
            }
            (Some(l), None) => {
                let tk = tr.post_recv(l, BOUNDARY_CELLS_TAG)?;
                self.send_ix3(g, tr, l)?;
                self.apply_physical(g, BoundarySide::OuterX3);
                self.recv_ix3(g, tr, tk)?;
            }
            (None, None) => {
                self.apply_physical(g, BoundarySide::InnerX3);
                self.apply_physical(g, BoundarySide::OuterX3);
            }
        }
        Ok(())
    }

    fn apply_physical(&self, g: &mut Grid, side: BoundarySide) {
        use BoundarySide::*;
        let kind = *self.kinds.get(side);
        match kind {
            BcKind::ReflectZeroB | BcKind::ReflectB => {
                let preserve_bn = kind == BcKind::ReflectB;
                match side {
                    InnerX1 => reflect::ix1(g, preserve_bn),
                    OuterX1 => reflect::ox1(g, preserve_bn),
                    InnerX2 => reflect::ix2(g, preserve_bn),
                    OuterX2 => reflect::ox2(g, preserve_bn),
                    InnerX3 => reflect::ix3(g, preserve_bn),
                    OuterX3 => reflect::ox3(g, preserve_bn),
                }
            }
            BcKind::Outflow => match side {
                InnerX1 => outflow::ix1(g),
                OuterX1 => outflow::ox1(g),
                InnerX2 => outflow::ix2(g),
                OuterX2 => outflow::ox2(g),
                InnerX3 => outflow::ix3(g),
                OuterX3 => outflow::ox3(g),
            },
            BcKind::Periodic => match side {
                InnerX1 => periodic::ix1(g),
                OuterX1 => periodic::ox1(g),
                InnerX2 => periodic::ix2(g),
                OuterX2 => periodic::ox2(g),
                InnerX3 => periodic::ix3(g),
                OuterX3 => periodic::ox3(g),
            },
            BcKind::User(f) => f(g),
        }
    }
}

/// Extended tangential index ranges used by the physical-boundary fill
/// loops: a direction already processed is covered over its full
/// ghost-inclusive extent.
pub(crate) fn extended_i(g: &Grid) -> (usize, usize) {
    if g.nx1 > 1 {
        (g.is - NGHOST, g.ie + NGHOST)
    } else {
        (g.is, g.is)
    }
}

pub(crate) fn extended_j(g: &Grid) -> (usize, usize) {
    if g.nx2 > 1 {
        (g.js - NGHOST, g.je + NGHOST)
    } else {
        (g.js, g.js)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_decoding() {
        assert_eq!(
            BcKind::from_flag(BoundarySide::InnerX1, 1).unwrap(),
            BcKind::ReflectZeroB
        );
        assert_eq!(
            BcKind::from_flag(BoundarySide::InnerX1, 2).unwrap(),
            BcKind::Outflow
        );
        assert_eq!(
            BcKind::from_flag(BoundarySide::InnerX1, 4).unwrap(),
            BcKind::Periodic
        );
        assert_eq!(
            BcKind::from_flag(BoundarySide::InnerX1, 5).unwrap(),
            BcKind::ReflectB
        );
    }

    #[test]
    fn test_unknown_flag_is_fatal() {
        let err = BcKind::from_flag(BoundarySide::OuterX2, 3).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownBcFlag {
                side: BoundarySide::OuterX2,
                flag: 3
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("ox2"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_from_flags_rejects_bad_face() {
        let g = Grid::new([4, 4, 1], [0.0, 0.0, 0.0], [0.25, 0.25, 1.0]);
        let flags = FaceBoundaries::new(4, 4, 4, 9, 4, 4);
        assert!(BoundaryConditions::from_flags(flags, &g).is_err());
    }
}
