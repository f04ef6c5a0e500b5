//! Neighbor exchange: the message-passing seam and ghost-cell
//! packing/unpacking.
//!
//! Every face exchange follows one protocol: post a non-blocking receive
//! against the neighbor rank, pack the outgoing edge cells into a
//! contiguous buffer in a fixed component order, send, wait for the
//! pending receive, unpack into the ghost region in the same order. The
//! component order per cell is `d, M1, M2, M3`, then (MHD)
//! `B1c, B2c, B3c, B1i, B2i, B3i`, then (non-isothermal) `E`, then the
//! passive scalars. No padding, no checksums.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use thiserror::Error;

use crate::grid::Grid;
use crate::Real;

use super::BoundaryConditions;

/// The single well-known tag used for all boundary-cell messages.
pub const BOUNDARY_CELLS_TAG: u32 = 5;

/// Tags reserved for the step-size reduction collective.
const DT_REDUCE_TAG: u32 = 11;
const DT_BCAST_TAG: u32 = 12;

/// How long a rank waits on a matched receive before declaring the run
/// dead.
const RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// A message-passing failure. Unrecoverable; the caller is expected to
/// log it with the rank and abort.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("rank {rank}: send to rank {peer} failed in {site}")]
    SendFailed {
        rank: usize,
        peer: usize,
        site: &'static str,
    },
    #[error("rank {rank}: receive from rank {peer} timed out in {site}")]
    RecvTimeout {
        rank: usize,
        peer: usize,
        site: &'static str,
    },
    #[error("rank {rank}: peer rank {peer} disconnected in {site}")]
    Disconnected {
        rank: usize,
        peer: usize,
        site: &'static str,
    },
    #[error("rank {rank}: no peer exists for this operation in {site}")]
    NoPeer { rank: usize, site: &'static str },
}

/// Handle for a posted receive, completed by [`Transport::wait`].
#[derive(Debug, Clone, Copy)]
pub struct RecvToken {
    pub source: usize,
    pub tag: u32,
}

/// The message layer consumed by the boundary exchange.
///
/// Sends are blocking from the caller's point of view; receives are
/// posted first and completed with [`Transport::wait`], mirroring the
/// post-receive / send / wait interleave the exchange protocol needs.
pub trait Transport {
    /// This process's rank.
    fn rank(&self) -> usize;

    /// Total number of ranks.
    fn size(&self) -> usize;

    /// Post a receive for a message from `source` with `tag`.
    fn post_recv(&mut self, source: usize, tag: u32) -> Result<RecvToken, ExchangeError>;

    /// Send `data` to `dest` with `tag`.
    fn send(&mut self, dest: usize, tag: u32, data: &[Real]) -> Result<(), ExchangeError>;

    /// Complete a posted receive, filling `buf` with the payload.
    fn wait(&mut self, token: RecvToken, buf: &mut Vec<Real>) -> Result<(), ExchangeError>;

    /// Reduce the minimum of `value` across all ranks (used for the
    /// global time step). Collective: every rank must call it.
    fn allreduce_min(&mut self, value: Real) -> Result<Real, ExchangeError>;
}

/// Transport for a single-process run: no peers, reductions are the
/// identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn post_recv(&mut self, _source: usize, _tag: u32) -> Result<RecvToken, ExchangeError> {
        Err(ExchangeError::NoPeer {
            rank: 0,
            site: "post_recv",
        })
    }

    fn send(&mut self, _dest: usize, _tag: u32, _data: &[Real]) -> Result<(), ExchangeError> {
        Err(ExchangeError::NoPeer {
            rank: 0,
            site: "send",
        })
    }

    fn wait(&mut self, _token: RecvToken, _buf: &mut Vec<Real>) -> Result<(), ExchangeError> {
        Err(ExchangeError::NoPeer {
            rank: 0,
            site: "wait",
        })
    }

    fn allreduce_min(&mut self, value: Real) -> Result<Real, ExchangeError> {
        Ok(value)
    }
}

struct Packet {
    src: usize,
    tag: u32,
    data: Vec<Real>,
}

/// In-process cluster of ranks connected by channels, one thread per
/// rank. Messages are buffered, so the blocking-send / posted-receive
/// protocol cannot deadlock.
pub struct LocalCluster;

impl LocalCluster {
    /// Create `n` connected transports; hand one to each rank's thread.
    pub fn ranks(n: usize) -> Vec<LocalTransport> {
        let mut senders: Vec<Sender<Packet>> = Vec::with_capacity(n);
        let mut receivers: Vec<Receiver<Packet>> = Vec::with_capacity(n);
        for _ in 0..n {
            let (tx, rx) = channel();
            senders.push(tx);
            receivers.push(rx);
        }
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalTransport {
                rank,
                peers: senders.clone(),
                inbox,
                stash: VecDeque::new(),
            })
            .collect()
    }
}

/// One rank's endpoint in a [`LocalCluster`].
pub struct LocalTransport {
    rank: usize,
    peers: Vec<Sender<Packet>>,
    inbox: Receiver<Packet>,
    stash: VecDeque<Packet>,
}

impl LocalTransport {
    fn wait_matching(
        &mut self,
        source: usize,
        tag: u32,
        site: &'static str,
    ) -> Result<Vec<Real>, ExchangeError> {
        if let Some(pos) = self
            .stash
            .iter()
            .position(|p| p.src == source && p.tag == tag)
        {
            return Ok(self.stash.remove(pos).expect("position valid").data);
        }
        loop {
            match self.inbox.recv_timeout(RECV_TIMEOUT) {
                Ok(p) if p.src == source && p.tag == tag => return Ok(p.data),
                Ok(p) => self.stash.push_back(p),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ExchangeError::RecvTimeout {
                        rank: self.rank,
                        peer: source,
                        site,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ExchangeError::Disconnected {
                        rank: self.rank,
                        peer: source,
                        site,
                    })
                }
            }
        }
    }
}

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn post_recv(&mut self, source: usize, tag: u32) -> Result<RecvToken, ExchangeError> {
        // Matching happens at wait; messages are buffered by the channel
        // in the meantime, which is what a preposted receive guarantees.
        Ok(RecvToken { source, tag })
    }

    fn send(&mut self, dest: usize, tag: u32, data: &[Real]) -> Result<(), ExchangeError> {
        let packet = Packet {
            src: self.rank,
            tag,
            data: data.to_vec(),
        };
        self.peers[dest]
            .send(packet)
            .map_err(|_| ExchangeError::SendFailed {
                rank: self.rank,
                peer: dest,
                site: "send",
            })
    }

    fn wait(&mut self, token: RecvToken, buf: &mut Vec<Real>) -> Result<(), ExchangeError> {
        let data = self.wait_matching(token.source, token.tag, "wait")?;
        buf.clear();
        buf.extend_from_slice(&data);
        Ok(())
    }

    fn allreduce_min(&mut self, value: Real) -> Result<Real, ExchangeError> {
        let n = self.size();
        if n == 1 {
            return Ok(value);
        }
        if self.rank == 0 {
            let mut m = value;
            for src in 1..n {
                let data = self.wait_matching(src, DT_REDUCE_TAG, "allreduce_min")?;
                m = m.min(data[0]);
            }
            for dst in 1..n {
                self.send(dst, DT_BCAST_TAG, &[m])?;
            }
            Ok(m)
        } else {
            self.send(0, DT_REDUCE_TAG, &[value])?;
            let data = self.wait_matching(0, DT_BCAST_TAG, "allreduce_min")?;
            Ok(data[0])
        }
    }
}

// ---------------------------------------------------------------------
// Pack / unpack
// ---------------------------------------------------------------------

#[inline]
fn pack_cell(buf: &mut Vec<Real>, g: &Grid, k: usize, j: usize, i: usize) {
    let q = g.u[(k, j, i)];
    buf.push(q.d);
    buf.push(q.m1);
    buf.push(q.m2);
    buf.push(q.m3);
    #[cfg(feature = "mhd")]
    {
        buf.push(q.b1c);
        buf.push(q.b2c);
        buf.push(q.b3c);
        buf.push(g.b1i[(k, j, i)]);
        buf.push(g.b2i[(k, j, i)]);
        buf.push(g.b3i[(k, j, i)]);
    }
    #[cfg(not(feature = "isothermal"))]
    buf.push(q.e);
    for n in 0..crate::NSCALARS {
        buf.push(q.s[n]);
    }
}

#[inline]
#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
fn unpack_cell(
    it: &mut std::slice::Iter<'_, Real>,
    g: &mut Grid,
    k: usize,
    j: usize,
    i: usize,
    skip_b1i: bool,
) {
    let mut next = || *it.next().expect("receive buffer underrun");
    let d = next();
    let m1 = next();
    let m2 = next();
    let m3 = next();
    #[cfg(feature = "mhd")]
    {
        let b1c = next();
        let b2c = next();
        let b3c = next();
        let b1i = next();
        let b2i = next();
        let b3i = next();
        let cell = &mut g.u[(k, j, i)];
        cell.b1c = b1c;
        cell.b2c = b2c;
        cell.b3c = b3c;
        if !skip_b1i {
            g.b1i[(k, j, i)] = b1i;
        }
        g.b2i[(k, j, i)] = b2i;
        g.b3i[(k, j, i)] = b3i;
    }
    let cell = &mut g.u[(k, j, i)];
    cell.d = d;
    cell.m1 = m1;
    cell.m2 = m2;
    cell.m3 = m3;
    #[cfg(not(feature = "isothermal"))]
    {
        cell.e = next();
    }
    for n in 0..crate::NSCALARS {
        cell.s[n] = next();
    }
}

/// Tangential ranges covered by an exchange in direction `dir`.
///
/// An earlier-processed direction is covered over its extended
/// (ghost-inclusive) range so that edge and corner ghosts arrive filled;
/// a later direction includes one extra face row for the interface
/// fields.
fn tangential_ranges(g: &Grid, dir: usize) -> ((usize, usize), (usize, usize), (usize, usize)) {
    let i_ext = if g.nx1 > 1 {
        (g.is - crate::NGHOST, g.ie + crate::NGHOST)
    } else {
        (g.is, g.is)
    };
    let j_face = if g.nx2 > 1 { (g.js, g.je + 1) } else { (g.js, g.js) };
    let j_ext = if g.nx2 > 1 {
        (g.js - crate::NGHOST, g.je + crate::NGHOST)
    } else {
        (g.js, g.js)
    };
    let k_face = if g.nx3 > 1 { (g.ks, g.ke + 1) } else { (g.ks, g.ks) };
    match dir {
        1 => ((0, 0), j_face, k_face),
        2 => (i_ext, (0, 0), k_face),
        3 => (i_ext, j_ext, (0, 0)),
        _ => unreachable!("direction index"),
    }
}

impl BoundaryConditions {
    fn pack_and_send<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
        (kl, ku): (usize, usize),
        (jl, ju): (usize, usize),
        (il, iu): (usize, usize),
    ) -> Result<(), ExchangeError> {
        self.send_buf.clear();
        for k in kl..=ku {
            for j in jl..=ju {
                for i in il..=iu {
                    pack_cell(&mut self.send_buf, g, k, j, i);
                }
            }
        }
        let data = std::mem::take(&mut self.send_buf);
        let out = tr.send(dest, BOUNDARY_CELLS_TAG, &data);
        self.send_buf = data;
        out
    }

    fn wait_and_unpack<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
        (kl, ku): (usize, usize),
        (jl, ju): (usize, usize),
        (il, iu): (usize, usize),
        skip_b1i_col: Option<usize>,
    ) -> Result<(), ExchangeError> {
        let mut buf = std::mem::take(&mut self.recv_buf);
        tr.wait(token, &mut buf)?;
        {
            let mut it = buf.iter();
            for k in kl..=ku {
                for j in jl..=ju {
                    for i in il..=iu {
                        let skip = skip_b1i_col == Some(i);
                        unpack_cell(&mut it, g, k, j, i, skip);
                    }
                }
            }
        }
        self.recv_buf = buf;
        Ok(())
    }

    pub(super) fn send_ix1<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
    ) -> Result<(), ExchangeError> {
        let (_, jr, kr) = tangential_ranges(g, 1);
        self.pack_and_send(g, tr, dest, kr, jr, (g.is, g.is + crate::NGHOST - 1))
    }

    pub(super) fn send_ox1<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
    ) -> Result<(), ExchangeError> {
        let (_, jr, kr) = tangential_ranges(g, 1);
        self.pack_and_send(g, tr, dest, kr, jr, (g.ie - crate::NGHOST + 1, g.ie))
    }

    pub(super) fn recv_ix1<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
    ) -> Result<(), ExchangeError> {
        let (_, jr, kr) = tangential_ranges(g, 1);
        self.wait_and_unpack(g, tr, token, kr, jr, (g.is - crate::NGHOST, g.is - 1), None)
    }

    pub(super) fn recv_ox1<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
    ) -> Result<(), ExchangeError> {
        let (_, jr, kr) = tangential_ranges(g, 1);
        // Under shearing-box boundaries the remap owns the B1i face at
        // ie+1; the received value for that one column is discarded.
        let skip = if self.shearing_box { Some(g.ie + 1) } else { None };
        self.wait_and_unpack(g, tr, token, kr, jr, (g.ie + 1, g.ie + crate::NGHOST), skip)
    }

    pub(super) fn send_ix2<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
    ) -> Result<(), ExchangeError> {
        let (ir, _, kr) = tangential_ranges(g, 2);
        self.pack_and_send(g, tr, dest, kr, (g.js, g.js + crate::NGHOST - 1), ir)
    }

    pub(super) fn send_ox2<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
    ) -> Result<(), ExchangeError> {
        let (ir, _, kr) = tangential_ranges(g, 2);
        self.pack_and_send(g, tr, dest, kr, (g.je - crate::NGHOST + 1, g.je), ir)
    }

    pub(super) fn recv_ix2<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
    ) -> Result<(), ExchangeError> {
        let (ir, _, kr) = tangential_ranges(g, 2);
        self.wait_and_unpack(g, tr, token, kr, (g.js - crate::NGHOST, g.js - 1), ir, None)
    }

    pub(super) fn recv_ox2<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
    ) -> Result<(), ExchangeError> {
        let (ir, _, kr) = tangential_ranges(g, 2);
        self.wait_and_unpack(g, tr, token, kr, (g.je + 1, g.je + crate::NGHOST), ir, None)
    }

    pub(super) fn send_ix3<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
    ) -> Result<(), ExchangeError> {
        let (ir, jr, _) = tangential_ranges(g, 3);
        self.pack_and_send(g, tr, dest, (g.ks, g.ks + crate::NGHOST - 1), jr, ir)
    }

    pub(super) fn send_ox3<T: Transport>(
        &mut self,
        g: &Grid,
        tr: &mut T,
        dest: usize,
    ) -> Result<(), ExchangeError> {
        let (ir, jr, _) = tangential_ranges(g, 3);
        self.pack_and_send(g, tr, dest, (g.ke - crate::NGHOST + 1, g.ke), jr, ir)
    }

    pub(super) fn recv_ix3<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
    ) -> Result<(), ExchangeError> {
        let (ir, jr, _) = tangential_ranges(g, 3);
        self.wait_and_unpack(g, tr, token, (g.ks - crate::NGHOST, g.ks - 1), jr, ir, None)
    }

    pub(super) fn recv_ox3<T: Transport>(
        &mut self,
        g: &mut Grid,
        tr: &mut T,
        token: RecvToken,
    ) -> Result<(), ExchangeError> {
        let (ir, jr, _) = tangential_ranges(g, 3);
        self.wait_and_unpack(g, tr, token, (g.ke + 1, g.ke + crate::NGHOST), jr, ir, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_transport_matches_source_and_tag() {
        let mut ranks = LocalCluster::ranks(2);
        let mut r1 = ranks.pop().unwrap();
        let mut r0 = ranks.pop().unwrap();

        // Rank 1 sends two messages with different tags; rank 0 waits
        // for the second tag first.
        r1.send(0, 7, &[1.0, 2.0]).unwrap();
        r1.send(0, 8, &[3.0]).unwrap();
        let tk = r0.post_recv(1, 8).unwrap();
        let mut buf = Vec::new();
        r0.wait(tk, &mut buf).unwrap();
        assert_eq!(buf, vec![3.0]);
        let tk = r0.post_recv(1, 7).unwrap();
        r0.wait(tk, &mut buf).unwrap();
        assert_eq!(buf, vec![1.0, 2.0]);
    }

    #[test]
    fn test_allreduce_min_two_ranks() {
        let mut ranks = LocalCluster::ranks(2);
        let mut r1 = ranks.pop().unwrap();
        let mut r0 = ranks.pop().unwrap();
        let h = std::thread::spawn(move || r1.allreduce_min(0.25).unwrap());
        let m0 = r0.allreduce_min(0.5).unwrap();
        let m1 = h.join().unwrap();
        assert_eq!(m0, 0.25);
        assert_eq!(m1, 0.25);
    }

    #[test]
    fn test_serial_transport_identity_reduce() {
        let mut t = SerialTransport;
        assert_eq!(t.allreduce_min(3.5).unwrap(), 3.5);
        assert!(t.send(0, 0, &[1.0]).is_err());
    }

    #[test]
    fn test_pack_cell_component_order() {
        let mut g = crate::Grid::new([4, 4, 1], [0.0, 0.0, 0.0], [0.25, 0.25, 1.0]);
        let (k, j, i) = (0, g.js, g.is);
        {
            let c = &mut g.u[(k, j, i)];
            c.d = 1.0;
            c.m1 = 2.0;
            c.m2 = 3.0;
            c.m3 = 4.0;
        }
        let mut buf = Vec::new();
        pack_cell(&mut buf, &g, k, j, i);
        assert_eq!(buf.len(), crate::NVAR_SHARE);
        assert_eq!(&buf[..4], &[1.0, 2.0, 3.0, 4.0]);
        // Round-trip through unpack restores the cell.
        let mut g2 = g.clone();
        g2.u[(k, j, i)] = Default::default();
        let mut it = buf.iter();
        unpack_cell(&mut it, &mut g2, k, j, i, false);
        assert_eq!(g2.u[(k, j, i)], g.u[(k, j, i)]);
    }
}
