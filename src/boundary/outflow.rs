//! Outflow boundary fills: the last active cell is copied into every
//! ghost cell, field components as-is. The outer-face normal interface
//! field is already on the inner edge of the ghost region, so its copy
//! starts one face further out.

use super::{extended_i, extended_j};
use crate::grid::Grid;
use crate::NGHOST;

pub(super) fn ix1(g: &mut Grid) {
    let (is, js, je, ks, ke) = (g.is, g.js, g.je, g.ks, g.ke);
    for k in ks..=ke {
        for j in js..=je {
            for i in 1..=NGHOST {
                g.u[(k, j, is - i)] = g.u[(k, j, is)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in ks..=ke {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b1i[(k, j, is - i)] = g.b1i[(k, j, is)];
                }
            }
        }
        let ju = if g.nx2 > 1 { je + 1 } else { je };
        for k in ks..=ke {
            for j in js..=ju {
                for i in 1..=NGHOST {
                    g.b2i[(k, j, is - i)] = g.b2i[(k, j, is)];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b3i[(k, j, is - i)] = g.b3i[(k, j, is)];
                }
            }
        }
    }
}

pub(super) fn ox1(g: &mut Grid) {
    let (ie, js, je, ks, ke) = (g.ie, g.js, g.je, g.ks, g.ke);
    for k in ks..=ke {
        for j in js..=je {
            for i in 1..=NGHOST {
                g.u[(k, j, ie + i)] = g.u[(k, j, ie)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        // ie+1 is an active face, not a boundary value for B1i.
        for k in ks..=ke {
            for j in js..=je {
                for i in 2..=NGHOST {
                    g.b1i[(k, j, ie + i)] = g.b1i[(k, j, ie)];
                }
            }
        }
        let ju = if g.nx2 > 1 { je + 1 } else { je };
        for k in ks..=ke {
            for j in js..=ju {
                for i in 1..=NGHOST {
                    g.b2i[(k, j, ie + i)] = g.b2i[(k, j, ie)];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b3i[(k, j, ie + i)] = g.b3i[(k, j, ie)];
                }
            }
        }
    }
}

pub(super) fn ix2(g: &mut Grid) {
    let (js, ks, ke) = (g.js, g.ks, g.ke);
    let (il, iu) = extended_i(g);
    for k in ks..=ke {
        for j in 1..=NGHOST {
            for i in il..=iu {
                g.u[(k, js - j, i)] = g.u[(k, js, i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in ks..=ke {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b1i[(k, js - j, i)] = g.b1i[(k, js, i)];
                    g.b2i[(k, js - j, i)] = g.b2i[(k, js, i)];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b3i[(k, js - j, i)] = g.b3i[(k, js, i)];
                }
            }
        }
    }
}

pub(super) fn ox2(g: &mut Grid) {
    let (je, ks, ke) = (g.je, g.ks, g.ke);
    let (il, iu) = extended_i(g);
    for k in ks..=ke {
        for j in 1..=NGHOST {
            for i in il..=iu {
                g.u[(k, je + j, i)] = g.u[(k, je, i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in ks..=ke {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b1i[(k, je + j, i)] = g.b1i[(k, je, i)];
                }
            }
        }
        // je+1 is an active face, not a boundary value for B2i.
        for k in ks..=ke {
            for j in 2..=NGHOST {
                for i in il..=iu {
                    g.b2i[(k, je + j, i)] = g.b2i[(k, je, i)];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b3i[(k, je + j, i)] = g.b3i[(k, je, i)];
                }
            }
        }
    }
}

pub(super) fn ix3(g: &mut Grid) {
    let ks = g.ks;
    let (il, iu) = extended_i(g);
    let (jl, ju) = extended_j(g);
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.u[(ks - k, j, i)] = g.u[(ks, j, i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.b1i[(ks - k, j, i)] = g.b1i[(ks, j, i)];
                g.b2i[(ks - k, j, i)] = g.b2i[(ks, j, i)];
                g.b3i[(ks - k, j, i)] = g.b3i[(ks, j, i)];
            }
        }
    }
}

pub(super) fn ox3(g: &mut Grid) {
    let ke = g.ke;
    let (il, iu) = extended_i(g);
    let (jl, ju) = extended_j(g);
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.u[(ke + k, j, i)] = g.u[(ke, j, i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in 1..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b1i[(ke + k, j, i)] = g.b1i[(ke, j, i)];
                    g.b2i[(ke + k, j, i)] = g.b2i[(ke, j, i)];
                }
            }
        }
        // ke+1 is an active face, not a boundary value for B3i.
        for k in 2..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b3i[(ke + k, j, i)] = g.b3i[(ke, j, i)];
                }
            }
        }
    }
}
