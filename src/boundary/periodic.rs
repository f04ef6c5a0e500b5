//! Periodic boundary fills for an undecomposed direction: ghost zones
//! wrap around to the opposite end of the same tile. Decomposed periodic
//! directions go through the neighbor exchange instead.

use super::{extended_i, extended_j};
use crate::grid::Grid;
use crate::NGHOST;

pub(super) fn ix1(g: &mut Grid) {
    let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
    for k in ks..=ke {
        for j in js..=je {
            for i in 1..=NGHOST {
                g.u[(k, j, is - i)] = g.u[(k, j, ie - (i - 1))];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in ks..=ke {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b1i[(k, j, is - i)] = g.b1i[(k, j, ie - (i - 1))];
                }
            }
        }
        let ju = if g.nx2 > 1 { je + 1 } else { je };
        for k in ks..=ke {
            for j in js..=ju {
                for i in 1..=NGHOST {
                    g.b2i[(k, j, is - i)] = g.b2i[(k, j, ie - (i - 1))];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b3i[(k, j, is - i)] = g.b3i[(k, j, ie - (i - 1))];
                }
            }
        }
    }
}

pub(super) fn ox1(g: &mut Grid) {
    let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
    for k in ks..=ke {
        for j in js..=je {
            for i in 1..=NGHOST {
                g.u[(k, j, ie + i)] = g.u[(k, j, is + (i - 1))];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        // ie+1 is an active face, not a boundary value for B1i.
        for k in ks..=ke {
            for j in js..=je {
                for i in 2..=NGHOST {
                    g.b1i[(k, j, ie + i)] = g.b1i[(k, j, is + (i - 1))];
                }
            }
        }
        let ju = if g.nx2 > 1 { je + 1 } else { je };
        for k in ks..=ke {
            for j in js..=ju {
                for i in 1..=NGHOST {
                    g.b2i[(k, j, ie + i)] = g.b2i[(k, j, is + (i - 1))];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b3i[(k, j, ie + i)] = g.b3i[(k, j, is + (i - 1))];
                }
            }
        }
    }
}

pub(super) fn ix2(g: &mut Grid) {
    let (js, je, ks, ke) = (g.js, g.je, g.ks, g.ke);
    let (il, iu) = extended_i(g);
    for k in ks..=ke {
        for j in 1..=NGHOST {
            for i in il..=iu {
                g.u[(k, js - j, i)] = g.u[(k, je - (j - 1), i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in ks..=ke {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b1i[(k, js - j, i)] = g.b1i[(k, je - (j - 1), i)];
                    g.b2i[(k, js - j, i)] = g.b2i[(k, je - (j - 1), i)];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b3i[(k, js - j, i)] = g.b3i[(k, je - (j - 1), i)];
                }
            }
        }
    }
}

pub(super) fn ox2(g: &mut Grid) {
    let (js, je, ks, ke) = (g.js, g.je, g.ks, g.ke);
    let (il, iu) = extended_i(g);
    for k in ks..=ke {
        for j in 1..=NGHOST {
            for i in il..=iu {
                g.u[(k, je + j, i)] = g.u[(k, js + (j - 1), i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in ks..=ke {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b1i[(k, je + j, i)] = g.b1i[(k, js + (j - 1), i)];
                }
            }
        }
        // je+1 is an active face, not a boundary value for B2i.
        for k in ks..=ke {
            for j in 2..=NGHOST {
                for i in il..=iu {
                    g.b2i[(k, je + j, i)] = g.b2i[(k, js + (j - 1), i)];
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b3i[(k, je + j, i)] = g.b3i[(k, js + (j - 1), i)];
                }
            }
        }
    }
}

pub(super) fn ix3(g: &mut Grid) {
    let (ks, ke) = (g.ks, g.ke);
    let (il, iu) = extended_i(g);
    let (jl, ju) = extended_j(g);
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.u[(ks - k, j, i)] = g.u[(ke - (k - 1), j, i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.b1i[(ks - k, j, i)] = g.b1i[(ke - (k - 1), j, i)];
                g.b2i[(ks - k, j, i)] = g.b2i[(ke - (k - 1), j, i)];
                g.b3i[(ks - k, j, i)] = g.b3i[(ke - (k - 1), j, i)];
            }
        }
    }
}

pub(super) fn ox3(g: &mut Grid) {
    let (ks, ke) = (g.ks, g.ke);
    let (il, iu) = extended_i(g);
    let (jl, ju) = extended_j(g);
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.u[(ke + k, j, i)] = g.u[(ks + (k - 1), j, i)];
            }
        }
    }
    #[cfg(feature = "mhd")]
    {
        for k in 1..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b1i[(ke + k, j, i)] = g.b1i[(ks + (k - 1), j, i)];
                    g.b2i[(ke + k, j, i)] = g.b2i[(ks + (k - 1), j, i)];
                }
            }
        }
        // ke+1 is an active face, not a boundary value for B3i.
        for k in 2..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b3i[(ke + k, j, i)] = g.b3i[(ks + (k - 1), j, i)];
                }
            }
        }
    }
}
