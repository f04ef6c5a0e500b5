//! Reflecting boundary fills.
//!
//! The fluid state is mirrored with the normal momentum flipped. The
//! interface fields come in two flavors selected by `preserve_bn`: with
//! a zeroed normal field the normal component is antisymmetric about the
//! boundary face (and pinned to zero on it) while the tangential
//! components mirror symmetrically; preserving the normal field flips
//! the symmetry of every component.

use crate::grid::Grid;
use crate::NGHOST;

use super::{extended_i, extended_j};

#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
pub(super) fn ix1(g: &mut Grid, preserve_bn: bool) {
    let (is, js, je, ks, ke) = (g.is, g.js, g.je, g.ks, g.ke);
    for k in ks..=ke {
        for j in js..=je {
            for i in 1..=NGHOST {
                g.u[(k, j, is - i)] = g.u[(k, j, is + (i - 1))];
                g.u[(k, j, is - i)].m1 = -g.u[(k, j, is - i)].m1;
            }
        }
    }

    #[cfg(feature = "mhd")]
    {
        let qa = if preserve_bn { 1.0 } else { -1.0 };
        for k in ks..=ke {
            for j in js..=je {
                if !preserve_bn {
                    g.b1i[(k, j, is)] = 0.0;
                }
                for i in 1..=NGHOST {
                    g.b1i[(k, j, is - i)] = qa * g.b1i[(k, j, is + i)];
                    g.u[(k, j, is - i)].b1c = qa * g.u[(k, j, is + (i - 1))].b1c;
                }
            }
        }
        let ju = if g.nx2 > 1 { je + 1 } else { je };
        for k in ks..=ke {
            for j in js..=ju {
                for i in 1..=NGHOST {
                    g.b2i[(k, j, is - i)] = -qa * g.b2i[(k, j, is + (i - 1))];
                    g.u[(k, j, is - i)].b2c = -qa * g.u[(k, j, is + (i - 1))].b2c;
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b3i[(k, j, is - i)] = -qa * g.b3i[(k, j, is + (i - 1))];
                    g.u[(k, j, is - i)].b3c = -qa * g.u[(k, j, is + (i - 1))].b3c;
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
pub(super) fn ox1(g: &mut Grid, preserve_bn: bool) {
    let (ie, js, je, ks, ke) = (g.ie, g.js, g.je, g.ks, g.ke);
    for k in ks..=ke {
        for j in js..=je {
            for i in 1..=NGHOST {
                g.u[(k, j, ie + i)] = g.u[(k, j, ie - (i - 1))];
                g.u[(k, j, ie + i)].m1 = -g.u[(k, j, ie + i)].m1;
            }
        }
    }

    #[cfg(feature = "mhd")]
    {
        let qa = if preserve_bn { 1.0 } else { -1.0 };
        // The face at ie+1 sits on the boundary itself; only the
        // zero-normal flavor overwrites it.
        for k in ks..=ke {
            for j in js..=je {
                if !preserve_bn {
                    g.b1i[(k, j, ie + 1)] = 0.0;
                }
                g.u[(k, j, ie + 1)].b1c = qa * g.u[(k, j, ie)].b1c;
                for i in 2..=NGHOST {
                    g.b1i[(k, j, ie + i)] = qa * g.b1i[(k, j, ie - (i - 2))];
                    g.u[(k, j, ie + i)].b1c = qa * g.u[(k, j, ie - (i - 1))].b1c;
                }
            }
        }
        let ju = if g.nx2 > 1 { je + 1 } else { je };
        for k in ks..=ke {
            for j in js..=ju {
                for i in 1..=NGHOST {
                    g.b2i[(k, j, ie + i)] = -qa * g.b2i[(k, j, ie - (i - 1))];
                    g.u[(k, j, ie + i)].b2c = -qa * g.u[(k, j, ie - (i - 1))].b2c;
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in js..=je {
                for i in 1..=NGHOST {
                    g.b3i[(k, j, ie + i)] = -qa * g.b3i[(k, j, ie - (i - 1))];
                    g.u[(k, j, ie + i)].b3c = -qa * g.u[(k, j, ie - (i - 1))].b3c;
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
pub(super) fn ix2(g: &mut Grid, preserve_bn: bool) {
    let (js, ks, ke) = (g.js, g.ks, g.ke);
    let (il, iu) = extended_i(g);
    for k in ks..=ke {
        for j in 1..=NGHOST {
            for i in il..=iu {
                g.u[(k, js - j, i)] = g.u[(k, js + (j - 1), i)];
                g.u[(k, js - j, i)].m2 = -g.u[(k, js - j, i)].m2;
            }
        }
    }

    #[cfg(feature = "mhd")]
    {
        let qa = if preserve_bn { 1.0 } else { -1.0 };
        for k in ks..=ke {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b1i[(k, js - j, i)] = -qa * g.b1i[(k, js + (j - 1), i)];
                    g.u[(k, js - j, i)].b1c = -qa * g.u[(k, js + (j - 1), i)].b1c;
                }
            }
        }
        for k in ks..=ke {
            if !preserve_bn {
                for i in il..=iu {
                    g.b2i[(k, js, i)] = 0.0;
                }
            }
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b2i[(k, js - j, i)] = qa * g.b2i[(k, js + j, i)];
                    g.u[(k, js - j, i)].b2c = qa * g.u[(k, js + (j - 1), i)].b2c;
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b3i[(k, js - j, i)] = -qa * g.b3i[(k, js + (j - 1), i)];
                    g.u[(k, js - j, i)].b3c = -qa * g.u[(k, js + (j - 1), i)].b3c;
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
pub(super) fn ox2(g: &mut Grid, preserve_bn: bool) {
    let (je, ks, ke) = (g.je, g.ks, g.ke);
    let (il, iu) = extended_i(g);
    for k in ks..=ke {
        for j in 1..=NGHOST {
            for i in il..=iu {
                g.u[(k, je + j, i)] = g.u[(k, je - (j - 1), i)];
                g.u[(k, je + j, i)].m2 = -g.u[(k, je + j, i)].m2;
            }
        }
    }

    #[cfg(feature = "mhd")]
    {
        let qa = if preserve_bn { 1.0 } else { -1.0 };
        for k in ks..=ke {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b1i[(k, je + j, i)] = -qa * g.b1i[(k, je - (j - 1), i)];
                    g.u[(k, je + j, i)].b1c = -qa * g.u[(k, je - (j - 1), i)].b1c;
                }
            }
        }
        for k in ks..=ke {
            for i in il..=iu {
                if !preserve_bn {
                    g.b2i[(k, je + 1, i)] = 0.0;
                }
                g.u[(k, je + 1, i)].b2c = qa * g.u[(k, je, i)].b2c;
            }
            for j in 2..=NGHOST {
                for i in il..=iu {
                    g.b2i[(k, je + j, i)] = qa * g.b2i[(k, je - (j - 2), i)];
                    g.u[(k, je + j, i)].b2c = qa * g.u[(k, je - (j - 1), i)].b2c;
                }
            }
        }
        let ku = if g.nx3 > 1 { ke + 1 } else { ke };
        for k in ks..=ku {
            for j in 1..=NGHOST {
                for i in il..=iu {
                    g.b3i[(k, je + j, i)] = -qa * g.b3i[(k, je - (j - 1), i)];
                    g.u[(k, je + j, i)].b3c = -qa * g.u[(k, je - (j - 1), i)].b3c;
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
pub(super) fn ix3(g: &mut Grid, preserve_bn: bool) {
    let ks = g.ks;
    let (il, iu) = extended_i(g);
    let (jl, ju) = extended_j(g);
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.u[(ks - k, j, i)] = g.u[(ks + (k - 1), j, i)];
                g.u[(ks - k, j, i)].m3 = -g.u[(ks - k, j, i)].m3;
            }
        }
    }

    #[cfg(feature = "mhd")]
    {
        let qa = if preserve_bn { 1.0 } else { -1.0 };
        for k in 1..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b1i[(ks - k, j, i)] = -qa * g.b1i[(ks + (k - 1), j, i)];
                    g.u[(ks - k, j, i)].b1c = -qa * g.u[(ks + (k - 1), j, i)].b1c;
                    g.b2i[(ks - k, j, i)] = -qa * g.b2i[(ks + (k - 1), j, i)];
                    g.u[(ks - k, j, i)].b2c = -qa * g.u[(ks + (k - 1), j, i)].b2c;
                }
            }
        }
        if !preserve_bn {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b3i[(ks, j, i)] = 0.0;
                }
            }
        }
        for k in 1..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b3i[(ks - k, j, i)] = qa * g.b3i[(ks + k, j, i)];
                    g.u[(ks - k, j, i)].b3c = qa * g.u[(ks + (k - 1), j, i)].b3c;
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "mhd"), allow(unused_variables))]
pub(super) fn ox3(g: &mut Grid, preserve_bn: bool) {
    let ke = g.ke;
    let (il, iu) = extended_i(g);
    let (jl, ju) = extended_j(g);
    for k in 1..=NGHOST {
        for j in jl..=ju {
            for i in il..=iu {
                g.u[(ke + k, j, i)] = g.u[(ke - (k - 1), j, i)];
                g.u[(ke + k, j, i)].m3 = -g.u[(ke + k, j, i)].m3;
            }
        }
    }

    #[cfg(feature = "mhd")]
    {
        let qa = if preserve_bn { 1.0 } else { -1.0 };
        for k in 1..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b1i[(ke + k, j, i)] = -qa * g.b1i[(ke - (k - 1), j, i)];
                    g.u[(ke + k, j, i)].b1c = -qa * g.u[(ke - (k - 1), j, i)].b1c;
                    g.b2i[(ke + k, j, i)] = -qa * g.b2i[(ke - (k - 1), j, i)];
                    g.u[(ke + k, j, i)].b2c = -qa * g.u[(ke - (k - 1), j, i)].b2c;
                }
            }
        }
        for j in jl..=ju {
            for i in il..=iu {
                if !preserve_bn {
                    g.b3i[(ke + 1, j, i)] = 0.0;
                }
                g.u[(ke + 1, j, i)].b3c = qa * g.u[(ke, j, i)].b3c;
            }
        }
        for k in 2..=NGHOST {
            for j in jl..=ju {
                for i in il..=iu {
                    g.b3i[(ke + k, j, i)] = qa * g.b3i[(ke - (k - 2), j, i)];
                    g.u[(ke + k, j, i)].b3c = qa * g.u[(ke - (k - 1), j, i)].b3c;
                }
            }
        }
    }
}
