//! Joins way segments into closed rings. Ways are chained end to end,
//! reversing where needed, until no further join is possible.

use crate::area::area::Ring;
use crate::elements::{coordinate_as_float, LonLat, NodeRef, Way};

/// One member way, possibly traversed backwards, while rings are being
/// joined.
#[derive(Debug)]
pub struct RingPart {
    pub orig_id: i64,
    pub is_reversed: bool,
    pub refs: Vec<NodeRef>,
}

impl RingPart {
    pub fn new(way: &Way) -> RingPart {
        RingPart {
            orig_id: way.id,
            is_reversed: false,
            refs: way.refs.clone(),
        }
    }

    fn first(&self) -> i64 {
        if self.is_reversed {
            self.refs[self.refs.len() - 1].id
        } else {
            self.refs[0].id
        }
    }

    fn last(&self) -> i64 {
        if self.is_reversed {
            self.refs[0].id
        } else {
            self.refs[self.refs.len() - 1].id
        }
    }
}

/// A chain of ring parts; closed once the ends meet.
#[derive(Debug)]
pub struct PartialRing {
    pub parts: Vec<RingPart>,
}

impl PartialRing {
    fn new(part: RingPart) -> PartialRing {
        PartialRing { parts: vec![part] }
    }

    pub fn first_last(&self) -> (i64, i64) {
        (
            self.parts[0].first(),
            self.parts[self.parts.len() - 1].last(),
        )
    }

    pub fn is_ring(&self) -> bool {
        let (f, t) = self.first_last();
        f == t
    }

    pub fn reverse(&mut self) {
        self.parts.reverse();
        for p in self.parts.iter_mut() {
            p.is_reversed = !p.is_reversed;
        }
    }

    /// Concatenate the parts into a ring, dropping the duplicated join
    /// vertices and the closing vertex. None if the chain doesn't
    /// actually close.
    pub fn into_ring(self) -> Option<Ring> {
        let mut refs: Vec<NodeRef> = Vec::new();
        for p in &self.parts {
            let part_refs: Vec<NodeRef> = if p.is_reversed {
                p.refs.iter().rev().cloned().collect()
            } else {
                p.refs.clone()
            };
            let mut ii = part_refs.into_iter();
            if !refs.is_empty() {
                match ii.next() {
                    Some(f) => {
                        if refs[refs.len() - 1].id != f.id {
                            return None;
                        }
                    }
                    None => {
                        return None;
                    }
                }
            }
            refs.extend(ii);
        }
        if refs.len() < 4 {
            return None;
        }
        if refs[0].id != refs[refs.len() - 1].id {
            return None;
        }
        refs.pop();
        Some(Ring::new(refs))
    }
}

fn merge_rings(rings: &mut Vec<PartialRing>) -> (bool, Option<PartialRing>) {
    if rings.is_empty() {
        return (false, None);
    }
    if rings.len() == 1 {
        if rings[0].is_ring() {
            let zz = rings.remove(0);
            return (true, Some(zz));
        }
        return (false, None);
    }

    for i in 0..rings.len() - 1 {
        let (f, t) = rings[i].first_last();
        if f == t {
            let zz = rings.remove(i);
            return (true, Some(zz));
        }
        for j in i + 1..rings.len() {
            let (g, u) = rings[j].first_last();

            if t == g {
                let zz = rings.remove(j);
                rings[i].parts.extend(zz.parts);
                if rings[i].is_ring() {
                    let zz = rings.remove(i);
                    return (true, Some(zz));
                }
                return (true, None);
            } else if t == u {
                let mut zz = rings.remove(j);
                zz.reverse();
                rings[i].parts.extend(zz.parts);
                if rings[i].is_ring() {
                    let zz = rings.remove(i);
                    return (true, Some(zz));
                }
                return (true, None);
            } else if f == u {
                let zz = rings.remove(j);
                let back = std::mem::replace(&mut rings[i].parts, zz.parts);
                rings[i].parts.extend(back);
                return (true, None);
            } else if f == g {
                let mut zz = rings.remove(j);
                zz.reverse();
                let back = std::mem::replace(&mut rings[i].parts, zz.parts);
                rings[i].parts.extend(back);
                return (true, None);
            }
        }
    }
    (false, None)
}

/// Join the given parts into as many closed rings as possible; leftover
/// parts that close nothing are returned as well.
pub fn collect_rings(ww: Vec<RingPart>) -> (Vec<PartialRing>, Vec<RingPart>) {
    let mut parts = Vec::new();
    for w in ww {
        parts.push(PartialRing::new(w));
    }

    let mut res = Vec::new();
    loop {
        let (merged, ring) = merge_rings(&mut parts);
        if let Some(r) = ring {
            res.push(r);
        }
        if !merged {
            break;
        }
    }

    let mut rem = Vec::new();
    for p in parts {
        rem.extend(p.parts);
    }
    (res, rem)
}

/// Point in polygon by edge crossings; the ring's closing edge is
/// implicit.
pub fn point_in_ring(ring: &Ring, pt: &LonLat) -> bool {
    let ll = ring.lonlats();
    let testx = coordinate_as_float(pt.lon);
    let testy = coordinate_as_float(pt.lat);

    let mut c = false;
    for i in 0..ll.len() {
        let j = if i == 0 { ll.len() - 1 } else { i - 1 };
        let vxi = coordinate_as_float(ll[i].lon);
        let vyi = coordinate_as_float(ll[i].lat);
        let vxj = coordinate_as_float(ll[j].lon);
        let vyj = coordinate_as_float(ll[j].lat);

        if (vyi > testy) != (vyj > testy) {
            if testx < (vxj - vxi) * (testy - vyi) / (vyj - vyi) + vxi {
                c = !c;
            }
        }
    }
    c
}
