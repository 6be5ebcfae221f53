use crate::area::area::{AreaBuilder, PolygonPart, Ring};
use crate::area::rings::{collect_rings, point_in_ring, RingPart};
use crate::area::stats::AreaStats;
use crate::elements::{has_tag, Relation, Way};
use crate::utils::Result;

use serde::{Deserialize, Serialize};

use std::fs::File;
use std::io::BufReader;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AssembleError {
    /// A node location needed for ring geometry is missing or out of
    /// range. The manager swallows this one.
    InvalidLocation,
    /// The member ways don't join into closed rings.
    OpenRing,
    /// A ring could not be placed in the outer/inner hierarchy.
    Nesting,
}

impl std::fmt::Display for AssembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type AssembleResult = std::result::Result<(), AssembleError>;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AssemblerConfig {
    /// Copy the `type` tag of a relation onto its area.
    pub keep_type_tag: bool,
    /// Count member roles that contradict the computed ring nesting.
    pub check_roles: bool,
}

impl Default for AssemblerConfig {
    fn default() -> AssemblerConfig {
        AssemblerConfig {
            keep_type_tag: false,
            check_roles: false,
        }
    }
}

impl AssemblerConfig {
    pub fn from_file(infn: &str) -> Result<AssemblerConfig> {
        let ff = File::open(infn)?;
        let mut fbuf = BufReader::new(ff);
        let cfg = serde_json::from_reader(&mut fbuf)?;
        Ok(cfg)
    }
}

/// The ring-assembly collaborator. A fresh instance is constructed per
/// source object; its stats cover that one invocation and are merged by
/// the manager on success.
pub trait Assembler {
    type Config;

    fn new(config: &Self::Config) -> Self;

    /// Build one area from a closed way, appending it to `out`.
    fn assemble_way(&mut self, way: &Way, out: &mut Vec<u8>) -> AssembleResult;

    /// Build one area from a relation and its resolved member ways.
    fn assemble_relation(
        &mut self,
        relation: &Relation,
        ways: &[&Way],
        out: &mut Vec<u8>,
    ) -> AssembleResult;

    fn stats(&self) -> AreaStats;
}

/// Default assembler: joins member ways into rings, orients them and
/// nests interiors inside the smallest containing exterior.
pub struct RingAssembler {
    config: AssemblerConfig,
    stats: AreaStats,
}

fn locations_valid(way: &Way) -> bool {
    way.refs
        .iter()
        .all(|r| r.lonlat.map_or(false, |l| l.is_valid()))
}

impl RingAssembler {
    fn build_rings(&mut self, ways: &[&Way]) -> std::result::Result<Vec<(Ring, Vec<i64>)>, AssembleError> {
        let parts: Vec<RingPart> = ways.iter().map(|w| RingPart::new(w)).collect();
        let (partial, rem) = collect_rings(parts);
        if !rem.is_empty() || partial.is_empty() {
            return Err(AssembleError::OpenRing);
        }
        let mut rings = Vec::new();
        for pr in partial {
            let way_ids: Vec<i64> = pr.parts.iter().map(|p| p.orig_id).collect();
            match pr.into_ring() {
                Some(r) => {
                    rings.push((r, way_ids));
                }
                None => {
                    return Err(AssembleError::OpenRing);
                }
            }
        }
        Ok(rings)
    }

    fn count_wrong_roles(&mut self, relation: &Relation, way_ids: &[i64], expected: &str) {
        for wid in way_ids {
            for m in &relation.members {
                if m.mem_ref == *wid && m.role != expected {
                    self.stats.wrong_role += 1;
                }
            }
        }
    }
}

impl Assembler for RingAssembler {
    type Config = AssemblerConfig;

    fn new(config: &AssemblerConfig) -> RingAssembler {
        RingAssembler {
            config: config.clone(),
            stats: AreaStats::new(),
        }
    }

    fn assemble_way(&mut self, way: &Way, out: &mut Vec<u8>) -> AssembleResult {
        if !locations_valid(way) {
            return Err(AssembleError::InvalidLocation);
        }
        let mut refs = way.refs.clone();
        refs.pop();
        let part = PolygonPart::new(Ring::new(refs));

        let mut builder = AreaBuilder::from_way(way);
        builder.add_part(part);
        builder.build().pack_into(out);

        self.stats.areas += 1;
        self.stats.from_ways += 1;
        self.stats.outer_rings += 1;
        Ok(())
    }

    fn assemble_relation(
        &mut self,
        relation: &Relation,
        ways: &[&Way],
        out: &mut Vec<u8>,
    ) -> AssembleResult {
        for w in ways {
            if !locations_valid(w) {
                return Err(AssembleError::InvalidLocation);
            }
        }

        let rings = self.build_rings(ways)?;

        // nesting depth of each ring: how many other rings contain its
        // first vertex
        let mut depth = vec![0usize; rings.len()];
        let mut parent: Vec<Option<usize>> = vec![None; rings.len()];
        for i in 0..rings.len() {
            let pt = match rings[i].0.lonlats().first() {
                Some(l) => *l,
                None => {
                    return Err(AssembleError::InvalidLocation);
                }
            };
            for j in 0..rings.len() {
                if i == j {
                    continue;
                }
                if point_in_ring(&rings[j].0, &pt) {
                    depth[i] += 1;
                    match parent[i] {
                        Some(p) => {
                            // the direct parent is the smallest container
                            if rings[j].0.area().abs() < rings[p].0.area().abs() {
                                parent[i] = Some(j);
                            }
                        }
                        None => {
                            parent[i] = Some(j);
                        }
                    }
                }
            }
        }

        let mut builder = AreaBuilder::from_relation(relation, self.config.keep_type_tag);
        let mut outer_slot = vec![usize::MAX; rings.len()];
        let mut parts: Vec<PolygonPart> = Vec::new();
        let mut n_outer = 0;
        let mut n_inner = 0;
        for (i, (ring, way_ids)) in rings.iter().enumerate() {
            if depth[i] % 2 == 0 {
                outer_slot[i] = parts.len();
                parts.push(PolygonPart::new(ring.clone()));
                n_outer += 1;
                if self.config.check_roles {
                    self.count_wrong_roles(relation, way_ids, "outer");
                }
            }
        }
        for (i, (ring, way_ids)) in rings.iter().enumerate() {
            if depth[i] % 2 == 1 {
                let p = match parent[i] {
                    Some(p) if outer_slot[p] != usize::MAX => outer_slot[p],
                    _ => {
                        return Err(AssembleError::Nesting);
                    }
                };
                parts[p].add_interior(ring.clone());
                n_inner += 1;
                if self.config.check_roles {
                    self.count_wrong_roles(relation, way_ids, "inner");
                }
            }
        }

        for part in parts {
            builder.add_part(part);
        }
        builder.build().pack_into(out);

        self.stats.areas += 1;
        self.stats.from_relations += 1;
        self.stats.outer_rings += n_outer;
        self.stats.inner_rings += n_inner;
        self.stats.member_ways += ways.len() as i64;
        Ok(())
    }

    fn stats(&self) -> AreaStats {
        self.stats
    }
}

/// Whether a closed way qualifies for single-way area assembly: it must
/// not be tagged `area=no` and at least one tag must pass the filter.
pub fn way_qualifies(way: &Way, filter: &crate::filter::TagsFilter) -> bool {
    if has_tag(&way.tags, "area", "no") {
        return false;
    }
    filter.match_any(&way.tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::area::read_areas;
    use crate::elements::{find_tag, ElementType, Member, NodeRef, Tag};
    use crate::filter::TagsFilter;

    fn closed_way(id: i64, refs: &[(i64, i32, i32)]) -> Way {
        let mut w = Way::new(id);
        w.refs = refs
            .iter()
            .map(|(i, lon, lat)| NodeRef::with_location(*i, *lon, *lat))
            .collect();
        w
    }

    fn square(id: i64, base: i64, x0: i32, y0: i32, d: i32) -> Way {
        closed_way(
            id,
            &[
                (base, x0, y0),
                (base + 1, x0 + d, y0),
                (base + 2, x0 + d, y0 + d),
                (base + 3, x0, y0 + d),
                (base, x0, y0),
            ],
        )
    }

    #[test]
    fn test_assemble_way() {
        let mut w = square(42, 1, 0, 0, 10000000);
        w.tags.push(Tag::new("building", "yes"));

        let mut out = Vec::new();
        let mut asm = RingAssembler::new(&AssemblerConfig::default());
        asm.assemble_way(&w, &mut out).unwrap();

        let areas = read_areas(&out).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].id(), 84);
        assert!(areas[0].from_way());
        assert_eq!(areas[0].num_rings(), (1, 0));
        assert_eq!(areas[0].parts()[0].exterior.len(), 4);
        assert_eq!(asm.stats().from_ways, 1);
    }

    #[test]
    fn test_assemble_way_missing_location() {
        let mut w = square(42, 1, 0, 0, 10);
        w.refs[2].lonlat = None;
        let mut out = Vec::new();
        let mut asm = RingAssembler::new(&AssemblerConfig::default());
        assert_eq!(
            asm.assemble_way(&w, &mut out),
            Err(AssembleError::InvalidLocation)
        );
        assert!(out.is_empty());
    }

    fn simple_mp_relation(id: i64) -> Relation {
        let mut r = Relation::new(id);
        r.tags.push(Tag::new("type", "multipolygon"));
        r.tags.push(Tag::new("natural", "wood"));
        r.members.push(Member::new("outer", ElementType::Way, 10));
        r.members.push(Member::new("inner", ElementType::Way, 11));
        r
    }

    #[test]
    fn test_assemble_relation_with_hole() {
        let rel = simple_mp_relation(7);
        let outer = square(10, 1, 0, 0, 10000000);
        let inner = square(11, 5, 2000000, 2000000, 2000000);

        let mut out = Vec::new();
        let mut asm = RingAssembler::new(&AssemblerConfig::default());
        asm.assemble_relation(&rel, &[&outer, &inner], &mut out)
            .unwrap();

        let areas = read_areas(&out).unwrap();
        assert_eq!(areas.len(), 1);
        let a = &areas[0];
        assert_eq!(a.id(), 15);
        assert!(!a.from_way());
        assert_eq!(a.orig_id(), 7);
        assert_eq!(a.num_rings(), (1, 1));
        // type tag dropped, other tags kept
        assert_eq!(find_tag(a.tags(), "type"), None);
        assert_eq!(find_tag(a.tags(), "natural"), Some("wood"));
        // orientation: exterior anti-clockwise, interior clockwise
        assert!(a.parts()[0].exterior.area() > 0.0);
        assert!(a.parts()[0].interiors[0].area() < 0.0);
        assert_eq!(asm.stats().member_ways, 2);
        assert_eq!(asm.stats().inner_rings, 1);
    }

    #[test]
    fn test_assemble_relation_from_segments() {
        // outer ring split across two open ways
        let mut rel = Relation::new(9);
        rel.tags.push(Tag::new("type", "multipolygon"));
        rel.tags.push(Tag::new("landuse", "meadow"));
        rel.members.push(Member::new("outer", ElementType::Way, 20));
        rel.members.push(Member::new("outer", ElementType::Way, 21));

        let w1 = closed_way(20, &[(1, 0, 0), (2, 100, 0), (3, 100, 100)]);
        let w2 = closed_way(21, &[(3, 100, 100), (4, 0, 100), (1, 0, 0)]);

        let mut out = Vec::new();
        let mut asm = RingAssembler::new(&AssemblerConfig::default());
        asm.assemble_relation(&rel, &[&w1, &w2], &mut out).unwrap();

        let areas = read_areas(&out).unwrap();
        assert_eq!(areas[0].num_rings(), (1, 0));
        assert_eq!(areas[0].parts()[0].exterior.len(), 4);
    }

    #[test]
    fn test_assemble_relation_open_ring() {
        let mut rel = Relation::new(9);
        rel.tags.push(Tag::new("type", "multipolygon"));
        rel.members.push(Member::new("outer", ElementType::Way, 20));

        let w = closed_way(20, &[(1, 0, 0), (2, 100, 0), (3, 100, 100)]);

        let mut out = Vec::new();
        let mut asm = RingAssembler::new(&AssemblerConfig::default());
        assert_eq!(
            asm.assemble_relation(&rel, &[&w], &mut out),
            Err(AssembleError::OpenRing)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_check_roles_counts_mismatches() {
        let mut rel = simple_mp_relation(7);
        // swap the roles so both are wrong
        rel.members[0].role = String::from("inner");
        rel.members[1].role = String::from("outer");

        let outer = square(10, 1, 0, 0, 10000000);
        let inner = square(11, 5, 2000000, 2000000, 2000000);

        let mut out = Vec::new();
        let cfg = AssemblerConfig {
            check_roles: true,
            ..AssemblerConfig::default()
        };
        let mut asm = RingAssembler::new(&cfg);
        asm.assemble_relation(&rel, &[&outer, &inner], &mut out)
            .unwrap();
        assert_eq!(asm.stats().wrong_role, 2);
    }

    #[test]
    fn test_keep_type_tag() {
        let rel = simple_mp_relation(7);
        let outer = square(10, 1, 0, 0, 10000000);
        let inner = square(11, 5, 2000000, 2000000, 2000000);

        let mut out = Vec::new();
        let cfg = AssemblerConfig {
            keep_type_tag: true,
            ..AssemblerConfig::default()
        };
        let mut asm = RingAssembler::new(&cfg);
        asm.assemble_relation(&rel, &[&outer, &inner], &mut out)
            .unwrap();
        let areas = read_areas(&out).unwrap();
        assert_eq!(find_tag(areas[0].tags(), "type"), Some("multipolygon"));
    }

    #[test]
    fn test_way_qualifies() {
        let mut w = square(1, 1, 0, 0, 10);
        w.tags.push(Tag::new("landuse", "forest"));
        assert!(way_qualifies(&w, &TagsFilter::default()));

        w.tags.push(Tag::new("area", "no"));
        assert!(!way_qualifies(&w, &TagsFilter::default()));

        let bare = square(2, 1, 0, 0, 10);
        assert!(!way_qualifies(&bare, &TagsFilter::default()));
    }
}
