use crate::area::assembler::{way_qualifies, AssembleError, Assembler};
use crate::area::stats::AreaStats;
use crate::callback_buffer::CallbackBuffer;
use crate::elements::{find_tag, Element, ElementType, Relation, Way};
use crate::filter::TagsFilter;
use crate::message;
use crate::relations::{MembersDatabase, RelationHandle, RelationsDatabase};
use crate::stash::ItemStash;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MemoryUsage {
    pub relations: usize,
    pub members: usize,
    pub stash: usize,
}

/// Two-pass orchestrator building areas from closed ways and
/// `type=multipolygon` / `type=boundary` relations.
///
/// The first pass feeds relations through [relation]; [prepare] must be
/// called before the second pass feeds every way through [way]. When a
/// way is the last outstanding member of one or more relations, those
/// relations' areas are assembled first, in interest-registration
/// order, then the way's own closed-way area.
pub struct MultipolygonManager<A: Assembler> {
    assembler_config: A::Config,
    filter: TagsFilter,
    stash: ItemStash,
    relations: RelationsDatabase,
    members: MembersDatabase,
    output: CallbackBuffer,
    stats: AreaStats,
}

impl<A: Assembler> MultipolygonManager<A> {
    pub fn new(assembler_config: A::Config) -> MultipolygonManager<A> {
        MultipolygonManager::with_filter(assembler_config, TagsFilter::default())
    }

    pub fn with_filter(assembler_config: A::Config, filter: TagsFilter) -> MultipolygonManager<A> {
        MultipolygonManager {
            assembler_config,
            filter,
            stash: ItemStash::new(),
            relations: RelationsDatabase::new(),
            members: MembersDatabase::new(),
            output: CallbackBuffer::new(),
            stats: AreaStats::new(),
        }
    }

    /// The output buffer, for installing a sink callback or adjusting
    /// the flush threshold.
    pub fn output(&mut self) -> &mut CallbackBuffer {
        &mut self.output
    }

    pub fn set_callback(&mut self, callback: Box<dyn FnMut(Vec<u8>) + Send>) {
        self.output.set_callback(callback);
    }

    pub fn relations_db(&self) -> &RelationsDatabase {
        &self.relations
    }

    pub fn members_db(&self) -> &MembersDatabase {
        &self.members
    }

    /// Relations tagged type=multipolygon or type=boundary with at
    /// least one way member, passing the filter.
    fn keep_relation(&self, relation: &Relation) -> bool {
        match find_tag(&relation.tags, "type") {
            Some("multipolygon") | Some("boundary") => {}
            _ => {
                return false;
            }
        }
        if !self.filter.match_any(&relation.tags) {
            return false;
        }
        relation.num_way_members() > 0
    }

    /// First pass: keep the relation and note interest in its way
    /// members. Ids of members of other types are zeroed, keeping the
    /// slot positions.
    pub fn relation(&mut self, mut relation: Relation) {
        if !self.keep_relation(&relation) {
            return;
        }
        let mut way_members = Vec::with_capacity(relation.members.len());
        for (n, m) in relation.members.iter_mut().enumerate() {
            if m.mem_type == ElementType::Way {
                way_members.push((m.mem_ref, n));
            } else {
                m.mem_ref = 0;
            }
        }
        let handle = self.relations.add(relation, &mut self.stash);
        for (way_id, slot) in way_members {
            self.members.track(handle, way_id, slot, &mut self.relations);
        }
    }

    /// Sort the members database. Call between the two passes.
    pub fn prepare(&mut self) {
        self.members.prepare();
    }

    /// Second pass: offer the way to the members database, completing
    /// relations whose last member it is, then try single-way area
    /// assembly.
    pub fn way(&mut self, way: &Way) {
        let MultipolygonManager {
            assembler_config,
            stash,
            relations,
            members,
            output,
            stats,
            ..
        } = self;
        let completed = members.add(way, stash, relations, |stash, relations, rel| {
            let relation = relations.get(rel, stash);
            let member_ways = relations.member_ways(rel);
            let mut ways: Vec<&Way> = Vec::with_capacity(member_ways.len());
            for (slot, m) in relation.members.iter().enumerate() {
                if m.mem_ref == 0 {
                    continue;
                }
                match member_ways[slot] {
                    Some(h) => match stash.get(h) {
                        Element::Way(w) => {
                            ways.push(w);
                        }
                        _ => {
                            panic!("member handle of relation {} is not a way", relation.id);
                        }
                    },
                    None => {
                        panic!(
                            "relation {} complete but member way {} unresolved",
                            relation.id, m.mem_ref
                        );
                    }
                }
            }

            let mut assembler = A::new(assembler_config);
            match assembler.assemble_relation(relation, &ways, output.buffer()) {
                Ok(()) => {
                    *stats += assembler.stats();
                }
                Err(e) => {
                    record_failure(stats, e);
                }
            }
            output.possibly_flush();
        });

        for rel in completed {
            self.remove_members(rel);
            self.relations.remove(rel, &mut self.stash);
        }

        self.assemble_way(way);
    }

    /// Erase every interest still registered against the relation.
    /// After a completion all of them have been satisfied already; this
    /// also releases the way payloads nothing references any more.
    fn remove_members(&mut self, rel: RelationHandle) {
        let member_refs: Vec<i64> = self
            .relations
            .get(rel, &self.stash)
            .members
            .iter()
            .filter(|m| m.mem_ref != 0)
            .map(|m| m.mem_ref)
            .collect();
        for way_id in member_refs {
            self.members
                .remove(way_id, rel, &mut self.stash, &mut self.relations);
        }
    }

    fn assemble_way(&mut self, way: &Way) {
        // you need at least 4 node refs to make up a polygon
        if way.refs.len() <= 3 {
            return;
        }
        if !way.ends_have_valid_locations() {
            self.stats.invalid_locations += 1;
            return;
        }
        if !way.is_closed() {
            return;
        }
        if !way_qualifies(way, &self.filter) {
            return;
        }

        let mut assembler = A::new(&self.assembler_config);
        match assembler.assemble_way(way, self.output.buffer()) {
            Ok(()) => {
                self.stats += assembler.stats();
            }
            Err(e) => {
                record_failure(&mut self.stats, e);
            }
        }
        self.output.possibly_flush();
    }

    /// Deliver whatever is still buffered. Call after the second pass.
    pub fn flush_output(&mut self) {
        self.output.flush();
    }

    /// Pull the output buffer in pull mode.
    pub fn read(&mut self) -> Vec<u8> {
        self.output.read()
    }

    /// Aggregated assembler statistics, with the current count of
    /// relations whose members never all arrived.
    pub fn stats(&self) -> AreaStats {
        let mut s = self.stats;
        s.incomplete_relations = self.relations.count() as i64;
        s
    }

    pub fn used_memory(&self) -> MemoryUsage {
        MemoryUsage {
            relations: self.relations.used_memory(),
            members: self.members.used_memory(),
            stash: self.stash.used_memory(),
        }
    }

    /// Log every relation still waiting for members.
    pub fn report_incomplete(&self) {
        for handle in self.relations.iter() {
            let r = self.relations.get(handle, &self.stash);
            match &r.info {
                Some(info) => {
                    message!("relation {} ({}) incomplete", r.id, info);
                }
                None => {
                    message!("relation {} incomplete", r.id);
                }
            }
        }
    }
}

fn record_failure(stats: &mut AreaStats, e: AssembleError) {
    match e {
        AssembleError::InvalidLocation => {
            stats.invalid_locations += 1;
        }
        AssembleError::OpenRing => {
            stats.open_rings += 1;
            stats.failed += 1;
        }
        AssembleError::Nesting => {
            stats.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::area::read_areas;
    use crate::area::assembler::{AssemblerConfig, RingAssembler};
    use crate::elements::{Member, NodeRef, Tag};
    use std::sync::{Arc, Mutex};

    type Manager = MultipolygonManager<RingAssembler>;

    fn closed_way(id: i64, refs: &[(i64, i32, i32)], tags: &[(&str, &str)]) -> Way {
        let mut w = Way::new(id);
        w.refs = refs
            .iter()
            .map(|(i, lon, lat)| NodeRef::with_location(*i, *lon, *lat))
            .collect();
        w.tags = tags.iter().map(|(k, v)| Tag::new(k, v)).collect();
        w
    }

    fn square(id: i64, base: i64, x0: i32, y0: i32, d: i32, tags: &[(&str, &str)]) -> Way {
        closed_way(
            id,
            &[
                (base, x0, y0),
                (base + 1, x0 + d, y0),
                (base + 2, x0 + d, y0 + d),
                (base + 3, x0, y0 + d),
                (base, x0, y0),
            ],
            tags,
        )
    }

    fn mp_relation(id: i64, members: &[(&str, i64)], tags: &[(&str, &str)]) -> Relation {
        let mut r = Relation::new(id);
        r.tags.push(Tag::new("type", "multipolygon"));
        for (k, v) in tags {
            r.tags.push(Tag::new(k, v));
        }
        for (role, way_id) in members {
            r.members.push(Member::new(role, ElementType::Way, *way_id));
        }
        r
    }

    #[test]
    fn test_single_closed_way() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.prepare();
        mgr.way(&square(42, 1, 0, 0, 10000000, &[("building", "yes")]));
        mgr.flush_output();

        let areas = read_areas(&mgr.read()).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].id(), 84);
        assert!(areas[0].from_way());
        assert_eq!(areas[0].num_rings(), (1, 0));
        assert_eq!(areas[0].parts()[0].exterior.len(), 4);
        assert_eq!(mgr.stats().areas, 1);
        assert_eq!(mgr.stats().from_ways, 1);
    }

    #[test]
    fn test_simple_multipolygon() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.relation(mp_relation(7, &[("outer", 10), ("inner", 11)], &[("natural", "wood")]));
        mgr.prepare();
        mgr.way(&square(10, 1, 0, 0, 10000000, &[]));
        mgr.way(&square(11, 5, 2000000, 2000000, 2000000, &[]));
        mgr.flush_output();

        let areas = read_areas(&mgr.read()).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].id(), 15);
        assert!(!areas[0].from_way());
        assert_eq!(areas[0].num_rings(), (1, 1));
        assert_eq!(mgr.stats().from_relations, 1);
        assert_eq!(mgr.stats().incomplete_relations, 0);

        // everything released once the relation completed
        assert!(mgr.relations_db().count() == 0);
        assert_eq!(mgr.members_db().count_open(), 0);
    }

    #[test]
    fn test_area_no_suppression() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.prepare();
        mgr.way(&square(
            8,
            1,
            0,
            0,
            10000000,
            &[("landuse", "forest"), ("area", "no")],
        ));
        mgr.flush_output();

        assert!(mgr.read().is_empty());
        assert_eq!(mgr.stats().areas, 0);
    }

    #[test]
    fn test_unmatched_tags_way_skipped() {
        // no tag passes an always-false filter
        let mut mgr = Manager::with_filter(AssemblerConfig::default(), TagsFilter::new(false));
        mgr.prepare();
        mgr.way(&square(8, 1, 0, 0, 10000000, &[("building", "yes")]));
        assert!(mgr.read().is_empty());
    }

    #[test]
    fn test_incomplete_relation() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.relation(mp_relation(3, &[("outer", 99)], &[]));
        mgr.prepare();
        mgr.way(&square(10, 1, 0, 0, 10000000, &[]));
        mgr.flush_output();

        assert!(mgr.read().is_empty());
        let stats = mgr.stats();
        assert_eq!(stats.areas, 0);
        assert_eq!(stats.incomplete_relations, 1);
        assert!(mgr.used_memory().relations > 0);
        mgr.report_incomplete();
    }

    #[test]
    fn test_relation_rejected_without_type() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        let mut r = Relation::new(5);
        r.tags.push(Tag::new("natural", "wood"));
        r.members.push(Member::new("outer", ElementType::Way, 10));
        mgr.relation(r);
        assert_eq!(mgr.relations_db().count(), 0);

        let mut r2 = mp_relation(6, &[], &[]);
        r2.members.push(Member::new("label", ElementType::Node, 1));
        mgr.relation(r2);
        assert_eq!(mgr.relations_db().count(), 0);
    }

    #[test]
    fn test_boundary_relation_kept() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        let mut r = Relation::new(12);
        r.tags.push(Tag::new("type", "boundary"));
        r.tags.push(Tag::new("boundary", "administrative"));
        r.members.push(Member::new("outer", ElementType::Way, 10));
        mgr.relation(r);
        assert_eq!(mgr.relations_db().count(), 1);
        assert_eq!(mgr.members_db().count_open(), 1);
    }

    #[test]
    fn test_non_way_members_zeroed() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        let mut r = mp_relation(6, &[("outer", 10)], &[]);
        r.members
            .insert(0, Member::new("admin_centre", ElementType::Node, 77));
        mgr.relation(r);

        let handle = mgr.relations_db().iter().next().unwrap();
        let stored = mgr.relations_db().get(handle, &mgr.stash);
        assert_eq!(stored.members.len(), 2);
        assert_eq!(stored.members[0].mem_ref, 0);
        assert_eq!(stored.members[1].mem_ref, 10);
    }

    #[test]
    fn test_shared_way_completes_in_registration_order() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.relation(mp_relation(20, &[("outer", 5)], &[("landuse", "farm")]));
        mgr.relation(mp_relation(21, &[("outer", 5)], &[("landuse", "grass")]));
        mgr.prepare();
        // the shared way is itself a taggable closed way: its own area
        // comes after both relation areas
        mgr.way(&square(5, 1, 0, 0, 10000000, &[("building", "yes")]));
        mgr.flush_output();

        let areas = read_areas(&mgr.read()).unwrap();
        let ids: Vec<i64> = areas.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![41, 43, 10]);
    }

    #[test]
    fn test_memory_released_after_completion() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.relation(mp_relation(7, &[("outer", 10), ("inner", 11)], &[]));
        mgr.prepare();
        mgr.way(&square(10, 1, 0, 0, 10000000, &[]));
        assert!(mgr.stash.count() > 0);
        mgr.way(&square(11, 5, 2000000, 2000000, 2000000, &[]));

        // relation and both way payloads released
        assert_eq!(mgr.stash.count(), 0);
        assert_eq!(mgr.relations_db().count(), 0);
        assert_eq!(mgr.members_db().count_open(), 0);
    }

    #[test]
    fn test_callback_flush_threshold() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        let flushed = Arc::new(Mutex::new(Vec::new()));
        let sink = flushed.clone();
        mgr.output().set_threshold(1);
        mgr.set_callback(Box::new(move |b| sink.lock().unwrap().push(b)));
        mgr.prepare();
        mgr.way(&square(1, 1, 0, 0, 10000000, &[("building", "yes")]));
        mgr.way(&square(2, 11, 0, 0, 10000000, &[("building", "yes")]));
        mgr.flush_output();

        let got = flushed.lock().unwrap();
        assert_eq!(got.len(), 2);
        // each flushed buffer decodes to whole areas
        for b in got.iter() {
            assert_eq!(read_areas(b).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_invalid_location_swallowed() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.prepare();
        let mut w = square(1, 1, 0, 0, 10000000, &[("building", "yes")]);
        w.refs[0].lonlat = None;
        w.refs[4].lonlat = None;
        mgr.way(&w);
        assert!(mgr.read().is_empty());
        assert_eq!(mgr.stats().invalid_locations, 1);
        assert_eq!(mgr.stats().areas, 0);
    }

    #[test]
    fn test_open_ring_relation_counted() {
        let mut mgr = Manager::new(AssemblerConfig::default());
        mgr.relation(mp_relation(4, &[("outer", 30)], &[]));
        mgr.prepare();
        // an unclosed member way: relation completes but assembly fails
        mgr.way(&closed_way(30, &[(1, 0, 0), (2, 100, 0), (3, 100, 100), (4, 0, 100)], &[]));
        mgr.flush_output();

        assert!(mgr.read().is_empty());
        let stats = mgr.stats();
        assert_eq!(stats.open_rings, 1);
        assert_eq!(stats.failed, 1);
        // the relation was still completed and released
        assert_eq!(stats.incomplete_relations, 0);
    }
}
