use crate::elements::{Element, Way};
use crate::relations::rels::{RelationHandle, RelationsDatabase};
use crate::stash::{ItemHandle, ItemStash};

/// A recorded (way id, relation, member slot) triple: the relation
/// awaits that way in that slot.
struct MemberInterest {
    way_id: i64,
    relation: RelationHandle,
    slot: usize,
    way_item: Option<ItemHandle>,
    removed: bool,
}

#[derive(Debug, Eq, PartialEq)]
enum Phase {
    Collecting,
    Prepared,
}

/// Tracks which ways the kept relations are waiting for. Interests are
/// appended during the first pass, sorted by way id in [prepare], then
/// matched against the second pass's ways.
///
/// For one way the completion callbacks fire in the order the relations
/// registered interest in it (the sort is stable).
pub struct MembersDatabase {
    interests: Vec<MemberInterest>,
    phase: Phase,
}

impl MembersDatabase {
    pub fn new() -> MembersDatabase {
        MembersDatabase {
            interests: Vec::new(),
            phase: Phase::Collecting,
        }
    }

    /// Note interest of `relation` in way `way_id` at member slot
    /// `slot`, incrementing the relation's outstanding-member count.
    pub fn track(
        &mut self,
        relation: RelationHandle,
        way_id: i64,
        slot: usize,
        relations: &mut RelationsDatabase,
    ) {
        if self.phase != Phase::Collecting {
            panic!("track called after prepare");
        }
        self.interests.push(MemberInterest {
            way_id,
            relation,
            slot,
            way_item: None,
            removed: false,
        });
        relations.increment_members(relation);
    }

    /// Sort the interests by way id. Must be called between the two
    /// passes; no new interests may be tracked afterwards.
    pub fn prepare(&mut self) {
        if self.phase != Phase::Collecting {
            panic!("prepare called twice");
        }
        self.interests.sort_by_key(|e| e.way_id);
        self.phase = Phase::Prepared;
    }

    fn find_range(&self, way_id: i64) -> (usize, usize) {
        let lo = self.interests.partition_point(|e| e.way_id < way_id);
        let hi = self.interests.partition_point(|e| e.way_id <= way_id);
        (lo, hi)
    }

    /// Offer a way from the second pass. If no relation awaits it the
    /// way is discarded; otherwise it is stored in the stash exactly
    /// once and every matching interest is satisfied in registration
    /// order. `on_complete` runs synchronously for each relation whose
    /// last outstanding member this way was; the handles of those
    /// relations are also returned so the caller can erase their
    /// interests and release them.
    pub fn add<F>(
        &mut self,
        way: &Way,
        stash: &mut ItemStash,
        relations: &mut RelationsDatabase,
        mut on_complete: F,
    ) -> Vec<RelationHandle>
    where
        F: FnMut(&ItemStash, &RelationsDatabase, RelationHandle),
    {
        if self.phase != Phase::Prepared {
            panic!("add called before prepare");
        }
        let (lo, hi) = self.find_range(way.id);
        let any_open = (lo..hi)
            .any(|i| !self.interests[i].removed && self.interests[i].way_item.is_none());
        if !any_open {
            return Vec::new();
        }

        let handle = stash.add(Element::Way(way.clone()));
        let mut completed = Vec::new();
        for i in lo..hi {
            if self.interests[i].removed || self.interests[i].way_item.is_some() {
                continue;
            }
            self.interests[i].way_item = Some(handle);
            relations.attach_member_way(self.interests[i].relation, self.interests[i].slot, handle);
            if relations.decrement_members(self.interests[i].relation) == 0 {
                on_complete(stash, relations, self.interests[i].relation);
                completed.push(self.interests[i].relation);
            }
        }
        completed
    }

    /// Read access to a stored way payload.
    pub fn get<'a>(&self, way_id: i64, stash: &'a ItemStash) -> Option<&'a Way> {
        let (lo, hi) = self.find_range(way_id);
        for i in lo..hi {
            if self.interests[i].removed {
                continue;
            }
            if let Some(h) = self.interests[i].way_item {
                match stash.get(h) {
                    Element::Way(w) => {
                        return Some(w);
                    }
                    _ => {
                        panic!("interest for way {} does not point at a way", way_id);
                    }
                }
            }
        }
        None
    }

    /// Erase all interests matching both ids, releasing the way payload
    /// once nothing references it any more. Unsatisfied interests give
    /// back their outstanding-member count.
    pub fn remove(
        &mut self,
        way_id: i64,
        relation: RelationHandle,
        stash: &mut ItemStash,
        relations: &mut RelationsDatabase,
    ) {
        let (lo, hi) = self.find_range(way_id);
        let mut way_item = None;
        for i in lo..hi {
            if self.interests[i].removed || self.interests[i].relation != relation {
                continue;
            }
            self.interests[i].removed = true;
            match self.interests[i].way_item {
                Some(h) => {
                    way_item = Some(h);
                }
                None => {
                    relations.decrement_members(relation);
                }
            }
        }
        if let Some(h) = way_item {
            let still_referenced = (lo..hi)
                .any(|i| !self.interests[i].removed && self.interests[i].way_item == Some(h));
            if !still_referenced {
                stash.remove(h);
            }
        }
    }

    /// Interests not yet satisfied or erased.
    pub fn count_open(&self) -> usize {
        self.interests
            .iter()
            .filter(|e| !e.removed && e.way_item.is_none())
            .count()
    }

    pub fn used_memory(&self) -> usize {
        self.interests.capacity() * std::mem::size_of::<MemberInterest>()
    }

    #[cfg(test)]
    pub(crate) fn way_ids(&self) -> Vec<i64> {
        self.interests.iter().map(|e| e.way_id).collect()
    }

    #[cfg(test)]
    pub(crate) fn relations_for(&self, way_id: i64) -> Vec<RelationHandle> {
        let (lo, hi) = self.find_range(way_id);
        (lo..hi)
            .filter(|i| !self.interests[*i].removed)
            .map(|i| self.interests[i].relation)
            .collect()
    }
}
