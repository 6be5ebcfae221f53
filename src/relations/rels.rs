use crate::elements::{Element, Relation};
use crate::stash::{ItemHandle, ItemStash};

/// Opaque cursor identifying one kept relation in a [RelationsDatabase].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RelationHandle(usize);

struct RelationEntry {
    item: ItemHandle,
    remaining: usize,
    member_ways: Vec<Option<ItemHandle>>,
}

/// The set of kept relations. Each entry counts its outstanding way
/// members and collects the stash handles of the ways resolved so far,
/// one per member slot.
pub struct RelationsDatabase {
    entries: Vec<Option<RelationEntry>>,
    free: Vec<usize>,
}

impl RelationsDatabase {
    pub fn new() -> RelationsDatabase {
        RelationsDatabase {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a relation, with no members outstanding yet.
    pub fn add(&mut self, relation: Relation, stash: &mut ItemStash) -> RelationHandle {
        let nmembers = relation.members.len();
        let entry = RelationEntry {
            item: stash.add(Element::Relation(relation)),
            remaining: 0,
            member_ways: vec![None; nmembers],
        };
        match self.free.pop() {
            Some(idx) => {
                self.entries[idx] = Some(entry);
                RelationHandle(idx)
            }
            None => {
                self.entries.push(Some(entry));
                RelationHandle(self.entries.len() - 1)
            }
        }
    }

    fn entry(&self, handle: RelationHandle) -> &RelationEntry {
        match self.entries.get(handle.0) {
            Some(Some(e)) => e,
            _ => {
                panic!("stale or unknown relation handle {:?}", handle);
            }
        }
    }

    fn entry_mut(&mut self, handle: RelationHandle) -> &mut RelationEntry {
        match self.entries.get_mut(handle.0) {
            Some(Some(e)) => e,
            _ => {
                panic!("stale or unknown relation handle {:?}", handle);
            }
        }
    }

    pub fn get<'a>(&self, handle: RelationHandle, stash: &'a ItemStash) -> &'a Relation {
        match stash.get(self.entry(handle).item) {
            Element::Relation(r) => r,
            _ => {
                panic!("relation handle {:?} does not point at a relation", handle);
            }
        }
    }

    pub fn increment_members(&mut self, handle: RelationHandle) {
        self.entry_mut(handle).remaining += 1;
    }

    /// Decrement the outstanding-member count, returning the new value.
    pub fn decrement_members(&mut self, handle: RelationHandle) -> usize {
        let e = self.entry_mut(handle);
        assert!(e.remaining > 0, "too many members resolved");
        e.remaining -= 1;
        e.remaining
    }

    pub fn remaining_members(&self, handle: RelationHandle) -> usize {
        self.entry(handle).remaining
    }

    /// Record the resolved way for one member slot.
    pub fn attach_member_way(&mut self, handle: RelationHandle, slot: usize, way: ItemHandle) {
        let e = self.entry_mut(handle);
        e.member_ways[slot] = Some(way);
    }

    /// Resolved way handles in member slot order; slots for members not
    /// of interest stay None.
    pub fn member_ways(&self, handle: RelationHandle) -> &[Option<ItemHandle>] {
        &self.entry(handle).member_ways
    }

    /// Release the relation's storage. Any interests referencing the
    /// handle must have been removed first.
    pub fn remove(&mut self, handle: RelationHandle, stash: &mut ItemStash) {
        match self.entries.get_mut(handle.0) {
            Some(slot) if slot.is_some() => {
                let e = slot.take().unwrap();
                stash.remove(e.item);
                self.free.push(handle.0);
            }
            _ => {
                panic!("remove of stale or unknown relation handle {:?}", handle);
            }
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = RelationHandle> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| RelationHandle(i))
    }

    pub fn used_memory(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<Option<RelationEntry>>()
            + self
                .entries
                .iter()
                .flatten()
                .map(|e| e.member_ways.capacity() * std::mem::size_of::<Option<ItemHandle>>())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementType, Member, Relation, Tag};

    fn test_relation(id: i64) -> Relation {
        let mut r = Relation::new(id);
        r.tags.push(Tag::new("type", "multipolygon"));
        r.members.push(Member::new("outer", ElementType::Way, 10));
        r.members.push(Member::new("admin_centre", ElementType::Node, 0));
        r
    }

    #[test]
    fn test_add_get_remove() {
        let mut stash = ItemStash::new();
        let mut rels = RelationsDatabase::new();

        let h = rels.add(test_relation(3), &mut stash);
        assert_eq!(rels.count(), 1);
        assert_eq!(rels.get(h, &stash).id, 3);
        assert_eq!(rels.member_ways(h).len(), 2);

        rels.increment_members(h);
        assert_eq!(rels.remaining_members(h), 1);
        assert_eq!(rels.decrement_members(h), 0);

        rels.remove(h, &mut stash);
        assert_eq!(rels.count(), 0);
        assert!(stash.is_empty());
    }

    #[test]
    fn test_iter_live_handles() {
        let mut stash = ItemStash::new();
        let mut rels = RelationsDatabase::new();
        let h1 = rels.add(test_relation(1), &mut stash);
        let h2 = rels.add(test_relation(2), &mut stash);
        rels.remove(h1, &mut stash);

        let live: Vec<_> = rels.iter().collect();
        assert_eq!(live, vec![h2]);
    }

    #[test]
    #[should_panic(expected = "stale or unknown relation handle")]
    fn test_stale_handle() {
        let mut stash = ItemStash::new();
        let mut rels = RelationsDatabase::new();
        let h = rels.add(test_relation(1), &mut stash);
        rels.remove(h, &mut stash);
        rels.remaining_members(h);
    }
}
