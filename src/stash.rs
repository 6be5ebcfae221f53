//! Arena holding the ways and relations the area databases share.
//! Items are added once and referenced through stable opaque handles,
//! so several relations can borrow the same way payload without any
//! reference counting.

use crate::elements::{Element, Tag};

/// Opaque stable index into an [ItemStash]. Valid until the item is
/// removed; handles from different stashes must not be mixed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ItemHandle(usize);

pub struct ItemStash {
    items: Vec<Option<Element>>,
    free: Vec<usize>,
    used_bytes: usize,
}

fn tags_bytes(tags: &[Tag]) -> usize {
    tags.iter()
        .map(|t| t.key.len() + t.val.len() + std::mem::size_of::<Tag>())
        .sum()
}

fn item_bytes(item: &Element) -> usize {
    let base = std::mem::size_of::<Element>();
    match item {
        Element::Node(n) => base + tags_bytes(&n.tags),
        Element::Way(w) => base + tags_bytes(&w.tags) + w.refs.len() * 16,
        Element::Relation(r) => {
            base + tags_bytes(&r.tags)
                + r.members
                    .iter()
                    .map(|m| m.role.len() + std::mem::size_of_val(m))
                    .sum::<usize>()
        }
    }
}

impl ItemStash {
    pub fn new() -> ItemStash {
        ItemStash {
            items: Vec::new(),
            free: Vec::new(),
            used_bytes: 0,
        }
    }

    pub fn add(&mut self, item: Element) -> ItemHandle {
        self.used_bytes += item_bytes(&item);
        match self.free.pop() {
            Some(idx) => {
                self.items[idx] = Some(item);
                ItemHandle(idx)
            }
            None => {
                self.items.push(Some(item));
                ItemHandle(self.items.len() - 1)
            }
        }
    }

    pub fn get(&self, handle: ItemHandle) -> &Element {
        match self.items.get(handle.0) {
            Some(Some(item)) => item,
            _ => {
                panic!("stale or unknown item handle {:?}", handle);
            }
        }
    }

    pub fn remove(&mut self, handle: ItemHandle) {
        match self.items.get_mut(handle.0) {
            Some(slot) if slot.is_some() => {
                self.used_bytes -= item_bytes(slot.as_ref().unwrap());
                *slot = None;
                self.free.push(handle.0);
            }
            _ => {
                panic!("remove of stale or unknown item handle {:?}", handle);
            }
        }
    }

    pub fn count(&self) -> usize {
        self.items.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn used_memory(&self) -> usize {
        self.used_bytes + self.items.capacity() * std::mem::size_of::<Option<Element>>()
    }
}
