use crate::elements::info::Info;
use crate::elements::position::LonLat;
use crate::elements::tags::Tag;

/// One entry of a way's node list: the node id plus its location, when
/// the upstream reader filled it in.
#[derive(Debug, Eq, PartialEq, Clone, serde::Serialize)]
pub struct NodeRef {
    pub id: i64,
    pub lonlat: Option<LonLat>,
}

impl NodeRef {
    pub fn new(id: i64, lonlat: Option<LonLat>) -> NodeRef {
        NodeRef { id, lonlat }
    }

    pub fn with_location(id: i64, lon: i32, lat: i32) -> NodeRef {
        NodeRef {
            id,
            lonlat: Some(LonLat::new(lon, lat)),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Way {
    pub id: i64,
    pub info: Option<Info>,
    pub tags: Vec<Tag>,
    pub refs: Vec<NodeRef>,
}

impl Way {
    pub fn new(id: i64) -> Way {
        Way {
            id,
            info: None,
            tags: Vec::new(),
            refs: Vec::new(),
        }
    }

    /// Both end locations present and within range.
    pub fn ends_have_valid_locations(&self) -> bool {
        if self.refs.is_empty() {
            return false;
        }
        match (&self.refs[0].lonlat, &self.refs[self.refs.len() - 1].lonlat) {
            (Some(a), Some(b)) => a.is_valid() && b.is_valid(),
            _ => false,
        }
    }

    /// Both end locations present, valid and bit-identical.
    pub fn ends_have_same_location(&self) -> bool {
        self.ends_have_valid_locations()
            && self.refs[0].lonlat == self.refs[self.refs.len() - 1].lonlat
    }

    /// A way is closed iff it has at least four node refs and its ends
    /// share the same location.
    pub fn is_closed(&self) -> bool {
        self.refs.len() >= 4 && self.ends_have_same_location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_way(id: i64) -> Way {
        let mut w = Way::new(id);
        w.refs = vec![
            NodeRef::with_location(1, 0, 0),
            NodeRef::with_location(2, 10000000, 0),
            NodeRef::with_location(3, 10000000, 10000000),
            NodeRef::with_location(4, 0, 10000000),
            NodeRef::with_location(1, 0, 0),
        ];
        w
    }

    #[test]
    fn test_way_closed() {
        assert!(square_way(1).is_closed());
    }

    #[test]
    fn test_way_not_closed() {
        let mut w = square_way(1);
        w.refs.pop();
        assert!(!w.is_closed());

        // a degenerate three-ref loop has matching ends but is no ring
        let mut v = square_way(2);
        v.refs.truncate(2);
        v.refs.push(NodeRef::with_location(1, 0, 0));
        assert!(v.ends_have_same_location());
        assert!(!v.is_closed());
    }

    #[test]
    fn test_way_missing_location() {
        let mut w = square_way(1);
        w.refs[4].lonlat = None;
        assert!(!w.ends_have_valid_locations());
        assert!(!w.is_closed());
    }

    #[test]
    fn test_way_out_of_range_location() {
        let mut w = square_way(1);
        w.refs[0].lonlat = Some(LonLat::new(1800000001, 0));
        w.refs[4].lonlat = Some(LonLat::new(1800000001, 0));
        assert!(!w.ends_have_valid_locations());
        assert!(!w.ends_have_same_location());
    }
}
