use crate::elements::info::Info;
use crate::elements::position::LonLat;
use crate::elements::tags::Tag;

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Node {
    pub id: i64,
    pub info: Option<Info>,
    pub tags: Vec<Tag>,
    pub lonlat: LonLat,
}

impl Node {
    pub fn new(id: i64) -> Node {
        Node {
            id,
            info: None,
            tags: Vec::new(),
            lonlat: LonLat::new(0, 0),
        }
    }
}
