use crate::elements::info::Info;
use crate::elements::tags::Tag;
use crate::elements::traits::ElementType;

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Member {
    pub role: String,
    pub mem_type: ElementType,
    pub mem_ref: i64,
}

impl Member {
    pub fn new(role: &str, mem_type: ElementType, mem_ref: i64) -> Member {
        Member {
            role: String::from(role),
            mem_type,
            mem_ref,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Relation {
    pub id: i64,
    pub info: Option<Info>,
    pub tags: Vec<Tag>,
    pub members: Vec<Member>,
}

impl Relation {
    pub fn new(id: i64) -> Relation {
        Relation {
            id,
            info: None,
            tags: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn num_way_members(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.mem_type == ElementType::Way)
            .count()
    }
}
