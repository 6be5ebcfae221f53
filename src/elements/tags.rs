#[derive(Debug, Eq, PartialEq, Clone, serde::Serialize)]
pub struct Tag {
    pub key: String,
    pub val: String,
}

impl Tag {
    pub fn new(key: &str, val: &str) -> Tag {
        Tag {
            key: String::from(key),
            val: String::from(val),
        }
    }
}

pub fn find_tag<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    for t in tags {
        if t.key == key {
            return Some(&t.val);
        }
    }
    None
}

pub fn has_tag(tags: &[Tag], key: &str, val: &str) -> bool {
    match find_tag(tags, key) {
        Some(v) => v == val,
        None => false,
    }
}
