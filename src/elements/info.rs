use crate::utils::timestamp_string;

use std::fmt;

#[derive(Debug, Eq, PartialEq, Clone, serde::Serialize)]
pub struct Info {
    pub version: i64,
    pub changeset: i64,
    pub timestamp: i64,
    pub user_id: i64,
    pub user: String,
}

impl Info {
    pub fn new() -> Info {
        Info {
            version: 0,
            changeset: 0,
            timestamp: 0,
            user_id: 0,
            user: String::from(""),
        }
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} {}", self.version, timestamp_string(self.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_display() {
        let mut info = Info::new();
        info.version = 3;
        info.timestamp = 1577836800;
        assert_eq!(format!("{}", info), "v3 2020-01-01T00:00:00");
    }
}
