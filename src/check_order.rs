//! Asserts OSM canonical input order: nodes, then ways, then
//! relations, ids strictly ascending within each type.

use crate::elements::{Element, ElementType};
use crate::utils::{Error, Result};

pub struct CheckOrder {
    last_type: ElementType,
    last_id: i64,
}

impl CheckOrder {
    pub fn new() -> CheckOrder {
        CheckOrder {
            last_type: ElementType::Node,
            last_id: i64::MIN,
        }
    }

    pub fn check(&mut self, element: &Element) -> Result<()> {
        self.check_id(element.get_type(), element.get_id())
    }

    pub fn check_id(&mut self, t: ElementType, id: i64) -> Result<()> {
        if t < self.last_type {
            return Err(Error::InvalidOrder(format!(
                "found {} {} after {} {}",
                t, id, self.last_type, self.last_id
            )));
        }
        if t > self.last_type {
            self.last_type = t;
            self.last_id = i64::MIN;
        }
        if id <= self.last_id {
            return Err(Error::InvalidOrder(format!(
                "{} ids not strictly ascending: {} after {}",
                t, id, self.last_id
            )));
        }
        self.last_id = id;
        Ok(())
    }
}
