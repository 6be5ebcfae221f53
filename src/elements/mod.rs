mod info;
mod node;
mod position;
mod relation;
mod tags;
mod traits;
mod way;

pub use info::Info;
pub use node::Node;
pub use position::{coordinate_as_float, coordinate_as_integer, Bbox, LonLat};
pub use relation::{Member, Relation};
pub use tags::{find_tag, has_tag, Tag};
pub use traits::{Element, ElementType};
pub use way::{NodeRef, Way};
