mod members;
mod rels;

pub use members::MembersDatabase;
pub use rels::{RelationHandle, RelationsDatabase};
