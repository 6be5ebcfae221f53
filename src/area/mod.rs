mod area;
mod assembler;
mod handler;
mod manager;
mod rings;
mod stats;

pub use area::{
    area_id_from_way, area_id_to_object_id, object_id_to_area_id, read_areas, Area, AreaBuilder,
    PolygonPart, Ring,
};
pub use assembler::{
    way_qualifies, AssembleError, AssembleResult, Assembler, AssemblerConfig, RingAssembler,
};
pub use handler::{FirstPass, SecondPass};
pub use manager::{MemoryUsage, MultipolygonManager};
pub use rings::{collect_rings, point_in_ring, PartialRing, RingPart};
pub use stats::AreaStats;

pub enum OtherData {
    Messages(Vec<String>),
}

pub type Timings = crate::utils::Timings<OtherData>;
