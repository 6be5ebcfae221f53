use std::fmt;
use std::ops::AddAssign;

/// Counters aggregated across all assembler invocations of a manager.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct AreaStats {
    pub areas: i64,
    pub from_ways: i64,
    pub from_relations: i64,
    pub outer_rings: i64,
    pub inner_rings: i64,
    pub member_ways: i64,
    pub invalid_locations: i64,
    pub open_rings: i64,
    pub wrong_role: i64,
    pub failed: i64,
    pub incomplete_relations: i64,
}

impl AreaStats {
    pub fn new() -> AreaStats {
        AreaStats::default()
    }
}

impl AddAssign for AreaStats {
    fn add_assign(&mut self, other: AreaStats) {
        self.areas += other.areas;
        self.from_ways += other.from_ways;
        self.from_relations += other.from_relations;
        self.outer_rings += other.outer_rings;
        self.inner_rings += other.inner_rings;
        self.member_ways += other.member_ways;
        self.invalid_locations += other.invalid_locations;
        self.open_rings += other.open_rings;
        self.wrong_role += other.wrong_role;
        self.failed += other.failed;
        self.incomplete_relations += other.incomplete_relations;
    }
}

impl fmt::Display for AreaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} areas ({} from ways, {} from relations), {} outer rings, {} inner rings, {} member ways; {} invalid locations, {} open rings, {} wrong roles, {} failed, {} incomplete relations",
            self.areas,
            self.from_ways,
            self.from_relations,
            self.outer_rings,
            self.inner_rings,
            self.member_ways,
            self.invalid_locations,
            self.open_rings,
            self.wrong_role,
            self.failed,
            self.incomplete_relations
        )
    }
}
