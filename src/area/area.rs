use crate::elements::{
    coordinate_as_float, Bbox, ElementType, Info, LonLat, NodeRef, Relation, Tag, Way,
};
use crate::pbf::{
    pack_data, pack_delta_int, pack_value, read_all_tags, read_delta_packed_int, un_zig_zag,
    zig_zag, IterTags, PbfTag,
};
use crate::utils::{Error, Result};

use serde_json::{json, Map, Value};

/// Convert a way or relation id into the unique area id.
pub fn object_id_to_area_id(id: i64, t: ElementType) -> i64 {
    let mut area_id = id.abs() * 2;
    if t == ElementType::Relation {
        area_id += 1;
    }
    if id < 0 {
        -area_id
    } else {
        area_id
    }
}

/// Convert an area id back into the id of the way or relation it was
/// created from.
pub fn area_id_to_object_id(id: i64) -> i64 {
    id / 2
}

pub fn area_id_from_way(id: i64) -> bool {
    (id.abs() & 1) == 0
}

/// One closed boundary of an area. The closing vertex is implicit: the
/// last ref joins back to the first.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Ring {
    pub refs: Vec<NodeRef>,
}

impl Ring {
    pub fn new(refs: Vec<NodeRef>) -> Ring {
        Ring { refs }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn lonlats(&self) -> Vec<LonLat> {
        self.refs.iter().filter_map(|r| r.lonlat).collect()
    }

    /// Signed area in square degrees, positive for anti-clockwise
    /// winding.
    pub fn area(&self) -> f64 {
        let ll = self.lonlats();
        if ll.len() < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..ll.len() {
            let p = &ll[i];
            let q = &ll[(i + 1) % ll.len()];
            area += coordinate_as_float(p.lon) * coordinate_as_float(q.lat)
                - coordinate_as_float(q.lon) * coordinate_as_float(p.lat);
        }
        area / 2.0
    }

    pub fn reverse(&mut self) {
        self.refs.reverse();
    }

    /// The ring as a closed linestring, first vertex repeated at the
    /// end.
    pub fn to_geo(&self) -> geo::LineString<f64> {
        let mut coords: Vec<geo::Coordinate<f64>> =
            self.lonlats().iter().map(|l| l.to_coordinate()).collect();
        if !coords.is_empty() {
            coords.push(coords[0]);
        }
        geo::LineString(coords)
    }

    fn closed_coordinates(&self) -> Vec<(f64, f64)> {
        let mut res: Vec<(f64, f64)> = self
            .lonlats()
            .iter()
            .map(|l| (coordinate_as_float(l.lon), coordinate_as_float(l.lat)))
            .collect();
        if !res.is_empty() {
            res.push(res[0]);
        }
        res
    }

    fn pack(&self) -> Vec<u8> {
        let mut res = Vec::new();
        pack_data(
            &mut res,
            1,
            &pack_delta_int(self.refs.iter().map(|r| r.id)),
        );
        pack_data(
            &mut res,
            2,
            &pack_delta_int(
                self.refs
                    .iter()
                    .map(|r| r.lonlat.map_or(0, |l| l.lon as i64)),
            ),
        );
        pack_data(
            &mut res,
            3,
            &pack_delta_int(
                self.refs
                    .iter()
                    .map(|r| r.lonlat.map_or(0, |l| l.lat as i64)),
            ),
        );
        res
    }

    fn read(data: &[u8]) -> Result<Ring> {
        let mut ids = Vec::new();
        let mut lons = Vec::new();
        let mut lats = Vec::new();
        for t in IterTags::new(data) {
            match t {
                PbfTag::Data(1, d) => ids = read_delta_packed_int(d),
                PbfTag::Data(2, d) => lons = read_delta_packed_int(d),
                PbfTag::Data(3, d) => lats = read_delta_packed_int(d),
                _ => {}
            }
        }
        if ids.len() != lons.len() || ids.len() != lats.len() {
            return Err(Error::InvalidData(String::from(
                "ring ref and location counts don't match",
            )));
        }
        let refs = ids
            .iter()
            .zip(lons.iter().zip(lats.iter()))
            .map(|(i, (lon, lat))| NodeRef::with_location(*i, *lon as i32, *lat as i32))
            .collect();
        Ok(Ring::new(refs))
    }
}

/// One exterior ring with the interior rings it encloses.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PolygonPart {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl PolygonPart {
    /// Exteriors are kept anti-clockwise.
    pub fn new(mut exterior: Ring) -> PolygonPart {
        if exterior.area() < 0.0 {
            exterior.reverse();
        }
        PolygonPart {
            exterior,
            interiors: Vec::new(),
        }
    }

    /// Interiors are kept clockwise.
    pub fn add_interior(&mut self, mut ring: Ring) {
        if ring.area() > 0.0 {
            ring.reverse();
        }
        self.interiors.push(ring);
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            self.exterior.to_geo(),
            self.interiors.iter().map(|i| i.to_geo()).collect(),
        )
    }

    fn prep_coordinates(&self) -> Vec<Vec<(f64, f64)>> {
        let mut rings = Vec::new();
        rings.push(self.exterior.closed_coordinates());
        for ii in &self.interiors {
            rings.push(ii.closed_coordinates());
        }
        rings
    }
}

/// An area produced from a closed way or a multipolygon relation.
/// Construction goes through [AreaBuilder]; the id is the source object
/// id run through the area id bijection.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    id: i64,
    info: Option<Info>,
    tags: Vec<Tag>,
    parts: Vec<PolygonPart>,
}

impl Area {
    fn new(id: i64, info: Option<Info>, tags: Vec<Tag>, parts: Vec<PolygonPart>) -> Area {
        Area {
            id,
            info,
            tags,
            parts,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Was this area created from a way, in contrast to a relation?
    pub fn from_way(&self) -> bool {
        area_id_from_way(self.id)
    }

    /// Id of the way or relation this area was created from.
    pub fn orig_id(&self) -> i64 {
        area_id_to_object_id(self.id)
    }

    pub fn info(&self) -> &Option<Info> {
        &self.info
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn parts(&self) -> &[PolygonPart] {
        &self.parts
    }

    pub fn outer_rings(&self) -> impl Iterator<Item = &Ring> {
        self.parts.iter().map(|p| &p.exterior)
    }

    pub fn inner_rings<'a>(&'a self, outer: &'a PolygonPart) -> impl Iterator<Item = &'a Ring> {
        outer.interiors.iter()
    }

    /// (number of outer rings, number of inner rings)
    pub fn num_rings(&self) -> (usize, usize) {
        (
            self.parts.len(),
            self.parts.iter().map(|p| p.interiors.len()).sum(),
        )
    }

    /// More than one outer ring?
    pub fn is_multipolygon(&self) -> bool {
        self.num_rings().0 > 1
    }

    pub fn envelope(&self) -> Bbox {
        let mut res = Bbox::empty();
        for p in &self.parts {
            for l in p.exterior.lonlats() {
                res.expand(l.lon, l.lat);
            }
        }
        res
    }

    pub fn to_geo(&self) -> geo::MultiPolygon<f64> {
        geo::MultiPolygon(self.parts.iter().map(|p| p.to_geo()).collect())
    }

    pub fn to_geojson(&self) -> Value {
        let mut res = Map::new();
        res.insert(String::from("type"), json!("Feature"));
        res.insert(String::from("id"), json!(self.id));

        let mut props = Map::new();
        for t in &self.tags {
            props.insert(t.key.clone(), json!(t.val));
        }
        res.insert(String::from("properties"), json!(props));

        let mut geom = Map::new();
        if self.parts.len() == 1 {
            geom.insert(String::from("type"), json!("Polygon"));
            geom.insert(
                String::from("coordinates"),
                json!(self.parts[0].prep_coordinates()),
            );
        } else {
            geom.insert(String::from("type"), json!("MultiPolygon"));
            let cc: Vec<_> = self.parts.iter().map(|p| p.prep_coordinates()).collect();
            geom.insert(String::from("coordinates"), json!(cc));
        }
        res.insert(String::from("geometry"), json!(geom));

        json!(res)
    }

    /// Append this area as one framed item; a buffer never contains a
    /// partial area.
    pub fn pack_into(&self, out: &mut Vec<u8>) {
        let mut msg = Vec::new();
        pack_value(&mut msg, 1, zig_zag(self.id));
        for t in &self.tags {
            let mut tag_msg = Vec::new();
            pack_data(&mut tag_msg, 1, t.key.as_bytes());
            pack_data(&mut tag_msg, 2, t.val.as_bytes());
            pack_data(&mut msg, 2, &tag_msg);
        }
        for p in &self.parts {
            pack_data(&mut msg, 3, &p.exterior.pack());
            for ii in &p.interiors {
                pack_data(&mut msg, 4, &ii.pack());
            }
        }
        if let Some(info) = &self.info {
            let mut info_msg = Vec::new();
            pack_value(&mut info_msg, 1, info.version as u64);
            pack_value(&mut info_msg, 2, info.timestamp as u64);
            pack_value(&mut info_msg, 3, info.changeset as u64);
            pack_value(&mut info_msg, 4, info.user_id as u64);
            pack_data(&mut info_msg, 5, info.user.as_bytes());
            pack_data(&mut msg, 5, &info_msg);
        }
        pack_data(out, 1, &msg);
    }

    fn read(data: &[u8]) -> Result<Area> {
        let mut id = 0;
        let mut info = None;
        let mut tags = Vec::new();
        let mut parts: Vec<PolygonPart> = Vec::new();
        for t in IterTags::new(data) {
            match t {
                PbfTag::Value(1, v) => id = un_zig_zag(v),
                PbfTag::Data(2, d) => {
                    let mut key = String::new();
                    let mut val = String::new();
                    for tt in IterTags::new(d) {
                        match tt {
                            PbfTag::Data(1, k) => key = String::from_utf8_lossy(k).to_string(),
                            PbfTag::Data(2, v) => val = String::from_utf8_lossy(v).to_string(),
                            _ => {}
                        }
                    }
                    tags.push(Tag::new(&key, &val));
                }
                PbfTag::Data(3, d) => {
                    parts.push(PolygonPart {
                        exterior: Ring::read(d)?,
                        interiors: Vec::new(),
                    });
                }
                PbfTag::Data(4, d) => match parts.last_mut() {
                    Some(p) => {
                        p.interiors.push(Ring::read(d)?);
                    }
                    None => {
                        return Err(Error::InvalidData(String::from(
                            "inner ring before any outer ring",
                        )));
                    }
                },
                PbfTag::Data(5, d) => {
                    let mut ii = Info::new();
                    for tt in IterTags::new(d) {
                        match tt {
                            PbfTag::Value(1, v) => ii.version = v as i64,
                            PbfTag::Value(2, v) => ii.timestamp = v as i64,
                            PbfTag::Value(3, v) => ii.changeset = v as i64,
                            PbfTag::Value(4, v) => ii.user_id = v as i64,
                            PbfTag::Data(5, u) => ii.user = String::from_utf8_lossy(u).to_string(),
                            _ => {}
                        }
                    }
                    info = Some(ii);
                }
                _ => {}
            }
        }
        Ok(Area::new(id, info, tags, parts))
    }
}

/// Decode all areas packed into an output buffer.
pub fn read_areas(data: &[u8]) -> Result<Vec<Area>> {
    let mut res = Vec::new();
    for t in read_all_tags(data) {
        match t {
            PbfTag::Data(1, d) => res.push(Area::read(d)?),
            _ => {
                return Err(Error::InvalidData(String::from("unexpected field in area buffer")));
            }
        }
    }
    Ok(res)
}

/// Assembles the pieces of one area. The only way to construct an
/// [Area].
pub struct AreaBuilder {
    id: i64,
    info: Option<Info>,
    tags: Vec<Tag>,
    parts: Vec<PolygonPart>,
}

impl AreaBuilder {
    pub fn from_way(way: &Way) -> AreaBuilder {
        AreaBuilder {
            id: object_id_to_area_id(way.id, ElementType::Way),
            info: way.info.clone(),
            tags: way.tags.clone(),
            parts: Vec::new(),
        }
    }

    /// Relation tags are copied without the `type` tag unless
    /// `keep_type_tag` is set.
    pub fn from_relation(relation: &Relation, keep_type_tag: bool) -> AreaBuilder {
        let tags = relation
            .tags
            .iter()
            .filter(|t| keep_type_tag || t.key != "type")
            .cloned()
            .collect();
        AreaBuilder {
            id: object_id_to_area_id(relation.id, ElementType::Relation),
            info: relation.info.clone(),
            tags,
            parts: Vec::new(),
        }
    }

    pub fn add_part(&mut self, part: PolygonPart) {
        self.parts.push(part);
    }

    pub fn build(self) -> Area {
        Area::new(self.id, self.info, self.tags, self.parts)
    }
}
