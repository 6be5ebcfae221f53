use serde::ser::{Serialize, SerializeSeq, Serializer};

pub fn coordinate_as_float(v: i32) -> f64 {
    (v as f64) * 0.0000001
}

pub fn coordinate_as_integer(v: f64) -> i32 {
    if v < 0.0 {
        return ((v * 10000000.0) - 0.5) as i32;
    }
    ((v * 10000000.0) + 0.5) as i32
}

/// A position in 1e-7 degree units, the resolution OSM stores.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct LonLat {
    pub lon: i32,
    pub lat: i32,
}

impl LonLat {
    pub fn new(lon: i32, lat: i32) -> LonLat {
        LonLat { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon >= -1800000000
            && self.lon <= 1800000000
            && self.lat >= -900000000
            && self.lat <= 900000000
    }

    pub fn to_coordinate(&self) -> geo::Coordinate<f64> {
        geo::Coordinate {
            x: coordinate_as_float(self.lon),
            y: coordinate_as_float(self.lat),
        }
    }
}

impl Serialize for LonLat {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.lon)?;
        seq.serialize_element(&self.lat)?;
        seq.end()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, serde::Serialize)]
pub struct Bbox {
    pub minlon: i32,
    pub minlat: i32,
    pub maxlon: i32,
    pub maxlat: i32,
}

impl Bbox {
    pub fn new(minlon: i32, minlat: i32, maxlon: i32, maxlat: i32) -> Bbox {
        Bbox {
            minlon,
            minlat,
            maxlon,
            maxlat,
        }
    }

    pub fn empty() -> Bbox {
        Bbox::new(1800000000, 900000000, -1800000000, -900000000)
    }

    pub fn is_empty(&self) -> bool {
        self.minlon > self.maxlon || self.minlat > self.maxlat
    }

    pub fn expand(&mut self, lon: i32, lat: i32) {
        if lon < self.minlon {
            self.minlon = lon;
        }
        if lat < self.minlat {
            self.minlat = lat;
        }
        if lon > self.maxlon {
            self.maxlon = lon;
        }
        if lat > self.maxlat {
            self.maxlat = lat;
        }
    }

    pub fn contains_point(&self, lon: i32, lat: i32) -> bool {
        lon >= self.minlon && lon <= self.maxlon && lat >= self.minlat && lat <= self.maxlat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_round() {
        assert_eq!(coordinate_as_integer(1.5), 15000000);
        assert_eq!(coordinate_as_integer(-1.5), -15000000);
        assert_eq!(coordinate_as_float(15000000), 1.5);
    }

    #[test]
    fn test_lonlat_valid() {
        assert!(LonLat::new(0, 0).is_valid());
        assert!(LonLat::new(1800000000, -900000000).is_valid());
        assert!(!LonLat::new(1800000001, 0).is_valid());
        assert!(!LonLat::new(0, 900000001).is_valid());
    }

    #[test]
    fn test_bbox_expand() {
        let mut bx = Bbox::empty();
        assert!(bx.is_empty());
        bx.expand(10, 20);
        bx.expand(-5, 35);
        assert_eq!(bx, Bbox::new(-5, 20, 10, 35));
        assert!(bx.contains_point(0, 25));
        assert!(!bx.contains_point(11, 25));
    }
}
