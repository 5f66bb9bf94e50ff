//! One-degree tile names.
//!
//! Files in the SRTM naming convention carry the south-west corner of the
//! 1° × 1° area they cover: `{N|S}{lat:02}{E|W}{lon:03}`, e.g. `N35E138`.
//! The `.hgt` reader uses this to place a grid without any header.

use std::path::Path;

use crate::bbox::BoundingBox;

/// Integer south-west corner of a one-degree tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCorner {
    /// Longitude of the western edge (map X).
    pub lon: i32,
    /// Latitude of the southern edge (map Y).
    pub lat: i32,
}

impl TileCorner {
    pub fn new(lon: i32, lat: i32) -> Self {
        Self { lon, lat }
    }

    /// Tile containing the point `(x = lon, y = lat)`.
    pub fn containing(x: f64, y: f64) -> Self {
        Self {
            lon: x.floor() as i32,
            lat: y.floor() as i32,
        }
    }

    /// Tile name without extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use griddem::filename::TileCorner;
    ///
    /// assert_eq!(TileCorner::new(138, 35).stem(), "N35E138");
    /// assert_eq!(TileCorner::containing(-77.1, -12.3).stem(), "S13W078");
    /// ```
    pub fn stem(&self) -> String {
        let lat_prefix = if self.lat >= 0 { 'N' } else { 'S' };
        let lon_prefix = if self.lon >= 0 { 'E' } else { 'W' };
        format!(
            "{}{:02}{}{:03}",
            lat_prefix,
            self.lat.abs(),
            lon_prefix,
            self.lon.abs()
        )
    }

    /// `true` if `[lon, lon+1) × [lat, lat+1)` overlaps the box.
    pub fn overlaps(&self, bounds: &BoundingBox) -> bool {
        let tile = BoundingBox::new(
            self.lon as f64,
            self.lat as f64,
            (self.lon + 1) as f64,
            (self.lat + 1) as f64,
        );
        tile.overlaps(bounds)
    }
}

/// `.hgt` file name of the tile containing `(x, y)`.
pub fn tile_file_name(x: f64, y: f64) -> String {
    format!("{}.hgt", TileCorner::containing(x, y).stem())
}

/// Parse the tile corner from a path's file name.
///
/// Everything after the first `.` is ignored, so `N35E138.hgt` and
/// `N35E138.hgt.zip` both parse. Case-insensitive.
///
/// # Examples
///
/// ```
/// use griddem::filename::{parse_tile_name, TileCorner};
///
/// assert_eq!(parse_tile_name("N35E138.hgt"), Some(TileCorner::new(138, 35)));
/// assert_eq!(parse_tile_name("/data/s12w077.hgt.zip"), Some(TileCorner::new(-77, -12)));
/// assert_eq!(parse_tile_name("dem.hgt"), None);
/// ```
pub fn parse_tile_name<P: AsRef<Path>>(path: P) -> Option<TileCorner> {
    let name = path.as_ref().file_name()?.to_str()?;
    // Windows separators on a Unix host
    let name = name.rsplit('\\').next()?;
    let stem = name.split('.').next()?;

    if stem.len() != 7 || !stem.is_ascii() {
        return None;
    }
    let bytes = stem.as_bytes();

    let lat_sign = match bytes[0].to_ascii_uppercase() {
        b'N' => 1,
        b'S' => -1,
        _ => return None,
    };
    let lon_sign = match bytes[3].to_ascii_uppercase() {
        b'E' => 1,
        b'W' => -1,
        _ => return None,
    };
    let lat: i32 = stem[1..3].parse().ok()?;
    let lon: i32 = stem[4..7].parse().ok()?;

    Some(TileCorner {
        lon: lon * lon_sign,
        lat: lat * lat_sign,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_file_name() {
        assert_eq!(tile_file_name(138.7, 35.5), "N35E138.hgt");
        assert_eq!(tile_file_name(0.5, 0.5), "N00E000.hgt");
        // floor(-0.5) = -1
        assert_eq!(tile_file_name(-0.5, -0.5), "S01W001.hgt");
        assert_eq!(tile_file_name(-122.4, 35.5), "N35W123.hgt");
        assert_eq!(tile_file_name(151.2, -33.9), "S34E151.hgt");
    }

    #[test]
    fn test_edges_belong_to_next_tile() {
        assert_eq!(tile_file_name(138.0, 35.0), "N35E138.hgt");
        assert_eq!(tile_file_name(-138.0, -35.0), "S35W138.hgt");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_tile_name("N35E138.hgt"), Some(TileCorner::new(138, 35)));
        assert_eq!(parse_tile_name("S12W077.hgt"), Some(TileCorner::new(-77, -12)));
        assert_eq!(parse_tile_name("N00E000"), Some(TileCorner::new(0, 0)));
        assert_eq!(
            parse_tile_name("/path/to/data/N35E138.hgt.zip"),
            Some(TileCorner::new(138, 35))
        );
        assert_eq!(
            parse_tile_name("C:\\data\\S12W077.hgt"),
            Some(TileCorner::new(-77, -12))
        );
        assert_eq!(parse_tile_name("n35e138.hgt"), Some(TileCorner::new(138, 35)));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_tile_name("invalid"), None);
        assert_eq!(parse_tile_name("N35E13.hgt"), None);
        assert_eq!(parse_tile_name("X35E138.hgt"), None);
        assert_eq!(parse_tile_name("N35X138.hgt"), None);
        assert_eq!(parse_tile_name("NAAE138.hgt"), None);
        assert_eq!(parse_tile_name("N3€E138.hgt"), None);
    }

    #[test]
    fn test_name_round_trip() {
        for (x, y) in [(138.7, 35.5), (-77.1, -12.3), (-0.5, 0.5), (179.9, 59.9)] {
            let corner = parse_tile_name(tile_file_name(x, y)).unwrap();
            assert_eq!(corner, TileCorner::containing(x, y));
        }
    }

    #[test]
    fn test_overlaps() {
        let tile = TileCorner::new(138, 35);
        assert!(tile.overlaps(&BoundingBox::new(138.5, 35.5, 139.5, 36.5)));
        assert!(!tile.overlaps(&BoundingBox::new(139.0, 35.0, 140.0, 36.0)));
        assert!(!tile.overlaps(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
    }
}
