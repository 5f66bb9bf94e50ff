//! GeoJSON output and elevation enrichment.
//!
//! Converts a traced data boundary into a GeoJSON polygon, and adds Z values
//! sampled from a grid to the coordinates of any GeoJSON geometry. Enable the
//! `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use griddem::geojson::add_elevations_to_geometry;
//! use geojson::Geometry;
//!
//! let geometry: Geometry = r#"{"type": "Point", "coordinates": [138.7274, 35.3606]}"#
//!     .parse()
//!     .unwrap();
//!
//! let enriched = add_elevations_to_geometry(&grid, geometry)?;
//! // Result: {"type": "Point", "coordinates": [138.7274, 35.3606, 3776.0]}
//! ```

use geojson::{Feature, Geometry, JsonObject, JsonValue, Value as GeoJsonValue};

use crate::boundary::BoundaryTrace;
use crate::error::{DemError, Result};
use crate::grid::ElevationGrid;

/// Boundary ring as a single-ring polygon, coordinates `[x, y]`.
pub fn boundary_to_geometry(trace: &BoundaryTrace) -> Geometry {
    let ring = trace.vertices().iter().map(|v| vec![v.x, v.y]).collect();
    Geometry::new(GeoJsonValue::Polygon(vec![ring]))
}

/// Boundary polygon wrapped in a feature describing the grid it came from.
///
/// Properties: `coordinate_space`, `cell_size`, `width`, `height` and
/// `no_data` (true when the grid had no finite cell and the ring is its
/// bounding box).
pub fn boundary_to_feature(grid: &ElevationGrid, trace: &BoundaryTrace) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        "coordinate_space".to_string(),
        JsonValue::from(grid.space().id),
    );
    properties.insert("cell_size".to_string(), JsonValue::from(grid.cell_size()));
    properties.insert("width".to_string(), JsonValue::from(grid.width() as u64));
    properties.insert("height".to_string(), JsonValue::from(grid.height() as u64));
    properties.insert(
        "no_data".to_string(),
        JsonValue::from(trace.is_bounding_box_fallback()),
    );

    Feature {
        bbox: None,
        geometry: Some(boundary_to_geometry(trace)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Add elevations to all coordinates in a GeoJSON geometry.
///
/// Coordinates are read as `[x, y]` or `[x, y, z]` in the grid's space and
/// come back as `[x, y, elevation]`. A coordinate where the grid has no data
/// is returned unchanged.
///
/// Supported geometry types:
/// - Point
/// - MultiPoint
/// - LineString
/// - MultiLineString
/// - Polygon
/// - MultiPolygon
/// - GeometryCollection
///
/// # Errors
///
/// Returns an error if a coordinate has fewer than 2 elements or the grid
/// cannot be read.
pub fn add_elevations_to_geometry(grid: &ElevationGrid, geometry: Geometry) -> Result<Geometry> {
    let new_value = match geometry.value {
        GeoJsonValue::Point(coord) => GeoJsonValue::Point(add_elevation_to_coord(grid, &coord)?),
        GeoJsonValue::MultiPoint(coords) => {
            GeoJsonValue::MultiPoint(add_elevation_to_coords(grid, &coords)?)
        }
        GeoJsonValue::LineString(coords) => {
            GeoJsonValue::LineString(add_elevation_to_coords(grid, &coords)?)
        }
        GeoJsonValue::MultiLineString(lines) => {
            let elevated: Result<Vec<_>> = lines
                .iter()
                .map(|line| add_elevation_to_coords(grid, line))
                .collect();
            GeoJsonValue::MultiLineString(elevated?)
        }
        GeoJsonValue::Polygon(rings) => {
            let elevated: Result<Vec<_>> = rings
                .iter()
                .map(|ring| add_elevation_to_coords(grid, ring))
                .collect();
            GeoJsonValue::Polygon(elevated?)
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            let elevated: Result<Vec<_>> = polygons
                .iter()
                .map(|polygon| {
                    polygon
                        .iter()
                        .map(|ring| add_elevation_to_coords(grid, ring))
                        .collect::<Result<Vec<_>>>()
                })
                .collect();
            GeoJsonValue::MultiPolygon(elevated?)
        }
        GeoJsonValue::GeometryCollection(geometries) => {
            let elevated: Result<Vec<_>> = geometries
                .into_iter()
                .map(|g| add_elevations_to_geometry(grid, g))
                .collect();
            GeoJsonValue::GeometryCollection(elevated?)
        }
    };

    Ok(Geometry::new(new_value))
}

/// Add elevation to a single coordinate `[x, y, ...]`.
///
/// # Errors
///
/// Returns [`DemError::InvalidCoordinate`] if the coordinate has fewer than
/// 2 elements.
pub fn add_elevation_to_coord(grid: &ElevationGrid, coord: &[f64]) -> Result<Vec<f64>> {
    if coord.len() < 2 {
        return Err(DemError::InvalidCoordinate {
            message: "Coordinate must have at least 2 elements (x, y)".to_string(),
        });
    }

    let (x, y) = (coord[0], coord[1]);
    match grid.get_value(x, y)? {
        Some(z) => Ok(vec![x, y, z]),
        None => Ok(coord.to_vec()),
    }
}

pub fn add_elevation_to_coords(grid: &ElevationGrid, coords: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    coords
        .iter()
        .map(|coord| add_elevation_to_coord(grid, coord))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::CoordinateSpace;
    use crate::storage::StorageKind;

    /// 4x4 grid at (0, 0), cell size 1, z = 10 * x + y, with (3, 3) null.
    fn test_grid() -> ElevationGrid {
        let mut grid = ElevationGrid::new(
            CoordinateSpace::new(32633),
            0.0,
            0.0,
            4,
            4,
            1.0,
            StorageKind::Float,
        )
        .unwrap();
        for y in 0..4 {
            for x in 0..4 {
                grid.set_elevation(x, y, (10 * x + y) as f64).unwrap();
            }
        }
        grid.set_elevation_null(3, 3).unwrap();
        grid
    }

    #[test]
    fn test_add_elevation_to_coord() {
        let grid = test_grid();
        let result = add_elevation_to_coord(&grid, &[2.5, 1.0]).unwrap();
        assert_eq!(result, vec![2.5, 1.0, 21.0]);

        // Existing Z is replaced
        let result = add_elevation_to_coord(&grid, &[1.2, 2.0, 999.0]).unwrap();
        assert_eq!(result, vec![1.2, 2.0, 12.0]);
    }

    #[test]
    fn test_no_data_keeps_coordinate() {
        let grid = test_grid();
        assert_eq!(
            add_elevation_to_coord(&grid, &[3.5, 3.0]).unwrap(),
            vec![3.5, 3.0]
        );
        assert_eq!(
            add_elevation_to_coord(&grid, &[50.0, 50.0]).unwrap(),
            vec![50.0, 50.0]
        );
    }

    #[test]
    fn test_add_elevation_to_coord_invalid() {
        let grid = test_grid();
        let result = add_elevation_to_coord(&grid, &[1.0]);
        assert!(matches!(result, Err(DemError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_add_elevations_to_linestring() {
        let grid = test_grid();
        let geometry = Geometry::new(GeoJsonValue::LineString(vec![
            vec![0.5, 0.0],
            vec![1.5, 1.0],
        ]));
        let result = add_elevations_to_geometry(&grid, geometry).unwrap();

        if let GeoJsonValue::LineString(coords) = result.value {
            assert_eq!(coords, vec![vec![0.5, 0.0, 0.0], vec![1.5, 1.0, 11.0]]);
        } else {
            panic!("Expected LineString geometry");
        }
    }

    #[test]
    fn test_add_elevations_to_geometry_collection() {
        let grid = test_grid();
        let geometry = Geometry::new(GeoJsonValue::GeometryCollection(vec![
            Geometry::new(GeoJsonValue::Point(vec![2.0, 2.0])),
            Geometry::new(GeoJsonValue::MultiPolygon(vec![vec![vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.0, 0.0],
            ]]])),
        ]));
        let result = add_elevations_to_geometry(&grid, geometry).unwrap();

        let GeoJsonValue::GeometryCollection(geometries) = result.value else {
            panic!("Expected GeometryCollection");
        };
        assert_eq!(geometries.len(), 2);
        assert_eq!(geometries[0].value, GeoJsonValue::Point(vec![2.0, 2.0, 22.0]));
        if let GeoJsonValue::MultiPolygon(polygons) = &geometries[1].value {
            assert!(polygons[0][0].iter().all(|c| c.len() == 3));
        } else {
            panic!("Expected MultiPolygon geometry");
        }
    }

    #[test]
    fn test_boundary_feature() {
        let grid = test_grid();
        let trace = grid.trace_boundary().unwrap();
        let feature = boundary_to_feature(&grid, &trace);

        let geometry = feature.geometry.as_ref().unwrap();
        let GeoJsonValue::Polygon(rings) = &geometry.value else {
            panic!("Expected Polygon geometry");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(rings[0][0], vec![0.0, 0.0]);

        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["coordinate_space"], JsonValue::from(32633));
        assert_eq!(properties["no_data"], JsonValue::from(false));

        let json = serde_json::to_string(&feature).unwrap();
        assert!(json.contains("\"Polygon\""));
    }
}
