use crate::archive::TempFileManager;
use crate::error::{ProcessingError, Result};
use crate::models::{BoundaryDataset, PlanningArea};
use crate::utils::constants::{FIELD_PLANNING_AREA, FIELD_REGION, FIELD_SHAPE_AREA};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use std::path::Path;

/// Loads the planning-area boundary layer from a zipped shapefile
pub struct BoundaryReader {
    name_field: String,
    region_field: String,
}

impl BoundaryReader {
    pub fn new() -> Self {
        Self {
            name_field: FIELD_PLANNING_AREA.to_string(),
            region_field: FIELD_REGION.to_string(),
        }
    }

    /// Extract the archive into a scratch directory and read the layer
    pub fn read_archive(&self, zip_path: &Path) -> Result<BoundaryDataset> {
        let mut temp_manager = TempFileManager::new()?;
        let shp_path = temp_manager.extract_shapefile(zip_path)?;
        let dataset = self.read_shapefile(&shp_path)?;

        tracing::info!(
            archive = %zip_path.display(),
            areas = dataset.len(),
            regions = dataset.regions().len(),
            "loaded planning area boundaries"
        );
        Ok(dataset)
    }

    pub fn read_shapefile(&self, shp_path: &Path) -> Result<BoundaryDataset> {
        let mut reader = shapefile::Reader::from_path(shp_path)?;
        let mut areas = Vec::new();

        for (index, shape_record) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = shape_record?;
            let geometry = shape_to_multipolygon(shape).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Boundary feature {} is not a polygon",
                    index
                ))
            })?;

            let name = text_field(&record, &self.name_field).ok_or_else(|| {
                ProcessingError::MissingData(format!(
                    "Boundary feature {} has no {}",
                    index, self.name_field
                ))
            })?;
            let region = text_field(&record, &self.region_field).ok_or_else(|| {
                ProcessingError::MissingData(format!(
                    "Boundary feature {} ({}) has no {}",
                    index, name, self.region_field
                ))
            })?;
            let shape_area = numeric_field(&record, FIELD_SHAPE_AREA);

            areas.push(PlanningArea::new(name, region, shape_area, geometry));
        }

        BoundaryDataset::from_areas(areas)
    }
}

impl Default for BoundaryReader {
    fn default() -> Self {
        Self::new()
    }
}

fn text_field(record: &Record, name: &str) -> Option<String> {
    match record.get(name) {
        Some(FieldValue::Character(Some(value))) => {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        _ => None,
    }
}

fn numeric_field(record: &Record, name: &str) -> Option<f64> {
    match record.get(name) {
        Some(FieldValue::Numeric(value)) => *value,
        Some(FieldValue::Double(value)) => Some(*value),
        Some(FieldValue::Float(value)) => value.map(f64::from),
        _ => None,
    }
}

fn shape_to_multipolygon(shape: Shape) -> Option<MultiPolygon<f64>> {
    let rings: Vec<(bool, LineString<f64>)> = match shape {
        Shape::Polygon(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| ring_to_line_string(ring, |p| (p.x, p.y)))
            .collect(),
        Shape::PolygonZ(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| ring_to_line_string(ring, |p| (p.x, p.y)))
            .collect(),
        Shape::PolygonM(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| ring_to_line_string(ring, |p| (p.x, p.y)))
            .collect(),
        _ => return None,
    };

    Some(assemble_polygons(rings))
}

fn ring_to_line_string<P>(ring: &PolygonRing<P>, xy: impl Fn(&P) -> (f64, f64)) -> (bool, LineString<f64>) {
    let (is_outer, points) = match ring {
        PolygonRing::Outer(points) => (true, points),
        PolygonRing::Inner(points) => (false, points),
    };
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|p| {
            let (x, y) = xy(p);
            Coord { x, y }
        })
        .collect();
    (is_outer, LineString::new(coords))
}

/// Group rings into polygons: each outer ring owns the inner rings that follow it
pub(crate) fn assemble_polygons(rings: Vec<(bool, LineString<f64>)>) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for (is_outer, ring) in rings {
        match (is_outer, polygons.last_mut()) {
            (false, Some((_, holes))) => holes.push(ring),
            // An inner ring with no preceding outer ring is treated as an outer ring
            _ => polygons.push((ring, Vec::new())),
        }
    }

    MultiPolygon::new(
        polygons
            .into_iter()
            .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
            .collect(),
    )
}
