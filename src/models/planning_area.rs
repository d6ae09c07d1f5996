use crate::error::{ProcessingError, Result};
use crate::utils::constants::NOT_SPECIFIED;
use geo::{BoundingRect, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A planning area read from the boundary layer
#[derive(Debug, Clone)]
pub struct PlanningArea {
    pub name: String,
    pub region: String,
    pub shape_area: Option<f64>,
    pub geometry: MultiPolygon<f64>,
}

impl PlanningArea {
    pub fn new(
        name: String,
        region: String,
        shape_area: Option<f64>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            region: region.trim().to_uppercase(),
            shape_area,
            geometry,
        }
    }
}

/// All planning areas in boundary-file order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct BoundaryDataset {
    areas: Vec<PlanningArea>,
    index: HashMap<String, usize>,
}

impl BoundaryDataset {
    pub fn from_areas(areas: Vec<PlanningArea>) -> Result<Self> {
        let mut index = HashMap::with_capacity(areas.len());
        for (i, area) in areas.iter().enumerate() {
            if area.name.is_empty() || area.name == NOT_SPECIFIED {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Boundary feature {} has no usable planning area name",
                    i
                )));
            }
            if index.insert(area.name.clone(), i).is_some() {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Duplicate planning area '{}' in boundary data",
                    area.name
                )));
            }
        }

        Ok(Self { areas, index })
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn areas(&self) -> &[PlanningArea] {
        &self.areas
    }

    pub fn get(&self, name: &str) -> Option<&PlanningArea> {
        self.index.get(name).map(|&i| &self.areas[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn region_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|a| a.region.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|a| a.name.as_str())
    }

    /// Distinct regions, sorted
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.areas.iter().map(|a| a.region.as_str()).collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    /// Bounding box over every area, in the layer's native coordinates
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.areas
            .iter()
            .filter_map(|a| a.geometry.bounding_rect())
            .reduce(|acc, r| {
                Rect::new(
                    (acc.min().x.min(r.min().x), acc.min().y.min(r.min().y)),
                    (acc.max().x.max(r.max().x), acc.max().y.max(r.max().y)),
                )
            })
    }
}

/// Per-area aggregates joined onto the boundary layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub name: String,
    pub region: String,
    pub total_capacity_kwp: Option<f64>,
    pub mean_system_kwp: Option<f64>,
    pub system_count: usize,
}

impl AreaSummary {
    pub fn empty(name: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            total_capacity_kwp: None,
            mean_system_kwp: None,
            system_count: 0,
        }
    }

    pub fn has_systems(&self) -> bool {
        self.system_count > 0
    }
}
