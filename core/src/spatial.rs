use std::collections::HashMap;

use crate::geometry::{BoundingBox, Point};
use crate::region::RegionCatalog;

/// One region-tagged shape as found in the mounted map document.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub region_id: String,
    pub bbox: BoundingBox,
}

impl ShapeRecord {
    pub fn new(region_id: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            region_id: region_id.into(),
            bbox,
        }
    }
}

/// Anything that can enumerate the region shapes of a mounted vector map, in
/// document order.
pub trait MapDocument {
    fn region_shapes(&self) -> Vec<ShapeRecord>;
}

impl MapDocument for [ShapeRecord] {
    fn region_shapes(&self) -> Vec<ShapeRecord> {
        self.to_vec()
    }
}

impl MapDocument for Vec<ShapeRecord> {
    fn region_shapes(&self) -> Vec<ShapeRecord> {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionLabel {
    pub region_id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Per-mount cache of region bounding boxes in shape-local coordinates.
/// Rebuilt on every mount, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    order: Vec<String>,
    boxes: HashMap<String, BoundingBox>,
}

impl SpatialIndex {
    pub fn build<D: MapDocument + ?Sized>(document: &D) -> Self {
        let shapes = document.region_shapes();
        let mut order = Vec::with_capacity(shapes.len());
        let mut boxes = HashMap::with_capacity(shapes.len());
        let mut duplicates = 0usize;

        for shape in shapes {
            if boxes.contains_key(&shape.region_id) {
                // First occurrence stays authoritative; the asset needs fixing.
                tracing::warn!(region = %shape.region_id, "duplicate region shape in map asset");
                duplicates += 1;
                continue;
            }
            order.push(shape.region_id.clone());
            boxes.insert(shape.region_id, shape.bbox);
        }

        tracing::info!(
            regions = order.len(),
            duplicates,
            "spatial index built"
        );

        Self { order, boxes }
    }

    pub fn bbox(&self, region_id: &str) -> Option<BoundingBox> {
        self.boxes.get(region_id).copied()
    }

    /// Anchor for the static text label: the bbox centre.
    pub fn label_anchor(&self, region_id: &str) -> Option<Point> {
        self.bbox(region_id).map(|b| b.center())
    }

    pub fn labels(&self, catalog: &RegionCatalog) -> Vec<RegionLabel> {
        self.order
            .iter()
            .filter_map(|id| {
                let anchor = self.label_anchor(id)?;
                Some(RegionLabel {
                    region_id: id.clone(),
                    text: catalog.display_name(id).to_string(),
                    x: anchor.x,
                    y: anchor.y,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
