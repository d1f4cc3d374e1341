use std::collections::HashMap;

use oblast_map_core::config::REGION_ATTRIBUTE;
use oblast_map_core::{
    BoundingBox, MapDocument, MapMode, MapSurface, Point, RegionCatalog, ScreenRect,
    ScreenTransform, ShapeRecord, TaggedNode, TooltipPlacement, ViewportSource,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, SvgGraphicsElement, SvgsvgElement};

/// DOM element as seen by event delegation. Only `path[name]` elements carry
/// a region tag; the walk stops at the map's `<svg>` root.
#[derive(Clone)]
pub struct DomNode(pub Element);

impl TaggedNode for DomNode {
    fn region_tag(&self) -> Option<String> {
        if self.0.tag_name().eq_ignore_ascii_case("path") {
            self.0.get_attribute(REGION_ATTRIBUTE)
        } else {
            None
        }
    }

    fn parent(&self) -> Option<Self> {
        if self.0.tag_name().eq_ignore_ascii_case("svg") {
            return None;
        }
        self.0.parent_element().map(DomNode)
    }
}

/// The mounted map: `<svg>` root, the container overlays are positioned in,
/// and the tooltip element.
pub struct DomSurface {
    svg: SvgsvgElement,
    container: HtmlElement,
    tooltip: HtmlElement,
    /// Region shapes in document order, duplicates included.
    shapes: Vec<(String, SvgGraphicsElement)>,
    /// First shape per region id.
    paths: HashMap<String, SvgGraphicsElement>,
}

impl DomSurface {
    pub fn new(svg: SvgsvgElement, container: HtmlElement, tooltip: HtmlElement) -> Self {
        let mut shapes = Vec::new();
        let mut paths = HashMap::new();
        if let Ok(list) = svg.query_selector_all(&format!("path[{REGION_ATTRIBUTE}]")) {
            for i in 0..list.length() {
                let Some(path) = list
                    .item(i)
                    .and_then(|node| node.dyn_into::<SvgGraphicsElement>().ok())
                else {
                    continue;
                };
                let Some(id) = path.get_attribute(REGION_ATTRIBUTE) else {
                    continue;
                };
                paths.entry(id.clone()).or_insert_with(|| path.clone());
                shapes.push((id, path));
            }
        }
        Self {
            svg,
            container,
            tooltip,
            shapes,
            paths,
        }
    }

    /// Paint every shape with its resting fill for `mode`.
    pub fn paint_defaults(&self, catalog: &RegionCatalog, mode: MapMode) {
        for (id, path) in &self.shapes {
            let style = path.style();
            let _ = style.set_property("fill", catalog.default_fill(id, mode));
            let _ = style.set_property("cursor", "pointer");
        }
    }

    pub fn scroll_offset(&self) -> Point {
        Point::new(
            self.container.scroll_left() as f64,
            self.container.scroll_top() as f64,
        )
    }

    fn set_path_style(&self, region_id: &str, fill: &str, filter: &str) {
        let Some(path) = self.paths.get(region_id) else {
            return;
        };
        let style = path.style();
        let _ = style.set_property("fill", fill);
        let _ = style.set_property("filter", filter);
    }
}

impl MapSurface for DomSurface {
    fn apply_highlight(&self, region_id: &str, fill: &str, filter: &str) {
        self.set_path_style(region_id, fill, filter);
    }

    fn restore_default(&self, region_id: &str, fill: &str) {
        self.set_path_style(region_id, fill, "none");
    }

    fn show_tooltip(&self, text: &str) -> Option<(f64, f64)> {
        if !self.tooltip.is_connected() {
            return None;
        }
        self.tooltip.set_text_content(Some(text));
        let style = self.tooltip.style();
        let _ = style.set_property("display", "block");
        let _ = style.set_property("white-space", "nowrap");
        let rect = self.tooltip.get_bounding_client_rect();
        Some((rect.width(), rect.height()))
    }

    fn position_tooltip(&self, placement: &TooltipPlacement) {
        let style = self.tooltip.style();
        let _ = style.set_property("left", &format!("{}px", placement.left));
        let _ = style.set_property("top", &format!("{}px", placement.top));
        let _ = self
            .tooltip
            .class_list()
            .toggle_with_force("tooltip-below", placement.below);
    }

    fn hide_tooltip(&self) {
        let _ = self.tooltip.style().set_property("display", "none");
    }
}

impl MapDocument for DomSurface {
    fn region_shapes(&self) -> Vec<ShapeRecord> {
        self.shapes
            .iter()
            .filter_map(|(id, path)| {
                let rect = path.get_b_box().ok()?;
                Some(ShapeRecord::new(
                    id.clone(),
                    BoundingBox::new(
                        rect.x() as f64,
                        rect.y() as f64,
                        rect.width() as f64,
                        rect.height() as f64,
                    ),
                ))
            })
            .collect()
    }
}

impl ViewportSource for DomSurface {
    fn screen_transform(&self) -> Option<ScreenTransform> {
        let m = self.svg.get_screen_ctm()?;
        Some(ScreenTransform {
            a: m.a() as f64,
            b: m.b() as f64,
            c: m.c() as f64,
            d: m.d() as f64,
            e: m.e() as f64,
            f: m.f() as f64,
        })
    }

    fn container_rect(&self) -> Option<ScreenRect> {
        let rect = self.container.get_bounding_client_rect();
        if rect.width() <= 0.0 && rect.height() <= 0.0 {
            return None;
        }
        Some(ScreenRect::new(
            rect.left(),
            rect.top(),
            rect.width(),
            rect.height(),
        ))
    }
}
