use crate::config::MapConfig;
use crate::geometry::BoundingBox;
use crate::viewport::ViewportSnapshot;

/// Container-relative tooltip position. Recomputed on every hover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPlacement {
    pub left: f64,
    pub top: f64,
    /// Flipped under the region because the default spot would clip.
    pub below: bool,
}

/// Centre the tooltip above the region's top edge, or flip it below the
/// region's bottom edge when it would clip past the chrome above the map.
pub fn place_tooltip(
    bbox: &BoundingBox,
    snapshot: &ViewportSnapshot,
    tooltip_size: (f64, f64),
    cfg: &MapConfig,
) -> TooltipPlacement {
    let (width, height) = tooltip_size;
    let gap = cfg.tooltip_gap_px;
    let container = &snapshot.container;

    let anchor = snapshot.transform.local_to_screen(bbox.top_center());
    let left = anchor.x - container.left - width / 2.0;
    let top = anchor.y - container.top - height - gap;
    let screen_top_edge = anchor.y - height - gap;

    if screen_top_edge < cfg.min_visible_top_px || top < 0.0 {
        let bottom = snapshot.transform.local_to_screen(bbox.bottom_center());
        TooltipPlacement {
            left,
            top: bottom.y - container.top + gap,
            below: true,
        }
    } else {
        TooltipPlacement {
            left,
            top,
            below: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenRect;
    use crate::transform::ScreenTransform;

    fn snapshot(scale: f64, container_top: f64) -> ViewportSnapshot {
        ViewportSnapshot {
            transform: ScreenTransform::scale_translate(scale, 0.0, container_top),
            container: ScreenRect::new(0.0, container_top, 1000.0, 800.0),
        }
    }

    #[test]
    fn sits_above_region_when_room() {
        let bbox = BoundingBox::new(100.0, 300.0, 80.0, 40.0);
        let p = place_tooltip(&bbox, &snapshot(1.0, 0.0), (60.0, 20.0), &MapConfig::default());
        assert!(!p.below);
        assert_eq!(p.left, 140.0 - 30.0);
        assert_eq!(p.top, 300.0 - 20.0 - 15.0);
    }

    #[test]
    fn flips_below_when_top_edge_crosses_min_visible_offset() {
        // anchor y = 100; 100 - 20 - 15 = 65 < 80
        let bbox = BoundingBox::new(100.0, 100.0, 80.0, 40.0);
        let p = place_tooltip(&bbox, &snapshot(1.0, 0.0), (60.0, 20.0), &MapConfig::default());
        assert!(p.below);
        assert_eq!(p.top, 140.0 + 15.0);
    }

    #[test]
    fn flip_uses_transformed_bottom_edge() {
        let bbox = BoundingBox::new(10.0, 20.0, 40.0, 30.0);
        let snap = snapshot(2.0, 0.0);
        let p = place_tooltip(&bbox, &snap, (60.0, 20.0), &MapConfig::default());
        assert!(p.below);
        // bottom in screen space = (20 + 30) * 2
        assert_eq!(p.top, 100.0 + 15.0);
        assert_eq!(p.left, 60.0 - 30.0);
    }

    #[test]
    fn flips_when_container_relative_top_goes_negative() {
        // Screen top edge is fine (300 - 35 = 265 >= 80), but the container
        // starts lower than the anchor.
        let snap = ViewportSnapshot {
            transform: ScreenTransform::identity(),
            container: ScreenRect::new(0.0, 290.0, 1000.0, 800.0),
        };
        let bbox = BoundingBox::new(0.0, 300.0, 100.0, 50.0);
        let p = place_tooltip(&bbox, &snap, (60.0, 20.0), &MapConfig::default());
        assert!(p.below);
        assert_eq!(p.top, 350.0 - 290.0 + 15.0);
    }
}
