use std::cell::Cell;
use std::rc::Rc;

use crate::config::MapConfig;
use crate::geometry::Point;
use crate::region::{MapMode, RegionCatalog};
use crate::spatial::SpatialIndex;
use crate::tooltip::{TooltipPlacement, place_tooltip};
use crate::viewport::{ViewportSource, ViewportTransformCache};

/// Visual side effects the controller drives on the host surface.
pub trait MapSurface {
    fn apply_highlight(&self, region_id: &str, fill: &str, filter: &str);
    fn restore_default(&self, region_id: &str, fill: &str);
    /// Set the tooltip text and make it measurable. Returns its rendered
    /// `(width, height)`, or `None` when the tooltip element is gone.
    fn show_tooltip(&self, text: &str) -> Option<(f64, f64)>;
    fn position_tooltip(&self, placement: &TooltipPlacement);
    fn hide_tooltip(&self);
}

/// External "is the user logged in" predicate. Read at decision time only.
pub trait SessionOracle {
    fn is_authenticated(&self) -> bool;
}

impl<F: Fn() -> bool> SessionOracle for F {
    fn is_authenticated(&self) -> bool {
        self()
    }
}

/// A node in the host's element tree that may carry a region identifier.
pub trait TaggedNode: Sized {
    fn region_tag(&self) -> Option<String>;
    fn parent(&self) -> Option<Self>;
}

/// Region id of `node` or its nearest tagged ancestor.
pub fn nearest_region<N: TaggedNode>(node: &N) -> Option<String> {
    if let Some(tag) = node.region_tag() {
        return Some(tag);
    }
    let mut current = node.parent();
    while let Some(node) = current {
        if let Some(tag) = node.region_tag() {
            return Some(tag);
        }
        current = node.parent();
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEventKind {
    Enter,
    Leave,
    Click,
}

/// One delegated pointer event, already resolved to a region.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceEvent {
    pub kind: SurfaceEventKind,
    pub region: Option<String>,
    /// Pointer position in client (viewport) pixels.
    pub client: Point,
}

impl SurfaceEvent {
    pub fn resolve<N: TaggedNode>(kind: SurfaceEventKind, target: &N, client: Point) -> Self {
        Self {
            kind,
            region: nearest_region(target),
            client,
        }
    }
}

/// What the host should open in response to a click.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Nothing,
    OpenRegionDetails { region_id: String },
    RequireAuth { region_id: String },
    BeginPinCreation { region_id: String, position: Point },
}

/// Per-mount interaction state: hover, geometry caches, mode.
#[derive(Debug, Clone)]
pub struct MapInteractionSession {
    catalog: RegionCatalog,
    index: SpatialIndex,
    viewport: ViewportTransformCache,
    hovered: Option<String>,
    mode: MapMode,
    cfg: MapConfig,
}

impl MapInteractionSession {
    pub fn new(catalog: RegionCatalog, index: SpatialIndex, mode: MapMode, cfg: MapConfig) -> Self {
        let viewport = ViewportTransformCache::new(cfg.resize_debounce_ms);
        Self {
            catalog,
            index,
            viewport,
            hovered: None,
            mode,
            cfg,
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn viewport(&self) -> &ViewportTransformCache {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportTransformCache {
        &mut self.viewport
    }

    pub fn refresh_viewport<V: ViewportSource + ?Sized>(&mut self, source: &V) {
        self.viewport.refresh(source);
    }

    pub fn pointer_enter<S: MapSurface + ?Sized>(&mut self, region_id: &str, surface: &S) {
        if let Some(previous) = self.hovered.take() {
            if previous != region_id {
                surface.restore_default(&previous, self.catalog.default_fill(&previous, self.mode));
            }
        }
        self.hovered = Some(region_id.to_string());
        surface.apply_highlight(region_id, &self.cfg.highlight_fill, &self.cfg.highlight_filter);

        if !self.catalog.contains(region_id) {
            tracing::warn!(region = region_id, "shape has no catalog entry");
        }

        let (Some(bbox), Some(snapshot)) = (self.index.bbox(region_id), self.viewport.current())
        else {
            tracing::debug!(region = region_id, "viewport not ready; tooltip skipped");
            surface.hide_tooltip();
            return;
        };
        let Some(size) = surface.show_tooltip(self.catalog.display_name(region_id)) else {
            return;
        };
        let placement = place_tooltip(&bbox, snapshot, size, &self.cfg);
        surface.position_tooltip(&placement);
    }

    pub fn pointer_leave<S: MapSurface + ?Sized>(&mut self, region_id: &str, surface: &S) {
        surface.restore_default(region_id, self.catalog.default_fill(region_id, self.mode));
        // A late leave for a region already replaced by another hover keeps
        // the current tooltip.
        if self.hovered.as_deref() == Some(region_id) {
            self.hovered = None;
            surface.hide_tooltip();
        }
    }

    /// Decide what a click on `region_id` opens. The session oracle is read
    /// here and nowhere else.
    pub fn click<O: SessionOracle + ?Sized>(
        &self,
        region_id: &str,
        client: Point,
        oracle: &O,
    ) -> InteractionOutcome {
        let region_id = region_id.to_string();
        match self.mode {
            MapMode::Discover => InteractionOutcome::OpenRegionDetails { region_id },
            MapMode::Adventures => {
                if !oracle.is_authenticated() {
                    return InteractionOutcome::RequireAuth { region_id };
                }
                match self.local_click_point(&region_id, client) {
                    Some(position) => InteractionOutcome::BeginPinCreation {
                        region_id,
                        position,
                    },
                    None => {
                        tracing::warn!(region = %region_id, "click on unindexed region ignored");
                        InteractionOutcome::Nothing
                    }
                }
            }
        }
    }

    fn local_click_point(&self, region_id: &str, client: Point) -> Option<Point> {
        self.viewport
            .current()
            .and_then(|snapshot| snapshot.unproject_client(client))
            .or_else(|| {
                tracing::debug!(region = region_id, "no inverse transform; using bbox centre");
                self.index.bbox(region_id).map(|bbox| bbox.center())
            })
    }

    pub fn handle<S, O>(&mut self, event: &SurfaceEvent, surface: &S, oracle: &O) -> InteractionOutcome
    where
        S: MapSurface + ?Sized,
        O: SessionOracle + ?Sized,
    {
        let Some(region_id) = event.region.as_deref() else {
            return InteractionOutcome::Nothing;
        };
        let outcome = match event.kind {
            SurfaceEventKind::Enter => {
                self.pointer_enter(region_id, surface);
                InteractionOutcome::Nothing
            }
            SurfaceEventKind::Leave => {
                self.pointer_leave(region_id, surface);
                InteractionOutcome::Nothing
            }
            SurfaceEventKind::Click => self.click(region_id, event.client, oracle),
        };
        if outcome != InteractionOutcome::Nothing {
            tracing::debug!(?outcome, "map click");
        }
        outcome
    }

    /// Drop hover state without touching the surface (surface already gone).
    pub fn reset_hover(&mut self) {
        self.hovered = None;
    }
}

/// Counter bumped on every mount and teardown. Async mount continuations
/// hold a token and must check it before touching the surface.
#[derive(Debug, Clone, Default)]
pub struct MountGeneration(Rc<Cell<u64>>);

impl MountGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> MountToken {
        let id = self.0.get() + 1;
        self.0.set(id);
        MountToken {
            generation: self.0.clone(),
            id,
        }
    }

    pub fn teardown(&self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Debug, Clone)]
pub struct MountToken {
    generation: Rc<Cell<u64>>,
    id: u64,
}

impl MountToken {
    pub fn is_current(&self) -> bool {
        self.generation.get() == self.id
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::geometry::{BoundingBox, ScreenRect};
    use crate::spatial::ShapeRecord;
    use crate::transform::ScreenTransform;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Highlight(String),
        Restore(String, String),
        Show(String),
        Position(TooltipPlacement),
        Hide,
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: RefCell<Vec<Call>>,
        highlighted: RefCell<Vec<String>>,
        max_highlighted: Cell<usize>,
    }

    impl MapSurface for RecordingSurface {
        fn apply_highlight(&self, region_id: &str, _fill: &str, _filter: &str) {
            let mut lit = self.highlighted.borrow_mut();
            if !lit.iter().any(|r| r == region_id) {
                lit.push(region_id.to_string());
            }
            self.max_highlighted.set(self.max_highlighted.get().max(lit.len()));
            self.calls.borrow_mut().push(Call::Highlight(region_id.to_string()));
        }

        fn restore_default(&self, region_id: &str, fill: &str) {
            self.highlighted.borrow_mut().retain(|r| r != region_id);
            self.calls
                .borrow_mut()
                .push(Call::Restore(region_id.to_string(), fill.to_string()));
        }

        fn show_tooltip(&self, text: &str) -> Option<(f64, f64)> {
            self.calls.borrow_mut().push(Call::Show(text.to_string()));
            Some((60.0, 20.0))
        }

        fn position_tooltip(&self, placement: &TooltipPlacement) {
            self.calls.borrow_mut().push(Call::Position(*placement));
        }

        fn hide_tooltip(&self) {
            self.calls.borrow_mut().push(Call::Hide);
        }
    }

    struct FixedViewport;

    impl ViewportSource for FixedViewport {
        fn screen_transform(&self) -> Option<ScreenTransform> {
            Some(ScreenTransform::scale_translate(2.0, 100.0, 100.0))
        }

        fn container_rect(&self) -> Option<ScreenRect> {
            Some(ScreenRect::new(100.0, 100.0, 1000.0, 800.0))
        }
    }

    fn session(mode: MapMode) -> MapInteractionSession {
        let shapes = vec![
            ShapeRecord::new("Kyivska", BoundingBox::new(200.0, 100.0, 60.0, 50.0)),
            ShapeRecord::new("Odeska", BoundingBox::new(180.0, 300.0, 70.0, 60.0)),
            ShapeRecord::new("Lvivska", BoundingBox::new(20.0, 120.0, 50.0, 40.0)),
            ShapeRecord::new("Mystery", BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
        ];
        MapInteractionSession::new(
            RegionCatalog::ukraine(),
            SpatialIndex::build(&shapes),
            mode,
            MapConfig::default(),
        )
    }

    fn logged_in() -> bool {
        true
    }

    fn logged_out() -> bool {
        false
    }

    struct Node {
        tag: Option<&'static str>,
        parent: Option<Box<Node>>,
    }

    impl TaggedNode for &Node {
        fn region_tag(&self) -> Option<String> {
            self.tag.map(str::to_string)
        }

        fn parent(&self) -> Option<Self> {
            self.parent.as_deref()
        }
    }

    #[test]
    fn nearest_region_walks_up_to_tagged_ancestor() {
        let path = Node {
            tag: Some("Sumska"),
            parent: None,
        };
        let tspan = Node {
            tag: None,
            parent: Some(Box::new(Node {
                tag: None,
                parent: Some(Box::new(path)),
            })),
        };
        assert_eq!(nearest_region(&&tspan), Some("Sumska".to_string()));
        let orphan = Node {
            tag: None,
            parent: None,
        };
        assert_eq!(nearest_region(&&orphan), None);
    }

    #[test]
    fn switching_hover_resets_previous_region_first() {
        let mut s = session(MapMode::Discover);
        let surface = RecordingSurface::default();
        s.refresh_viewport(&FixedViewport);
        s.pointer_enter("Kyivska", &surface);
        surface.calls.borrow_mut().clear();

        s.pointer_enter("Odeska", &surface);
        let calls = surface.calls.borrow();
        let kyiv_fill = RegionCatalog::ukraine()
            .default_fill("Kyivska", MapMode::Discover)
            .to_string();
        assert_eq!(calls[0], Call::Restore("Kyivska".to_string(), kyiv_fill));
        assert_eq!(calls[1], Call::Highlight("Odeska".to_string()));
        assert_eq!(s.hovered(), Some("Odeska"));
    }

    #[test]
    fn at_most_one_region_highlighted_over_any_sequence() {
        let mut s = session(MapMode::Adventures);
        let surface = RecordingSurface::default();
        let ids = ["Kyivska", "Odeska", "Lvivska", "Mystery"];
        for step in 0..40usize {
            let id = ids[(step * 7 + 3) % ids.len()];
            if step % 3 == 2 {
                s.pointer_leave(id, &surface);
            } else {
                s.pointer_enter(id, &surface);
            }
            assert!(surface.highlighted.borrow().len() <= 1, "step {step}");
        }
        assert_eq!(surface.max_highlighted.get(), 1);
    }

    #[test]
    fn leave_clears_hover_and_hides_tooltip() {
        let mut s = session(MapMode::Discover);
        let surface = RecordingSurface::default();
        s.pointer_enter("Lvivska", &surface);
        s.pointer_leave("Lvivska", &surface);
        assert_eq!(s.hovered(), None);
        assert_eq!(surface.calls.borrow().last(), Some(&Call::Hide));
    }

    #[test]
    fn late_leave_of_previous_region_keeps_current_tooltip() {
        let mut s = session(MapMode::Discover);
        let surface = RecordingSurface::default();
        s.refresh_viewport(&FixedViewport);
        s.pointer_enter("Kyivska", &surface);
        s.pointer_enter("Odeska", &surface);
        surface.calls.borrow_mut().clear();

        s.pointer_leave("Kyivska", &surface);
        assert_eq!(s.hovered(), Some("Odeska"));
        assert!(!surface.calls.borrow().contains(&Call::Hide));
        assert_eq!(*surface.highlighted.borrow(), vec!["Odeska".to_string()]);
    }

    #[test]
    fn hover_before_viewport_ready_skips_tooltip_silently() {
        let mut s = session(MapMode::Discover);
        let surface = RecordingSurface::default();
        s.pointer_enter("Kyivska", &surface);
        let calls = surface.calls.borrow();
        assert_eq!(s.hovered(), Some("Kyivska"));
        assert!(calls.contains(&Call::Highlight("Kyivska".to_string())));
        assert!(!calls.iter().any(|c| matches!(c, Call::Show(_) | Call::Position(_))));
    }

    #[test]
    fn hover_shows_display_name_and_positions_tooltip() {
        let mut s = session(MapMode::Discover);
        let surface = RecordingSurface::default();
        s.refresh_viewport(&FixedViewport);
        s.pointer_enter("Odeska", &surface);
        let calls = surface.calls.borrow();
        assert!(calls.contains(&Call::Show("Odesa".to_string())));
        // top centre (215, 300) -> screen (530, 700) -> container (430, 600)
        let expected = TooltipPlacement {
            left: 430.0 - 30.0,
            top: 600.0 - 20.0 - 15.0,
            below: false,
        };
        assert_eq!(calls.last(), Some(&Call::Position(expected)));
    }

    #[test]
    fn unknown_region_uses_raw_identifier() {
        let mut s = session(MapMode::Discover);
        let surface = RecordingSurface::default();
        s.refresh_viewport(&FixedViewport);
        s.pointer_enter("Mystery", &surface);
        assert!(surface.calls.borrow().contains(&Call::Show("Mystery".to_string())));
    }

    #[test]
    fn discover_click_opens_region_details() {
        let s = session(MapMode::Discover);
        let outcome = s.click("Kyivska", Point::new(0.0, 0.0), &logged_out);
        assert_eq!(
            outcome,
            InteractionOutcome::OpenRegionDetails {
                region_id: "Kyivska".to_string()
            }
        );
    }

    #[test]
    fn logged_out_adventure_click_requires_auth() {
        let mut s = session(MapMode::Adventures);
        let surface = RecordingSurface::default();
        let event = SurfaceEvent {
            kind: SurfaceEventKind::Click,
            region: Some("Lvivska".to_string()),
            client: Point::new(160.0, 360.0),
        };
        let outcome = s.handle(&event, &surface, &logged_out);
        assert_eq!(
            outcome,
            InteractionOutcome::RequireAuth {
                region_id: "Lvivska".to_string()
            }
        );
    }

    #[test]
    fn session_state_is_read_at_click_time() {
        let s = session(MapMode::Adventures);
        let logged = Cell::new(false);
        let oracle = || logged.get();
        assert!(matches!(
            s.click("Lvivska", Point::new(0.0, 0.0), &oracle),
            InteractionOutcome::RequireAuth { .. }
        ));
        logged.set(true);
        assert!(matches!(
            s.click("Lvivska", Point::new(0.0, 0.0), &oracle),
            InteractionOutcome::BeginPinCreation { .. }
        ));
    }

    #[test]
    fn pin_click_is_inverse_transformed_to_local_space() {
        let mut s = session(MapMode::Adventures);
        s.refresh_viewport(&FixedViewport);
        let outcome = s.click("Lvivska", Point::new(160.0, 360.0), &logged_in);
        assert_eq!(
            outcome,
            InteractionOutcome::BeginPinCreation {
                region_id: "Lvivska".to_string(),
                position: Point::new(30.0, 130.0),
            }
        );
    }

    #[test]
    fn pin_click_before_viewport_ready_falls_back_to_bbox_centre() {
        let s = session(MapMode::Adventures);
        let outcome = s.click("Lvivska", Point::new(160.0, 360.0), &logged_in);
        assert_eq!(
            outcome,
            InteractionOutcome::BeginPinCreation {
                region_id: "Lvivska".to_string(),
                position: Point::new(45.0, 140.0),
            }
        );
    }

    #[test]
    fn events_outside_regions_are_ignored() {
        let mut s = session(MapMode::Adventures);
        let surface = RecordingSurface::default();
        let event = SurfaceEvent {
            kind: SurfaceEventKind::Enter,
            region: None,
            client: Point::default(),
        };
        assert_eq!(s.handle(&event, &surface, &logged_in), InteractionOutcome::Nothing);
        assert!(surface.calls.borrow().is_empty());
    }

    #[test]
    fn teardown_invalidates_outstanding_tokens() {
        let generation = MountGeneration::new();
        let first = generation.begin();
        assert!(first.is_current());
        let second = generation.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        generation.teardown();
        assert!(!second.is_current());
    }
}
