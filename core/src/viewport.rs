use crate::geometry::{Point, ScreenRect};
use crate::timing::Debouncer;
use crate::transform::ScreenTransform;

/// Host surface that can report its current layout.
pub trait ViewportSource {
    /// `getScreenCTM()` of the map surface; `None` while it is not laid out.
    fn screen_transform(&self) -> Option<ScreenTransform>;
    /// `getBoundingClientRect()` of the container overlays are positioned in.
    fn container_rect(&self) -> Option<ScreenRect>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub transform: ScreenTransform,
    pub container: ScreenRect,
}

impl ViewportSnapshot {
    /// Shape-local point to container-relative pixels, plus the container's
    /// scroll offset for content that scrolls with the map.
    pub fn project(&self, local: Point, scroll: Point) -> Point {
        let screen = self.transform.local_to_screen(local);
        self.container.relative(screen).offset(scroll.x, scroll.y)
    }

    /// Client (viewport) coordinates back to shape-local coordinates.
    pub fn unproject_client(&self, client: Point) -> Option<Point> {
        self.transform.screen_to_local(client)
    }
}

/// Caches the surface's screen transform and container rect. The snapshot is
/// replaced wholesale on refresh; resize bursts are debounced.
#[derive(Debug, Clone)]
pub struct ViewportTransformCache {
    current: Option<ViewportSnapshot>,
    resize: Debouncer,
}

impl ViewportTransformCache {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            current: None,
            resize: Debouncer::new(debounce_ms),
        }
    }

    /// `None` until the first successful refresh; callers skip positioning.
    pub fn current(&self) -> Option<&ViewportSnapshot> {
        self.current.as_ref()
    }

    pub fn refresh<S: ViewportSource + ?Sized>(&mut self, source: &S) {
        match (source.screen_transform(), source.container_rect()) {
            (Some(transform), Some(container)) => {
                self.current = Some(ViewportSnapshot {
                    transform,
                    container,
                });
            }
            _ => {
                tracing::debug!("viewport not laid out; transform cache left unset");
            }
        }
    }

    pub fn on_resize(&mut self, now_ms: f64) {
        self.resize.schedule(now_ms);
    }

    /// Refresh if a resize burst has gone quiet. Returns whether it refreshed.
    pub fn flush<S: ViewportSource + ?Sized>(&mut self, now_ms: f64, source: &S) -> bool {
        if self.resize.fire(now_ms) {
            self.refresh(source);
            true
        } else {
            false
        }
    }

    pub fn resize_pending(&self) -> bool {
        self.resize.is_pending()
    }

    pub fn debounce_ms(&self) -> f64 {
        self.resize.wait_ms()
    }

}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct FakeSurface {
        scale: Cell<f64>,
        laid_out: bool,
        reads: Cell<u32>,
    }

    impl FakeSurface {
        fn new(scale: f64) -> Self {
            Self {
                scale: Cell::new(scale),
                laid_out: true,
                reads: Cell::new(0),
            }
        }
    }

    impl ViewportSource for FakeSurface {
        fn screen_transform(&self) -> Option<ScreenTransform> {
            self.reads.set(self.reads.get() + 1);
            self.laid_out
                .then(|| ScreenTransform::scale_translate(self.scale.get(), 0.0, 0.0))
        }

        fn container_rect(&self) -> Option<ScreenRect> {
            self.laid_out
                .then_some(ScreenRect::new(0.0, 0.0, 800.0, 600.0))
        }
    }

    #[test]
    fn unset_before_first_refresh() {
        let cache = ViewportTransformCache::new(100.0);
        assert!(cache.current().is_none());
    }

    #[test]
    fn unlaid_surface_leaves_cache_unset() {
        let surface = FakeSurface {
            laid_out: false,
            ..FakeSurface::new(1.0)
        };
        let mut cache = ViewportTransformCache::new(100.0);
        cache.refresh(&surface);
        assert!(cache.current().is_none());
    }

    #[test]
    fn resize_burst_triggers_exactly_one_recomputation() {
        let surface = FakeSurface::new(1.0);
        let mut cache = ViewportTransformCache::new(100.0);
        let mut refreshed = 0;
        for i in 0..10 {
            let now = i as f64 * 8.0;
            cache.on_resize(now);
            if cache.flush(now, &surface) {
                refreshed += 1;
            }
        }
        surface.scale.set(2.0);
        for now in [100.0, 150.0, 172.0, 250.0, 400.0] {
            if cache.flush(now, &surface) {
                refreshed += 1;
            }
        }
        assert_eq!(refreshed, 1);
        assert_eq!(surface.reads.get(), 1);
        let snapshot = cache.current().expect("refreshed");
        assert_eq!(snapshot.transform.a, 2.0);
    }

    #[test]
    fn refresh_replaces_snapshot() {
        let surface = FakeSurface::new(1.0);
        let mut cache = ViewportTransformCache::new(100.0);
        cache.refresh(&surface);
        let before = *cache.current().expect("ready");
        surface.scale.set(3.0);
        cache.refresh(&surface);
        assert_eq!(before.transform.a, 1.0);
        assert_eq!(cache.current().map(|s| s.transform.a), Some(3.0));
        assert_eq!(surface.reads.get(), 2);
    }

    #[test]
    fn project_adds_scroll_offset() {
        let snapshot = ViewportSnapshot {
            transform: ScreenTransform::scale_translate(2.0, 110.0, 60.0),
            container: ScreenRect::new(100.0, 50.0, 800.0, 600.0),
        };
        let p = snapshot.project(Point::new(5.0, 5.0), Point::new(0.0, 40.0));
        assert_eq!(p, Point::new(20.0, 60.0));
    }
}
