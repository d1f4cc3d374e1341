use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use oblast_map_core::pins::{CardSide, layout_cards, marker_positions, project_card};
use oblast_map_core::{
    InteractionOutcome, MapConfig, MapInteractionSession, MapMode, MountGeneration, MountToken,
    PinBoard, PinStatus, Point, RegionCatalog, RegionLabel, SpatialIndex, SurfaceEvent,
    SurfaceEventKind, ViewportSnapshot,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlElement, SvgsvgElement};

use crate::api::ApiClient;
use crate::assets;
use crate::app::{ActiveMode, ActiveModal, AlwaysShowLabels, Modal, Pins};
use crate::render_loop::FrameThrottle;
use crate::session;
use crate::surface::{DomNode, DomSurface};

/// Retry cadence while a resize flush fires before the quiet period ends.
const RESIZE_RETRY_MS: u32 = 16;

struct ResizeBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

impl ResizeBinding {
    fn install(signals: MapSignals) -> Option<Self> {
        let window = web_sys::window()?;
        let handler = Closure::<dyn Fn()>::new(move || on_resize(signals));
        window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .ok()?;
        Some(Self { window, handler })
    }
}

impl Drop for ResizeBinding {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.handler.as_ref().unchecked_ref());
    }
}

/// Everything owned by one mounted map. Dropped on remount and teardown.
struct MapBinding {
    session: MapInteractionSession,
    surface: DomSurface,
    scroll_throttle: FrameThrottle,
    _resize: Option<ResizeBinding>,
}

thread_local! {
    static MOUNT_GENERATION: MountGeneration = MountGeneration::new();
    static MAP_BINDING: RefCell<Option<MapBinding>> = const { RefCell::new(None) };
    static RESIZE_NONCE: Cell<u64> = const { Cell::new(0) };
}

fn with_binding<R>(f: impl FnOnce(&mut MapBinding) -> R) -> Option<R> {
    MAP_BINDING.with(|slot| slot.borrow_mut().as_mut().map(f))
}

fn teardown() {
    MOUNT_GENERATION.with(MountGeneration::teardown);
    let old = MAP_BINDING.with(|slot| slot.borrow_mut().take());
    if let Some(mut binding) = old {
        binding.session.reset_hover();
    }
}

#[derive(Clone, Debug, PartialEq)]
enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Per-view reactive state the overlays render from.
#[derive(Clone, Copy)]
struct MapSignals {
    snapshot: RwSignal<Option<ViewportSnapshot>>,
    scroll: RwSignal<Point>,
    hovered: RwSignal<Option<String>>,
    labels: RwSignal<Vec<RegionLabel>>,
    /// Viewport narrow enough to show labels without the toggle.
    compact: RwSignal<bool>,
    status: RwSignal<LoadStatus>,
}

impl MapSignals {
    fn new() -> Self {
        Self {
            snapshot: RwSignal::new(None),
            scroll: RwSignal::new(Point::default()),
            hovered: RwSignal::new(None),
            labels: RwSignal::new(Vec::new()),
            compact: RwSignal::new(false),
            status: RwSignal::new(LoadStatus::Loading),
        }
    }

    fn publish_viewport(&self, snapshot: Option<ViewportSnapshot>, scroll: Point) {
        self.snapshot.set(snapshot);
        self.scroll.set(scroll);
    }

    fn track_viewport_width(&self) {
        let Some(width) = web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|w| w.as_f64())
        else {
            return;
        };
        let compact = MapConfig::default().is_compact(width);
        if self.compact.get_untracked() != compact {
            self.compact.set(compact);
        }
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn viewport_state(binding: &MapBinding) -> (Option<ViewportSnapshot>, Point) {
    (
        binding.session.viewport().current().copied(),
        binding.surface.scroll_offset(),
    )
}

/// Elements the map is mounted into.
struct MountTargets {
    host: HtmlElement,
    container: HtmlElement,
    tooltip: HtmlElement,
}

/// Inject the markup and build the per-mount state. Returns label anchors
/// keyed by region id for placing pins that arrive without coordinates.
fn mount_map(
    markup: &str,
    mode: MapMode,
    targets: MountTargets,
    signals: MapSignals,
) -> Result<HashMap<String, Point>, String> {
    targets.host.set_inner_html(markup);
    let svg = targets
        .host
        .query_selector("svg")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<SvgsvgElement>().ok())
        .ok_or_else(|| "map markup has no <svg> root".to_string())?;

    let surface = DomSurface::new(svg, targets.container, targets.tooltip);
    let catalog = RegionCatalog::ukraine();
    surface.paint_defaults(&catalog, mode);

    let index = SpatialIndex::build(&surface);
    if index.is_empty() {
        return Err("map markup contains no region shapes".to_string());
    }
    for region in catalog.iter() {
        if index.bbox(&region.id).is_none() {
            tracing::warn!(region = %region.id, "region has no shape in the map markup");
        }
    }

    let labels = index.labels(&catalog);
    let anchors = labels
        .iter()
        .map(|label| (label.region_id.clone(), Point::new(label.x, label.y)))
        .collect();

    let mut session = MapInteractionSession::new(catalog, index, mode, MapConfig::default());
    session.refresh_viewport(&surface);

    let binding = MapBinding {
        session,
        surface,
        scroll_throttle: FrameThrottle::new(move || on_scroll_frame(signals)),
        _resize: ResizeBinding::install(signals),
    };
    let (snapshot, scroll) = viewport_state(&binding);
    let old = MAP_BINDING.with(|slot| slot.replace(Some(binding)));
    drop(old);

    signals.publish_viewport(snapshot, scroll);
    signals.labels.set(labels);
    signals.track_viewport_width();
    signals.hovered.set(None);
    signals.status.set(LoadStatus::Ready);
    tracing::info!(?mode, "map mounted");
    Ok(anchors)
}

fn on_scroll_frame(signals: MapSignals) {
    let Some((snapshot, scroll)) = with_binding(|b| {
        b.session.refresh_viewport(&b.surface);
        viewport_state(b)
    }) else {
        return;
    };
    signals.publish_viewport(snapshot, scroll);
}

enum FlushStep {
    Refreshed(Option<ViewportSnapshot>, Point),
    TooEarly,
    Done,
}

fn on_resize(signals: MapSignals) {
    signals.track_viewport_width();
    let now = now_ms();
    let Some(wait) = with_binding(|b| {
        b.session.viewport_mut().on_resize(now);
        b.session.viewport().debounce_ms()
    }) else {
        return;
    };
    let nonce = RESIZE_NONCE.with(|n| {
        n.set(n.get() + 1);
        n.get()
    });

    spawn_local(async move {
        TimeoutFuture::new(wait.ceil() as u32).await;
        loop {
            if RESIZE_NONCE.with(Cell::get) != nonce {
                return;
            }
            let now = now_ms();
            let step = with_binding(|b| {
                if b.session.viewport_mut().flush(now, &b.surface) {
                    let (snapshot, scroll) = viewport_state(b);
                    FlushStep::Refreshed(snapshot, scroll)
                } else if b.session.viewport().resize_pending() {
                    FlushStep::TooEarly
                } else {
                    FlushStep::Done
                }
            });
            match step {
                Some(FlushStep::Refreshed(snapshot, scroll)) => {
                    signals.publish_viewport(snapshot, scroll);
                    return;
                }
                Some(FlushStep::TooEarly) => TimeoutFuture::new(RESIZE_RETRY_MS).await,
                Some(FlushStep::Done) | None => return,
            }
        }
    });
}

fn dispatch(
    kind: SurfaceEventKind,
    ev: &web_sys::MouseEvent,
    signals: MapSignals,
    modal: RwSignal<Option<Modal>>,
) {
    let Some(target) = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
    else {
        return;
    };
    let client = Point::new(ev.client_x() as f64, ev.client_y() as f64);
    let event = SurfaceEvent::resolve(kind, &DomNode(target), client);
    if event.region.is_none() {
        return;
    }

    let Some((outcome, hovered)) = with_binding(|b| {
        let outcome = b
            .session
            .handle(&event, &b.surface, &session::is_authenticated);
        (outcome, b.session.hovered().map(str::to_string))
    }) else {
        return;
    };

    if signals.hovered.get_untracked() != hovered {
        signals.hovered.set(hovered);
    }
    let next = match outcome {
        InteractionOutcome::Nothing => return,
        InteractionOutcome::OpenRegionDetails { region_id } => Modal::RegionDetails { region_id },
        InteractionOutcome::RequireAuth { region_id } => Modal::AuthRequired { region_id },
        InteractionOutcome::BeginPinCreation {
            region_id,
            position,
        } => Modal::CreatePin {
            region_id,
            position,
        },
    };
    modal.set(Some(next));
}

/// Fetch approved pins for every region that has any and fold them into the
/// board. Stops early if the map is remounted or torn down meanwhile.
fn load_approved_pins(
    api: ApiClient,
    pins: RwSignal<PinBoard>,
    anchors: HashMap<String, Point>,
    token: MountToken,
) {
    spawn_local(async move {
        let summaries = match api.region_summary().await {
            Ok(summaries) => summaries,
            Err(err) => {
                tracing::warn!(error = %err, "region summary unavailable");
                return;
            }
        };
        for summary in summaries.into_iter().filter(|s| s.pin_count > 0) {
            if !token.is_current() {
                return;
            }
            match api.pins_by_region(&summary.region_id).await {
                Ok(records) => {
                    let fallback = anchors.get(&summary.region_id).copied();
                    pins.update(|board| {
                        let added = board.merge_approved(&records, fallback);
                        tracing::debug!(region = %summary.region_id, added, "approved pins merged");
                    });
                }
                Err(err) => {
                    tracing::warn!(region = %summary.region_id, error = %err, "pins unavailable");
                }
            }
        }
    });
}

fn px(v: f64) -> String {
    format!("{v}px")
}

/// Interactive map: injected vector markup plus label, pin and card overlays.
#[component]
pub fn MapView() -> impl IntoView {
    let ActiveMode(mode) = expect_context();
    let AlwaysShowLabels(show_labels) = expect_context();
    let Pins(pins) = expect_context();
    let ActiveModal(modal) = expect_context();
    let api: ApiClient = expect_context();

    let signals = MapSignals::new();
    let catalog = StoredValue::new(RegionCatalog::ukraine());

    let container_ref = NodeRef::<leptos::html::Div>::new();
    let host_ref = NodeRef::<leptos::html::Div>::new();
    let tooltip_ref = NodeRef::<leptos::html::Div>::new();

    // Mount (and remount on tab switch)
    Effect::new(move || {
        let mode = mode.get();
        let (Some(container), Some(host), Some(tooltip)) =
            (container_ref.get(), host_ref.get(), tooltip_ref.get())
        else {
            return;
        };

        let token = MOUNT_GENERATION.with(MountGeneration::begin);
        signals.status.set(LoadStatus::Loading);
        let api = api.clone();
        spawn_local(async move {
            let markup = match assets::vector_map().await {
                Ok(markup) => markup,
                Err(err) => {
                    tracing::error!(error = %err, "map markup unavailable");
                    if token.is_current() {
                        signals.status.set(LoadStatus::Failed(err.to_string()));
                    }
                    return;
                }
            };
            if !token.is_current() {
                tracing::debug!("stale map mount skipped");
                return;
            }
            let targets = MountTargets {
                host: host.into(),
                container: container.into(),
                tooltip: tooltip.into(),
            };
            match mount_map(&markup, mode, targets, signals) {
                Ok(anchors) => {
                    if mode == MapMode::Adventures {
                        load_approved_pins(api, pins, anchors, token);
                    }
                }
                Err(message) => {
                    tracing::error!(%message, "map mount failed");
                    signals.status.set(LoadStatus::Failed(message));
                }
            }
        });
    });

    on_cleanup(teardown);

    let label_layer = move || {
        if !show_labels.get() && !signals.compact.get() {
            return ().into_any();
        }
        let Some(snapshot) = signals.snapshot.get() else {
            return ().into_any();
        };
        let scroll = signals.scroll.get();
        signals
            .labels
            .get()
            .into_iter()
            .map(|label| {
                let p = snapshot.project(Point::new(label.x, label.y), scroll);
                view! {
                    <div class="region-label" style:left=px(p.x) style:top=px(p.y)>
                        {label.text}
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    let pin_layer = move || {
        if mode.get() != MapMode::Adventures {
            return ().into_any();
        }
        let Some(snapshot) = signals.snapshot.get() else {
            return ().into_any();
        };
        let scroll = signals.scroll.get();
        let radius = MapConfig::default().radial_radius;
        pins.with(|board| {
            let mut regions: Vec<&str> = board.visible().map(|p| p.region_id.as_str()).collect();
            regions.sort_unstable();
            regions.dedup();
            regions
                .into_iter()
                .flat_map(|region| marker_positions(&board.for_region(region), radius))
                .map(|placed| {
                    let p = snapshot.project(Point::new(placed.x, placed.y), scroll);
                    let pin_type = placed.pin.pin_type;
                    let pending = placed.pin.status == PinStatus::Pending;
                    view! {
                        <img
                            class="map-pin"
                            class:pending=pending
                            src=pin_type.icon()
                            alt=pin_type.label()
                            style:left=px(p.x)
                            style:top=px(p.y)
                        />
                    }
                })
                .collect_view()
        })
        .into_any()
    };

    let card_layer = move || {
        if mode.get() != MapMode::Adventures {
            return ().into_any();
        }
        let (Some(region_id), Some(snapshot)) = (signals.hovered.get(), signals.snapshot.get())
        else {
            return ().into_any();
        };
        let scroll = signals.scroll.get();
        let cfg = MapConfig::default().card;
        let region_name = catalog.with_value(|c| c.display_name(&region_id).to_string());

        let cards: Vec<_> = pins.with(|board| {
            layout_cards(&board.for_region(&region_id), &cfg)
                .iter()
                .map(|placement| {
                    let pin = placement.pin;
                    (
                        project_card(placement, &snapshot, scroll, &cfg),
                        placement.side,
                        pin.pin_type,
                        pin.text.clone(),
                        pin.author_name.clone(),
                        pin.images.first().cloned(),
                    )
                })
                .collect()
        });
        if cards.is_empty() {
            return ().into_any();
        }

        let arrows = cards
            .iter()
            .map(|(screen, _, pin_type, ..)| {
                view! {
                    <line
                        x1=screen.arrow_start.x.to_string()
                        y1=screen.arrow_start.y.to_string()
                        x2=screen.arrow_end.x.to_string()
                        y2=screen.arrow_end.y.to_string()
                        stroke=pin_type.accent()
                        stroke-width="2"
                        marker-end=format!("url(#arrowhead-{})", pin_type.as_str())
                    />
                }
            })
            .collect_view();

        let bodies = cards
            .into_iter()
            .map(|(screen, side, pin_type, text, author, photo)| {
                let side_class = match side {
                    CardSide::Top => "card-top",
                    CardSide::Right => "card-right",
                    CardSide::Bottom => "card-bottom",
                    CardSide::Left => "card-left",
                };
                view! {
                    <div
                        class=format!("adventure-card {side_class} {}", pin_type.as_str())
                        style:left=px(screen.left)
                        style:top=px(screen.top)
                        style:width=px(cfg.width)
                        style:min-height=px(cfg.height)
                        style:border-color=pin_type.accent()
                    >
                        <div class="adventure-card-header">
                            <span class="pin-badge" style:background=pin_type.accent()>
                                {pin_type.label()}
                            </span>
                            <span class="region-name">{region_name.clone()}</span>
                            {author.map(|name| view! { <span class="author-name">{name}</span> })}
                        </div>
                        {photo.map(|src| view! { <img class="card-photo" src=src alt="" /> })}
                        <div class="adventure-text">{text}</div>
                    </div>
                }
            })
            .collect_view();

        view! {
            <svg class="card-arrows">
                <defs>
                    <marker id="arrowhead-visited" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto">
                        <polygon points="0 0, 10 3.5, 0 7" fill="#c62828" />
                    </marker>
                    <marker id="arrowhead-wantToVisit" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto">
                        <polygon points="0 0, 10 3.5, 0 7" fill="#2e7d32" />
                    </marker>
                </defs>
                {arrows}
            </svg>
            {bodies}
        }
        .into_any()
    };

    let status_layer = move || match signals.status.get() {
        LoadStatus::Ready => ().into_any(),
        LoadStatus::Loading => view! { <div class="map-status">"Loading map…"</div> }.into_any(),
        LoadStatus::Failed(message) => view! {
            <div class="map-status map-error">
                {format!("Could not load the map: {message}")}
            </div>
        }
        .into_any(),
    };

    view! {
        <div class="map-frame">
            <div
                class="map-scroll"
                node_ref=container_ref
                on:mouseover=move |ev| dispatch(SurfaceEventKind::Enter, &ev, signals, modal)
                on:mouseout=move |ev| dispatch(SurfaceEventKind::Leave, &ev, signals, modal)
                on:click=move |ev| dispatch(SurfaceEventKind::Click, &ev, signals, modal)
                on:scroll=move |_| {
                    with_binding(|b| b.scroll_throttle.request());
                }
            >
                <div class="map-svg-host" node_ref=host_ref></div>
                <div class="map-overlay">{label_layer} {pin_layer} {card_layer}</div>
            </div>
            <div class="map-tooltip" node_ref=tooltip_ref></div>
            {status_layer}
        </div>
    }
}
