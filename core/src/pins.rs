use serde::{Deserialize, Serialize};

use crate::api::PinRecord;
use crate::config::{CardLayoutConfig, RADIAL_STEP_DEG};
use crate::geometry::Point;
use crate::viewport::ViewportSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinType {
    Visited,
    WantToVisit,
}

impl PinType {
    /// Wire name, also used as a CSS class.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visited => "visited",
            Self::WantToVisit => "wantToVisit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Visited => "Visited",
            Self::WantToVisit => "Want to Visit",
        }
    }

    pub fn accent(self) -> &'static str {
        match self {
            Self::Visited => "#c62828",
            Self::WantToVisit => "#2e7d32",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Visited => "/red-pin.svg",
            Self::WantToVisit => "/green-pin.svg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinStatus {
    /// Created locally, submission not yet acknowledged.
    Pending,
    /// Acknowledged or fetched as approved from the backend.
    Confirmed,
    /// The submitting flow reported failure. Never shown as confirmed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinId {
    Local(u64),
    Remote(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub region_id: String,
    pub pin_type: PinType,
    pub text: String,
    pub author_name: Option<String>,
    pub images: Vec<String>,
    /// Click point in shape-local coordinates, or the region anchor when
    /// the backend record carried no coordinates.
    pub position: Point,
    /// `position` is the user's own click point.
    pub precise: bool,
    /// Ordinal among the region's pins at creation time; layout only.
    pub creation_index: usize,
    pub status: PinStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinDraft {
    pub region_id: String,
    pub pin_type: PinType,
    pub text: String,
    pub author_name: Option<String>,
    pub images: Vec<String>,
    pub position: Point,
}

/// All pins known to one map instance, local and remote.
#[derive(Debug, Clone, Default)]
pub struct PinBoard {
    pins: Vec<Pin>,
    next_local_id: u64,
}

impl PinBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_creation_index(&self, region_id: &str) -> usize {
        self.pins
            .iter()
            .filter(|p| p.region_id == region_id)
            .map(|p| p.creation_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Record a user submission before the backend has acknowledged it.
    pub fn add_optimistic(&mut self, draft: PinDraft) -> PinId {
        let id = PinId::Local(self.next_local_id);
        self.next_local_id += 1;
        let creation_index = self.next_creation_index(&draft.region_id);
        self.pins.push(Pin {
            id: id.clone(),
            region_id: draft.region_id,
            pin_type: draft.pin_type,
            text: draft.text,
            author_name: draft.author_name.filter(|name| !name.trim().is_empty()),
            images: draft.images,
            position: draft.position,
            precise: true,
            creation_index,
            status: PinStatus::Pending,
        });
        id
    }

    /// Mark a pending pin as acknowledged, adopting the backend id when given.
    pub fn confirm(&mut self, id: &PinId, remote_id: Option<String>) -> bool {
        let Some(pin) = self.pins.iter_mut().find(|p| &p.id == id) else {
            return false;
        };
        if let Some(remote_id) = remote_id {
            pin.id = PinId::Remote(remote_id);
        }
        pin.status = PinStatus::Confirmed;
        true
    }

    pub fn mark_failed(&mut self, id: &PinId) -> bool {
        let Some(pin) = self.pins.iter_mut().find(|p| &p.id == id) else {
            return false;
        };
        pin.status = PinStatus::Failed;
        true
    }

    /// Fold approved backend pins into the board. Pins already present (by
    /// remote id) and records carrying a non-approved status are skipped;
    /// records without coordinates are placed at `fallback` (typically the
    /// region's label anchor) and dropped when there is none.
    pub fn merge_approved(&mut self, records: &[PinRecord], fallback: Option<Point>) -> usize {
        let mut added = 0;
        for record in records {
            if record.status.as_deref().is_some_and(|s| s != "approved") {
                continue;
            }
            let id = PinId::Remote(record.id.clone());
            if self.pins.iter().any(|p| p.id == id) {
                continue;
            }
            let (position, precise) = match (record.x, record.y, fallback) {
                (Some(x), Some(y), _) => (Point::new(x, y), true),
                (_, _, Some(anchor)) => (anchor, false),
                _ => {
                    tracing::warn!(
                        pin = %record.id,
                        region = %record.region_id,
                        "approved pin has no coordinates and its region no anchor"
                    );
                    continue;
                }
            };
            let creation_index = self.next_creation_index(&record.region_id);
            self.pins.push(Pin {
                id,
                region_id: record.region_id.clone(),
                pin_type: record.pin_type,
                text: record.description.clone(),
                author_name: record.author_name.clone(),
                images: record.images.clone(),
                position,
                precise,
                creation_index,
                status: PinStatus::Confirmed,
            });
            added += 1;
        }
        added
    }

    /// Pins shown on the map: everything except failed submissions.
    pub fn visible(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.status != PinStatus::Failed)
    }

    /// Visible pins of one region, in creation order.
    pub fn for_region(&self, region_id: &str) -> Vec<&Pin> {
        let mut pins: Vec<&Pin> = self.visible().filter(|p| p.region_id == region_id).collect();
        pins.sort_by_key(|p| p.creation_index);
        pins
    }
}

// --- Radial layout (legacy fallback) ---

/// Offset of pin `index` on a hexagonal rosette of the given radius.
/// The angle period is six pins: index 6 lands on index 0.
pub fn radial_offset(index: usize, radius: f64) -> (f64, f64) {
    let angle = (index as f64 * RADIAL_STEP_DEG).to_radians();
    (radius * angle.cos(), radius * angle.sin())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinPlacement<'a> {
    pub pin: &'a Pin,
    pub x: f64,
    pub y: f64,
}

/// Marker positions for a region's pins: precise pins sit on their click
/// point, pins that only know their region fan out radially around it.
pub fn marker_positions<'a>(pins: &[&'a Pin], radius: f64) -> Vec<PinPlacement<'a>> {
    pins.iter()
        .map(|&pin| {
            let (dx, dy) = if pin.precise {
                (0.0, 0.0)
            } else {
                radial_offset(pin.creation_index, radius)
            };
            PinPlacement {
                pin,
                x: pin.position.x + dx,
                y: pin.position.y + dy,
            }
        })
        .collect()
}

// --- Directional card layout ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardSide {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandCounts {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

/// Split `total` cards into bands: ~30% top, ~20% right, ~30% bottom, the
/// rest left. Always sums to `total`.
pub fn band_counts(total: usize) -> BandCounts {
    let ceil_30 = (total * 3).div_ceil(10);
    let top = ceil_30.min(total);
    let right = (total * 2 / 10).min(total - top);
    let bottom = ceil_30.min(total - top - right);
    let left = total - top - right - bottom;
    BandCounts {
        top,
        right,
        bottom,
        left,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardPlacement<'a> {
    pub pin: &'a Pin,
    pub side: CardSide,
    /// Position within the band, 0-based.
    pub slot: usize,
    /// Card top-left corner in shape-local coordinates.
    pub card_origin: Point,
    /// Arrow start: the pin's own anchor, shape-local.
    pub arrow_from: Point,
}

/// Lay out description cards for one region's pins around their anchors.
/// `pins` must belong to a single region; they are ranked by creation index.
pub fn layout_cards<'a>(pins: &[&'a Pin], cfg: &CardLayoutConfig) -> Vec<CardPlacement<'a>> {
    let mut ranked: Vec<&'a Pin> = pins.to_vec();
    ranked.sort_by_key(|p| p.creation_index);
    let counts = band_counts(ranked.len());

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, pin)| {
            let (side, slot) = side_for_rank(rank, &counts);
            let k = slot as f64;
            let anchor = pin.position;
            let card_origin = match side {
                CardSide::Right => anchor.offset(
                    cfg.offset,
                    k * cfg.spacing_vertical - cfg.height / 2.0 + 5.0,
                ),
                CardSide::Left => anchor.offset(
                    -(cfg.width + 20.0),
                    k * cfg.spacing_vertical - cfg.height / 2.0 + 5.0,
                ),
                CardSide::Bottom => {
                    anchor.offset(k * cfg.spacing_horizontal - cfg.width / 2.0, cfg.offset)
                }
                CardSide::Top => anchor.offset(
                    k * cfg.spacing_horizontal - cfg.width / 2.0,
                    -(cfg.height + 20.0),
                ),
            };
            CardPlacement {
                pin,
                side,
                slot,
                card_origin,
                arrow_from: anchor,
            }
        })
        .collect()
}

fn side_for_rank(rank: usize, counts: &BandCounts) -> (CardSide, usize) {
    let right_start = counts.top;
    let bottom_start = right_start + counts.right;
    let left_start = bottom_start + counts.bottom;
    if rank < right_start {
        (CardSide::Top, rank)
    } else if rank < bottom_start {
        (CardSide::Right, rank - right_start)
    } else if rank < left_start {
        (CardSide::Bottom, rank - bottom_start)
    } else {
        (CardSide::Left, rank - left_start)
    }
}

/// Edge of the card the connector arrow points at, relative to the card's
/// top-left corner in screen pixels.
pub fn arrow_attachment(side: CardSide, cfg: &CardLayoutConfig) -> (f64, f64) {
    match side {
        CardSide::Right => (0.0, cfg.height / 2.0 - 5.0),
        CardSide::Left => (cfg.width, cfg.height / 2.0 - 5.0),
        CardSide::Bottom => (cfg.width / 2.0, 0.0),
        CardSide::Top => (cfg.width / 2.0, cfg.height),
    }
}

/// Container-relative pixel geometry for one card and its arrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardScreen {
    pub left: f64,
    pub top: f64,
    pub arrow_start: Point,
    pub arrow_end: Point,
}

pub fn project_card(
    placement: &CardPlacement<'_>,
    snapshot: &ViewportSnapshot,
    scroll: Point,
    cfg: &CardLayoutConfig,
) -> CardScreen {
    let origin = snapshot.project(placement.card_origin, scroll);
    let arrow_start = snapshot.project(placement.arrow_from, scroll);
    let (ax, ay) = arrow_attachment(placement.side, cfg);
    CardScreen {
        left: origin.x,
        top: origin.y,
        arrow_start,
        arrow_end: origin.offset(ax, ay),
    }
}
