use crate::model::{Edge, Rect, Size};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Canvas-scoped region identifier. Ids are handed out in creation order, so
/// ordering by id is ordering by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Corner of a region an item is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Uniformly random corner.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Corner {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn is_left(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    pub fn is_top(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    /// The point of `r` at this corner.
    pub fn point_of(self, r: &Rect) -> (f64, f64) {
        let x = if self.is_left() { r.x } else { r.right() };
        let y = if self.is_top() { r.y } else { r.bottom() };
        (x, y)
    }
}

impl FromStr for Corner {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tl" | "top_left" | "topleft" => Ok(Self::TopLeft),
            "tr" | "top_right" | "topright" => Ok(Self::TopRight),
            "bl" | "bottom_left" | "bottomleft" => Ok(Self::BottomLeft),
            "br" | "bottom_right" | "bottomright" => Ok(Self::BottomRight),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Corner::TopLeft => "TL",
            Corner::TopRight => "TR",
            Corner::BottomLeft => "BL",
            Corner::BottomRight => "BR",
        })
    }
}

/// Role of a region created by splitting its parent around an item.
///
/// ```text
/// +-------+----+   +-------+----+   +-------+----+
/// | image | XL |   | image | XS |   | image | XS |
/// +-------+    |   +-------+----+   +-------+----+
/// | YS    |    |   | YL         |   | YS    | C  |
/// +-------+----+   +------------+   +-------+----+
/// ```
///
/// XL and YL overlap each other and both cover C; XS lies inside XL and YS
/// inside YL. The diagram is the top-left case, the other corners mirror it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leftover {
    XLarge,
    YLarge,
    XSmall,
    YSmall,
    Corner,
}

impl fmt::Display for Leftover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Leftover::XLarge => "XL",
            Leftover::YLarge => "YL",
            Leftover::XSmall => "XS",
            Leftover::YSmall => "YS",
            Leftover::Corner => "C",
        })
    }
}

/// Pairs of sibling leftovers that overlap and must invalidate each other.
pub const SIBLING_CONFLICTS: [(Leftover, Leftover); 5] = [
    (Leftover::XLarge, Leftover::YLarge),
    (Leftover::XLarge, Leftover::XSmall),
    (Leftover::XLarge, Leftover::Corner),
    (Leftover::YLarge, Leftover::YSmall),
    (Leftover::YLarge, Leftover::Corner),
];

/// An item locked into a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lock {
    /// Natural size of the item.
    pub size: Size,
    /// Index of the item in the packer's sequence, if placed by the packer.
    pub item: Option<usize>,
}

/// A candidate sub-area of a canvas, free or locked to an item.
#[derive(Debug, Clone)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) rect: Rect,
    pub(crate) lock: Option<Lock>,
    pub(crate) overlaps: BTreeSet<RegionId>,
    pub(crate) origin: Option<(Corner, Leftover)>,
}

impl Region {
    pub(crate) fn new(id: RegionId, rect: Rect, origin: Option<(Corner, Leftover)>) -> Self {
        Self {
            id,
            rect,
            lock: None,
            overlaps: BTreeSet::new(),
            origin,
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    pub fn lock(&self) -> Option<&Lock> {
        self.lock.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Free regions that must be destroyed if this one is locked.
    pub fn overlaps(&self) -> &BTreeSet<RegionId> {
        &self.overlaps
    }

    /// Corner and role this region was split off with; `None` for a canvas's
    /// initial region and for regions added by hand.
    pub fn origin(&self) -> Option<(Corner, Leftover)> {
        self.origin
    }

    /// Unused width and height left by `item`; see [`Size::remainder_in`].
    pub fn fits(&self, item: &Size, tolerance: &Size) -> Option<Size> {
        item.remainder_in(&self.rect.size(), tolerance)
    }

    pub fn mergeable(&self, other: &Region) -> Option<Edge> {
        self.rect.mergeable(&other.rect)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Region {}", self.id)?;
        if let Some((corner, role)) = self.origin {
            write!(f, " {corner}/{role}")?;
        }
        write!(f, " {}", self.rect)?;
        if let Some(lock) = &self.lock {
            write!(f, " {}", lock.size)?;
        }
        if !self.overlaps.is_empty() {
            let ids: Vec<String> = self.overlaps.iter().map(|o| o.to_string()).collect();
            write!(f, " /{}/", ids.join(","))?;
        }
        f.write_str("]")
    }
}

/// Geometry produced by splitting a region around an item.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    /// Area the parent region shrinks to once locked.
    pub footprint: Rect,
    /// New free regions in creation order (XL, YL, XS, YS, C).
    pub children: Vec<(Leftover, Rect)>,
}

/// Splits `region` around an item anchored at `corner`.
///
/// A leftover strip exists on an axis only if it is at least the tolerance
/// on that axis and positive. On an axis without a leftover the footprint
/// keeps the region's full extent.
pub fn plan_split(
    region: &Rect,
    item: &Size,
    remainder: &Size,
    corner: Corner,
    tolerance: &Size,
) -> SplitPlan {
    let has_x = remainder.w >= tolerance.w && remainder.w > 0.0;
    let has_y = remainder.h >= tolerance.h && remainder.h > 0.0;

    let item_x = if corner.is_left() {
        region.x
    } else {
        region.x + remainder.w
    };
    let item_y = if corner.is_top() {
        region.y
    } else {
        region.y + remainder.h
    };
    let strip_x = if corner.is_left() {
        region.x + item.w
    } else {
        region.x
    };
    let strip_y = if corner.is_top() {
        region.y + item.h
    } else {
        region.y
    };

    let mut children = Vec::with_capacity(5);
    if has_x {
        children.push((
            Leftover::XLarge,
            Rect::new(strip_x, region.y, remainder.w, region.h),
        ));
    }
    if has_y {
        children.push((
            Leftover::YLarge,
            Rect::new(region.x, strip_y, region.w, remainder.h),
        ));
    }
    if has_x && has_y {
        children.push((
            Leftover::XSmall,
            Rect::new(strip_x, item_y, remainder.w, item.h),
        ));
        children.push((
            Leftover::YSmall,
            Rect::new(item_x, strip_y, item.w, remainder.h),
        ));
        children.push((
            Leftover::Corner,
            Rect::new(strip_x, strip_y, remainder.w, remainder.h),
        ));
    }

    let footprint = Rect::new(
        if has_x { item_x } else { region.x },
        if has_y { item_y } else { region.y },
        if has_x { item.w } else { region.w },
        if has_y { item.h } else { region.h },
    );

    SplitPlan {
        footprint,
        children,
    }
}
