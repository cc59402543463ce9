use crate::error::{CollageError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute tolerance for edge comparisons. Fitting produces fractional
/// coordinates, so exact float equality would refuse legitimate merges.
pub const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// A width/height pair. Dimensions stay fractional during packing and are
/// rounded only when a layout is exported or rendered.
///
/// `Size::new` is unchecked because remainders are legitimately negative
/// (controlled overhang); use [`Size::try_new`] for user-supplied values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Validated constructor: both dimensions must be finite and positive.
    pub fn try_new(w: f64, h: f64) -> Result<Self> {
        if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
            return Err(CollageError::InvalidSize { w, h });
        }
        Ok(Self { w, h })
    }

    /// `|w| * |h|`, negated when either dimension is negative.
    pub fn area(&self) -> f64 {
        let area = self.w.abs() * self.h.abs();
        if self.w < 0.0 || self.h < 0.0 { -area } else { area }
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> Result<f64> {
        if self.h == 0.0 {
            return Err(CollageError::UndefinedAspectRatio {
                w: self.w,
                h: self.h,
            });
        }
        Ok(self.w / self.h)
    }

    /// Largest size with this aspect ratio that fits inside `bound`.
    /// Returns `self` unchanged when the dimensions already match.
    pub fn fit_into(&self, bound: &Size) -> Result<Size> {
        if self.w == bound.w && self.h == bound.h {
            return Ok(*self);
        }
        let scale = if self.aspect_ratio()? >= bound.aspect_ratio()? {
            bound.w / self.w
        } else {
            bound.h / self.h
        };
        Ok(Size::new(self.w * scale, self.h * scale))
    }

    /// True if both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0
    }

    /// Room left over when `self` is laid into `bound`, or `None` if it
    /// overhangs by more than `tolerance` on either axis. Negative
    /// components mean a permitted overhang.
    pub fn remainder_in(&self, bound: &Size, tolerance: &Size) -> Option<Size> {
        let rem = Size::new(bound.w - self.w, bound.h - self.h);
        if rem.w < -tolerance.w || rem.h < -tolerance.h {
            return None;
        }
        Some(rem)
    }

    /// Parses a tolerance in `WxH` form. Unlike a canvas size, zero is
    /// allowed on either axis.
    pub fn parse_tolerance(s: &str) -> Result<Size> {
        let (w, h) = parse_dims(s)?;
        if !w.is_finite() || !h.is_finite() || w < 0.0 || h < 0.0 {
            return Err(CollageError::InvalidInput(format!(
                "tolerance must be finite and non-negative, got \"{s}\""
            )));
        }
        Ok(Size::new(w, h))
    }

    /// Integer dimensions for output (rounded, clamped at zero).
    pub fn rounded(&self) -> (u32, u32) {
        (self.w.round().max(0.0) as u32, self.h.round().max(0.0) as u32)
    }

    /// `WxH` with floored integers.
    pub fn geometry(&self) -> String {
        format!("{}x{}", self.w.floor(), self.h.floor())
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.geometry())
    }
}

fn parse_dims(s: &str) -> Result<(f64, f64)> {
    let lower = s.trim().to_ascii_lowercase();
    let (w, h) = lower
        .split_once('x')
        .ok_or_else(|| CollageError::InvalidInput(format!("expected WxH, got \"{s}\"")))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| CollageError::InvalidInput(format!("bad dimension \"{v}\" in \"{s}\"")))
    };
    Ok((parse(w)?, parse(h)?))
}

/// Parses `WxH` (e.g. `1920x1080`, the `x` is case-insensitive).
impl FromStr for Size {
    type Err = CollageError;
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = parse_dims(s)?;
        Size::try_new(w, h)
    }
}

/// Side of a rectangle on which a neighbour sits flush.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub fn opposite(self) -> Edge {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
            Edge::Top => Edge::Bottom,
            Edge::Bottom => Edge::Top,
        }
    }
}

/// Axis-aligned rectangle. `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn try_new(x: f64, y: f64, w: f64, h: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(CollageError::InvalidInput(format!(
                "non-finite origin {x},{y}"
            )));
        }
        let size = Size::try_new(w, h)?;
        Ok(Self::at(x, y, size))
    }

    /// Rectangle of `size` with its origin at `(x, y)`.
    pub const fn at(x: f64, y: f64, size: Size) -> Self {
        Self::new(x, y, size.w, size.h)
    }

    /// Rectangle of `size` at the origin.
    pub const fn from_size(size: Size) -> Self {
        Self::at(0.0, 0.0, size)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn area(&self) -> f64 {
        self.size().area()
    }

    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x - EPSILON
            && r.y >= self.y - EPSILON
            && r.right() <= self.right() + EPSILON
            && r.bottom() <= self.bottom() + EPSILON
    }

    /// True if the two rectangles share a region of positive area.
    pub fn intersects(&self, r: &Rect) -> bool {
        self.x < r.right() - EPSILON
            && r.x < self.right() - EPSILON
            && self.y < r.bottom() - EPSILON
            && r.y < self.bottom() - EPSILON
    }

    /// Where `other` sits if it shares the full length of one of our edges
    /// and is flush against it; `Left` means `other` is to our left.
    pub fn mergeable(&self, other: &Rect) -> Option<Edge> {
        if approx_eq(other.y, self.y) && approx_eq(other.h, self.h) {
            if approx_eq(self.x, other.right()) {
                return Some(Edge::Left);
            }
            if approx_eq(self.right(), other.x) {
                return Some(Edge::Right);
            }
        }
        if approx_eq(other.x, self.x) && approx_eq(other.w, self.w) {
            if approx_eq(self.y, other.bottom()) {
                return Some(Edge::Top);
            }
            if approx_eq(self.bottom(), other.y) {
                return Some(Edge::Bottom);
            }
        }
        None
    }

    /// Integer origin that centres an extent of `size` inside this rectangle.
    pub fn centre_offset(&self, size: &Size) -> (i64, i64) {
        (
            (self.x + (self.w - size.w) / 2.0).round() as i64,
            (self.y + (self.h - size.h) / 2.0).round() as i64,
        )
    }

    /// `WxH`, followed by `+X+Y` when the origin is not at zero.
    pub fn geometry(&self) -> String {
        let mut s = self.size().geometry();
        if self.x > 0.0 || self.y > 0.0 {
            s.push_str(&format!("+{}+{}", self.x.floor(), self.y.floor()));
        }
        s
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}:{}", self.x, self.y, self.size().geometry())
    }
}

/// An item locked into a canvas, ready for the image backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    /// Identity of the item supplied by the catalog.
    pub key: String,
    /// Index of the item in the packer's item sequence; `None` for regions
    /// locked by hand rather than by the packer.
    pub item: Option<usize>,
    /// Region assigned to the item.
    pub frame: Rect,
    /// Natural size of the item.
    pub size: Size,
    /// Item scaled to fit the frame with its aspect ratio preserved.
    pub fitted: Size,
    /// Top-left of `fitted` when centred in `frame`.
    pub offset: (i64, i64),
}

/// One packed canvas (logical record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: usize,
    pub name: String,
    pub size: Size,
    pub placements: Vec<Placement>,
}

/// Run-level metadata carried alongside exported sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub canvas_size: Size,
    pub tolerance: Size,
    pub cost: String,
    pub corner: String,
    pub unplaced: Vec<String>,
}

/// Every packed canvas plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub sheets: Vec<Sheet>,
    pub meta: Meta,
}

/// Statistics about packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Number of canvases produced.
    pub num_canvases: usize,
    /// Number of items placed.
    pub num_placed: usize,
    /// Number of items that could not be placed.
    pub num_unplaced: usize,
    /// Sum of canvas areas.
    pub total_canvas_area: f64,
    /// Sum of fitted item areas.
    pub used_area: f64,
    /// used_area / total_canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl Layout {
    /// Computes packing statistics for this layout.
    pub fn stats(&self) -> PackStats {
        let mut num_placed = 0;
        let mut total_canvas_area = 0.0;
        let mut used_area = 0.0;
        for sheet in &self.sheets {
            total_canvas_area += sheet.size.area();
            for p in &sheet.placements {
                num_placed += 1;
                used_area += p.fitted.area();
            }
        }
        let occupancy = if total_canvas_area > 0.0 {
            used_area / total_canvas_area
        } else {
            0.0
        };
        PackStats {
            num_canvases: self.sheets.len(),
            num_placed,
            num_unplaced: self.meta.unplaced.len(),
            total_canvas_area,
            used_area,
            occupancy,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvases: {}, Placed: {}, Unplaced: {}, Occupancy: {:.2}%, Total Area: {:.0} px², Used Area: {:.0} px²",
            self.num_canvases,
            self.num_placed,
            self.num_unplaced,
            self.occupancy * 100.0,
            self.total_canvas_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> f64 {
        (self.total_canvas_area - self.used_area).max(0.0)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.total_canvas_area > 0.0 {
            (self.wasted_area() / self.total_canvas_area) * 100.0
        } else {
            0.0
        }
    }
}
