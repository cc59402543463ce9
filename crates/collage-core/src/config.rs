use crate::error::{CollageError, Result};
use crate::model::Size;
use crate::packer::region::Corner;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candidate scoring heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CostFunction {
    /// Minimise leftover area (`|rem.w| * |rem.h|`).
    Area,
    /// Minimise the larger leftover axis (`max(|rem.w|, |rem.h|)`).
    Axis,
}

impl CostFunction {
    /// Cost of a placement leaving `remainder` unused; lower is better.
    pub fn score(self, remainder: &Size) -> f64 {
        match self {
            CostFunction::Area => remainder.w.abs() * remainder.h.abs(),
            CostFunction::Axis => remainder.w.abs().max(remainder.h.abs()),
        }
    }
}

impl FromStr for CostFunction {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area" => Ok(Self::Area),
            "axis" => Ok(Self::Axis),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CostFunction::Area => "AREA",
            CostFunction::Axis => "AXIS",
        })
    }
}

/// How the packer picks the corner of the winning region.
/// Serialized as its string form (`random`, `nearest`, `tl`, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "String", try_from = "String")]
pub enum CornerStrategy {
    /// Always the same corner.
    Fixed(Corner),
    /// Uniformly random corner drawn from the packer's RNG.
    Random,
    /// The corner of the region nearest the matching corner of its canvas.
    Nearest,
}

impl FromStr for CornerStrategy {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "nearest" => Ok(Self::Nearest),
            other => other.parse::<Corner>().map(Self::Fixed),
        }
    }
}

impl TryFrom<String> for CornerStrategy {
    type Error = String;
    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse().map_err(|_| format!("unknown corner strategy: {s}"))
    }
}

impl From<CornerStrategy> for String {
    fn from(v: CornerStrategy) -> Self {
        v.to_string()
    }
}

impl fmt::Display for CornerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CornerStrategy::Fixed(c) => write!(f, "{c}"),
            CornerStrategy::Random => f.write_str("random"),
            CornerStrategy::Nearest => f.write_str("nearest"),
        }
    }
}

/// Order in which the catalog hands items to the packer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    Shuffle,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" | "area" => Ok(Self::AreaDesc),
            "shuffle" => Ok(Self::Shuffle),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Packing configuration.
/// Key notes:
///   - `canvas_size` and `tolerance` are the two geometric inputs; tolerance doubles as the
///     permitted overhang and the smallest leftover strip worth keeping
///   - `cost` ranks candidate regions, `corner` decides where inside the winner an item sits
///   - `seed` makes `CornerStrategy::Random` reproducible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollageConfig {
    /// Size of every canvas.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: Size,
    /// Maximum overhang per axis; also the smallest leftover kept as a region.
    #[serde(default = "default_tolerance")]
    pub tolerance: Size,
    #[serde(default = "default_cost")]
    pub cost: CostFunction,
    #[serde(default = "default_corner")]
    pub corner: CornerStrategy,
    /// Seed for corner selection. None draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Drop free regions after simplifying, leaving only placed items.
    #[serde(default = "default_filter_empty")]
    pub filter_empty: bool,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            canvas_size: default_canvas_size(),
            tolerance: default_tolerance(),
            cost: default_cost(),
            corner: default_corner(),
            seed: None,
            filter_empty: default_filter_empty(),
        }
    }
}

impl CollageConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - The canvas size is not finite and positive
    /// - The tolerance is negative or not finite
    pub fn validate(&self) -> Result<()> {
        if !self.canvas_size.is_valid() {
            return Err(CollageError::InvalidSize {
                w: self.canvas_size.w,
                h: self.canvas_size.h,
            });
        }
        let t = self.tolerance;
        if !t.w.is_finite() || !t.h.is_finite() || t.w < 0.0 || t.h < 0.0 {
            return Err(CollageError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}x{}",
                t.w, t.h
            )));
        }
        Ok(())
    }

    /// Largest item a fresh canvas accepts (`canvas_size + tolerance`).
    pub fn max_item(&self) -> Size {
        Size::new(
            self.canvas_size.w + self.tolerance.w,
            self.canvas_size.h + self.tolerance.h,
        )
    }

    /// True if a fresh canvas can take `item`, by the same test a region's
    /// fit check applies.
    pub fn accepts(&self, item: &Size) -> bool {
        item.remainder_in(&self.canvas_size, &self.tolerance).is_some()
    }
}

fn default_canvas_size() -> Size {
    Size::new(1920.0, 1080.0)
}
fn default_tolerance() -> Size {
    Size::new(20.0, 20.0)
}
fn default_cost() -> CostFunction {
    CostFunction::Axis
}
fn default_corner() -> CornerStrategy {
    CornerStrategy::Random
}
fn default_filter_empty() -> bool {
    true
}

/// Builder for `CollageConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct CollageConfigBuilder {
    cfg: CollageConfig,
}

impl CollageConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: CollageConfig::default(),
        }
    }
    pub fn canvas_size(mut self, w: f64, h: f64) -> Self {
        self.cfg.canvas_size = Size::new(w, h);
        self
    }
    pub fn tolerance(mut self, w: f64, h: f64) -> Self {
        self.cfg.tolerance = Size::new(w, h);
        self
    }
    pub fn cost(mut self, v: CostFunction) -> Self {
        self.cfg.cost = v;
        self
    }
    pub fn corner(mut self, v: CornerStrategy) -> Self {
        self.cfg.corner = v;
        self
    }
    pub fn seed(mut self, v: Option<u64>) -> Self {
        self.cfg.seed = v;
        self
    }
    pub fn filter_empty(mut self, v: bool) -> Self {
        self.cfg.filter_empty = v;
        self
    }
    pub fn build(self) -> CollageConfig {
        self.cfg
    }
}

impl CollageConfig {
    /// Create a fluent builder for `CollageConfig`.
    pub fn builder() -> CollageConfigBuilder {
        CollageConfigBuilder::new()
    }
}
