use crate::config::{CollageConfig, CornerStrategy};
use crate::error::{CollageError, Result};
use crate::model::{Layout, Meta, PackStats, Sheet, Size};
use crate::packer::Item;
use crate::packer::canvas::{Canvas, CanvasId, Candidate};
use crate::packer::region::Corner;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Why an item was left out of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnplacedReason {
    /// Width or height not finite and positive.
    InvalidSize,
    /// Larger than `canvas_size + tolerance`; no canvas can ever hold it.
    Oversized,
}

/// An item the packer could not place.
#[derive(Debug, Clone, PartialEq)]
pub struct Unplaced {
    pub index: usize,
    pub key: String,
    pub size: Size,
    pub reason: UnplacedReason,
}

impl Unplaced {
    pub fn to_error(&self) -> CollageError {
        match self.reason {
            UnplacedReason::InvalidSize => CollageError::InvalidSize {
                w: self.size.w,
                h: self.size.h,
            },
            UnplacedReason::Oversized => CollageError::NoFeasibleCanvas {
                index: self.index,
                w: self.size.w,
                h: self.size.h,
            },
        }
    }
}

/// Outcome of a planning run.
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub canvases: usize,
    pub placed: usize,
    pub unplaced: Vec<Unplaced>,
}

impl PlanReport {
    /// Turns the first unplaceable item into an error, for callers that
    /// would rather abort than skip.
    pub fn ensure_all_placed(&self) -> Result<()> {
        match self.unplaced.first() {
            Some(u) => Err(u.to_error()),
            None => Ok(()),
        }
    }
}

/// Consumer of the final geometry. Given one sheet at a time (canvas order)
/// it produces one rendered output per canvas.
pub trait ImageBackend<I> {
    type Output;
    fn render_sheet(&self, sheet: &Sheet, items: &[I]) -> Result<Self::Output>;
}

/// Packs a sequence of items onto as few canvases as possible.
///
/// Items are placed in the order given; sort them by decreasing area first
/// (see [`crate::catalog::ImageCatalog::sort_by_area`]) so the hardest items
/// go in while the canvases are still empty.
pub struct Collage<I> {
    config: CollageConfig,
    items: Vec<I>,
    canvases: Vec<Canvas>,
    unplaced: Vec<Unplaced>,
}

impl<I: Item> Collage<I> {
    pub fn new(config: CollageConfig, items: Vec<I>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            items,
            canvases: Vec::new(),
            unplaced: Vec::new(),
        })
    }

    pub fn config(&self) -> &CollageConfig {
        &self.config
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    pub fn unplaced(&self) -> &[Unplaced] {
        &self.unplaced
    }

    /// Plans the layout, drawing random corners from `config.seed` (or OS
    /// entropy when unset).
    pub fn plan(&mut self) -> Result<PlanReport> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.plan_with_rng(&mut rng)
    }

    /// Plans the layout with an injected randomness source.
    ///
    /// Any previous plan is discarded and canvas ids restart from zero.
    #[instrument(skip_all, fields(items = self.items.len(), cost = %self.config.cost))]
    pub fn plan_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<PlanReport> {
        self.canvases.clear();
        self.unplaced.clear();
        let cost = self.config.cost;
        let mut placed = 0usize;

        for index in 0..self.items.len() {
            let size = self.items[index].size();
            if !size.is_valid() {
                self.reject(index, size, UnplacedReason::InvalidSize);
                continue;
            }
            if !self.config.accepts(&size) {
                self.reject(index, size, UnplacedReason::Oversized);
                continue;
            }

            let (canvas_idx, candidate) = match self.best_candidate(&size) {
                Some(found) => found,
                None => {
                    let fresh = self.open_canvas()?.best_candidate(&size, cost);
                    let Some(found) = fresh else {
                        self.canvases.pop();
                        self.reject(index, size, UnplacedReason::Oversized);
                        continue;
                    };
                    (self.canvases.len() - 1, found)
                }
            };

            let canvas = &mut self.canvases[canvas_idx];
            let corner = match self.config.corner {
                CornerStrategy::Fixed(c) => c,
                CornerStrategy::Random => Corner::random(rng),
                CornerStrategy::Nearest => canvas
                    .nearest_corner(candidate.region)
                    .unwrap_or(Corner::TopLeft),
            };
            debug!(
                index,
                canvas = %canvas.id(),
                region = %candidate.region,
                cost = candidate.cost,
                %corner,
                "commit candidate"
            );
            canvas.place_item(candidate.region, size, corner, index)?;
            placed += 1;
        }

        for canvas in &mut self.canvases {
            let left = canvas.simplify(self.config.filter_empty);
            debug!(canvas = %canvas.name(), regions = left, "simplified");
        }

        let report = PlanReport {
            canvases: self.canvases.len(),
            placed,
            unplaced: self.unplaced.clone(),
        };
        info!(
            canvases = report.canvases,
            placed = report.placed,
            unplaced = report.unplaced.len(),
            "plan complete"
        );
        Ok(report)
    }

    fn reject(&mut self, index: usize, size: Size, reason: UnplacedReason) {
        let key = self.items[index].key();
        warn!(index, %key, %size, ?reason, "item cannot be placed");
        self.unplaced.push(Unplaced {
            index,
            key,
            size,
            reason,
        });
    }

    /// Global minimum across every canvas; earlier canvases win ties.
    fn best_candidate(&self, size: &Size) -> Option<(usize, Candidate)> {
        let mut best: Option<(usize, Candidate)> = None;
        for (i, canvas) in self.canvases.iter().enumerate() {
            if let Some(c) = canvas.best_candidate(size, self.config.cost) {
                if best.is_none_or(|(_, b)| c.cost < b.cost) {
                    best = Some((i, c));
                }
            }
        }
        best
    }

    fn open_canvas(&mut self) -> Result<&mut Canvas> {
        let id = CanvasId(self.canvases.len());
        let canvas = Canvas::new(id, self.config.canvas_size, self.config.tolerance)?;
        info!(canvas = %canvas.name(), size = %self.config.canvas_size, "new canvas");
        self.canvases.push(canvas);
        let last = self.canvases.len() - 1;
        Ok(&mut self.canvases[last])
    }

    /// Locked regions of every canvas, in canvas order.
    pub fn sheets(&self) -> Vec<Sheet> {
        self.canvases.iter().map(|c| c.sheet(&self.items)).collect()
    }

    /// Serializable layout plus metadata.
    pub fn layout(&self) -> Layout {
        Layout {
            sheets: self.sheets(),
            meta: Meta {
                schema_version: "1".into(),
                app: "collage".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                canvas_size: self.config.canvas_size,
                tolerance: self.config.tolerance,
                cost: self.config.cost.to_string(),
                corner: self.config.corner.to_string(),
                unplaced: self.unplaced.iter().map(|u| u.key.clone()).collect(),
            },
        }
    }

    pub fn stats(&self) -> PackStats {
        self.layout().stats()
    }

    /// Hands every canvas to `backend` in order, stopping at the first
    /// failure.
    pub fn render<B: ImageBackend<I>>(&self, backend: &B) -> Result<Vec<B::Output>> {
        self.sheets()
            .iter()
            .map(|sheet| {
                debug!(sheet = %sheet.name, placements = sheet.placements.len(), "render");
                backend.render_sheet(sheet, &self.items)
            })
            .collect()
    }

    /// As [`Collage::render`], rendering canvases concurrently. Outputs stay
    /// in canvas order.
    #[cfg(feature = "parallel")]
    pub fn render_par<B>(&self, backend: &B) -> Result<Vec<B::Output>>
    where
        B: ImageBackend<I> + Sync,
        B::Output: Send,
        I: Sync,
    {
        self.sheets()
            .par_iter()
            .map(|sheet| backend.render_sheet(sheet, &self.items))
            .collect()
    }
}
