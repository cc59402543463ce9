use super::Item;
use super::region::{Corner, Leftover, Lock, Region, RegionId, SIBLING_CONFLICTS, plan_split};
use crate::config::CostFunction;
use crate::error::{CollageError, Result};
use crate::model::{Edge, Placement, Rect, Sheet, Size};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Packer-scoped canvas identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanvasId(pub usize);

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Best free region of a canvas for some item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub region: RegionId,
    pub remainder: Size,
    pub cost: f64,
}

/// One fixed-size output surface.
///
/// Regions live in a store keyed by [`RegionId`] and refer to each other by
/// id only. Free regions may overlap, but only along recorded conflict edges;
/// locked regions never overlap anything.
#[derive(Debug, Clone)]
pub struct Canvas {
    id: CanvasId,
    bounds: Size,
    tolerance: Size,
    regions: BTreeMap<RegionId, Region>,
    next_region: u64,
}

impl Canvas {
    /// Creates a canvas holding a single free region covering `bounds`.
    pub fn new(id: CanvasId, bounds: Size, tolerance: Size) -> Result<Self> {
        if !bounds.is_valid() {
            return Err(CollageError::InvalidSize {
                w: bounds.w,
                h: bounds.h,
            });
        }
        if !(tolerance.w >= 0.0 && tolerance.h >= 0.0) {
            return Err(CollageError::InvalidConfig(format!(
                "tolerance must be non-negative, got {}x{}",
                tolerance.w, tolerance.h
            )));
        }
        let mut canvas = Self {
            id,
            bounds,
            tolerance,
            regions: BTreeMap::new(),
            next_region: 0,
        };
        canvas.insert(Rect::from_size(bounds), None);
        Ok(canvas)
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn tolerance(&self) -> Size {
        self.tolerance
    }

    /// Name usable as a file stem.
    pub fn name(&self) -> String {
        format!("canvas{}", self.id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// All regions, oldest first.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn free_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(|r| !r.is_locked())
    }

    pub fn locked_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(|r| r.is_locked())
    }

    /// Adds a free region. It may overlap other free regions; record such
    /// overlaps with [`Canvas::link`].
    pub fn add_region(&mut self, rect: Rect) -> RegionId {
        self.insert(rect, None)
    }

    fn insert(&mut self, rect: Rect, origin: Option<(Corner, Leftover)>) -> RegionId {
        let id = RegionId(self.next_region);
        self.next_region += 1;
        let region = Region::new(id, rect, origin);
        debug!(canvas = %self.name(), region = %region, "add region");
        self.regions.insert(id, region);
        id
    }

    /// Records that `a` and `b` overlap, in both directions.
    pub fn link(&mut self, a: RegionId, b: RegionId) -> Result<()> {
        if a == b {
            return Err(CollageError::InvalidInput(format!(
                "region {a} cannot conflict with itself"
            )));
        }
        for id in [a, b] {
            if !self.regions.contains_key(&id) {
                return Err(CollageError::UnknownRegion(id));
            }
        }
        self.link_unchecked(a, b);
        Ok(())
    }

    fn link_unchecked(&mut self, a: RegionId, b: RegionId) {
        if let Some(r) = self.regions.get_mut(&a) {
            r.overlaps.insert(b);
        }
        if let Some(r) = self.regions.get_mut(&b) {
            r.overlaps.insert(a);
        }
    }

    /// Drops every conflict edge of `id` on both sides.
    fn unlink(&mut self, id: RegionId) -> Vec<RegionId> {
        let others: Vec<RegionId> = match self.regions.get_mut(&id) {
            Some(r) => std::mem::take(&mut r.overlaps).into_iter().collect(),
            None => return Vec::new(),
        };
        for other in &others {
            if let Some(r) = self.regions.get_mut(other) {
                r.overlaps.remove(&id);
            }
        }
        others
    }

    /// Removes a region, unlinking its conflicts first.
    pub fn remove_region(&mut self, id: RegionId) -> Result<Region> {
        self.detach(id).ok_or(CollageError::UnknownRegion(id))
    }

    /// Removes `id` from the store. The returned region keeps its former
    /// conflict set; the other side of every edge has already been cleared.
    fn detach(&mut self, id: RegionId) -> Option<Region> {
        let others = self.unlink(id);
        let mut region = self.regions.remove(&id)?;
        debug!(canvas = %self.name(), region = %region, "remove region");
        region.overlaps = others.into_iter().collect();
        Some(region)
    }

    /// Unused width and height if `size` were placed in region `id`.
    pub fn fits(&self, id: RegionId, size: &Size) -> Result<Option<Size>> {
        let region = self
            .regions
            .get(&id)
            .ok_or(CollageError::UnknownRegion(id))?;
        if region.is_locked() {
            return Ok(None);
        }
        Ok(region.fits(size, &self.tolerance))
    }

    /// Places an item of `size` in region `id`, anchored at `corner`.
    ///
    /// Free regions conflicting with `id` are destroyed, `id` shrinks to the
    /// item's footprint and locks, and up to five leftover regions are
    /// created. Returns the new regions' ids in creation order.
    pub fn place(&mut self, id: RegionId, size: Size, corner: Corner) -> Result<Vec<RegionId>> {
        self.place_locked(id, Lock { size, item: None }, corner)
    }

    /// As [`Canvas::place`], tagging the lock with the packer's item index.
    pub fn place_item(
        &mut self,
        id: RegionId,
        size: Size,
        corner: Corner,
        item: usize,
    ) -> Result<Vec<RegionId>> {
        self.place_locked(
            id,
            Lock {
                size,
                item: Some(item),
            },
            corner,
        )
    }

    /// As [`Canvas::place`] with a corner drawn uniformly from `rng`.
    pub fn place_random<R: Rng + ?Sized>(
        &mut self,
        id: RegionId,
        size: Size,
        rng: &mut R,
    ) -> Result<Vec<RegionId>> {
        self.place(id, size, Corner::random(rng))
    }

    fn place_locked(&mut self, id: RegionId, lock: Lock, corner: Corner) -> Result<Vec<RegionId>> {
        let region = self
            .regions
            .get(&id)
            .ok_or(CollageError::UnknownRegion(id))?;
        if region.is_locked() {
            return Err(CollageError::Placement(format!(
                "{region} is already locked"
            )));
        }
        let remainder = region.fits(&lock.size, &self.tolerance).ok_or_else(|| {
            CollageError::Placement(format!("{} doesn't fit in {region}", lock.size))
        })?;
        let plan = plan_split(&region.rect, &lock.size, &remainder, corner, &self.tolerance);
        debug!(canvas = %self.name(), region = %region, item = %lock.size, %corner, "place");

        // Kill linked overlapping spaces. Nothing below can fail, so the
        // canvas never exposes a half-unlinked conflict pair.
        let victims: Vec<RegionId> = self
            .unlink(id)
            .into_iter()
            .filter(|v| self.regions.get(v).is_some_and(|r| !r.is_locked()))
            .collect();
        for victim in victims {
            self.detach(victim);
        }

        if let Some(parent) = self.regions.get_mut(&id) {
            parent.rect = plan.footprint;
            parent.lock = Some(lock);
        }

        let created: Vec<(Leftover, RegionId)> = plan
            .children
            .iter()
            .map(|(role, rect)| (*role, self.insert(*rect, Some((corner, *role)))))
            .collect();
        for (a, b) in SIBLING_CONFLICTS {
            let ia = created.iter().find(|(role, _)| *role == a);
            let ib = created.iter().find(|(role, _)| *role == b);
            if let (Some((_, ia)), Some((_, ib))) = (ia, ib) {
                self.link_unchecked(*ia, *ib);
            }
        }
        Ok(created.into_iter().map(|(_, id)| id).collect())
    }

    /// Merges free regions that share a full edge until no merge is left,
    /// then optionally drops the remaining free regions. Returns the number
    /// of regions left.
    pub fn simplify(&mut self, filter_empty: bool) -> usize {
        debug!(canvas = %self.name(), regions = self.regions.len(), "simplifying");
        let mut merged = true;
        while merged {
            merged = false;
            let ids: Vec<RegionId> = self.regions.keys().copied().collect();
            for a in ids {
                while let Some((b, edge)) = self.merge_partner(a) {
                    self.absorb(a, b, edge);
                    merged = true;
                }
            }
        }
        if filter_empty {
            let before = self.regions.len();
            self.regions.retain(|_, r| r.is_locked());
            // Free regions only ever conflict with free regions.
            for r in self.regions.values_mut() {
                r.overlaps.clear();
            }
            if self.regions.len() != before {
                debug!(
                    canvas = %self.name(),
                    filtered = before - self.regions.len(),
                    "filtered empty regions"
                );
            }
        }
        self.regions.len()
    }

    /// First free region flush against free region `a`, if any.
    fn merge_partner(&self, a: RegionId) -> Option<(RegionId, Edge)> {
        let ra = self.regions.get(&a).filter(|r| !r.is_locked())?;
        self.regions
            .values()
            .filter(|rb| rb.id != a && !rb.is_locked())
            .find_map(|rb| ra.mergeable(rb).map(|edge| (rb.id, edge)))
    }

    fn absorb(&mut self, a: RegionId, b: RegionId, edge: Edge) {
        let Some(rb) = self.detach(b) else { return };
        let Some(ra) = self.regions.get_mut(&a) else { return };
        debug!(into = %ra, from = %rb, ?edge, "merge");
        match edge {
            Edge::Left => {
                ra.rect.x = rb.rect.x;
                ra.rect.w += rb.rect.w;
            }
            Edge::Right => ra.rect.w += rb.rect.w,
            Edge::Top => {
                ra.rect.y = rb.rect.y;
                ra.rect.h += rb.rect.h;
            }
            Edge::Bottom => ra.rect.h += rb.rect.h,
        }
        // The merged region covers b, so it inherits b's conflicts.
        for other in rb.overlaps.into_iter().filter(|o| *o != a) {
            if self.regions.contains_key(&other) {
                self.link_unchecked(a, other);
            }
        }
    }

    /// Lowest-cost free region that fits `size`; the oldest region wins ties.
    pub fn best_candidate(&self, size: &Size, cost: CostFunction) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for region in self.free_regions() {
            let Some(remainder) = region.fits(size, &self.tolerance) else {
                continue;
            };
            let score = cost.score(&remainder);
            if best.is_none_or(|b| score < b.cost) {
                best = Some(Candidate {
                    region: region.id,
                    remainder,
                    cost: score,
                });
            }
        }
        best
    }

    /// Corner of region `id` nearest (Manhattan) to the same corner of the
    /// canvas, so items hug the canvas edges. Ties go TL, TR, BL, BR.
    pub fn nearest_corner(&self, id: RegionId) -> Option<Corner> {
        let region = self.regions.get(&id)?;
        let bounds = Rect::from_size(self.bounds);
        let mut best = (Corner::TopLeft, f64::INFINITY);
        for corner in Corner::ALL {
            let (rx, ry) = corner.point_of(&region.rect);
            let (cx, cy) = corner.point_of(&bounds);
            let d = (rx - cx).abs() + (ry - cy).abs();
            if d < best.1 {
                best = (corner, d);
            }
        }
        Some(best.0)
    }

    /// Snapshot of the locked regions for export and rendering.
    pub fn sheet<I: Item>(&self, items: &[I]) -> Sheet {
        let placements = self
            .locked_regions()
            .filter_map(|r| {
                let lock = r.lock.as_ref()?;
                let fitted = lock.size.fit_into(&r.rect.size()).unwrap_or(r.rect.size());
                let key = match lock.item.and_then(|i| items.get(i)) {
                    Some(item) => item.key(),
                    None => lock.size.geometry(),
                };
                Some(Placement {
                    key,
                    item: lock.item,
                    frame: r.rect,
                    size: lock.size,
                    fitted,
                    offset: r.rect.centre_offset(&fitted),
                })
            })
            .collect();
        Sheet {
            id: self.id.0,
            name: self.name(),
            size: self.bounds,
            placements,
        }
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Canvas {}", self.name())?;
        for r in self.regions.values() {
            write!(f, " {r}")?;
        }
        f.write_str("}")
    }
}
