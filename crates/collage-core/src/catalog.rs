use crate::config::SortOrder;
use crate::error::Result;
use crate::model::Size;
use crate::packer::Item;
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An image known only by its path and pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    pub key: String,
    pub path: PathBuf,
    pub size: Size,
}

impl ImageItem {
    pub fn new(path: impl Into<PathBuf>, w: f64, h: f64) -> Self {
        let path = path.into();
        let key = path.to_string_lossy().replace('\\', "/");
        Self {
            key,
            path,
            size: Size::new(w, h),
        }
    }

    /// Final path component, used in logs.
    pub fn basename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.key)
    }
}

impl Item for ImageItem {
    fn size(&self) -> Size {
        self.size
    }
    fn key(&self) -> String {
        self.key.clone()
    }
}

/// Ordered collection of images to pack.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    items: Vec<ImageItem>,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the pixel size of each file. Unreadable files are skipped with a
    /// warning rather than failing the whole catalog.
    #[cfg(feature = "image")]
    pub fn probe<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self::probe_with(paths, |_| {})
    }

    /// Like [`ImageCatalog::probe`], calling `on_each` before each path is
    /// read (progress reporting).
    #[cfg(feature = "image")]
    pub fn probe_with<P, F>(paths: &[P], mut on_each: F) -> Self
    where
        P: AsRef<Path>,
        F: FnMut(&Path),
    {
        let mut catalog = Self::new();
        for p in paths {
            let p = p.as_ref();
            on_each(p);
            match image::image_dimensions(p) {
                Ok((w, h)) => catalog.push(ImageItem::new(p, w as f64, h as f64)),
                Err(e) => tracing::warn!(path = ?p, error = %e, "skip image"),
            }
        }
        catalog
    }

    pub fn push(&mut self, item: ImageItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<ImageItem> {
        self.items
    }

    /// Decreasing area, ties by key, so the result is deterministic.
    pub fn sort_by_area(&mut self) {
        self.items.sort_by(|a, b| {
            b.size
                .area()
                .total_cmp(&a.size.area())
                .then_with(|| a.key.cmp(&b.key))
        });
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.items.shuffle(rng);
    }

    pub fn arrange<R: Rng + ?Sized>(&mut self, order: SortOrder, rng: &mut R) {
        match order {
            SortOrder::AreaDesc => self.sort_by_area(),
            SortOrder::Shuffle => self.shuffle(rng),
            SortOrder::None => {}
        }
    }

    /// Width of the narrowest image, if any.
    pub fn narrowest_width(&self) -> Option<f64> {
        self.items.iter().map(|i| i.size.w).min_by(f64::total_cmp)
    }

    /// Height of the shortest image, if any.
    pub fn shortest_height(&self) -> Option<f64> {
        self.items.iter().map(|i| i.size.h).min_by(f64::total_cmp)
    }

    /// Scales images larger than `bounds` down to fit, keeping their aspect
    /// ratio. Returns how many were scaled.
    pub fn constrain_to(&mut self, bounds: &Size) -> Result<usize> {
        let mut scaled = 0;
        for item in &mut self.items {
            if item.size.w > bounds.w || item.size.h > bounds.h {
                let fitted = item.size.fit_into(bounds)?;
                debug!(image = item.basename(), from = %item.size, to = %fitted, "constrain");
                item.size = fitted;
                scaled += 1;
            }
        }
        Ok(scaled)
    }
}

impl FromIterator<ImageItem> for ImageCatalog {
    fn from_iter<T: IntoIterator<Item = ImageItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
