use crate::catalog::ImageItem;
use crate::error::Result;
use crate::model::Sheet;
use crate::pipeline::ImageBackend;
use image::imageops::{self, FilterType};
use image::{ImageReader, Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Background colours cycled by canvas id, so neighbouring canvases are
/// easy to tell apart in a slideshow.
pub const PALETTE: [[u8; 4]; 6] = [
    [0, 0, 0, 255],
    [32, 32, 48, 255],
    [48, 32, 32, 255],
    [32, 48, 32, 255],
    [40, 40, 40, 255],
    [24, 24, 32, 255],
];

/// Copy `src` into `canvas` with its top-left at (dx, dy). Pixels that fall
/// outside the canvas are clipped, so negative offsets from a permitted
/// overhang are fine. Draws a 1px red outline around the copied area when
/// `outline` is set.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: i64, dy: i64, outline: bool) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    let inside = |x: i64, y: i64| x >= 0 && y >= 0 && x < cw as i64 && y < ch as i64;

    for yy in 0..sh {
        for xx in 0..sw {
            let (x, y) = (dx + xx as i64, dy + yy as i64);
            if inside(x, y) {
                canvas.put_pixel(x as u32, y as u32, *src.get_pixel(xx, yy));
            }
        }
    }

    if outline && sw > 0 && sh > 0 {
        let red = Rgba([255, 0, 0, 255]);
        let (right, bottom) = (dx + sw as i64 - 1, dy + sh as i64 - 1);
        for x in dx..=right {
            for y in [dy, bottom] {
                if inside(x, y) {
                    canvas.put_pixel(x as u32, y as u32, red);
                }
            }
        }
        for y in dy..=bottom {
            for x in [dx, right] {
                if inside(x, y) {
                    canvas.put_pixel(x as u32, y as u32, red);
                }
            }
        }
    }
}

/// Renders each sheet into an RGBA canvas by loading every image from disk,
/// scaling it to its fitted size and centring it in its frame.
#[derive(Debug, Clone, Default)]
pub struct RgbaBackend {
    /// Overrides the palette with a single background colour.
    pub background: Option<[u8; 4]>,
    /// Outline each placed image, for debugging layouts.
    pub outlines: bool,
}

impl RgbaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background_for(&self, sheet: &Sheet) -> Rgba<u8> {
        Rgba(
            self.background
                .unwrap_or(PALETTE[sheet.id % PALETTE.len()]),
        )
    }
}

impl ImageBackend<ImageItem> for RgbaBackend {
    type Output = RgbaImage;

    #[instrument(skip_all, fields(sheet = %sheet.name))]
    fn render_sheet(&self, sheet: &Sheet, items: &[ImageItem]) -> Result<RgbaImage> {
        let (w, h) = sheet.size.rounded();
        let mut canvas = RgbaImage::from_pixel(w, h, self.background_for(sheet));
        for p in &sheet.placements {
            let Some(item) = p.item.and_then(|i| items.get(i)) else {
                debug!(key = %p.key, "no image for placement");
                continue;
            };
            let (fw, fh) = p.fitted.rounded();
            if fw == 0 || fh == 0 {
                continue;
            }
            let img = ImageReader::open(&item.path)?
                .with_guessed_format()?
                .decode()?
                .to_rgba8();
            let scaled = if img.dimensions() == (fw, fh) {
                img
            } else {
                imageops::resize(&img, fw, fh, FilterType::Lanczos3)
            };
            debug!(image = item.basename(), x = p.offset.0, y = p.offset.1, w = fw, h = fh, "composite");
            blit_rgba(&scaled, &mut canvas, p.offset.0, p.offset.1, self.outlines);
        }
        Ok(canvas)
    }
}
