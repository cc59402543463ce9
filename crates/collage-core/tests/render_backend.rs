use collage_core::compositing::{PALETTE, RgbaBackend, blit_rgba};
use collage_core::prelude::*;
use image::{Rgba, RgbaImage};
use std::cell::RefCell;

/// Records the order in which sheets arrive and fails on demand.
struct Recorder {
    seen: RefCell<Vec<(usize, Vec<String>)>>,
    fail_on: Option<usize>,
}

impl ImageBackend<Size> for Recorder {
    type Output = usize;

    fn render_sheet(&self, sheet: &Sheet, _items: &[Size]) -> Result<usize> {
        let keys = sheet.placements.iter().map(|p| p.key.clone()).collect();
        self.seen.borrow_mut().push((sheet.id, keys));
        if self.fail_on == Some(sheet.id) {
            return Err(CollageError::InvalidInput(format!("cannot render {}", sheet.name)));
        }
        Ok(sheet.placements.len())
    }
}

fn three_canvases() -> Collage<Size> {
    let cfg = CollageConfig::builder()
        .canvas_size(100.0, 100.0)
        .tolerance(0.0, 0.0)
        .corner(CornerStrategy::Fixed(Corner::TopLeft))
        .build();
    let items = vec![
        Size::new(100.0, 100.0),
        Size::new(100.0, 60.0),
        Size::new(100.0, 100.0),
        Size::new(100.0, 40.0),
    ];
    let mut collage = Collage::new(cfg, items).expect("collage");
    collage.plan().expect("plan");
    collage
}

#[test]
fn backend_sees_canvases_then_regions_in_order() {
    let collage = three_canvases();
    let backend = Recorder {
        seen: RefCell::new(Vec::new()),
        fail_on: None,
    };
    let out = collage.render(&backend).expect("render");
    assert_eq!(out, vec![1, 2, 1]);
    let seen = backend.seen.into_inner();
    let ids: Vec<usize> = seen.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(seen[1].1, vec!["100x60", "100x40"]);
}

#[test]
fn render_stops_at_first_failure() {
    let collage = three_canvases();
    let backend = Recorder {
        seen: RefCell::new(Vec::new()),
        fail_on: Some(1),
    };
    let err = collage.render(&backend).unwrap_err();
    assert!(matches!(err, CollageError::InvalidInput(_)));
    assert_eq!(backend.seen.borrow().len(), 2);
}

#[test]
fn blit_clips_negative_offsets() {
    let src = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
    let mut canvas = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 255]));
    blit_rgba(&src, &mut canvas, -2, -1, false);
    assert_eq!(*canvas.get_pixel(0, 0), Rgba([9, 9, 9, 255]));
    assert_eq!(*canvas.get_pixel(1, 2), Rgba([9, 9, 9, 255]));
    assert_eq!(*canvas.get_pixel(2, 0), Rgba([0, 0, 0, 255]));
    assert_eq!(*canvas.get_pixel(0, 3), Rgba([0, 0, 0, 255]));
}

#[test]
fn rgba_backend_composites_images_from_disk() {
    let dir = std::env::temp_dir().join(format!("collage-render-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("dir");
    let red = dir.join("red.png");
    RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]))
        .save(&red)
        .expect("save red");
    let blue = dir.join("blue.png");
    RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]))
        .save(&blue)
        .expect("save blue");

    let catalog = ImageCatalog::probe(&[red, blue]);
    let cfg = CollageConfig::builder()
        .canvas_size(100.0, 100.0)
        .tolerance(0.0, 0.0)
        .corner(CornerStrategy::Fixed(Corner::TopLeft))
        .cost(CostFunction::Area)
        .build();
    let mut collage = Collage::new(cfg, catalog.into_items()).expect("collage");
    collage.plan().expect("plan");

    let canvases = collage.render(&RgbaBackend::new()).expect("render");
    assert_eq!(canvases.len(), 1);
    let img = &canvases[0];
    assert_eq!(img.dimensions(), (100, 100));
    assert_eq!(*img.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*img.get_pixel(39, 19), Rgba([255, 0, 0, 255]));
    assert_eq!(*img.get_pixel(99, 99), Rgba(PALETTE[0]));

    let blue_at = collage.sheets()[0].placements[1].offset;
    let (bx, by) = (blue_at.0 as u32, blue_at.1 as u32);
    assert_eq!(*img.get_pixel(bx, by), Rgba([0, 0, 255, 255]));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rgba_backend_reports_missing_files() {
    let items = vec![ImageItem::new("/nonexistent/collage/missing.png", 10.0, 10.0)];
    let mut collage = Collage::new(CollageConfig::default(), items).expect("collage");
    collage.plan().expect("plan");
    assert!(collage.render(&RgbaBackend::new()).is_err());
}
