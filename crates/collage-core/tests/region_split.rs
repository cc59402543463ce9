use collage_core::model::{Rect, Size};
use collage_core::packer::canvas::{Canvas, CanvasId};
use collage_core::packer::region::{Corner, Leftover, RegionId};

fn canvas_10x10() -> Canvas {
    Canvas::new(CanvasId(0), Size::new(10.0, 10.0), Size::new(2.0, 2.0)).expect("canvas")
}

fn rect_of(c: &Canvas, id: RegionId) -> Rect {
    *c.region(id).expect("region").rect()
}

fn overlaps_of(c: &Canvas, id: RegionId) -> Vec<u64> {
    c.region(id)
        .expect("region")
        .overlaps()
        .iter()
        .map(|r| r.0)
        .collect()
}

#[test]
fn top_left_split_creates_five_leftovers() {
    let mut c = canvas_10x10();
    let created = c
        .place(RegionId(0), Size::new(3.0, 4.0), Corner::TopLeft)
        .expect("place");
    assert_eq!(
        created,
        vec![RegionId(1), RegionId(2), RegionId(3), RegionId(4), RegionId(5)]
    );

    let locked = c.region(RegionId(0)).expect("locked");
    assert!(locked.is_locked());
    assert_eq!(*locked.rect(), Rect::new(0.0, 0.0, 3.0, 4.0));
    assert!(locked.overlaps().is_empty());

    assert_eq!(rect_of(&c, RegionId(1)), Rect::new(3.0, 0.0, 7.0, 10.0));
    assert_eq!(rect_of(&c, RegionId(2)), Rect::new(0.0, 4.0, 10.0, 6.0));
    assert_eq!(rect_of(&c, RegionId(3)), Rect::new(3.0, 0.0, 7.0, 4.0));
    assert_eq!(rect_of(&c, RegionId(4)), Rect::new(0.0, 4.0, 3.0, 6.0));
    assert_eq!(rect_of(&c, RegionId(5)), Rect::new(3.0, 4.0, 7.0, 6.0));

    // XL-{YL,XS,C}, YL-{XL,YS,C}, XS-XL, YS-YL, C-{XL,YL}
    assert_eq!(overlaps_of(&c, RegionId(1)), vec![2, 3, 5]);
    assert_eq!(overlaps_of(&c, RegionId(2)), vec![1, 4, 5]);
    assert_eq!(overlaps_of(&c, RegionId(3)), vec![1]);
    assert_eq!(overlaps_of(&c, RegionId(4)), vec![2]);
    assert_eq!(overlaps_of(&c, RegionId(5)), vec![1, 2]);

    let roles: Vec<_> = created
        .iter()
        .map(|id| c.region(*id).and_then(|r| r.origin()).map(|(_, role)| role))
        .collect();
    assert_eq!(
        roles,
        vec![
            Some(Leftover::XLarge),
            Some(Leftover::YLarge),
            Some(Leftover::XSmall),
            Some(Leftover::YSmall),
            Some(Leftover::Corner)
        ]
    );
}

#[test]
fn only_horizontal_leftover() {
    let mut c = canvas_10x10();
    let created = c
        .place(RegionId(0), Size::new(5.0, 9.0), Corner::TopLeft)
        .expect("place");
    assert_eq!(created, vec![RegionId(1)]);
    assert_eq!(rect_of(&c, RegionId(1)), Rect::new(5.0, 0.0, 5.0, 10.0));
    assert!(overlaps_of(&c, RegionId(1)).is_empty());
    // No vertical leftover, so the lock keeps the full height.
    assert_eq!(rect_of(&c, RegionId(0)), Rect::new(0.0, 0.0, 5.0, 10.0));
}

#[test]
fn no_leftover_below_tolerance() {
    let mut c = canvas_10x10();
    let created = c
        .place(RegionId(0), Size::new(9.0, 9.0), Corner::TopLeft)
        .expect("place");
    assert!(created.is_empty());
    assert_eq!(c.len(), 1);
    assert_eq!(rect_of(&c, RegionId(0)), Rect::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn overhang_within_tolerance_keeps_parent_extent() {
    let mut c = canvas_10x10();
    let created = c
        .place(RegionId(0), Size::new(12.0, 4.0), Corner::BottomRight)
        .expect("place");
    // Only the vertical strip above the item survives.
    assert_eq!(created.len(), 1);
    assert_eq!(rect_of(&c, created[0]), Rect::new(0.0, 0.0, 10.0, 6.0));
    assert_eq!(rect_of(&c, RegionId(0)), Rect::new(0.0, 6.0, 10.0, 4.0));
}

#[test]
fn each_corner_mirrors_the_topology() {
    // (corner, footprint, XL, YL, XS, YS, C) for a 3x4 item in 10x10.
    let cases = [
        (
            Corner::TopRight,
            Rect::new(7.0, 0.0, 3.0, 4.0),
            Rect::new(0.0, 0.0, 7.0, 10.0),
            Rect::new(0.0, 4.0, 10.0, 6.0),
            Rect::new(0.0, 0.0, 7.0, 4.0),
            Rect::new(7.0, 4.0, 3.0, 6.0),
            Rect::new(0.0, 4.0, 7.0, 6.0),
        ),
        (
            Corner::BottomLeft,
            Rect::new(0.0, 6.0, 3.0, 4.0),
            Rect::new(3.0, 0.0, 7.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, 6.0),
            Rect::new(3.0, 6.0, 7.0, 4.0),
            Rect::new(0.0, 0.0, 3.0, 6.0),
            Rect::new(3.0, 0.0, 7.0, 6.0),
        ),
        (
            Corner::BottomRight,
            Rect::new(7.0, 6.0, 3.0, 4.0),
            Rect::new(0.0, 0.0, 7.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, 6.0),
            Rect::new(0.0, 6.0, 7.0, 4.0),
            Rect::new(7.0, 0.0, 3.0, 6.0),
            Rect::new(0.0, 0.0, 7.0, 6.0),
        ),
    ];
    for (corner, footprint, xl, yl, xs, ys, cr) in cases {
        let mut c = canvas_10x10();
        let ids = c
            .place(RegionId(0), Size::new(3.0, 4.0), corner)
            .expect("place");
        assert_eq!(rect_of(&c, RegionId(0)), footprint, "{corner}");
        let got: Vec<Rect> = ids.iter().map(|id| rect_of(&c, *id)).collect();
        assert_eq!(got, vec![xl, yl, xs, ys, cr], "{corner}");
    }
}

#[test]
fn small_leftovers_tile_the_parent_without_the_item() {
    for corner in Corner::ALL {
        let mut c = canvas_10x10();
        let ids = c
            .place(RegionId(0), Size::new(3.0, 4.0), corner)
            .expect("place");
        let item = rect_of(&c, RegionId(0));
        let tiles: Vec<Rect> = ids[2..].iter().map(|id| rect_of(&c, *id)).collect();
        let area: f64 = tiles.iter().map(|r| r.area()).sum::<f64>() + item.area();
        assert_eq!(area, 100.0, "{corner}");
        for (i, a) in tiles.iter().enumerate() {
            assert!(!a.intersects(&item), "{corner}: {a} hits item");
            for b in &tiles[i + 1..] {
                assert!(!a.intersects(b), "{corner}: {a} hits {b}");
            }
        }
        for id in &ids {
            assert!(!rect_of(&c, *id).intersects(&item), "{corner}");
        }
    }
}

#[test]
fn zero_tolerance_never_creates_empty_regions() {
    let mut c =
        Canvas::new(CanvasId(0), Size::new(10.0, 10.0), Size::new(0.0, 0.0)).expect("canvas");
    let created = c
        .place(RegionId(0), Size::new(10.0, 4.0), Corner::TopLeft)
        .expect("place");
    assert_eq!(created.len(), 1);
    assert_eq!(rect_of(&c, created[0]), Rect::new(0.0, 4.0, 10.0, 6.0));
}
