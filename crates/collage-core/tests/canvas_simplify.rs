use collage_core::model::{Rect, Size};
use collage_core::packer::canvas::{Canvas, CanvasId};
use collage_core::packer::region::{Corner, RegionId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn empty_canvas(w: f64, h: f64) -> Canvas {
    let mut c = Canvas::new(CanvasId(0), Size::new(w, h), Size::new(2.0, 2.0)).expect("canvas");
    c.remove_region(RegionId(0)).expect("remove initial");
    c
}

fn snapshot(c: &Canvas) -> Vec<(RegionId, Rect, bool)> {
    c.regions()
        .map(|r| (r.id(), *r.rect(), r.is_locked()))
        .collect()
}

#[test]
fn four_quadrants_collapse_to_one() {
    let mut c = empty_canvas(10.0, 10.0);
    for (x, y) in [(0.0, 0.0), (5.0, 0.0), (0.0, 5.0), (5.0, 5.0)] {
        c.add_region(Rect::new(x, y, 5.0, 5.0));
    }
    assert_eq!(c.simplify(false), 1);
    let only = c.regions().next().expect("one region");
    assert_eq!(*only.rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
    assert!(!only.is_locked());
}

#[test]
fn filter_empty_keeps_only_locked() {
    let mut c = Canvas::new(CanvasId(0), Size::new(10.0, 10.0), Size::new(2.0, 2.0)).expect("c");
    c.place(RegionId(0), Size::new(3.0, 4.0), Corner::TopLeft)
        .expect("place");
    assert_eq!(c.simplify(true), 1);
    let r = c.regions().next().expect("locked");
    assert!(r.is_locked());
    assert!(r.overlaps().is_empty());
}

#[test]
fn locked_regions_are_never_merged() {
    let mut c = empty_canvas(10.0, 5.0);
    let a = c.add_region(Rect::new(0.0, 0.0, 5.0, 5.0));
    c.add_region(Rect::new(5.0, 0.0, 5.0, 5.0));
    c.place(a, Size::new(5.0, 5.0), Corner::TopLeft)
        .expect("lock a");
    assert_eq!(c.simplify(false), 2);
}

#[test]
fn absorbed_conflicts_move_to_the_survivor() {
    let mut c = empty_canvas(20.0, 20.0);
    let a = c.add_region(Rect::new(0.0, 0.0, 5.0, 5.0));
    let b = c.add_region(Rect::new(5.0, 0.0, 5.0, 5.0));
    let other = c.add_region(Rect::new(8.0, 3.0, 6.0, 10.0));
    c.link(b, other).expect("link");

    c.simplify(false);
    assert!(c.region(b).is_none());
    let merged = c.region(a).expect("a");
    assert_eq!(*merged.rect(), Rect::new(0.0, 0.0, 10.0, 5.0));
    assert!(merged.overlaps().contains(&other));
    assert!(c.region(other).expect("other").overlaps().contains(&a));
}

#[test]
fn simplify_reaches_a_fixed_point_and_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let mut c =
            Canvas::new(CanvasId(0), Size::new(500.0, 400.0), Size::new(8.0, 8.0)).expect("c");
        for _ in 0..30 {
            let size = Size::new(rng.gen_range(10..=200) as f64, rng.gen_range(10..=200) as f64);
            let Some(id) = c
                .free_regions()
                .find(|r| r.fits(&size, &c.tolerance()).is_some())
                .map(|r| r.id())
            else {
                continue;
            };
            c.place_random(id, size, &mut rng).expect("place");
        }

        c.simplify(false);
        let free: Vec<_> = c.free_regions().collect();
        for a in &free {
            for b in &free {
                if a.id() != b.id() {
                    assert!(a.mergeable(b).is_none(), "{a} still mergeable with {b}");
                }
            }
        }

        let once = snapshot(&c);
        c.simplify(false);
        assert_eq!(snapshot(&c), once);
    }
}
