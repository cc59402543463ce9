use crate::model::{Layout, Placement};
use serde_json::{Value, json};

fn placement_fields(p: &Placement) -> (Value, Value, Value) {
    let (w, h) = p.frame.size().rounded();
    let frame = json!({"x": p.frame.x.round() as i64, "y": p.frame.y.round() as i64, "w": w, "h": h});
    let (fw, fh) = p.fitted.rounded();
    let fitted = json!({"w": fw, "h": fh});
    let offset = json!({"x": p.offset.0, "y": p.offset.1});
    (frame, fitted, offset)
}

/// Serialize the layout as `{ canvases, meta }` (array-of-canvases style)
/// with integer pixel coordinates.
pub fn to_json_layout(layout: &Layout) -> Value {
    let canvases = layout
        .sheets
        .iter()
        .map(|s| {
            let placements: Vec<Value> = s
                .placements
                .iter()
                .map(|p| {
                    let (frame, fitted, offset) = placement_fields(p);
                    json!({
                        "key": p.key,
                        "frame": frame,
                        "fitted": fitted,
                        "offset": offset,
                    })
                })
                .collect();
            let (w, h) = s.size.rounded();
            json!({
                "id": s.id,
                "name": s.name,
                "width": w,
                "height": h,
                "placements": placements,
            })
        })
        .collect::<Vec<_>>();
    json!({"canvases": canvases, "meta": &layout.meta})
}

/// Flatten placements keyed by item key, with the owning canvas.
/// Shape: `{ placements: { key: { frame, fitted, offset, canvas } }, meta }`.
///
/// Repeated keys get a `#2`, `#3`, ... suffix in placement order, so no
/// entry is overwritten.
pub fn to_json_hash(layout: &Layout) -> Value {
    let mut placements = serde_json::Map::new();
    for sheet in &layout.sheets {
        for p in &sheet.placements {
            let (frame, fitted, offset) = placement_fields(p);
            let mut key = p.key.clone();
            let mut n = 1;
            while placements.contains_key(&key) {
                n += 1;
                key = format!("{}#{n}", p.key);
            }
            placements.insert(
                key,
                json!({
                    "frame": frame,
                    "fitted": fitted,
                    "offset": offset,
                    "canvas": sheet.id,
                }),
            );
        }
    }
    json!({ "placements": placements, "meta": &layout.meta })
}
