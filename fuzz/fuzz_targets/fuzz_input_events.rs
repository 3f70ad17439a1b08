#![no_main]

use cmesh_core::geometry::{Point, Rect, Size};
use cmesh_layout::{DockZone, DraggableItem, LayoutConfig, LayoutInputEvent, LayoutWorkspace, SizeClass};
use libfuzzer_sys::fuzz_target;

// Newline-delimited JSON: the first line is an optional config, the rest are
// input events. Malformed lines are skipped.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut lines = text.lines();
    let config = lines
        .next()
        .and_then(|line| LayoutConfig::from_json(line).ok())
        .unwrap_or_default();
    let Ok(mut ws) = LayoutWorkspace::new(config) else {
        return;
    };

    let _ = ws.register_zone(DockZone::new("left", "Left").with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0)));
    let _ = ws.register_zone(
        DockZone::new("right", "Right")
            .with_bounds(Rect::new(300.0, 0.0, 200.0, 200.0))
            .with_max_items(1),
    );
    let _ = ws.register_item(DraggableItem::floating(
        "a",
        "chart",
        SizeClass::Medium,
        Point::new(500.0, 500.0),
        Size::new(50.0, 50.0),
    ));
    let _ = ws.register_item(DraggableItem::docked("b", "table", SizeClass::Small, "right", Size::new(40.0, 40.0)));

    for line in lines.take(512) {
        let Ok(event) = serde_json::from_str::<LayoutInputEvent>(line) else {
            continue;
        };
        let _ = ws.apply_input(&event);
        let report = ws.invariant_report();
        assert!(!report.has_errors(), "invariants broken: {:?}", report.issues);
    }
    ws.flush_all_resizes();
    assert!(!ws.invariant_report().has_errors());
});
