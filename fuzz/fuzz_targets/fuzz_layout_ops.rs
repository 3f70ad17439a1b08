#![no_main]

use arbitrary::Arbitrary;
use cmesh_core::geometry::{Point, Rect, Size};
use cmesh_layout::{
    DockZone, DraggableItem, ItemId, LayoutWorkspace, ResizeHandle, ResizeTarget, SizeClass, ZoneId,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    AddItem { id: u8, class: u8, x: i16, y: i16, w: u8, h: u8 },
    AddDockedItem { id: u8, zone: u8, class: u8 },
    RemoveItem { id: u8 },
    AddZone { id: u8, x: i16, y: i16, w: u8, h: u8, max: u8, bounded: bool },
    RemoveZone { id: u8, force: bool },
    BeginDrag { id: u8, x: i16, y: i16 },
    BeginZoneDrag { id: u8, x: i16, y: i16 },
    MoveDrag { x: i16, y: i16 },
    CommitDrag,
    CancelDrag,
    Dock { id: u8, zone: u8 },
    Undock { id: u8 },
    Front { id: u8 },
    Stack { zone: u8, index: u8 },
    Resize { id: u8, handle: u8, dx: i16, dy: i16 },
}

fn item(id: u8) -> ItemId {
    ItemId::new(format!("i{}", id % 12))
}

fn zone(id: u8) -> ZoneId {
    ZoneId::new(format!("z{}", id % 5))
}

fn class(raw: u8) -> SizeClass {
    SizeClass::ALL[usize::from(raw) % SizeClass::ALL.len()]
}

fn point(x: i16, y: i16) -> Point {
    Point::new(f64::from(x), f64::from(y))
}

fn apply(ws: &mut LayoutWorkspace, op: FuzzOp) {
    match op {
        FuzzOp::AddItem { id, class: c, x, y, w, h } => {
            let size = Size::new(f64::from(w), f64::from(h));
            let _ = ws.register_item(DraggableItem::floating(item(id), "fuzz", class(c), point(x, y), size));
        }
        FuzzOp::AddDockedItem { id, zone: z, class: c } => {
            let size = Size::new(40.0, 40.0);
            let _ = ws.register_item(DraggableItem::docked(item(id), "fuzz", class(c), zone(z), size));
        }
        FuzzOp::RemoveItem { id } => {
            let _ = ws.unregister_item(&item(id));
        }
        FuzzOp::AddZone { id, x, y, w, h, max, bounded } => {
            let mut dock = DockZone::new(zone(id), "fuzz");
            if bounded {
                dock = dock.with_bounds(Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h)));
            }
            if max > 0 {
                dock = dock.with_max_items(usize::from(max % 4));
            }
            let _ = ws.register_zone(dock);
        }
        FuzzOp::RemoveZone { id, force } => {
            let _ = ws.unregister_zone(&zone(id), force);
        }
        FuzzOp::BeginDrag { id, x, y } => {
            let _ = ws.begin_drag(&item(id), point(x, y));
        }
        FuzzOp::BeginZoneDrag { id, x, y } => {
            let _ = ws.begin_zone_drag(&zone(id), point(x, y));
        }
        FuzzOp::MoveDrag { x, y } => {
            let _ = ws.update_drag(point(x, y));
        }
        FuzzOp::CommitDrag => {
            let _ = ws.commit_drag();
        }
        FuzzOp::CancelDrag => {
            ws.cancel_drag();
        }
        FuzzOp::Dock { id, zone: z } => {
            let _ = ws.dock_item(&item(id), &zone(z));
        }
        FuzzOp::Undock { id } => {
            let _ = ws.undock_item(&item(id), None);
        }
        FuzzOp::Front { id } => {
            let _ = ws.bring_to_front(&item(id));
        }
        FuzzOp::Stack { zone: z, index } => {
            let _ = ws.insert_into_stack(&zone(z), usize::from(index));
        }
        FuzzOp::Resize { id, handle, dx, dy } => {
            let target = ResizeTarget::Item(item(id));
            let handle = ResizeHandle::ALL[usize::from(handle) % ResizeHandle::ALL.len()];
            if ws.begin_resize(target.clone(), handle, Point::ORIGIN).is_ok() {
                let _ = ws.update_resize(&target, point(dx, dy));
                let _ = ws.end_resize(&target);
            }
        }
    }
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let mut ws = LayoutWorkspace::default();
    for op in ops.into_iter().take(256) {
        apply(&mut ws, op);

        let report = ws.invariant_report();
        assert!(!report.has_errors(), "invariants broken: {:?}", report.issues);
    }
    for item in ws.items() {
        assert!(item.size.width >= 0.0 && item.size.height >= 0.0, "negative size");
    }
});
