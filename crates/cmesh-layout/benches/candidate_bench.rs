//! Benchmarks for drop-candidate selection and drag updates.
//!
//! Run with: cargo bench -p cmesh-layout

use cmesh_core::geometry::{Point, Rect, Size};
use cmesh_layout::drag::select_candidate_zone;
use cmesh_layout::stacking::{StackAxis, pick_boundary, stack_boundaries};
use cmesh_layout::zone::ZoneRegistry;
use cmesh_layout::{DockZone, DraggableItem, ItemId, LayoutWorkspace, SizeClass, ZoneId};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// `n` zones tiled on a 10-wide grid of 120x120 cells with 10px gutters.
fn zone_grid(n: usize) -> ZoneRegistry {
    let mut zones = ZoneRegistry::new();
    for i in 0..n {
        let x = (i % 10) as f64 * 130.0;
        let y = (i / 10) as f64 * 130.0;
        zones
            .register(
                DockZone::new(format!("zone-{i}"), format!("Zone {i}"))
                    .with_bounds(Rect::new(x, y, 120.0, 120.0))
                    .with_max_items(4),
            )
            .expect("unique zone ids");
    }
    zones
}

fn probe_item() -> DraggableItem {
    DraggableItem::floating("probe", "chart", SizeClass::Medium, Point::ORIGIN, Size::new(80.0, 80.0))
}

fn bench_select_candidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag/select_candidate_zone");
    let item = probe_item();

    for n in [4, 16, 64, 256] {
        let zones = zone_grid(n);
        // Straddles the first four cells so several zones score.
        let rect = Rect::new(80.0, 80.0, 80.0, 80.0);
        group.bench_with_input(BenchmarkId::new("zones", n), &zones, |b, zones| {
            b.iter(|| black_box(select_candidate_zone(&item, black_box(&rect), zones, 0.2)))
        });
    }

    group.finish();
}

fn bench_stack_boundaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("stacking/boundaries");

    for n in [4, 32, 128] {
        let entries: Vec<(usize, Rect)> = (0..n)
            .map(|i| (i, Rect::new(0.0, i as f64 * 110.0, 400.0, 100.0)))
            .collect();
        let dragged = Rect::new(0.0, (n / 2) as f64 * 110.0 - 20.0, 400.0, 60.0);
        group.bench_with_input(BenchmarkId::new("vertical", n), &entries, |b, entries| {
            b.iter(|| {
                let bands = stack_boundaries(entries, StackAxis::Vertical, 16.0);
                black_box(pick_boundary(&dragged, &bands))
            })
        });
    }

    group.finish();
}

fn bench_drag_gesture(c: &mut Criterion) {
    let mut group = c.benchmark_group("workspace/drag_gesture");

    for n in [16, 64] {
        group.bench_function(BenchmarkId::new("begin_update_commit", n), |b| {
            b.iter_batched(
                || {
                    let mut ws = LayoutWorkspace::default();
                    for i in 0..n {
                        let x = (i % 10) as f64 * 130.0;
                        let y = (i / 10) as f64 * 130.0;
                        ws.register_zone(
                            DockZone::new(format!("zone-{i}"), format!("Zone {i}"))
                                .with_bounds(Rect::new(x, y, 120.0, 120.0)),
                        )
                        .expect("unique zone ids");
                    }
                    ws.register_item(probe_item()).expect("probe");
                    ws
                },
                |mut ws| {
                    let probe = ItemId::from("probe");
                    ws.begin_drag(&probe, Point::ORIGIN).expect("begin");
                    for step in 0..32 {
                        let t = f64::from(step) * 20.0;
                        black_box(ws.update_drag(Point::new(t, t)).expect("update"));
                    }
                    black_box(ws.commit_drag().expect("commit"));
                    black_box(ws.list_members(&ZoneId::from("zone-0")).map(<[ItemId]>::len).ok())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select_candidate, bench_stack_boundaries, bench_drag_gesture);
criterion_main!(benches);
