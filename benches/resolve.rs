use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use tz_locator::index::{BvhIndex, BvhNode, NodeId};
use tz_locator::store::codec::encode_ring;
use tz_locator::{
    BoundingBox, EvaluationMode, MemoryRingSource, Point, PolygonRef, PolygonStore, RingKey,
    TimezoneResolver,
};

/// Build a balanced BVH over an `n` x `n` grid of unit cells, one zone per
/// cell, with a 32-gon ring inscribed in each cell.
fn make_grid(n: usize) -> (Arc<BvhIndex>, MemoryRingSource) {
    let mut cells = Vec::with_capacity(n * n);
    let mut src = MemoryRingSource::new();

    for y in 0..n {
        for x in 0..n {
            let id = format!("Grid/Cell_{x}_{y}");
            let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
            let ring: Vec<[f64; 2]> = (0..32)
                .map(|k| {
                    let a = k as f64 / 32.0 * std::f64::consts::TAU;
                    [cx + 0.5 * a.cos(), cy + 0.5 * a.sin()]
                })
                .collect();
            src.insert(RingKey::new(id.clone(), 0), encode_ring(&ring));

            let bbox = BoundingBox::from_points(&ring).expect("non-empty ring");
            cells.push(PolygonRef {
                timezone_id: id,
                ring_index: 0,
                bbox,
                dir_name: None,
            });
        }
    }

    let mut nodes = Vec::new();
    build(&mut nodes, cells);
    let index = BvhIndex::from_nodes(nodes).expect("valid grid hierarchy");
    (Arc::new(index), src)
}

/// Median split on the longer axis, leaves of at most 4 refs.
fn build(nodes: &mut Vec<BvhNode>, mut refs: Vec<PolygonRef>) -> NodeId {
    let bbox = refs
        .iter()
        .map(|r| r.bbox)
        .reduce(|a, b| a.merge(&b))
        .expect("non-empty split");
    let id = NodeId(nodes.len() as u32);

    if refs.len() <= 4 {
        nodes.push(BvhNode::Leaf {
            bbox,
            polygons: refs,
        });
        return id;
    }

    let axis = if bbox.max[0] - bbox.min[0] >= bbox.max[1] - bbox.min[1] {
        0
    } else {
        1
    };
    refs.sort_by(|a, b| a.bbox.min[axis].total_cmp(&b.bbox.min[axis]));
    let right = refs.split_off(refs.len() / 2);

    nodes.push(BvhNode::Leaf {
        bbox,
        polygons: Vec::new(),
    });
    let l = build(nodes, refs);
    let r = build(nodes, right);
    nodes[id.index()] = BvhNode::Internal {
        bbox,
        children: [l, r],
    };
    id
}

fn query_points(n: usize) -> Vec<Point> {
    (0..1_000)
        .map(|i| {
            let t = i as f64 * 0.618_033_988_75;
            Point::new((t * 7.0) % n as f64, (t * 13.0) % n as f64)
        })
        .collect()
}

fn bench_candidates(c: &mut Criterion) {
    let (index, _) = make_grid(64);
    let points = query_points(64);

    c.bench_function("bvh_candidates_4k_cells", |b| {
        b.iter(|| {
            for p in &points {
                std::hint::black_box(index.candidates(*p).expect("valid handles"));
            }
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let (index, src) = make_grid(64);
    let points = query_points(64);

    c.bench_function("resolve_cold_cache_1k_points", |b| {
        b.iter_batched(
            || TimezoneResolver::new(Arc::clone(&index), PolygonStore::new(src.clone())),
            |resolver| {
                for p in &points {
                    std::hint::black_box(resolver.resolve(*p).expect("resolve"));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });

    for mode in [EvaluationMode::Sequential, EvaluationMode::Parallel] {
        let resolver = TimezoneResolver::new(Arc::clone(&index), PolygonStore::new(src.clone()))
            .with_evaluation(mode);
        for p in &points {
            resolver.resolve(*p).expect("warm up");
        }

        c.bench_function(&format!("resolve_warm_cache_1k_points_{mode}"), |b| {
            b.iter(|| {
                for p in &points {
                    std::hint::black_box(resolver.resolve(*p).expect("resolve"));
                }
            });
        });
    }
}

criterion_group!(benches, bench_candidates, bench_resolve);
criterion_main!(benches);
