//! Performance benchmarks for brunnel-lib
//!
//! Run with: cargo bench --package brunnel-lib

use brunnel_lib::geometry::{self, nearest_point_on_polyline};
use brunnel_lib::{Brunnel, BrunnelKind, BrunnelMatcher, Config, Route, Strategy, TrackPoint};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use std::collections::BTreeMap;

/// Generate a wiggly route with the specified number of points and spherical reference
/// distances.
fn generate_route(num_points: usize, base_lat: f64, base_lon: f64) -> Route {
    let mut points = Vec::with_capacity(num_points);
    let mut cumulative = 0.0;
    let mut prev: Option<Coord<f64>> = None;

    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let coord = Coord {
            x: base_lon + t * 0.1 + (t * 30.0).cos() * 0.001,
            y: base_lat + t * 0.1 + (t * 50.0).sin() * 0.001,
        };
        if let Some(prev) = prev {
            cumulative += geometry::distance(prev, coord);
        }
        points.push(TrackPoint::new(coord.y, coord.x, None, cumulative));
        prev = Some(coord);
    }

    Route::new(points).unwrap()
}

/// Generate brunnels hugging the route, every `stride` trackpoints
fn generate_brunnels(route: &Route, stride: usize) -> Vec<Brunnel> {
    let coords = &route.polyline().0;
    (0..coords.len().saturating_sub(3))
        .step_by(stride)
        .enumerate()
        .map(|(n, i)| {
            let kind = if n % 3 == 0 {
                BrunnelKind::Tunnel
            } else {
                BrunnelKind::Bridge
            };
            let vertices = coords[i..i + 3]
                .iter()
                .map(|c| Coord {
                    x: c.x + 0.00001,
                    y: c.y,
                })
                .collect();
            Brunnel::new(n as i64, kind, BTreeMap::new(), vertices).unwrap()
        })
        .collect()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_nearest_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_point");

    for &num_points in &[1_000, 10_000] {
        let route = generate_route(num_points, 51.5, -0.1);
        let query = Coord { x: -0.05, y: 51.55 };

        group.throughput(Throughput::Elements(num_points as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_points), &route, |b, route| {
            b.iter(|| nearest_point_on_polyline(route.polyline(), query));
        });
    }

    group.finish();
}

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");
    group.sample_size(20);

    let route = generate_route(5_000, 51.5, -0.1);
    let brunnels = generate_brunnels(&route, 25);

    group.throughput(Throughput::Elements(brunnels.len() as u64));
    for strategy in [Strategy::Distance, Strategy::Polygon] {
        let matcher = BrunnelMatcher::new(Config {
            containment: strategy,
            ..Config::default()
        });
        group.bench_function(BenchmarkId::new("run_5k", strategy.as_str()), |b| {
            b.iter(|| matcher.run(&route, &brunnels));
        });
    }

    group.finish();
}

fn bench_route_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    group.throughput(Throughput::Elements(10_000));
    group.bench_function("route_10k", |b| {
        b.iter(|| generate_route(10_000, 51.5, -0.1));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_nearest_point,
    bench_matcher,
    bench_route_construction,
);

criterion_main!(benches);
