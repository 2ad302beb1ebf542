use chrono::Utc;
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};

use city_traffic_grid::simulation_engine::intersections::IntersectionId;
use city_traffic_grid::simulation_engine::random::SimRng;
use city_traffic_grid::simulation_engine::{initialize_network, tick, NetworkSnapshot, ZoneMode};

/// Builds a network of `copies` times the default city, renumbering ids so
/// every intersection keeps its own device bundle.
fn scaled_network(copies: u16) -> NetworkSnapshot {
    let mut rng = SimRng::from_seed_u64(7);
    let base = initialize_network(&mut rng.0, Utc::now());
    let per_copy = base.intersections.len() as u16;
    let mut intersections = Vec::new();
    let mut devices = Vec::new();
    for copy in 0..copies {
        let offset = copy * per_copy;
        for intersection in &base.intersections {
            let mut i = intersection.clone();
            i.id = IntersectionId(i.id.0 + offset);
            intersections.push(i);
        }
        for device in &base.devices {
            let mut d = device.clone();
            d.intersection_id = IntersectionId(d.intersection_id.0 + offset);
            d.id.intersection_id = d.intersection_id;
            devices.push(d);
        }
    }
    NetworkSnapshot {
        intersections,
        devices,
    }
}

/// Benchmarks one tick for each zone mode over growing networks.
fn bench_tick_by_zone_mode(c: &mut Criterion) {
    let copies = [1, 4, 16];

    let mut group = c.benchmark_group("Tick_Benchmarks");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &n in copies.iter() {
        let network = scaled_network(n);
        let size = network.intersections.len();
        for mode in [ZoneMode::Normal, ZoneMode::Vip, ZoneMode::Lockdown] {
            group.bench_with_input(
                BenchmarkId::new(format!("tick_{}", mode), size),
                &network,
                |b, network| {
                    let mut rng = SimRng::from_seed_u64(11);
                    let now = Utc::now();
                    b.iter(|| {
                        let outcome = tick(
                            black_box(&network.intersections),
                            black_box(&network.devices),
                            mode,
                            now,
                            &mut rng,
                        );
                        black_box(outcome);
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_tick_by_zone_mode);
criterion_main!(benches);
