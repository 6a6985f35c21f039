//! Benchmarks for single-band and RGB compositing and PNG export.
//!
//! Run with: cargo bench --package renderer --bench composite_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use raster_common::{DecodedTile, RescaleRange, SampleBuffer, SampleFormat};
use renderer::{composite_rgb, composite_single, png, ramps, BandParams, NodataPolicy};

/// Reflectance-like uint16 samples with ~5% zero (nodata) pixels.
fn generate_reflectance(size: usize) -> DecodedTile {
    let mut rng = rand::thread_rng();
    let values: Vec<u16> = (0..size * size)
        .map(|_| if rng.gen_bool(0.05) { 0 } else { rng.gen_range(1..10000) })
        .collect();
    DecodedTile::single(SampleBuffer::Uint16(values), size, size)
}

fn uint16_params() -> BandParams {
    BandParams::new(
        NodataPolicy::new(None, SampleFormat::Uint16, true),
        RescaleRange::new(0.0, 3000.0),
    )
}

fn bench_composite_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_single");
    let params = uint16_params();

    for size in [256, 512] {
        let tile = generate_reflectance(size);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("grayscale", size), &tile, |b, tile| {
            b.iter(|| composite_single(black_box(tile), &params, None));
        });

        for name in ["viridis", "turbo", "rdylgn"] {
            let cmap = ramps::named(name).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), &tile, |b, tile| {
                b.iter(|| composite_single(black_box(tile), &params, Some(&cmap)));
            });
        }
    }

    group.finish();
}

fn bench_composite_rgb(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_rgb");
    let params = [uint16_params(); 3];

    for size in [256, 512] {
        let red = generate_reflectance(size);
        let green = generate_reflectance(size);
        let blue = generate_reflectance(size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_function(BenchmarkId::new("uint16", size), |b| {
            b.iter(|| composite_rgb(black_box([&red, &green, &blue]), &params, true));
        });
    }

    group.finish();
}

fn bench_png_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encoding");
    let tile = generate_reflectance(256);
    let params = uint16_params();

    let viridis = ramps::named("viridis").unwrap();
    let colormapped = composite_single(&tile, &params, Some(&viridis)).unwrap();
    let gray = composite_single(&tile, &params, None).unwrap();

    group.bench_function("colormapped_256", |b| {
        b.iter(|| png::encode_tile(black_box(&colormapped)));
    });
    group.bench_function("grayscale_256", |b| {
        b.iter(|| png::encode_tile(black_box(&gray)));
    });

    group.finish();
}

criterion_group!(benches, bench_composite_single, bench_composite_rgb, bench_png_encoding);
criterion_main!(benches);
