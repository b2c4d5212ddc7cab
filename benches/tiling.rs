// SPDX-License-Identifier: MPL-2.0
use anime_upscaler::domain::TileConfig;
use anime_upscaler::media::normalize_channels;
use anime_upscaler::media::tiling::{tile_grid, upscale_tiled};
use criterion::{criterion_group, criterion_main, Criterion};
use image_rs::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use std::hint::black_box;

const SCALE: u32 = 4;

fn sample_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    })
}

/// Stand-in for inference: pixel replication.
fn replicate(tile: &RgbImage) -> anime_upscaler::media::upscale::UpscaleResult<RgbImage> {
    Ok(RgbImage::from_fn(
        tile.width() * SCALE,
        tile.height() * SCALE,
        |x, y| *tile.get_pixel(x / SCALE, y / SCALE),
    ))
}

fn tiling_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiling");
    let config = TileConfig { size: 128, pad: 10 };

    group.bench_function("tile_grid_4k", |b| {
        b.iter(|| black_box(tile_grid(black_box(3840), black_box(2160), config)));
    });

    let image = sample_image(320, 240);
    group.bench_function("upscale_tiled_320x240", |b| {
        b.iter(|| {
            let _ = black_box(upscale_tiled(black_box(&image), SCALE, config, replicate));
        });
    });

    group.finish();
}

fn normalize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_channels");
    let gray = DynamicImage::ImageLuma8(GrayImage::from_fn(1024, 1024, |x, y| {
        Luma([((x + y) % 256) as u8])
    }));

    group.bench_function("gray_to_rgb_1024", |b| {
        b.iter(|| black_box(normalize_channels(black_box(gray.clone()))));
    });

    group.finish();
}

criterion_group!(benches, tiling_benchmark, normalize_benchmark);
criterion_main!(benches);
