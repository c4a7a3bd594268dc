use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use panosphere::{CameraPose, DirectionField, FieldOfView, StitchConfig, Stitcher};

fn noise_image(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = RgbImage::new(w, h);
    for p in img.pixels_mut() {
        *p = Rgb([rng.gen(), rng.gen(), rng.gen()]);
    }
    img
}

fn bench_direction_field(c: &mut Criterion) {
    c.bench_function("direction_field_1024x512", |b| {
        b.iter(|| DirectionField::generate(black_box(1024), black_box(512)))
    });
}

fn bench_stitch(c: &mut Criterion) {
    let frames: Vec<(RgbImage, CameraPose)> = (0..8)
        .map(|i| {
            (
                noise_image(160, 120, i),
                CameraPose {
                    pitch_deg: 90.0,
                    yaw_deg: i as f64 * 45.0,
                },
            )
        })
        .collect();
    let stitcher = Stitcher::with_config(StitchConfig {
        output_width: 512,
        fov: FieldOfView::default(),
    });

    c.bench_function("stitch_8_sources_512", |b| {
        b.iter(|| stitcher.stitch_images(black_box(&frames)).unwrap())
    });
}

criterion_group!(benches, bench_direction_field, bench_stitch);
criterion_main!(benches);
