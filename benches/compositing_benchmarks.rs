use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use inkflow_studio::{
    canvas::{BlendMode, Canvas, DrawState},
    compose_placement,
    cropper::crop_natural,
    key_out::key_out_pixels,
    PlacementTransform, Point, Rect, Size, DEFAULT_THRESHOLD,
};

fn design(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / 16 + y / 16) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([20, 20, 20, 255])
        }
    })
}

fn bench_key_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_out");
    for size in [256u32, 1024] {
        let source = design(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                let mut image = source.clone();
                black_box(key_out_pixels(&mut image, DEFAULT_THRESHOLD))
            });
        });
    }
    group.finish();
}

fn bench_compose_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_placement");
    group.sample_size(20);

    let foreground = design(500);
    let transform = PlacementTransform::default()
        .with_position(Point::new(100.0, 100.0))
        .with_scale(1.5)
        .with_rotation(45.0);

    for side in [1000u32, 2000] {
        let background = RgbaImage::from_pixel(side, side, Rgba([200, 100, 50, 255]));
        group.bench_with_input(
            BenchmarkId::from_parameter(side),
            &background,
            |b, background| {
                b.iter(|| {
                    black_box(compose_placement(
                        background.clone(),
                        &foreground,
                        Size::new(500.0, 500.0),
                        &transform,
                        200.0,
                    ))
                });
            },
        );
    }
    group.finish();
}

fn bench_draw_modes(c: &mut Criterion) {
    let source = design(256);
    let dest = Rect::new(0.0, 0.0, 512.0, 512.0);

    for (name, blend) in [
        ("source_over", BlendMode::SourceOver),
        ("multiply", BlendMode::Multiply),
    ] {
        let state = DrawState {
            blend,
            global_alpha: 0.85,
            ..DrawState::default()
        };
        c.bench_function(&format!("draw_image_{}", name), |b| {
            b.iter(|| {
                let mut canvas = Canvas::new(512, 512);
                black_box(canvas.draw_image(&source, dest, &state))
            });
        });
    }
}

fn bench_crop(c: &mut Criterion) {
    let image = image::DynamicImage::ImageRgba8(design(2048));
    let selection = Rect::new(50.0, 50.0, 300.0, 200.0);
    c.bench_function("crop_natural_2048", |b| {
        b.iter(|| black_box(crop_natural(&image, selection, Size::new(512.0, 512.0))));
    });
}

criterion_group!(
    benches,
    bench_key_out,
    bench_compose_placement,
    bench_draw_modes,
    bench_crop
);
criterion_main!(benches);
