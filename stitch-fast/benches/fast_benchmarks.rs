use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stitch_core::Grid;
use stitch_fast::{detect, DetectorBuilder, MinDistanceFilter, KeypointFilter};

/// Create benchmark image with corner-like structures
fn create_benchmark_image(width: usize, height: usize, complexity: &str) -> Grid {
    let mut img = vec![128u8; width * height];

    match complexity {
        "dots" => {
            // Isolated bright dots on a regular lattice
            for y in (8..height - 8).step_by(9) {
                for x in (8..width - 8).step_by(9) {
                    img[y * width + x] = 255;
                }
            }
        }
        "realistic" => {
            // Gradient plus texture plus scattered blobs
            for y in 0..height {
                for x in 0..width {
                    let gradient = ((x as f32 / width as f32) * 50.0) as u8;
                    let noise = ((x * 31 + y * 17) % 23) as u8;
                    img[y * width + x] = 60 + gradient + noise;
                }
            }
            for i in 0..200 {
                let cx = (i * 37) % width;
                let cy = (i * 53) % height;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let x = (cx as i32 + dx).clamp(0, width as i32 - 1) as usize;
                        let y = (cy as i32 + dy).clamp(0, height as i32 - 1) as usize;
                        img[y * width + x] = if (dx + dy) % 2 == 0 { 10 } else { 250 };
                    }
                }
            }
        }
        _ => {}
    }

    Grid::new(width, height, img).unwrap()
}

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");
    for &size in &[128usize, 256, 512] {
        for complexity in ["dots", "realistic"] {
            let img = create_benchmark_image(size, size, complexity);
            group.bench_with_input(
                BenchmarkId::new(complexity, size),
                &img,
                |b, img| b.iter(|| detect(black_box(img), 40, 3)),
            );
        }
    }
    group.finish();
}

fn bench_orientation(c: &mut Criterion) {
    let img = create_benchmark_image(512, 512, "realistic");
    let detector = DetectorBuilder::new().threshold(40).threads(1).build().unwrap();
    let kps = detector.detect_keypoints(&img);

    c.bench_function("orientation_512", |b| {
        b.iter(|| detector.orient(black_box(&img), black_box(&kps)))
    });
}

fn bench_min_distance(c: &mut Criterion) {
    let img = create_benchmark_image(512, 512, "dots");
    let kps = detect(&img, 40, 3);
    let filter = MinDistanceFilter::new(10.0);

    c.bench_function("min_distance_filter", |b| {
        b.iter(|| filter.apply(black_box(kps.clone())))
    });
}

criterion_group!(benches, bench_detection, bench_orientation, bench_min_distance);
criterion_main!(benches);
