use stitch_cli::{
    draw_keypoints, DetectorConfig, Frame, Grid, PairSelection, PipelineConfig, Stitcher,
};
use std::path::PathBuf;
use std::time::Instant;

/// Textured square on a dark background, shifted horizontally by `dx`.
fn scene(dx: usize) -> Grid {
    let (w, h) = (160usize, 120usize);
    let mut data = vec![0u8; w * h];
    for y in 30..90 {
        for x in (40 + dx)..(100 + dx) {
            data[y * w + x] = 90;
        }
    }
    for y in (33..88).step_by(5) {
        for x in ((43 + dx)..(98 + dx)).step_by(5) {
            data[y * w + x] = 240;
        }
    }
    Grid::new(w, h, data).unwrap()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let out = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "synthetic_out".to_string()));
    std::fs::create_dir_all(&out)?;

    println!("🔧 Stitching a synthetic pair");
    println!("=============================\n");

    let config = PipelineConfig {
        detector: DetectorConfig::new().with_metadata("Synthetic", "Bright dots on a flat square"),
        ..PipelineConfig::default()
    }
    .with_pairs(PairSelection::Adjacent);
    config.save(out.join("pipeline.toml"))?;
    println!("📋 {}", config.summary());

    let stitcher = Stitcher::new(config)?;
    let frames = vec![Frame::from_grid("left", scene(0)), Frame::from_grid("right", scene(12))];

    for frame in &frames {
        let kps = stitcher.detect(&frame.grid);
        draw_keypoints(&frame.color, &kps).save(out.join(format!("{}_keypoints.png", frame.name)))?;
        println!("   {}: {} keypoints", frame.name, kps.len());
    }

    let t0 = Instant::now();
    let composites = stitcher.stitch_all(&frames);
    println!("\n⏱️  Stitched {} pair(s) in {:.2?}", composites.len(), t0.elapsed());

    for c in &composites {
        let m = c.homography.matrix();
        println!(
            "   ({}, {}): {} inliers, translation ({:.2}, {:.2}), composite {}x{}",
            c.i,
            c.j,
            c.homography.n_inliers(),
            m[(0, 2)],
            m[(1, 2)],
            c.image.width(),
            c.image.height()
        );
        c.image.save(out.join(format!("composite_{}_{}.png", c.i, c.j)))?;
    }

    println!("\n✅ Results written to {}", out.display());
    Ok(())
}
