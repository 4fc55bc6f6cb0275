use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use stitch_cli::{
    draw_keypoints, run, DirectorySink, DirectorySource, ImageSource, PairSelection, PipelineConfig, Stitcher,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "stitch")]
#[command(about = "Stitch overlapping images by matching corner features")]
#[command(version)]
struct Cli {
    /// Directory containing the input images.
    input_dir: PathBuf,

    /// Directory the composites are written to.
    #[arg(long, default_value = "stitched")]
    out: PathBuf,

    /// Pipeline configuration file (.toml or .json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corner detection threshold, overrides the config file.
    #[arg(long)]
    threshold: Option<u8>,

    /// Only stitch consecutive images (i, i+1).
    #[arg(long)]
    adjacent: bool,

    /// Worker threads, overrides the config file.
    #[arg(long)]
    threads: Option<usize>,

    /// Also write each input with its keypoints circled into this directory.
    #[arg(long)]
    keypoints_out: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> CliResult<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(t) = cli.threshold {
        config = config.with_threshold(t);
    }
    if let Some(n) = cli.threads {
        config = config.with_threads(n);
    }
    if cli.adjacent {
        config = config.with_pairs(PairSelection::Adjacent);
    }
    config.validate()?;
    Ok(config)
}

fn write_keypoint_overlays(stitcher: &Stitcher, source: &DirectorySource, dir: &Path) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    for frame in source.frames()? {
        let keypoints = stitcher.detect(&frame.grid);
        let path = dir.join(format!("{}_keypoints.png", frame.name));
        draw_keypoints(&frame.color, &keypoints).save(&path)?;
        log::info!("{}: {} keypoints -> {}", frame.name, keypoints.len(), path.display());
    }
    Ok(())
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    log::info!("{}", config.summary());

    let stitcher = Stitcher::new(config)?;
    let source = DirectorySource::new(&cli.input_dir);

    if let Some(dir) = &cli.keypoints_out {
        write_keypoint_overlays(&stitcher, &source, dir)?;
    }

    let mut sink = DirectorySink::new(&cli.out)?;
    let t0 = Instant::now();
    let written = run(&stitcher, &source, &mut sink)?;
    log::info!("{} composites written to {} in {:.2?}", written, cli.out.display(), t0.elapsed());

    Ok(())
}
