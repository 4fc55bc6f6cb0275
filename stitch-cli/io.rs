use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use stitch_core::{Grid, Keypoint};

use crate::error::{StitchError, StitchResult};
use crate::pipeline::PairComposite;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// One input image: intensity grid for feature extraction, color for compositing
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub grid: Grid,
    pub color: RgbImage,
}

impl Frame {
    pub fn from_dynamic(name: impl Into<String>, img: &DynamicImage) -> StitchResult<Self> {
        let luma = img.to_luma8();
        let (w, h) = luma.dimensions();
        let grid = Grid::new(w as usize, h as usize, luma.into_raw())?;
        Ok(Self {
            name: name.into(),
            grid,
            color: img.to_rgb8(),
        })
    }

    /// Frame whose color image is the grid replicated over three channels
    pub fn from_grid(name: impl Into<String>, grid: Grid) -> Self {
        let gray = GrayImage::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
            Luma([grid.get(x as usize, y as usize)])
        });
        Self {
            name: name.into(),
            color: DynamicImage::ImageLuma8(gray).to_rgb8(),
            grid,
        }
    }
}

/// Supplies decoded frames in a stable order
pub trait ImageSource {
    fn frames(&self) -> StitchResult<Vec<Frame>>;
}

/// Every `jpg`, `jpeg`, `png` or `bmp` file in a directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Matching paths in file-name order
    pub fn paths(&self) -> StitchResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && is_image_path(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }
}

impl ImageSource for DirectorySource {
    fn frames(&self) -> StitchResult<Vec<Frame>> {
        let paths = self.paths()?;
        if paths.is_empty() {
            return Err(StitchError::NoImages(self.dir.clone()));
        }

        paths
            .iter()
            .map(|path| -> StitchResult<Frame> {
                let img = image::open(path)?;
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let frame = Frame::from_dynamic(name, &img)?;
                log::info!("loaded {} ({}x{})", path.display(), frame.grid.width(), frame.grid.height());
                Ok(frame)
            })
            .collect()
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Receives finished composites
pub trait CompositeSink {
    fn accept(&mut self, composite: &PairComposite) -> StitchResult<()>;
}

/// Writes `composite_{i}_{j}.png` into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> StitchResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: Vec::new() })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl CompositeSink for DirectorySink {
    fn accept(&mut self, composite: &PairComposite) -> StitchResult<()> {
        let path = self.dir.join(format!("composite_{}_{}.png", composite.i, composite.j));
        composite.image.save(&path)?;
        log::info!(
            "wrote {} ({}x{}, {} inliers)",
            path.display(),
            composite.image.width(),
            composite.image.height(),
            composite.homography.n_inliers()
        );
        self.written.push(path);
        Ok(())
    }
}

/// Copy of `img` with a red circle around every keypoint
pub fn draw_keypoints(img: &RgbImage, keypoints: &[Keypoint]) -> RgbImage {
    let mut output = img.clone();
    for kp in keypoints {
        draw_hollow_circle_mut(&mut output, (kp.x as i32, kp.y as i32), 3, Rgb([255, 0, 0]));
    }
    output
}
