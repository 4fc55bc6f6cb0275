//! High-level stitching pipeline on top of the `stitch-*` crates, plus the
//! directory source and sink used by the `stitch` binary.

mod config;
mod error;
mod io;
mod pipeline;

pub use config::{PairSelection, PipelineConfig};
pub use error::{StitchError, StitchResult};
pub use io::{draw_keypoints, CompositeSink, DirectorySink, DirectorySource, Frame, ImageSource};
pub use pipeline::{Features, PairComposite, Stitcher};

pub use stitch_brief::PatternSpec;
pub use stitch_compose::CompositorConfig;
pub use stitch_core::{self, Descriptor, Grid, Keypoint};
pub use stitch_fast::DetectorConfig;
pub use stitch_homography::{Homography, RansacConfig};
pub use stitch_match::MatchConfig;

/// Load frames from `source`, stitch the selected pairs and hand each composite to `sink`.
///
/// Returns the number of composites written.
pub fn run<S: ImageSource, K: CompositeSink>(stitcher: &Stitcher, source: &S, sink: &mut K) -> StitchResult<usize> {
    let frames = source.frames()?;
    let composites = stitcher.stitch_all(&frames);
    for composite in &composites {
        sink.accept(composite)?;
    }
    Ok(composites.len())
}
