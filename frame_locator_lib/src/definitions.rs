/// Width of the grayscale grid that fingerprints are computed from.
/// 9 columns give 8 horizontal gradients per row.
pub const GRID_WIDTH: u32 = 9;

/// Height of the grayscale grid. 8 rows of 8 gradients make the 64 hash
/// bits.
pub const GRID_HEIGHT: u32 = 8;

/// Number of intensities in the grid.
pub const GRID_PIXELS: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

/// The default search threshold: candidates at this Hamming distance or
/// more are rejected. Raising it matches more frames at the cost of
/// false positives.
pub const DEFAULT_MAX_DISTANCE: u32 = 10;

/// The default cap on the number of matches returned per search.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Frames sampled per second of video when indexing. One 24-minute
/// episode yields roughly 8600 records at this rate.
pub const INDEX_FPS: u32 = 6;
