//! Tile enumeration for large buffers.
//!
//! A [`TilePlan`] splits a buffer into non-overlapping rectangles in raster
//! order. The tile edge is chosen from the pixel count so that a single tile
//! never blocks the caller for long:
//!
//! | Pixels          | Tile            |
//! |-----------------|-----------------|
//! | < 1M            | whole buffer    |
//! | < 4M            | 512 x 512       |
//! | < 16M           | 256 x 256       |
//! | otherwise       | 128 x 128       |
//!
//! Tiles share no halo pixels. Strategies that propagate error across
//! neighbours see each tile edge as an image edge, so callers should only
//! tile strategies that report themselves as tile-safe
//! ([`DitherAlgorithm::is_tile_safe`](crate::DitherAlgorithm::is_tile_safe)).

/// Buffers below this pixel count are processed as a single tile.
pub const SINGLE_TILE_LIMIT: usize = 1_000_000;

const TILE_STEPS: [(usize, u32); 2] = [(4_000_000, 512), (16_000_000, 256)];
const SMALLEST_TILE: u32 = 128;

/// A rectangular region of a buffer.
///
/// `total` is the number of tiles in the plan the tile came from and is
/// fixed once the plan is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Position in raster order, starting at 0
    pub index: usize,
    /// Number of tiles in the plan
    pub total: usize,
}

/// Tile edge length for a buffer of `pixels` pixels, or `None` when the
/// buffer should be processed whole.
pub fn tile_size_for(pixels: usize) -> Option<u32> {
    if pixels < SINGLE_TILE_LIMIT {
        return None;
    }
    TILE_STEPS
        .iter()
        .find(|(limit, _)| pixels < *limit)
        .map(|&(_, size)| size)
        .or(Some(SMALLEST_TILE))
}

/// A raster-order tiling of a `width x height` buffer.
///
/// # Example
///
/// ```
/// use dither_engine::TilePlan;
///
/// let plan = TilePlan::with_tile_size(300, 200, 128);
/// assert_eq!(plan.len(), 3 * 2);
/// let last = plan.tiles().last().unwrap();
/// assert_eq!((last.x, last.y, last.width, last.height), (256, 128, 44, 72));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlan {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    columns: u32,
    rows: u32,
}

impl TilePlan {
    /// Plan for a buffer, choosing the tile size from its pixel count.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        match tile_size_for(width as usize * height as usize) {
            Some(size) => Self::with_tile_size(width, height, size),
            None => Self::whole(width, height),
        }
    }

    /// Plan with a single tile covering the buffer.
    pub fn whole(width: u32, height: u32) -> Self {
        Self::build(width, height, width.max(1), height.max(1))
    }

    /// Plan with square tiles of edge `size` (at least 1).
    pub fn with_tile_size(width: u32, height: u32, size: u32) -> Self {
        let size = size.max(1);
        Self::build(width, height, size, size)
    }

    fn build(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        let columns = if width == 0 { 0 } else { width.div_ceil(tile_width) };
        let rows = if height == 0 { 0 } else { height.div_ceil(tile_height) };
        Self {
            width,
            height,
            tile_width,
            tile_height,
            columns,
            rows,
        }
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// `true` for an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when the plan is a single tile covering the whole buffer.
    pub fn is_single(&self) -> bool {
        self.len() == 1
    }

    /// Nominal tile edge (edge tiles may be smaller).
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Tiles in raster order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let total = self.len();
        (0..total).map(move |index| {
            let column = (index % self.columns as usize) as u32;
            let row = (index / self.columns as usize) as u32;
            let x = column * self.tile_width;
            let y = row * self.tile_height;
            Tile {
                x,
                y,
                width: self.tile_width.min(self.width - x),
                height: self.tile_height.min(self.height - y),
                index,
                total,
            }
        })
    }
}
