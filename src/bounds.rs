use serde::Serialize;

use crate::{
    common::{PixelCoord, PixelGrid},
    config::EncoderConfig,
};

/// Inclusive, 0-based rectangle. An empty sprite is written as `EMPTY`, which is
/// geometrically the same as a 1x1 box at the origin; emptiness is signalled by
/// the trait carrying no runs.
#[derive(Serialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: PixelCoord,
    pub y1: PixelCoord,
    pub x2: PixelCoord,
    pub y2: PixelCoord,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    pub fn width(&self) -> usize {
        self.x2 as usize - self.x1 as usize + 1
    }

    pub fn height(&self) -> usize {
        self.y2 as usize - self.y1 as usize + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_ordered(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Smallest box enclosing every pixel the config does not treat as transparent,
/// or `None` when there is no such pixel.
pub fn find_bounds(grid: &PixelGrid, config: &EncoderConfig) -> Option<BoundingBox> {
    let mut found: Option<(usize, usize, usize, usize)> = None;
    for y in 0..grid.height() {
        for (x, &pixel) in grid.row(y).iter().enumerate() {
            if config.is_transparent(pixel) {
                continue;
            }
            found = Some(match found {
                None => (x, y, x, y),
                Some((x1, y1, x2, y2)) => (x1.min(x), y1.min(y), x2.max(x), y2.max(y)),
            });
        }
    }
    // PixelGrid caps each side at 256, so every coordinate fits in a byte.
    found.map(|(x1, y1, x2, y2)| BoundingBox {
        x1: x1 as PixelCoord,
        y1: y1 as PixelCoord,
        x2: x2 as PixelCoord,
        y2: y2 as PixelCoord,
    })
}
