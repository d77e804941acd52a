use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

pub type ColorValue = u8; // Color channel value (0-255)
pub type PixelCoord = u8; // Coordinate within a canvas (0-255)
pub type PaletteIdx = u16; // Index into a group palette

/// Largest supported canvas side. Every coordinate must fit in one byte.
pub const MAX_CANVAS_SIDE: usize = 256;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: ColorValue,
    pub green: ColorValue,
    pub blue: ColorValue,
    pub alpha: ColorValue,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color::rgba(red, green, blue, 0xFF)
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha == 0
    }

    pub fn opaque(self) -> Self {
        Color {
            alpha: 0xFF,
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

/// Parses `rrggbb` or `rrggbbaa`, optionally prefixed by `#` or `0x`.
/// Six-digit literals are opaque.
impl FromStr for Color {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidColorLiteral(s.to_string());
        let digits = s.trim();
        let digits = digits
            .strip_prefix('#')
            .or_else(|| digits.strip_prefix("0x"))
            .unwrap_or(digits);
        if !matches!(digits.len(), 6 | 8) {
            return Err(invalid());
        }
        let bytes = hex::decode(digits).map_err(|_| invalid())?;
        Ok(match bytes[..] {
            [r, g, b] => Color::rgb(r, g, b),
            [r, g, b, a] => Color::rgba(r, g, b, a),
            _ => return Err(invalid()),
        })
    }
}

impl TryFrom<String> for Color {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// A row-major raster of colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self, CodecError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(CodecError::InvalidGrid(format!(
                "dimensions {width}x{height} outside 1..={MAX_CANVAS_SIDE}"
            )));
        }
        if pixels.len() != width * height {
            return Err(CodecError::InvalidGrid(format!(
                "expected {} pixels for {width}x{height}, got {}",
                width * height,
                pixels.len()
            )));
        }
        Ok(PixelGrid {
            width,
            height,
            pixels,
        })
    }

    pub fn transparent(width: usize, height: usize) -> Result<Self, CodecError> {
        Self::new(width, height, vec![Color::TRANSPARENT; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[y * self.width + x] = color;
    }

    pub fn row(&self, y: usize) -> &[Color] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Samples the top-left pixel of every `factor`x`factor` block. Artwork drawn in
    /// solid blocks loses nothing.
    pub fn downsample(&self, factor: usize) -> PixelGrid {
        if factor <= 1 {
            return self.clone();
        }
        let width = self.width.div_ceil(factor);
        let height = self.height.div_ceil(factor);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(self.get(x * factor, y * factor));
            }
        }
        PixelGrid {
            width,
            height,
            pixels,
        }
    }

    /// Nearest-neighbour resample to a new canvas size.
    pub fn resize_nearest(&self, width: usize, height: usize) -> Result<PixelGrid, CodecError> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let pixels = resample_nearest(&self.pixels, self.width, self.height, width, height);
        PixelGrid::new(width, height, pixels)
    }
}

/// Nearest-neighbour resample of a raw row-major raster of any size. Used on
/// source images before they are small enough to be a `PixelGrid`.
pub(crate) fn resample_nearest(
    pixels: &[Color],
    src_width: usize,
    src_height: usize,
    width: usize,
    height: usize,
) -> Vec<Color> {
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let src_y = y * src_height / height;
        for x in 0..width {
            let src_x = x * src_width / width;
            out.push(pixels[src_y * src_width + src_x]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_literals() {
        assert_eq!("#ff0000".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert_eq!("0x000000ff".parse::<Color>(), Ok(Color::rgba(0, 0, 0, 255)));
        assert_eq!("12345678".parse::<Color>(), Ok(Color::rgba(0x12, 0x34, 0x56, 0x78)));
    }

    #[test]
    fn test_reject_bad_color_literals() {
        for s in ["", "#fff", "#ff00zz", "#ff00ff0", "#ff00ff00ff"] {
            assert_eq!(
                s.parse::<Color>(),
                Err(CodecError::InvalidColorLiteral(s.to_string()))
            );
        }
    }

    #[test]
    fn test_color_display_round_trips() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(c.to_string(), "#01020304");
        assert_eq!(c.to_string().parse::<Color>(), Ok(c));
    }

    #[test]
    fn test_grid_rejects_bad_sizes() {
        assert!(PixelGrid::new(2, 2, vec![Color::TRANSPARENT; 3]).is_err());
        assert!(PixelGrid::transparent(0, 4).is_err());
        assert!(PixelGrid::transparent(257, 1).is_err());
        assert!(PixelGrid::transparent(256, 256).is_ok());
    }

    #[test]
    fn test_downsample_takes_top_left_of_block() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let mut grid = PixelGrid::transparent(4, 4).unwrap();
        grid.set(0, 0, red);
        grid.set(1, 1, blue); // not a block corner, dropped
        grid.set(2, 2, blue);
        let small = grid.downsample(2);
        assert_eq!((small.width(), small.height()), (2, 2));
        assert_eq!(small.pixels(), &[red, Color::TRANSPARENT, Color::TRANSPARENT, blue]);
    }

    #[test]
    fn test_resize_nearest_doubles() {
        let red = Color::rgb(255, 0, 0);
        let grid = PixelGrid::new(1, 1, vec![red]).unwrap();
        let big = grid.resize_nearest(2, 2).unwrap();
        assert_eq!(big.pixels(), &[red; 4]);
    }

    #[test]
    fn test_resample_shrinks_oversized_raster() {
        let red = Color::rgb(255, 0, 0);
        // 300x300, red only in the top-left 150x150 quadrant
        let src: Vec<Color> = (0..300 * 300)
            .map(|i| if i % 300 < 150 && i / 300 < 150 { red } else { Color::TRANSPARENT })
            .collect();
        let out = resample_nearest(&src, 300, 300, 2, 2);
        assert_eq!(out, vec![red, Color::TRANSPARENT, Color::TRANSPARENT, Color::TRANSPARENT]);
    }
}
