use std::cmp::Reverse;

use hashbrown::HashMap;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    common::{Color, PaletteIdx, PixelGrid},
    config::EncoderConfig,
    error::CodecError,
};

pub const MAX_PALETTE_LEN: usize = 65535;

#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexWidth {
    One = 1,
    Two = 2,
}

impl IndexWidth {
    pub fn bytes(self) -> usize {
        self as usize
    }

    pub fn from_tag(tag: u8) -> Result<Self, CodecError> {
        match tag {
            1 => Ok(IndexWidth::One),
            2 => Ok(IndexWidth::Two),
            _ => Err(CodecError::InvalidIndexWidth(tag)),
        }
    }
}

/// Ordered, duplicate-free colors shared by every trait in a group.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
    #[serde(skip)]
    lookup: HashMap<Color, PaletteIdx>,
}

impl Palette {
    pub fn from_colors(colors: Vec<Color>) -> Result<Self, CodecError> {
        if colors.len() > MAX_PALETTE_LEN {
            return Err(CodecError::CapacityExceeded {
                what: "palette",
                count: colors.len(),
                max: MAX_PALETTE_LEN,
            });
        }
        let mut lookup = HashMap::with_capacity(colors.len());
        for (i, &c) in colors.iter().enumerate() {
            // Duplicates are only possible from a hand-built list; keep the first.
            lookup.entry(c).or_insert(i as PaletteIdx);
        }
        Ok(Palette { colors, lookup })
    }

    /// Counts every non-transparent pixel across `grids` and orders the distinct
    /// colors by descending count, ties broken by first appearance.
    pub fn build<'a>(
        grids: impl IntoIterator<Item = &'a PixelGrid>,
        config: &EncoderConfig,
    ) -> Result<Self, CodecError> {
        // color -> (count, first seen)
        let mut counts: HashMap<Color, (usize, usize)> = HashMap::new();
        let mut seen = 0;
        for grid in grids {
            for &pixel in grid.pixels() {
                if let Some(color) = config.palette_color(pixel) {
                    let entry = counts.entry(color).or_insert((0, seen));
                    entry.0 += 1;
                    seen += 1;
                }
            }
        }
        let colors = counts
            .into_iter()
            .sorted_by_key(|&(_, (count, first))| (Reverse(count), first))
            .map(|(color, _)| color)
            .collect();
        Self::from_colors(colors)
    }

    /// Returns a copy with a fully transparent entry inserted at index 0.
    pub fn with_transparent_slot(&self) -> Result<Self, CodecError> {
        let mut colors = Vec::with_capacity(self.colors.len() + 1);
        colors.push(Color::TRANSPARENT);
        colors.extend(self.colors.iter().copied());
        Self::from_colors(colors)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn get(&self, idx: PaletteIdx) -> Result<Color, CodecError> {
        self.colors
            .get(idx as usize)
            .copied()
            .ok_or(CodecError::PaletteIndexOutOfRange {
                index: idx,
                len: self.colors.len(),
            })
    }

    pub fn index_of(&self, color: Color) -> Result<PaletteIdx, CodecError> {
        self.lookup
            .get(&color)
            .copied()
            .ok_or_else(|| CodecError::MissingPaletteEntry(color.to_string()))
    }

    pub fn index_width(&self) -> IndexWidth {
        if self.colors.len() <= 255 {
            IndexWidth::One
        } else {
            IndexWidth::Two
        }
    }
}
