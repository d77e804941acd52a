use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::common::Color;

/// Layer type written for traits kept at full resolution in a downsampled group.
pub const FULL_RES_LAYER: u8 = 0xFF;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RleVariant {
    /// Dense replay of the whole bounding box, transparent pixels included.
    Linear,
    /// Per-row opaque runs only, each with its own x offset.
    #[default]
    RowSparse,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaletteChannels {
    #[default]
    Rgba,
    Rgb,
}

impl PaletteChannels {
    pub fn bytes_per_color(self) -> usize {
        match self {
            PaletteChannels::Rgba => 4,
            PaletteChannels::Rgb => 3,
        }
    }
}

#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum LogicalScale {
    #[default]
    Full = 1,
    Half = 2,
}

impl LogicalScale {
    pub fn factor(self) -> usize {
        self as usize
    }
}

/// What a decoder must know to walk a blob. The byte stream itself does not
/// record the RLE variant or palette channel count.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    pub rle_variant: RleVariant,
    pub palette_channels: PaletteChannels,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EncoderConfig {
    pub rle_variant: RleVariant,
    pub palette_channels: PaletteChannels,
    pub include_none_slot: bool,
    pub logical_scale: LogicalScale,
    /// Non-zero-alpha color treated as transparent for bounds and palette purposes.
    pub magic_transparent: Option<Color>,
    /// Trait names stored at full resolution when `logical_scale` is `Half`.
    pub full_res_traits: BTreeSet<String>,
    /// Source images of any other size are resized (nearest) to this canvas first.
    pub canvas: Option<(usize, usize)>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            rle_variant: RleVariant::RowSparse,
            palette_channels: PaletteChannels::Rgba,
            include_none_slot: true,
            logical_scale: LogicalScale::Full,
            magic_transparent: None,
            full_res_traits: BTreeSet::new(),
            canvas: None,
        }
    }
}

impl EncoderConfig {
    pub fn layout(&self) -> Layout {
        Layout {
            rle_variant: self.rle_variant,
            palette_channels: self.palette_channels,
        }
    }

    pub fn is_transparent(&self, color: Color) -> bool {
        color.is_transparent() || self.magic_transparent == Some(color)
    }

    /// Maps a source pixel to the color stored in the palette, or `None` for transparency.
    pub fn palette_color(&self, color: Color) -> Option<Color> {
        if self.is_transparent(color) {
            return None;
        }
        Some(match self.palette_channels {
            PaletteChannels::Rgba => color,
            PaletteChannels::Rgb => color.opaque(),
        })
    }
}
