use log::debug;

use crate::{
    bounds::{find_bounds, BoundingBox},
    common::PixelGrid,
    config::{EncoderConfig, LogicalScale, PaletteChannels, RleVariant, FULL_RES_LAYER},
    error::CodecError,
    model::{Trait, TraitGroup, TraitRuns, MAX_TRAITS},
    palette::Palette,
    rle::{encode_linear, encode_rows},
};

/// A named source sprite, before any encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraitSource {
    pub name: String,
    pub pixels: PixelGrid,
    pub layer_type: u8,
}

impl TraitSource {
    pub fn new(name: impl Into<String>, pixels: PixelGrid) -> Self {
        TraitSource {
            name: name.into(),
            pixels,
            layer_type: 0,
        }
    }

    pub fn with_layer_type(mut self, layer_type: u8) -> Self {
        self.layer_type = layer_type;
        self
    }
}

/// A source sprite after canvas fitting and logical downsampling.
struct Prepared<'a> {
    name: &'a str,
    grid: PixelGrid,
    layer_type: u8,
    bounds: Option<BoundingBox>,
}

fn prepare<'a>(
    source: &'a TraitSource,
    config: &EncoderConfig,
) -> Result<Prepared<'a>, CodecError> {
    let mut grid = match config.canvas {
        Some((w, h)) => source.pixels.resize_nearest(w, h)?,
        None => source.pixels.clone(),
    };
    let mut layer_type = source.layer_type;
    if config.logical_scale != LogicalScale::Full {
        if config.full_res_traits.contains(&source.name) {
            layer_type = FULL_RES_LAYER;
        } else {
            grid = grid.downsample(config.logical_scale.factor());
        }
    }
    let bounds = find_bounds(&grid, config);
    Ok(Prepared {
        name: &source.name,
        grid,
        layer_type,
        bounds,
    })
}

fn box_has_transparency(p: &Prepared, config: &EncoderConfig) -> bool {
    let Some(b) = p.bounds else {
        return false;
    };
    (b.y1 as usize..=b.y2 as usize).any(|y| {
        p.grid.row(y)[b.x1 as usize..=b.x2 as usize]
            .iter()
            .any(|&c| config.is_transparent(c))
    })
}

/// Builds the in-memory group: shared palette first, then every trait in input
/// order, optionally preceded by the "None" placeholder.
pub fn build_group(
    name: &str,
    sources: &[TraitSource],
    config: &EncoderConfig,
) -> Result<TraitGroup, CodecError> {
    if name.len() > 255 {
        return Err(CodecError::NameTooLong(name.to_string()));
    }
    let trait_count = sources.len() + usize::from(config.include_none_slot);
    if trait_count > MAX_TRAITS {
        return Err(CodecError::CapacityExceeded {
            what: "trait count",
            count: trait_count,
            max: MAX_TRAITS,
        });
    }

    let prepared = sources
        .iter()
        .map(|s| prepare(s, config))
        .collect::<Result<Vec<_>, _>>()?;

    let mut palette = Palette::build(prepared.iter().map(|p| &p.grid), config)?;
    if config.rle_variant == RleVariant::Linear {
        if let Some(p) = prepared.iter().find(|p| box_has_transparency(p, config)) {
            if config.palette_channels == PaletteChannels::Rgb {
                return Err(CodecError::TransparencyUnsupported(p.name.to_string()));
            }
            palette = palette.with_transparent_slot()?;
        }
    }
    let index_width = palette.index_width();
    debug!(
        "group '{}': {} colors, {}-byte indices",
        name,
        palette.len(),
        index_width.bytes()
    );

    let layout = config.layout();
    let mut traits = Vec::with_capacity(trait_count);
    if config.include_none_slot {
        traits.push(Trait::placeholder(layout));
    }
    for p in &prepared {
        let runs = match config.rle_variant {
            RleVariant::Linear => {
                TraitRuns::Linear(encode_linear(&p.grid, p.bounds, &palette, config)?)
            }
            RleVariant::RowSparse => {
                TraitRuns::Rows(encode_rows(&p.grid, p.bounds, &palette, config)?)
            }
        };
        debug!(
            "trait '{}': bounds {:?}, {} pixels encoded",
            p.name,
            p.bounds,
            runs.pixel_count()
        );
        traits.push(Trait {
            name: p.name.to_string(),
            bounds: p.bounds.unwrap_or(BoundingBox::EMPTY),
            layer_type: p.layer_type,
            runs,
        });
    }

    Ok(TraitGroup {
        name: name.to_string(),
        layout,
        palette,
        index_width,
        traits,
    })
}

/// Encodes one group into its binary blob.
pub fn encode_group(
    name: &str,
    sources: &[TraitSource],
    config: &EncoderConfig,
) -> Result<Vec<u8>, CodecError> {
    build_group(name, sources, config)?.to_bytes()
}
