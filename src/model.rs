use serde::Serialize;

use crate::{
    bounds::BoundingBox,
    common::{Color, PaletteIdx, PixelCoord, PixelGrid},
    config::{Layout, PaletteChannels, RleVariant},
    error::CodecError,
    palette::{IndexWidth, Palette},
};

pub const MAX_RUN_LEN: usize = 255;
pub const MAX_TRAITS: usize = 255;
pub const NONE_TRAIT_NAME: &str = "None";

/// One run of the linear variant; the position is implied by replay order.
#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub length: u8,
    pub index: PaletteIdx,
}

/// One opaque run of the row variant.
#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowRun {
    pub x: PixelCoord,
    pub length: u8,
    pub index: PaletteIdx,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub y: PixelCoord,
    pub runs: Vec<RowRun>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TraitRuns {
    Linear(Vec<Run>),
    Rows(Vec<Row>),
}

impl TraitRuns {
    pub fn empty(layout: Layout) -> Self {
        match layout.rle_variant {
            RleVariant::Linear => TraitRuns::Linear(vec![]),
            RleVariant::RowSparse => TraitRuns::Rows(vec![]),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TraitRuns::Linear(runs) => runs.is_empty(),
            TraitRuns::Rows(rows) => rows.is_empty(),
        }
    }

    /// Number of pixels the runs cover, transparent runs included.
    pub fn pixel_count(&self) -> usize {
        match self {
            TraitRuns::Linear(runs) => runs.iter().map(|r| r.length as usize).sum(),
            TraitRuns::Rows(rows) => rows
                .iter()
                .flat_map(|row| &row.runs)
                .map(|r| r.length as usize)
                .sum(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Trait {
    pub name: String,
    pub bounds: BoundingBox,
    /// Opaque to the codec; the renderer branches on it.
    pub layer_type: u8,
    pub runs: TraitRuns,
}

impl Trait {
    pub fn placeholder(layout: Layout) -> Self {
        Trait {
            name: NONE_TRAIT_NAME.to_string(),
            bounds: BoundingBox::EMPTY,
            layer_type: 0,
            runs: TraitRuns::empty(layout),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Paints the trait onto a transparent `width`x`height` canvas.
    pub fn to_grid(
        &self,
        palette: &Palette,
        width: usize,
        height: usize,
    ) -> Result<PixelGrid, CodecError> {
        let mut grid = PixelGrid::transparent(width, height)?;
        let mut paint = |x: usize, y: usize, color: Color| -> Result<(), CodecError> {
            if x >= width || y >= height {
                return Err(CodecError::InvalidRun(format!(
                    "pixel ({x}, {y}) of '{}' lies outside the {width}x{height} canvas",
                    self.name
                )));
            }
            grid.set(x, y, color);
            Ok(())
        };
        match &self.runs {
            TraitRuns::Linear(runs) => {
                let b = self.bounds;
                if !runs.is_empty() && !b.is_ordered() {
                    return Err(CodecError::InvalidRun(format!(
                        "'{}' has runs but an inverted bounding box",
                        self.name
                    )));
                }
                let mut offset = 0;
                for run in runs {
                    let color = palette.get(run.index)?;
                    for _ in 0..run.length {
                        let x = b.x1 as usize + offset % b.width();
                        let y = b.y1 as usize + offset / b.width();
                        paint(x, y, color)?;
                        offset += 1;
                    }
                }
            }
            TraitRuns::Rows(rows) => {
                for row in rows {
                    for run in &row.runs {
                        let color = palette.get(run.index)?;
                        for x in run.x as usize..run.x as usize + run.length as usize {
                            paint(x, row.y as usize, color)?;
                        }
                    }
                }
            }
        }
        Ok(grid)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TraitGroup {
    pub name: String,
    pub layout: Layout,
    pub palette: Palette,
    pub index_width: IndexWidth,
    pub traits: Vec<Trait>,
}

impl TraitGroup {
    /// Serializes the group. All multi-byte integers are big-endian.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        write_name(&mut out, &self.name)?;

        write_u16(&mut out, self.palette.len(), "palette")?;
        for &c in self.palette.colors() {
            match self.layout.palette_channels {
                PaletteChannels::Rgba => out.extend([c.red, c.green, c.blue, c.alpha]),
                PaletteChannels::Rgb => {
                    if c.is_transparent() {
                        return Err(CodecError::TransparencyUnsupported(self.name.clone()));
                    }
                    out.extend([c.red, c.green, c.blue]);
                }
            }
        }

        out.push(self.index_width as u8);
        write_count(&mut out, self.traits.len(), "trait count", MAX_TRAITS)?;
        for t in &self.traits {
            self.write_trait(&mut out, t)?;
        }
        Ok(out)
    }

    fn write_trait(&self, out: &mut Vec<u8>, t: &Trait) -> Result<(), CodecError> {
        match (&t.runs, self.layout.rle_variant) {
            (TraitRuns::Linear(runs), RleVariant::Linear) => {
                write_u16(out, t.runs.pixel_count(), "trait pixel count")?;
                write_trait_header(out, t)?;
                for run in runs {
                    if run.length == 0 {
                        return Err(CodecError::InvalidRun(format!("zero-length run in '{}'", t.name)));
                    }
                    out.push(run.length);
                    self.write_index(out, run.index)?;
                }
            }
            (TraitRuns::Rows(rows), RleVariant::RowSparse) => {
                write_trait_header(out, t)?;
                write_count(out, rows.len(), "row count", 255)?;
                for row in rows {
                    out.push(row.y);
                    write_count(out, row.runs.len(), "runs per row", 255)?;
                    for run in &row.runs {
                        if run.length == 0 {
                            return Err(CodecError::InvalidRun(format!("zero-length run in '{}'", t.name)));
                        }
                        out.extend([run.x, run.length]);
                        self.write_index(out, run.index)?;
                    }
                }
            }
            _ => {
                return Err(CodecError::InvalidRun(format!(
                    "trait '{}' runs do not match the group's {:?} layout",
                    t.name, self.layout.rle_variant
                )))
            }
        }
        Ok(())
    }

    fn write_index(&self, out: &mut Vec<u8>, index: PaletteIdx) -> Result<(), CodecError> {
        self.palette.get(index)?;
        match self.index_width {
            IndexWidth::One => {
                let byte = u8::try_from(index).map_err(|_| CodecError::PaletteIndexOutOfRange {
                    index,
                    len: 256,
                })?;
                out.push(byte);
            }
            IndexWidth::Two => out.extend(index.to_be_bytes()),
        }
        Ok(())
    }
}

fn write_trait_header(out: &mut Vec<u8>, t: &Trait) -> Result<(), CodecError> {
    out.extend(t.bounds.to_bytes());
    out.push(t.layer_type);
    write_name(out, &t.name)
}

fn write_name(out: &mut Vec<u8>, name: &str) -> Result<(), CodecError> {
    let bytes = name.as_bytes();
    let len = u8::try_from(bytes.len()).map_err(|_| CodecError::NameTooLong(name.to_string()))?;
    out.push(len);
    out.extend(bytes);
    Ok(())
}

fn write_u16(out: &mut Vec<u8>, value: usize, what: &'static str) -> Result<(), CodecError> {
    let v = u16::try_from(value).map_err(|_| CodecError::CapacityExceeded {
        what,
        count: value,
        max: u16::MAX as usize,
    })?;
    out.extend(v.to_be_bytes());
    Ok(())
}

fn write_count(
    out: &mut Vec<u8>,
    value: usize,
    what: &'static str,
    max: usize,
) -> Result<(), CodecError> {
    if value > max {
        return Err(CodecError::CapacityExceeded {
            what,
            count: value,
            max,
        });
    }
    out.push(value as u8);
    Ok(())
}
