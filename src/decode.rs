use crate::{
    bounds::BoundingBox,
    common::{Color, PaletteIdx},
    config::{Layout, PaletteChannels, RleVariant},
    error::CodecError,
    model::{Row, RowRun, Run, Trait, TraitGroup, TraitRuns},
    palette::{IndexWidth, Palette},
};

// Every read is bounds-checked against the buffer so a short or corrupt blob
// reports TruncatedData instead of reading past the end.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_n(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::TruncatedData {
                field,
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.read_n(1, field)?[0])
    }

    fn read_u16(&mut self, field: &'static str) -> Result<u16, CodecError> {
        let b = self.read_n(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_index(&mut self, width: IndexWidth) -> Result<PaletteIdx, CodecError> {
        match width {
            IndexWidth::One => Ok(self.read_u8("palette index")? as PaletteIdx),
            IndexWidth::Two => self.read_u16("palette index"),
        }
    }

    fn read_name(&mut self, field: &'static str) -> Result<String, CodecError> {
        let len = self.read_u8(field)? as usize;
        let offset = self.pos;
        let bytes = self.read_n(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidName(offset))
    }

    fn read_bounds(&mut self) -> Result<BoundingBox, CodecError> {
        let b = self.read_n(4, "bounding box")?;
        Ok(BoundingBox {
            x1: b[0],
            y1: b[1],
            x2: b[2],
            y2: b[3],
        })
    }
}

/// Decodes a blob written with `layout`. Failures after the group name has
/// been read are wrapped in `PartialGroup` with the number of traits decoded.
pub fn decode_group(data: &[u8], layout: Layout) -> Result<TraitGroup, CodecError> {
    let mut cursor = Cursor::new(data);
    let name = cursor.read_name("group name")?;
    let mut traits = vec![];
    match decode_body(&mut cursor, layout, &mut traits) {
        Ok((palette, index_width)) => Ok(TraitGroup {
            name,
            layout,
            palette,
            index_width,
            traits,
        }),
        Err(source) => Err(CodecError::PartialGroup {
            group: name,
            decoded_traits: traits.len(),
            source: Box::new(source),
        }),
    }
}

fn decode_body(
    cursor: &mut Cursor,
    layout: Layout,
    traits: &mut Vec<Trait>,
) -> Result<(Palette, IndexWidth), CodecError> {
    let palette_len = cursor.read_u16("palette count")? as usize;
    let color_bytes = layout.palette_channels.bytes_per_color();
    let raw = cursor.read_n(palette_len * color_bytes, "palette")?;
    let colors = raw
        .chunks_exact(color_bytes)
        .map(|c| match layout.palette_channels {
            PaletteChannels::Rgba => Color::rgba(c[0], c[1], c[2], c[3]),
            PaletteChannels::Rgb => Color::rgb(c[0], c[1], c[2]),
        })
        .collect();
    let palette = Palette::from_colors(colors)?;

    let tag = cursor.read_u8("index width")?;
    let index_width = IndexWidth::from_tag(tag)?;
    if index_width != palette.index_width() {
        return Err(CodecError::InvalidIndexWidth(tag));
    }
    let trait_count = cursor.read_u8("trait count")?;
    for _ in 0..trait_count {
        let t = match layout.rle_variant {
            RleVariant::Linear => decode_linear_trait(cursor, &palette, index_width)?,
            RleVariant::RowSparse => decode_row_trait(cursor, &palette, index_width)?,
        };
        traits.push(t);
    }

    if cursor.remaining() > 0 {
        return Err(CodecError::TrailingBytes(cursor.remaining()));
    }
    Ok((palette, index_width))
}

fn read_checked_index(
    cursor: &mut Cursor,
    palette: &Palette,
    width: IndexWidth,
) -> Result<PaletteIdx, CodecError> {
    let index = cursor.read_index(width)?;
    palette.get(index)?;
    Ok(index)
}

fn decode_linear_trait(
    cursor: &mut Cursor,
    palette: &Palette,
    width: IndexWidth,
) -> Result<Trait, CodecError> {
    let pixel_count = cursor.read_u16("trait pixel count")? as usize;
    let bounds = cursor.read_bounds()?;
    let layer_type = cursor.read_u8("layer type")?;
    let name = cursor.read_name("trait name")?;

    if pixel_count != 0 && (!bounds.is_ordered() || pixel_count != bounds.area()) {
        return Err(CodecError::BoundsInvariantViolation {
            expected: if bounds.is_ordered() { bounds.area() } else { 0 },
            actual: pixel_count,
        });
    }

    let mut runs = vec![];
    let mut covered = 0;
    while covered < pixel_count {
        let length = cursor.read_u8("run length")?;
        if length == 0 {
            return Err(CodecError::InvalidRun(format!("zero-length run in '{name}'")));
        }
        covered += length as usize;
        if covered > pixel_count {
            return Err(CodecError::BoundsInvariantViolation {
                expected: pixel_count,
                actual: covered,
            });
        }
        let index = read_checked_index(cursor, palette, width)?;
        runs.push(Run { length, index });
    }

    Ok(Trait {
        name,
        bounds,
        layer_type,
        runs: TraitRuns::Linear(runs),
    })
}

fn decode_row_trait(
    cursor: &mut Cursor,
    palette: &Palette,
    width: IndexWidth,
) -> Result<Trait, CodecError> {
    let bounds = cursor.read_bounds()?;
    let layer_type = cursor.read_u8("layer type")?;
    let name = cursor.read_name("trait name")?;
    let row_count = cursor.read_u8("row count")?;
    if row_count > 0 && !bounds.is_ordered() {
        return Err(CodecError::InvalidRun(format!("'{name}' has an inverted bounding box")));
    }

    let mut rows: Vec<Row> = vec![];
    for _ in 0..row_count {
        let y = cursor.read_u8("row y")?;
        let after_previous = rows.last().map_or(true, |prev| y > prev.y);
        if y < bounds.y1 || y > bounds.y2 || !after_previous {
            return Err(CodecError::InvalidRun(format!(
                "row {y} of '{name}' is out of order or outside its bounding box"
            )));
        }
        let run_count = cursor.read_u8("run count")?;
        if run_count == 0 {
            return Err(CodecError::InvalidRun(format!("row {y} of '{name}' has no runs")));
        }
        let mut runs: Vec<RowRun> = vec![];
        for _ in 0..run_count {
            let x = cursor.read_u8("run x")?;
            let length = cursor.read_u8("run length")?;
            let end = x as usize + length as usize;
            let after_previous = runs
                .last()
                .map_or(true, |prev| x as usize >= prev.x as usize + prev.length as usize);
            if length == 0 || x < bounds.x1 || end > bounds.x2 as usize + 1 || !after_previous {
                return Err(CodecError::InvalidRun(format!(
                    "run at x={x} len={length} in row {y} of '{name}' is invalid"
                )));
            }
            let index = read_checked_index(cursor, palette, width)?;
            runs.push(RowRun { x, length, index });
        }
        rows.push(Row { y, runs });
    }

    Ok(Trait {
        name,
        bounds,
        layer_type,
        runs: TraitRuns::Rows(rows),
    })
}
