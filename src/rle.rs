//! Run-length encoders for the two trait layouts.
//!
//! Both split runs at `MAX_RUN_LEN`; a longer stretch of one color becomes
//! several consecutive runs, never a zero-length continuation marker.

use crate::{
    bounds::BoundingBox,
    common::{Color, PixelCoord, PixelGrid},
    config::EncoderConfig,
    error::CodecError,
    model::{Row, RowRun, Run, MAX_RUN_LEN},
    palette::Palette,
};

/// Maximal runs of equal keys as `(start, length, key)`, lengths in `1..=MAX_RUN_LEN`.
fn split_runs<K: PartialEq + Copy>(keys: impl IntoIterator<Item = K>) -> Vec<(usize, u8, K)> {
    let mut runs: Vec<(usize, u8, K)> = vec![];
    for (i, key) in keys.into_iter().enumerate() {
        if let Some((_, len, k)) = runs.last_mut() {
            if *k == key && (*len as usize) < MAX_RUN_LEN {
                *len += 1;
                continue;
            }
        }
        runs.push((i, 1, key));
    }
    runs
}

fn check_box(grid: &PixelGrid, b: BoundingBox) -> Result<(), CodecError> {
    if !b.is_ordered() || b.x2 as usize >= grid.width() || b.y2 as usize >= grid.height() {
        return Err(CodecError::InvalidGrid(format!(
            "box {b:?} does not fit a {}x{} grid",
            grid.width(),
            grid.height()
        )));
    }
    Ok(())
}

/// Replays the whole box row by row. Transparent pixels map to the palette's
/// transparent slot, which the caller must have reserved.
pub fn encode_linear(
    grid: &PixelGrid,
    bounds: Option<BoundingBox>,
    palette: &Palette,
    config: &EncoderConfig,
) -> Result<Vec<Run>, CodecError> {
    let Some(b) = bounds else {
        return Ok(vec![]);
    };
    check_box(grid, b)?;
    let keys = (b.y1 as usize..=b.y2 as usize).flat_map(|y| {
        grid.row(y)[b.x1 as usize..=b.x2 as usize]
            .iter()
            .map(|&pixel| config.palette_color(pixel))
    });

    let mut runs = vec![];
    for (_, length, key) in split_runs(keys) {
        let index = palette.index_of(key.unwrap_or(Color::TRANSPARENT))?;
        runs.push(Run { length, index });
    }

    let covered: usize = runs.iter().map(|r| r.length as usize).sum();
    if covered != b.area() {
        return Err(CodecError::BoundsInvariantViolation {
            expected: b.area(),
            actual: covered,
        });
    }
    Ok(runs)
}

/// Encodes each row of the box independently, keeping opaque runs only.
/// Rows without any opaque pixel are left out.
pub fn encode_rows(
    grid: &PixelGrid,
    bounds: Option<BoundingBox>,
    palette: &Palette,
    config: &EncoderConfig,
) -> Result<Vec<Row>, CodecError> {
    let Some(b) = bounds else {
        return Ok(vec![]);
    };
    check_box(grid, b)?;
    let mut rows = vec![];
    for y in b.y1 as usize..=b.y2 as usize {
        let span = &grid.row(y)[b.x1 as usize..=b.x2 as usize];
        let mut runs = vec![];
        for (start, length, key) in split_runs(span.iter().map(|&p| config.palette_color(p))) {
            let Some(color) = key else { continue };
            runs.push(RowRun {
                x: (b.x1 as usize + start) as PixelCoord,
                length,
                index: palette.index_of(color)?,
            });
        }
        if !runs.is_empty() {
            rows.push(Row {
                y: y as PixelCoord,
                runs,
            });
        }
    }
    Ok(rows)
}
