use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::{debug, info};

use crate::{
    common::{resample_nearest, Color, PixelGrid},
    encode::TraitSource,
};

/// Loads a PNG of any color type as an RGBA grid. With a `canvas`, an image of
/// any other size is nearest-neighbour resized to it first, so sources larger
/// than the codec's 256-pixel limit still load.
pub fn load_png(path: &Path, canvas: Option<(usize, usize)>) -> Result<PixelGrid> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .with_context(|| format!("reading PNG header of {}", path.display()))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .with_context(|| format!("decoding {}", path.display()))?;
    let bytes = &buf[..info.buffer_size()];

    let pixels: Vec<Color> = match info.color_type {
        png::ColorType::Rgba => bytes
            .chunks_exact(4)
            .map(|c| Color::rgba(c[0], c[1], c[2], c[3]))
            .collect(),
        png::ColorType::Rgb => bytes
            .chunks_exact(3)
            .map(|c| Color::rgb(c[0], c[1], c[2]))
            .collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .map(|c| Color::rgba(c[0], c[0], c[0], c[1]))
            .collect(),
        png::ColorType::Grayscale => bytes.iter().map(|&v| Color::rgb(v, v, v)).collect(),
        png::ColorType::Indexed => bail!("{}: indexed PNG was not expanded", path.display()),
    };
    let (width, height) = (info.width as usize, info.height as usize);
    let grid = match canvas {
        Some((w, h)) if (w, h) != (width, height) => {
            debug!("Resizing {} from {}x{} to {}x{}", path.display(), width, height, w, h);
            PixelGrid::new(w, h, resample_nearest(&pixels, width, height, w, h))
        }
        _ => PixelGrid::new(width, height, pixels),
    };
    grid.with_context(|| format!("loading {}", path.display()))
}

/// Loads every `*.png` in `dir`, sorted by file name, as one trait each.
/// Returns `None` when the directory does not exist.
pub fn load_group_dir(dir: &Path, canvas: Option<(usize, usize)>) -> Result<Option<Vec<TraitSource>>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let pattern = format!("{}/*.png", glob::Pattern::escape(&dir.display().to_string()));
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)?.collect::<Result<_, _>>()?;
    paths.sort_by(|x, y| x.file_name().cmp(&y.file_name()));

    let mut sources = vec![];
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("invalid trait file name")?
            .to_string();
        debug!("Loading trait '{}' from {}", name, path.display());
        sources.push(TraitSource::new(name, load_png(&path, canvas)?));
    }
    info!("Loaded {} traits from {}", sources.len(), dir.display());
    Ok(Some(sources))
}

/// Subdirectories of `base`, sorted by name, as `(group name, path)` pairs.
pub fn list_group_dirs(base: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut groups = vec![];
    for entry in std::fs::read_dir(base).with_context(|| format!("listing {}", base.display()))? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            groups.push((name.to_string(), path.clone()));
        }
    }
    groups.sort_by(|x, y| x.0.cmp(&y.0));
    Ok(groups)
}
