use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use anyhow::{bail, Context, Result};
use json_pretty_compact::PrettyCompactFormatter;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Serializer;

use crate::{common::PixelGrid, config::EncoderConfig};

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    info!("Saving {}", path.display());
    let formatter = PrettyCompactFormatter::new();
    let mut data_bytes = vec![];
    let mut ser = Serializer::with_formatter(&mut data_bytes, formatter);
    data.serialize(&mut ser)?;
    create_parent_dir(path)?;
    fs::write(path, &data_bytes)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!("Loading {}", path.display());
    let data_bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let data: T = serde_json::from_slice(&data_bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(data)
}

pub fn load_config(path: Option<&Path>) -> Result<EncoderConfig> {
    match path {
        Some(path) => load_json(path),
        None => Ok(EncoderConfig::default()),
    }
}

/// One `<GroupName>: 0x<hex>` line.
pub fn format_hex_entry(name: &str, blob: &[u8]) -> String {
    format!("{}: 0x{}", name, hex::encode(blob))
}

/// Writes entries separated by a blank line.
pub fn save_hex_entries(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<()> {
    info!("Saving {}", path.display());
    let text = entries
        .iter()
        .map(|(name, blob)| format_hex_entry(name, blob))
        .collect::<Vec<_>>()
        .join("\n\n");
    create_parent_dir(path)?;
    fs::write(path, text)?;
    Ok(())
}

pub fn parse_hex_entries(text: &str) -> Result<Vec<(String, Vec<u8>)>> {
    let mut entries = vec![];
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, digits)) = line.rsplit_once(": 0x") else {
            bail!("line {}: expected '<name>: 0x<hex>'", line_no + 1);
        };
        let blob = hex::decode(digits).with_context(|| format!("line {}: bad hex", line_no + 1))?;
        entries.push((name.trim().to_string(), blob));
    }
    Ok(entries)
}

pub fn load_hex_entries(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    info!("Loading {}", path.display());
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_hex_entries(&text)
}

pub fn save_png(path: &Path, grid: &PixelGrid) -> Result<()> {
    create_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        grid.width() as u32,
        grid.height() as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    let data: Vec<u8> = grid
        .pixels()
        .iter()
        .flat_map(|c| [c.red, c.green, c.blue, c.alpha])
        .collect();
    writer.write_image_data(&data)?;
    Ok(())
}
