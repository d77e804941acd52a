//! Whole-directory encode and whole-file decode. Every group is handled on its
//! own; a failing group is logged and counted and never stops its siblings.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use log::{error, info, warn};

use crate::{
    config::{EncoderConfig, Layout},
    decode::decode_group,
    encode::build_group,
    import::load_group_dir,
    model::TraitGroup,
    persist::save_png,
};

#[derive(Debug, Default)]
pub struct EncodeReport {
    /// `(group name, blob)` in input order.
    pub entries: Vec<(String, Vec<u8>)>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DecodeReport {
    pub groups: Vec<TraitGroup>,
    /// Entries that failed to decode or to render.
    pub failed: Vec<String>,
}

/// Encodes the PNGs in `dir` as group `name`. `None` when `dir` is missing.
pub fn encode_one(
    dir: &Path,
    name: &str,
    config: &EncoderConfig,
    verify: bool,
) -> Result<Option<Vec<u8>>> {
    let Some(sources) = load_group_dir(dir, config.canvas)? else {
        return Ok(None);
    };
    let group = build_group(name, &sources, config)?;
    let blob = group.to_bytes()?;
    if verify {
        let decoded = decode_group(&blob, config.layout())?;
        ensure!(decoded == group, "group '{}' does not survive a round trip", name);
    }
    info!(
        "{}: {} traits, {} colors, {}-byte indices, {} bytes",
        name,
        group.traits.len(),
        group.palette.len(),
        group.index_width.bytes(),
        blob.len()
    );
    Ok(Some(blob))
}

pub fn encode_groups(
    group_dirs: &[(String, PathBuf)],
    config: &EncoderConfig,
    verify: bool,
) -> EncodeReport {
    let mut report = EncodeReport::default();
    for (name, dir) in group_dirs {
        match encode_one(dir, name, config, verify) {
            Ok(Some(blob)) => report.entries.push((name.clone(), blob)),
            Ok(None) => {
                warn!("{}: skipped, {} not found", name, dir.display());
                report.skipped.push(name.clone());
            }
            Err(e) => {
                error!("{}: {:#}", name, e);
                report.failed.push(name.clone());
            }
        }
    }
    report
}

/// Turns a name read from a blob into a single, harmless path component.
pub fn path_component(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if s.is_empty() || s.starts_with('.') {
        s.insert(0, '_');
    }
    s
}

/// Writes every trait of `group` as `<dir>/<group>/<NNN>_<trait>.png`, on a
/// canvas just large enough for the widest and tallest trait.
pub fn render_group(dir: &Path, group: &TraitGroup) -> Result<()> {
    let width = group.traits.iter().map(|t| t.bounds.x2 as usize + 1).max().unwrap_or(1);
    let height = group.traits.iter().map(|t| t.bounds.y2 as usize + 1).max().unwrap_or(1);
    let group_dir = dir.join(path_component(&group.name));
    for (i, t) in group.traits.iter().enumerate() {
        let grid = t.to_grid(&group.palette, width, height)?;
        let file_name = format!("{:03}_{}.png", i, path_component(&t.name));
        save_png(&group_dir.join(file_name), &grid)?;
    }
    Ok(())
}

pub fn decode_entries(
    entries: &[(String, Vec<u8>)],
    layout: Layout,
    render: Option<&Path>,
) -> DecodeReport {
    let mut report = DecodeReport::default();
    for (name, blob) in entries {
        let group = match decode_group(blob, layout) {
            Ok(group) => group,
            Err(e) => {
                error!("{}: {}", name, e);
                report.failed.push(name.clone());
                continue;
            }
        };
        info!(
            "{} ({}): {} traits, {} colors",
            name,
            group.name,
            group.traits.len(),
            group.palette.len()
        );
        if let Some(dir) = render {
            if let Err(e) = render_group(dir, &group) {
                error!("{}: rendering failed: {:#}", name, e);
                report.failed.push(name.clone());
            }
        }
        report.groups.push(group);
    }
    report
}
