use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use trait_codec::{
    batch::{decode_entries, encode_groups},
    import::list_group_dirs,
    persist::{load_config, load_hex_entries, save_hex_entries, save_json},
    EncoderConfig,
};

#[derive(Parser, Debug)]
#[command(version, about = "Encode pixel-art trait groups into compact binary blobs")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode every group directory under the base directory
    Encode {
        /// Directory holding one subdirectory of PNGs per group
        #[arg(long, env = "BASE_DIR", default_value = ".")]
        base_dir: PathBuf,
        /// JSON encoder config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only encode these groups, in this order
        #[arg(long, short)]
        group: Vec<String>,
        #[arg(long, short, default_value = "output/traits_asset.txt")]
        output: PathBuf,
        /// Decode every blob again and compare it with what was encoded
        #[arg(long)]
        verify: bool,
    },
    /// Decode and validate a file of `<name>: 0x<hex>` entries
    Decode {
        input: PathBuf,
        /// JSON encoder config the blobs were written with
        #[arg(long)]
        config: Option<PathBuf>,
        /// Dump the decoded groups as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write every decoded trait as a PNG under this directory
        #[arg(long)]
        render: Option<PathBuf>,
    },
}

fn run_encode(
    base_dir: &Path,
    config: &EncoderConfig,
    groups: &[String],
    output: &Path,
    verify: bool,
) -> Result<()> {
    let group_dirs = if groups.is_empty() {
        list_group_dirs(base_dir)?
    } else {
        groups
            .iter()
            .map(|name| (name.clone(), base_dir.join(name)))
            .collect()
    };

    let report = encode_groups(&group_dirs, config, verify);
    save_hex_entries(output, &report.entries)?;
    if !report.failed.is_empty() {
        bail!(
            "{} of {} groups failed: {}",
            report.failed.len(),
            group_dirs.len(),
            report.failed.join(", ")
        );
    }
    Ok(())
}

fn run_decode(
    input: &Path,
    config: &EncoderConfig,
    json: Option<&Path>,
    render: Option<&Path>,
) -> Result<()> {
    let entries = load_hex_entries(input)?;
    let report = decode_entries(&entries, config.layout(), render);
    if let Some(path) = json {
        save_json(path, &report.groups)?;
    }
    if !report.failed.is_empty() {
        bail!("{} groups failed: {}", report.failed.len(), report.failed.join(", "));
    }
    Ok(())
}

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.command {
        Command::Encode {
            base_dir,
            config,
            group,
            output,
            verify,
        } => {
            let config = load_config(config.as_deref())?;
            run_encode(&base_dir, &config, &group, &output, verify)
        }
        Command::Decode {
            input,
            config,
            json,
            render,
        } => {
            let config = load_config(config.as_deref())?;
            run_decode(&input, &config, json.as_deref(), render.as_deref())
        }
    }
}
