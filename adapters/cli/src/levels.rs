//! Level pack loading.
//!
//! A pack is a versioned list of [`LevelData`] entries stored as TOML, or as
//! JSON when the file carries a `.json` extension. Every level is validated
//! before the pack is handed to the campaign.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sundial_core::{Level, LevelData};

const SUPPORTED_PACK_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct LevelPack {
    version: u32,
    #[serde(default)]
    levels: Vec<LevelData>,
}

/// Reads and validates the level pack stored at `path`.
pub(crate) fn load_pack(path: &Path) -> Result<Vec<Level>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level pack at {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let pack = if is_json {
        serde_json::from_str(&contents).context("failed to parse level pack json contents")?
    } else {
        parse_toml(&contents)?
    };
    validate_pack(pack)
}

fn parse_toml(contents: &str) -> Result<LevelPack> {
    toml::from_str(contents).context("failed to parse level pack toml contents")
}

fn validate_pack(pack: LevelPack) -> Result<Vec<Level>> {
    if pack.version != SUPPORTED_PACK_VERSION {
        bail!(
            "unsupported level pack version {}; expected {}",
            pack.version,
            SUPPORTED_PACK_VERSION
        );
    }
    if pack.levels.is_empty() {
        bail!("level pack contains no levels");
    }

    pack.levels
        .into_iter()
        .enumerate()
        .map(|(index, data)| {
            let name = data.name.clone();
            Level::validate(data).with_context(|| format!("level {index} ({name:?}) is invalid"))
        })
        .collect()
}
