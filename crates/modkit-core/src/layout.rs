//! On-disk layout under the configured root directory.
//!
//! Everything the client persists lives under one root:
//!
//! ```text
//! <root>/token                  bearer token, raw bytes
//! <root>/mods/<game>/<mod>.json modfile metadata sidecar
//! <root>/mods/<game>/<mod>.zip  downloaded archive (pre-extraction)
//! <root>/mods/<game>/<mod>/     extracted tree
//! ```
//!
//! The sidecar is the source of truth for "is installed"; archive and
//! tree may or may not exist depending on the unzip setting.

use std::path::{Path, PathBuf};

/// Resolves paths below the configured root directory.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Build a layout over `root`. Trailing path separators are stripped
    /// so that joined paths never carry doubled separators.
    #[must_use]
    pub fn new(root: &str) -> Self {
        let trimmed = root.trim_end_matches(['/', '\\']);
        let root = if trimmed.is_empty() { root } else { trimmed };
        Self {
            root: PathBuf::from(root),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the persisted bearer token.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.root.join("token")
    }

    /// Directory holding all installed mods.
    #[must_use]
    pub fn mods_dir(&self) -> PathBuf {
        self.root.join("mods")
    }

    /// Directory holding everything for one game.
    #[must_use]
    pub fn game_dir(&self, game_id: u64) -> PathBuf {
        self.mods_dir().join(game_id.to_string())
    }

    /// Metadata sidecar for one installed mod.
    #[must_use]
    pub fn sidecar_path(&self, game_id: u64, mod_id: u64) -> PathBuf {
        self.game_dir(game_id).join(format!("{mod_id}.json"))
    }

    /// Downloaded archive for one mod.
    #[must_use]
    pub fn archive_path(&self, game_id: u64, mod_id: u64) -> PathBuf {
        self.game_dir(game_id).join(format!("{mod_id}.zip"))
    }

    /// Extracted tree for one mod.
    #[must_use]
    pub fn tree_path(&self, game_id: u64, mod_id: u64) -> PathBuf {
        self.game_dir(game_id).join(mod_id.to_string())
    }
}

/// Parse a sidecar file name into its mod id.
///
/// A mod is identified on disk by a file whose stem is entirely decimal
/// digits and whose extension is `json`; anything else is ignored by
/// enumeration.
#[must_use]
pub fn mod_id_from_sidecar(path: &Path) -> Option<u64> {
    if !path.extension().is_some_and(|ext| ext == "json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}
