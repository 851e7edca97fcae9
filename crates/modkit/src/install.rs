//! Mod installation and on-disk management.
//!
//! An install composes a modfile lookup, a sidecar write, a streamed
//! archive download, and (when unzip is enabled) extraction:
//!
//! 1. look up the modfile record for `(game_id, mod_id, modfile_id)`;
//! 2. persist its raw document to `mods/<game>/<mod>.json`;
//! 3. stream the archive into `mods/<game>/<mod>.zip`;
//! 4. optionally extract into `mods/<game>/<mod>/` and drop the zip;
//! 5. deliver `(success, game_id, mod_id)` and leave the registry.
//!
//! The registry of in-flight installs backs [`Modio::is_downloading`].
//! Partial files from failed installs are left in place; a later
//! successful install overwrites them and `uninstall` removes them.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use modkit_core::layout::mod_id_from_sidecar;
use modkit_core::{decode_page, Error, FromDoc, Mod, Modfile};
use modkit_http::{Body, Request, Sink};

use crate::client::{Modio, PageResult};
use crate::dispatch::{Call, Shared};

/// One installed mod discovered on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledMod {
    /// Game the mod belongs to.
    pub game_id: u64,
    /// The mod.
    pub mod_id: u64,
    /// The extracted tree if it exists, otherwise the archive,
    /// otherwise the metadata sidecar.
    pub path: PathBuf,
}

impl Modio {
    /// Download and install a mod.
    ///
    /// `modfile_id` 0 installs the first published file; a non-zero id
    /// installs that exact file. The continuation receives
    /// `(success, game_id, mod_id)`; success means the archive download
    /// answered 200 and, when unzip is enabled, extraction completed.
    ///
    /// Returns `false` without side effects when the same
    /// `(game_id, mod_id)` is already downloading.
    pub fn install<F>(&self, game_id: u64, mod_id: u64, modfile_id: u64, callback: F) -> bool
    where
        F: FnOnce(bool, u64, u64) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");

        if !self.shared.installs.lock().unwrap().insert((game_id, mod_id)) {
            return false;
        }

        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            let outcome = install_flow(&shared, game_id, mod_id, modfile_id).await;
            if let Err(err) = &outcome {
                warn!(game_id, mod_id, %err, "install failed");
            }
            callback(outcome.is_ok(), game_id, mod_id);
            shared.installs.lock().unwrap().remove(&(game_id, mod_id));
        });
        true
    }

    /// Whether a mod is installed, judged by its metadata sidecar.
    /// Purely local; no network activity.
    pub fn is_installed(&self, game_id: u64, mod_id: u64) -> bool {
        let game_id = self.shared.resolve_game_id(game_id);
        self.shared.layout.sidecar_path(game_id, mod_id).is_file()
    }

    /// Whether an install of this mod is currently in flight.
    pub fn is_downloading(&self, game_id: u64, mod_id: u64) -> bool {
        let game_id = self.shared.resolve_game_id(game_id);
        self.shared
            .installs
            .lock()
            .unwrap()
            .contains(&(game_id, mod_id))
    }

    /// Remove an installed mod: sidecar, archive, extracted tree, in
    /// that order. Returns `false` when the mod is not installed. Does
    /// not wait for in-flight downloads.
    pub fn uninstall(&self, game_id: u64, mod_id: u64) -> bool {
        let game_id = self.shared.resolve_game_id(game_id);
        let sidecar = self.shared.layout.sidecar_path(game_id, mod_id);
        if !sidecar.is_file() {
            return false;
        }
        if let Err(err) = fs::remove_file(&sidecar) {
            warn!(game_id, mod_id, %err, "could not remove sidecar");
            return false;
        }

        let archive = self.shared.layout.archive_path(game_id, mod_id);
        if archive.is_file() {
            if let Err(err) = fs::remove_file(&archive) {
                warn!(game_id, mod_id, %err, "could not remove archive");
            }
        }
        let tree = self.shared.layout.tree_path(game_id, mod_id);
        if tree.is_dir() {
            if let Err(err) = fs::remove_dir_all(&tree) {
                warn!(game_id, mod_id, %err, "could not remove extracted tree");
            }
        }
        true
    }

    /// Enumerate installed mods, optionally restricted to one game.
    ///
    /// A mod is recognized by its sidecar: a file named after its
    /// decimal mod id with a `.json` extension. Results are ordered by
    /// `(game_id, mod_id)`.
    pub fn installed_mods(&self, game_filter: Option<u64>) -> Vec<InstalledMod> {
        let mut found = Vec::new();
        let Ok(games) = fs::read_dir(self.shared.layout.mods_dir()) else {
            return found;
        };
        for game_entry in games.flatten() {
            let Some(game_id) = game_entry
                .file_name()
                .to_str()
                .filter(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|name| name.parse::<u64>().ok())
            else {
                continue;
            };
            if game_filter.is_some_and(|wanted| wanted != game_id) {
                continue;
            }
            let Ok(entries) = fs::read_dir(game_entry.path()) else {
                continue;
            };
            for entry in entries.flatten() {
                let sidecar = entry.path();
                let Some(mod_id) = mod_id_from_sidecar(&sidecar) else {
                    continue;
                };
                let tree = self.shared.layout.tree_path(game_id, mod_id);
                let archive = self.shared.layout.archive_path(game_id, mod_id);
                let path = if tree.is_dir() {
                    tree
                } else if archive.is_file() {
                    archive
                } else {
                    sidecar
                };
                found.push(InstalledMod {
                    game_id,
                    mod_id,
                    path,
                });
            }
        }
        found.sort_by_key(|installed| (installed.game_id, installed.mod_id));
        found
    }

    /// Load the persisted sidecar of an installed mod and deliver it as
    /// a one-element mod list. Purely local; the continuation still runs
    /// on a worker task for a uniform callback contract.
    pub fn get_installed_mod<F>(&self, game_id: u64, mod_id: u64, callback: F)
    where
        F: for<'doc> FnOnce(PageResult<Mod<'doc>>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");

        let sidecar = self.shared.layout.sidecar_path(game_id, mod_id);
        self.runtime.spawn(async move {
            match fs::read(&sidecar) {
                Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                    Ok(document) => callback(Ok(decode_page(&document))),
                    Err(err) => callback(Err(err.into())),
                },
                Err(err) => callback(Err(Error::Io(err))),
            }
        });
    }
}

/// Run one install to completion. Errors short-circuit; the caller
/// turns them into the `success = false` continuation.
async fn install_flow(
    shared: &Shared,
    game_id: u64,
    mod_id: u64,
    modfile_id: u64,
) -> Result<(), Error> {
    // Metadata fetch. A zero modfile id lists the mod's files and the
    // first entry wins, matching the singleton normalization elsewhere.
    let request = Request::get(shared.routes.modfiles(game_id, mod_id, modfile_id, None))
        .with_header("Accept", "application/json");
    let document = shared.fetch_document(Call::expecting(request, 200)).await?;
    let node = match document.get("data").and_then(Value::as_array) {
        Some(items) => items
            .first()
            .ok_or_else(|| Error::decode("mod has no published files"))?,
        None => &document,
    };
    let modfile = Modfile::from_doc(node);
    if modfile.url.is_empty() {
        return Err(Error::decode("modfile carries no download url"));
    }
    let download_url = modfile.url.to_string();
    debug!(game_id, mod_id, modfile_id = modfile.id, "modfile resolved");

    // Sidecar first: it is the marker enumeration and uninstall key off.
    fs::create_dir_all(shared.layout.game_dir(game_id))?;
    fs::write(
        shared.layout.sidecar_path(game_id, mod_id),
        serde_json::to_vec_pretty(node)?,
    )?;

    // Archive download, streamed straight to disk.
    let archive_path = shared.layout.archive_path(game_id, mod_id);
    let file = File::create(&archive_path)?;
    let response = shared
        .transport
        .execute(Request::get(download_url), Sink::File(file))
        .await
        .map_err(|err| Error::transport(err.to_string()))?;
    if response.status != 200 {
        return Err(Error::protocol(response.status));
    }
    debug!(game_id, mod_id, bytes = response.body.len(), "archive downloaded");

    if shared.unzip {
        let Body::File(mut file, _) = response.body else {
            return Err(Error::decode("download body was not streamed"));
        };
        file.seek(SeekFrom::Start(0))?;
        extract_archive(file, &shared.layout.tree_path(game_id, mod_id))?;
        fs::remove_file(&archive_path)?;
    }
    Ok(())
}

/// Extract every regular file of the archive under `dest`, creating
/// directories as needed. Entries that escape `dest` are skipped.
fn extract_archive(file: File, dest: &Path) -> Result<(), Error> {
    let mut archive =
        zip::ZipArchive::new(file).map_err(|err| Error::decode(err.to_string()))?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| Error::decode(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "skipping archive entry with unsafe path");
            continue;
        };
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}
