//! End-to-end install flows against a canned transport.

use std::fs;
use std::io::Write;
use std::sync::mpsc;
use std::time::Duration;

use modkit::{ClientConfig, Environment, Modio};
use modkit_http::testing::{CannedResponse, FakeTransport};

const KEY: &str = "0123456789abcdef0123456789abcdef";
const ARCHIVE_URL: &str = "https://cdn.example/archives/13.zip";

fn modfile_document() -> String {
    format!(
        r#"{{
            "data": [{{
                "id": 1685,
                "mod_id": 13,
                "date_added": 1550000000,
                "filesize": 512,
                "filehash": {{ "md5": "0123456789abcdef0123456789abcdef" }},
                "download": {{ "binary_url": "{ARCHIVE_URL}" }}
            }}],
            "result_offset": 0,
            "result_limit": 100,
            "result_total": 1
        }}"#
    )
}

fn archive_bytes() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("a.txt", options).unwrap();
        writer.write_all(b"alpha").unwrap();
        writer.add_directory("sub/", options).unwrap();
        writer.start_file("sub/b.txt", options).unwrap();
        writer.write_all(b"beta").unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

fn client_with(dir: &tempfile::TempDir, unzip: bool, transport: FakeTransport) -> Modio {
    let config = ClientConfig::new(KEY)
        .with_environment(Environment::Test)
        .with_root(dir.path().to_str().unwrap())
        .with_unzip(unzip);
    Modio::with_transport(config, Box::new(transport)).unwrap()
}

fn run_install(client: &Modio, game_id: u64, mod_id: u64) -> (bool, u64, u64) {
    let (tx, rx) = mpsc::channel();
    assert!(client.install(game_id, mod_id, 0, move |success, game, modid| {
        tx.send((success, game, modid)).unwrap();
    }));
    rx.recv_timeout(Duration::from_secs(10)).unwrap()
}

#[test]
fn install_with_unzip_extracts_tree_and_drops_archive() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new()
        .with_response("/files", CannedResponse::json(200, &modfile_document()))
        .with_response("cdn.example", CannedResponse::bytes(200, archive_bytes()));
    let client = client_with(&dir, true, transport);

    assert!(!client.is_installed(7, 13));
    let (success, game_id, mod_id) = run_install(&client, 7, 13);
    assert!(success);
    assert_eq!((game_id, mod_id), (7, 13));

    let root = dir.path();
    assert!(root.join("mods/7/13.json").is_file());
    assert_eq!(fs::read(root.join("mods/7/13/a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(root.join("mods/7/13/sub/b.txt")).unwrap(), b"beta");
    assert!(!root.join("mods/7/13.zip").exists());

    // Installed with no further network activity involved in the check.
    assert!(client.is_installed(7, 13));

    // The sidecar holds the modfile document verbatim enough to re-read.
    let sidecar: serde_json::Value =
        serde_json::from_slice(&fs::read(root.join("mods/7/13.json")).unwrap()).unwrap();
    assert_eq!(sidecar["id"], 1685);

    let installed = client.installed_mods(None);
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].game_id, 7);
    assert_eq!(installed[0].mod_id, 13);
    assert_eq!(installed[0].path, root.join("mods/7/13"));

    client.deinit();
}

#[test]
fn install_without_unzip_keeps_archive() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new()
        .with_response("/files", CannedResponse::json(200, &modfile_document()))
        .with_response("cdn.example", CannedResponse::bytes(200, archive_bytes()));
    let client = client_with(&dir, false, transport);

    let (success, ..) = run_install(&client, 7, 13);
    assert!(success);

    let root = dir.path();
    assert!(root.join("mods/7/13.zip").is_file());
    assert!(!root.join("mods/7/13").exists());

    let installed = client.installed_mods(Some(7));
    assert_eq!(installed[0].path, root.join("mods/7/13.zip"));

    client.deinit();
}

#[test]
fn install_fails_when_mod_has_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new()
        .with_response("/files", CannedResponse::json(200, r#"{"data":[]}"#));
    let client = client_with(&dir, true, transport);

    let (success, game_id, mod_id) = run_install(&client, 7, 13);
    assert!(!success);
    assert_eq!((game_id, mod_id), (7, 13));

    assert!(!client.is_installed(7, 13));
    assert!(!client.is_downloading(7, 13));

    client.deinit();
}

#[test]
fn install_fails_when_download_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new()
        .with_response("/files", CannedResponse::json(200, &modfile_document()))
        .with_response("cdn.example", CannedResponse::status(500));
    let client = client_with(&dir, true, transport);

    let (success, ..) = run_install(&client, 7, 13);
    assert!(!success);

    // The sidecar was written before the download failed; partial state
    // is left for a retry or uninstall to deal with.
    assert!(client.is_installed(7, 13));
    assert!(client.uninstall(7, 13));

    client.deinit();
}

#[test]
fn uninstall_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new()
        .with_response("/files", CannedResponse::json(200, &modfile_document()))
        .with_response("cdn.example", CannedResponse::bytes(200, archive_bytes()));
    let client = client_with(&dir, true, transport);

    let (success, ..) = run_install(&client, 7, 13);
    assert!(success);
    assert!(client.is_installed(7, 13));

    assert!(client.uninstall(7, 13));
    assert!(!client.is_installed(7, 13));
    assert!(!dir.path().join("mods/7/13").exists());

    // Repeated uninstalls keep reporting "was not installed".
    assert!(!client.uninstall(7, 13));
    assert!(!client.uninstall(7, 13));

    client.deinit();
}

#[test]
fn get_installed_mod_reads_sidecar_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new()
        .with_response("/files", CannedResponse::json(200, &modfile_document()))
        .with_response("cdn.example", CannedResponse::bytes(200, archive_bytes()));
    let client = client_with(&dir, true, transport);

    let (success, ..) = run_install(&client, 7, 13);
    assert!(success);

    let (tx, rx) = mpsc::channel();
    client.get_installed_mod(7, 13, move |outcome| {
        let (mods, _) = outcome.unwrap();
        assert_eq!(mods.len(), 1);
        tx.send(mods[0].more.get_int("mod_id")).unwrap();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 13);

    client.deinit();
}
