//! Integration tests for the artifact store and tree lister
//!
//! Every test runs against its own temporary root.

use std::fs;

use tempfile::TempDir;
use vault_common::store::{FileKind, NodeKind, TreeNode};
use vault_common::{ArtifactKey, ArtifactStore, Category, Error, TreeLister};

fn setup_store() -> (TempDir, ArtifactStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp_dir.path());
    (temp_dir, store)
}

fn names(nodes: &[TreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

// =============================================================================
// put / get / exists
// =============================================================================

#[tokio::test]
async fn test_round_trip_for_every_category() {
    let (_dir, store) = setup_store();

    for (i, category) in Category::all().iter().enumerate() {
        let key = if category.is_slotted() {
            ArtifactKey::slotted("dev1", "2025-06-21", *category, "08-30").unwrap()
        } else {
            ArtifactKey::singleton("dev1", "2025-06-21", *category).unwrap()
        };
        let bytes = vec![i as u8, 0, 255, b'{'];

        let written = store.put_artifact(&key, &bytes).await.unwrap();
        assert_eq!(written, store.root().join(key.relative_path()));
        assert_eq!(store.get_artifact(&key).await.unwrap(), bytes);
    }
}

#[tokio::test]
async fn test_put_overwrites_existing_file() {
    let (_dir, store) = setup_store();
    let path = "dev1/2025-06-21/sed-summary/result.json";

    store.put(path, b"{\"v\":1}").await.unwrap();
    store.put(path, b"{\"v\":2}").await.unwrap();

    assert_eq!(store.get(path).await.unwrap(), b"{\"v\":2}");
}

#[tokio::test]
async fn test_put_leaves_no_staging_files() {
    let (dir, store) = setup_store();
    store
        .put("dev1/2025-06-21/raw/08-00.wav", b"RIFF")
        .await
        .unwrap();

    let entries: Vec<String> = fs::read_dir(dir.path().join("dev1/2025-06-21/raw"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["08-00.wav".to_string()]);
}

#[tokio::test]
async fn test_failed_put_leaves_no_staging_files() {
    let (dir, store) = setup_store();
    let target = dir.path().join("dev1/2025-06-21/sed-summary/result.json");
    fs::create_dir_all(target.join("occupied")).unwrap();

    assert!(store
        .put("dev1/2025-06-21/sed-summary/result.json", b"{}")
        .await
        .is_err());

    let entries: Vec<String> = fs::read_dir(dir.path().join("dev1/2025-06-21/sed-summary"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["result.json".to_string()]);
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let (_dir, store) = setup_store();
    let err = store
        .get("dev1/2025-06-21/raw/08-00.wav")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_get_directory_is_not_found() {
    let (_dir, store) = setup_store();
    store.put("dev1/2025-06-21/sed/00-00.json", b"{}").await.unwrap();

    let err = store.get("dev1/2025-06-21/sed").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_exists() {
    let (_dir, store) = setup_store();
    let path = "dev1/2025-06-21/prompt/emotion-timeline_gpt_prompt.json";

    assert!(!store.exists(path).await);
    store.put(path, b"{}").await.unwrap();
    assert!(store.exists(path).await);
    assert!(!store.exists("dev1/2025-06-21/prompt").await);
    assert!(!store.exists("../outside.json").await);
}

// =============================================================================
// read_json
// =============================================================================

#[tokio::test]
async fn test_read_json_parses_document() {
    let (_dir, store) = setup_store();
    let key = ArtifactKey::singleton("dev1", "2025-06-25", Category::EmotionTimeline).unwrap();
    store
        .put_artifact(&key, br#"{"timeline":[1,2,3]}"#)
        .await
        .unwrap();

    let doc = store.read_artifact_json(&key).await.unwrap();
    assert_eq!(doc["timeline"][2], 3);
}

#[tokio::test]
async fn test_read_json_distinguishes_missing_from_malformed() {
    let (_dir, store) = setup_store();
    let path = "dev1/2025-06-25/sed-summary/result.json";

    assert!(matches!(
        store.read_json(path).await.unwrap_err(),
        Error::NotFound(_)
    ));

    store.put(path, b"{not json").await.unwrap();
    assert!(matches!(
        store.read_json(path).await.unwrap_err(),
        Error::Format(_)
    ));
}

// =============================================================================
// Containment
// =============================================================================

#[tokio::test]
async fn test_locate_rejects_escaping_paths() {
    let (_dir, store) = setup_store();
    for path in ["../x.json", "dev1/../../x.json", "/etc/passwd", ""] {
        assert!(
            matches!(store.locate(path), Err(Error::Validation(_))),
            "expected rejection for {:?}",
            path
        );
    }
    assert!(store.put("../escape.json", b"{}").await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_locate_rejects_symlink_escape() {
    let (dir, store) = setup_store();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.json"), b"{}").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("dev1")).unwrap();

    assert!(matches!(
        store.locate("dev1/secret.json"),
        Err(Error::Validation(_))
    ));
    assert!(store.get("dev1/secret.json").await.is_err());
    assert!(store.put("dev1/new.json", b"{}").await.is_err());
    assert!(!outside.path().join("new.json").exists());
}

#[tokio::test]
async fn test_paths_through_a_regular_file_are_not_found() {
    let (dir, store) = setup_store();
    fs::write(dir.path().join("stray.json"), b"{}").unwrap();
    fs::create_dir_all(dir.path().join("dev1/2025-06-21")).unwrap();
    fs::write(dir.path().join("dev1/2025-06-21/notes.txt"), b"x").unwrap();

    let key = ArtifactKey::singleton("stray.json", "2025-06-21", Category::SedSummary).unwrap();
    assert!(store.locate(&key.relative_path()).is_ok());
    assert!(matches!(
        store.get_artifact(&key).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.read_artifact_json(&key).await,
        Err(Error::NotFound(_))
    ));
    assert!(!store.exists(&key.relative_path()).await);

    assert!(matches!(
        store.get("dev1/2025-06-21/notes.txt/x.json").await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.list_slots("stray.json/2025-06-21/opensmile").await,
        Err(Error::NotFound(_))
    ));

    let listing = store
        .opensmile_slot_listing("stray.json", "2025-06-21")
        .await
        .unwrap();
    assert!(listing.available_slots.is_empty());
    assert!(!listing.has_summary);
}

// =============================================================================
// list_slots / opensmile_slot_listing
// =============================================================================

#[tokio::test]
async fn test_list_slots_sorted_json_only() {
    let (_dir, store) = setup_store();
    for slot in ["20-30", "08-00", "13-15"] {
        let key = ArtifactKey::slotted("dev1", "2025-06-25", Category::Opensmile, slot).unwrap();
        store.put_artifact(&key, b"{}").await.unwrap();
    }
    store
        .put("dev1/2025-06-25/opensmile/readme.txt", b"x")
        .await
        .unwrap();

    let slots = store.list_slots("dev1/2025-06-25/opensmile").await.unwrap();
    assert_eq!(slots, vec!["08-00", "13-15", "20-30"]);
}

#[tokio::test]
async fn test_list_slots_missing_dir_is_not_found() {
    let (_dir, store) = setup_store();
    assert!(matches!(
        store.list_slots("dev1/2025-06-25/opensmile").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_slot_listing_reports_summary_presence() {
    let (_dir, store) = setup_store();
    let slot = ArtifactKey::slotted("dev1", "2025-06-25", Category::Opensmile, "10-00").unwrap();
    store.put_artifact(&slot, b"{}").await.unwrap();

    let listing = store
        .opensmile_slot_listing("dev1", "2025-06-25")
        .await
        .unwrap();
    assert_eq!(listing.available_slots, vec!["10-00"]);
    assert_eq!(listing.count, 1);
    assert!(!listing.has_summary);
    assert!(listing.directory.unwrap().ends_with("opensmile"));

    let summary = ArtifactKey::singleton("dev1", "2025-06-25", Category::OpensmileSummary).unwrap();
    store.put_artifact(&summary, b"{}").await.unwrap();

    let listing = store
        .opensmile_slot_listing("dev1", "2025-06-25")
        .await
        .unwrap();
    assert!(listing.has_summary);
}

#[tokio::test]
async fn test_slot_listing_without_feature_dir_is_empty() {
    let (_dir, store) = setup_store();
    let listing = store
        .opensmile_slot_listing("dev1", "2025-06-25")
        .await
        .unwrap();
    assert!(listing.available_slots.is_empty());
    assert_eq!(listing.count, 0);
    assert!(!listing.has_summary);
    assert!(listing.directory.is_none());
}

#[tokio::test]
async fn test_slot_listing_reports_summary_without_feature_dir() {
    let (_dir, store) = setup_store();
    let summary = ArtifactKey::singleton("dev1", "2025-06-25", Category::OpensmileSummary).unwrap();
    store.put_artifact(&summary, b"{}").await.unwrap();

    let listing = store
        .opensmile_slot_listing("dev1", "2025-06-25")
        .await
        .unwrap();
    assert!(listing.available_slots.is_empty());
    assert_eq!(listing.count, 0);
    assert!(listing.has_summary);
    assert!(listing.directory.is_none());
}

// =============================================================================
// TreeLister
// =============================================================================

#[test]
fn test_tree_missing_root_is_empty() {
    let dir = TempDir::new().unwrap();
    let lister = TreeLister::new(dir.path().join("does-not-exist"));
    assert!(lister.list().unwrap().is_empty());
}

#[test]
fn test_tree_ordering() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for path in [
        "zeta/2025-06-30/raw/08-00.wav",
        "alpha/2025-06-30/sed/00-00.json",
        "alpha/2025-07-01/raw/08-00.wav",
        "alpha/2025-07-01/raw/07-30.wav",
        "alpha/2025-07-01/notes.txt",
        "alpha/2025-07-01/emotion-timeline/emotion-timeline.json",
        "alpha/misc/readme.txt",
    ] {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, b"x").unwrap();
    }
    // Files at the device level are not part of the listing
    fs::write(root.join("alpha/stray.txt"), b"x").unwrap();

    let devices = TreeLister::new(root).list().unwrap();
    assert_eq!(names(&devices), vec!["alpha", "zeta"]);

    let alpha = &devices[0];
    assert_eq!(names(&alpha.children), vec!["2025-07-01", "2025-06-30", "misc"]);

    let newest = &alpha.children[0];
    assert_eq!(newest.relative_path, "alpha/2025-07-01");
    assert_eq!(
        names(&newest.children),
        vec!["emotion-timeline", "raw", "notes.txt"]
    );
    assert_eq!(newest.children[2].file_kind(), Some(FileKind::Other));

    let raw = &newest.children[1];
    assert!(raw.is_dir());
    assert_eq!(names(&raw.children), vec!["07-30.wav", "08-00.wav"]);
    assert_eq!(raw.children[0].kind, NodeKind::File(FileKind::Audio));
    assert_eq!(raw.children[0].relative_path, "alpha/2025-07-01/raw/07-30.wav");

    let timeline = &newest.children[0].children[0];
    assert_eq!(timeline.file_kind(), Some(FileKind::Json));
}

#[cfg(unix)]
#[test]
fn test_tree_does_not_follow_symlinks_out_of_root() {
    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.json"), b"{}").unwrap();

    let date_dir = dir.path().join("dev1/2025-06-21");
    fs::create_dir_all(date_dir.join("sed")).unwrap();
    fs::write(date_dir.join("sed/00-00.json"), b"{}").unwrap();
    std::os::unix::fs::symlink(outside.path(), date_dir.join("linked-dir")).unwrap();
    std::os::unix::fs::symlink(
        outside.path().join("secret.json"),
        date_dir.join("linked.json"),
    )
    .unwrap();
    std::os::unix::fs::symlink(date_dir.join("sed/00-00.json"), date_dir.join("alias.json"))
        .unwrap();

    let devices = TreeLister::new(dir.path()).list().unwrap();
    let date = &devices[0].children[0];
    assert_eq!(names(&date.children), vec!["sed", "alias.json"]);
}
