//! Merge behavior: pulls, pushes, directory creation and special entries

use upsync_core::domain::entry::EntryKind;
use upsync_core::domain::newtypes::Timestamp;
use upsync_store::MemoryStore;

use crate::common::{rp, Fixture, USER_ROOT};

#[tokio::test]
async fn test_remote_tree_replicates_into_empty_local() {
    let fx = Fixture::new().await;
    fx.seed_remote("foo", b"foo data", 100).await;
    fx.seed_remote("bar/baz", b"baz data", 100).await;

    let report = fx.sync().await.unwrap();

    assert_eq!(std::fs::read(fx.local("foo")).unwrap(), b"foo data");
    assert_eq!(std::fs::read(fx.local("bar/baz")).unwrap(), b"baz data");
    assert_eq!(fx.local_mtime("foo"), 100);
    assert_eq!(fx.local_mtime("bar/baz"), 100);

    assert_eq!(report.files_pulled, 2);
    assert_eq!(report.files_pushed, 0);
    assert_eq!(report.local_dirs_created, 1);
    assert_eq!(fx.lines(), vec!["mkdir bar", "pull bar/baz", "pull foo"]);
}

#[tokio::test]
async fn test_new_local_file_is_pushed_with_its_mtime() {
    let fx = Fixture::new().await;
    fx.write_local("newfile", b"fresh", 2_000);
    fx.set_last_sync(1_000);

    let report = fx.sync().await.unwrap();

    assert_eq!(report.files_pushed, 1);
    assert_eq!(report.files_pulled, 0);
    assert_eq!(fx.store.contents(&rp("newfile")).await.unwrap(), b"fresh");
    assert_eq!(fx.remote_mtime("newfile").await, Some(2_000));
    assert_eq!(fx.local_mtime("newfile"), 2_000);
    assert_eq!(std::fs::read(fx.local("newfile")).unwrap(), b"fresh");
}

#[tokio::test]
async fn test_second_run_transfers_nothing() {
    let fx = Fixture::new().await;
    fx.seed_remote("a", b"a", 100).await;
    fx.seed_remote("dir/b", b"b", 200).await;
    fx.write_local("c", b"c", 3_000);
    fx.mkdir_local("local_dir");
    fx.write_local("local_dir/d", b"d", 3_000);
    fx.set_last_sync(1_000);

    let first = fx.sync().await.unwrap();
    assert_eq!(first.transfers(), 4);

    let second = fx.sync().await.unwrap();
    assert_eq!(second.transfers(), 0);
    assert_eq!(second.local_dirs_created, 0);
    assert_eq!(second.remote_dirs_created, 0);
}

#[tokio::test]
async fn test_file_named_like_a_temp_file_converges() {
    let fx = Fixture::new().await;
    fx.seed_remote("report.upsync-tmp", b"quarterly", 100).await;

    let first = fx.sync().await.unwrap();
    assert_eq!(first.files_pulled, 1);
    assert_eq!(std::fs::read(fx.local("report.upsync-tmp")).unwrap(), b"quarterly");
    assert_eq!(fx.local_mtime("report.upsync-tmp"), 100);

    // No temporary file is left next to it.
    assert_eq!(std::fs::read_dir(fx.dir.path()).unwrap().count(), 1);

    let second = fx.sync().await.unwrap();
    assert_eq!(second.transfers(), 0);
}

#[tokio::test]
async fn test_both_present_latest_wins() {
    let fx = Fixture::new().await;
    fx.seed_remote("remote_newer", b"remote", 5_000).await;
    fx.write_local("remote_newer", b"local", 4_000);
    fx.seed_remote("local_newer", b"remote", 4_000).await;
    fx.write_local("local_newer", b"local", 5_000);
    fx.seed_remote("same", b"remote", 4_500).await;
    fx.write_local("same", b"local", 4_500);
    fx.set_last_sync(1_000);

    let report = fx.sync().await.unwrap();

    assert_eq!(std::fs::read(fx.local("remote_newer")).unwrap(), b"remote");
    assert_eq!(fx.local_mtime("remote_newer"), 5_000);

    assert_eq!(fx.store.contents(&rp("local_newer")).await.unwrap(), b"local");
    assert_eq!(fx.remote_mtime("local_newer").await, Some(5_000));

    // Equal timestamps are assumed in sync even when contents differ.
    assert_eq!(std::fs::read(fx.local("same")).unwrap(), b"local");
    assert_eq!(fx.store.contents(&rp("same")).await.unwrap(), b"remote");

    assert_eq!(report.files_pulled, 1);
    assert_eq!(report.files_pushed, 1);
    assert_eq!(fx.lines(), vec!["push local_newer", "pull remote_newer"]);
}

#[tokio::test]
async fn test_local_only_directory_is_created_remotely() {
    let fx = Fixture::new().await;
    fx.mkdir_local("docs");
    fx.mkdir_local("docs/nested");
    fx.write_local("docs/nested/note", b"note", 2_000);
    fx.set_last_sync(1_000);

    let report = fx.sync().await.unwrap();

    let docs = fx.store.entry(&rp("docs")).await.unwrap();
    assert_eq!(docs.kind, EntryKind::Directory);
    assert_eq!(fx.store.contents(&rp("docs/nested/note")).await.unwrap(), b"note");
    assert_eq!(fx.remote_mtime("docs/nested/note").await, Some(2_000));

    assert_eq!(report.remote_dirs_created, 2);
    assert_eq!(
        fx.lines(),
        vec![
            format!("remote mkdir {USER_ROOT}/docs"),
            format!("remote mkdir {USER_ROOT}/docs/nested"),
            "push docs/nested/note".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_big_remote_file_is_skipped() {
    let fx = Fixture::with_store(MemoryStore::with_block_size(1)).await;
    fx.seed_remote("big", &[0u8; 51], 100).await;
    fx.seed_remote("fits", &[0u8; 50], 100).await;

    let report = fx.sync().await.unwrap();

    assert!(!fx.local("big").exists());
    assert!(fx.local("fits").exists());
    assert_eq!(report.skipped_big, 1);
    assert_eq!(fx.lines(), vec!["skipping big big", "pull fits"]);
}

#[tokio::test]
async fn test_remote_link_is_never_materialized() {
    let fx = Fixture::new().await;
    fx.store
        .seed_link(&rp("link"), Timestamp::from_unix(100))
        .await
        .unwrap();
    fx.store
        .seed_link(&rp("shadowed"), Timestamp::from_unix(100))
        .await
        .unwrap();
    fx.write_local("shadowed", b"local", 2_000);
    fx.set_last_sync(1_000);

    let report = fx.sync().await.unwrap();

    assert!(!fx.local("link").exists());
    assert_eq!(std::fs::read(fx.local("shadowed")).unwrap(), b"local");
    assert_eq!(fx.store.entry(&rp("shadowed")).await.unwrap().kind, EntryKind::SymbolicLink);
    assert_eq!(report.ignored_links, 2);
    assert_eq!(report.transfers(), 0);
}

#[tokio::test]
async fn test_incomplete_remote_entry_leaves_placeholder() {
    let fx = Fixture::new().await;
    fx.store
        .seed_incomplete(&rp("partial"), Timestamp::from_unix(100))
        .await
        .unwrap();

    let first = fx.sync().await.unwrap();

    let meta = std::fs::symlink_metadata(fx.local("partial")).unwrap();
    assert_eq!(meta.len(), 0);
    assert_eq!(std::os::unix::fs::PermissionsExt::mode(&meta.permissions()) & 0o777, 0);
    assert_eq!(first.placeholders_created, 1);
    assert_eq!(fx.lines(), vec!["placeholder partial"]);

    // The placeholder is never pushed over the unreadable entry.
    let second = fx.sync().await.unwrap();
    assert_eq!(second.transfers(), 0);
    assert_eq!(second.skipped_unreadable, 1);
    assert_eq!(
        fx.store.entry(&rp("partial")).await.unwrap().kind,
        EntryKind::Incomplete
    );
}

#[tokio::test]
async fn test_successful_run_resets_local_root_time() {
    let fx = Fixture::new().await;
    fx.set_last_sync(1_000);

    let before = Timestamp::now().as_unix();
    fx.sync().await.unwrap();

    assert!(fx.last_sync() >= before);
}
