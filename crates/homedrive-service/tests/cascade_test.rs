//! Permanent deletion of folder subtrees.

mod helpers;

use helpers::TestApp;
use homedrive_core::error::ErrorKind;
use homedrive_entity::folder::Folder;
use homedrive_entity::node::NodeRef;

/// `/home/F` with files at every depth and bookmarks on each folder:
///
/// ```text
/// F/        f1 (10)
/// F/G/      g1 (20), g2 (5)
/// F/G/H/    h1 (15)
/// F/K/      (empty)
/// ```
async fn populated(app: &TestApp) -> (Folder, Folder, Folder, Folder) {
    let f = app.folder(NodeRef::Home, "F").await;
    let g = app.folder(NodeRef::Folder(f.id), "G").await;
    let h = app.folder(NodeRef::Folder(g.id), "H").await;
    let k = app.folder(NodeRef::Folder(f.id), "K").await;

    app.file(NodeRef::Folder(f.id), "f1", 10).await;
    app.file(NodeRef::Folder(g.id), "g1", 20).await;
    app.file(NodeRef::Folder(g.id), "g2", 5).await;
    app.file(NodeRef::Folder(h.id), "h1", 15).await;

    for folder in [&f, &g, &h, &k] {
        app.engine.add_bookmark(&app.ctx, folder.id).await.unwrap();
    }
    (f, g, h, k)
}

#[tokio::test]
async fn test_hard_delete_removes_entire_subtree() {
    let app = TestApp::new().await;
    let (f, g, h, k) = populated(&app).await;
    let keep = app.folder(NodeRef::Home, "Keep").await;
    app.file(NodeRef::Folder(keep.id), "kept", 7).await;
    app.engine.add_bookmark(&app.ctx, keep.id).await.unwrap();
    assert_eq!(app.space_used().await, 57);

    let report = app
        .engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap();
    assert_eq!(report.folders_deleted, 4);
    assert_eq!(report.files_deleted, 4);
    assert_eq!(report.bookmarks_deleted, 4);
    assert_eq!(report.freed_bytes, 50);
    assert_eq!(report.blobs_leaked, 0);

    for id in [f.id, g.id, h.id, k.id] {
        assert!(app.stored_folder(id).await.is_none());
    }
    let stats = app.store.stats().await;
    assert_eq!(stats.folders, 1);
    assert_eq!(stats.files, 1);
    assert_eq!(stats.bookmarks, 1);
    assert_eq!(app.space_used().await, 7);
    assert_eq!(app.blobs.len(), 1);
}

#[tokio::test]
async fn test_hard_delete_twice_is_a_noop() {
    let app = TestApp::new().await;
    let (f, ..) = populated(&app).await;

    app.engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap();
    let again = app
        .engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap();
    assert_eq!(again, Default::default());
    assert_eq!(app.space_used().await, 0);
}

#[tokio::test]
async fn test_interrupted_hard_delete_finishes_on_retry() {
    let app = TestApp::new().await;
    let (f, g, h, k) = populated(&app).await;

    // The deepest level commits, the next one fails.
    app.store.fail_commit_after(1);
    let err = app
        .engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);

    assert!(app.stored_folder(h.id).await.is_none());
    assert!(app.stored_folder(g.id).await.is_some());
    assert!(app.stored_folder(f.id).await.is_some());
    assert_eq!(app.space_used().await, 35);
    app.assert_path_invariant().await;

    let report = app
        .engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap();
    assert_eq!(report.folders_deleted, 3);
    assert_eq!(report.files_deleted, 3);
    assert_eq!(report.freed_bytes, 35);

    for id in [f.id, g.id, h.id, k.id] {
        assert!(app.stored_folder(id).await.is_none());
    }
    let stats = app.store.stats().await;
    assert_eq!(stats.folders, 0);
    assert_eq!(stats.files, 0);
    assert_eq!(stats.bookmarks, 0);
    assert_eq!(app.space_used().await, 0);
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn test_blob_release_failure_does_not_abort_cascade() {
    let app = TestApp::new().await;
    let (f, ..) = populated(&app).await;
    app.blobs.set_fail_deletes(true);

    let report = app
        .engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap();
    assert_eq!(report.files_deleted, 4);
    assert_eq!(report.blobs_leaked, 4);

    let stats = app.store.stats().await;
    assert_eq!(stats.folders, 0);
    assert_eq!(stats.files, 0);
    assert_eq!(app.space_used().await, 0);
}

#[tokio::test]
async fn test_hard_delete_of_trashed_folder() {
    let app = TestApp::new().await;
    let (f, _, h, _) = populated(&app).await;
    app.engine.soft_delete_folder(&app.ctx, h.id).await.unwrap();
    app.engine.soft_delete_folder(&app.ctx, f.id).await.unwrap();

    let report = app
        .engine
        .hard_delete_folder(&app.ctx, f.id, app.drive.id)
        .await
        .unwrap();
    assert_eq!(report.folders_deleted, 4);

    let trash = app.engine.list_trash(&app.ctx).await.unwrap();
    assert!(trash.is_empty());
}

#[tokio::test]
async fn test_hard_delete_leaves_name_extending_sibling() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    app.folder(NodeRef::Folder(a.id), "inner").await;
    let ab = app.folder(NodeRef::Home, "AB").await;
    app.file(NodeRef::Folder(ab.id), "kept", 3).await;

    app.engine
        .hard_delete_folder(&app.ctx, a.id, app.drive.id)
        .await
        .unwrap();
    assert_eq!(app.all_paths().await, vec!["/home/AB".to_string()]);
    assert_eq!(app.space_used().await, 3);
}

#[tokio::test]
async fn test_hard_delete_requires_ownership() {
    let app = TestApp::new().await;
    let (f, ..) = populated(&app).await;
    let (other, other_drive) = app.other_owner().await;

    let err = app
        .engine
        .hard_delete_folder(&other, f.id, other_drive.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(app.store.stats().await.folders, 4);
}

#[tokio::test]
async fn test_folder_moved_out_during_delete_survives() {
    use homedrive_database::DriveStore;

    let app = TestApp::new().await;
    let f = app.folder(NodeRef::Home, "F").await;
    let g = app.folder(NodeRef::Folder(f.id), "G").await;
    let h = app.folder(NodeRef::Folder(g.id), "H").await;
    let h1 = app.file(NodeRef::Folder(h.id), "h1", 10).await;

    // While the store is held, the delete queues before the move. The move
    // then commits between the delete's discovery and its sweep.
    let held = app.store.begin().await.unwrap();
    let (deleted, moved, ()) = tokio::join!(
        app.engine.hard_delete_folder(&app.ctx, f.id, app.drive.id),
        app.engine.move_folder(&app.ctx, g.id, NodeRef::Home),
        async {
            tokio::task::yield_now().await;
            drop(held);
        },
    );

    assert_eq!(moved.unwrap().absolute_path, "/home/G");
    let report = deleted.unwrap();
    assert_eq!(report.folders_deleted, 1);
    assert_eq!(report.files_deleted, 0);
    assert_eq!(report.freed_bytes, 0);

    assert!(app.stored_folder(f.id).await.is_none());
    assert_eq!(app.stored_folder(h.id).await.unwrap().absolute_path, "/home/G/H");
    assert!(app.stored_file(h1.id).await.is_some());
    assert_eq!(app.space_used().await, 10);
    assert_eq!(app.blobs.len(), 1);
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_upload_racing_delete_leaves_no_orphan() {
    use bytes::Bytes;
    use homedrive_database::DriveStore;

    let app = TestApp::new().await;
    let f = app.folder(NodeRef::Home, "F").await;
    let g = app.folder(NodeRef::Folder(f.id), "G").await;

    let held = app.store.begin().await.unwrap();
    let (deleted, uploaded, ()) = tokio::join!(
        app.engine.hard_delete_folder(&app.ctx, f.id, app.drive.id),
        app.engine.create_file(
            &app.ctx,
            app.drive.id,
            NodeRef::Folder(g.id),
            "late.bin",
            Bytes::from_static(&[1; 10]),
        ),
        async {
            tokio::task::yield_now().await;
            drop(held);
        },
    );

    deleted.unwrap();
    if let Err(e) = uploaded {
        assert_eq!(e.kind, ErrorKind::NotFound);
    }
    assert_eq!(app.store.stats().await.folders, 0);
    assert_eq!(app.store.stats().await.files, 0);
    assert_eq!(app.space_used().await, 0);
    assert!(app.blobs.is_empty());
}
