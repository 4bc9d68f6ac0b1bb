//! Folder creation, rename, and move.

mod helpers;

use helpers::TestApp;
use homedrive_core::error::ErrorKind;
use homedrive_entity::node::NodeRef;

#[tokio::test]
async fn test_create_nested_folders() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;

    assert_eq!(a.absolute_path, "/home/A");
    assert_eq!(a.parent_id, None);
    assert_eq!(b.absolute_path, "/home/A/B");
    assert_eq!(b.parent_id, Some(a.id));

    let resolved = app.engine.resolve_path(&app.ctx, "/home/A/B").await.unwrap();
    assert_eq!(resolved, NodeRef::Folder(b.id));
    let resolved = app.engine.resolve_path(&app.ctx, "/home/A/").await.unwrap();
    assert_eq!(resolved, NodeRef::Folder(a.id));
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_create_rejects_bad_names() {
    let app = TestApp::new().await;
    for bad in ["", "a/b", ".", ".."] {
        let err = app
            .engine
            .create_folder(&app.ctx, app.drive.id, NodeRef::Home, bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath, "{bad:?}");
    }
}

#[tokio::test]
async fn test_folders_and_files_share_a_namespace() {
    let app = TestApp::new().await;
    app.folder(NodeRef::Home, "docs").await;
    app.file(NodeRef::Home, "notes", 4).await;

    let err = app
        .engine
        .create_folder(&app.ctx, app.drive.id, NodeRef::Home, "docs")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = app
        .engine
        .create_folder(&app.ctx, app.drive.id, NodeRef::Home, "notes")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = app
        .engine
        .create_file(
            &app.ctx,
            app.drive.id,
            NodeRef::Home,
            "docs",
            bytes::Bytes::from_static(b"x"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_cannot_create_in_trash() {
    let app = TestApp::new().await;
    let err = app
        .engine
        .create_folder(&app.ctx, app.drive.id, NodeRef::Trash, "A")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);

    let a = app.folder(NodeRef::Home, "A").await;
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();
    let err = app
        .engine
        .create_folder(&app.ctx, app.drive.id, NodeRef::Folder(a.id), "B")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
}

#[tokio::test]
async fn test_rename_rewrites_subtree_only() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    let c = app.folder(NodeRef::Folder(b.id), "C").await;
    let sibling = app.folder(NodeRef::Home, "A2sibling").await;
    let sibling_child = app.folder(NodeRef::Folder(sibling.id), "X").await;

    let renamed = app.engine.rename_folder(&app.ctx, a.id, "A2").await.unwrap();
    assert_eq!(renamed.absolute_path, "/home/A2");

    assert_eq!(
        app.stored_folder(b.id).await.unwrap().absolute_path,
        "/home/A2/B"
    );
    assert_eq!(
        app.stored_folder(c.id).await.unwrap().absolute_path,
        "/home/A2/B/C"
    );
    assert_eq!(
        app.stored_folder(sibling.id).await.unwrap().absolute_path,
        "/home/A2sibling"
    );
    assert_eq!(
        app.stored_folder(sibling_child.id).await.unwrap().absolute_path,
        "/home/A2sibling/X"
    );
    app.assert_path_invariant().await;

    let err = app.engine.resolve_path(&app.ctx, "/home/A/B").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rename_onto_existing_name_conflicts() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    app.folder(NodeRef::Home, "B").await;

    let err = app.engine.rename_folder(&app.ctx, a.id, "B").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let same = app.engine.rename_folder(&app.ctx, a.id, "A").await.unwrap();
    assert_eq!(same.absolute_path, "/home/A");
}

#[tokio::test]
async fn test_move_rebases_subtree() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    let c = app.folder(NodeRef::Folder(b.id), "C").await;
    let dest = app.folder(NodeRef::Home, "Dest").await;

    let moved = app
        .engine
        .move_folder(&app.ctx, b.id, NodeRef::Folder(dest.id))
        .await
        .unwrap();
    assert_eq!(moved.absolute_path, "/home/Dest/B");
    assert_eq!(moved.parent_id, Some(dest.id));
    assert_eq!(
        app.stored_folder(c.id).await.unwrap().absolute_path,
        "/home/Dest/B/C"
    );
    app.assert_path_invariant().await;

    let moved = app.engine.move_folder(&app.ctx, b.id, NodeRef::Home).await.unwrap();
    assert_eq!(moved.absolute_path, "/home/B");
    assert_eq!(moved.parent_id, None);
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_move_into_own_subtree_is_rejected() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    let before = app.all_paths().await;

    let err = app
        .engine
        .move_folder(&app.ctx, a.id, NodeRef::Folder(b.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CycleRejected);

    let err = app
        .engine
        .move_folder(&app.ctx, a.id, NodeRef::Folder(a.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CycleRejected);

    assert_eq!(app.all_paths().await, before);
}

#[tokio::test]
async fn test_move_into_name_extending_sibling_is_allowed() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let ab = app.folder(NodeRef::Home, "AB").await;

    let moved = app
        .engine
        .move_folder(&app.ctx, a.id, NodeRef::Folder(ab.id))
        .await
        .unwrap();
    assert_eq!(moved.absolute_path, "/home/AB/A");
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_move_conflicts_at_destination() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let dest = app.folder(NodeRef::Home, "Dest").await;
    app.folder(NodeRef::Folder(dest.id), "A").await;

    let err = app
        .engine
        .move_folder(&app.ctx, a.id, NodeRef::Folder(dest.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(app.stored_folder(a.id).await.unwrap().absolute_path, "/home/A");
}

#[tokio::test]
async fn test_move_into_trash_is_invalid() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let err = app
        .engine
        .move_folder(&app.ctx, a.id, NodeRef::Trash)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
}

#[tokio::test]
async fn test_other_owner_cannot_see_folders() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let (other, other_drive) = app.other_owner().await;

    let err = app.engine.rename_folder(&other, a.id, "B").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app.engine.resolve_path(&other, "/home/A").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .engine
        .create_folder(&other, app.drive.id, NodeRef::Home, "Z")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let own = app
        .engine
        .create_folder(&other, other_drive.id, NodeRef::Home, "A")
        .await
        .unwrap();
    assert_eq!(own.absolute_path, "/home/A");
}

#[tokio::test]
async fn test_list_children_sorted_by_name() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    app.folder(NodeRef::Folder(a.id), "zeta").await;
    app.folder(NodeRef::Folder(a.id), "alpha").await;
    app.file(NodeRef::Folder(a.id), "b.txt", 3).await;
    app.file(NodeRef::Folder(a.id), "a.txt", 3).await;

    let listing = app
        .engine
        .list_children(&app.ctx, NodeRef::Folder(a.id))
        .await
        .unwrap();
    assert_eq!(listing.absolute_path, "/home/A");
    let folders: Vec<&str> = listing.folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(folders, vec!["alpha", "zeta"]);
    let files: Vec<&str> = listing.files.iter().map(|f| f.absolute_path.as_str()).collect();
    assert_eq!(files, vec!["/home/A/a.txt", "/home/A/b.txt"]);
}

#[tokio::test]
async fn test_parent_context_for_roots_and_folders() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;

    let home = app.engine.resolve_parent_context(&app.ctx, NodeRef::Home).await.unwrap();
    assert_eq!(home.absolute_path, "/home");
    assert!(home.folder.is_none());

    let trash = app.engine.resolve_parent_context(&app.ctx, NodeRef::Trash).await.unwrap();
    assert_eq!(trash.absolute_path, "/trash");

    let ctx_b = app
        .engine
        .resolve_parent_context(&app.ctx, NodeRef::Folder(b.id))
        .await
        .unwrap();
    assert_eq!(ctx_b.absolute_path, "/home/A/B");
    assert_eq!(ctx_b.folder.map(|f| f.id), Some(b.id));

    let path = app
        .engine
        .resolve_folder_path(&app.ctx, NodeRef::Folder(a.id))
        .await
        .unwrap();
    assert_eq!(path, "/home/A");
}

#[tokio::test]
async fn test_parent_context_is_owner_scoped() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let (other, _) = app.other_owner().await;

    let err = app
        .engine
        .resolve_folder_path(&other, NodeRef::Folder(a.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_get_drive_and_duplicate_provision() {
    let app = TestApp::new().await;
    let drive = app.engine.get_drive(&app.ctx).await.unwrap();
    assert_eq!(drive.id, app.drive.id);
    assert_eq!(drive.space_used, 0);

    let err = app.engine.provision_drive(app.ctx.owner_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let stranger = homedrive_service::RequestContext::new(uuid::Uuid::new_v4());
    let err = app.engine.get_drive(&stranger).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_rename_leaves_subtree_unchanged() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    app.folder(NodeRef::Folder(b.id), "C").await;
    let before = app.all_paths().await;

    app.store.fail_commit_after(0);
    let err = app.engine.rename_folder(&app.ctx, a.id, "A2").await.unwrap_err();

    assert!(err.is_storage_failure(), "{err}");
    assert_eq!(app.all_paths().await, before);
    assert_eq!(app.stored_folder(a.id).await.unwrap().name, "A");
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_failed_move_leaves_subtree_unchanged() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    app.folder(NodeRef::Folder(b.id), "C").await;
    let d = app.folder(NodeRef::Home, "D").await;
    let before = app.all_paths().await;

    app.store.fail_commit_after(0);
    let err = app
        .engine
        .move_folder(&app.ctx, b.id, NodeRef::Folder(d.id))
        .await
        .unwrap_err();

    assert!(err.is_storage_failure(), "{err}");
    assert_eq!(app.all_paths().await, before);
    assert_eq!(app.stored_folder(b.id).await.unwrap().parent_id, Some(a.id));
    app.assert_path_invariant().await;

    // The fault is spent; the same move now goes through.
    let moved = app
        .engine
        .move_folder(&app.ctx, b.id, NodeRef::Folder(d.id))
        .await
        .unwrap();
    assert_eq!(moved.absolute_path, "/home/D/B");
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_create_racing_ancestor_rename_keeps_paths() {
    use homedrive_database::DriveStore;

    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;

    let held = app.store.begin().await.unwrap();
    let (renamed, created, ()) = tokio::join!(
        app.engine.rename_folder(&app.ctx, a.id, "A2"),
        app.engine.create_folder(&app.ctx, app.drive.id, NodeRef::Folder(b.id), "C"),
        async {
            tokio::task::yield_now().await;
            drop(held);
        },
    );

    assert_eq!(renamed.unwrap().absolute_path, "/home/A2");
    assert_eq!(created.unwrap().parent_id, Some(b.id));
    assert_eq!(
        app.all_paths().await,
        vec!["/home/A2", "/home/A2/B", "/home/A2/B/C"]
    );
    app.assert_path_invariant().await;
}
