//! Soft delete, trash listing, and recovery.

mod helpers;

use helpers::TestApp;
use homedrive_core::error::ErrorKind;
use homedrive_entity::folder::RemovalState;
use homedrive_entity::node::NodeRef;

#[tokio::test]
async fn test_trash_round_trip_keeps_independent_trash() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    let c = app.folder(NodeRef::Folder(a.id), "C").await;
    let d = app.folder(NodeRef::Folder(c.id), "D").await;

    app.engine.soft_delete_folder(&app.ctx, c.id).await.unwrap();
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();

    assert_eq!(app.removal_state(a.id).await, RemovalState::Trashed);
    assert_eq!(app.removal_state(b.id).await, RemovalState::TrashedWithAncestor);
    assert_eq!(app.removal_state(c.id).await, RemovalState::Trashed);
    assert_eq!(app.removal_state(d.id).await, RemovalState::TrashedWithAncestor);

    app.engine.recover_folder(&app.ctx, a.id).await.unwrap();
    assert_eq!(app.removal_state(a.id).await, RemovalState::Active);
    assert_eq!(app.removal_state(b.id).await, RemovalState::Active);
    assert_eq!(app.removal_state(c.id).await, RemovalState::Trashed);
    assert_eq!(app.removal_state(d.id).await, RemovalState::TrashedWithAncestor);

    app.engine.recover_folder(&app.ctx, c.id).await.unwrap();
    assert_eq!(app.removal_state(c.id).await, RemovalState::Active);
    assert_eq!(app.removal_state(d.id).await, RemovalState::Active);
    app.assert_path_invariant().await;
}

#[tokio::test]
async fn test_trashed_folders_are_not_addressable() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();

    for path in ["/home/A", "/home/A/B"] {
        let err = app.engine.resolve_path(&app.ctx, path).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound, "{path}");
    }

    let err = app
        .engine
        .list_children(&app.ctx, NodeRef::Folder(b.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let home = app.engine.list_children(&app.ctx, NodeRef::Home).await.unwrap();
    assert!(home.is_empty());
}

#[tokio::test]
async fn test_list_trash_shows_top_level_items() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    app.folder(NodeRef::Folder(a.id), "B").await;
    let z = app.folder(NodeRef::Home, "Z").await;
    let docs = app.folder(NodeRef::Home, "docs").await;
    let note = app.file(NodeRef::Folder(docs.id), "note.txt", 4).await;
    app.file(NodeRef::Folder(a.id), "inside.txt", 4).await;

    app.engine.soft_delete_folder(&app.ctx, z.id).await.unwrap();
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();
    app.engine.soft_delete_file(&app.ctx, note.id).await.unwrap();

    let trash = app.engine.list_trash(&app.ctx).await.unwrap();
    assert_eq!(trash.node, NodeRef::Trash);
    assert_eq!(trash.absolute_path, "/trash");
    let folders: Vec<&str> = trash.folders.iter().map(|f| f.absolute_path.as_str()).collect();
    assert_eq!(folders, vec!["/home/A", "/home/Z"]);
    let files: Vec<&str> = trash.files.iter().map(|f| f.absolute_path.as_str()).collect();
    assert_eq!(files, vec!["/home/docs/note.txt"]);

    let via_children = app.engine.list_children(&app.ctx, NodeRef::Trash).await.unwrap();
    assert_eq!(via_children.len(), trash.len());
}

#[tokio::test]
async fn test_recover_under_trashed_ancestor_conflicts() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let b = app.folder(NodeRef::Folder(a.id), "B").await;
    let c = app.folder(NodeRef::Folder(b.id), "C").await;

    app.engine.soft_delete_folder(&app.ctx, b.id).await.unwrap();
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();

    let err = app.engine.recover_folder(&app.ctx, b.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    let err = app.engine.recover_folder(&app.ctx, c.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_soft_delete_is_idempotent() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;

    let first = app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();
    let second = app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();
    assert_eq!(first.removal_state(), RemovalState::Trashed);
    assert_eq!(second.removal_state(), RemovalState::Trashed);

    let recovered = app.engine.recover_folder(&app.ctx, a.id).await.unwrap();
    assert_eq!(recovered.removal_state(), RemovalState::Active);
    let again = app.engine.recover_folder(&app.ctx, a.id).await.unwrap();
    assert_eq!(again.removal_state(), RemovalState::Active);
}

#[tokio::test]
async fn test_trashed_folder_cannot_be_renamed_or_moved() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();

    let err = app.engine.rename_folder(&app.ctx, a.id, "B").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
    let err = app
        .engine
        .move_folder(&app.ctx, a.id, NodeRef::Home)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
}

#[tokio::test]
async fn test_files_follow_their_folder_into_trash() {
    let app = TestApp::new().await;
    let a = app.folder(NodeRef::Home, "A").await;
    let file = app.file(NodeRef::Folder(a.id), "f.txt", 4).await;
    app.engine.soft_delete_folder(&app.ctx, a.id).await.unwrap();

    let err = app.engine.open_file(&app.ctx, file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    app.engine.recover_folder(&app.ctx, a.id).await.unwrap();
    let download = app.engine.open_file(&app.ctx, file.id).await.unwrap();
    assert_eq!(download.data.len(), 4);
}
