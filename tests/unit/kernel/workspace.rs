use super::*;
use crate::kernel::services::adapters::{MemoryHandle, MemoryStorage};

fn sample_storage() -> MemoryStorage {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("src/index.ts", "export {}");
    storage.insert_file("README.md", "# proj");
    storage
}

async fn open(storage: &MemoryStorage) -> Workspace<MemoryHandle> {
    Workspace::open(storage.root_handle(), WorkspaceConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_open_loads_root_children() {
    let storage = sample_storage();
    let ws = open(&storage).await;

    assert_eq!(ws.root_name(), "proj");
    let root = ws.tree().get(ws.tree().root()).unwrap();
    assert_eq!(root.load_state(), LoadState::Loaded);
    let src = ws.tree().node_by_path("proj/src").unwrap();
    assert_eq!(src.load_state(), LoadState::NotLoaded);
    assert!(ws.tree().find_by_path("proj/src/index.ts").is_none());
    assert!(ws.selection().is_none());
}

#[tokio::test]
async fn test_open_requires_directory() {
    let storage = sample_storage();
    let file = storage.handle("README.md").unwrap();
    assert!(matches!(
        Workspace::open(file, WorkspaceConfig::default()).await,
        Err(WorkspaceError::KindMismatch(_))
    ));
}

#[tokio::test]
async fn test_open_requests_permission() {
    let storage = sample_storage();
    storage.set_permission(PermissionState::Prompt, true);
    assert!(Workspace::open(storage.root_handle(), WorkspaceConfig::default())
        .await
        .is_ok());

    storage.set_permission(PermissionState::Prompt, false);
    assert!(matches!(
        Workspace::open(storage.root_handle(), WorkspaceConfig::default()).await,
        Err(WorkspaceError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_load_directory_once() {
    let storage = sample_storage();
    let mut ws = open(&storage).await;

    ws.load_directory("proj/src").await.unwrap();
    assert!(ws.tree().find_by_path("proj/src/index.ts").is_some());

    // already loaded: storage is not consulted again
    storage.insert_file("src/late.ts", "");
    ws.load_directory("proj/src").await.unwrap();
    assert!(ws.tree().find_by_path("proj/src/late.ts").is_none());

    assert!(matches!(
        ws.load_directory("proj/README.md").await,
        Err(WorkspaceError::KindMismatch(_))
    ));
}

#[tokio::test]
async fn test_read_file_caches_content() {
    let storage = sample_storage();
    let mut ws = open(&storage).await;

    assert_eq!(ws.read_file("proj/README.md").await.unwrap(), "# proj");
    storage.insert_file("README.md", "changed");
    assert_eq!(ws.read_file("proj/README.md").await.unwrap(), "# proj");

    // not in the tree yet: read through storage, nothing cached
    assert_eq!(ws.read_file("proj/src/index.ts").await.unwrap(), "export {}");
    assert!(matches!(
        ws.read_file("proj/src").await,
        Err(WorkspaceError::KindMismatch(_))
    ));
}

#[tokio::test]
async fn test_select_edit_save() {
    let storage = sample_storage();
    let mut ws = open(&storage).await;

    ws.select("proj/README.md").await.unwrap();
    let selection = ws.selection_mut().unwrap();
    assert_eq!(selection.text(), "# proj");
    assert!(selection.insert(6, "\nmore"));
    assert!(selection.is_dirty());

    ws.save().await.unwrap();
    assert_eq!(storage.read("README.md").as_deref(), Some("# proj\nmore"));
    assert!(!ws.selection().unwrap().is_dirty());
    assert_eq!(
        ws.tree().node_by_path("proj/README.md").unwrap().content(),
        Some("# proj\nmore")
    );
}

#[tokio::test]
async fn test_select_unknown_and_save_without_selection() {
    let storage = sample_storage();
    let mut ws = open(&storage).await;

    assert!(matches!(
        ws.select("proj/nope.txt").await,
        Err(WorkspaceError::NotFound(_))
    ));
    assert!(matches!(ws.save().await, Err(WorkspaceError::NotFound(_))));

    ws.select("proj/README.md").await.unwrap();
    ws.clear_selection();
    assert!(ws.selection().is_none());
}

#[tokio::test]
async fn test_save_without_permission() {
    let storage = sample_storage();
    let mut ws = open(&storage).await;
    ws.select("proj/README.md").await.unwrap();
    if let Some(selection) = ws.selection_mut() {
        selection.replace_text("new");
    }

    storage.set_permission(PermissionState::Denied, false);
    assert!(matches!(
        ws.save().await,
        Err(WorkspaceError::PermissionDenied(_))
    ));
    assert_eq!(storage.read("README.md").as_deref(), Some("# proj"));
    assert!(ws.selection().unwrap().is_dirty());
}

#[tokio::test]
async fn test_independent_workspaces() {
    let a = sample_storage();
    let b = MemoryStorage::new("other");
    b.insert_file("x.txt", "x");

    let mut ws_a = open(&a).await;
    let ws_b = open(&b).await;
    ws_a.create(NodeKind::File, "y.txt", "proj").await.unwrap();

    assert!(ws_b.tree().find_by_path("other/y.txt").is_none());
    assert!(ws_b.tree().find_by_path("other/x.txt").is_some());
}

#[tokio::test]
async fn test_close_returns_root_handle() {
    let storage = sample_storage();
    let ws = open(&storage).await;
    let root = ws.close().unwrap();
    assert_eq!(root.name(), "proj");
    assert_eq!(root.kind(), HandleKind::Directory);
}
