use super::*;
use crate::kernel::services::ports::write_text;

#[tokio::test]
async fn test_get_and_create_children() {
    let storage = MemoryStorage::new("proj");
    let root = storage.root_handle();

    assert_eq!(
        root.get_file_handle("a.txt", false).await.err(),
        Some(StorageError::NotFound("a.txt".to_string()))
    );
    let file = root.get_file_handle("a.txt", true).await.unwrap();
    assert_eq!(file.kind(), HandleKind::File);
    assert_eq!(file.read_text().await.unwrap(), "");

    assert_eq!(
        root.get_directory_handle("a.txt", false).await.err(),
        Some(StorageError::TypeMismatch("a.txt".to_string()))
    );
    assert!(root.get_directory_handle("dir", true).await.is_ok());
    assert_eq!(storage.list(""), vec!["a.txt", "dir"]);
}

#[tokio::test]
async fn test_writes_land_on_close() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("a.txt", "old");
    let file = storage.handle("a.txt").unwrap();

    let mut writable = file.create_writable().await.unwrap();
    writable.write("new ").await.unwrap();
    writable.write("text").await.unwrap();
    assert_eq!(storage.read("a.txt").as_deref(), Some("old"));

    writable.close().await.unwrap();
    assert_eq!(storage.read("a.txt").as_deref(), Some("new text"));
    assert!(writable.write("late").await.is_err());

    write_text(&file, "again").await.unwrap();
    assert_eq!(storage.read("a.txt").as_deref(), Some("again"));
}

#[tokio::test]
async fn test_remove_entry() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("dir/inner.txt", "x");
    let root = storage.root_handle();

    assert!(matches!(
        root.remove_entry("dir", false).await,
        Err(StorageError::Io(_))
    ));
    root.remove_entry("dir", true).await.unwrap();
    assert!(!storage.exists("dir"));
    assert_eq!(
        root.remove_entry("dir", true).await,
        Err(StorageError::NotFound("dir".to_string()))
    );
}

#[tokio::test]
async fn test_entries_lists_children() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("b.txt", "");
    storage.insert_dir("a");

    let mut entries: Vec<(String, HandleKind)> = storage
        .root_handle()
        .entries()
        .await
        .unwrap()
        .iter()
        .map(|h| (h.name().to_string(), h.kind()))
        .collect();
    entries.sort();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), HandleKind::Directory),
            ("b.txt".to_string(), HandleKind::File),
        ]
    );
}

#[tokio::test]
async fn test_handles_follow_moves() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("src/index.ts", "x");
    let src = storage.handle("src").unwrap();
    let root = storage.root_handle();

    src.move_to(&root, "lib").await.unwrap();
    assert_eq!(storage.list(""), vec!["lib"]);

    let index = src.get_file_handle("index.ts", false).await.unwrap();
    assert_eq!(index.read_text().await.unwrap(), "x");

    let lib = storage.handle("lib").unwrap();
    assert!(lib.move_to(&lib, "nested").await.is_err());
}

#[tokio::test]
async fn test_move_switch_and_conflicts() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("a.txt", "a");
    storage.insert_file("b.txt", "b");
    let a = storage.handle("a.txt").unwrap();
    let root = storage.root_handle();

    assert!(matches!(a.move_to(&root, "b.txt").await, Err(StorageError::Io(_))));

    storage.set_supports_move(false);
    assert!(!root.supports_move());
    assert_eq!(
        a.move_to(&root, "c.txt").await,
        Err(StorageError::Unsupported("move"))
    );
}

#[tokio::test]
async fn test_permission_switches() {
    let storage = MemoryStorage::new("proj");
    let root = storage.root_handle();

    storage.set_permission(PermissionState::Prompt, false);
    assert_eq!(
        root.query_permission(PermissionMode::ReadWrite).await,
        PermissionState::Prompt
    );
    assert_eq!(
        root.query_permission(PermissionMode::Read).await,
        PermissionState::Granted
    );
    assert_eq!(
        root.request_permission(PermissionMode::ReadWrite).await,
        PermissionState::Prompt
    );
    assert!(matches!(
        root.get_file_handle("x", true).await,
        Err(StorageError::PermissionDenied(_))
    ));

    storage.set_permission(PermissionState::Prompt, true);
    assert_eq!(
        root.request_permission(PermissionMode::ReadWrite).await,
        PermissionState::Granted
    );
    assert!(root.get_file_handle("x", true).await.is_ok());
}

#[tokio::test]
async fn test_injected_faults_fire_once() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("a.txt", "a");
    let root = storage.root_handle();

    storage.fail_next(MemoryOp::GetFile, Some("a.txt"), StorageError::Io("boom".into()));
    assert!(root.get_file_handle("b.txt", true).await.is_ok());
    assert_eq!(
        root.get_file_handle("a.txt", false).await.err(),
        Some(StorageError::Io("boom".into()))
    );
    assert!(root.get_file_handle("a.txt", false).await.is_ok());
}

#[test]
fn test_external_helpers() {
    let storage = MemoryStorage::new("proj");
    storage.insert_file("a/b/c.txt", "c");
    assert!(storage.is_dir("a/b"));
    assert!(!storage.is_dir("a/b/c.txt"));
    assert!(storage.rename_external("a/b", "d"));
    assert_eq!(storage.read("a/d/c.txt").as_deref(), Some("c"));
    assert!(!storage.rename_external("missing", "x"));
    assert!(storage.handle("a/missing").is_none());
}

#[test]
fn test_handle_kinds_order() {
    let mut kinds = vec![HandleKind::Directory, HandleKind::File];
    kinds.sort();
    assert_eq!(kinds, vec![HandleKind::File, HandleKind::Directory]);
}
