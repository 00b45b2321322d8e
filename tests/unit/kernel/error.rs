use super::*;

#[test]
fn test_validate_name() {
    assert!(validate_name("index.ts").is_ok());
    assert!(validate_name(".env").is_ok());
    assert!(validate_name("with space").is_ok());
    for bad in ["", "   ", "a/b", "a\\b", ".", ".."] {
        assert_eq!(
            validate_name(bad),
            Err(WorkspaceError::InvalidName(bad.to_string()))
        );
    }
}

#[test]
fn test_storage_error_mapping() {
    assert_eq!(
        WorkspaceError::from(StorageError::TypeMismatch("a".into())),
        WorkspaceError::KindMismatch("a".into())
    );
    assert_eq!(
        WorkspaceError::from(StorageError::PermissionDenied("a".into())),
        WorkspaceError::PermissionDenied("a".into())
    );
    assert!(matches!(
        WorkspaceError::from(StorageError::Unsupported("move")),
        WorkspaceError::StorageFailure(_)
    ));
}

#[test]
fn test_tree_error_mapping() {
    assert_eq!(
        WorkspaceError::from(TreeError::RootProtected),
        WorkspaceError::RootProtected
    );
    assert!(matches!(
        WorkspaceError::from(TreeError::NameExists),
        WorkspaceError::AlreadyExists(_)
    ));
}

#[test]
fn test_display() {
    let err = WorkspaceError::DegradedRename {
        from: "proj/a".into(),
        to: "proj/b".into(),
    };
    assert_eq!(err.to_string(), "Rename proj/a -> proj/b degraded: no atomic move");
    assert_eq!(WorkspaceError::Aborted.to_string(), "Aborted");
}
