use super::*;
use crate::kernel::services::ports::RenamePolicy;
use tempfile::TempDir;

#[test]
fn test_write_default_settings_creates_file_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".zspace").join("settings.json");

    write_default_settings(&path).unwrap();
    assert_eq!(load_settings_from(&path), Some(WorkspaceConfig::default()));

    std::fs::write(&path, r#"{"rename_policy":"strict"}"#).unwrap();
    write_default_settings(&path).unwrap();
    let loaded = load_settings_from(&path).unwrap();
    assert_eq!(loaded.rename_policy, RenamePolicy::Strict);
    assert!(loaded.confirm_patch_commit);
}

#[test]
fn test_load_settings_from_invalid_or_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    assert_eq!(load_settings_from(&path), None);

    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(load_settings_from(&path), None);
}

#[test]
fn test_settings_path_layout() {
    if let Some(path) = get_settings_path() {
        assert!(path.ends_with(".zspace/settings.json"));
    }
}
