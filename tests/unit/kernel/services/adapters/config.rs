use super::*;

#[test]
fn test_config_service_defaults() {
    let service = ConfigService::new();
    assert_eq!(service.config(), &WorkspaceConfig::default());
    assert_eq!(service.config().rename_policy, RenamePolicy::Degrade);
    assert!(service.config().confirm_patch_commit);
}

#[test]
fn test_config_service_updates() {
    let mut service = ConfigService::default();
    service.set_rename_policy(RenamePolicy::Strict);
    service.set_confirm_patch_commit(false);

    assert_eq!(service.config().rename_policy, RenamePolicy::Strict);
    assert!(!service.config().confirm_patch_commit);
}

#[test]
fn test_ignore_name_is_deduplicated() {
    let mut service = ConfigService::with_config(WorkspaceConfig {
        ignored_names: Vec::new(),
        ..WorkspaceConfig::default()
    });
    service.ignore_name("target");
    service.ignore_name("target");

    assert!(service.config().is_ignored("target"));
    assert!(!service.config().is_ignored("src"));
    assert_eq!(service.config().ignored_names, vec!["target"]);

    service.config_mut().ignored_names.clear();
    assert!(!service.config().is_ignored("target"));
}
