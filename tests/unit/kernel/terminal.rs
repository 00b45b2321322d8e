use super::*;
use crate::models::FreshEntry;

fn entry(name: &str, kind: NodeKind) -> FreshEntry<()> {
    FreshEntry {
        name: name.into(),
        kind,
        handle: (),
    }
}

/// proj/{src/{index.ts, empty/}, docs/ (not loaded), README.md}
fn sample_tree() -> WorkspaceTree<()> {
    let mut tree = WorkspaceTree::new("proj", ());
    let root = tree.root();
    tree.replace_children(
        root,
        vec![
            entry("src", NodeKind::Dir),
            entry("docs", NodeKind::Dir),
            entry("README.md", NodeKind::File),
        ],
    )
    .unwrap();
    let src = tree.find_by_path("proj/src").unwrap();
    tree.replace_children(
        src,
        vec![entry("index.ts", NodeKind::File), entry("empty", NodeKind::Dir)],
    )
    .unwrap();
    let empty = tree.find_by_path("proj/src/empty").unwrap();
    tree.replace_children(empty, Vec::new()).unwrap();
    tree
}

fn run(session: &mut TerminalSession, tree: &WorkspaceTree<()>, line: &str) -> Vec<String> {
    session.execute(line, tree).lines
}

#[test]
fn test_pwd_and_prompt() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");
    assert_eq!(run(&mut session, &tree, "pwd"), vec!["/proj"]);
    assert_eq!(session.prompt(), "/proj $ ");
}

#[test]
fn test_ls_current_directory() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");
    assert_eq!(
        run(&mut session, &tree, "ls"),
        vec!["docs/", "src/", "README.md"]
    );
    assert_eq!(run(&mut session, &tree, "ls src"), vec!["empty/", "index.ts"]);
    assert_eq!(run(&mut session, &tree, "ls README.md"), vec!["README.md"]);
}

#[test]
fn test_ls_messages() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");
    assert_eq!(run(&mut session, &tree, "ls src/empty"), vec!["(empty directory)"]);
    assert_eq!(run(&mut session, &tree, "ls docs"), vec!["(directory not loaded)"]);
    assert_eq!(
        run(&mut session, &tree, "ls nope"),
        vec!["ls: no such file or directory: nope"]
    );
}

#[test]
fn test_cd_moves_and_clamps_at_root() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");

    assert!(run(&mut session, &tree, "cd src").is_empty());
    assert_eq!(session.current_path(), "proj/src");
    assert_eq!(run(&mut session, &tree, "ls"), vec!["empty/", "index.ts"]);

    run(&mut session, &tree, "cd ../../..");
    assert_eq!(session.current_path(), "proj");

    run(&mut session, &tree, "cd src/empty");
    run(&mut session, &tree, "cd");
    assert_eq!(session.current_path(), "proj");
}

#[test]
fn test_cd_absolute_paths() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");
    run(&mut session, &tree, "cd src/empty");

    run(&mut session, &tree, "cd /docs");
    assert_eq!(session.current_path(), "proj/docs");
    run(&mut session, &tree, "cd /proj/src");
    assert_eq!(session.current_path(), "proj/src");
    run(&mut session, &tree, "cd /");
    assert_eq!(session.current_path(), "proj");
}

#[test]
fn test_cd_errors_keep_current_path() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");
    run(&mut session, &tree, "cd src");

    assert_eq!(
        run(&mut session, &tree, "cd missing"),
        vec!["cd: no such directory: missing"]
    );
    assert_eq!(
        run(&mut session, &tree, "cd index.ts"),
        vec!["cd: not a directory: index.ts"]
    );
    assert_eq!(session.current_path(), "proj/src");
}

#[test]
fn test_echo_help_clear_and_unknown() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");

    assert_eq!(run(&mut session, &tree, "echo  hello   world"), vec!["hello world"]);
    assert_eq!(run(&mut session, &tree, "help")[0], "Available commands:");

    let cleared = session.execute("clear", &tree);
    assert!(cleared.clear);
    assert!(cleared.lines.is_empty());

    assert_eq!(
        run(&mut session, &tree, "rm -rf /"),
        vec!["command not found: rm"]
    );
    assert_eq!(session.execute("   ", &tree), TerminalOutput::default());
}

#[test]
fn test_resolve_path() {
    let tree = sample_tree();
    let mut session = TerminalSession::new("proj");
    run(&mut session, &tree, "cd src");

    assert_eq!(session.resolve_path("index.ts", "proj"), "proj/src/index.ts");
    assert_eq!(session.resolve_path("./empty/", "proj"), "proj/src/empty");
    assert_eq!(session.resolve_path("../README.md", "proj"), "proj/README.md");
    assert_eq!(session.resolve_path("/projects", "proj"), "proj/projects");
}
