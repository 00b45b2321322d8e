//! Read-only shell over the workspace tree, used for navigation feedback.

use crate::models::{path, LoadState, NodeKind, WorkspaceTree};

const HELP_LINES: &[&str] = &[
    "Available commands:",
    "  help          show this help",
    "  clear         clear the screen",
    "  pwd           print the current directory",
    "  echo <text>   print text",
    "  ls [path]     list a directory",
    "  cd <path>     change directory",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalOutput {
    pub lines: Vec<String>,
    /// The screen should be cleared before anything else is shown.
    pub clear: bool,
}

impl TerminalOutput {
    fn lines(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
            clear: false,
        }
    }

    fn line(line: impl Into<String>) -> Self {
        Self::lines([line.into()])
    }
}

#[derive(Debug, Clone)]
pub struct TerminalSession {
    current_path: String,
}

impl TerminalSession {
    pub fn new(root_name: &str) -> Self {
        Self {
            current_path: root_name.to_string(),
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn prompt(&self) -> String {
        format!("/{} $ ", self.current_path)
    }

    pub fn execute<H>(&mut self, line: &str, tree: &WorkspaceTree<H>) -> TerminalOutput {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return TerminalOutput::default();
        };
        let args: Vec<&str> = parts.collect();

        match command {
            "help" => TerminalOutput::lines(HELP_LINES.iter().map(|l| l.to_string())),
            "clear" => TerminalOutput {
                lines: Vec::new(),
                clear: true,
            },
            "pwd" => TerminalOutput::line(format!("/{}", self.current_path)),
            "echo" => TerminalOutput::line(args.join(" ")),
            "ls" => self.list(args.first().copied(), tree),
            "cd" => self.change_dir(args.first().copied(), tree),
            other => TerminalOutput::line(format!("command not found: {}", other)),
        }
    }

    fn list<H>(&self, arg: Option<&str>, tree: &WorkspaceTree<H>) -> TerminalOutput {
        let target = match arg {
            Some(arg) => self.resolve_path(arg, tree.root_name()),
            None => self.current_path.clone(),
        };
        let Some(id) = tree.find_by_path(&target) else {
            return TerminalOutput::line(format!("ls: no such file or directory: {}", arg.unwrap_or(".")));
        };
        let Some(node) = tree.get(id) else {
            return TerminalOutput::line(format!("ls: no such file or directory: {}", target));
        };
        if node.kind() == NodeKind::File {
            return TerminalOutput::line(node.name().to_string());
        }
        if node.load_state() == LoadState::NotLoaded {
            return TerminalOutput::line("(directory not loaded)");
        }

        let children = tree.children(id);
        if children.is_empty() {
            return TerminalOutput::line("(empty directory)");
        }
        TerminalOutput::lines(children.into_iter().filter_map(|child| {
            tree.get(child).map(|node| match node.kind() {
                NodeKind::Dir => format!("{}/", node.name()),
                NodeKind::File => node.name().to_string(),
            })
        }))
    }

    fn change_dir<H>(&mut self, arg: Option<&str>, tree: &WorkspaceTree<H>) -> TerminalOutput {
        let Some(arg) = arg else {
            self.current_path = tree.root_name().to_string();
            return TerminalOutput::default();
        };
        let target = self.resolve_path(arg, tree.root_name());
        match tree.node_by_path(&target) {
            Some(node) if node.is_dir() => {
                self.current_path = target;
                TerminalOutput::default()
            }
            Some(_) => TerminalOutput::line(format!("cd: not a directory: {}", arg)),
            None => TerminalOutput::line(format!("cd: no such directory: {}", arg)),
        }
    }

    /// Applies `arg` to the current path. `/` restarts at the root (so both
    /// `/src` and `/proj/src` work) and `..` never climbs above it.
    pub fn resolve_path(&self, arg: &str, root_name: &str) -> String {
        let (mut segments, rest): (Vec<&str>, &str) = match arg.strip_prefix('/') {
            Some(rest) => {
                let rest = rest.trim_start_matches('/');
                let rest = match rest.strip_prefix(root_name) {
                    Some("") => "",
                    Some(tail) if tail.starts_with('/') => tail,
                    _ => rest,
                };
                (Vec::new(), rest)
            }
            None => (
                path::relative_segments(&self.current_path, root_name).unwrap_or_default(),
                arg,
            ),
        };
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
        segments
            .iter()
            .fold(root_name.to_string(), |acc, segment| path::join(&acc, segment))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/terminal.rs"]
mod tests;
