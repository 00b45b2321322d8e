use std::path::PathBuf;
use std::process::ExitCode;

use tokio::io::AsyncWriteExt;
use zspace::kernel::services::adapters::{
    ConfigService, LocalHandle, ScriptedPrompter, StdioPrompter,
};
use zspace::kernel::services::ports::Prompter;
use zspace::kernel::{PatchAction, TerminalSession, Workspace, WorkspaceError};
use zspace::models::NodeKind;

mod logging;

const USAGE: &str = "usage: zspace <dir> [--apply <response-file>] [--yes]";

struct CliArgs {
    root: PathBuf,
    apply: Option<PathBuf>,
    yes: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut root = None;
    let mut apply = None;
    let mut yes = false;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--apply" => {
                let file = args.next().ok_or("--apply needs a file")?;
                apply = Some(PathBuf::from(file));
            }
            "--yes" | "-y" => yes = true,
            "--help" | "-h" => return Err(USAGE.to_string()),
            _ if root.is_none() => root = Some(PathBuf::from(arg)),
            other => return Err(format!("unexpected argument: {}\n{}", other, USAGE)),
        }
    }
    Ok(CliArgs {
        root: root.ok_or_else(|| USAGE.to_string())?,
        apply,
        yes,
    })
}

fn main() -> ExitCode {
    let logging = logging::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("zspace: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(args));
    drop(logging);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("zspace: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), WorkspaceError> {
    let config = ConfigService::load();
    let root = LocalHandle::open_dir(&args.root).await?;
    let mut workspace = Workspace::open(root, config.config().clone()).await?;
    let stdio = StdioPrompter::new();

    if let Some(response_file) = args.apply {
        let response = tokio::fs::read_to_string(&response_file)
            .await
            .map_err(|e| WorkspaceError::StorageFailure(e.to_string()))?;
        let auto = ScriptedPrompter::confirming(true);
        let confirmer: &dyn Prompter = if args.yes { &auto } else { &stdio };
        return apply_response(&mut workspace, &response, confirmer).await;
    }

    run_shell(&mut workspace, &stdio).await;
    Ok(())
}

async fn apply_response(
    workspace: &mut Workspace<LocalHandle>,
    response: &str,
    confirmer: &dyn Prompter,
) -> Result<(), WorkspaceError> {
    let proposal = workspace.propose_patch(response);
    if !proposal.summary().is_empty() {
        println!("{}", proposal.summary());
    }
    if proposal.is_empty() {
        println!("no file operations found");
        let _ = proposal.discard();
        return Ok(());
    }

    println!("proposed changes:");
    for op in proposal.operations() {
        println!("  {} ({} bytes)", op.file_path, op.content.len());
    }

    let commit = !workspace.config().confirm_patch_commit
        || confirmer
            .confirm(&format!("Apply {} file(s)?", proposal.operations().len()))
            .await;
    if !commit {
        let dropped = proposal.discard();
        println!("discarded {} operation(s)", dropped);
        return Ok(());
    }

    for outcome in proposal.commit(workspace).await {
        match outcome.result {
            Ok(PatchAction::Created) => println!("created     {}", outcome.path),
            Ok(PatchAction::Overwritten) => println!("overwritten {}", outcome.path),
            Err(e) => eprintln!("failed      {}: {}", outcome.path, e),
        }
    }
    Ok(())
}

async fn run_shell(workspace: &mut Workspace<LocalHandle>, stdio: &StdioPrompter) {
    let mut terminal = TerminalSession::new(workspace.root_name());
    let mut stdout = tokio::io::stdout();

    loop {
        let _ = stdout.write_all(terminal.prompt().as_bytes()).await;
        let _ = stdout.flush().await;
        let Some(line) = stdio.read_line().await else {
            break;
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        let root_name = workspace.root_name().to_string();
        let here = terminal.current_path().to_string();
        let arg_path = |i: usize| parts.get(i).map(|arg| terminal.resolve_path(arg, &root_name));

        let result = match parts.as_slice() {
            ["exit"] | ["quit"] => break,
            ["touch", name] => workspace.create(NodeKind::File, name, &here).await.map(print_path),
            ["mkdir", name] => workspace.create(NodeKind::Dir, name, &here).await.map(print_path),
            ["new-file"] => workspace
                .create_with_prompt(NodeKind::File, &here, stdio)
                .await
                .map(print_path),
            ["mv", _, new_name] => match arg_path(1) {
                Some(path) => workspace.rename(&path, new_name).await.map(print_path),
                None => Ok(()),
            },
            ["rm", _] => match arg_path(1) {
                Some(path) => workspace.delete(&path, stdio).await,
                None => Ok(()),
            },
            ["cat", _] | ["open", _] => match arg_path(1) {
                Some(path) => {
                    let opened = if parts[0] == "open" {
                        workspace.select(&path).await
                    } else {
                        Ok(())
                    };
                    match opened {
                        Ok(()) => workspace.read_file(&path).await.map(|text| println!("{}", text)),
                        Err(e) => Err(e),
                    }
                }
                None => Ok(()),
            },
            ["apply", _] => match tokio::fs::read_to_string(parts[1]).await {
                Ok(response) => apply_response(workspace, &response, stdio).await,
                Err(e) => Err(WorkspaceError::StorageFailure(e.to_string())),
            },
            _ => {
                if matches!(parts.first(), Some(&"cd") | Some(&"ls")) {
                    let target = arg_path(1).unwrap_or(here.clone());
                    if let Err(e) = workspace.load_directory(&target).await {
                        tracing::debug!(path = %target, error = %e, "directory not loaded");
                    }
                }
                let output = terminal.execute(&line, workspace.tree());
                if output.clear {
                    let _ = stdout.write_all(b"\x1b[2J\x1b[H").await;
                }
                for out in output.lines {
                    println!("{}", out);
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("error: {}", e);
        }
    }
}

fn print_path(path: String) {
    println!("{}", path);
}
