//! Prompter implementations: interactive stdin and a scripted one.

use crate::kernel::services::ports::Prompter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

pub struct StdioPrompter {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl StdioPrompter {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    pub async fn read_line(&self) -> Option<String> {
        self.lines.lock().await.next_line().await.ok().flatten()
    }

    async fn ask(&self, question: &str) -> Option<String> {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(question.as_bytes()).await;
        let _ = stdout.flush().await;
        self.read_line().await
    }
}

impl Default for StdioPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for StdioPrompter {
    async fn prompt_name(&self, title: &str, initial: &str) -> Option<String> {
        let question = if initial.is_empty() {
            format!("{}: ", title)
        } else {
            format!("{} [{}]: ", title, initial)
        };
        let answer = self.ask(&question).await?;
        let answer = answer.trim();
        match (answer.is_empty(), initial.is_empty()) {
            (false, _) => Some(answer.to_string()),
            (true, false) => Some(initial.to_string()),
            (true, true) => None,
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        self.ask(&format!("{} [y/N] ", message))
            .await
            .is_some_and(|answer| matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

/// Answers prompts from a queue; confirmations use a fixed answer.
pub struct ScriptedPrompter {
    names: Mutex<VecDeque<Option<String>>>,
    confirm: bool,
}

impl ScriptedPrompter {
    pub fn confirming(confirm: bool) -> Self {
        Self {
            names: Mutex::new(VecDeque::new()),
            confirm,
        }
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            names: Mutex::new(names.into_iter().map(|n| n.map(Into::into)).collect()),
            confirm: true,
        }
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn prompt_name(&self, _title: &str, _initial: &str) -> Option<String> {
        self.names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .flatten()
    }

    async fn confirm(&self, _message: &str) -> bool {
        self.confirm
    }
}
