use async_trait::async_trait;

/// Blocking modal questions asked before a mutation. Returning `None` or
/// `false` cancels the operation.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn prompt_name(&self, title: &str, initial: &str) -> Option<String>;

    async fn confirm(&self, message: &str) -> bool;
}
