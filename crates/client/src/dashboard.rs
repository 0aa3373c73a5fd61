//! The poll dashboard flow.

use crate::{
    error::ClientResult,
    form::PollForm,
    rpc::RpcClient,
    types::Poll,
};

/// Holds the caller's poll list and keeps it fresh after mutations.
#[derive(Debug, Clone)]
pub struct PollDashboard {
    client: RpcClient,
    polls: Vec<Poll>,
}

impl PollDashboard {
    #[must_use]
    pub const fn new(client: RpcClient) -> Self {
        Self {
            client,
            polls: Vec::new(),
        }
    }

    /// Polls as of the last fetch.
    #[must_use]
    pub fn polls(&self) -> &[Poll] {
        &self.polls
    }

    /// Re-fetch `poll.getAll`.
    pub async fn refresh(&mut self) -> ClientResult<&[Poll]> {
        self.polls = self.client.get_all_polls().await?;
        Ok(&self.polls)
    }

    /// Validate and submit the form. Returns the created poll, whose id
    /// is where the caller navigates next.
    pub async fn create(&mut self, form: &PollForm) -> ClientResult<Poll> {
        self.client.add_poll(form).await
    }

    /// Delete a poll, then re-fetch the list. Returns the deleted count.
    pub async fn delete(&mut self, id: &str) -> ClientResult<u64> {
        let count = self.client.delete_poll(id).await?;
        self.refresh().await?;
        Ok(count)
    }
}
