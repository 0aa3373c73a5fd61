//! HTTP transport for procedure calls.

use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    form::PollForm,
    types::{Choice, DeleteCount, Example, Greeting, Poll, SessionInfo},
};

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Client for the `/rpc` and `/auth` endpoints.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl RpcClient {
    /// `base_url` is the API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        })
    }

    /// Attach a session token, sent as a bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Call a query over `GET`.
    pub async fn query<I, O>(&self, path: &str, input: &I) -> ClientResult<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let mut url = self.base_url.join(&format!("rpc/{path}"))?;
        let input = serde_json::to_string(input)?;
        if input != "null" {
            url.query_pairs_mut().append_pair("input", &input);
        }

        tracing::debug!(procedure = %path, "query");
        let response = self.authorize(self.http.get(url)).send().await?;
        decode::<Envelope<O>>(response).await.map(|e| e.data)
    }

    /// Call any procedure over `POST`.
    pub async fn mutate<I, O>(&self, path: &str, input: &I) -> ClientResult<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = self.base_url.join(&format!("rpc/{path}"))?;

        tracing::debug!(procedure = %path, "mutate");
        let response = self
            .authorize(self.http.post(url))
            .json(input)
            .send()
            .await?;
        decode::<Envelope<O>>(response).await.map(|e| e.data)
    }

    /// The caller's own polls with their choices.
    pub async fn get_all_polls(&self) -> ClientResult<Vec<Poll>> {
        self.query("poll.getAll", &Value::Null).await
    }

    /// A poll by id, or `None` if it does not exist.
    pub async fn get_poll(&self, id: &str) -> ClientResult<Option<Poll>> {
        self.query("poll.getById", &serde_json::json!({ "id": id }))
            .await
    }

    /// Validate the form locally, then create the poll.
    pub async fn add_poll(&self, form: &PollForm) -> ClientResult<Poll> {
        form.check()?;
        self.mutate("poll.addPoll", form).await
    }

    /// Delete an owned poll; returns how many were removed.
    pub async fn delete_poll(&self, id: &str) -> ClientResult<u64> {
        let result: DeleteCount = self
            .mutate("poll.deletePoll", &serde_json::json!({ "id": id }))
            .await?;
        Ok(result.count)
    }

    /// Add one vote to a choice.
    pub async fn add_vote(&self, choice_id: &str) -> ClientResult<Choice> {
        self.mutate("choice.addVote", &serde_json::json!({ "id": choice_id }))
            .await
    }

    /// The greeting only signed-in callers can read.
    pub async fn secret_message(&self) -> ClientResult<String> {
        self.query("auth.getSecretMessage", &Value::Null).await
    }

    /// Greeting for the signed-in email, else for `text`.
    pub async fn hello(&self, text: Option<&str>) -> ClientResult<String> {
        let greeting: Greeting = self
            .query("example.hello", &serde_json::json!({ "text": text }))
            .await?;
        Ok(greeting.greeting)
    }

    /// Rows of the example table.
    pub async fn examples(&self) -> ClientResult<Vec<Example>> {
        self.query("example.getAll", &Value::Null).await
    }

    /// The current session, or `None` when signed out.
    pub async fn session(&self) -> ClientResult<Option<SessionInfo>> {
        let url = self.base_url.join("auth/session")?;
        let response = self.authorize(self.http.get(url)).send().await?;
        decode(response).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(envelope) => Err(ClientError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        }),
        Err(_) => Err(ClientError::Api {
            status: status.as_u16(),
            code: "HTTP_ERROR".to_string(),
            message: String::from_utf8_lossy(&bytes).into_owned(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = RpcClient::new("http://localhost:3000/api").unwrap();
        assert_eq!(
            client.base_url.join("rpc/poll.getAll").unwrap().as_str(),
            "http://localhost:3000/api/rpc/poll.getAll"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            RpcClient::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }
}
