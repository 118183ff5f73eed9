//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{HttpError, error_message};
use super::policy::{FailedCall, RetryDecision, RetryPolicy, parse_retry_after};

/// HTTP client that runs every call through a [`RetryPolicy`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Sends one logical request, retrying failed attempts per the policy.
    ///
    /// `build` is applied to a fresh request for every attempt. The error of
    /// the last attempt is returned unchanged as an [`HttpError`].
    #[tracing::instrument(skip(self, build))]
    pub async fn send<F>(&self, method: Method, url: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let operation_name = format!("{} {}", method, url);
        let response = self
            .with_retry(&operation_name, &method, || async {
                let request = build(self.client.request(method.clone(), url));
                let response = request
                    .send()
                    .await
                    .map_err(|e| HttpError::from_reqwest(url, e))?;
                check_status(url, response).await
            })
            .await?;
        Ok(response)
    }

    /// Performs an authorized GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self, token))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        self.get_json_with_query(url, token, &[]).await
    }

    /// Performs an authorized GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, token, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self
            .send(Method::GET, url, |request| {
                request.bearer_auth(token).query(query)
            })
            .await?;

        decode(response).await
    }

    /// Like [`HttpClient::get_json_with_query`], but `204 No Content` yields `None`.
    #[tracing::instrument(skip(self, token, query))]
    pub async fn get_optional_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        debug!("GET optional JSON from {}...", url);

        let response = self
            .send(Method::GET, url, |request| {
                request.bearer_auth(token).query(query)
            })
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let result = serde_json::from_slice(&bytes).context("Failed to parse JSON response")?;
        Ok(Some(result))
    }

    /// Performs an authorized POST with a JSON body and deserializes the JSON response.
    #[tracing::instrument(skip(self, token, body))]
    pub async fn post_json<B, T>(&self, url: &str, token: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST JSON to {}...", url);

        let response = self
            .send(Method::POST, url, |request| {
                request.bearer_auth(token).json(body)
            })
            .await?;

        decode(response).await
    }

    /// POSTs an urlencoded form with HTTP basic authentication.
    #[tracing::instrument(skip(self, password, form))]
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        username: &str,
        password: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        debug!("POST form to {}...", url);

        let response = self
            .send(Method::POST, url, |request| {
                request.basic_auth(username, Some(password)).form(form)
            })
            .await?;

        decode(response).await
    }

    /// Executes an async operation, consulting the policy after each failure.
    async fn with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        method: &Method,
        operation: F,
    ) -> Result<T, HttpError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, HttpError>>,
    {
        let max_attempts = self.policy.retries() + 1;
        let mut retries_made = 0;

        loop {
            let error = match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            let call = FailedCall::new(method.clone(), error);
            match self.policy.decide(retries_made, &call) {
                RetryDecision::Retry { delay } => {
                    retries_made += 1;
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                        operation_name,
                        retries_made,
                        max_attempts,
                        call.error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp(reason) => {
                    debug!(
                        "{}: giving up after {} attempt(s), {}: {}",
                        operation_name,
                        retries_made + 1,
                        reason,
                        call.error
                    );
                    return Err(call.into_error());
                }
            }
        }
    }
}

/// Turns a non-success response into [`HttpError::Status`].
async fn check_status(url: &str, response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_retry_after);

    // The body is only used for the message; a failed read leaves it empty
    let body = response.text().await.unwrap_or_default();

    Err(HttpError::Status {
        url: url.to_string(),
        status,
        retry_after,
        message: error_message(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .context("Failed to parse JSON response")
}
