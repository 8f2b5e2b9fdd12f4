use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use thy_api::{ApiError, Method, StatusCode, Transport};

/// Scripted [`Transport`] recording every request.
///
/// Responses are returned in the order they were queued. Once the queue is empty every request
/// fails with `503 Service Unavailable` and no body.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>, ApiError>>>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl MockTransport {
    /// A transport with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn respond_ok(&self, body: impl Into<Vec<u8>>) {
        lock(&self.responses).push_back(Ok(body.into()));
    }

    /// Queue a failure.
    pub fn respond_err(&self, error: ApiError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Number of requests made so far.
    pub fn hits(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Method and URI of every request made so far.
    pub fn requests(&self) -> Vec<(Method, String)> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn do_request(
        &self,
        method: Method,
        uri: &str,
        _body: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError> {
        lock(&self.requests).push((method, uri.to_string()));
        lock(&self.responses)
            .pop_front()
            .unwrap_or(Err(ApiError::EmptyResponse {
                status: StatusCode::SERVICE_UNAVAILABLE,
            }))
    }
}
