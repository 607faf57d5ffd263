// =============================================================================
// HTTP transport — the single GET capability the Bitfinex client needs
// =============================================================================

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{BitfxError, Result};

/// Status, declared content type and raw body of one upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// 200 response with the content type Bitfinex sends for JSON.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(
            200,
            Some("application/json; charset=utf-8".to_string()),
            body,
        )
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Perform a GET and hand back whatever came back.
///
/// Implementations only fail when no response was received at all; status
/// codes and bodies are interpreted by the client.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse>>;
}

/// Production transport on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Re-use an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse>> {
        Box::pin(async move {
            let resp = self.client.get(url).send().await?;

            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = resp.text().await?;

            debug!(url, status, content_type = ?content_type, bytes = body.len(), "response received");
            Ok(HttpResponse {
                status,
                content_type,
                body,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// StaticTransport -- canned responses, no network
// ---------------------------------------------------------------------------

struct Route {
    fragment: String,
    responses: VecDeque<HttpResponse>,
}

/// Offline transport serving canned responses.
///
/// A request is answered by the first route whose fragment occurs in the URL.
/// Queued responses are handed out in order; the last one repeats. URLs with
/// no matching route fail as transport errors.
#[derive(Default)]
pub struct StaticTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `response` for URLs containing `fragment`.
    pub fn route(self, fragment: impl Into<String>, response: HttpResponse) -> Self {
        let fragment = fragment.into();
        {
            let mut routes = self.routes.lock();
            match routes.iter_mut().find(|r| r.fragment == fragment) {
                Some(route) => route.responses.push_back(response),
                None => routes.push(Route {
                    fragment,
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn respond(&self, url: &str) -> Result<HttpResponse> {
        self.requests.lock().push(url.to_string());

        let mut routes = self.routes.lock();
        let route = routes
            .iter_mut()
            .find(|r| url.contains(&r.fragment))
            .ok_or_else(|| BitfxError::transport(format!("no route for {url}")))?;

        let response = if route.responses.len() > 1 {
            route.responses.pop_front()
        } else {
            route.responses.front().cloned()
        };
        response.ok_or_else(|| BitfxError::transport(format!("no response queued for {url}")))
    }
}

impl Transport for StaticTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse>> {
        let response = self.respond(url);
        Box::pin(async move { response })
    }
}
