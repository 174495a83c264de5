use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pagewrkr_http::{HttpClient, PageRequest};

use crate::error::{Error, Result};
use crate::outcome::{RequestOutcome, RequestSpec};
use crate::payload;

/// Issues one listing request and classifies what came back.
///
/// Implementations never fail: every problem is encoded in the returned outcome.
pub trait RequestExecutor: Send + Sync + 'static {
    fn execute(&self, spec: RequestSpec) -> impl Future<Output = RequestOutcome> + Send;
}

/// Joins `base_url` and `path` with exactly one `/` between them.
pub fn join_endpoint(base_url: &str, path: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let endpoint = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };

    let parsed =
        url::Url::parse(&endpoint).map_err(|_| Error::InvalidEndpoint(endpoint.clone()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::InvalidEndpoint(endpoint));
    }
    Ok(endpoint)
}

/// [`RequestExecutor`] backed by a real HTTP client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: HttpClient,
    endpoint: Arc<str>,
    request_timeout: Option<Duration>,
}

impl HttpExecutor {
    pub fn new(endpoint: &str, request_timeout: Option<Duration>) -> Result<Self> {
        let endpoint = join_endpoint(endpoint, "")?;
        Ok(Self {
            client: HttpClient::default(),
            endpoint: Arc::from(endpoint),
            request_timeout,
        })
    }

    fn build_request(&self, spec: RequestSpec) -> PageRequest {
        let req = PageRequest::new(&*self.endpoint)
            .query("page", spec.page)
            .query("size", spec.size);
        match self.request_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }
}

impl RequestExecutor for HttpExecutor {
    async fn execute(&self, spec: RequestSpec) -> RequestOutcome {
        let req = self.build_request(spec);

        let started = Instant::now();
        let res = self.client.fetch(req).await;
        let latency = started.elapsed();

        match res {
            Err(err) => {
                tracing::debug!(page = spec.page, size = spec.size, error = %err, "request failed");
                RequestOutcome::transport(err.transport_error_kind().into(), latency)
            }
            Ok(res) => {
                if res.status != 200 {
                    tracing::debug!(page = spec.page, status = res.status, "non-200 response");
                }
                classify_response(res.status, &res.body, latency)
            }
        }
    }
}

/// Only a 200 carries a listing; any other status is a status failure whatever its body.
fn classify_response(status: u16, body: &[u8], latency: Duration) -> RequestOutcome {
    if status == 200 {
        RequestOutcome::listing(latency, payload::inspect(body))
    } else {
        RequestOutcome::http_status(status, latency)
    }
}
