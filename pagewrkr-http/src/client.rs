use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::{BodyExt as _, Full};
use hyper::Request;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use super::util::page_url;
use super::{Error, HttpResponse, PageRequest, Result};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Pooled HTTP/1.1 client for listing pages, over plain TCP or rustls.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        // Unreachable hosts should fail within seconds, not after the OS TCP connect timeout.
        Self::new(Some(Duration::from_secs(3)))
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut tcp = HttpConnector::new();
        tcp.enforce_http(false);
        tcp.set_connect_timeout(connect_timeout);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(tcp);

        Self {
            inner: Client::builder(TokioExecutor::new()).build(connector),
        }
    }

    /// Fetches one page and reads the full response body.
    ///
    /// `req.timeout` bounds the whole exchange, body included.
    pub async fn fetch(&self, req: PageRequest) -> Result<HttpResponse> {
        match req.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.send(req))
                .await
                .unwrap_or(Err(Error::Timeout(timeout))),
            None => self.send(req).await,
        }
    }

    async fn send(&self, req: PageRequest) -> Result<HttpResponse> {
        let url =
            page_url(&req.url, &req.query).ok_or_else(|| Error::InvalidUrl(req.url.clone()))?;
        let uri: hyper::Uri = url
            .as_str()
            .parse()
            .map_err(|_| Error::InvalidUrl(req.url.clone()))?;

        // GET with an empty body; hyper fills in `Host`.
        let mut request = Request::new(Full::new(Bytes::new()));
        *request.uri_mut() = uri;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));

        let (parts, body) = self.inner.request(request).await?.into_parts();
        let body = body.collect().await?.to_bytes();

        Ok(HttpResponse {
            status: parts.status.as_u16(),
            body,
        })
    }
}
