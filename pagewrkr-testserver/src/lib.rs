use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_PRODUCTS: &str = "/api/products";
pub const PATH_PRODUCTS_EMPTY: &str = "/api/products/empty";
pub const PATH_PRODUCTS_MALFORMED: &str = "/api/products/malformed";
pub const PATH_PRODUCTS_NO_ITEMS: &str = "/api/products/no-items";
pub const PATH_PRODUCTS_SLOW: &str = "/api/products/slow";
pub const PATH_PRODUCTS_FLAKY: &str = "/api/products/flaky";

/// Products served by [`TestServer::start`].
pub const DEFAULT_CATALOG_SIZE: u64 = 10;

/// Delay applied by the slow listing.
pub const SLOW_DELAY: Duration = Duration::from_millis(200);

/// Every n-th request to the flaky listing answers 500.
pub const FLAKY_EVERY: u64 = 10;

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    saw_json_content_type: Arc<AtomicU64>,
    flaky_requests: Arc<AtomicU64>,
}

impl TestServerStats {
    fn observe(&self, headers: &HeaderMap) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("application/json"))
        {
            self.saw_json_content_type.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn next_flaky(&self) -> u64 {
        self.flaky_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn saw_json_content_type(&self) -> u64 {
        self.saw_json_content_type.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub products: String,
    pub products_empty: String,
    pub products_malformed: String,
    pub products_no_items: String,
    pub products_slow: String,
    pub products_flaky: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            products: format!("{base_url}{PATH_PRODUCTS}"),
            products_empty: format!("{base_url}{PATH_PRODUCTS_EMPTY}"),
            products_malformed: format!("{base_url}{PATH_PRODUCTS_MALFORMED}"),
            products_no_items: format!("{base_url}{PATH_PRODUCTS_NO_ITEMS}"),
            products_slow: format!("{base_url}{PATH_PRODUCTS_SLOW}"),
            products_flaky: format!("{base_url}{PATH_PRODUCTS_FLAKY}"),
            base_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Product {
    id: u64,
    name: String,
    price: f64,
}

#[derive(Debug, Serialize)]
struct ProductPage<'a> {
    items: &'a [Product],
    page: u64,
    size: u64,
    total: u64,
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    catalog: Arc<[Product]>,
}

fn catalog(size: u64) -> Arc<[Product]> {
    (1..=size)
        .map(|id| Product {
            id,
            name: format!("product-{id}"),
            price: id as f64 * 9.5,
        })
        .collect()
}

/// Parses `page`/`size`. Both default to 1-based values and must be positive.
fn page_params(query: &HashMap<String, String>) -> Option<(u64, u64)> {
    let parse = |key: &str, default: u64| match query.get(key) {
        Some(raw) => raw.parse::<u64>().ok().filter(|v| *v >= 1),
        None => Some(default),
    };
    Some((parse("page", 1)?, parse("size", 10)?))
}

fn page_response(state: &AppState, query: &HashMap<String, String>) -> Response {
    let Some((page, size)) = page_params(query) else {
        return (StatusCode::BAD_REQUEST, "invalid page/size").into_response();
    };

    let total = state.catalog.len() as u64;
    let start = (page - 1).saturating_mul(size).min(total) as usize;
    let end = (start as u64).saturating_add(size).min(total) as usize;

    Json(ProductPage {
        items: &state.catalog[start..end],
        page,
        size,
        total,
    })
    .into_response()
}

async fn handle_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.stats.observe(&headers);
    page_response(&state, &query)
}

async fn handle_products_empty(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.stats.observe(&headers);
    Json(json!({ "items": [] })).into_response()
}

async fn handle_products_malformed(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.stats.observe(&headers);
    Json(json!({
        "items": [
            { "id": 1, "name": "complete", "price": 1.5 },
            { "id": "2", "name": "string-id", "price": 2.0 },
            { "id": 3, "name": "no-price" },
        ]
    }))
    .into_response()
}

async fn handle_products_no_items(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.stats.observe(&headers);
    Json(json!({ "data": [] })).into_response()
}

async fn handle_products_slow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.stats.observe(&headers);
    sleep(SLOW_DELAY).await;
    page_response(&state, &query)
}

async fn handle_products_flaky(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.stats.observe(&headers);
    if state.stats.next_flaky() % FLAKY_EVERY == 0 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "flaky").into_response();
    }
    page_response(&state, &query)
}

pub fn router(stats: TestServerStats, catalog_size: u64) -> Router {
    let state = AppState {
        stats,
        catalog: catalog(catalog_size),
    };

    Router::new()
        .route(PATH_PRODUCTS, get(handle_products))
        .route(PATH_PRODUCTS_EMPTY, get(handle_products_empty))
        .route(PATH_PRODUCTS_MALFORMED, get(handle_products_malformed))
        .route(PATH_PRODUCTS_NO_ITEMS, get(handle_products_no_items))
        .route(PATH_PRODUCTS_SLOW, get(handle_products_slow))
        .route(PATH_PRODUCTS_FLAKY, get(handle_products_flaky))
        .with_state(state)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with_catalog(DEFAULT_CATALOG_SIZE).await
    }

    pub async fn start_with_catalog(catalog_size: u64) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let app = router(stats.clone(), catalog_size);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn page_params_default_and_validate() {
        assert_eq!(page_params(&query(&[])), Some((1, 10)));
        assert_eq!(page_params(&query(&[("page", "3"), ("size", "2")])), Some((3, 2)));
        assert_eq!(page_params(&query(&[("page", "0")])), None);
        assert_eq!(page_params(&query(&[("size", "x")])), None);
    }

    #[test]
    fn catalog_ids_are_one_based() {
        let c = catalog(3);
        let ids: Vec<u64> = c.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
