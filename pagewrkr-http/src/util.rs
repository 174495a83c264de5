/// Parses `base` as an http(s) URL and appends `query` as
/// `application/x-www-form-urlencoded` pairs, keeping any query string already on `base`.
pub(super) fn page_url(base: &str, query: &[(&'static str, String)]) -> Option<url::Url> {
    let mut parsed = url::Url::parse(base).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    if !query.is_empty() {
        let mut pairs = parsed.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_appends_pairs() {
        let url = page_url(
            "http://127.0.0.1:8080/api/products",
            &[("page", "3".to_string()), ("size", "2".to_string())],
        )
        .unwrap_or_else(|| panic!("expected valid url"));
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/products?page=3&size=2");
    }

    #[test]
    fn page_url_keeps_existing_query() {
        let url = page_url(
            "http://localhost/api/products?sort=name",
            &[("page", "1".to_string())],
        )
        .unwrap_or_else(|| panic!("expected valid url"));
        assert_eq!(url.query(), Some("sort=name&page=1"));
    }

    #[test]
    fn page_url_rejects_other_schemes() {
        assert!(page_url("ftp://example.com/", &[]).is_none());
        assert!(page_url("not a url", &[]).is_none());
    }
}
