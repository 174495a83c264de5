use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::outcome::RequestSpec;

/// How workers pick the page they request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PageStrategy {
    /// Each worker owns one page: `start + worker`, wrapping inside the range.
    #[default]
    PerWorker,
    /// Each worker walks the range: `start + request`, wrapping inside the range.
    Sequential,
    /// Every request targets `start`.
    Fixed,
}

/// Inclusive page range, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
}

impl Default for PageRange {
    fn default() -> Self {
        Self {
            start: 1,
            end: u64::MAX,
        }
    }
}

impl PageRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start == 0 || self.end < self.start {
            return Err(Error::InvalidPageRange);
        }
        Ok(())
    }

    fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    fn nth(&self, n: u64) -> u64 {
        self.start + n % self.len()
    }
}

/// Builds the `(worker_index, request_index) -> RequestSpec` factory for `strategy`.
///
/// Indices are 0-based.
pub fn spec_factory(
    strategy: PageStrategy,
    range: PageRange,
    size: u64,
) -> impl Fn(u64, u64) -> RequestSpec + Send + Sync + Clone + 'static {
    move |worker, request| {
        let page = match strategy {
            PageStrategy::PerWorker => range.nth(worker),
            PageStrategy::Sequential => range.nth(request),
            PageStrategy::Fixed => range.start,
        };
        RequestSpec::new(page, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_worker_gives_each_worker_its_own_page() {
        let f = spec_factory(PageStrategy::PerWorker, PageRange::default(), 1);
        assert_eq!(f(0, 0), RequestSpec::new(1, 1));
        assert_eq!(f(0, 4), RequestSpec::new(1, 1));
        assert_eq!(f(19, 2), RequestSpec::new(20, 1));
    }

    #[test]
    fn sequential_walks_and_wraps() {
        let range = PageRange::new(1, 3).unwrap_or_else(|e| panic!("{e}"));
        let f = spec_factory(PageStrategy::Sequential, range, 2);
        let pages: Vec<u64> = (0..5).map(|r| f(7, r).page).collect();
        assert_eq!(pages, vec![1, 2, 3, 1, 2]);
    }

    #[test]
    fn fixed_always_uses_start() {
        let range = PageRange::new(4, 9).unwrap_or_else(|e| panic!("{e}"));
        let f = spec_factory(PageStrategy::Fixed, range, 2);
        assert_eq!(f(3, 3), RequestSpec::new(4, 2));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(PageRange::new(0, 1).is_err());
        assert!(PageRange::new(5, 4).is_err());
        assert!(PageRange::new(2, 2).is_ok());
    }

    #[test]
    fn strategy_parses_from_kebab_case() {
        assert_eq!("per-worker".parse::<PageStrategy>().ok(), Some(PageStrategy::PerWorker));
        assert_eq!("sequential".parse::<PageStrategy>().ok(), Some(PageStrategy::Sequential));
        assert!("random".parse::<PageStrategy>().is_err());
    }
}
