use serde::{Deserialize, Serialize};

/// Default page size when the client does not ask for one
pub const DEFAULT_PER_PAGE: u32 = 25;
/// Hard cap on page size
pub const MAX_PER_PAGE: u32 = 200;

/// 1-based pagination request parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }.clamped()
    }

    /// Clamp page to >= 1 and per_page to 1..=MAX_PER_PAGE
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Row offset for offset/limit SQL
    pub fn offset(&self) -> u64 {
        let p = self.clamped();
        u64::from(p.page - 1) * u64::from(p.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.clamped().per_page)
    }
}

/// Pagination metadata returned in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageMeta {
    pub fn new(params: PageParams, total: u64) -> Self {
        let params = params.clamped();
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(u64::from(params.per_page)) as u32
        };
        Self {
            page: params.page,
            per_page: params.per_page,
            total,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }
}

/// Navigation links returned in the response envelope. `next` is absent on
/// the last page, `prev` on the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl PageLinks {
    /// Build links for `path`, carrying `extra_query` (already-encoded filter
    /// parameters, without a leading separator) on every link.
    pub fn build(path: &str, extra_query: &str, meta: &PageMeta) -> Self {
        let link = |page: u32| {
            let mut url = format!("{}?page={}&per_page={}", path, page, meta.per_page);
            if !extra_query.is_empty() {
                url.push('&');
                url.push_str(extra_query);
            }
            url
        };
        Self {
            self_link: link(meta.page),
            next: meta.has_next().then(|| link(meta.page + 1)),
            prev: meta.has_prev().then(|| link(meta.page - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_zero_based() {
        assert_eq!(PageParams::new(1, 25).offset(), 0);
        assert_eq!(PageParams::new(3, 25).offset(), 50);
        assert_eq!(PageParams::new(2, 7).offset(), 7);
    }

    #[test]
    fn test_clamping() {
        let p = PageParams::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);

        let p = PageParams::new(1, 10_000);
        assert_eq!(p.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_total_pages_is_a_ceiling() {
        let meta = PageMeta::new(PageParams::new(1, 25), 51);
        assert_eq!(meta.total_pages, 3);

        let meta = PageMeta::new(PageParams::new(1, 25), 50);
        assert_eq!(meta.total_pages, 2);

        let meta = PageMeta::new(PageParams::new(1, 25), 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_past_the_end_page_keeps_correct_meta() {
        let meta = PageMeta::new(PageParams::new(9, 25), 51);
        assert_eq!(meta.page, 9);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next());
        assert!(meta.has_prev());
    }

    #[test]
    fn test_links_presence() {
        let meta = PageMeta::new(PageParams::new(2, 10), 30);
        let links = PageLinks::build("/api/assets", "country=DE", &meta);
        assert_eq!(links.self_link, "/api/assets?page=2&per_page=10&country=DE");
        assert_eq!(
            links.next.as_deref(),
            Some("/api/assets?page=3&per_page=10&country=DE")
        );
        assert_eq!(
            links.prev.as_deref(),
            Some("/api/assets?page=1&per_page=10&country=DE")
        );

        let first = PageLinks::build("/api/assets", "", &PageMeta::new(PageParams::new(1, 10), 30));
        assert!(first.prev.is_none());
        assert_eq!(first.self_link, "/api/assets?page=1&per_page=10");

        let last = PageLinks::build("/api/assets", "", &PageMeta::new(PageParams::new(3, 10), 30));
        assert!(last.next.is_none());
    }

    #[test]
    fn test_empty_result_set_has_no_links_beyond_self() {
        let links = PageLinks::build("/api/assets", "", &PageMeta::new(PageParams::default(), 0));
        assert!(links.next.is_none());
        assert!(links.prev.is_none());
    }
}
