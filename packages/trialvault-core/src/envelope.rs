use serde::{Deserialize, Serialize};

use crate::page::{PageLinks, PageMeta};

/// The `{success, data, meta, links}` wrapper every API response uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
            links: None,
        }
    }

    pub fn paginated(data: T, meta: PageMeta, links: PageLinks) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
            links: Some(links),
        }
    }
}

/// The error counterpart: `{success: false, error, code}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageParams;

    #[test]
    fn test_plain_envelope_omits_meta_and_links() {
        let env = Envelope::new(vec![1, 2, 3]);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][2], 3);
        assert!(json.get("meta").is_none());
        assert!(json.get("links").is_none());
    }

    #[test]
    fn test_paginated_envelope_round_trips() {
        let meta = PageMeta::new(PageParams::new(1, 10), 12);
        let links = PageLinks::build("/api/trials", "", &meta);
        let env = Envelope::paginated(vec!["a".to_string()], meta, links);
        let json = serde_json::to_string(&env).unwrap();
        let back: Envelope<Vec<String>> = serde_json::from_str(&json).unwrap();
        assert!(back.success);
        assert_eq!(back.meta.unwrap().total, 12);
        assert_eq!(back.links.unwrap().self_link, "/api/trials?page=1&per_page=10");
    }

    #[test]
    fn test_error_envelope_shape() {
        let env = ErrorEnvelope::new("Trial not found", "NOT_FOUND");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
