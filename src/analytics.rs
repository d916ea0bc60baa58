//! View-tracking deduplication token.
//!
//! The client holds a short-lived list of recently viewed product ids and
//! echoes it with every view event. An id already present in the token
//! suppresses the increment; otherwise the id is pushed to the front and the
//! oldest entry falls off past the cap. Expiry is client-side: the token is
//! handed back with a TTL and an expired token simply arrives empty.

/// Most recently viewed ids kept per client.
pub const VIEW_TOKEN_CAP: usize = 20;

/// Client-side token lifetime, in seconds.
pub const VIEW_TOKEN_TTL_SECS: u64 = 3600;

/// Client-held list of recently viewed product ids, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewToken {
    ids: Vec<String>,
}

impl ViewToken {
    /// Rebuild a token from the client-supplied list, dropping empty entries
    /// and anything past the cap.
    #[must_use]
    pub fn from_ids(ids: Vec<String>) -> Self {
        let ids = ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .take(VIEW_TOKEN_CAP)
            .collect();
        Self { ids }
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.ids.iter().any(|id| id == product_id)
    }

    /// Record a view: push the id to the front, evicting the oldest entry
    /// when the cap is exceeded.
    pub fn record(&mut self, product_id: &str) {
        self.ids.insert(0, product_id.to_string());
        self.ids.truncate(VIEW_TOKEN_CAP);
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn into_ids(self) -> Vec<String> {
        self.ids
    }
}
