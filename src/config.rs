use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Row cap of the legacy spreadsheet format the report is usually exported to.
pub const SPREADSHEET_ROW_LIMIT: usize = 65_536;

/// Default number of documents fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default cap: one row per document, minus the header and the footer rows.
pub const DEFAULT_MAX_DOCUMENTS: usize = SPREADSHEET_ROW_LIMIT - 2;

/// Default time kept aside for downstream rendering.
pub const DEFAULT_RESERVED_RENDER_SECONDS: u64 = 90;

/// Limits applied by the paged traversal.
///
/// Missing keys fall back to their defaults when deserialized, so a partial
/// document such as `{"timeout_seconds": 600}` is a valid configuration.
///
/// # Examples
///
/// ```
/// use acl_audit::AuditConfig;
/// use std::time::Duration;
///
/// let config = AuditConfig::default().with_timeout(600);
/// assert_eq!(config.processing_budget().unwrap(), Some(Duration::from_secs(510)));
///
/// // Not enough time left once rendering is accounted for
/// assert!(AuditConfig::default().with_timeout(90).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Documents fetched per page
    pub page_size: usize,
    /// Hard cap on audited documents, root included
    pub max_documents: usize,
    /// Overall time allowed, 0 meaning unbounded
    pub timeout_seconds: u64,
    /// Share of `timeout_seconds` kept for rendering the report
    pub reserved_render_seconds: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            timeout_seconds: 0,
            reserved_render_seconds: DEFAULT_RESERVED_RENDER_SECONDS,
        }
    }
}

impl AuditConfig {
    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the document cap.
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = max_documents;
        self
    }

    /// Sets the overall timeout in seconds (0 disables it).
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Sets the time reserved for rendering.
    pub fn with_reserved_render_seconds(mut self, seconds: u64) -> Self {
        self.reserved_render_seconds = seconds;
        self
    }

    /// Checks that the configuration leaves something to run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the page size or the document cap
    /// is zero, or if a timeout is set that does not exceed the reserved
    /// rendering time.
    pub fn validate(&self) -> Result<()> {
        self.processing_budget().map(|_| ())
    }

    /// Time available for traversal, `None` when unbounded.
    ///
    /// # Errors
    ///
    /// Same conditions as [`validate`](Self::validate).
    pub fn processing_budget(&self) -> Result<Option<Duration>> {
        if self.page_size == 0 {
            return Err(Error::invalid_config("page_size must be positive"));
        }
        if self.max_documents == 0 {
            return Err(Error::invalid_config("max_documents must be positive"));
        }
        if self.timeout_seconds == 0 {
            return Ok(None);
        }
        match self.timeout_seconds.checked_sub(self.reserved_render_seconds) {
            Some(budget) if budget > 0 => Ok(Some(Duration::from_secs(budget))),
            _ => Err(Error::invalid_config(format!(
                "timeout of {}s leaves no processing time once {}s are reserved for rendering",
                self.timeout_seconds, self.reserved_render_seconds
            ))),
        }
    }
}
