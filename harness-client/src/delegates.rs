//! Delegate registry endpoints

use std::collections::BTreeMap;

use harness_core::domain::delegate::Delegate;
use harness_core::dto::Page;
use harness_core::dto::delegate::{DelegateRecord, ListDelegatesRequest};
use tracing::{debug, warn};

use crate::HarnessClient;
use crate::error::{ClientError, Result};

const DELEGATE_SETUP_PATH: &str = "/ng/api/delegate-setup";
const PAGE_SIZE: u32 = 100;

impl HarnessClient {
    // =============================================================================
    // Delegate Query
    // =============================================================================

    /// Get a single delegate
    ///
    /// # Arguments
    /// * `delegate_id` - The delegate identifier
    ///
    /// # Returns
    /// The delegate, or [`ClientError::NotFound`] when the registry does not
    /// know it
    pub async fn get_delegate(&self, delegate_id: &str) -> Result<Delegate> {
        let record: DelegateRecord = self
            .get_resource(DELEGATE_SETUP_PATH, delegate_id, &self.account_query())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ClientError::NotFound(format!("delegate {}", delegate_id))
                } else {
                    e
                }
            })?;

        Ok(Delegate::try_from(record)?)
    }

    /// List every delegate in the account
    ///
    /// Records without an id or status are skipped with a warning.
    ///
    /// # Returns
    /// Delegates keyed by their id
    pub async fn list_delegates(&self) -> Result<BTreeMap<String, Delegate>> {
        let mut delegates = BTreeMap::new();
        let mut page_index = 0;

        loop {
            debug!(page_index, "Fetching delegate page");
            let page: Page<DelegateRecord> = self
                .post_data(
                    DELEGATE_SETUP_PATH,
                    &self.account_query(),
                    &ListDelegatesRequest::all(page_index, PAGE_SIZE),
                )
                .await?;

            let received = page.content.len();
            for record in page.content {
                match Delegate::try_from(record) {
                    Ok(delegate) => {
                        delegates.insert(delegate.id.clone(), delegate);
                    }
                    Err(e) => warn!("Skipping delegate record: {}", e),
                }
            }

            page_index += 1;
            if !has_more_pages(page.total_pages, page_index, received, PAGE_SIZE) {
                break;
            }
        }

        debug!(count = delegates.len(), "Fetched delegates");
        Ok(delegates)
    }
}

/// Whether another page should be requested after `fetched_pages` pages
///
/// Uses `total_pages` when the platform sends it, otherwise stops at the first
/// short page.
pub(crate) fn has_more_pages(
    total_pages: Option<u32>,
    fetched_pages: u32,
    received: usize,
    page_size: u32,
) -> bool {
    if received == 0 {
        return false;
    }
    match total_pages {
        Some(total) => fetched_pages < total,
        None => received >= page_size as usize,
    }
}
