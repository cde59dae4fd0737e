//! Connector registry endpoints

use harness_core::domain::connector::Connector;
use harness_core::dto::Page;
use harness_core::dto::connector::{ConnectorFilter, ConnectorResponse};
use tracing::{debug, warn};

use crate::HarnessClient;
use crate::delegates::has_more_pages;
use crate::error::Result;

const CONNECTORS_PATH: &str = "/ng/api/connectors/listV2";
const PAGE_SIZE: u32 = 100;

impl HarnessClient {
    // =============================================================================
    // Connector Query
    // =============================================================================

    /// List connectors in the configured scope
    ///
    /// # Arguments
    /// * `selector` - When given, keep only connectors pinned to this delegate
    ///   selector
    ///
    /// # Returns
    /// Connectors in the order the platform returned them
    pub async fn list_connectors(&self, selector: Option<&str>) -> Result<Vec<Connector>> {
        let mut connectors = Vec::new();
        let mut page_index = 0;

        loop {
            let mut query = self.scoped_query();
            query.push(("pageIndex", page_index.to_string()));
            query.push(("pageSize", PAGE_SIZE.to_string()));

            debug!(page_index, "Fetching connector page");
            let page: Page<ConnectorResponse> = self
                .post_data(CONNECTORS_PATH, &query, &ConnectorFilter::default())
                .await?;

            let received = page.content.len();
            for response in page.content {
                match Connector::try_from(response) {
                    Ok(connector) => connectors.push(connector),
                    Err(e) => warn!("Skipping connector record: {}", e),
                }
            }

            page_index += 1;
            if !has_more_pages(page.total_pages, page_index, received, PAGE_SIZE) {
                break;
            }
        }

        Ok(filter_by_selector(connectors, selector))
    }
}

fn filter_by_selector(connectors: Vec<Connector>, selector: Option<&str>) -> Vec<Connector> {
    match selector {
        Some(selector) => connectors
            .into_iter()
            .filter(|c| c.uses_selector(selector))
            .collect(),
        None => connectors,
    }
}
