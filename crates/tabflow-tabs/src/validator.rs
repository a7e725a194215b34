//! Tab validation
//!
//! Narrows a list of candidate tab ids to the tabs that still exist and can
//! be touched by the extension. Candidates are checked one host round trip
//! at a time, in order.

use std::collections::HashSet;

use crate::error::TabError;
use crate::host::{BrowserHost, TabId, TabRecord};
use crate::restricted::RestrictedUrls;
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Usable tabs, in candidate order
    pub accepted: Vec<TabRecord>,
    /// Candidates that were dropped and why
    pub rejected: Vec<(TabId, TabError)>,
}

impl Validation {
    pub fn ids(&self) -> Vec<TabId> {
        self.accepted.iter().map(|tab| tab.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TabValidator {
    restricted: RestrictedUrls,
}

impl TabValidator {
    pub fn new(restricted: RestrictedUrls) -> Self {
        Self { restricted }
    }

    pub fn restricted(&self) -> &RestrictedUrls {
        &self.restricted
    }

    /// Resolve a single tab and reject it if its URL is restricted
    pub async fn check(&self, host: &dyn BrowserHost, tab_id: TabId) -> Result<TabRecord> {
        let tab = host.get_tab(tab_id).await?;

        if self.restricted.is_restricted(&tab.url) {
            return Err(TabError::Restricted {
                tab_id,
                url: tab.url,
            });
        }

        Ok(tab)
    }

    /// Filter `tab_ids` down to usable tabs. Never fails: every rejected id
    /// is logged and reported in [`Validation::rejected`].
    pub async fn validate(&self, host: &dyn BrowserHost, tab_ids: &[TabId]) -> Validation {
        let mut validation = Validation::default();
        let mut seen = HashSet::with_capacity(tab_ids.len());

        for &tab_id in tab_ids {
            if !seen.insert(tab_id) {
                continue;
            }

            match self.check(host, tab_id).await {
                Ok(tab) => validation.accepted.push(tab),
                Err(e) => {
                    tracing::warn!(tab_id = %tab_id, error = %e, "Skipping invalid tab");
                    validation.rejected.push((tab_id, e));
                }
            }
        }

        tracing::debug!(
            accepted = validation.accepted.len(),
            rejected = validation.rejected.len(),
            "Validated tabs"
        );

        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    fn ids(raw: &[i32]) -> Vec<TabId> {
        raw.iter().copied().map(TabId).collect()
    }

    #[tokio::test]
    async fn test_validation_preserves_order_and_drops_bad_tabs() {
        let host = FakeHost::new();
        host.add_tab(9, "https://example.com/c");
        host.add_tab(3, "chrome://settings");
        host.add_tab(5, "https://example.com/a");
        host.add_tab(6, "");
        host.add_tab(1, "https://example.com/b");

        let validator = TabValidator::default();
        let validation = validator
            .validate(&host, &ids(&[9, 3, 5, 404, 6, 1]))
            .await;

        assert_eq!(validation.ids(), ids(&[9, 5, 1]));

        let rejected: Vec<TabId> = validation.rejected.iter().map(|(id, _)| *id).collect();
        assert_eq!(rejected, ids(&[3, 404, 6]));
        assert!(matches!(
            validation.rejected[0].1,
            TabError::Restricted { .. }
        ));
        assert_eq!(validation.rejected[1].1, TabError::NotFound(TabId(404)));
    }

    #[tokio::test]
    async fn test_nothing_valid() {
        let host = FakeHost::new();
        host.add_tab(1, "edge://flags");

        let validation = TabValidator::default().validate(&host, &ids(&[1, 2])).await;
        assert!(validation.is_empty());
        assert_eq!(validation.rejected.len(), 2);

        let validation = TabValidator::default().validate(&host, &[]).await;
        assert!(validation.is_empty());
        assert!(validation.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_checked_once() {
        let host = FakeHost::new();
        host.add_tab(4, "https://example.com");

        let validation = TabValidator::default()
            .validate(&host, &ids(&[4, 4, 4]))
            .await;

        assert_eq!(validation.ids(), ids(&[4]));
        assert_eq!(host.calls().len(), 1);
    }
}
