//! Collaborator seams: the instrument directory and the quote source.

use crate::error::Result;
use crate::types::InstrumentQuotes;
use async_trait::async_trait;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Page size used when exhausting the instrument directory
pub const DEFAULT_DIRECTORY_PAGE_SIZE: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentStatus {
    Enabled,
    Disabled,
}

impl InstrumentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InstrumentStatus::Enabled => "enabled",
            InstrumentStatus::Disabled => "disabled",
        }
    }
}

/// One page request against the instrument directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentPageRequest {
    pub status: Option<InstrumentStatus>,
    /// Restrict to these IDs; empty means no restriction
    pub ids: Vec<u64>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

/// One page of instrument IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPage {
    pub instrument_ids: Vec<u64>,
    /// Matches across all pages, when the directory reports it
    pub total_count: Option<u64>,
}

/// Catalog of tradable instruments
#[async_trait]
pub trait InstrumentDirectory: Send + Sync {
    async fn fetch_page(&self, request: &InstrumentPageRequest) -> Result<InstrumentPage>;

    fn page_size(&self) -> u32 {
        DEFAULT_DIRECTORY_PAGE_SIZE
    }

    /// IDs of every enabled instrument, reading pages until exhausted
    async fn list_active_ids(&self) -> Result<BTreeSet<u64>> {
        collect_ids(self, Some(InstrumentStatus::Enabled), Vec::new()).await
    }

    /// The subset of `ids` the directory does not know
    async fn find_unknown(&self, ids: &BTreeSet<u64>) -> Result<BTreeSet<u64>> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        let known = collect_ids(self, None, ids.iter().copied().collect()).await?;
        Ok(ids.difference(&known).copied().collect())
    }
}

async fn collect_ids<D>(
    directory: &D,
    status: Option<InstrumentStatus>,
    ids: Vec<u64>,
) -> Result<BTreeSet<u64>>
where
    D: InstrumentDirectory + ?Sized,
{
    let page_size = directory.page_size().max(1);
    let mut collected = BTreeSet::new();
    let mut received: u64 = 0;
    let mut page = 1;

    loop {
        let request = InstrumentPageRequest {
            status,
            ids: ids.clone(),
            page,
            page_size,
        };
        let result = directory.fetch_page(&request).await?;
        let fetched = result.instrument_ids.len();
        received += fetched as u64;
        collected.extend(result.instrument_ids);

        debug!(page, fetched, total = ?result.total_count, "Fetched instrument page");

        // a directory may cap the page below `page_size`; trust its total when given
        let exhausted = match result.total_count {
            Some(total) => fetched == 0 || received >= total,
            None => fetched == 0 || fetched < page_size as usize,
        };
        if exhausted {
            break;
        }
        page += 1;
    }

    Ok(collected)
}

/// Source of raw per-second quote samples
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Samples for `instrument_ids` between the `from` and `to` times of day,
    /// each including a "latest" entry
    async fn get_quotes(
        &self,
        instrument_ids: &[u64],
        from: NaiveTime,
        to: NaiveTime,
    ) -> Result<Vec<InstrumentQuotes>>;
}
