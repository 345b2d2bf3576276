use super::GqlCandle;
use crate::service::CandlePage;
use async_graphql::SimpleObject;
use candle_core::types::PaginationInfo;

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "PaginationInfo")]
pub struct GqlPaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub offset: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl From<PaginationInfo> for GqlPaginationInfo {
    fn from(info: PaginationInfo) -> Self {
        Self {
            page: info.page,
            page_size: info.page_size,
            offset: info.offset,
            total_count: info.total_count,
            total_pages: info.total_pages,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "CandlePage")]
pub struct GqlCandlePage {
    pub candles: Vec<GqlCandle>,
    pub pagination_info: GqlPaginationInfo,
}

impl From<CandlePage> for GqlCandlePage {
    fn from(page: CandlePage) -> Self {
        Self {
            candles: page.candles.into_iter().map(GqlCandle::from).collect(),
            pagination_info: page.pagination.into(),
        }
    }
}
