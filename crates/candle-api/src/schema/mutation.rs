use super::gql_error;
use super::types::CandleChartInput;
use crate::service::CandleService;
use async_graphql::{Context, Object, Result, SimpleObject};
use std::sync::Arc;

pub struct MutationRoot;

#[derive(Debug, Clone, SimpleObject)]
pub struct CreateCandlesPayload {
    pub total_success: u64,
}

#[Object]
impl MutationRoot {
    /// Store manually supplied candles; all or nothing
    async fn create_candles(
        &self,
        ctx: &Context<'_>,
        charts: Vec<CandleChartInput>,
    ) -> Result<CreateCandlesPayload> {
        let service = ctx.data::<Arc<CandleService>>()?;
        let written = service
            .create_candles(charts.into_iter().map(Into::into).collect())
            .await
            .map_err(gql_error)?;
        Ok(CreateCandlesPayload {
            total_success: written as u64,
        })
    }
}
