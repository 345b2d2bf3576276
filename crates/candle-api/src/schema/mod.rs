pub mod mutation;
pub mod query;
pub mod types;

use crate::service::CandleService;
use async_graphql::{EmptySubscription, ErrorExtensions, Schema};
use candle_core::CandleError;
use std::sync::Arc;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

/// GraphQL Schema type
pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema
pub fn build_schema(service: Arc<CandleService>) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

/// GraphQL error carrying the error kind under `extensions.code`
pub(crate) fn gql_error(err: CandleError) -> async_graphql::Error {
    let code = err.kind();
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}
