mod candle;
mod pagination;

pub use candle::{
    CandleChartInput, CandleStickInput, GqlCandle, GqlInterval, GqlOrderBy, GqlOrderColumn,
    GqlOrderDirection,
};
pub use pagination::{GqlCandlePage, GqlPaginationInfo};
