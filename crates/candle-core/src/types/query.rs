use super::candle::{Candle, IntervalType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Columns a candle listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderColumn {
    Start,
    InstrumentId,
}

impl OrderColumn {
    pub const fn column_name(&self) -> &'static str {
        match self {
            OrderColumn::Start => "start",
            OrderColumn::InstrumentId => "instrument_id",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub const fn keyword(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One ordering directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: OrderColumn,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(column: OrderColumn) -> Self {
        Self {
            column,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(column: OrderColumn) -> Self {
        Self {
            column,
            direction: OrderDirection::Desc,
        }
    }

    fn compare(&self, a: &Candle, b: &Candle) -> Ordering {
        let ordering = match self.column {
            OrderColumn::Start => a.start.cmp(&b.start),
            OrderColumn::InstrumentId => a.instrument_id.cmp(&b.instrument_id),
        };
        match self.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        }
    }
}

/// Filter, ordering and windowing of a candle lookup
///
/// Every predicate is optional; predicates that are present are combined
/// with AND. Zero `offset` and `limit` impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandleQuery {
    pub instrument_id: Option<u64>,
    pub instrument_ids: Vec<u64>,
    pub interval: Option<IntervalType>,
    /// Exact interval start
    pub start: Option<DateTime<Utc>>,
    /// Inclusive lower bound on interval start
    pub start_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on interval start
    pub start_to: Option<DateTime<Utc>>,
    pub order_by: Vec<OrderBy>,
    pub offset: u64,
    pub limit: u64,
}

impl CandleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query identifying a single row by its natural key
    pub fn by_key(instrument_id: u64, interval: IntervalType, start: DateTime<Utc>) -> Self {
        Self::new()
            .instrument(instrument_id)
            .interval(interval)
            .start(start)
    }

    pub fn instrument(mut self, instrument_id: u64) -> Self {
        self.instrument_id = Some(instrument_id);
        self
    }

    pub fn instruments(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.instrument_ids = ids.into_iter().collect();
        self
    }

    pub fn interval(mut self, interval: IntervalType) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn start_between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.start_from = from;
        self.start_to = to;
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Whether `candle` satisfies every predicate of this query
    pub fn matches(&self, candle: &Candle) -> bool {
        if self.instrument_id.is_some_and(|id| id != candle.instrument_id) {
            return false;
        }
        if !self.instrument_ids.is_empty() && !self.instrument_ids.contains(&candle.instrument_id) {
            return false;
        }
        if self.interval.is_some_and(|i| i != candle.interval) {
            return false;
        }
        if self.start.is_some_and(|s| s != candle.start) {
            return false;
        }
        if self.start_from.is_some_and(|from| candle.start < from) {
            return false;
        }
        if self.start_to.is_some_and(|to| candle.start > to) {
            return false;
        }
        true
    }

    /// Compare two candles by the ordering directives, in the order given
    pub fn compare(&self, a: &Candle, b: &Candle) -> Ordering {
        self.order_by
            .iter()
            .map(|o| o.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Page request; pages are 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Effective page number (page 0 is treated as the first page)
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Effective page size (0 falls back to the default)
    pub fn page_size(&self) -> u32 {
        if self.page_size == 0 {
            Self::DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.page_size())
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size())
    }

    /// Metadata for a result set of `total_count` matching rows
    pub fn info(&self, total_count: u64) -> PaginationInfo {
        let page_size = self.page_size();
        PaginationInfo {
            page: self.page(),
            page_size,
            offset: self.offset(),
            total_count,
            total_pages: total_count.div_ceil(u64::from(page_size)),
        }
    }
}

/// Pagination metadata returned next to a page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub offset: u64,
    /// Matching rows regardless of the page returned
    pub total_count: u64,
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candle(instrument_id: u64, minute: u32) -> Candle {
        Candle {
            instrument_id,
            interval: IntervalType::Minute1,
            start: Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap(),
            open: dec!(1),
            close: dec!(1),
            high: dec!(1),
            low: dec!(1),
            volume: dec!(0),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = CandleQuery::new();
        assert!(query.matches(&candle(1, 0)));
        assert!(query.matches(&candle(42, 59)));
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 9, 10, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 1, 9, 20, 0).unwrap();
        let query = CandleQuery::new()
            .instruments([5, 9])
            .start_between(Some(from), Some(to));

        assert!(query.matches(&candle(5, 10)));
        assert!(query.matches(&candle(9, 20)));
        assert!(!query.matches(&candle(5, 21)));
        assert!(!query.matches(&candle(7, 15)));
        assert!(!query
            .clone()
            .interval(IntervalType::Hour1)
            .matches(&candle(5, 15)));
    }

    #[test]
    fn test_open_ended_range() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let query = CandleQuery::new().start_between(Some(from), None);
        assert!(query.matches(&candle(1, 45)));
        assert!(!query.matches(&candle(1, 29)));
    }

    #[test]
    fn test_compare_uses_directives_in_order() {
        let query = CandleQuery::new()
            .order(OrderBy::desc(OrderColumn::Start))
            .order(OrderBy::asc(OrderColumn::InstrumentId));

        assert_eq!(query.compare(&candle(1, 5), &candle(1, 6)), Ordering::Greater);
        assert_eq!(query.compare(&candle(1, 5), &candle(2, 5)), Ordering::Less);
        assert_eq!(CandleQuery::new().compare(&candle(1, 5), &candle(2, 6)), Ordering::Equal);
    }

    #[test]
    fn test_pagination() {
        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let info = p.info(45);
        assert_eq!(info.total_count, 45);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.offset, 40);

        let zero = Pagination::new(0, 0);
        assert_eq!(zero.page(), 1);
        assert_eq!(zero.page_size(), Pagination::DEFAULT_PAGE_SIZE);
        assert_eq!(zero.offset(), 0);
    }
}
