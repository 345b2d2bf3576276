pub mod candles;

pub use candles::MemoryCandleStore;
