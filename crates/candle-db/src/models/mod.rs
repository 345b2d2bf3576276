mod candle;

pub use candle::DbCandle;
