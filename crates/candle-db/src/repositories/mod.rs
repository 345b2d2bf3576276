mod candle;

pub use candle::CandleRepository;
