//! Domain types: bars, market data, signals, positions, trades, portfolio.

pub mod bar;
pub mod market;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use market::MarketData;
pub use portfolio::{EquityPoint, PortfolioState};
pub use position::{Position, PositionSide};
pub use signal::{
    Classification, CompositeSignal, Contribution, SignalDetail, SignalDirection, StrategySignal,
};
pub use trade::{ExitReason, Trade};
