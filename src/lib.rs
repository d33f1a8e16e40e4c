//! An in-memory order book core for a trading venue: per-instrument price
//! levels, order lifecycle tracking, and best-bid/offer (BBO) change
//! reporting, with both a single-source and an aggregate multi-source book.
//!
//! ## Architecture
//!
//! The crate separates concerns into leaf-first components:
//!
//! 1. [`PriceLevelIndex`]: one side's ordered price levels, best price first
//! 2. [`OrderBook`]: the single-source book, two indexes with scalar levels
//! 3. [`AggregateOrderBook`]: the multi-source book, per-source level
//!    breakdown under one reader/writer lock per side
//! 4. [`Market`]: the order registry driving an [`OrderBook`] per decoded
//!    lifecycle event and notifying a [`MarketListener`]
//! 5. [`MarketFeed`]: the multi-source registry driving an
//!    [`AggregateOrderBook`], with optional per-order tracking
//!
//! Decoded external events flow through a registry into price-level
//! mutations, which report whether the top of book moved; the registry
//! forwards that flag to its listener.
//!
//! ## Example Usage
//!
//! ```rust
//! use market_book::{Market, MarketListener, OrderBook, Price, Quantity, Side};
//!
//! struct PrintingListener;
//!
//! impl MarketListener for PrintingListener {
//!     fn on_update(&mut self, book: &OrderBook, bbo_changed: bool) {
//!         if bbo_changed {
//!             println!(
//!                 "instrument {}: best bid now {:?}",
//!                 book.instrument(),
//!                 book.best_bid_price()
//!             );
//!         }
//!     }
//!     fn on_trade(&mut self, _book: &OrderBook, side: Side, price: Price, quantity: Quantity) {
//!         println!("trade: {:?} {} @ {}", side, quantity, price);
//!     }
//! }
//!
//! let mut market = Market::new(PrintingListener);
//! market.open(7);
//!
//! market.add(7, 1, Side::Buy, 100, 50);
//! market.add(7, 2, Side::Buy, 101, 30);
//! assert_eq!(market.book(7).unwrap().best_bid_price(), Some(101));
//!
//! // An externally decided execution against order 2 empties its level
//! // and the best bid reverts.
//! market.execute(2, 30);
//! assert_eq!(market.book(7).unwrap().best_bid_price(), Some(100));
//! ```
//!
//! ## Concurrency
//!
//! The single-source [`OrderBook`] and both registries are single-writer
//! structures with no internal locking; one event-processing thread owns
//! them, or callers wrap them in a lock of their choosing. The
//! [`AggregateOrderBook`] carries its own `parking_lot::RwLock` per side, so
//! best-price and depth readers fan out concurrently while writers are
//! serialized per side; the two sides never block each other.

mod aggregate_order_book;
mod market;
mod market_feed;
mod order_book;
mod price_level_index;
mod types;

// Re-export public API
pub use aggregate_order_book::AggregateOrderBook;
pub use market::{Market, Order};
pub use market_feed::{MarketFeed, MultiSourceOrder};
pub use order_book::OrderBook;
pub use price_level_index::{LevelAggregate, MultiSourceLevel, PriceLevelIndex};
pub use types::{
    BookEvent, InstrumentId, MarketListener, OrderId, Price, Quantity, Side, SourceId,
};

// Re-export the locking primitive single-source callers wrap their books in
pub use parking_lot::RwLock;
