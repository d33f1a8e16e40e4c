use crate::price_level_index::PriceLevelIndex;
use crate::types::{InstrumentId, Price, Quantity, Side};

/// The single-source order book: per-side price levels for one instrument,
/// owned by one venue.
///
/// This structure is responsible only for:
///
/// - Storing the aggregate resting quantity at each price level
/// - Maintaining price priority (best bid/ask)
/// - Reporting whether a mutation affected the best bid or offer
///
/// It holds no references to individual orders; order lifecycle tracking is
/// the job of the [`Market`](crate::Market) registry that drives it.
///
/// ### Thread Safety
///
/// No internal locking: the book is designed for a single writer thread per
/// instrument. Callers needing concurrent access wrap it in a `RwLock`, with
/// the write lock held only for the brief duration of a mutation.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// The instrument this book carries resting interest for
    instrument: InstrumentId,
    /// Bid side (buy orders): best price is the highest
    bids: PriceLevelIndex<Quantity>,
    /// Ask side (sell orders): best price is the lowest
    asks: PriceLevelIndex<Quantity>,
}

impl OrderBook {
    /// Creates a new empty order book for an instrument.
    ///
    /// ## Examples
    ///
    /// ```
    /// use market_book::OrderBook;
    ///
    /// let order_book = OrderBook::new(7);
    /// assert_eq!(order_book.instrument(), 7);
    /// ```
    pub fn new(instrument: InstrumentId) -> Self {
        OrderBook {
            instrument,
            bids: PriceLevelIndex::new(Side::Buy),
            asks: PriceLevelIndex::new(Side::Sell),
        }
    }

    /// Returns the instrument this book belongs to.
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    /// Adds resting quantity at a price level, creating the level if needed.
    ///
    /// Equivalent to [`OrderBook::update`] with a positive delta.
    ///
    /// ## Returns
    ///
    /// Whether the best bid or offer changed as a result.
    ///
    /// ## Examples
    ///
    /// ```
    /// use market_book::{OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new(1);
    /// let bbo_changed = order_book.add(Side::Buy, 100, 50);
    /// assert!(bbo_changed, "first level on a side is the new best");
    /// assert_eq!(order_book.best_bid_price(), Some(100));
    /// ```
    pub fn add(&mut self, side: Side, price: Price, quantity: Quantity) -> bool {
        self.update(side, price, quantity as i64)
    }

    /// Applies a signed quantity delta at a price level.
    ///
    /// A level draining to zero or below is removed; no zero-quantity levels
    /// persist.
    ///
    /// ## Returns
    ///
    /// Whether the best bid or offer changed as a result.
    pub fn update(&mut self, side: Side, price: Price, delta: i64) -> bool {
        self.side_levels_mut(side).apply_delta(price, delta)
    }

    /// Computes the current best bid price, or `None` when no buy interest
    /// rests.
    pub fn best_bid_price(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Computes the current best ask price, or `None` when no sell interest
    /// rests.
    pub fn best_ask_price(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Returns all resting bid prices, highest first.
    pub fn bid_prices(&self) -> Vec<Price> {
        self.bids.prices()
    }

    /// Returns all resting ask prices, lowest first.
    pub fn ask_prices(&self) -> Vec<Price> {
        self.asks.prices()
    }

    /// Returns the aggregate quantity resting at a bid price, or 0 if none.
    pub fn bid_size(&self, price: Price) -> Quantity {
        self.bids.size_at(price)
    }

    /// Returns the aggregate quantity resting at an ask price, or 0 if none.
    pub fn ask_size(&self, price: Price) -> Quantity {
        self.asks.size_at(price)
    }

    /// Returns the number of distinct price levels on the given side.
    pub fn levels_count(&self, side: Side) -> usize {
        self.side_levels(side).len()
    }

    /// Returns true if neither side carries any resting interest.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    fn side_levels(&self, side: Side) -> &PriceLevelIndex<Quantity> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_levels_mut(&mut self, side: Side) -> &mut PriceLevelIndex<Quantity> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}
