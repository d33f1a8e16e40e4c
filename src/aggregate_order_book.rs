use crate::price_level_index::{MultiSourceLevel, PriceLevelIndex};
use crate::types::{InstrumentId, Price, Quantity, Side, SourceId};
use parking_lot::RwLock;

/// The aggregate, multi-source order book: quantities at each price level are
/// broken down by originating source, merging several venue feeds into one
/// consolidated view.
///
/// ## Thread Safety
///
/// The bid and ask indexes are protected by separate `RwLock`s, so the two
/// sides never block each other. Readers can run concurrently on a side;
/// a writer excludes all readers and other writers on that side. Lock
/// acquisition always blocks until the lock is held, and the RAII guards
/// release it on every exit path. This structure can be safely shared across
/// threads as `Arc<AggregateOrderBook>`.
///
/// Note that no atomicity is provided *across* sides: a reader combining
/// `best_bid_price` and `best_ask_price` may observe one side's update
/// together with a stale view of the other.
///
/// ## Examples
///
/// ```
/// use market_book::{AggregateOrderBook, Side};
///
/// let book = AggregateOrderBook::new(9);
/// book.add(Side::Buy, 100, 10, 1);
/// book.add(Side::Buy, 100, 5, 2);
///
/// assert_eq!(book.best_bid_price(), 100);
/// assert_eq!(book.bid_size(100), 15, "sizes aggregate across sources");
/// ```
#[derive(Debug)]
pub struct AggregateOrderBook {
    /// The instrument this book consolidates feeds for
    instrument: InstrumentId,
    /// Bid side levels with per-source breakdown, under their own lock
    bids: RwLock<PriceLevelIndex<MultiSourceLevel>>,
    /// Ask side levels with per-source breakdown, under their own lock
    asks: RwLock<PriceLevelIndex<MultiSourceLevel>>,
}

impl AggregateOrderBook {
    /// Creates a new empty aggregate order book for an instrument.
    pub fn new(instrument: InstrumentId) -> Self {
        AggregateOrderBook {
            instrument,
            bids: RwLock::new(PriceLevelIndex::new(Side::Buy)),
            asks: RwLock::new(PriceLevelIndex::new(Side::Sell)),
        }
    }

    /// Returns the instrument this book belongs to.
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    /// Adds resting quantity for one source at a price level, creating the
    /// level and the source entry as needed.
    ///
    /// ## Returns
    ///
    /// Whether the mutated price is now the best price on its side.
    pub fn add(&self, side: Side, price: Price, quantity: Quantity, source: SourceId) -> bool {
        self.update(side, price, quantity as i64, source)
    }

    /// Applies a signed quantity delta to one source's entry at a price
    /// level.
    ///
    /// This method accepts *deltas only*; callers holding an absolute new
    /// size compute the delta against [`AggregateOrderBook::source_size`]
    /// before calling. A source draining to zero or below is dropped from
    /// the level; a level whose total then drains is removed entirely.
    ///
    /// ## Returns
    ///
    /// Whether the mutated price is now the best price on its side.
    pub fn update(&self, side: Side, price: Price, delta: i64, source: SourceId) -> bool {
        self.side_levels(side)
            .write()
            .apply_source_delta(price, delta, source)
    }

    /// Returns the best bid price, or the sentinel 0 when no buy interest
    /// rests.
    pub fn best_bid_price(&self) -> Price {
        self.bids.read().best_price().unwrap_or(0)
    }

    /// Returns the best ask price, or the sentinel 0 when no sell interest
    /// rests.
    pub fn best_ask_price(&self) -> Price {
        self.asks.read().best_price().unwrap_or(0)
    }

    /// Returns all resting bid prices, highest first.
    pub fn bid_prices(&self) -> Vec<Price> {
        self.bids.read().prices()
    }

    /// Returns all resting ask prices, lowest first.
    pub fn ask_prices(&self) -> Vec<Price> {
        self.asks.read().prices()
    }

    /// Returns the aggregate quantity across all sources resting at a bid
    /// price, or 0 if the price is absent. Probing arbitrary prices never
    /// fails.
    pub fn bid_size(&self, price: Price) -> Quantity {
        self.bids.read().size_at(price)
    }

    /// Returns the aggregate quantity across all sources resting at an ask
    /// price, or 0 if the price is absent.
    pub fn ask_size(&self, price: Price) -> Quantity {
        self.asks.read().size_at(price)
    }

    /// Returns the quantity one source has resting at a price, or 0 if the
    /// price or source is absent.
    pub fn source_size(&self, side: Side, price: Price, source: SourceId) -> Quantity {
        self.side_levels(side).read().source_size_at(price, source)
    }

    /// Returns the number of distinct price levels on the given side.
    pub fn levels_count(&self, side: Side) -> usize {
        self.side_levels(side).read().len()
    }

    fn side_levels(&self, side: Side) -> &RwLock<PriceLevelIndex<MultiSourceLevel>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }
}
