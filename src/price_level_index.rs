use crate::types::{Price, Quantity, Side, SourceId};
use std::collections::{BTreeMap, HashMap};

/// The aggregate resting quantity stored at one price level.
///
/// Two aggregates exist: a plain scalar quantity for single-source books and
/// a per-source breakdown ([`MultiSourceLevel`]) for aggregate books. The
/// [`PriceLevelIndex`] only needs the total to enforce its level-membership
/// invariant.
pub trait LevelAggregate: Default {
    /// The total resting quantity at this level, summed across all
    /// contributors.
    fn total(&self) -> Quantity;
}

impl LevelAggregate for Quantity {
    fn total(&self) -> Quantity {
        *self
    }
}

/// Per-source quantity breakdown at one price level of an aggregate book.
///
/// An entry exists for a source only while its quantity is strictly positive;
/// the level total is the sum over all sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSourceLevel {
    /// Resting quantity contributed by each source
    sources: HashMap<SourceId, Quantity>,
}

impl MultiSourceLevel {
    /// Returns the quantity contributed by one source, or 0 if the source
    /// has nothing resting at this level.
    pub fn source_size(&self, source: SourceId) -> Quantity {
        self.sources.get(&source).copied().unwrap_or(0)
    }

    /// Applies a signed delta to one source's quantity and returns the
    /// source's new quantity. A result of zero (or a draining delta larger
    /// than the resting quantity) removes the source entry entirely.
    fn apply_source_delta(&mut self, delta: i64, source: SourceId) -> Quantity {
        let old_size = self.source_size(source) as i64;
        let new_size = (old_size + delta).max(0) as Quantity;

        if new_size > 0 {
            self.sources.insert(source, new_size);
        } else {
            self.sources.remove(&source);
        }

        new_size
    }
}

impl LevelAggregate for MultiSourceLevel {
    fn total(&self) -> Quantity {
        self.sources.values().sum()
    }
}

/// An ordered mapping from price to level aggregate for one side of a book.
///
/// The index is ordered so the best price always comes first: descending for
/// the buy side (highest bid first), ascending for the sell side (lowest ask
/// first). A price is present in the index if and only if its aggregate
/// quantity is strictly positive; levels draining to zero are removed
/// immediately, so no zero-quantity levels ever persist.
#[derive(Debug, Clone)]
pub struct PriceLevelIndex<L> {
    /// The side this index orders for
    side: Side,
    /// Price levels keyed by price; the side decides the iteration direction
    levels: BTreeMap<Price, L>,
}

impl<L: LevelAggregate> PriceLevelIndex<L> {
    /// Creates an empty index for one side of a book.
    pub fn new(side: Side) -> Self {
        PriceLevelIndex {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Returns the side this index orders for.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the best resting price, or `None` if no interest rests.
    ///
    /// The best bid is the highest buy price (last key of the map); the best
    /// ask is the lowest sell price (first key). This asymmetry is the heart
    /// of BBO semantics and must not be inverted.
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Returns all resting prices, best first.
    pub fn prices(&self) -> Vec<Price> {
        match self.side {
            Side::Buy => self.levels.keys().rev().copied().collect(),
            Side::Sell => self.levels.keys().copied().collect(),
        }
    }

    /// Returns the aggregate quantity resting at a price, or 0 if the price
    /// is absent. Probing arbitrary prices is always safe.
    pub fn size_at(&self, price: Price) -> Quantity {
        self.levels.get(&price).map(L::total).unwrap_or(0)
    }

    /// Returns the number of distinct resting price levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if no interest rests on this side.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Mutates the level at `price` through `mutate`, materializing an empty
    /// level first if the price is absent and removing the level afterwards
    /// if its total is no longer strictly positive.
    ///
    /// Returns whether the best price is affected: true if the mutated price
    /// is the best price after the mutation, or if the mutation removed the
    /// final level of a previously non-empty side (the removed level was
    /// necessarily the best).
    pub fn apply<F>(&mut self, price: Price, mutate: F) -> bool
    where
        F: FnOnce(&mut L),
    {
        let was_empty = self.levels.is_empty();

        let level = self.levels.entry(price).or_default();
        mutate(level);
        if level.total() == 0 {
            self.levels.remove(&price);
        }

        match self.best_price() {
            Some(best_price) => price == best_price,
            None => !was_empty,
        }
    }
}

impl PriceLevelIndex<Quantity> {
    /// Applies a signed quantity delta to the level at `price`.
    ///
    /// An absent price with a positive delta creates a fresh level; a level
    /// draining to zero or below is removed entirely. Returns whether the
    /// best price is affected, per [`PriceLevelIndex::apply`].
    ///
    /// ## Examples
    ///
    /// ```
    /// use market_book::{PriceLevelIndex, Side};
    ///
    /// let mut bids = PriceLevelIndex::new(Side::Buy);
    /// assert!(bids.apply_delta(100, 50));
    /// assert!(bids.apply_delta(101, 30), "a new best bid changes the BBO");
    /// assert!(!bids.apply_delta(100, 10), "behind the best bid");
    /// assert_eq!(bids.best_price(), Some(101));
    /// assert_eq!(bids.size_at(100), 60);
    /// ```
    pub fn apply_delta(&mut self, price: Price, delta: i64) -> bool {
        self.apply(price, |level| {
            *level = (*level as i64 + delta).max(0) as Quantity;
        })
    }
}

impl PriceLevelIndex<MultiSourceLevel> {
    /// Applies a signed quantity delta to one source's entry at `price`.
    ///
    /// The source entry is dropped when its quantity drains to zero or
    /// below; the level itself is dropped when its total across sources
    /// drains. Returns whether the best price is affected, per
    /// [`PriceLevelIndex::apply`].
    pub fn apply_source_delta(&mut self, price: Price, delta: i64, source: SourceId) -> bool {
        self.apply(price, |level| {
            level.apply_source_delta(delta, source);
        })
    }

    /// Returns the quantity one source has resting at `price`, or 0 if the
    /// price or the source is absent.
    pub fn source_size_at(&self, price: Price, source: SourceId) -> Quantity {
        self.levels
            .get(&price)
            .map(|level| level.source_size(source))
            .unwrap_or(0)
    }
}
