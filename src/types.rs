use crate::order_book::OrderBook;

/// An opaque identifier naming a tradable instrument. One book exists per
/// instrument, created lazily by [`Market::open`](crate::Market::open) or
/// [`MarketFeed::open`](crate::MarketFeed::open).
pub type InstrumentId = u64;

/// A globally unique identifier for a resting order.
pub type OrderId = u64;

/// An integer price in ticks.
pub type Price = u64;

/// A resting quantity at a price level or on an order.
pub type Quantity = u64;

/// An identifier for the originating feed contributing quantity to a
/// multi-source price level.
pub type SourceId = u32;

/// Represents the side of an order in the order book.
///
/// - `Buy` represents bid orders (demand side)
/// - `Sell` represents ask orders (supply side)
///
/// The side determines the ordering of its price index: buy levels are sorted
/// descending by price (highest bid first) while sell levels are sorted
/// ascending (lowest ask first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side: traders willing to purchase at a given price
    Buy,
    /// Sell side: traders willing to sell at a given price
    Sell,
}

impl Side {
    /// Returns the opposite side, used when reporting the aggressor side of
    /// a trade against a resting order.
    ///
    /// ## Examples
    ///
    /// ```
    /// use market_book::Side;
    ///
    /// assert_eq!(Side::Buy.contra(), Side::Sell);
    /// assert_eq!(Side::Sell.contra(), Side::Buy);
    /// ```
    pub fn contra(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// A decoded order lifecycle event, as produced by a wire-level decoder.
///
/// The book core consumes these typed events and makes no assumption about
/// framing, encoding, or transport. See [`Market::apply`](crate::Market::apply)
/// for dispatching an event to the matching lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookEvent {
    /// A new order enters the book.
    Add {
        /// The instrument the order rests on
        instrument: InstrumentId,
        /// The globally unique order identifier
        order_id: OrderId,
        /// Whether the order bids or offers
        side: Side,
        /// The limit price in ticks
        price: Price,
        /// The order quantity
        size: Quantity,
        /// The originating feed, for multi-source books only
        source: Option<SourceId>,
    },
    /// An order's size is reset to a new absolute value.
    Modify {
        /// The order identifier
        order_id: OrderId,
        /// The new total size (zero deletes the order)
        size: Quantity,
    },
    /// A quantity of an order is executed against.
    Execute {
        /// The order identifier
        order_id: OrderId,
        /// The executed quantity
        quantity: Quantity,
        /// The execution price, or `None` to trade at the resting price
        price: Option<Price>,
    },
    /// A quantity of an order is canceled.
    Cancel {
        /// The order identifier
        order_id: OrderId,
        /// The canceled quantity
        quantity: Quantity,
    },
    /// An order is removed outright.
    Delete {
        /// The order identifier
        order_id: OrderId,
    },
}

/// A listener for outbound events from a [`Market`](crate::Market).
///
/// Both callbacks are invoked synchronously, in-line with the triggering
/// lifecycle call, never deferred or batched. Every lifecycle operation
/// that reaches a book fires exactly one `on_update`; an execution
/// additionally fires `on_trade` immediately before its `on_update`.
pub trait MarketListener {
    /// An order book has changed.
    ///
    /// `bbo_changed` indicates whether the best bid or offer on the mutated
    /// side may have moved.
    fn on_update(&mut self, book: &OrderBook, bbo_changed: bool);

    /// A trade has occurred.
    ///
    /// `side` is the side of the incoming (aggressing) order, i.e. the contra
    /// side of the resting order that was executed against.
    fn on_trade(&mut self, book: &OrderBook, side: Side, price: Price, quantity: Quantity);
}
