use crate::aggregate_order_book::AggregateOrderBook;
use crate::types::{InstrumentId, OrderId, Price, Quantity, Side, SourceId};
use std::collections::HashMap;
use tracing::{debug, trace};

/// A resting order tracked by a [`MarketFeed`], tagged with its originating
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiSourceOrder {
    instrument: InstrumentId,
    side: Side,
    price: Price,
    source: SourceId,
    remaining_quantity: Quantity,
}

impl MultiSourceOrder {
    /// Returns the instrument whose book this order rests on.
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    /// Returns the side of this order.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the resting price of this order.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns the feed this order originated from.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Returns the quantity not yet removed from the book.
    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }
}

/// The multi-source order registry: one [`AggregateOrderBook`] per
/// instrument, consolidating several venue feeds, with optional per-order
/// tracking.
///
/// Some feeds report discrete orders with identifiers; others report bare
/// level deltas. Both are supported: an add or modify without an order
/// identifier updates the book directly and keeps no order record.
///
/// Unlike [`Market`](crate::Market) there is no notification plumbing at
/// this layer, and no execute semantics: per-source executions are modeled
/// as modify sequences by the feed collaborator.
///
/// ### Thread Safety
///
/// The registry itself is single-writer like [`Market`](crate::Market); the
/// aggregate books it drives carry their own per-side locks for the
/// concurrent-read fan-out.
#[derive(Debug, Default)]
pub struct MarketFeed {
    /// Aggregate books, one per instrument, never removed once opened
    books: HashMap<InstrumentId, AggregateOrderBook>,
    /// Resting orders by identifier, for feeds that supply identifiers
    orders: HashMap<OrderId, MultiSourceOrder>,
}

impl MarketFeed {
    /// Creates an empty feed registry with no open books or resting orders.
    pub fn new() -> Self {
        MarketFeed {
            books: HashMap::new(),
            orders: HashMap::new(),
        }
    }

    /// Opens the aggregate order book for an instrument, creating it on
    /// first use. Idempotent; books are never removed once opened.
    pub fn open(&mut self, instrument: InstrumentId) -> &AggregateOrderBook {
        self.books.entry(instrument).or_insert_with(|| {
            debug!(
                "market feed: opening aggregate book for instrument {}",
                instrument
            );
            AggregateOrderBook::new(instrument)
        })
    }

    /// Returns the aggregate book for an instrument, if it has been opened.
    pub fn book(&self, instrument: InstrumentId) -> Option<&AggregateOrderBook> {
        self.books.get(&instrument)
    }

    /// Finds a resting order by identifier.
    pub fn find(&self, order_id: OrderId) -> Option<&MultiSourceOrder> {
        self.orders.get(&order_id)
    }

    /// Adds quantity from one source to an aggregate book, optionally
    /// tracking it as a discrete order.
    ///
    /// With `order_id: None` the book is updated but no order record is
    /// kept, supporting feeds that report level deltas without identifiers.
    /// The idempotency check applies only when an identifier is supplied.
    /// No-op if no book is open for the instrument.
    pub fn add(
        &mut self,
        instrument: InstrumentId,
        order_id: Option<OrderId>,
        side: Side,
        price: Price,
        size: Quantity,
        source: SourceId,
    ) {
        if let Some(order_id) = order_id {
            if self.orders.contains_key(&order_id) {
                trace!("market feed: ignoring duplicate add for order {}", order_id);
                return;
            }
        }

        let Some(book) = self.books.get(&instrument) else {
            trace!(
                "market feed: ignoring add on unopened instrument {}",
                instrument
            );
            return;
        };

        book.add(side, price, size, source);

        if let Some(order_id) = order_id {
            self.orders.insert(
                order_id,
                MultiSourceOrder {
                    instrument,
                    side,
                    price,
                    source,
                    remaining_quantity: size,
                },
            );
        }

        trace!(
            "market feed: added {:?} {} @ {} from source {} on instrument {}",
            side,
            size,
            price,
            source,
            instrument
        );
    }

    /// Resets a source's resting quantity to a new absolute value.
    ///
    /// The aggregate book mutates only through signed deltas, so this method
    /// computes the delta explicitly: for a tracked order against the
    /// order's remaining quantity, targeting the order's recorded side and
    /// price; for an untracked modify against the book's current per-source
    /// quantity at the given side and price. A tracked order modified to
    /// zero is removed from the registry.
    ///
    /// No-op if a supplied order identifier is unknown or no book is open
    /// for the instrument.
    pub fn modify(
        &mut self,
        instrument: InstrumentId,
        order_id: Option<OrderId>,
        side: Side,
        price: Price,
        size: Quantity,
        source: SourceId,
    ) {
        let Some(book) = self.books.get(&instrument) else {
            trace!(
                "market feed: ignoring modify on unopened instrument {}",
                instrument
            );
            return;
        };

        match order_id {
            Some(order_id) => {
                let Some(order) = self.orders.get(&order_id) else {
                    return;
                };
                let (order_side, order_price, order_source, remaining) =
                    (order.side, order.price, order.source, order.remaining_quantity);

                book.update(
                    order_side,
                    order_price,
                    size as i64 - remaining as i64,
                    order_source,
                );

                if size == 0 {
                    self.orders.remove(&order_id);
                } else if let Some(order) = self.orders.get_mut(&order_id) {
                    order.remaining_quantity = size;
                }

                trace!(
                    "market feed: modified order {} from {} to {}",
                    order_id,
                    remaining,
                    size
                );
            }
            None => {
                // Replace semantics for identifier-less feeds, expressed as
                // an explicit delta against the source's current quantity.
                let current = book.source_size(side, price, source);
                book.update(side, price, size as i64 - current as i64, source);

                trace!(
                    "market feed: set source {} to {} at {:?} {} on instrument {}",
                    source,
                    size,
                    side,
                    price,
                    instrument
                );
            }
        }
    }
}
