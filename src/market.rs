use crate::order_book::OrderBook;
use crate::types::{BookEvent, InstrumentId, MarketListener, OrderId, Price, Quantity, Side};
use std::collections::HashMap;
use tracing::{debug, trace};

/// A resting order tracked by a [`Market`].
///
/// The book holds no references to individual orders, only aggregated level
/// quantities; the order record exists solely so the registry can undo the
/// order's contribution to its level on modify, execute, cancel and delete.
/// The record stores the instrument identifier rather than a book reference
/// and is resolved through the registry on each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    instrument: InstrumentId,
    side: Side,
    price: Price,
    remaining_quantity: Quantity,
}

impl Order {
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

    /// Returns the quantity not yet executed or canceled.
    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }
}

/// The single-source order registry: one order book per instrument, one
/// record per resting order, driven by decoded lifecycle events.
///
/// Each order moves through the state machine *absent → resting → absent*;
/// once removed, an identifier cannot resurrect state without an explicit
/// new [`Market::add`]. Re-delivered events for unknown or duplicate
/// identifiers are silent no-ops, reflecting a replay-tolerant feed design.
///
/// Every operation that reaches a book notifies the listener exactly once
/// with `on_update`; executions additionally fire `on_trade` first.
///
/// ### Thread Safety
///
/// No internal locking: the registry is designed to be owned by a single
/// event-processing thread. Callers requiring concurrent access supply their
/// own external synchronization.
///
/// ## Examples
///
/// ```
/// use market_book::{Market, MarketListener, OrderBook, Price, Quantity, Side};
///
/// struct CountingListener {
///     updates: usize,
/// }
///
/// impl MarketListener for CountingListener {
///     fn on_update(&mut self, _book: &OrderBook, _bbo_changed: bool) {
///         self.updates += 1;
///     }
///     fn on_trade(&mut self, _book: &OrderBook, _side: Side, _price: Price, _quantity: Quantity) {}
/// }
///
/// let mut market = Market::new(CountingListener { updates: 0 });
/// market.open(7);
/// market.add(7, 1, Side::Buy, 100, 50);
///
/// assert_eq!(market.book(7).unwrap().best_bid_price(), Some(100));
/// assert_eq!(market.listener().updates, 1);
/// ```
#[derive(Debug)]
pub struct Market<L> {
    /// Open order books, one per instrument, never removed once opened
    books: HashMap<InstrumentId, OrderBook>,
    /// Resting orders by identifier
    orders: HashMap<OrderId, Order>,
    /// Receives update and trade notifications synchronously
    listener: L,
}

impl<L: MarketListener> Market<L> {
    /// Creates an empty market with no open books or resting orders.
    pub fn new(listener: L) -> Self {
        Market {
            books: HashMap::new(),
            orders: HashMap::new(),
            listener,
        }
    }

    /// Opens the order book for an instrument, creating it on first use.
    ///
    /// Idempotent: if the book is already open it is returned unchanged.
    /// Books are never closed or removed once opened.
    pub fn open(&mut self, instrument: InstrumentId) -> &OrderBook {
        self.books.entry(instrument).or_insert_with(|| {
            debug!("market: opening order book for instrument {}", instrument);
            OrderBook::new(instrument)
        })
    }

    /// Returns the order book for an instrument, if it has been opened.
    pub fn book(&self, instrument: InstrumentId) -> Option<&OrderBook> {
        self.books.get(&instrument)
    }

    /// Finds a resting order by identifier.
    pub fn find(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Returns the listener this market notifies.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Adds an order to an order book.
    ///
    /// No-op if the order identifier is already resting (idempotent
    /// re-delivery protection) or if no book is open for the instrument.
    /// Otherwise the order's quantity enters the book, the order is recorded,
    /// and one update notification fires.
    pub fn add(
        &mut self,
        instrument: InstrumentId,
        order_id: OrderId,
        side: Side,
        price: Price,
        size: Quantity,
    ) {
        if self.orders.contains_key(&order_id) {
            trace!("market: ignoring duplicate add for order {}", order_id);
            return;
        }

        let Some(book) = self.books.get_mut(&instrument) else {
            trace!(
                "market: ignoring add for order {} on unopened instrument {}",
                order_id,
                instrument
            );
            return;
        };

        let bbo_changed = book.add(side, price, size);

        self.orders.insert(
            order_id,
            Order {
                instrument,
                side,
                price,
                remaining_quantity: size,
            },
        );

        trace!(
            "market: added order {} ({:?} {} @ {}) to instrument {}",
            order_id,
            side,
            size,
            price,
            instrument
        );

        self.listener.on_update(book, bbo_changed);
    }

    /// Resets an order's size to a new absolute value. The order retains its
    /// place in the book; a new size of zero deletes it.
    ///
    /// No-op if the order identifier is unknown. One update notification
    /// fires, even when the size is unchanged.
    pub fn modify(&mut self, order_id: OrderId, new_size: Quantity) {
        let Some(order) = self.orders.get(&order_id) else {
            return;
        };
        let (instrument, side, price, remaining) = (
            order.instrument,
            order.side,
            order.price,
            order.remaining_quantity,
        );

        let Some(book) = self.books.get_mut(&instrument) else {
            return;
        };

        let bbo_changed = book.update(side, price, new_size as i64 - remaining as i64);

        if new_size == 0 {
            self.orders.remove(&order_id);
        } else if let Some(order) = self.orders.get_mut(&order_id) {
            order.remaining_quantity = new_size;
        }

        trace!(
            "market: modified order {} from {} to {}",
            order_id,
            remaining,
            new_size
        );

        self.listener.on_update(book, bbo_changed);
    }

    /// Executes a quantity of an order at its resting price.
    ///
    /// The executed quantity is capped at the order's remaining quantity;
    /// a fully executed order is removed from the registry. One trade
    /// notification fires before the book mutates, then one update
    /// notification that conservatively always signals a BBO change.
    ///
    /// No-op returning 0 if the order identifier is unknown.
    ///
    /// ## Returns
    ///
    /// The remaining quantity after the execution.
    pub fn execute(&mut self, order_id: OrderId, quantity: Quantity) -> Quantity {
        self.execute_order(order_id, quantity, None)
    }

    /// Executes a quantity of an order at an explicit trade price.
    ///
    /// Identical to [`Market::execute`] except that the trade notification
    /// carries `price` instead of the order's resting price. The book still
    /// mutates at the resting price, where the quantity actually rests.
    pub fn execute_at(&mut self, order_id: OrderId, quantity: Quantity, price: Price) -> Quantity {
        self.execute_order(order_id, quantity, Some(price))
    }

    fn execute_order(
        &mut self,
        order_id: OrderId,
        quantity: Quantity,
        trade_price: Option<Price>,
    ) -> Quantity {
        let Some(order) = self.orders.get(&order_id) else {
            return 0;
        };
        let (instrument, side, resting_price, remaining) = (
            order.instrument,
            order.side,
            order.price,
            order.remaining_quantity,
        );

        let Some(book) = self.books.get_mut(&instrument) else {
            return 0;
        };

        let executed_quantity = quantity.min(remaining);
        let trade_price = trade_price.unwrap_or(resting_price);

        // The trade fires before the book mutates, so listeners observe the
        // pre-trade depth at the executed level.
        self.listener
            .on_trade(book, side.contra(), trade_price, executed_quantity);

        book.update(side, resting_price, -(executed_quantity as i64));

        if executed_quantity == remaining {
            self.orders.remove(&order_id);
        } else if let Some(order) = self.orders.get_mut(&order_id) {
            order.remaining_quantity = remaining - executed_quantity;
        }

        trace!(
            "market: executed {} of order {} at {}",
            executed_quantity,
            order_id,
            trade_price
        );

        self.listener.on_update(book, true);

        remaining - executed_quantity
    }

    /// Cancels a quantity of an order.
    ///
    /// The canceled quantity is capped at the order's remaining quantity; a
    /// fully canceled order is removed from the registry. One update
    /// notification fires with the book's reported BBO flag.
    ///
    /// No-op returning 0 if the order identifier is unknown.
    ///
    /// ## Returns
    ///
    /// The remaining quantity after the cancellation.
    pub fn cancel(&mut self, order_id: OrderId, quantity: Quantity) -> Quantity {
        let Some(order) = self.orders.get(&order_id) else {
            return 0;
        };
        let (instrument, side, price, remaining) = (
            order.instrument,
            order.side,
            order.price,
            order.remaining_quantity,
        );

        let Some(book) = self.books.get_mut(&instrument) else {
            return 0;
        };

        let canceled_quantity = quantity.min(remaining);

        let bbo_changed = book.update(side, price, -(canceled_quantity as i64));

        if canceled_quantity == remaining {
            self.orders.remove(&order_id);
        } else if let Some(order) = self.orders.get_mut(&order_id) {
            order.remaining_quantity = remaining - canceled_quantity;
        }

        trace!(
            "market: canceled {} of order {}",
            canceled_quantity,
            order_id
        );

        self.listener.on_update(book, bbo_changed);

        remaining - canceled_quantity
    }

    /// Deletes an order outright, removing its full remaining quantity from
    /// the book.
    ///
    /// No-op if the order identifier is unknown. One update notification
    /// fires.
    pub fn delete(&mut self, order_id: OrderId) {
        let Some(order) = self.orders.get(&order_id) else {
            return;
        };
        let (instrument, side, price, remaining) = (
            order.instrument,
            order.side,
            order.price,
            order.remaining_quantity,
        );

        let Some(book) = self.books.get_mut(&instrument) else {
            return;
        };

        let bbo_changed = book.update(side, price, -(remaining as i64));

        self.orders.remove(&order_id);

        trace!("market: deleted order {}", order_id);

        self.listener.on_update(book, bbo_changed);
    }

    /// Dispatches a decoded lifecycle event to the matching operation.
    ///
    /// The `source` field of a [`BookEvent::Add`] is ignored here; source
    /// attribution belongs to the multi-source
    /// [`MarketFeed`](crate::MarketFeed).
    pub fn apply(&mut self, event: BookEvent) {
        match event {
            BookEvent::Add {
                instrument,
                order_id,
                side,
                price,
                size,
                ..
            } => self.add(instrument, order_id, side, price, size),
            BookEvent::Modify { order_id, size } => self.modify(order_id, size),
            BookEvent::Execute {
                order_id,
                quantity,
                price: Some(price),
            } => {
                self.execute_at(order_id, quantity, price);
            }
            BookEvent::Execute {
                order_id,
                quantity,
                price: None,
            } => {
                self.execute(order_id, quantity);
            }
            BookEvent::Cancel { order_id, quantity } => {
                self.cancel(order_id, quantity);
            }
            BookEvent::Delete { order_id } => self.delete(order_id),
        }
    }
}
