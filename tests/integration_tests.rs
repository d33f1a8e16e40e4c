use market_book::{
    AggregateOrderBook, InstrumentId, Market, MarketFeed, MarketListener, OrderBook, Price,
    Quantity, Side,
};
use std::sync::Arc;

/// One notification observed by the recording listener, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notification {
    Update {
        instrument: InstrumentId,
        bbo_changed: bool,
    },
    Trade {
        instrument: InstrumentId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
}

/// A listener that records every notification for later inspection.
#[derive(Default)]
struct RecordingListener {
    notifications: Vec<Notification>,
}

impl MarketListener for RecordingListener {
    fn on_update(&mut self, book: &OrderBook, bbo_changed: bool) {
        self.notifications.push(Notification::Update {
            instrument: book.instrument(),
            bbo_changed,
        });
    }

    fn on_trade(&mut self, book: &OrderBook, side: Side, price: Price, quantity: Quantity) {
        self.notifications.push(Notification::Trade {
            instrument: book.instrument(),
            side,
            price,
            quantity,
        });
    }
}

fn new_market() -> Market<RecordingListener> {
    Market::new(RecordingListener::default())
}

#[test]
/// Walk the full single-source lifecycle: add, add a better bid, execute it
/// away, cancel the rest, and verify best prices and notifications at each
/// step.
fn test_single_source_lifecycle_scenario() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Buy, 100, 50);
    let book = market.book(7).unwrap();
    assert_eq!(book.best_bid_price(), Some(100), "Best bid should be 100");
    assert_eq!(book.bid_size(100), 50, "Size at 100 should be 50");

    market.add(7, 2, Side::Buy, 101, 30);
    let book = market.book(7).unwrap();
    assert_eq!(
        book.best_bid_price(),
        Some(101),
        "Best bid should improve to 101"
    );
    assert_eq!(book.bid_size(101), 30, "Size at 101 should be 30");
    assert_eq!(
        market.listener().notifications.last(),
        Some(&Notification::Update {
            instrument: 7,
            bbo_changed: true
        }),
        "A new best bid must signal a BBO change"
    );

    let remaining = market.execute(2, 30);
    assert_eq!(remaining, 0, "Order 2 should be fully executed");
    let book = market.book(7).unwrap();
    assert_eq!(
        book.best_bid_price(),
        Some(100),
        "Best bid should revert to 100 after the execution"
    );
    assert!(market.find(2).is_none(), "Order 2 should be removed");

    // The trade fires before its update and carries the contra side
    let notification_count = market.listener().notifications.len();
    assert_eq!(
        &market.listener().notifications[notification_count - 2..],
        &[
            Notification::Trade {
                instrument: 7,
                side: Side::Sell,
                price: 101,
                quantity: 30
            },
            Notification::Update {
                instrument: 7,
                bbo_changed: true
            },
        ],
        "Execution must fire a trade, then an update with bbo_changed=true"
    );

    let remaining = market.cancel(1, 50);
    assert_eq!(remaining, 0, "Order 1 should be fully canceled");
    assert!(market.find(1).is_none(), "Order 1 should be removed");
    let book = market.book(7).unwrap();
    assert!(book.is_empty(), "Book should be empty");
    assert_eq!(
        book.best_bid_price(),
        None,
        "Best bid should be the empty sentinel"
    );
}

#[test]
/// A price is present in an index if and only if its aggregate quantity is
/// strictly positive.
fn test_level_membership_invariant() {
    let mut book = OrderBook::new(1);

    book.add(Side::Buy, 100, 10);
    book.add(Side::Buy, 100, 15);
    book.add(Side::Buy, 99, 5);
    book.add(Side::Sell, 102, 20);

    assert_eq!(book.bid_size(100), 25, "Adds at one price accumulate");
    assert_eq!(book.bid_prices(), vec![100, 99], "Bids are best-first");
    assert_eq!(book.ask_prices(), vec![102]);

    // Draining a level removes it entirely; over-draining must not leave a
    // negative level behind
    book.update(Side::Buy, 100, -25);
    assert_eq!(book.bid_size(100), 0, "Drained level reports zero");
    assert_eq!(
        book.bid_prices(),
        vec![99],
        "Drained level must leave the index"
    );

    book.update(Side::Buy, 99, -50);
    assert_eq!(book.bid_prices(), Vec::<Price>::new());
    assert_eq!(book.best_bid_price(), None);
    assert_eq!(
        book.best_ask_price(),
        Some(102),
        "Ask side is untouched by bid mutations"
    );
}

#[test]
/// Best bid is always the greatest resting bid price; best ask is always the
/// least resting ask price.
fn test_best_price_ordering() {
    let mut book = OrderBook::new(1);

    for price in [97, 103, 100, 99, 101] {
        book.add(Side::Buy, price, 1);
        book.add(Side::Sell, price + 10, 1);
    }

    assert_eq!(book.best_bid_price(), Some(103));
    assert_eq!(book.best_ask_price(), Some(107));
    assert_eq!(book.bid_prices(), vec![103, 101, 100, 99, 97]);
    assert_eq!(book.ask_prices(), vec![107, 109, 110, 111, 113]);
}

#[test]
/// A BBO change is reported only when the mutated price sits at the top of
/// its side.
fn test_bbo_change_reporting() {
    let mut book = OrderBook::new(1);

    assert!(
        book.add(Side::Buy, 100, 10),
        "First level on a side is the best"
    );
    assert!(
        !book.add(Side::Buy, 99, 10),
        "A level behind the best does not move the BBO"
    );
    assert!(
        book.add(Side::Buy, 100, 5),
        "More quantity inside the best level affects the advertised top"
    );
    assert!(
        !book.update(Side::Buy, 99, -10),
        "Removing a level behind the best does not move the BBO"
    );
    assert!(
        book.update(Side::Buy, 100, -15),
        "Removing the final level empties the side and moves the BBO"
    );
}

#[test]
/// Adding the same order identifier twice leaves the book exactly as after
/// the first add.
fn test_add_idempotency() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Buy, 100, 50);
    // Re-delivery with different fields must not touch book or order
    market.add(7, 1, Side::Buy, 105, 99);

    let book = market.book(7).unwrap();
    assert_eq!(book.best_bid_price(), Some(100));
    assert_eq!(book.bid_size(100), 50);
    assert_eq!(book.bid_size(105), 0, "The duplicate add must be a no-op");
    assert_eq!(
        market.find(1).unwrap().remaining_quantity(),
        50,
        "The original order is left untouched"
    );
    assert_eq!(
        market.listener().notifications.len(),
        1,
        "A no-op add emits no notification"
    );
}

#[test]
/// Lifecycle calls for an unopened instrument are silent no-ops; only `open`
/// creates books.
fn test_unknown_instrument_is_noop() {
    let mut market = new_market();

    market.add(42, 1, Side::Buy, 100, 50);

    assert!(market.book(42).is_none(), "No book is created implicitly");
    assert!(market.find(1).is_none(), "No order is recorded");
    assert!(market.listener().notifications.is_empty());
}

#[test]
/// `open` is idempotent and never discards resting state.
fn test_open_idempotency() {
    let mut market = new_market();
    market.open(7);
    market.add(7, 1, Side::Buy, 100, 50);

    let book = market.open(7);
    assert_eq!(
        book.bid_size(100),
        50,
        "Reopening must return the existing book unchanged"
    );
}

#[test]
/// Remaining quantity equals the initial size minus executions and
/// cancellations, adjusted by modify resets, and the order disappears at
/// zero.
fn test_quantity_conservation() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Sell, 105, 100);

    assert_eq!(market.execute(1, 30), 70);
    assert_eq!(market.find(1).unwrap().remaining_quantity(), 70);

    assert_eq!(market.cancel(1, 20), 50);
    assert_eq!(market.find(1).unwrap().remaining_quantity(), 50);
    assert_eq!(
        market.book(7).unwrap().ask_size(105),
        50,
        "Book level tracks the order's remaining quantity"
    );

    market.modify(1, 80);
    assert_eq!(market.find(1).unwrap().remaining_quantity(), 80);
    assert_eq!(market.book(7).unwrap().ask_size(105), 80);

    // Execution requests are capped at the remaining quantity
    assert_eq!(market.execute(1, 1000), 0);
    assert!(market.find(1).is_none(), "Fully executed order is removed");
    assert!(market.book(7).unwrap().is_empty());
}

#[test]
/// Once removed, an identifier is terminal: every further lifecycle call is
/// a no-op with a zero result and no notification.
fn test_terminal_order_identifier() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Buy, 100, 50);
    market.delete(1);
    assert!(market.find(1).is_none());

    let notification_count = market.listener().notifications.len();

    market.modify(1, 10);
    assert_eq!(market.execute(1, 10), 0);
    assert_eq!(market.cancel(1, 10), 0);
    market.delete(1);

    assert!(
        market.find(1).is_none(),
        "A removed identifier must not resurrect"
    );
    assert!(market.book(7).unwrap().is_empty());
    assert_eq!(
        market.listener().notifications.len(),
        notification_count,
        "No-op lifecycle calls emit no notifications"
    );
}

#[test]
/// Modify resets the remaining quantity, removes the order at zero, and
/// fires an update even when nothing changes.
fn test_modify_semantics() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Buy, 100, 50);

    // Modify to the same size still fires exactly one update
    let before = market.listener().notifications.len();
    market.modify(1, 50);
    assert_eq!(
        market.listener().notifications.len(),
        before + 1,
        "A same-size modify still fires an update"
    );
    assert_eq!(market.book(7).unwrap().bid_size(100), 50);

    market.modify(1, 20);
    assert_eq!(market.find(1).unwrap().remaining_quantity(), 20);
    assert_eq!(market.book(7).unwrap().bid_size(100), 20);

    market.modify(1, 0);
    assert!(market.find(1).is_none(), "Modify to zero deletes the order");
    assert!(market.book(7).unwrap().is_empty());
}

#[test]
/// An explicit execution price goes out on the trade notification while the
/// book still mutates at the resting price.
fn test_execute_at_explicit_price() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Sell, 105, 40);
    let remaining = market.execute_at(1, 15, 104);
    assert_eq!(remaining, 25);

    let notifications = &market.listener().notifications;
    assert_eq!(
        notifications[notifications.len() - 2],
        Notification::Trade {
            instrument: 7,
            side: Side::Buy,
            price: 104,
            quantity: 15
        },
        "The trade carries the explicit price and the contra side"
    );
    assert_eq!(
        market.book(7).unwrap().ask_size(105),
        25,
        "The book mutates at the resting price"
    );
}

#[test]
/// Partial cancels behind the best price report no BBO change.
fn test_cancel_behind_best_price() {
    let mut market = new_market();
    market.open(7);

    market.add(7, 1, Side::Buy, 100, 50);
    market.add(7, 2, Side::Buy, 101, 30);

    market.cancel(1, 10);
    assert_eq!(
        market.listener().notifications.last(),
        Some(&Notification::Update {
            instrument: 7,
            bbo_changed: false
        }),
        "Canceling behind the best bid must not signal a BBO change"
    );
    assert_eq!(market.book(7).unwrap().bid_size(100), 40);
}

#[test]
/// Decoded events dispatch to the same operations as direct calls.
fn test_event_dispatch() {
    use market_book::BookEvent;

    let mut market = new_market();
    market.open(7);

    market.apply(BookEvent::Add {
        instrument: 7,
        order_id: 1,
        side: Side::Buy,
        price: 100,
        size: 50,
        source: None,
    });
    market.apply(BookEvent::Execute {
        order_id: 1,
        quantity: 10,
        price: Some(101),
    });
    market.apply(BookEvent::Cancel {
        order_id: 1,
        quantity: 15,
    });
    market.apply(BookEvent::Modify {
        order_id: 1,
        size: 5,
    });
    market.apply(BookEvent::Delete { order_id: 1 });

    assert!(market.find(1).is_none());
    assert!(market.book(7).unwrap().is_empty());
    assert!(market
        .listener()
        .notifications
        .contains(&Notification::Trade {
            instrument: 7,
            side: Side::Sell,
            price: 101,
            quantity: 10
        }));
}

#[test]
/// Quantities at an aggregate level sum across sources, and draining one
/// source leaves the others resting.
fn test_aggregate_multi_source_scenario() {
    let book = AggregateOrderBook::new(9);

    book.add(Side::Buy, 100, 10, 1);
    book.add(Side::Buy, 100, 5, 2);
    assert_eq!(
        book.bid_size(100),
        15,
        "Bid size should aggregate across sources"
    );

    // Over-draining source 1 removes its entry; source 2 remains
    book.update(Side::Buy, 100, -15, 1);
    assert_eq!(book.source_size(Side::Buy, 100, 1), 0);
    assert_eq!(
        book.bid_size(100),
        5,
        "Only source 2's quantity should remain"
    );

    // Draining the last source removes the level
    book.update(Side::Buy, 100, -5, 2);
    assert_eq!(book.bid_size(100), 0);
    assert_eq!(book.levels_count(Side::Buy), 0);
    assert_eq!(
        book.best_bid_price(),
        0,
        "Empty side reports the 0 sentinel"
    );
}

#[test]
/// Aggregate best prices use the 0 sentinel and size probes never fail on
/// absent prices.
fn test_aggregate_query_surface() {
    let book = AggregateOrderBook::new(9);

    assert_eq!(book.best_bid_price(), 0);
    assert_eq!(book.best_ask_price(), 0);
    assert_eq!(book.bid_size(12345), 0, "Probing an absent price is safe");
    assert_eq!(book.ask_size(0), 0);

    book.add(Side::Buy, 100, 10, 1);
    book.add(Side::Buy, 99, 10, 1);
    book.add(Side::Sell, 102, 10, 2);
    book.add(Side::Sell, 104, 10, 2);

    assert_eq!(book.best_bid_price(), 100);
    assert_eq!(book.best_ask_price(), 102);
    assert_eq!(book.bid_prices(), vec![100, 99]);
    assert_eq!(book.ask_prices(), vec![102, 104]);
}

#[test]
/// The feed registry tracks orders when an identifier is supplied and
/// mutates the aggregate book through explicit deltas on modify.
fn test_feed_tracked_orders() {
    let mut feed = MarketFeed::new();
    feed.open(5);

    feed.add(5, Some(11), Side::Buy, 100, 30, 2);
    assert_eq!(feed.find(11).unwrap().remaining_quantity(), 30);
    assert_eq!(feed.book(5).unwrap().bid_size(100), 30);

    // Duplicate identifier is a no-op
    feed.add(5, Some(11), Side::Buy, 100, 99, 2);
    assert_eq!(feed.book(5).unwrap().bid_size(100), 30);

    // Modify down to 10: the book moves by the delta, not the absolute size
    feed.modify(5, Some(11), Side::Buy, 100, 10, 2);
    assert_eq!(feed.find(11).unwrap().remaining_quantity(), 10);
    assert_eq!(feed.book(5).unwrap().bid_size(100), 10);

    // Modify to zero removes the record and the level
    feed.modify(5, Some(11), Side::Buy, 100, 0, 2);
    assert!(feed.find(11).is_none());
    assert_eq!(feed.book(5).unwrap().bid_size(100), 0);
    assert_eq!(feed.book(5).unwrap().levels_count(Side::Buy), 0);

    // Unknown identifier is a no-op
    feed.modify(5, Some(99), Side::Buy, 100, 10, 2);
    assert_eq!(feed.book(5).unwrap().bid_size(100), 0);
}

#[test]
/// Without identifiers the feed replaces a source's resting quantity at a
/// level, leaving other sources untouched.
fn test_feed_untracked_level_deltas() {
    let mut feed = MarketFeed::new();
    feed.open(5);

    feed.add(5, None, Side::Buy, 100, 10, 1);
    feed.add(5, None, Side::Buy, 100, 5, 2);
    assert!(feed.find(0).is_none(), "No records are kept without an id");
    assert_eq!(feed.book(5).unwrap().bid_size(100), 15);

    // An untracked modify resets source 1's quantity from 10 to 4
    feed.modify(5, None, Side::Buy, 100, 4, 1);
    assert_eq!(feed.book(5).unwrap().source_size(Side::Buy, 100, 1), 4);
    assert_eq!(feed.book(5).unwrap().bid_size(100), 9);

    // Resetting the last source's quantity to zero removes its entry
    feed.modify(5, None, Side::Buy, 100, 0, 1);
    feed.modify(5, None, Side::Buy, 100, 0, 2);
    assert_eq!(feed.book(5).unwrap().bid_size(100), 0);
    assert_eq!(feed.book(5).unwrap().levels_count(Side::Buy), 0);
}

#[test]
/// Feed operations on an unopened instrument are silent no-ops.
fn test_feed_unknown_instrument_is_noop() {
    let mut feed = MarketFeed::new();

    feed.add(5, Some(11), Side::Buy, 100, 30, 2);
    feed.modify(5, None, Side::Buy, 100, 30, 2);

    assert!(feed.book(5).is_none(), "No book is created implicitly");
    assert!(feed.find(11).is_none());
}

#[test]
/// Concurrent writers and readers on an aggregate book leave a consistent
/// final state.
fn test_aggregate_concurrent_access_smoke_test() {
    use std::thread;

    let book_arc = Arc::new(AggregateOrderBook::new(9));
    let updates_per_thread = 1000;
    let number_of_threads = 4;

    let mut thread_handles = vec![];

    for thread_id in 0..number_of_threads {
        let book_clone = Arc::clone(&book_arc);

        thread_handles.push(thread::spawn(move || {
            let source = thread_id as u32;
            for update_index in 0..updates_per_thread {
                let price = 100 + (update_index % 10);
                let side = if thread_id % 2 == 0 {
                    Side::Buy
                } else {
                    Side::Sell
                };

                // Writer takes the side's write lock briefly
                book_clone.add(side, price, 1, source);

                // Readers share the side's read lock
                let _best = (book_clone.best_bid_price(), book_clone.best_ask_price());
                let _size = book_clone.bid_size(price);
            }
        }));
    }

    for thread_handle in thread_handles {
        thread_handle.join().unwrap();
    }

    // Every add landed: each side received half the threads' updates
    let total_per_side = (number_of_threads / 2) * updates_per_thread;
    let bid_total: u64 = book_arc
        .bid_prices()
        .into_iter()
        .map(|price| book_arc.bid_size(price))
        .sum();
    let ask_total: u64 = book_arc
        .ask_prices()
        .into_iter()
        .map(|price| book_arc.ask_size(price))
        .sum();

    assert_eq!(
        bid_total, total_per_side as u64,
        "Total bid quantity must match the adds applied"
    );
    assert_eq!(
        ask_total, total_per_side as u64,
        "Total ask quantity must match the adds applied"
    );
}
