//! # PendingQueue Tests
//!
//! FIFO ordering, ticket monotonicity and reset behaviour of the holding
//! queue.

use reqgate_dsa::{PendingQueue, Ticket};

#[test]
fn test_fifo_order() {
    let mut queue = PendingQueue::new();
    for name in ["a", "b", "c", "d"] {
        queue.enqueue(name);
    }
    assert_eq!(queue.len(), 4);
    assert_eq!(queue.peek().map(|(_, v)| *v), Some("a"));

    let drained: Vec<&str> = std::iter::from_fn(|| queue.pop_front().map(|(_, v)| v)).collect();
    assert_eq!(drained, vec!["a", "b", "c", "d"]);
    assert!(queue.is_empty());
    assert!(queue.pop_front().is_none());
}

/// Interleaved arrivals and departures keep arrival order.
#[test]
fn test_interleaved_enqueue_and_pop() {
    let mut queue = PendingQueue::new();
    let mut popped = Vec::new();

    for i in 0..50u32 {
        queue.enqueue(i);
        if i % 3 == 2 {
            popped.push(queue.pop_front().unwrap().1);
            popped.push(queue.pop_front().unwrap().1);
        }
    }
    while let Some((_, v)) = queue.pop_front() {
        popped.push(v);
    }

    assert_eq!(popped, (0..50).collect::<Vec<_>>());
    assert_eq!(queue.total_enqueued(), 50);
    assert_eq!(queue.total_released(), 50);
}

#[test]
fn test_tickets_are_monotonic() {
    let mut queue = PendingQueue::new();
    let a = queue.enqueue(());
    let b = queue.enqueue(());
    assert_eq!(a, Ticket(0));
    assert_eq!(b, Ticket(1));
    assert!(a < b);
    assert_eq!(b.to_string(), "#1");
}

/// `take_all` hands back everything in order and tickets keep counting.
#[test]
fn test_take_all_empties_queue() {
    let mut queue = PendingQueue::new();
    queue.enqueue("x");
    queue.enqueue("y");
    queue.pop_front();
    queue.enqueue("z");

    let dropped = queue.take_all();
    assert_eq!(dropped, vec![(Ticket(1), "y"), (Ticket(2), "z")]);
    assert!(queue.is_empty());
    assert_eq!(queue.total_released(), 1, "take_all is not a release");

    assert_eq!(queue.enqueue("w"), Ticket(3));
}
