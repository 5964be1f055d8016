use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

/// Monotonic arrival number handed out by [`PendingQueue::enqueue`].
///
/// Tickets are never reused, not even across [`PendingQueue::take_all`],
/// so comparing two tickets always tells which request arrived first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An unbounded FIFO holding area for requests waiting on admission.
///
/// ## Ordering
/// Entries leave in exactly the order they entered. There is no priority
/// reshuffling inside the queue; priority is decided before a request ever
/// gets here.
pub struct PendingQueue<T> {
    entries: VecDeque<(Ticket, T)>,
    next_ticket: u64,
    /// Lifetime count of entries that left through `pop_front`.
    released: u64,
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_ticket: 0,
            released: 0,
        }
    }

    /// Appends to the tail and returns the arrival ticket.
    pub fn enqueue(&mut self, item: T) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.entries.push_back((ticket, item));
        ticket
    }

    /// Removes the head of the queue.
    pub fn pop_front(&mut self) -> Option<(Ticket, T)> {
        let entry = self.entries.pop_front()?;
        self.released += 1;
        Some(entry)
    }

    /// Empties the queue, handing back everything that was waiting.
    ///
    /// Tickets keep counting from where they were.
    pub fn take_all(&mut self) -> Vec<(Ticket, T)> {
        self.entries.drain(..).collect()
    }

    pub fn peek(&self) -> Option<&(Ticket, T)> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of entries ever enqueued.
    pub fn total_enqueued(&self) -> u64 {
        self.next_ticket
    }

    /// Total number of entries that left through the head (not via `take_all`).
    pub fn total_released(&self) -> u64 {
        self.released
    }
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PendingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingQueue")
            .field("len", &self.entries.len())
            .field("next_ticket", &self.next_ticket)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(kani)]
mod proofs {
    use super::*;

    #[kani::proof]
    #[kani::unwind(6)]
    fn prove_fifo_order() {
        let mut queue = PendingQueue::new();
        let a: u8 = kani::any();
        let b: u8 = kani::any();
        queue.enqueue(a);
        queue.enqueue(b);

        let (first, x) = queue.pop_front().unwrap();
        let (second, y) = queue.pop_front().unwrap();
        assert!(first < second);
        assert!(x == a && y == b);
    }
}
