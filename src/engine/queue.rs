use std::collections::{HashSet, VecDeque};

use ulid::Ulid;

/// A ticket taken off the front of the admission queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticket {
    /// Still pending; membership has now been released.
    Live(Ulid),
    /// Withdrawn while queued.
    Stale(Ulid),
}

/// FIFO of check-in tickets.
///
/// `pending` holds the ids whose ticket is queued and still valid. Withdrawing
/// a ticket only clears membership; the physical entry is dropped when it
/// reaches the front.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    order: VecDeque<Ulid>,
    pending: HashSet<Ulid>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the back. Returns false if the id is already pending.
    pub fn enqueue(&mut self, id: Ulid) -> bool {
        if !self.pending.insert(id) {
            return false;
        }
        // A withdrawn copy may still sit in the queue; it must not resurface
        // as live ahead of this one.
        self.order.retain(|queued| *queued != id);
        self.order.push_back(id);
        true
    }

    /// Put a ticket back at the front. Only used when undoing a processed
    /// check-in.
    pub fn enqueue_front(&mut self, id: Ulid) -> bool {
        if !self.pending.insert(id) {
            return false;
        }
        self.order.retain(|queued| *queued != id);
        self.order.push_front(id);
        true
    }

    pub fn dequeue(&mut self) -> Option<Ticket> {
        let id = self.order.pop_front()?;
        if self.pending.remove(&id) {
            Some(Ticket::Live(id))
        } else {
            Some(Ticket::Stale(id))
        }
    }

    /// Invalidate a queued ticket. Returns whether it was pending.
    pub fn withdraw(&mut self, id: &Ulid) -> bool {
        self.pending.remove(id)
    }

    /// Physically remove a pending ticket, wherever it sits. Withdrawn
    /// tickets queued behind it are unaffected.
    pub fn retract(&mut self, id: &Ulid) -> bool {
        if !self.pending.remove(id) {
            return false;
        }
        self.order.retain(|queued| queued != id);
        true
    }

    pub fn is_pending(&self, id: &Ulid) -> bool {
        self.pending.contains(id)
    }

    /// Exact number of valid tickets.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Physical length, withdrawn tickets included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Fixed-capacity circular buffer of entry gates, used round-robin.
#[derive(Debug)]
pub struct GateRing {
    buf: Box<[Option<String>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl GateRing {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![None; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Ring filled with `gates` in order; capacity equals the gate count.
    pub fn filled(gates: &[String]) -> Self {
        let mut ring = Self::with_capacity(gates.len());
        for gate in gates {
            ring.enqueue(gate.clone());
        }
        ring
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Returns false when full.
    pub fn enqueue(&mut self, gate: String) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.tail] = Some(gate);
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
        true
    }

    pub fn dequeue(&mut self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let gate = self.buf[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        gate
    }

    /// The gate most recently cycled to the back.
    pub fn peek_back(&self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let idx = (self.tail + self.capacity() - 1) % self.capacity();
        self.buf[idx].as_deref()
    }

    /// Take the head gate and cycle it to the back.
    pub fn next_gate(&mut self) -> Option<String> {
        let gate = self.dequeue()?;
        self.enqueue(gate.clone());
        Some(gate)
    }

    /// Undo one `next_gate`: cycling `len - 1` more times brings the
    /// previously assigned gate back to the head.
    pub fn rotate_back(&mut self) {
        for _ in 0..self.count.saturating_sub(1) {
            if let Some(gate) = self.dequeue() {
                self.enqueue(gate);
            }
        }
    }

    /// Gates from head to tail.
    pub fn snapshot(&self) -> Vec<String> {
        let cap = self.capacity();
        (0..self.count)
            .filter_map(|i| self.buf[(self.head + i) % cap].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Gate{i}")).collect()
    }

    #[test]
    fn queue_is_fifo() {
        let mut q = AdmissionQueue::new();
        let (a, b) = (Ulid::new(), Ulid::new());
        assert!(q.enqueue(a));
        assert!(q.enqueue(b));
        assert_eq!(q.dequeue(), Some(Ticket::Live(a)));
        assert_eq!(q.dequeue(), Some(Ticket::Live(b)));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn duplicate_enqueue_rejected() {
        let mut q = AdmissionQueue::new();
        let a = Ulid::new();
        assert!(q.enqueue(a));
        assert!(!q.enqueue(a));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn withdrawn_ticket_surfaces_as_stale() {
        let mut q = AdmissionQueue::new();
        let (a, b) = (Ulid::new(), Ulid::new());
        q.enqueue(a);
        q.enqueue(b);
        assert!(q.withdraw(&a));
        assert_eq!(q.pending(), 1);
        assert_eq!(q.len(), 2);
        assert_eq!(q.dequeue(), Some(Ticket::Stale(a)));
        assert_eq!(q.dequeue(), Some(Ticket::Live(b)));
    }

    #[test]
    fn re_enqueue_purges_withdrawn_copy() {
        let mut q = AdmissionQueue::new();
        let (a, b) = (Ulid::new(), Ulid::new());
        q.enqueue(a);
        q.enqueue(b);
        q.withdraw(&a);
        q.enqueue(a);
        assert_eq!(q.len(), 2);
        assert_eq!(q.dequeue(), Some(Ticket::Live(b)));
        assert_eq!(q.dequeue(), Some(Ticket::Live(a)));
    }

    #[test]
    fn enqueue_front_restores_head_position() {
        let mut q = AdmissionQueue::new();
        let (a, b) = (Ulid::new(), Ulid::new());
        q.enqueue(a);
        q.enqueue(b);
        assert_eq!(q.dequeue(), Some(Ticket::Live(a)));
        assert!(q.enqueue_front(a));
        assert_eq!(q.dequeue(), Some(Ticket::Live(a)));
        assert_eq!(q.dequeue(), Some(Ticket::Live(b)));
    }

    #[test]
    fn retract_removes_pending_ticket_anywhere() {
        let mut q = AdmissionQueue::new();
        let (a, b, c) = (Ulid::new(), Ulid::new(), Ulid::new());
        q.enqueue(a);
        q.enqueue(b);
        q.enqueue(c);
        q.withdraw(&c);

        // `a` sits ahead of a live and a withdrawn ticket.
        assert!(q.retract(&a));
        assert!(!q.is_pending(&a));
        assert_eq!(q.len(), 2);
        assert!(!q.retract(&a));
        assert!(!q.retract(&c));

        assert_eq!(q.dequeue(), Some(Ticket::Live(b)));
        assert_eq!(q.dequeue(), Some(Ticket::Stale(c)));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn ring_cycles_round_robin() {
        let mut ring = GateRing::filled(&gates(3));
        let seq: Vec<_> = (0..7).filter_map(|_| ring.next_gate()).collect();
        assert_eq!(
            seq,
            vec!["Gate1", "Gate2", "Gate3", "Gate1", "Gate2", "Gate3", "Gate1"]
        );
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn ring_rejects_overflow() {
        let mut ring = GateRing::filled(&gates(2));
        assert!(ring.is_full());
        assert!(!ring.enqueue("Gate9".into()));
        assert_eq!(ring.snapshot(), gates(2));
    }

    #[test]
    fn rotate_back_restores_order() {
        let mut ring = GateRing::filled(&gates(4));
        let before = ring.snapshot();
        let gate = ring.next_gate().unwrap();
        assert_eq!(ring.peek_back(), Some(gate.as_str()));
        ring.rotate_back();
        assert_eq!(ring.snapshot(), before);
    }

    #[test]
    fn single_gate_rotate_back_is_noop() {
        let mut ring = GateRing::filled(&gates(1));
        ring.next_gate();
        ring.rotate_back();
        assert_eq!(ring.snapshot(), gates(1));
    }

    #[test]
    fn empty_ring() {
        let mut ring = GateRing::with_capacity(0);
        assert!(ring.dequeue().is_none());
        assert!(ring.next_gate().is_none());
        assert!(ring.peek_back().is_none());
        ring.rotate_back();
    }
}
