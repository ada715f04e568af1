use std::{
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
};

use crate::Position;

/// Priority queue entry. Ordered so that `BinaryHeap` pops the lowest cost
/// first, and among equal costs the earliest pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct PrioritizedItem {
    pub cost: u32,
    pub order: u64,
    pub position: Position,
}

impl Ord for PrioritizedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for PrioritizedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The open set of a search. The variant decides the exploration order.
#[derive(Debug, Clone)]
pub(super) enum Frontier {
    Fifo(VecDeque<Position>),
    Lifo(Vec<Position>),
    Priority {
        heap: BinaryHeap<PrioritizedItem>,
        pushed: u64,
    },
}

impl Frontier {
    /// Pushes `position`; `cost` only matters for the priority variant.
    pub fn push(&mut self, position: Position, cost: u32) {
        match self {
            Frontier::Fifo(queue) => queue.push_back(position),
            Frontier::Lifo(stack) => stack.push(position),
            Frontier::Priority { heap, pushed } => {
                heap.push(PrioritizedItem {
                    cost,
                    order: *pushed,
                    position,
                });
                *pushed += 1;
            }
        }
    }

    /// Next node with the cost it was queued at.
    pub fn pop(&mut self) -> Option<(Position, Option<u32>)> {
        match self {
            Frontier::Fifo(queue) => queue.pop_front().map(|p| (p, None)),
            Frontier::Lifo(stack) => stack.pop().map(|p| (p, None)),
            Frontier::Priority { heap, .. } => {
                heap.pop().map(|item| (item.position, Some(item.cost)))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frontier::Fifo(queue) => queue.len(),
            Frontier::Lifo(stack) => stack.len(),
            Frontier::Priority { heap, .. } => heap.len(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            Frontier::Fifo(queue) => queue.clear(),
            Frontier::Lifo(stack) => stack.clear(),
            Frontier::Priority { heap, .. } => heap.clear(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Position> + '_> {
        match self {
            Frontier::Fifo(queue) => Box::new(queue.iter().copied()),
            Frontier::Lifo(stack) => Box::new(stack.iter().copied()),
            Frontier::Priority { heap, .. } => Box::new(heap.iter().map(|item| item.position)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut frontier: Frontier) -> Vec<usize> {
        let mut out = Vec::new();
        while let Some((position, _)) = frontier.pop() {
            out.push(position.x);
        }
        out
    }

    #[test]
    fn variants_pop_in_their_own_order() {
        let mut fifo = Frontier::Fifo(VecDeque::new());
        let mut lifo = Frontier::Lifo(Vec::new());
        let mut heap = Frontier::Priority {
            heap: BinaryHeap::new(),
            pushed: 0,
        };
        for (x, cost) in [(0, 5), (1, 2), (2, 2), (3, 0)] {
            fifo.push(Position::new(x, 0), cost);
            lifo.push(Position::new(x, 0), cost);
            heap.push(Position::new(x, 0), cost);
        }
        assert_eq!(heap.len(), 4);
        assert_eq!(drain(fifo), [0, 1, 2, 3]);
        assert_eq!(drain(lifo), [3, 2, 1, 0]);
        assert_eq!(drain(heap), [3, 1, 2, 0]);
    }

    #[test]
    fn duplicate_positions_pop_cheapest_first() {
        let mut heap = Frontier::Priority {
            heap: BinaryHeap::new(),
            pushed: 0,
        };
        let here = Position::new(4, 2);
        heap.push(here, 4);
        heap.push(here, 1);
        assert_eq!(heap.pop(), Some((here, Some(1))));
        assert_eq!(heap.pop(), Some((here, Some(4))));
        assert_eq!(heap.pop(), None);
    }
}
