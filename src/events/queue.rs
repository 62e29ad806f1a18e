//! Event Queue
//!
//! Delivery-ordered doubly linked list of events, stored in an arena so
//! node handles stay valid across appends and removals. A node flagged
//! pending is still being filled in by the translator and is skipped by
//! every delivery operation.

use super::Event;

/// Stable handle to a queued node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Node {
    event: Event,
    pending: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Normalized event queue
#[derive(Debug, Default)]
pub struct EventQueue {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push at the tail
    pub fn append(&mut self, event: Event) -> NodeId {
        self.push(event, false)
    }

    /// Push a placeholder the translator will fill in later
    pub fn append_pending(&mut self, event: Event) -> NodeId {
        self.push(event, true)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.node = Some(node);
        self.len += 1;
        NodeId {
            index,
            generation: slot.generation,
        }
    }

    fn push(&mut self, event: Event, pending: bool) -> NodeId {
        let id = self.alloc(Node {
            event,
            pending,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.slots[tail].node.as_mut() {
                    tail_node.next = Some(id.index);
                }
            }
            None => self.head = Some(id.index),
        }
        self.tail = Some(id.index);
        id
    }

    /// Link a deliverable event directly ahead of `id`; appends if `id` is stale
    pub fn insert_before(&mut self, id: NodeId, event: Event) -> NodeId {
        let Some(prev) = self.node(id).map(|node| node.prev) else {
            return self.append(event);
        };
        let new_id = self.alloc(Node {
            event,
            pending: false,
            prev,
            next: Some(id.index),
        });
        let index = new_id.index;

        if let Some(next_node) = self.slots[id.index].node.as_mut() {
            next_node.prev = Some(index);
        }
        match prev {
            Some(prev) => {
                if let Some(prev_node) = self.slots[prev].node.as_mut() {
                    prev_node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        new_id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// First node from the head that is not pending
    pub fn find_first_deliverable(&self) -> Option<NodeId> {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = self.slots[index].node.as_ref()?;
            if !node.pending {
                return Some(self.id_at(index));
            }
            cursor = node.next;
        }
        None
    }

    /// Remove and return the first deliverable event
    pub fn unqueue(&mut self) -> Option<Event> {
        let id = self.find_first_deliverable()?;
        self.remove_link(id)
    }

    /// Copy of the first deliverable event, left in place
    pub fn peek(&self) -> Option<Event> {
        let id = self.find_first_deliverable()?;
        self.get(id).cloned()
    }

    pub fn get(&self, id: NodeId) -> Option<&Event> {
        self.node(id).map(|node| &node.event)
    }

    pub fn is_pending(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.pending)
    }

    pub fn set_pending(&mut self, id: NodeId, pending: bool) {
        if let Some(node) = self.node_mut(id) {
            node.pending = pending;
        }
    }

    /// Swap the contents of a node, returning the old event
    pub fn replace(&mut self, id: NodeId, event: Event) -> Option<Event> {
        self.node_mut(id)
            .map(|node| std::mem::replace(&mut node.event, event))
    }

    /// Unlink a node in O(1). Stale handles are ignored.
    pub fn remove_link(&mut self, id: NodeId) -> Option<Event> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.slots[prev].node.as_mut() {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.slots[next].node.as_mut() {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
        self.len -= 1;
        Some(node.event)
    }

    /// Events in delivery order, pending ones included
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.slots[cursor?].node.as_ref()?;
            cursor = node.next;
            Some(&node.event)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ClientEvent, EventKind};

    fn tagged(tag: u32) -> Event {
        Event::new(
            None,
            EventKind::ClientEvent(ClientEvent {
                message_type: tag,
                format: 32,
                data: [0; 5],
            }),
        )
    }

    fn tag_of(event: &Event) -> u32 {
        match event.kind {
            EventKind::ClientEvent(ClientEvent { message_type, .. }) => message_type,
            _ => panic!("unexpected event {:?}", event),
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = EventQueue::new();
        for tag in 1..=5 {
            queue.append(tagged(tag));
        }
        let order: Vec<u32> = std::iter::from_fn(|| queue.unqueue()).map(|e| tag_of(&e)).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pending_nodes_are_skipped_until_cleared() {
        let mut queue = EventQueue::new();
        let placeholder = queue.append_pending(tagged(1));
        queue.append(tagged(2));

        assert_eq!(queue.peek().map(|e| tag_of(&e)), Some(2));
        assert_eq!(queue.unqueue().map(|e| tag_of(&e)), Some(2));
        assert!(queue.unqueue().is_none());
        assert_eq!(queue.len(), 1);

        queue.set_pending(placeholder, false);
        assert_eq!(queue.unqueue().map(|e| tag_of(&e)), Some(1));
    }

    #[test]
    fn test_remove_link_middle_and_stale_handle() {
        let mut queue = EventQueue::new();
        queue.append(tagged(1));
        let middle = queue.append(tagged(2));
        queue.append(tagged(3));

        assert_eq!(queue.remove_link(middle).map(|e| tag_of(&e)), Some(2));
        assert!(queue.remove_link(middle).is_none());

        // Reused slot must not answer to the old handle
        let fresh = queue.append(tagged(4));
        assert!(queue.get(middle).is_none());
        assert_eq!(queue.get(fresh).map(tag_of), Some(4));

        let order: Vec<u32> = queue.iter().map(tag_of).collect();
        assert_eq!(order, vec![1, 3, 4]);
    }

    #[test]
    fn test_insert_before_placeholder() {
        let mut queue = EventQueue::new();
        queue.append(tagged(1));
        let placeholder = queue.append_pending(tagged(3));
        queue.append(tagged(4));
        queue.insert_before(placeholder, tagged(2));
        queue.set_pending(placeholder, false);

        let order: Vec<u32> = std::iter::from_fn(|| queue.unqueue()).map(|e| tag_of(&e)).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_before_head() {
        let mut queue = EventQueue::new();
        let head = queue.append(tagged(2));
        queue.insert_before(head, tagged(1));
        let order: Vec<u32> = queue.iter().map(tag_of).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut queue = EventQueue::new();
        let first = queue.append_pending(tagged(0));
        queue.append(tagged(2));
        queue.replace(first, tagged(1));
        queue.set_pending(first, false);

        let order: Vec<u32> = std::iter::from_fn(|| queue.unqueue()).map(|e| tag_of(&e)).collect();
        assert_eq!(order, vec![1, 2]);
    }
}
