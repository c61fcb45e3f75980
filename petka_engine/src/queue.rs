use std::collections::VecDeque;

use crate::message::Message;

/// FIFO of messages waiting for the next drain. Pushing never runs a
/// handler, which keeps dispatch breadth-first and non-reentrant.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    pending: VecDeque<Message>,
    delivered: u64,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    pub fn next(&mut self) -> Option<Message> {
        let message = self.pending.pop_front()?;
        self.delivered += 1;
        Some(message)
    }

    pub fn peek(&self) -> Option<&Message> {
        self.pending.front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Message> {
        self.pending.iter()
    }

    /// Total number of messages handed out since creation.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::MessageQueue;
    use crate::message::Message;
    use crate::opcode::Opcode;

    #[test]
    fn queue_preserves_order() {
        let mut queue = MessageQueue::new();
        queue.push(Message::new(1, Opcode::Use));
        queue.push(Message::new(2, Opcode::Look));
        queue.push(Message::new(3, Opcode::Take));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(|m| m.target), Some(1));

        let mut drained = Vec::new();
        while let Some(message) = queue.next() {
            drained.push(message.target);
        }

        assert!(queue.is_empty());
        assert_eq!(drained, vec![1, 2, 3]);
        assert_eq!(queue.delivered(), 3);
    }

    #[test]
    fn messages_pushed_while_draining_go_to_the_back() {
        let mut queue = MessageQueue::new();
        queue.push(Message::new(1, Opcode::Use));
        queue.push(Message::new(2, Opcode::Use));
        let first = queue.next().expect("first message present");
        queue.push(Message::new(first.target + 10, Opcode::Show));
        let order: Vec<u16> = queue.pending().map(|m| m.target).collect();
        assert_eq!(order, vec![2, 11]);
    }
}
