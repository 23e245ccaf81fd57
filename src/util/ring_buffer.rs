use std::collections::VecDeque;

/// Fixed capacity FIFO window. Once full, every push evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    window: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be non-zero");
        RingBuffer {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value into the window and return the evicted one, if any
    pub fn append(&mut self, value: T) -> Option<T> {
        let evicted = if self.window.len() == self.capacity {
            self.window.pop_front()
        } else {
            None
        };
        self.window.push_back(value);
        evicted
    }

    /// Owned copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.window.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.window.iter()
    }
}

impl<T: Clone> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(crate::listener::Settings::BUFFER_CAPACITY)
    }
}
