use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 120;

/// Immutable copy of a window, oldest sample first.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    samples: Arc<[f64]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            samples: Arc::from(Vec::new()),
        }
    }
}

impl Snapshot {
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fixed-capacity price history. Once full, every append evicts the oldest
/// sample before the new one goes in.
#[derive(Debug, Clone)]
pub struct BoundedWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl BoundedWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::new(),
            capacity,
        }
    }

    pub fn append(&mut self, sample: f64) -> Snapshot {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            samples: self.samples.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
