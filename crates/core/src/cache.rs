use std::collections::{HashMap, VecDeque};

pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Capacity-bounded memo of retrieved context per distinct question text.
/// Keys are the verbatim question, so textually different phrasings of the
/// same question miss the cache. Least-recently-used entries are evicted
/// once capacity is reached.
#[derive(Debug)]
pub struct ContextCache {
    capacity: usize,
    entries: HashMap<String, String>,
    usage_order: VecDeque<String>,
}

impl ContextCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            usage_order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a question, refreshing its recency on a hit.
    pub fn get(&mut self, question: &str) -> Option<String> {
        let context = self.entries.get(question)?.clone();
        self.touch(question);
        Some(context)
    }

    /// Store a context string, evicting the least-recently-used entry when
    /// the cache is full.
    pub fn insert(&mut self, question: String, context: String) {
        if self.entries.insert(question.clone(), context).is_some() {
            self.touch(&question);
            return;
        }

        if self.entries.len() > self.capacity {
            if let Some(oldest) = self.usage_order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.usage_order.push_back(question);
    }

    fn touch(&mut self, question: &str) {
        if let Some(position) = self.usage_order.iter().position(|entry| entry == question) {
            self.usage_order.remove(position);
            self.usage_order.push_back(question.to_string());
        }
    }
}
