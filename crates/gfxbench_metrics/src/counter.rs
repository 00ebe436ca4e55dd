//! Named session counters (frames presented, frames skipped, switches, ...)

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Default, Clone)]
pub struct Counter {
    counters: BTreeMap<String, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &str, value: usize) {
        match self.counters.get_mut(name) {
            Some(count) => *count += value,
            None => {
                self.counters.insert(name.to_owned(), value);
            }
        }
    }

    pub fn get(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    /// Counters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counters.iter().map(|(name, &count)| (name.as_str(), count))
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{name}={count}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate_per_name() {
        let mut counter = Counter::new();
        counter.increment("frames_skipped", 1);
        counter.increment("frames_presented", 2);
        counter.increment("frames_skipped", 3);

        assert_eq!(counter.get("frames_skipped"), 4);
        assert_eq!(counter.get("frames_presented"), 2);
        assert_eq!(counter.get("missing"), 0);
        assert_eq!(counter.to_string(), "frames_presented=2, frames_skipped=4");

        counter.reset_all();
        assert_eq!(counter.get("frames_skipped"), 0);
    }
}
