use std::collections::HashSet;

use crate::tmdb::UpstreamMovie;

/// Identifiers already claimed during one sync run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<i64>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, id: i64) -> bool {
        self.seen.contains(&id)
    }

    pub fn mark_seen(&mut self, id: i64) {
        self.seen.insert(id);
    }

    /// Drops movies already seen in this run, and repeats within `movies`
    /// itself, keeping the first occurrence. Nothing is marked here; callers
    /// mark ids before handing the batch to the store.
    pub fn unseen(&self, movies: Vec<UpstreamMovie>) -> Vec<UpstreamMovie> {
        let mut batch = HashSet::new();
        movies.into_iter().filter(|m| !self.seen(m.id) && batch.insert(m.id)).collect()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page_of, upstream};

    #[test]
    fn unseen_drops_marked_ids() {
        let mut dedup = Deduplicator::new();
        dedup.mark_seen(2);

        let fresh = dedup.unseen(page_of(1, 3));

        assert_eq!(fresh.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(dedup.seen(2));
        assert!(!dedup.seen(1));
    }

    #[test]
    fn unseen_keeps_first_repeat_within_batch() {
        let dedup = Deduplicator::new();
        let movies = vec![upstream(5, "First"), upstream(6, "Other"), upstream(5, "Second")];

        let fresh = dedup.unseen(movies);

        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].title, "First");
        assert_eq!(dedup.len(), 0);
    }
}
