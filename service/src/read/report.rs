//! Reporting read models.

use std::collections::HashMap;

use crate::domain::job;
#[cfg(doc)]
use crate::domain::{Company, Job};

/// Number of [`Job`]s per [`job::Status`], either across the whole job board
/// or within a single [`Company`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JobStatuses(HashMap<job::Status, u64>);

impl JobStatuses {
    /// Returns the number of [`Job`]s having the provided [`job::Status`].
    #[must_use]
    pub fn count(&self, status: job::Status) -> u64 {
        self.0.get(&status).copied().unwrap_or_default()
    }

    /// Returns the total number of [`Job`]s.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

impl FromIterator<(job::Status, u64)> for JobStatuses {
    fn from_iter<T: IntoIterator<Item = (job::Status, u64)>>(iter: T) -> Self {
        let mut counts = HashMap::new();
        for (status, n) in iter {
            *counts.entry(status).or_default() += n;
        }
        Self(counts)
    }
}
