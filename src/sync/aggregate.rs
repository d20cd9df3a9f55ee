//! Concurrent, failure-isolated loading of independent resources.

use futures::future::{join_all, BoxFuture};

use crate::error::SyncError;

/// A named fetch in a batch.
pub type Fetcher<'a, T, E = SyncError, N = &'static str> = (N, BoxFuture<'a, Result<T, E>>);

/// Outcome of one fetcher.
#[derive(Debug)]
pub struct FetchOutcome<T, E = SyncError, N = &'static str> {
    pub resource: N,
    pub result: Result<T, E>,
}

/// Best-effort snapshot of a batch, in the order the fetchers were given.
#[derive(Debug)]
pub struct AggregateFetchResult<T, E = SyncError, N = &'static str> {
    outcomes: Vec<FetchOutcome<T, E, N>>,
}

impl<T, E, N: AsRef<str>> AggregateFetchResult<T, E, N> {
    pub fn outcomes(&self) -> &[FetchOutcome<T, E, N>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<FetchOutcome<T, E, N>> {
        self.outcomes
    }

    pub fn get(&self, resource: &str) -> Option<&Result<T, E>> {
        self.outcomes
            .iter()
            .find(|o| o.resource.as_ref() == resource)
            .map(|o| &o.result)
    }

    /// The value for `resource`, if it loaded.
    pub fn value(&self, resource: &str) -> Option<&T> {
        self.get(resource).and_then(|r| r.as_ref().ok())
    }

    /// Remove and return the value for `resource`, if it loaded.
    pub fn take(&mut self, resource: &str) -> Option<T> {
        let index = self
            .outcomes
            .iter()
            .position(|o| o.resource.as_ref() == resource && o.result.is_ok())?;
        self.outcomes.remove(index).result.ok()
    }

    /// Remove and return the outcome for `resource`, loaded or not.
    pub fn remove(&mut self, resource: &str) -> Option<Result<T, E>> {
        let index = self
            .outcomes
            .iter()
            .position(|o| o.resource.as_ref() == resource)?;
        Some(self.outcomes.remove(index).result)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&N, &E)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.resource, e)))
    }

    /// Some, but not all, fetchers failed.
    pub fn is_partial(&self) -> bool {
        let failed = self.failures().count();
        failed > 0 && failed < self.outcomes.len()
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.result.is_err())
    }

    /// Fail the batch only when nothing loaded and there is no cached prior
    /// value to keep showing.
    pub fn into_result(self, has_cached: bool) -> Result<Self, SyncError> {
        if self.all_failed() && !has_cached {
            return Err(SyncError::AggregateFailed {
                failed: self.outcomes.len(),
            });
        }
        Ok(self)
    }
}

/// Run every fetcher concurrently; one failure never cancels the others.
pub async fn load_all<'a, T, E, N>(fetchers: Vec<Fetcher<'a, T, E, N>>) -> AggregateFetchResult<T, E, N>
where
    E: std::fmt::Display,
    N: AsRef<str>,
{
    let (names, futures): (Vec<_>, Vec<_>) = fetchers.into_iter().unzip();
    let results = join_all(futures).await;

    let outcomes: Vec<FetchOutcome<T, E, N>> = names
        .into_iter()
        .zip(results)
        .map(|(resource, result)| {
            if let Err(e) = &result {
                tracing::debug!(resource = resource.as_ref(), error = %e, "Fetch in batch failed");
            }
            FetchOutcome { resource, result }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        tracing::info!(failed, total = outcomes.len(), "Batch loaded with missing sections");
    }

    AggregateFetchResult { outcomes }
}
