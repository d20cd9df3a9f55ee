//! Remote-state synchronization primitives.
//!
//! - [`OptimisticExecutor`]: local-first mutations with exact rollback
//! - [`Poller`]: interval + focus reconciliation with explicit stop
//! - [`load_all`]: concurrent reads with per-resource failure isolation

mod aggregate;
mod latest;
mod optimistic;
mod poller;
mod stop;

pub use aggregate::{load_all, AggregateFetchResult, FetchOutcome, Fetcher};
pub use latest::LatestValue;
pub use optimistic::{ManagedResource, OptimisticExecutor, ResourceSet};
pub use poller::{FocusSignal, PollTrigger, PollUpdates, Poller, PollerHandle};
pub use stop::StopSignal;
