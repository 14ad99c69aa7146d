//! Bounded-window execution
//!
//! Runs a sequence of async jobs with at most `concurrency` in flight. As soon
//! as one job finishes, the next queued job starts. Outputs land in a slot
//! table sized up front, so the returned vector is in submission order no
//! matter which job finishes first.

use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::debug;

/// Run `job` over every item with a sliding window of `concurrency`
///
/// A `concurrency` of zero is treated as one.
pub async fn run_bounded<I, F, Fut, T>(items: I, concurrency: usize, mut job: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let items: Vec<I::Item> = items.into_iter().collect();
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let window = concurrency.clamp(1, total);
    debug!(total = total, window = window, "Starting bounded-window execution");

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut in_flight = stream::iter(items.into_iter().enumerate().map(|(index, item)| {
        let pending = job(item);
        async move { (index, pending.await) }
    }))
    .buffer_unordered(window);

    while let Some((index, output)) = in_flight.next().await {
        slots[index] = Some(output);
    }

    slots.into_iter().flatten().collect()
}
