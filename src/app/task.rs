// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned from `update`
//!
//! A [`Task`] is a set of streams whose items are fed back into the update
//! loop as messages. Futures become single-item streams; recorder event
//! channels stay open for as long as the recorder runs.

use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;

/// Work whose results come back as messages
#[must_use = "tasks do nothing unless handed to the runtime"]
pub struct Task<T> {
    streams: Vec<BoxStream<'static, T>>,
}

impl<T: Send + 'static> Task<T> {
    /// Task that produces nothing
    pub fn none() -> Self {
        Self {
            streams: Vec::new(),
        }
    }

    /// Task that immediately yields `value`
    pub fn done(value: T) -> Self {
        Self::from_stream(stream::once(async move { value }))
    }

    /// Run a future and map its output to a message
    pub fn perform<A, F>(future: F, map: impl FnOnce(A) -> T + Send + 'static) -> Self
    where
        F: Future<Output = A> + Send + 'static,
        A: Send + 'static,
    {
        Self::from_stream(stream::once(async move { map(future.await) }))
    }

    /// Forward every item of a stream as a message
    pub fn run<A, S>(stream: S, map: impl FnMut(A) -> T + Send + 'static) -> Self
    where
        S: futures::Stream<Item = A> + Send + 'static,
        A: Send + 'static,
    {
        Self::from_stream(stream.map(map))
    }

    /// Combine several tasks
    pub fn batch(tasks: impl IntoIterator<Item = Task<T>>) -> Self {
        Self {
            streams: tasks.into_iter().flat_map(|t| t.streams).collect(),
        }
    }

    /// Transform the produced messages
    pub fn map<U: Send + 'static>(self, f: impl Fn(T) -> U + Clone + Send + 'static) -> Task<U> {
        Task {
            streams: self
                .streams
                .into_iter()
                .map(|s| s.map(f.clone()).boxed())
                .collect(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn into_streams(self) -> Vec<BoxStream<'static, T>> {
        self.streams
    }

    fn from_stream(stream: impl futures::Stream<Item = T> + Send + 'static) -> Self {
        Self {
            streams: vec![stream.boxed()],
        }
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("streams", &self.streams.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::stream::SelectAll;

    fn collect<T: Send + 'static>(task: Task<T>) -> Vec<T> {
        let mut all: SelectAll<_> = task.into_streams().into_iter().collect();
        block_on(async {
            let mut out = Vec::new();
            while let Some(item) = all.next().await {
                out.push(item);
            }
            out
        })
    }

    #[test]
    fn test_none_is_empty() {
        assert!(Task::<u8>::none().is_none());
    }

    #[test]
    fn test_perform_and_map() {
        let task = Task::perform(async { 20 }, |n: i32| n + 1).map(|n| n * 2);
        assert_eq!(collect(task), vec![42]);
    }

    #[test]
    fn test_batch_runs_all() {
        let task = Task::batch([
            Task::done(1),
            Task::run(stream::iter(vec![2, 3]), |n| n),
            Task::none(),
        ]);
        let mut items = collect(task);
        items.sort();
        assert_eq!(items, vec![1, 2, 3]);
    }
}
