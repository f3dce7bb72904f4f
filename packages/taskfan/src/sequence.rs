//! Lazy, time-paced random sequences and their concurrent aggregation

use crate::error::{validate_count, validate_upper_bound};
use crate::{Clock, RandomSource, SequenceConfig, StdRandom, TaskResult, TokioClock};
use futures::future::join_all;
use futures::{Stream, TryStreamExt};
use pin_project_lite::pin_project;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;
use taskfan_common::LoggingTransformer;
use tokio::time::Sleep;

pin_project! {
    /// Finite stream of random values, one per inter-yield interval
    ///
    /// Each value is preceded by a pause of `interval` on the sequence's clock.
    /// A failed draw is yielded as an error and ends the sequence. Exhausted
    /// sequences are not restartable; build a new one instead.
    #[must_use = "streams do nothing unless polled"]
    pub struct RandomSequence<R, C> {
        #[pin]
        pause: Option<Sleep>,
        random: R,
        clock: C,
        remaining: usize,
        interval: Duration,
        upper_bound: f64,
    }
}

impl<R, C> RandomSequence<R, C>
where
    R: RandomSource,
    C: Clock,
{
    /// Create a sequence shaped by `config`
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if `config.upper_bound` is
    /// negative, NaN or infinite.
    pub fn new(config: &SequenceConfig, random: R, clock: C) -> TaskResult<Self> {
        validate_upper_bound(config.upper_bound)?;
        Ok(Self::from_checked(config, random, clock))
    }

    fn from_checked(config: &SequenceConfig, random: R, clock: C) -> Self {
        Self {
            pause: None,
            random,
            clock,
            remaining: config.length,
            interval: config.interval(),
            upper_bound: config.upper_bound,
        }
    }

    /// Values still to be yielded
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<R, C> Stream for RandomSequence<R, C>
where
    R: RandomSource,
    C: Clock,
{
    type Item = TaskResult<f64>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.remaining == 0 {
            return Poll::Ready(None);
        }

        if this.pause.is_none() {
            let pause = this.clock.sleep(*this.interval);
            this.pause.set(Some(pause));
        }
        if let Some(pause) = this.pause.as_mut().as_pin_mut() {
            ready!(pause.poll(cx));
        }
        this.pause.set(None);
        *this.remaining -= 1;

        match this.random.uniform(*this.upper_bound) {
            Ok(value) => Poll::Ready(Some(Ok(value))),
            Err(err) => {
                *this.remaining = 0;
                Poll::Ready(Some(Err(err)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// A default-shaped sequence: 10 values in `[0, 10)`, one per second
pub fn random_sequence() -> RandomSequence<StdRandom, TokioClock> {
    RandomSequence::from_checked(
        &SequenceConfig::default(),
        StdRandom::from_entropy(),
        TokioClock,
    )
}

/// Consume `sequence` to exhaustion, keeping yield order
///
/// # Errors
///
/// Returns the first failed draw.
pub async fn drain_all<S>(sequence: S) -> TaskResult<Vec<f64>>
where
    S: Stream<Item = TaskResult<f64>>,
{
    sequence.try_collect().await
}

/// Outputs of a concurrent drain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// One entry per sequence, in start order, each in yield order
    pub sequences: Vec<Vec<f64>>,
    /// Wall-clock time for every sequence to finish
    pub elapsed: Duration,
}

impl AggregateReport {
    /// All values, sequence by sequence
    #[must_use]
    pub fn merged(&self) -> Vec<f64> {
        self.sequences.iter().flatten().copied().collect()
    }

    /// Total number of values drained
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }
}

/// Runs several independent sequences concurrently and merges their output
pub struct SequenceAggregator<R = StdRandom, C = TokioClock> {
    config: SequenceConfig,
    random: R,
    clock: C,
}

impl SequenceAggregator {
    /// Aggregator with default sequence shape, entropy-seeded generator and tokio clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SequenceConfig::default(),
            random: StdRandom::from_entropy(),
            clock: TokioClock,
        }
    }
}

impl Default for SequenceAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> SequenceAggregator<R, C>
where
    R: RandomSource,
    C: Clock,
{
    /// Aggregator built from explicit collaborators
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if `config.upper_bound` is
    /// negative, NaN or infinite.
    pub fn with_parts(config: SequenceConfig, random: R, clock: C) -> TaskResult<Self> {
        validate_upper_bound(config.upper_bound)?;
        Ok(Self {
            config,
            random,
            clock,
        })
    }

    /// Shape of the sequences this aggregator starts
    #[must_use]
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// A fresh sequence owning a forked generator
    pub fn sequence(&mut self) -> RandomSequence<R, C> {
        RandomSequence::from_checked(&self.config, self.random.fork(), self.clock.clone())
    }

    /// Drain `k` fresh sequences concurrently and return their outputs
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if `k` is zero, or the first
    /// failed draw in start order once every sequence has finished.
    pub async fn run(&mut self, k: usize) -> TaskResult<AggregateReport> {
        validate_count("k", k)?;
        let sequences: Vec<_> = (0..k).map(|_| self.sequence()).collect();
        tracing::debug!(sequences = k, "Draining sequences concurrently");

        let started = self.clock.now();
        let drained = join_all(sequences.into_iter().map(drain_all)).await;
        let elapsed = self.clock.now().saturating_duration_since(started);

        let sequences = drained.into_iter().collect::<TaskResult<Vec<_>>>()?;
        let report = AggregateReport { sequences, elapsed };
        LoggingTransformer::log_sequence_drain(k, report.value_count(), elapsed);
        Ok(report)
    }

    /// Wall-clock time to drain `k` fresh sequences concurrently
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn aggregate(&mut self, k: usize) -> TaskResult<Duration> {
        Ok(self.run(k).await?.elapsed)
    }
}
