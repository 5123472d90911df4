// src/engine/timeline.rs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::dag::Job;
use crate::engine::Event;
use crate::errors::{DagSchedError, Result};

#[derive(Debug)]
struct Entry {
    time: f64,
    seq: u64,
    event: Event,
}

// BinaryHeap is a max-heap, so flip the comparison: earliest time first,
// then lowest insertion sequence (FIFO among equal timestamps).
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

/// Time-ordered queue of pending scheduling events.
///
/// Events with equal timestamps pop in insertion order, which keeps replays
/// bit-identical regardless of heap internals.
#[derive(Debug, Default)]
pub struct Timeline {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a timeline with job arrivals in one heapify pass.
    ///
    /// Ties keep the order of `arrivals`.
    pub fn from_arrivals(arrivals: impl IntoIterator<Item = (f64, Job)>) -> Self {
        let entries: Vec<Entry> = arrivals
            .into_iter()
            .enumerate()
            .map(|(seq, (time, job))| {
                assert!(!time.is_nan(), "job {} has a NaN arrival time", job.id());
                Entry {
                    time,
                    seq: seq as u64,
                    event: Event::JobArrival { job: Box::new(job) },
                }
            })
            .collect();
        let next_seq = entries.len() as u64;
        Self {
            heap: BinaryHeap::from(entries),
            next_seq,
        }
    }

    pub fn push(&mut self, time: f64, event: Event) {
        assert!(!time.is_nan(), "event {} scheduled at NaN", event.kind());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { time, seq, event });
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Result<(f64, Event)> {
        self.heap
            .pop()
            .map(|e| (e.time, e.event))
            .ok_or(DagSchedError::EmptyTimeline)
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.time)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
