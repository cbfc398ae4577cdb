// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-stepped activities.
//!
//! The tree owns one [`ActivityScheduler`]. Hosts drive it by calling
//! [`Tree::process_activities`] (or [`Tree::process_frame`]) once per frame with
//! the current time. Time is a [`Duration`] from any epoch the host likes; the
//! scheduler never reads a clock.
//!
//! Activities run in registration order. An activity may wait for another
//! one: it starts when its dependency leaves the scheduler, at the moment the
//! dependency was due to end.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::time::Duration;

use crate::Tree;

/// Handle of a scheduled activity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActivityId(pub(crate) u64);

/// How the elapsed fraction maps onto the source → destination range.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum InterpolationMode {
    /// Go from the source value to the destination value.
    #[default]
    SourceToDestination,
    /// Go from the destination value back to the source value.
    DestinationToSource,
    /// Go to the destination during the first half and come back during the second.
    SourceToDestinationToSource,
}

/// When and how an activity runs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActivityTiming {
    /// Length of one loop.
    pub duration: Duration,
    /// Explicit start time. `None` starts at the first processed frame.
    pub start_time: Option<Duration>,
    /// Start once this activity has left the scheduler.
    pub after: Option<ActivityId>,
    /// Mapping from elapsed fraction to interpolation parameter.
    pub mode: InterpolationMode,
    /// Ease in and out (quadratic) instead of moving linearly.
    pub slow_in_slow_out: bool,
    /// Number of loops; `0` is treated as `1`.
    pub loop_count: u32,
}

impl ActivityTiming {
    /// One eased loop of `duration`, starting at the next processed frame.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            start_time: None,
            after: None,
            mode: InterpolationMode::default(),
            slow_in_slow_out: true,
            loop_count: 1,
        }
    }

    /// Start at an explicit time.
    pub fn starting_at(mut self, start: Duration) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Start when `dependency` leaves the scheduler.
    pub fn after(mut self, dependency: ActivityId) -> Self {
        self.after = Some(dependency);
        self
    }

    /// Use a different interpolation mode.
    pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Move at constant speed.
    pub fn linear(mut self) -> Self {
        self.slow_in_slow_out = false;
        self
    }

    /// Repeat `count` times.
    pub fn looping(mut self, count: u32) -> Self {
        self.loop_count = count;
        self
    }

    /// Total running time over all loops.
    pub fn total_duration(&self) -> Duration {
        self.duration.saturating_mul(self.loop_count.max(1))
    }

    /// Interpolation parameter for a loop fraction in `0..=1`.
    pub fn parameter(&self, fraction: f64) -> f64 {
        let t = fraction.clamp(0.0, 1.0);
        let t = match self.mode {
            InterpolationMode::SourceToDestination => t,
            InterpolationMode::DestinationToSource => 1.0 - t,
            InterpolationMode::SourceToDestinationToSource => {
                if t <= 0.5 {
                    2.0 * t
                } else {
                    1.0 - (t - 0.5) * 2.0
                }
            }
        };
        if self.slow_in_slow_out {
            if t < 0.5 {
                2.0 * t * t
            } else {
                let u = 1.0 - t;
                1.0 - 2.0 * u * u
            }
        } else {
            t
        }
    }

    /// Fraction of the current loop after `elapsed` time since start.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Sub-nanosecond precision is irrelevant for animation."
    )]
    fn loop_fraction(&self, elapsed: Duration) -> f64 {
        let len = self.duration.as_nanos();
        if len == 0 {
            return 1.0;
        }
        (elapsed.as_nanos() % len) as f64 / len as f64
    }
}

/// A time-bounded task stepped by the scheduler.
///
/// Every hook receives the tree, so activities edit nodes through the same
/// setters as any other code and trigger the usual invalidation.
pub trait Activity: Debug {
    /// Called once, on the first frame at or after the start time.
    fn started(&mut self, _tree: &mut Tree) {}

    /// Called every frame while running with the interpolation parameter.
    fn step(&mut self, tree: &mut Tree, t: f64);

    /// Called once after the last step.
    fn finished(&mut self, _tree: &mut Tree) {}
}

#[derive(Debug)]
struct Entry {
    id: ActivityId,
    activity: Box<dyn Activity>,
    timing: ActivityTiming,
    start: Option<Duration>,
    started: bool,
}

/// Registry of running and waiting activities.
#[derive(Debug, Default)]
pub struct ActivityScheduler {
    entries: Vec<Entry>,
    next_id: u64,
    cancelled: Vec<ActivityId>,
    in_flight: Vec<ActivityId>,
    processing: bool,
}

impl ActivityScheduler {
    /// Number of activities waiting or running.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `id` is still waiting or running.
    pub fn contains(&self, id: ActivityId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Scheduled end of `id`, if its start time is already known.
    pub fn end_time(&self, id: ActivityId) -> Option<Duration> {
        let e = self.entries.iter().find(|e| e.id == id)?;
        Some(e.start? + e.timing.total_duration())
    }
}

/// Release everything in `entries` that waits on `id`.
fn release_dependents(entries: &mut [Entry], id: ActivityId, end: Option<Duration>) {
    for e in entries.iter_mut().filter(|e| e.timing.after == Some(id)) {
        e.timing.after = None;
        if e.start.is_none() {
            e.start = end;
        }
    }
}

impl Tree {
    /// The activity scheduler, for inspection.
    pub fn scheduler(&self) -> &ActivityScheduler {
        &self.scheduler
    }

    /// Register an activity.
    ///
    /// A dependency that is not (or no longer) scheduled is ignored, so the
    /// activity starts at the next processed frame.
    pub fn schedule(
        &mut self,
        activity: impl Activity + 'static,
        timing: ActivityTiming,
    ) -> ActivityId {
        let s = &mut self.scheduler;
        s.next_id += 1;
        let id = ActivityId(s.next_id);
        let mut timing = timing;
        if let Some(dep) = timing.after {
            if !s.contains(dep) {
                timing.after = None;
            }
        }
        tracing::debug!(?id, ?timing, "scheduled activity");
        s.entries.push(Entry {
            id,
            activity: Box::new(activity),
            start: timing.start_time,
            timing,
            started: false,
        });
        id
    }

    /// Remove an activity without finishing it.
    ///
    /// The property keeps whatever value the last step applied. Activities
    /// waiting on it start at the next processed frame.
    pub fn cancel_activity(&mut self, id: ActivityId) -> bool {
        let s = &mut self.scheduler;
        if let Some(pos) = s.entries.iter().position(|e| e.id == id) {
            s.entries.remove(pos);
            release_dependents(&mut s.entries, id, None);
            tracing::debug!(?id, "cancelled activity");
            return true;
        }
        // Entries being processed are held by `process_activities`.
        if s.in_flight.contains(&id) && !s.cancelled.contains(&id) {
            s.cancelled.push(id);
            return true;
        }
        false
    }

    /// Step every activity that is due at `now`.
    ///
    /// Finished activities are stepped one last time with the parameter for
    /// the end of their last loop, then removed.
    pub fn process_activities(&mut self, now: Duration) {
        if self.scheduler.processing {
            return;
        }
        let mut entries = core::mem::take(&mut self.scheduler.entries);
        self.scheduler.processing = true;
        self.scheduler.in_flight = entries.iter().map(|e| e.id).collect();

        let mut i = 0;
        while i < entries.len() {
            if self.scheduler.cancelled.contains(&entries[i].id) {
                let id = entries.remove(i).id;
                self.scheduler.in_flight.retain(|x| *x != id);
                release_dependents(&mut entries, id, None);
                release_dependents(&mut self.scheduler.entries, id, None);
                continue;
            }
            let e = &mut entries[i];
            if e.timing.after.is_some() {
                i += 1;
                continue;
            }
            let start = *e.start.get_or_insert(now);
            if now < start {
                i += 1;
                continue;
            }
            if !e.started {
                e.started = true;
                tracing::debug!(id = ?e.id, "activity started");
                e.activity.started(self);
            }
            let e = &mut entries[i];
            let elapsed = now - start;
            let total = e.timing.total_duration();
            if elapsed >= total {
                let t = e.timing.parameter(1.0);
                e.activity.step(self, t);
                let mut done = entries.remove(i);
                self.scheduler.in_flight.retain(|x| *x != done.id);
                done.activity.finished(self);
                tracing::debug!(id = ?done.id, "activity finished");
                let end = Some(start + total);
                release_dependents(&mut entries, done.id, end);
                release_dependents(&mut self.scheduler.entries, done.id, end);
            } else {
                let t = e.timing.parameter(e.timing.loop_fraction(elapsed));
                e.activity.step(self, t);
                i += 1;
            }
        }

        // Activities scheduled by hooks run from the next frame on.
        entries.append(&mut self.scheduler.entries);
        let cancelled = core::mem::take(&mut self.scheduler.cancelled);
        for id in cancelled {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                release_dependents(&mut entries, id, None);
            }
        }
        self.scheduler.entries = entries;
        self.scheduler.in_flight.clear();
        self.scheduler.processing = false;
    }
}
