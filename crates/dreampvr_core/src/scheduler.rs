/*
    DreamPVR

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    scheduler.rs

    Virtual-time timer queue.

    Devices arm timers through their host and never see the queue itself. The
    machine loop pulls expired timers out with `next_expired` and dispatches them
    by `TimerId`, so no callbacks or device references are stored here.
*/

use std::{cmp::Reverse, collections::BinaryHeap};

use fxhash::FxHashSet;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerId {
    PvrScanline,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

pub struct Scheduler {
    now_ns: u64,
    next_seq: u64,
    // (deadline, sequence). Sequence breaks ties in start order.
    queue: BinaryHeap<Reverse<(u64, u64, TimerId)>>,
    live: FxHashSet<u64>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            now_ns: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            live: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Number of armed timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    pub fn start_timer(&mut self, id: TimerId, delay_ns: u64) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;

        let deadline = self.now_ns.saturating_add(delay_ns);
        self.queue.push(Reverse((deadline, seq, id)));
        self.live.insert(seq);

        log::trace!("start_timer(): {:?} #{} due at {}ns", id, seq, deadline);
        TimerHandle(seq)
    }

    /// Cancel a timer. Cancelling a timer that has already fired or been cancelled
    /// is a no-op.
    pub fn cancel_timer(&mut self, handle: TimerHandle) {
        if self.live.remove(&handle.0) {
            log::trace!("cancel_timer(): #{}", handle.0);
        }
    }

    /// Deadline of the earliest live timer, if any.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_cancelled();
        self.queue.peek().map(|Reverse((deadline, _, _))| *deadline)
    }

    /// Pop the earliest live timer whose deadline is at or before `until_ns`,
    /// advancing virtual time to that deadline.
    pub fn next_expired(&mut self, until_ns: u64) -> Option<(TimerHandle, TimerId)> {
        self.discard_cancelled();

        let Reverse((deadline, seq, id)) = *self.queue.peek()?;
        if deadline > until_ns {
            return None;
        }
        self.queue.pop();
        self.live.remove(&seq);

        self.now_ns = self.now_ns.max(deadline);
        Some((TimerHandle(seq), id))
    }

    /// Move virtual time forward. Time never moves backwards.
    pub fn advance_to(&mut self, ns: u64) {
        self.now_ns = self.now_ns.max(ns);
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, seq, _))) = self.queue.peek() {
            if self.live.contains(seq) {
                break;
            }
            self.queue.pop();
        }
    }
}
