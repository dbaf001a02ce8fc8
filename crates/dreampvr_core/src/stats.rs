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

    stats.rs

    Named diagnostic counters.
*/

use strum::EnumCount as _;
use strum_macros::{Display, EnumCount, EnumIter};

#[derive(Copy, Clone, Debug, Display, EnumCount, EnumIter, PartialEq, Eq, Hash)]
pub enum Counter {
    #[strum(to_string = "pvr_vblanks")]
    PvrVblanks,
    #[strum(to_string = "pvr_frames_pushed")]
    PvrFramesPushed,
    #[strum(to_string = "ta_commands")]
    TaCommands,
}

#[derive(Clone, Debug, Default)]
pub struct Counters {
    counts: [u64; Counter::COUNT],
}

impl Counters {
    #[inline]
    pub fn add(&mut self, counter: Counter, n: u64) {
        self.counts[counter as usize] = self.counts[counter as usize].wrapping_add(n);
    }

    #[inline]
    pub fn get(&self, counter: Counter) -> u64 {
        self.counts[counter as usize]
    }

    pub fn reset(&mut self) {
        self.counts = [0; Counter::COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn counters_accumulate_independently() {
        let mut counters = Counters::default();
        counters.add(Counter::PvrVblanks, 1);
        counters.add(Counter::PvrVblanks, 2);
        counters.add(Counter::TaCommands, 5);

        assert_eq!(counters.get(Counter::PvrVblanks), 3);
        assert_eq!(counters.get(Counter::TaCommands), 5);
        assert_eq!(counters.get(Counter::PvrFramesPushed), 0);

        counters.reset();
        assert!(Counter::iter().all(|c| counters.get(c) == 0));
    }

    #[test]
    fn counter_names() {
        assert_eq!(Counter::PvrVblanks.to_string(), "pvr_vblanks");
    }
}
