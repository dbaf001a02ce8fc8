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

    interrupt.rs

    Holly interrupt identifiers raised by the PVR, and a latch modelling the
    normal interrupt status register (ISTNRM).
*/

use strum_macros::{Display, EnumIter};

#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq, Hash)]
pub enum HollyInterrupt {
    /// PCVIINT
    VBlankIn,
    /// PCVOINT
    VBlankOut,
    /// PCHIINT
    HBlankIn,
}

impl HollyInterrupt {
    /// Bit position of this interrupt in ISTNRM.
    pub const fn istnrm_bit(&self) -> u32 {
        match self {
            HollyInterrupt::VBlankIn => 1 << 3,
            HollyInterrupt::VBlankOut => 1 << 4,
            HollyInterrupt::HBlankIn => 1 << 5,
        }
    }
}

/// Pending normal interrupts. Bits are set by `raise` and cleared by writing
/// ones through `acknowledge`, as on hardware.
#[derive(Copy, Clone, Debug, Default)]
pub struct InterruptStatus {
    istnrm: u32,
    raised: u64,
}

impl InterruptStatus {
    pub fn raise(&mut self, int: HollyInterrupt) {
        self.istnrm |= int.istnrm_bit();
        self.raised += 1;
    }

    pub fn is_pending(&self, int: HollyInterrupt) -> bool {
        self.istnrm & int.istnrm_bit() != 0
    }

    pub fn acknowledge(&mut self, mask: u32) {
        self.istnrm &= !mask;
    }

    pub fn istnrm(&self) -> u32 {
        self.istnrm
    }

    /// Total number of interrupts raised since creation, acknowledged or not.
    pub fn raised(&self) -> u64 {
        self.raised
    }
}
