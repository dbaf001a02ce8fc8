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

    devices::pvr::vram.rs

    Video memory for the PVR.

    The Dreamcast has 8MB of VRAM split into two 4MB banks, reachable through
    two access paths:

    * the 64-bit path, where each bank is interleaved every 32 bits so that a
      64-bit data bus can be filled from both banks in parallel
    * the 32-bit path, where the banks are accessed sequentially, one after the
      other

    The TA uses the 64-bit path for polygon and texture transfers by default,
    so our internal layout matches the 64-bit view. Accesses through the
    32-bit path must be converted to an interleaved address with vram64().
*/

use crate::devices::pvr::PvrError;

pub const VRAM_BANK_SIZE: u32 = 0x0040_0000;
pub const VRAM_SIZE: usize = (VRAM_BANK_SIZE as usize) * 2;

/// Convert an address on the 32-bit (linear) access path to the address of the
/// same bytes in the interleaved 64-bit layout.
#[inline]
pub const fn vram64(addr32: u32) -> u32 {
    let bank = addr32 & VRAM_BANK_SIZE;
    let offset = addr32 & (VRAM_BANK_SIZE - 1);
    ((offset & !0x3) << 1) | (bank >> 20) | (offset & 0x3)
}

/// Width of a masked access, as used by the memory map. A mask of 0xFF is a byte
/// access, 0xFFFF a halfword access and anything else a full word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessWidth {
    Byte,
    Half,
    Word,
}

impl AccessWidth {
    #[inline]
    pub fn from_mask(mask: u32) -> Self {
        match mask {
            0x0000_00FF => AccessWidth::Byte,
            0x0000_FFFF => AccessWidth::Half,
            _ => AccessWidth::Word,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            AccessWidth::Byte => 1,
            AccessWidth::Half => 2,
            AccessWidth::Word => 4,
        }
    }
}

/// Bounds-checked view over the interleaved VRAM buffer. All multi-byte values
/// are little-endian.
pub struct Vram {
    mem: Box<[u8]>,
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl Vram {
    pub fn new() -> Self {
        Self {
            mem: vec![0u8; VRAM_SIZE].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mem.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    #[inline]
    fn span(&self, addr: u32, len: usize) -> Result<std::ops::Range<usize>, PvrError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.mem.len() => Ok(start..end),
            _ => Err(PvrError::VramOutOfBounds { addr, len }),
        }
    }

    pub fn read_u8(&self, addr: u32) -> Result<u8, PvrError> {
        let r = self.span(addr, 1)?;
        Ok(self.mem[r.start])
    }

    pub fn read_u16(&self, addr: u32) -> Result<u16, PvrError> {
        let r = self.span(addr, 2)?;
        Ok(u16::from_le_bytes([self.mem[r.start], self.mem[r.start + 1]]))
    }

    pub fn read_u32(&self, addr: u32) -> Result<u32, PvrError> {
        let r = self.span(addr, 4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.mem[r]);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_u8(&mut self, addr: u32, data: u8) -> Result<(), PvrError> {
        let r = self.span(addr, 1)?;
        self.mem[r.start] = data;
        Ok(())
    }

    pub fn write_u16(&mut self, addr: u32, data: u16) -> Result<(), PvrError> {
        let r = self.span(addr, 2)?;
        self.mem[r].copy_from_slice(&data.to_le_bytes());
        Ok(())
    }

    pub fn write_u32(&mut self, addr: u32, data: u32) -> Result<(), PvrError> {
        let r = self.span(addr, 4)?;
        self.mem[r].copy_from_slice(&data.to_le_bytes());
        Ok(())
    }

    /// Read a value whose width is selected by `mask`. The result is zero-extended.
    pub fn read_masked(&self, addr: u32, mask: u32) -> Result<u32, PvrError> {
        match AccessWidth::from_mask(mask) {
            AccessWidth::Byte => self.read_u8(addr).map(u32::from),
            AccessWidth::Half => self.read_u16(addr).map(u32::from),
            AccessWidth::Word => self.read_u32(addr),
        }
    }

    /// Write `data & mask` with the access width selected by `mask`.
    pub fn write_masked(&mut self, addr: u32, data: u32, mask: u32) -> Result<(), PvrError> {
        match AccessWidth::from_mask(mask) {
            AccessWidth::Byte => self.write_u8(addr, (data & mask) as u8),
            AccessWidth::Half => self.write_u16(addr, (data & mask) as u16),
            AccessWidth::Word => self.write_u32(addr, data & mask),
        }
    }

    /// Read `N` bytes at an interleaved address. The address decoder only sees
    /// the low 23 bits, so a run that crosses the end of VRAM continues at 0.
    #[inline]
    pub fn read_wrapping<const N: usize>(&self, addr: u32) -> [u8; N] {
        let mut bytes = [0u8; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.mem[(addr as usize + i) % VRAM_SIZE];
        }
        bytes
    }

    /// Write a little-endian word at an interleaved address, wrapping at the end
    /// of VRAM like read_wrapping().
    #[inline]
    pub fn write_u32_wrapping(&mut self, addr: u32, data: u32) {
        for (i, byte) in data.to_le_bytes().into_iter().enumerate() {
            self.mem[(addr as usize + i) % VRAM_SIZE] = byte;
        }
    }

    /// Copy a buffer in at an interleaved address.
    pub fn copy_from(&mut self, src: &[u8], addr: u32) -> Result<(), PvrError> {
        let r = self.span(addr, src.len())?;
        self.mem[r].copy_from_slice(src);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.mem.fill(0);
    }
}
