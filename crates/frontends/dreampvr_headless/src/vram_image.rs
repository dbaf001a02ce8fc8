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

    dreampvr_headless::vram_image.rs

    Loading VRAM contents from a file.
*/

use std::path::Path;

use anyhow::{bail, Context};
use dreampvr_config::VramLayout;
use dreampvr_core::devices::pvr::{
    vram::{vram64, VRAM_SIZE},
    Pvr,
};

/// Copy `data` into VRAM starting at address 0. Linear images are in 32-bit path
/// order and are interleaved on the way in; native images are copied verbatim.
pub fn load_vram_bytes(pvr: &mut Pvr, data: &[u8], layout: VramLayout) -> anyhow::Result<()> {
    if data.len() > VRAM_SIZE {
        bail!("VRAM image is {} bytes, larger than VRAM ({} bytes)", data.len(), VRAM_SIZE);
    }

    match layout {
        VramLayout::Native => pvr.vram_mut().copy_from(data, 0)?,
        VramLayout::Linear => {
            for (i, word) in data.chunks(4).enumerate() {
                pvr.vram_mut().copy_from(word, vram64((i * 4) as u32))?;
            }
        }
    }
    Ok(())
}

pub fn load_vram_image(pvr: &mut Pvr, path: &Path, layout: VramLayout) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read VRAM image {}", path.display()))?;
    log::info!("Loading {} byte {} VRAM image {}", data.len(), layout, path.display());
    load_vram_bytes(pvr, &data, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreampvr_core::devices::pvr::PvrConfig;

    #[test]
    fn linear_image_reads_back_through_32bit_path() {
        let mut pvr = Pvr::new(PvrConfig::default());
        let mut data = vec![0u8; 0x0040_0010];
        data[0..4].copy_from_slice(&0x1122_3344u32.to_le_bytes());
        data[0x0040_0008..0x0040_000C].copy_from_slice(&0x5566_7788u32.to_le_bytes());
        data[0x0040_000C] = 0x99;

        load_vram_bytes(&mut pvr, &data, VramLayout::Linear).unwrap();
        assert_eq!(pvr.vram32_read(0, 0xFFFF_FFFF).unwrap(), 0x1122_3344);
        assert_eq!(pvr.vram32_read(0x0040_0008, 0xFFFF_FFFF).unwrap(), 0x5566_7788);
        assert_eq!(pvr.vram32_read(0x0040_000C, 0xFF).unwrap(), 0x99);
        // bank 1 word 2 sits at interleaved offset 0x14
        assert_eq!(pvr.vram64_read(0x14, 0xFFFF_FFFF).unwrap(), 0x5566_7788);
    }

    #[test]
    fn native_image_is_copied_verbatim() {
        let mut pvr = Pvr::new(PvrConfig::default());
        load_vram_bytes(&mut pvr, &[1, 2, 3, 4, 5, 6, 7, 8], VramLayout::Native).unwrap();
        assert_eq!(pvr.vram64_read(4, 0xFFFF_FFFF).unwrap(), 0x0807_0605);
        assert_eq!(pvr.vram32_read(0x0040_0000, 0xFFFF_FFFF).unwrap(), 0x0807_0605);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut pvr = Pvr::new(PvrConfig::default());
        let data = vec![0u8; VRAM_SIZE + 1];
        assert!(load_vram_bytes(&mut pvr, &data, VramLayout::Native).is_err());
    }
}
