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

    dreampvr_headless::lib.rs

    Headless front end main library component.
*/

//! DreamPVR headless front end. Sets up a display mode, fills the framebuffer
//! from a VRAM image or a test pattern, runs the PVR for a number of frames and
//! writes every frame it pushes to PNG.

#![forbid(unsafe_code)]

pub mod output;
pub mod pattern;
pub mod presets;
pub mod vram_image;

use anyhow::Context;
use dreampvr_config::ConfigFileParams;
use dreampvr_core::{machine::Machine, stats::Counter};

use crate::{output::save_frame, pattern::draw_test_pattern, presets::apply_preset, vram_image::load_vram_image};

/// Run the configured number of frames. Returns the number of frames written.
pub fn run_headless(config: &ConfigFileParams) -> anyhow::Result<u64> {
    let emu = &config.emulator;
    let mut machine = Machine::new(config.pvr.clone());

    let layout = apply_preset(&mut machine, emu.preset, emu.fb_depth)?;

    if let Some(path) = &emu.vram_image {
        load_vram_image(machine.pvr_mut(), path, emu.vram_image_layout)?;
    }
    else if emu.test_pattern {
        draw_test_pattern(machine.pvr_mut(), &layout)?;
    }

    std::fs::create_dir_all(&emu.output_dir)
        .with_context(|| format!("Failed to create output directory {}", emu.output_dir.display()))?;

    let mut written = 0;
    for _ in 0..emu.frames {
        if machine.run_frames(1)? == 0 {
            log::warn!("PVR stopped producing frames");
            break;
        }
        if let Some(frame) = machine.bus_mut().take_frame() {
            save_frame(&frame, &emu.output_dir, written)?;
            written += 1;
        }
    }

    let counters = machine.bus().counters();
    log::info!(
        "Ran {} vblanks in {}ns of emulated time: {} frames pushed, {} written",
        counters.get(Counter::PvrVblanks),
        machine.now_ns(),
        counters.get(Counter::PvrFramesPushed),
        written
    );

    machine.destroy();
    Ok(written)
}

pub fn run() {
    env_logger::init();

    let config = match dreampvr_config::read_config_file("./dreampvr.toml") {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(e) => {
                eprintln!("IO error reading configuration file:\n{}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!(
                    "Failed to parse configuration file. There may be a typo or otherwise invalid toml:\n{}",
                    e
                );
                std::process::exit(1);
            }
        },
    };

    match run_headless(&config) {
        Ok(frames) => {
            println!("Wrote {} frame(s) to {}", frames, config.emulator.output_dir.display());
        }
        Err(e) => {
            log::error!("Emulation failed: {:#}", e);
            eprintln!("Emulation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreampvr_config::{read_config, CmdLineArgs};

    #[test]
    fn test_pattern_run_writes_every_frame() {
        let dir = std::env::temp_dir().join(format!("dreampvr_headless_{}", std::process::id()));
        let toml = format!(
            "[emulator]\nframes = 3\npreset = \"ntsc_i\"\nfb_depth = \"rgb565\"\noutput_dir = '{}'\n",
            dir.display()
        );
        let config = read_config(toml, CmdLineArgs::default()).unwrap();

        assert_eq!(run_headless(&config).unwrap(), 3);
        for i in 0..3 {
            assert!(dir.join(format!("frame_{:05}.png", i)).exists());
        }
        _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn blank_vram_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("dreampvr_headless_blank_{}", std::process::id()));
        let toml = format!(
            "[emulator]\nframes = 2\ntest_pattern = false\noutput_dir = '{}'\n",
            dir.display()
        );
        let config = read_config(toml, CmdLineArgs::default()).unwrap();

        // Zeroed VRAM doesn't carry the cookie, so it reads as a direct write.
        assert_eq!(run_headless(&config).unwrap(), 2);
        _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn disabled_detection_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("dreampvr_headless_fatal_{}", std::process::id()));
        let toml = format!(
            "[emulator]\nframes = 1\noutput_dir = '{}'\n[pvr]\ndirect_write_detection = false\n",
            dir.display()
        );
        let config = read_config(toml, CmdLineArgs::default()).unwrap();
        assert_eq!(run_headless(&config).unwrap(), 0);
        _ = std::fs::remove_dir_all(&dir);
    }
}
