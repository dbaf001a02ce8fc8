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

    dreampvr_config::lib.rs

    Configuration file parsing.
*/

//! The `dreampvr_config` crate parses DreamPVR's configuration file and overlays
//! command line arguments on top of it. Command line arguments always take
//! priority over the configuration file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

mod bpaf_config;

use std::path::{Path, PathBuf};

pub use bpaf_config::CmdLineArgs;
#[cfg(feature = "use_bpaf")]
use bpaf_config::cli_args;

use cfg_if::cfg_if;
use dreampvr_core::devices::pvr::PvrConfig;
use serde_derive::Deserialize;
use strum_macros::{Display, EnumIter, EnumString};

const fn _default_true() -> bool {
    true
}
const fn _default_frames() -> u64 {
    1
}
fn _default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// A display timing and framebuffer setup, applied through ordinary register
/// writes.
#[derive(Copy, Clone, Debug, Default, Deserialize, Display, EnumIter, EnumString, PartialEq, Eq)]
pub enum DisplayPreset {
    #[default]
    #[serde(rename = "vga")]
    #[strum(serialize = "vga")]
    Vga,
    #[serde(rename = "ntsc_i")]
    #[strum(serialize = "ntsc_i")]
    NtscInterlaced,
    #[serde(rename = "pal_i")]
    #[strum(serialize = "pal_i")]
    PalInterlaced,
}

/// How the bytes of a VRAM image file are laid out.
#[derive(Copy, Clone, Debug, Default, Deserialize, Display, EnumString, PartialEq, Eq)]
pub enum VramLayout {
    /// As seen through the 32-bit access path; converted on load.
    #[default]
    #[serde(rename = "linear")]
    #[strum(serialize = "linear")]
    Linear,
    /// A raw dump of the interleaved 64-bit layout.
    #[serde(rename = "native")]
    #[strum(serialize = "native")]
    Native,
}

#[derive(Copy, Clone, Debug, Default, Deserialize, Display, EnumIter, EnumString, PartialEq, Eq)]
pub enum FramebufferFormat {
    #[serde(rename = "rgb555")]
    #[strum(serialize = "rgb555")]
    Rgb555,
    #[default]
    #[serde(rename = "rgb565")]
    #[strum(serialize = "rgb565")]
    Rgb565,
    #[serde(rename = "rgb888")]
    #[strum(serialize = "rgb888")]
    Rgb888,
    #[serde(rename = "krgb0888")]
    #[strum(serialize = "krgb0888")]
    Krgb0888,
}

impl FramebufferFormat {
    /// Value of FB_R_CTRL.fb_depth.
    pub fn fb_depth(&self) -> u32 {
        match self {
            FramebufferFormat::Rgb555 => 0,
            FramebufferFormat::Rgb565 => 1,
            FramebufferFormat::Rgb888 => 2,
            FramebufferFormat::Krgb0888 => 3,
        }
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            FramebufferFormat::Rgb555 | FramebufferFormat::Rgb565 => 2,
            FramebufferFormat::Rgb888 => 3,
            FramebufferFormat::Krgb0888 => 4,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Emulator {
    #[serde(default = "_default_frames")]
    pub frames: u64,
    #[serde(default = "_default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub preset: DisplayPreset,
    pub vram_image: Option<PathBuf>,
    #[serde(default)]
    pub vram_image_layout: VramLayout,
    #[serde(default = "_default_true")]
    pub test_pattern: bool,
    #[serde(default)]
    pub fb_depth: FramebufferFormat,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            frames: _default_frames(),
            output_dir: _default_output_dir(),
            preset: DisplayPreset::default(),
            vram_image: None,
            vram_image_layout: VramLayout::default(),
            test_pattern: true,
            fb_depth: FramebufferFormat::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFileParams {
    #[serde(default)]
    pub emulator: Emulator,
    #[serde(default)]
    pub pvr: PvrConfig,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(frames) = shell_args.frames {
            self.emulator.frames = frames;
        }
        if let Some(preset) = shell_args.preset {
            self.emulator.preset = preset;
        }
        if let Some(output_dir) = shell_args.output_dir {
            self.emulator.output_dir = output_dir;
        }
        if let Some(vram_image) = shell_args.vram_image {
            self.emulator.vram_image = Some(vram_image);
        }
        if let Some(trace_file) = shell_args.trace_file {
            self.pvr.trace_file = Some(trace_file);
        }

        // A switch can only enable the pattern.
        self.emulator.test_pattern |= shell_args.test_pattern;
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);

    Ok(toml_args)
}

fn shell_args() -> CmdLineArgs {
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            shell_args = cli_args().run();
        } else {
            log::debug!("Argument reading disabled...");
            shell_args = CmdLineArgs::default();
        }
    }

    shell_args
}

/// Read the TOML configuration from a file path, parse and overlay command line
/// arguments. A missing file at the default path yields the default
/// configuration; a missing file named with --config_file is an error.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = shell_args();

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else if default_path.as_ref().exists() {
        std::fs::read_to_string(default_path)?
    }
    else {
        log::warn!(
            "Configuration file {} not found, using defaults",
            default_path.as_ref().display()
        );
        String::new()
    };

    read_config(toml_string, shell_args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SAMPLE: &str = r#"
[emulator]
frames = 8
output_dir = "frames"
preset = "ntsc_i"
vram_image = "dump.bin"
vram_image_layout = "native"
test_pattern = false
fb_depth = "krgb0888"

[pvr]
direct_write_detection = false
trace_file = "pvr_trace.log"
"#;

    #[test]
    fn parses_full_config() {
        let config = read_config(SAMPLE, CmdLineArgs::default()).unwrap();

        assert_eq!(config.emulator.frames, 8);
        assert_eq!(config.emulator.output_dir, PathBuf::from("frames"));
        assert_eq!(config.emulator.preset, DisplayPreset::NtscInterlaced);
        assert_eq!(config.emulator.vram_image, Some(PathBuf::from("dump.bin")));
        assert_eq!(config.emulator.vram_image_layout, VramLayout::Native);
        assert!(!config.emulator.test_pattern);
        assert_eq!(config.emulator.fb_depth, FramebufferFormat::Krgb0888);
        assert!(!config.pvr.direct_write_detection);
        assert_eq!(config.pvr.trace_file, Some(PathBuf::from("pvr_trace.log")));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = read_config("", CmdLineArgs::default()).unwrap();

        assert_eq!(config.emulator.frames, 1);
        assert_eq!(config.emulator.preset, DisplayPreset::Vga);
        assert_eq!(config.emulator.fb_depth, FramebufferFormat::Rgb565);
        assert!(config.emulator.test_pattern);
        assert!(config.pvr.direct_write_detection);
    }

    #[test]
    fn command_line_takes_priority() {
        let args = CmdLineArgs {
            frames: Some(2),
            preset: Some(DisplayPreset::PalInterlaced),
            output_dir: Some(PathBuf::from("elsewhere")),
            test_pattern: true,
            ..Default::default()
        };
        let config = read_config(SAMPLE, args).unwrap();

        assert_eq!(config.emulator.frames, 2);
        assert_eq!(config.emulator.preset, DisplayPreset::PalInterlaced);
        assert_eq!(config.emulator.output_dir, PathBuf::from("elsewhere"));
        assert!(config.emulator.test_pattern);
        // untouched by the command line
        assert_eq!(config.emulator.vram_image_layout, VramLayout::Native);
    }

    #[test]
    fn absent_test_pattern_switch_keeps_config_value() {
        let config = read_config("[emulator]\ntest_pattern = true", CmdLineArgs::default()).unwrap();
        assert!(config.emulator.test_pattern);

        let config = read_config(SAMPLE, CmdLineArgs::default()).unwrap();
        assert!(!config.emulator.test_pattern);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(read_config("[emulator]\npreset = \"secam\"", CmdLineArgs::default()).is_err());
        assert!(read_config("[emulator]\nframes = \"many\"", CmdLineArgs::default()).is_err());
    }

    #[test]
    fn enums_parse_from_strings() {
        assert_eq!(DisplayPreset::from_str("pal_i").unwrap(), DisplayPreset::PalInterlaced);
        assert_eq!(DisplayPreset::NtscInterlaced.to_string(), "ntsc_i");
        assert_eq!(FramebufferFormat::from_str("rgb888").unwrap().fb_depth(), 2);
        assert!(VramLayout::from_str("tiled").is_err());
    }
}
