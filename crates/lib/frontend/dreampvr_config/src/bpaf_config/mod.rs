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

    dreampvr_config::bpaf_config::mod.rs

    Command line arguments. Every field is optional; anything given here takes
    priority over the configuration file.
*/

use std::path::PathBuf;

use crate::DisplayPreset;

#[cfg(feature = "use_bpaf")]
use bpaf::Bpaf;

#[cfg_attr(feature = "use_bpaf", derive(Bpaf))]
#[cfg_attr(feature = "use_bpaf", bpaf(options, version, generate(cli_args)))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    #[cfg_attr(feature = "use_bpaf", bpaf(long("config_file"), long("configfile")))]
    pub config_file: Option<PathBuf>,

    /// Number of frames to run
    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub frames: Option<u64>,

    /// Display mode: vga, ntsc_i or pal_i
    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub preset: Option<DisplayPreset>,

    #[cfg_attr(feature = "use_bpaf", bpaf(long("output_dir"), long("outputdir")))]
    pub output_dir: Option<PathBuf>,

    #[cfg_attr(feature = "use_bpaf", bpaf(long("vram_image")))]
    pub vram_image: Option<PathBuf>,

    /// Draw a test pattern into the framebuffer before running. Only turns the
    /// pattern on; set test_pattern = false in the config file to turn it off
    #[cfg_attr(feature = "use_bpaf", bpaf(long("test_pattern"), switch))]
    pub test_pattern: bool,

    #[cfg_attr(feature = "use_bpaf", bpaf(long("trace_file")))]
    pub trace_file: Option<PathBuf>,
}
