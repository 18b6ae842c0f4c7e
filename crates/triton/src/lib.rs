use std::path::Path;

use anyhow::{Context, Result};
use triton_core::font::{FontRom, FONT_FILE};
use triton_core::rom;
use triton_core::{TritonApp, TritonMachine};
use triton_sdl2::{App, SdlContext, SdlInitInfo};

/// Assemble the machine for the selected ROM variant and hand it to the
/// SDL2 frontend. Returns once the window closes or F9 is pressed.
pub fn run(variant_arg: Option<&str>) -> Result<()> {
    let variant = rom::parse_variant(variant_arg)?;
    log::info!("ROM variant: {variant:?}");

    let mut machine = TritonMachine::new();
    rom::load_variant(machine.memory_mut(), variant).context("loading ROM set")?;
    let font = FontRom::load(Path::new(FONT_FILE)).context("loading character generator")?;

    let app = TritonApp::new(machine, font);
    let init_info = SdlInitInfo::builder()
        .width(app.width())
        .height(app.height())
        .scale(app.scale())
        .title(app.title())
        .build();
    SdlContext::run(init_info, app)
}
