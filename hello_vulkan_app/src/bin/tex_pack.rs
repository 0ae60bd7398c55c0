//! Convert an image file into the raw `.tex` format loaded by the renderer

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cube_engine::assets::texture::TextureData;
use cube_engine::foundation::logging;

#[derive(Parser, Debug)]
#[command(name = "tex_pack", about = "Pack a PNG into a .tex texture")]
struct Args {
    /// Source image
    input: PathBuf,

    /// Destination `.tex` file
    output: PathBuf,
}

fn pack(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let texture = TextureData::from_image_file(&args.input)?;
    std::fs::write(&args.output, texture.encode())?;
    log::info!(
        "Wrote {}x{} texture ({} bytes) to {}",
        texture.width(),
        texture.height(),
        texture.size_bytes(),
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    logging::init("info");
    let args = Args::parse();

    match pack(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Failed to pack {}: {}", args.input.display(), e);
            ExitCode::FAILURE
        }
    }
}
