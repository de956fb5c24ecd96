//! CLI command for standalone texture and image conversion

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::Platform;
use crate::image::{
    DdsImageFormat, GfImageFormat, ImageFormat, WrappedTextureFormat, format_for_extension,
};
use crate::utils::FileExtension;

/// Codec for a file path: cooked textures by their `.ckd` suffix, others by extension
fn codec_for(path: &Path, mipmaps: bool, platform: Platform) -> anyhow::Result<Box<dyn ImageFormat>> {
    let name = path.to_string_lossy();
    let ext = FileExtension::from_path(&name)
        .ok_or_else(|| anyhow::anyhow!("Cannot detect format of {}", path.display()))?;

    let codec: Box<dyn ImageFormat> = match ext.primary() {
        "ckd" => Box::new(WrappedTextureFormat::new(platform)),
        "gf" => Box::new(GfImageFormat::default().with_mipmaps(mipmaps)),
        "dds" => Box::new(DdsImageFormat { mipmaps }),
        other => format_for_extension(other)
            .ok_or_else(|| anyhow::anyhow!("Unsupported format: {}", ext))?,
    };
    Ok(codec)
}

pub fn execute(source: &Path, destination: &Path, mipmaps: bool, platform: Platform) -> anyhow::Result<()> {
    let input = codec_for(source, mipmaps, platform)?;
    let output = codec_for(destination, mipmaps, platform)?;
    if !output.can_encode() {
        anyhow::bail!("{} files cannot be written", output.name());
    }

    println!("Converting {} -> {}", input.name(), output.name());
    let image = input.decode(&mut BufReader::new(File::open(source)?))?;

    let mut writer = BufWriter::new(File::create(destination)?);
    let metadata = output.encode(&image, &mut writer)?;
    writer.flush()?;

    println!(
        "Wrote {} ({}x{}, {} mipmaps, {})",
        destination.display(),
        metadata.width,
        metadata.height,
        metadata.mipmaps_count,
        metadata.encoding
    );
    Ok(())
}
