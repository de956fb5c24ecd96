//! Classification of archive members into handling strategies
//!
//! Each [`FileType`] knows which extensions it claims, how to thumbnail a
//! member, and how to convert to and from foreign formats. The
//! [`FileTypeRegistry`] tries them in a fixed priority order.

mod default;
mod image;
mod wave;
mod wrapped;

use std::fmt::Debug;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use ::image::RgbaImage;

use crate::config::Platform;
use crate::error::Result;
use crate::utils::{FileExtension, ReadSeek};

pub use self::default::{DefaultFileType, ErrorFileType};
pub use self::image::ImageFileType;
pub use self::wave::{WaveFileType, WaveInfo};
pub use self::wrapped::WrappedTextureFileType;

/// Longest edge of a generated thumbnail
pub const THUMBNAIL_SIZE: u32 = 256;

/// Preview of one member: an optional bitmap plus display key/value pairs
#[derive(Debug, Clone, Default)]
pub struct ThumbnailData {
    pub thumbnail: Option<RgbaImage>,
    pub info: Vec<(String, String)>,
}

/// Handling strategy for one category of member content
pub trait FileType: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the extension alone identifies this type
    fn is_of_type(&self, ext: &FileExtension) -> bool;

    /// Content sniff for members the extension cannot settle. Off unless a type opts in.
    fn is_of_type_with_content(&self, ext: &FileExtension, reader: &mut dyn ReadSeek) -> bool {
        let _ = (ext, reader);
        false
    }

    /// Extensions accepted as import sources
    fn import_formats(&self) -> Vec<String>;

    /// Extensions a member can be exported as
    fn export_formats(&self) -> Vec<String>;

    /// Preview the member. Errors mean the content does not match this type.
    fn load_thumbnail(&self, reader: &mut dyn ReadSeek, ext: &FileExtension) -> Result<ThumbnailData>;

    /// Export: decode native bytes and re-encode as `out_fmt`
    fn convert_to(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()>;

    /// Import: turn a foreign file into native bytes.
    ///
    /// `current` holds the member's existing bytes for formats that keep a
    /// header from them.
    fn convert_from(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        current: Option<&mut dyn ReadSeek>,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()>;
}

/// Verbatim copy for same-format conversions
pub(crate) fn copy_stream(input: &mut dyn ReadSeek, output: &mut dyn Write) -> Result<()> {
    input.seek(SeekFrom::Start(0))?;
    std::io::copy(input, output)?;
    Ok(())
}

/// First `N` bytes of a stream, rewinding before and after
pub(crate) fn sniff<const N: usize>(reader: &mut dyn ReadSeek) -> Option<[u8; N]> {
    let mut magic = [0u8; N];
    let read = reader
        .seek(SeekFrom::Start(0))
        .and_then(|_| reader.read_exact(&mut magic));
    let _ = reader.seek(SeekFrom::Start(0));
    read.ok().map(|()| magic)
}

/// Downscale to fit [`THUMBNAIL_SIZE`]
pub(crate) fn shrink(image: RgbaImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= THUMBNAIL_SIZE && h <= THUMBNAIL_SIZE {
        return image;
    }
    let scale = f64::from(THUMBNAIL_SIZE) / f64::from(w.max(h));
    let tw = ((f64::from(w) * scale).round() as u32).max(1);
    let th = ((f64::from(h) * scale).round() as u32).max(1);
    ::image::imageops::thumbnail(&image, tw, th)
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered set of file types with a default fallback
#[derive(Debug, Clone)]
pub struct FileTypeRegistry {
    types: Vec<Arc<dyn FileType>>,
    fallback: Arc<dyn FileType>,
}

impl FileTypeRegistry {
    /// Built-in types for archives cooked for `platform`:
    /// wrapped texture, image, wave, then default
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            types: vec![
                Arc::new(WrappedTextureFileType::new(platform)),
                Arc::new(ImageFileType::new()),
                Arc::new(WaveFileType),
            ],
            fallback: Arc::new(DefaultFileType),
        }
    }

    /// Registry with caller-supplied types in priority order
    #[must_use]
    pub fn with_types(types: Vec<Arc<dyn FileType>>) -> Self {
        Self {
            types,
            fallback: Arc::new(DefaultFileType),
        }
    }

    #[must_use]
    pub fn types(&self) -> &[Arc<dyn FileType>] {
        &self.types
    }

    #[must_use]
    pub fn fallback(&self) -> Arc<dyn FileType> {
        Arc::clone(&self.fallback)
    }

    /// Classify the member at `path`.
    ///
    /// The extension decides first. When several types claim it, or none
    /// does, `content` is sniffed to narrow the choice. Without a match the
    /// default type is returned.
    pub fn classify(&self, path: &str, mut content: Option<&mut dyn ReadSeek>) -> Arc<dyn FileType> {
        let Some(ext) = FileExtension::from_path(path) else {
            return self.fallback();
        };

        let by_extension: Vec<&Arc<dyn FileType>> = self.types.iter().filter(|t| t.is_of_type(&ext)).collect();
        if let [only] = by_extension.as_slice() {
            return Arc::clone(only);
        }

        let candidates = if by_extension.is_empty() {
            self.types.iter().collect()
        } else {
            by_extension.clone()
        };
        if let Some(reader) = content.as_deref_mut() {
            for candidate in &candidates {
                if candidate.is_of_type_with_content(&ext, reader) {
                    tracing::debug!("{path}: classified as {} by content", candidate.name());
                    return Arc::clone(candidate);
                }
            }
        }

        by_extension.first().map_or_else(|| self.fallback(), |t| Arc::clone(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_classify_by_extension() {
        let registry = FileTypeRegistry::new(Platform::Pc);
        assert_eq!(registry.classify("world/logo.tga.ckd", None).name(), "Cooked texture");
        assert_eq!(registry.classify("a/b.GF", None).name(), "Image");
        assert_eq!(registry.classify("a/b.png", None).name(), "Image");
        assert_eq!(registry.classify("sound/jump.wav", None).name(), "Wave audio");
        assert_eq!(registry.classify("scene.isc.ckd", None).name(), "Default");
        assert_eq!(registry.classify("README", None).name(), "Default");
    }

    #[test]
    fn test_classify_by_content() {
        let registry = FileTypeRegistry::new(Platform::Pc);

        let mut tex = vec![0, 0, 0, 9];
        tex.extend_from_slice(b"TEX\0");
        tex.extend_from_slice(&[0; 36]);
        let mut reader = Cursor::new(tex);
        assert_eq!(
            registry.classify("logo.ckd", Some(&mut reader)).name(),
            "Cooked texture"
        );
        assert_eq!(reader.position(), 0);

        let mut riff = Cursor::new(b"RIFF\0\0\0\0WAVEfmt ".to_vec());
        assert_eq!(registry.classify("voice.snd", Some(&mut riff)).name(), "Wave audio");

        let mut other = Cursor::new(b"plain text".to_vec());
        assert_eq!(registry.classify("scene.isc.ckd", Some(&mut other)).name(), "Default");
    }
}
