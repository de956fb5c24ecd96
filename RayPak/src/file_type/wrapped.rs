//! Cooked textures with a `TEX` header

use std::io::{Read, Seek, SeekFrom, Write};

use super::image::{decode_as, encodable_extensions, encode_as};
use super::{FileType, ImageFileType, ThumbnailData, copy_stream, shrink, sniff};
use crate::config::Platform;
use crate::error::Result;
use crate::image::wrapped::TEX_MAGIC;
use crate::image::{ImageFormat, PreferInnerSize, SizeHintPolicy, WrappedTextureFormat};
use crate::utils::{FileExtension, ReadSeek};

#[derive(Debug, Clone, Copy)]
pub struct WrappedTextureFileType<P = PreferInnerSize> {
    codec: WrappedTextureFormat<P>,
}

impl WrappedTextureFileType {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            codec: WrappedTextureFormat::new(platform),
        }
    }
}

impl<P: SizeHintPolicy> WrappedTextureFileType<P> {
    /// Resolve texture sizes with `policy` instead of the default
    #[must_use]
    pub fn with_policy<Q: SizeHintPolicy>(self, policy: Q) -> WrappedTextureFileType<Q> {
        WrappedTextureFileType {
            codec: self.codec.with_policy(policy),
        }
    }
}

impl<P: SizeHintPolicy + Send + Sync> FileType for WrappedTextureFileType<P> {
    fn name(&self) -> &'static str {
        "Cooked texture"
    }

    fn is_of_type(&self, ext: &FileExtension) -> bool {
        self.codec.extensions().iter().any(|e| *e == ext.full())
    }

    fn is_of_type_with_content(&self, ext: &FileExtension, reader: &mut dyn ReadSeek) -> bool {
        ext.primary() == "ckd"
            && sniff::<8>(reader).is_some_and(|magic| magic[4..8] == TEX_MAGIC.to_be_bytes())
    }

    fn import_formats(&self) -> Vec<String> {
        if self.codec.can_encode() {
            ImageFileType.import_formats()
        } else {
            Vec::new()
        }
    }

    fn export_formats(&self) -> Vec<String> {
        encodable_extensions()
    }

    fn load_thumbnail(&self, reader: &mut dyn ReadSeek, _ext: &FileExtension) -> Result<ThumbnailData> {
        reader.seek(SeekFrom::Start(0))?;
        let metadata = self.codec.get_metadata(reader)?;
        reader.seek(SeekFrom::Start(0))?;
        let image = self.codec.decode(reader)?;

        let mut info = vec![
            ("Format".to_string(), self.codec.name().to_string()),
            ("Platform".to_string(), self.codec.platform().as_str().to_string()),
        ];
        info.extend(metadata.info());
        Ok(ThumbnailData {
            thumbnail: Some(shrink(image.to_rgba_image()?)),
            info,
        })
    }

    fn convert_to(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()> {
        if in_fmt == out_fmt {
            return copy_stream(input, output);
        }
        input.seek(SeekFrom::Start(0))?;
        let image = self.codec.decode(input)?;
        encode_as(out_fmt, &image, output)
    }

    fn convert_from(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        current: Option<&mut dyn ReadSeek>,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()> {
        if in_fmt == out_fmt {
            return copy_stream(input, output);
        }
        let image = decode_as(in_fmt, input)?;

        let template = match current {
            Some(reader) => {
                let mut bytes = Vec::new();
                reader.seek(SeekFrom::Start(0))?;
                reader.read_to_end(&mut bytes)?;
                Some(bytes)
            }
            None => None,
        };
        self.codec.encode_with_template(&image, template.as_deref(), output)?;
        Ok(())
    }
}
