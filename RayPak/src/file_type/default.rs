//! Passthrough and error placeholders

use std::io::Write;

use super::{FileType, ThumbnailData};
use crate::error::{Error, Result};
use crate::utils::{FileExtension, ReadSeek, stream_len};

/// Members no other type claims. Nothing to preview, nothing to convert.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFileType;

impl FileType for DefaultFileType {
    fn name(&self) -> &'static str {
        "Default"
    }

    fn is_of_type(&self, _ext: &FileExtension) -> bool {
        false
    }

    fn import_formats(&self) -> Vec<String> {
        Vec::new()
    }

    fn export_formats(&self) -> Vec<String> {
        Vec::new()
    }

    fn load_thumbnail(&self, reader: &mut dyn ReadSeek, _ext: &FileExtension) -> Result<ThumbnailData> {
        Ok(ThumbnailData {
            thumbnail: None,
            info: vec![("Size".to_string(), format!("{} bytes", stream_len(reader)?))],
        })
    }

    fn convert_to(
        &self,
        _in_fmt: &FileExtension,
        _out_fmt: &FileExtension,
        _input: &mut dyn ReadSeek,
        _output: &mut dyn Write,
    ) -> Result<()> {
        Err(Error::unsupported(self.name(), "export"))
    }

    fn convert_from(
        &self,
        _in_fmt: &FileExtension,
        _out_fmt: &FileExtension,
        _current: Option<&mut dyn ReadSeek>,
        _input: &mut dyn ReadSeek,
        _output: &mut dyn Write,
    ) -> Result<()> {
        Err(Error::unsupported(self.name(), "import"))
    }
}

/// Stands in for a type whose codec rejected the member, keeping it listable
#[derive(Debug, Clone)]
pub struct ErrorFileType {
    message: String,
}

impl ErrorFileType {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl FileType for ErrorFileType {
    fn name(&self) -> &'static str {
        "Error"
    }

    fn is_of_type(&self, _ext: &FileExtension) -> bool {
        false
    }

    fn import_formats(&self) -> Vec<String> {
        Vec::new()
    }

    fn export_formats(&self) -> Vec<String> {
        Vec::new()
    }

    fn load_thumbnail(&self, _reader: &mut dyn ReadSeek, _ext: &FileExtension) -> Result<ThumbnailData> {
        Ok(ThumbnailData {
            thumbnail: None,
            info: vec![("Error".to_string(), self.message.clone())],
        })
    }

    fn convert_to(
        &self,
        _in_fmt: &FileExtension,
        _out_fmt: &FileExtension,
        _input: &mut dyn ReadSeek,
        _output: &mut dyn Write,
    ) -> Result<()> {
        Err(Error::unsupported(self.name(), "export"))
    }

    fn convert_from(
        &self,
        _in_fmt: &FileExtension,
        _out_fmt: &FileExtension,
        _current: Option<&mut dyn ReadSeek>,
        _input: &mut dyn ReadSeek,
        _output: &mut dyn Write,
    ) -> Result<()> {
        Err(Error::unsupported(self.name(), "import"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_default_is_passthrough_only() {
        let ext = FileExtension::new("isc.ckd");
        let thumb = DefaultFileType.load_thumbnail(&mut Cursor::new(vec![0; 12]), &ext).unwrap();
        assert!(thumb.thumbnail.is_none());
        assert_eq!(thumb.info, vec![("Size".to_string(), "12 bytes".to_string())]);

        let err = DefaultFileType
            .convert_to(&ext, &ext, &mut Cursor::new(Vec::new()), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_error_type_reports_message() {
        let error = ErrorFileType::new("failed to decode GF: bad header");
        let thumb = error
            .load_thumbnail(&mut Cursor::new(Vec::new()), &FileExtension::new("gf"))
            .unwrap();
        assert_eq!(thumb.info[0].1, error.message());
        assert!(error.export_formats().is_empty());
    }
}
