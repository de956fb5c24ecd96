//! RIFF/WAVE audio: info only, no transcoding

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{FileType, ThumbnailData, copy_stream, sniff};
use crate::error::{Error, Result};
use crate::utils::{FileExtension, ReadSeek};

/// Stream properties read from the `fmt ` and `data` chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveInfo {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WaveInfo {
    /// Walk the RIFF chunks up to `data`
    pub fn read<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        let _riff_size = reader.read_u32::<LittleEndian>()?;
        let mut form = [0u8; 4];
        reader.read_exact(&mut form)?;
        if &tag != b"RIFF" || &form != b"WAVE" {
            return Err(Error::decode("WAVE", "missing RIFF/WAVE signature"));
        }

        let mut format = None;
        loop {
            reader.read_exact(&mut tag)?;
            let size = reader.read_u32::<LittleEndian>()?;
            match &tag {
                b"fmt " => {
                    if size < 16 {
                        return Err(Error::decode("WAVE", format!("fmt chunk of {size} bytes")));
                    }
                    format = Some((
                        reader.read_u16::<LittleEndian>()?,
                        reader.read_u16::<LittleEndian>()?,
                        reader.read_u32::<LittleEndian>()?,
                        reader.read_u32::<LittleEndian>()?,
                        {
                            let _block_align = reader.read_u16::<LittleEndian>()?;
                            reader.read_u16::<LittleEndian>()?
                        },
                    ));
                    // Chunks are padded to even sizes
                    reader.seek(SeekFrom::Current(i64::from(size - 16 + (size & 1))))?;
                }
                b"data" => {
                    let (format_tag, channels, sample_rate, byte_rate, bits_per_sample) =
                        format.ok_or_else(|| Error::decode("WAVE", "data chunk before fmt chunk"))?;
                    return Ok(Self {
                        format_tag,
                        channels,
                        sample_rate,
                        byte_rate,
                        bits_per_sample,
                        data_size: size,
                    });
                }
                _ => {
                    reader.seek(SeekFrom::Current(i64::from(size) + i64::from(size & 1)))?;
                }
            }
        }
    }

    /// Playback length in seconds
    #[must_use]
    pub fn duration(&self) -> f64 {
        if self.byte_rate == 0 {
            0.0
        } else {
            f64::from(self.data_size) / f64::from(self.byte_rate)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaveFileType;

impl FileType for WaveFileType {
    fn name(&self) -> &'static str {
        "Wave audio"
    }

    fn is_of_type(&self, ext: &FileExtension) -> bool {
        ext.primary() == "wav"
    }

    fn is_of_type_with_content(&self, _ext: &FileExtension, reader: &mut dyn ReadSeek) -> bool {
        sniff::<12>(reader).is_some_and(|magic| &magic[..4] == b"RIFF" && &magic[8..] == b"WAVE")
    }

    fn import_formats(&self) -> Vec<String> {
        vec!["wav".to_string()]
    }

    fn export_formats(&self) -> Vec<String> {
        vec!["wav".to_string()]
    }

    fn load_thumbnail(&self, reader: &mut dyn ReadSeek, _ext: &FileExtension) -> Result<ThumbnailData> {
        reader.seek(SeekFrom::Start(0))?;
        let info = WaveInfo::read(reader)?;
        Ok(ThumbnailData {
            thumbnail: None,
            info: vec![
                ("Channels".to_string(), info.channels.to_string()),
                ("Sample rate".to_string(), format!("{} Hz", info.sample_rate)),
                ("Bits per sample".to_string(), info.bits_per_sample.to_string()),
                ("Duration".to_string(), format!("{:.2} s", info.duration())),
            ],
        })
    }

    fn convert_to(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()> {
        if in_fmt.primary() == "wav" && out_fmt.primary() == "wav" {
            copy_stream(input, output)
        } else {
            Err(Error::unsupported(self.name(), format!("conversion to {out_fmt}")))
        }
    }

    fn convert_from(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        _current: Option<&mut dyn ReadSeek>,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()> {
        if in_fmt.primary() == "wav" && out_fmt.primary() == "wav" {
            copy_stream(input, output)
        } else {
            Err(Error::unsupported(self.name(), format!("conversion from {in_fmt}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 16-bit stereo 22050 Hz with a LIST chunk before the data
    fn wave(samples: u32) -> Vec<u8> {
        let data_size = samples * 4;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(4 + 24 + 14 + 8 + data_size).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&22050u32.to_le_bytes());
        out.extend_from_slice(&(22050u32 * 4).to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"LIST");
        out.extend_from_slice(&5u32.to_le_bytes());
        out.extend_from_slice(b"INFOx\0");
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_size.to_le_bytes());
        out.resize(out.len() + data_size as usize, 0);
        out
    }

    #[test]
    fn test_wave_info() {
        let info = WaveInfo::read(&mut Cursor::new(wave(11025))).unwrap();
        assert_eq!((info.channels, info.sample_rate, info.bits_per_sample), (2, 22050, 16));
        assert!((info.duration() - 0.5).abs() < 1e-9);

        let thumb = WaveFileType
            .load_thumbnail(&mut Cursor::new(wave(22050)), &FileExtension::new("wav"))
            .unwrap();
        assert!(thumb.thumbnail.is_none());
        assert!(thumb.info.contains(&("Duration".to_string(), "1.00 s".to_string())));
    }

    #[test]
    fn test_only_wav_copies() {
        let wav = FileExtension::new("wav");
        let bytes = wave(4);
        let mut out = Vec::new();
        WaveFileType
            .convert_to(&wav, &wav, &mut Cursor::new(bytes.clone()), &mut out)
            .unwrap();
        assert_eq!(out, bytes);

        let err = WaveFileType
            .convert_to(&wav, &FileExtension::new("ogg"), &mut Cursor::new(bytes), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_not_a_wave() {
        let err = WaveFileType
            .load_thumbnail(&mut Cursor::new(b"RIFF\0\0\0\0AVI ".to_vec()), &FileExtension::new("wav"))
            .unwrap_err();
        assert!(err.is_codec_error());
    }
}
