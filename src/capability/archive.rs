//! ZIP container access for `.docx` and `.pptx` inputs.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::ArchiveReader;
use crate::error::ConvertError;

/// Largest entry [`ZipArchiveReader::read_text`] will inflate.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// [`ArchiveReader`] over the `zip` crate. Stateless; each call parses the
/// central directory of the bytes it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveReader;

fn open(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, ConvertError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| ConvertError::Archive {
        detail: format!("not a ZIP container: {e}"),
    })
}

impl ArchiveReader for ZipArchiveReader {
    fn entry_names(&self, archive: &[u8]) -> Result<Vec<String>, ConvertError> {
        Ok(open(archive)?.file_names().map(str::to_string).collect())
    }

    fn read_text(&self, archive: &[u8], name: &str) -> Result<String, ConvertError> {
        let mut zip = open(archive)?;
        let entry = zip.by_name(name).map_err(|e| ConvertError::Archive {
            detail: format!("{name}: {e}"),
        })?;
        if entry.size() > MAX_ENTRY_BYTES {
            return Err(ConvertError::Archive {
                detail: format!("{name}: declares {} bytes uncompressed", entry.size()),
            });
        }

        // The declared size is not trusted for the read either.
        let mut text = String::new();
        entry
            .take(MAX_ENTRY_BYTES + 1)
            .read_to_string(&mut text)
            .map_err(|e| ConvertError::Archive {
                detail: format!("{name}: {e}"),
            })?;
        if text.len() as u64 > MAX_ENTRY_BYTES {
            return Err(ConvertError::Archive {
                detail: format!("{name}: inflates past {MAX_ENTRY_BYTES} bytes"),
            });
        }
        Ok(text)
    }
}
