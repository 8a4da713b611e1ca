//! ROM loading: reads a binary image into a [`Memory8080`] at a given
//! offset, refusing images that would run past the end of the 64 KiB
//! address space.

use crate::error::LoaderError;
use emu_core::Memory8080;
use std::fs;
use std::path::Path;

/// Read the file at `path` and write its bytes into `memory` starting at
/// `offset`. Returns the number of bytes written.
pub fn load_rom(
    path: &Path,
    memory: &mut impl Memory8080,
    offset: u16,
) -> Result<usize, LoaderError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoaderError::Open {
                path: path.to_path_buf(),
                source,
            }
        } else {
            LoaderError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let end = offset as usize + bytes.len();
    if end > 0x10000 {
        return Err(LoaderError::TooLarge {
            path: path.to_path_buf(),
            size: bytes.len(),
            offset,
        });
    }

    for (i, &b) in bytes.iter().enumerate() {
        memory.write(offset + i as u16, b);
    }

    Ok(bytes.len())
}
