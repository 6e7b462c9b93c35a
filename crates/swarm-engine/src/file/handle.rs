use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::memory::Buffer;

use super::FileError;

/// Longest path recorded in a [`File`] handle, in bytes.
pub const MAX_FILENAME_LENGTH: usize = 256;

/// A file loaded whole into arena memory.
#[derive(Debug)]
pub struct File<'a> {
    name: String,
    data: &'a [u8],
}

impl<'a> File<'a> {
    /// Loads the file at `path` into a slice of `buffer`.
    ///
    /// The slice is sized to exactly the file's length as reported by the
    /// filesystem. A read that yields fewer bytes than that is an error.
    /// Empty files load without touching `buffer`.
    pub fn load(path: impl AsRef<Path>, buffer: &mut Buffer<'a>) -> Result<Self, FileError> {
        let path = path.as_ref();
        Self::load_inner(path, buffer).inspect_err(|e| log::error!("File::load: {e}"))
    }

    fn load_inner(path: &Path, buffer: &mut Buffer<'a>) -> Result<Self, FileError> {
        let mut stream = fs::File::open(path).map_err(|source| FileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let len = stream
            .metadata()
            .map_err(|source| FileError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let size = usize::try_from(len).unwrap_or(usize::MAX);

        Self::read_sized(path, &mut stream, size, buffer)
    }

    /// Reads exactly `size` bytes of `stream` into a new slice of `buffer`.
    fn read_sized(
        path: &Path,
        stream: &mut impl Read,
        size: usize,
        buffer: &mut Buffer<'a>,
    ) -> Result<Self, FileError> {
        let name = bounded_name(path);
        if size == 0 {
            return Ok(Self { name, data: &[] });
        }

        let memory_error = |source| FileError::Memory {
            path: path.to_path_buf(),
            source,
        };
        let mut slice = buffer.slice(size).map_err(memory_error)?;
        let data = slice.reserve_bytes(size).map_err(memory_error)?;

        let read = read_fully(stream, data).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if read != size {
            return Err(FileError::ShortRead {
                path: path.to_path_buf(),
                expected: size,
                read,
            });
        }

        log::debug!("loaded {} ({size} bytes)", name);
        Ok(Self { name, data })
    }

    /// Source path, truncated to [`MAX_FILENAME_LENGTH`] bytes.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Writes `bytes` to `path`, replacing any existing file. Returns the byte count written.
pub fn write_to_file(path: impl AsRef<Path>, bytes: &[u8]) -> Result<usize, FileError> {
    let path = path.as_ref();

    let result = fs::File::create(path)
        .and_then(|mut stream| stream.write_all(bytes))
        .map(|()| bytes.len())
        .map_err(|source| FileError::Write {
            path: path.to_path_buf(),
            source,
        });

    result.inspect_err(|e| log::error!("write_to_file: {e}"))
}

fn read_fully(stream: &mut impl Read, out: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < out.len() {
        match stream.read(&mut out[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

fn bounded_name(path: &Path) -> String {
    let full = path.to_string_lossy();
    if full.len() <= MAX_FILENAME_LENGTH {
        return full.into_owned();
    }

    let mut end = MAX_FILENAME_LENGTH;
    while !full.is_char_boundary(end) {
        end -= 1;
    }
    full[..end].to_owned()
}
