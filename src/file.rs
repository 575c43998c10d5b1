//! Mapping request targets to files under the document root.

use std::fs::{File, Metadata};
use std::io::{self, Read, Write};
use std::os::unix::fs::PermissionsExt;

use crate::config::{CHUNK_SIZE, INDEX_ALIASES, INDEX_NAME};
use crate::error::RequestError;
use crate::mime;

/// A file that passed every check and is open for reading. Dropping it closes the file.
#[derive(Debug)]
pub struct ResolvedFile {
    /// Target after query stripping and index rewriting.
    pub target: String,
    pub path: String,
    metadata: Metadata,
    file: File,
}

impl ResolvedFile {
    /// Resolve a validated target against `wwwroot` and open the file.
    pub fn open(wwwroot: &str, target: &str) -> Result<Self, RequestError> {
        let target = safe_target(target).ok_or(RequestError::InvalidTarget)?;
        let target = if INDEX_ALIASES.contains(&target) {
            INDEX_NAME
        } else {
            target
        };
        let path = format!("{}{}", wwwroot, target);

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) if !metadata.is_dir() => metadata,
            _ => return Err(RequestError::NotFound),
        };
        if !is_world_readable(&metadata) {
            return Err(RequestError::Forbidden);
        }
        // The file may have vanished since the stat.
        let file = File::open(&path).map_err(|_| RequestError::NotFound)?;

        Ok(Self {
            target: target.to_string(),
            path,
            metadata,
            file,
        })
    }

    /// Size reported by the stat, which is what Content-Length promises.
    pub fn content_length(&self) -> u64 {
        self.metadata.len()
    }

    pub fn content_type(&self) -> &'static str {
        mime::content_type(&self.target)
    }

    /// Stream exactly `content_length()` bytes of the file to `out` in CHUNK_SIZE pieces.
    ///
    /// Fails with `UnexpectedEof` if the file shrank since it was resolved.
    pub fn send_to<W: Write>(self, out: &mut W) -> io::Result<u64> {
        let len = self.content_length();
        let mut body = self.file.take(len);
        let mut buf = [0; CHUNK_SIZE];
        let mut sent = 0;
        loop {
            let read = match body.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            out.write_all(&buf[..read])?;
            sent += read as u64;
        }
        if sent < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank to {} of {} bytes", sent, len),
            ));
        }
        Ok(sent)
    }
}

/// Is the read permission bit for others set?
fn is_world_readable(metadata: &Metadata) -> bool {
    metadata.permissions().mode() & u32::from(libc::S_IROTH) != 0
}

/// Strip the query string and reject targets that could escape the document root.
///
/// Returns None if the target doesn't start with a slash or has a `..` segment.
fn safe_target(target: &str) -> Option<&str> {
    let target = target.split('?').next().unwrap_or("");
    if !target.starts_with('/') || target.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(target)
}
