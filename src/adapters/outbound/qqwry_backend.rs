//! QQWry Backend
//!
//! Implements GeoBackend over the legacy QQWry (`qqwry.dat`) IPv4 database.
//!
//! Layout: an 8-byte header holding the offsets of the first and last index
//! entries, 7-byte index entries (start IP + 24-bit record offset) sorted by
//! start IP, and records of end IP followed by two NUL-terminated GB18030
//! strings (location, operator). Either string may be replaced by a
//! redirect byte and a 24-bit pointer to shared storage.

use crate::domain::entities::{BackendKind, GeoRecord};
use crate::domain::ports::{BackendError, BackendSource, GeoBackend};
use crate::domain::value_objects::Address;
use encoding_rs::GB18030;
use std::path::Path;
use std::sync::Arc;

const HEADER_LEN: usize = 8;
const INDEX_LEN: usize = 7;
/// Location and operator both live at the pointer target.
const REDIRECT_RECORD: u8 = 0x01;
/// Only the string at this position lives at the pointer target.
const REDIRECT_STRING: u8 = 0x02;
/// Filler the publisher puts in empty operator fields.
const PLACEHOLDER: &str = "CZ88.NET";

/// QQWry database held in memory.
pub struct QqwryBackend {
    name: String,
    data: Vec<u8>,
    first_index: usize,
    last_index: usize,
}

impl QqwryBackend {
    /// Validate the header and take ownership of the file contents.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, BackendError> {
        if data.len() < HEADER_LEN {
            return Err(BackendError::Corrupt("file shorter than header".to_string()));
        }

        let first_index = read_u32(&data, 0)? as usize;
        let last_index = read_u32(&data, 4)? as usize;

        if first_index < HEADER_LEN
            || last_index < first_index
            || (last_index - first_index) % INDEX_LEN != 0
            || last_index + INDEX_LEN > data.len()
        {
            return Err(BackendError::Corrupt(format!(
                "index bounds {}..{} invalid for {} bytes",
                first_index,
                last_index,
                data.len()
            )));
        }

        Ok(Self {
            name: name.into(),
            data,
            first_index,
            last_index,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(path.display().to_string(), data)
    }

    /// Loader used by the backend registry.
    pub fn load(source: &BackendSource<'_>) -> Result<Arc<dyn GeoBackend>, BackendError> {
        let backend = Self::from_file(source.data_path)?;
        tracing::debug!("{} holds {} ranges", backend.name, backend.range_count());
        Ok(Arc::new(backend))
    }

    /// Number of IP ranges in the index.
    pub fn range_count(&self) -> usize {
        (self.last_index - self.first_index) / INDEX_LEN + 1
    }

    fn index_start(&self, i: usize) -> Result<u32, BackendError> {
        read_u32(&self.data, self.first_index + i * INDEX_LEN)
    }

    fn find(&self, ip: u32) -> Result<GeoRecord, BackendError> {
        if ip < self.index_start(0)? {
            return Err(BackendError::NotFound);
        }

        // last entry whose start <= ip
        let (mut lo, mut hi) = (0, self.range_count() - 1);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.index_start(mid)? <= ip {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        let record = read_u24(&self.data, self.first_index + lo * INDEX_LEN + 4)?;
        let end_ip = read_u32(&self.data, record)?;
        if ip > end_ip {
            return Err(BackendError::NotFound);
        }

        let (location, operator) = self.read_record(record + 4)?;
        Ok(GeoRecord::new(clean(&location), clean(&operator)))
    }

    fn read_record(&self, offset: usize) -> Result<(String, String), BackendError> {
        match read_u8(&self.data, offset)? {
            REDIRECT_RECORD => {
                let target = read_u24(&self.data, offset + 1)?;
                if read_u8(&self.data, target)? == REDIRECT_STRING {
                    let location = self.read_cstr(read_u24(&self.data, target + 1)?)?.0;
                    let operator = self.read_operator(target + 4)?;
                    Ok((location, operator))
                } else {
                    let (location, next) = self.read_cstr(target)?;
                    Ok((location, self.read_operator(next)?))
                }
            }
            REDIRECT_STRING => {
                let location = self.read_cstr(read_u24(&self.data, offset + 1)?)?.0;
                Ok((location, self.read_operator(offset + 4)?))
            }
            _ => {
                let (location, next) = self.read_cstr(offset)?;
                Ok((location, self.read_operator(next)?))
            }
        }
    }

    fn read_operator(&self, offset: usize) -> Result<String, BackendError> {
        match read_u8(&self.data, offset)? {
            REDIRECT_RECORD | REDIRECT_STRING => match read_u24(&self.data, offset + 1)? {
                0 => Ok(String::new()),
                target => Ok(self.read_cstr(target)?.0),
            },
            _ => Ok(self.read_cstr(offset)?.0),
        }
    }

    /// Decode the NUL-terminated string at `offset`; also returns the
    /// offset just past the terminator.
    fn read_cstr(&self, offset: usize) -> Result<(String, usize), BackendError> {
        let tail = self
            .data
            .get(offset..)
            .ok_or_else(|| out_of_range(offset))?;
        let len = tail
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| BackendError::Corrupt(format!("unterminated string at {}", offset)))?;

        let (text, _) = GB18030.decode_without_bom_handling(&tail[..len]);
        Ok((text.into_owned(), offset + len + 1))
    }
}

impl GeoBackend for QqwryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Qqwry
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, addr: &Address) -> Result<GeoRecord, BackendError> {
        let v4 = addr
            .as_ipv4()
            .ok_or(BackendError::Unsupported(addr.version().as_str()))?;
        self.find(u32::from(v4))
    }
}

fn clean(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == PLACEHOLDER {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn out_of_range(offset: usize) -> BackendError {
    BackendError::Corrupt(format!("offset {} out of range", offset))
}

fn read_u8(data: &[u8], offset: usize) -> Result<u8, BackendError> {
    data.get(offset).copied().ok_or_else(|| out_of_range(offset))
}

fn read_u24(data: &[u8], offset: usize) -> Result<usize, BackendError> {
    let bytes = data.get(offset..offset + 3).ok_or_else(|| out_of_range(offset))?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) as usize)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, BackendError> {
    let bytes = data.get(offset..offset + 4).ok_or_else(|| out_of_range(offset))?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
