use std::fs::File;
use std::marker::PhantomData;
use std::ops::{Deref, Range};
use std::path::Path;
use std::ptr::NonNull;

use memmap2::Mmap;
use rkyv::util::AlignedVec;
use rkyv::Deserialize;

use crate::error::StorageError;
use crate::header::{Compression, StorageHeader};

/// Archived roots that can be validated with `rkyv` before use.
pub trait CheckableArchived:
    for<'a> rkyv::bytecheck::CheckBytes<rkyv::validation::validators::DefaultValidator<'a>>
{
}

impl<T> CheckableArchived for T where
    T: for<'a> rkyv::bytecheck::CheckBytes<rkyv::validation::validators::DefaultValidator<'a>>
{
}

/// Where the validated payload lives.
enum Payload {
    /// Uncompressed catalogs are read in place.
    Mapped { mmap: Mmap, range: Range<usize> },
    /// Decompressed, or read without a map.
    Owned(AlignedVec),
}

impl Payload {
    fn bytes(&self) -> &[u8] {
        match self {
            Payload::Mapped { mmap, range } => &mmap[range.clone()],
            Payload::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// A catalog file opened read-only.
///
/// Opening checks the header against this build, the payload length and hash,
/// and the `rkyv` structure of the root, so everything reachable through
/// [`ArchiveFile::archived`] is safe to read without further checks.
pub struct ArchiveFile<T>
where
    T: rkyv::Archive,
{
    header: StorageHeader,
    payload: Payload,
    root: NonNull<rkyv::Archived<T>>,
    _marker: PhantomData<T>,
}

impl<T> std::fmt::Debug for ArchiveFile<T>
where
    T: rkyv::Archive,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFile")
            .field("header", &self.header)
            .field("mapped", &matches!(self.payload, Payload::Mapped { .. }))
            .finish_non_exhaustive()
    }
}

impl<T> ArchiveFile<T>
where
    T: rkyv::Archive,
    rkyv::Archived<T>: CheckableArchived,
{
    pub fn open(path: &Path, format_version: u32) -> Result<Self, StorageError> {
        let file = File::open(path)?;
        let (header, payload) = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => {
                let (header, range) = StorageHeader::read_frame(&mmap, format_version)?;
                let payload = match header.compression {
                    Compression::None => Payload::Mapped { mmap, range },
                    Compression::Zstd => Payload::Owned(inflate(&mmap[range], &header)?),
                };
                (header, payload)
            }
            Err(err) => {
                tracing::debug!(
                    target = "apicat.storage",
                    path = %path.display(),
                    error = %err,
                    "mmap failed; reading catalog into memory"
                );
                let bytes = std::fs::read(path)?;
                let (header, range) = StorageHeader::read_frame(&bytes, format_version)?;
                let payload = Payload::Owned(stored_payload(&bytes[range], &header)?);
                (header, payload)
            }
        };
        Self::validate(header, payload)
    }

    fn validate(header: StorageHeader, payload: Payload) -> Result<Self, StorageError> {
        let bytes = payload.bytes();

        let required = std::mem::align_of::<rkyv::Archived<T>>();
        let got = bytes.as_ptr() as usize;
        if got % required != 0 {
            return Err(StorageError::Misaligned { required, got });
        }
        check_payload(&header, bytes)?;

        let root = rkyv::check_archived_root::<T>(bytes)
            .map_err(|e| StorageError::Validation(e.to_string()))?;
        let root = NonNull::from(root);

        Ok(Self {
            header,
            payload,
            root,
            _marker: PhantomData,
        })
    }

    pub fn header(&self) -> &StorageHeader {
        &self.header
    }

    /// Whether the payload is served straight from a memory map.
    pub fn is_mapped(&self) -> bool {
        matches!(self.payload, Payload::Mapped { .. })
    }

    pub fn archived(&self) -> &rkyv::Archived<T> {
        // Safety: `root` was produced by `check_archived_root` over the bytes
        // owned by `payload`, which never move or change while `self` lives.
        unsafe { self.root.as_ref() }
    }

    /// Deserializes the archived payload into an owned value.
    pub fn to_owned(&self) -> Result<T, StorageError>
    where
        rkyv::Archived<T>: rkyv::Deserialize<T, rkyv::de::deserializers::SharedDeserializeMap>,
    {
        let mut deserializer = rkyv::de::deserializers::SharedDeserializeMap::default();
        self.archived()
            .deserialize(&mut deserializer)
            .map_err(|e| StorageError::Validation(e.to_string()))
    }
}

impl<T> Deref for ArchiveFile<T>
where
    T: rkyv::Archive,
    rkyv::Archived<T>: CheckableArchived,
{
    type Target = rkyv::Archived<T>;

    fn deref(&self) -> &Self::Target {
        self.archived()
    }
}

// Safety: only shared references into the map or the owned buffer are handed
// out, and neither is mutated after validation.
unsafe impl<T> Send for ArchiveFile<T>
where
    T: rkyv::Archive,
    rkyv::Archived<T>: Sync,
{
}

unsafe impl<T> Sync for ArchiveFile<T>
where
    T: rkyv::Archive,
    rkyv::Archived<T>: Sync,
{
}

/// Copies (or decompresses) the stored payload into an aligned buffer.
pub(crate) fn stored_payload(
    stored: &[u8],
    header: &StorageHeader,
) -> Result<AlignedVec, StorageError> {
    match header.compression {
        Compression::None => {
            let mut aligned = AlignedVec::with_capacity(stored.len());
            aligned.extend_from_slice(stored);
            Ok(aligned)
        }
        Compression::Zstd => inflate(stored, header),
    }
}

fn inflate(stored: &[u8], header: &StorageHeader) -> Result<AlignedVec, StorageError> {
    let capacity = usize::try_from(header.uncompressed_len).map_err(|_| {
        StorageError::OversizedPayload {
            payload_len: header.uncompressed_len,
        }
    })?;
    let bytes = zstd::bulk::decompress(stored, capacity)
        .map_err(|e| StorageError::Compression(e.to_string()))?;
    let mut aligned = AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(&bytes);
    Ok(aligned)
}

/// Checks the uncompressed payload against the length and hash in `header`.
pub(crate) fn check_payload(header: &StorageHeader, payload: &[u8]) -> Result<(), StorageError> {
    let found = payload.len() as u64;
    if found != header.uncompressed_len {
        return Err(StorageError::LengthMismatch {
            expected: header.uncompressed_len,
            found,
        });
    }
    let found = crate::content_hash(payload);
    if found != header.content_hash {
        return Err(StorageError::HashMismatch {
            expected: header.content_hash,
            found,
        });
    }
    Ok(())
}
