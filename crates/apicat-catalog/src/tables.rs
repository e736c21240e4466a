//! Byte layout of the catalog tables.
//!
//! Every table is a flat little-endian byte array. Records are addressed by
//! their byte offset inside their table; cross-table references are `u32`
//! offsets and [`NONE`] marks an absent link.
//!
//! ```text
//! api          id[16] kind:u8 parent name first_child last_child next_sibling
//!              first_declaration last_declaration
//! assembly     id[16] name version public_key_token first_availability
//!              last_availability
//! declaration  api assembly markup next
//! package      id version
//! framework    name
//! availability assembly package framework next
//! root         api
//! string       len bytes[len]
//! markup       count (kind:u8 flags:u8 text reference[16])*count
//! *_index      (id[16] offset)*, sorted by id
//! ```

use std::collections::HashMap;
use std::path::Path;

use apicat_core::{ApiKind, CatalogId};
use apicat_markup::{Markup, MarkupPart, MarkupPartKind};
use apicat_storage::{ArchiveFile, WriteArchiveOptions};
use byteorder::{ByteOrder, LittleEndian};

use crate::error::CatalogError;
use crate::CATALOG_FORMAT_VERSION;

/// Absent link.
pub const NONE: u32 = u32::MAX;

pub(crate) const API_RECORD: usize = 45;
pub(crate) const API_KIND: usize = 16;
pub(crate) const API_PARENT: usize = 17;
pub(crate) const API_NAME: usize = 21;
pub(crate) const API_FIRST_CHILD: usize = 25;
pub(crate) const API_LAST_CHILD: usize = 29;
pub(crate) const API_NEXT_SIBLING: usize = 33;
pub(crate) const API_FIRST_DECLARATION: usize = 37;
pub(crate) const API_LAST_DECLARATION: usize = 41;

pub(crate) const ASSEMBLY_RECORD: usize = 36;
pub(crate) const ASSEMBLY_NAME: usize = 16;
pub(crate) const ASSEMBLY_VERSION: usize = 20;
pub(crate) const ASSEMBLY_PUBLIC_KEY_TOKEN: usize = 24;
pub(crate) const ASSEMBLY_FIRST_AVAILABILITY: usize = 28;
pub(crate) const ASSEMBLY_LAST_AVAILABILITY: usize = 32;

pub(crate) const DECLARATION_RECORD: usize = 16;
pub(crate) const DECLARATION_API: usize = 0;
pub(crate) const DECLARATION_ASSEMBLY: usize = 4;
pub(crate) const DECLARATION_MARKUP: usize = 8;
pub(crate) const DECLARATION_NEXT: usize = 12;

pub(crate) const PACKAGE_RECORD: usize = 8;
pub(crate) const FRAMEWORK_RECORD: usize = 4;

pub(crate) const AVAILABILITY_RECORD: usize = 16;
pub(crate) const AVAILABILITY_ASSEMBLY: usize = 0;
pub(crate) const AVAILABILITY_PACKAGE: usize = 4;
pub(crate) const AVAILABILITY_FRAMEWORK: usize = 8;
pub(crate) const AVAILABILITY_NEXT: usize = 12;

pub(crate) const ROOT_RECORD: usize = 4;
pub(crate) const INDEX_RECORD: usize = 20;

const MARKUP_PART: usize = 22;
const PART_HAS_REFERENCE: u8 = 1;

/// The persisted catalog: one byte array per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[archive(check_bytes)]
pub struct CatalogTables {
    pub strings: Vec<u8>,
    pub markups: Vec<u8>,
    pub apis: Vec<u8>,
    pub assemblies: Vec<u8>,
    pub declarations: Vec<u8>,
    pub packages: Vec<u8>,
    pub frameworks: Vec<u8>,
    pub availability: Vec<u8>,
    pub roots: Vec<u8>,
    pub api_index: Vec<u8>,
    pub assembly_index: Vec<u8>,
    pub markup_index: Vec<u8>,
}

impl CatalogTables {
    /// Opens a saved catalog file and checks that its tables are well formed,
    /// so later reads can index into them directly.
    pub(crate) fn open(path: &Path) -> Result<ArchiveFile<CatalogTables>, CatalogError> {
        let file = ArchiveFile::<CatalogTables>::open(path, CATALOG_FORMAT_VERSION)?;
        check_layout(&archived_tables(file.archived()))?;
        Ok(file)
    }

    pub(crate) fn save(&self, path: &Path, options: WriteArchiveOptions) -> Result<(), CatalogError> {
        apicat_storage::write_archive(path, CATALOG_FORMAT_VERSION, self, options)?;
        Ok(())
    }
}

pub(crate) fn archived_tables(t: &ArchivedCatalogTables) -> Tables<'_> {
    Tables {
        strings: &t.strings,
        markups: &t.markups,
        apis: &t.apis,
        assemblies: &t.assemblies,
        declarations: &t.declarations,
        packages: &t.packages,
        frameworks: &t.frameworks,
        availability: &t.availability,
        roots: &t.roots,
        api_index: IdIndex::Sorted(&t.api_index),
        assembly_index: IdIndex::Sorted(&t.assembly_index),
        markup_index: IdIndex::Sorted(&t.markup_index),
    }
}

fn check_layout(t: &Tables<'_>) -> Result<(), CatalogError> {
    for (table, bytes, record) in [
        ("api", t.apis, API_RECORD),
        ("assembly", t.assemblies, ASSEMBLY_RECORD),
        ("declaration", t.declarations, DECLARATION_RECORD),
        ("package", t.packages, PACKAGE_RECORD),
        ("framework", t.frameworks, FRAMEWORK_RECORD),
        ("availability", t.availability, AVAILABILITY_RECORD),
        ("root", t.roots, ROOT_RECORD),
    ] {
        if bytes.len() % record != 0 {
            return Err(CatalogError::Corrupt { table });
        }
    }
    for (table, index, target) in [
        ("api index", t.api_index, t.apis),
        ("assembly index", t.assembly_index, t.assemblies),
        ("markup index", t.markup_index, t.markups),
    ] {
        let IdIndex::Sorted(index) = index else {
            continue;
        };
        if index.len() % INDEX_RECORD != 0 {
            return Err(CatalogError::Corrupt { table });
        }
        let in_range = index
            .chunks_exact(INDEX_RECORD)
            .all(|entry| (read_u32(entry, CatalogId::LEN) as usize) < target.len());
        if !in_range {
            return Err(CatalogError::Corrupt { table });
        }
    }
    string_records(t.strings).try_for_each(|record| record.map(drop))
}

#[inline]
pub(crate) fn read_u32(table: &[u8], at: usize) -> u32 {
    LittleEndian::read_u32(&table[at..at + 4])
}

#[inline]
pub(crate) fn write_u32(table: &mut [u8], at: usize, value: u32) {
    LittleEndian::write_u32(&mut table[at..at + 4], value);
}

#[inline]
pub(crate) fn link(value: u32) -> Option<u32> {
    (value != NONE).then_some(value)
}

/// Offset the next record appended to `table` will get.
pub(crate) fn next_offset(table: &[u8], name: &'static str) -> Result<u32, CatalogError> {
    u32::try_from(table.len()).map_err(|_| CatalogError::TableFull { table: name })
}

pub(crate) fn read_id(table: &[u8], at: usize) -> CatalogId {
    CatalogId::read_from(&table[at..at + CatalogId::LEN])
}

pub(crate) fn read_kind(apis: &[u8], offset: u32) -> ApiKind {
    let value = apis[offset as usize + API_KIND];
    match ApiKind::from_u8(value) {
        Some(kind) => kind,
        None => panic!("corrupt api record at {offset}: kind {value}"),
    }
}

pub(crate) fn read_str(strings: &[u8], offset: u32) -> &str {
    let at = offset as usize;
    let len = read_u32(strings, at) as usize;
    match std::str::from_utf8(&strings[at + 4..at + 4 + len]) {
        Ok(text) => text,
        Err(_) => panic!("corrupt string at {offset}"),
    }
}

/// Walks the string table in insertion order, yielding each string with its
/// offset. A record that runs past the end or is not UTF-8 ends the walk with
/// an error.
pub(crate) fn string_records(
    strings: &[u8],
) -> impl Iterator<Item = Result<(u32, &str), CatalogError>> + '_ {
    let mut at = 0usize;
    std::iter::from_fn(move || {
        if at >= strings.len() {
            return None;
        }
        let text = strings
            .get(at..at + 4)
            .map(|len| LittleEndian::read_u32(len) as usize)
            .and_then(|len| strings.get(at + 4..at + 4 + len))
            .and_then(|bytes| std::str::from_utf8(bytes).ok());
        let Some(text) = text else {
            at = strings.len();
            return Some(Err(CatalogError::Corrupt { table: "string" }));
        };
        let offset = at as u32;
        at += 4 + text.len();
        Some(Ok((offset, text)))
    })
}

pub(crate) fn push_str(strings: &mut Vec<u8>, text: &str) -> Result<u32, CatalogError> {
    let offset = next_offset(strings, "string")?;
    let len = u32::try_from(text.len()).map_err(|_| CatalogError::TableFull { table: "string" })?;
    strings.extend_from_slice(&len.to_le_bytes());
    strings.extend_from_slice(text.as_bytes());
    Ok(offset)
}

/// Encodes `markup` with its texts already interned: `texts[i]` is the string
/// offset of `markup.parts()[i].text`.
pub(crate) fn push_markup(
    markups: &mut Vec<u8>,
    markup: &Markup,
    texts: &[u32],
) -> Result<u32, CatalogError> {
    let offset = next_offset(markups, "markup")?;
    let count =
        u32::try_from(markup.parts().len()).map_err(|_| CatalogError::TableFull { table: "markup" })?;
    markups.extend_from_slice(&count.to_le_bytes());

    for (part, text) in markup.parts().iter().zip(texts) {
        let mut record = [0u8; MARKUP_PART];
        record[0] = part.kind as u8;
        LittleEndian::write_u32(&mut record[2..6], *text);
        if let Some(reference) = part.reference {
            record[1] = PART_HAS_REFERENCE;
            record[6..].copy_from_slice(reference.as_bytes());
        }
        markups.extend_from_slice(&record);
    }
    Ok(offset)
}

pub(crate) fn read_markup(markups: &[u8], strings: &[u8], offset: u32) -> Markup {
    let at = offset as usize;
    let count = read_u32(markups, at) as usize;
    let mut parts = Vec::with_capacity(count);

    for i in 0..count {
        let record = &markups[at + 4 + i * MARKUP_PART..at + 4 + (i + 1) * MARKUP_PART];
        let kind = match MarkupPartKind::from_u8(record[0]) {
            Some(kind) => kind,
            None => panic!("corrupt markup at {offset}: part kind {}", record[0]),
        };
        let text = read_str(strings, LittleEndian::read_u32(&record[2..6]));
        let reference = (record[1] & PART_HAS_REFERENCE != 0)
            .then(|| CatalogId::read_from(&record[6..]));
        parts.push(MarkupPart {
            kind,
            text: text.to_string(),
            reference,
        });
    }

    Markup::new(parts)
}

/// Serializes an id → offset map as a sorted index table.
pub(crate) fn encode_index(ids: &HashMap<CatalogId, u32>) -> Vec<u8> {
    let mut entries: Vec<_> = ids.iter().map(|(id, offset)| (*id, *offset)).collect();
    entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut table = Vec::with_capacity(entries.len() * INDEX_RECORD);
    for (id, offset) in entries {
        table.extend_from_slice(id.as_bytes());
        table.extend_from_slice(&offset.to_le_bytes());
    }
    table
}

pub(crate) fn decode_index(table: &[u8]) -> HashMap<CatalogId, u32> {
    table
        .chunks_exact(INDEX_RECORD)
        .map(|entry| (CatalogId::read_from(entry), read_u32(entry, CatalogId::LEN)))
        .collect()
}

/// Id lookup over either a frozen sorted index table or a builder's map.
#[derive(Debug, Clone, Copy)]
pub(crate) enum IdIndex<'a> {
    Sorted(&'a [u8]),
    Hashed(&'a HashMap<CatalogId, u32>),
}

impl IdIndex<'_> {
    pub(crate) fn get(&self, id: &CatalogId) -> Option<u32> {
        match self {
            IdIndex::Hashed(map) => map.get(id).copied(),
            IdIndex::Sorted(table) => {
                let key = id.as_bytes().as_slice();
                let (mut lo, mut hi) = (0, table.len() / INDEX_RECORD);
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    let entry = &table[mid * INDEX_RECORD..(mid + 1) * INDEX_RECORD];
                    match entry[..CatalogId::LEN].cmp(key) {
                        std::cmp::Ordering::Less => lo = mid + 1,
                        std::cmp::Ordering::Greater => hi = mid,
                        std::cmp::Ordering::Equal => return Some(read_u32(entry, CatalogId::LEN)),
                    }
                }
                None
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            IdIndex::Hashed(map) => map.len(),
            IdIndex::Sorted(table) => table.len() / INDEX_RECORD,
        }
    }
}

/// Borrowed tables shared by the builder and the frozen catalog.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tables<'a> {
    pub strings: &'a [u8],
    pub markups: &'a [u8],
    pub apis: &'a [u8],
    pub assemblies: &'a [u8],
    pub declarations: &'a [u8],
    pub packages: &'a [u8],
    pub frameworks: &'a [u8],
    pub availability: &'a [u8],
    pub roots: &'a [u8],
    pub api_index: IdIndex<'a>,
    pub assembly_index: IdIndex<'a>,
    pub markup_index: IdIndex<'a>,
}
