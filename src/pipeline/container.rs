//! Compound container reader: OLE/CFB bytes → immutable entry tree.
//!
//! The `cfb` crate does the sector and directory work. Its stream API needs
//! `&mut` access and a seekable reader, which makes it awkward to share
//! across a recursive decoder, so the whole container is snapshotted once:
//! every storage and stream becomes a [`ContainerEntry`] addressed by its
//! `/`-separated path. Decoding never touches `cfb` after [`parse`] returns.
//!
//! Paths compare trailing-slash-insensitively (`/a/` and `/a` are the same
//! entry) and the root storage is the empty path `""`.

use crate::error::ConvertError;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tracing::debug;

/// First eight bytes of every compound file.
pub const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Storage,
    Stream,
}

#[derive(Debug, Clone)]
pub struct ContainerEntry {
    path: String,
    kind: EntryKind,
    data: Vec<u8>,
}

impl ContainerEntry {
    /// Normalized path (no trailing slash, root is `""`).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_stream(&self) -> bool {
        self.kind == EntryKind::Stream
    }

    /// Stream bytes; empty for storages.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of path segments below the root.
    pub fn depth(&self) -> usize {
        path_depth(&self.path)
    }
}

/// A parsed compound container. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RawContainer {
    entries: Vec<ContainerEntry>,
    by_path: HashMap<String, usize>,
    by_folded_path: HashMap<String, usize>,
}

/// Strip trailing slashes; `/` becomes the root path `""`.
pub fn normalize_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Join a storage path and a child name.
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{}/{}", normalize_path(parent), name)
}

/// The storage holding `path` (everything before the last `/`).
pub fn parent_path(path: &str) -> &str {
    let path = normalize_path(path);
    path.rfind('/').map_or("", |i| &path[..i])
}

pub fn path_depth(path: &str) -> usize {
    normalize_path(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .count()
}

/// Parse compound-file bytes into a [`RawContainer`].
///
/// `name` is only used for error messages.
pub fn parse(name: &str, bytes: &[u8]) -> Result<RawContainer, ConvertError> {
    let malformed = |detail: String| ConvertError::MalformedContainer {
        name: name.to_string(),
        detail,
    };

    if !bytes.starts_with(&CFB_SIGNATURE) {
        return Err(malformed("header signature mismatch".into()));
    }

    let mut comp = cfb::CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| malformed(format!("unreadable directory: {e}")))?;

    let listing: Vec<(String, EntryKind)> = comp
        .walk()
        .map(|entry| {
            let kind = if entry.is_stream() {
                EntryKind::Stream
            } else {
                EntryKind::Storage
            };
            (entry.path().to_string_lossy().into_owned(), kind)
        })
        .collect();

    let mut container = RawContainer::default();
    for (raw_path, kind) in listing {
        let mut data = Vec::new();
        if kind == EntryKind::Stream {
            comp.open_stream(&raw_path)
                .and_then(|mut s| s.read_to_end(&mut data))
                .map_err(|e| malformed(format!("stream '{raw_path}' unreadable: {e}")))?;
        }
        container.insert(ContainerEntry {
            path: normalize_path(&raw_path).to_string(),
            kind,
            data,
        });
    }

    debug!("Container '{}': {} entries", name, container.entries.len());
    Ok(container)
}

impl RawContainer {
    fn insert(&mut self, entry: ContainerEntry) {
        let idx = self.entries.len();
        self.by_path.insert(entry.path.clone(), idx);
        self.by_folded_path
            .entry(entry.path.to_ascii_lowercase())
            .or_insert(idx);
        self.entries.push(entry);
    }

    /// Look up an entry. CFB names are case-insensitive, so an exact match is
    /// tried first and an ASCII case-folded match second.
    pub fn find(&self, path: &str) -> Option<&ContainerEntry> {
        let path = normalize_path(path);
        self.by_path
            .get(path)
            .or_else(|| self.by_folded_path.get(&path.to_ascii_lowercase()))
            .map(|&i| &self.entries[i])
    }

    /// All entries in directory-walk order.
    pub fn entries(&self) -> impl Iterator<Item = &ContainerEntry> {
        self.entries.iter()
    }

    /// Direct children of `storage` whose name starts with `prefix`.
    pub fn children_with_prefix<'a>(
        &'a self,
        storage: &str,
        prefix: &str,
    ) -> impl Iterator<Item = &'a ContainerEntry> + 'a {
        let wanted = join_path(storage, prefix);
        let depth = path_depth(storage) + 1;
        self.entries
            .iter()
            .filter(move |e| e.path.starts_with(&wanted) && e.depth() == depth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
