use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::library::domain::video_entry::VideoEntry;

/// Ordered mapping of video path to [`VideoEntry`].
///
/// Insertion order is playback order. It survives serialization: entries are
/// written as a JSON object in order and read back in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Library {
    entries: Vec<(String, VideoEntry)>,
    index: HashMap<String, usize>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&VideoEntry> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut VideoEntry> {
        let i = *self.index.get(path)?;
        Some(&mut self.entries[i].1)
    }

    /// Entry at playback position `position`.
    pub fn get_index(&self, position: usize) -> Option<(&str, &VideoEntry)> {
        self.entries
            .get(position)
            .map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn get_index_mut(&mut self, position: usize) -> Option<(&str, &mut VideoEntry)> {
        self.entries
            .get_mut(position)
            .map(|(path, entry)| (path.as_str(), entry))
    }

    /// Appends a new entry, or replaces an existing one in place.
    pub fn insert(&mut self, path: String, entry: VideoEntry) {
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = entry,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, entry));
            }
        }
    }

    /// Removes the entries whose path fails `keep`, preserving the order of
    /// the rest. Returns the removed paths.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str, &VideoEntry) -> bool,
    {
        let mut removed = Vec::new();
        self.entries.retain(|(path, entry)| {
            let kept = keep(path, entry);
            if !kept {
                removed.push(path.clone());
            }
            kept
        });
        if !removed.is_empty() {
            self.rebuild_index();
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VideoEntry)> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    /// Rewinds every entry to the start (library wrap).
    pub fn rewind_all(&mut self) {
        for (_, entry) in &mut self.entries {
            entry.rewind();
        }
    }

    /// Canonical ledger text: a 4-space indented JSON object in playback order.
    /// An empty library is exactly `{}`.
    pub fn to_ledger_text(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_ledger_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (path, _))| (path.clone(), i))
            .collect();
    }
}

impl Serialize for Library {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, entry) in &self.entries {
            map.serialize_entry(path, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Library {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LibraryVisitor)
    }
}

struct LibraryVisitor;

impl<'de> Visitor<'de> for LibraryVisitor {
    type Value = Library;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping video paths to playback entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Library, A::Error> {
        let mut library = Library::new();
        while let Some((path, entry)) = access.next_entry::<String, VideoEntry>()? {
            if library.contains(&path) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate video path '{path}'"
                )));
            }
            library.insert(path, entry);
        }
        Ok(library)
    }
}
