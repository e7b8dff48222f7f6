//! Binary group files.
//!
//! A group file starts with the magic bytes `zkgr` and a `u32` version. All
//! numbers are little-endian and strings are UTF-8 with a length prefix.
//!
//! Version 2 is the only one written:
//!
//! ```text
//! tree(words) tree(kanji) string(last word group) string(last kanji group)
//! tree          = category-body
//! category-body = u32 n { string name, category-body }*
//!                 u32 n { string name, u32 count, index* }*
//! string        = u16 length, bytes
//! ```
//!
//! Version 1 files are still read. They have no categories and no last group,
//! use `u16` counts and `u8`-prefixed names.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use zkanji_core::PerfSpan;

use crate::error::{GroupError, Result};
use crate::file::AtomicWriter;
use crate::groups::Groups;
use crate::kind::{GroupKind, Kanji, Words};
use crate::tree::{CategoryId, GroupTree};

/// Magic bytes at the start of every group file.
pub const MAGIC: [u8; 4] = *b"zkgr";

/// Version written by [`Groups::save`].
pub const CURRENT_VERSION: u32 = 2;

const LEGACY_VERSION: u32 = 1;

/// Deepest category nesting accepted when loading.
const MAX_DEPTH: usize = 128;

/// Upper bound for preallocation while reading counts from a file.
const MAX_PREALLOC: usize = 4096;

impl Groups {
    /// Writes both trees in the current format.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&MAGIC)?;
        w.write_u32::<LittleEndian>(CURRENT_VERSION)?;
        write_tree(w, self.words())?;
        write_tree(w, self.kanji())?;
        write_string(w, &last_path(self.words()))?;
        write_string(w, &last_path(self.kanji()))?;
        Ok(())
    }

    /// Replaces both trees with the content read from `r`.
    ///
    /// Nothing changes when reading fails. On success both trees announce a
    /// reset.
    pub fn load<R: Read>(&mut self, r: &mut R) -> Result<()> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(GroupError::invalid_data("not a group file"));
        }

        let version = r.read_u32::<LittleEndian>()?;
        let (words, kanji) = match version {
            CURRENT_VERSION => {
                let mut words = read_tree::<Words, _>(r)?;
                let mut kanji = read_tree::<Kanji, _>(r)?;
                let last_words = read_string(r)?;
                let last_kanji = read_string(r)?;
                if !last_words.is_empty() {
                    words.set_last_selected_name(&last_words);
                }
                if !last_kanji.is_empty() {
                    kanji.set_last_selected_name(&last_kanji);
                }
                (words, kanji)
            }
            LEGACY_VERSION => {
                let words = read_legacy_tree::<Words, _>(r)?;
                let kanji = read_legacy_tree::<Kanji, _>(r)?;
                (words, kanji)
            }
            other => return Err(GroupError::UnsupportedVersion(other)),
        };

        tracing::info!(
            target: "zkanji_groups::persist",
            version,
            word_groups = words.group_count(),
            kanji_groups = kanji.group_count(),
            "groups loaded"
        );
        self.words_mut().replace_with(words);
        self.kanji_mut().replace_with(kanji);
        Ok(())
    }

    /// Writes both trees to `path`, replacing the file atomically.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let _span = PerfSpan::new("save_groups");
        let path = path.as_ref();
        AtomicWriter::write(path, |w| self.save(w))?;
        tracing::info!(
            target: "zkanji_groups::persist",
            path = %path.display(),
            word_groups = self.words().group_count(),
            kanji_groups = self.kanji().group_count(),
            "groups saved"
        );
        Ok(())
    }

    /// Replaces both trees with the content of the file at `path`.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let _span = PerfSpan::new("load_groups");
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        self.load(&mut reader).inspect_err(|err| {
            tracing::warn!(
                target: "zkanji_groups::persist",
                path = %path.display(),
                %err,
                "failed to load groups"
            );
        })
    }
}

fn last_path<K: GroupKind>(tree: &GroupTree<K>) -> String {
    if !tree.remember_last() {
        return String::new();
    }
    tree.last_selected()
        .and_then(|id| tree.full_encoded_name(id.into()))
        .unwrap_or_default()
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| GroupError::invalid_data(format!("name too long: {} bytes", s.len())))?;
    w.write_u16::<LittleEndian>(len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn write_count<W: Write>(w: &mut W, n: usize) -> Result<()> {
    let n = u32::try_from(n).map_err(|_| GroupError::invalid_data("too many entries"))?;
    w.write_u32::<LittleEndian>(n)?;
    Ok(())
}

fn write_tree<K: GroupKind, W: Write>(w: &mut W, tree: &GroupTree<K>) -> Result<()> {
    write_category(w, tree, tree.root())
}

fn write_category<K: GroupKind, W: Write>(
    w: &mut W,
    tree: &GroupTree<K>,
    category: CategoryId,
) -> Result<()> {
    let categories = tree.categories(category);
    write_count(w, categories.len())?;
    for &child in categories {
        write_string(w, tree.name(child.into()).unwrap_or_default())?;
        write_category(w, tree, child)?;
    }

    let groups = tree.groups(category);
    write_count(w, groups.len())?;
    for &id in groups {
        let Some(group) = tree.group(id) else {
            continue;
        };
        write_string(w, group.name())?;
        write_count(w, group.len())?;
        for &index in group.indexes() {
            K::write_index(w, index)?;
        }
    }
    Ok(())
}

fn read_string<R: Read>(r: &mut R) -> Result<String> {
    let len = r.read_u16::<LittleEndian>()?;
    read_utf8(r, usize::from(len))
}

fn read_short_string<R: Read>(r: &mut R) -> Result<String> {
    let len = r.read_u8()?;
    read_utf8(r, usize::from(len))
}

fn read_utf8<R: Read>(r: &mut R, len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| GroupError::invalid_data("name is not valid UTF-8"))
}

fn read_tree<K: GroupKind, R: Read>(r: &mut R) -> Result<GroupTree<K>> {
    let mut tree = GroupTree::new();
    let root = tree.root();
    read_category(r, &mut tree, root, 0)?;
    tree.rebuild_reverse_index();
    Ok(tree)
}

fn read_category<K: GroupKind, R: Read>(
    r: &mut R,
    tree: &mut GroupTree<K>,
    category: CategoryId,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(GroupError::invalid_data("categories nested too deep"));
    }

    let count = r.read_u32::<LittleEndian>()?;
    for _ in 0..count {
        let name = read_string(r)?;
        let index = tree
            .add_category(category, &name)
            .map_err(|e| GroupError::invalid_data(format!("category {name:?}: {e}")))?;
        let child = tree
            .category_at(category, index)
            .ok_or_else(|| GroupError::invalid_data("category vanished while loading"))?;
        read_category(r, tree, child, depth + 1)?;
    }

    let count = r.read_u32::<LittleEndian>()?;
    for _ in 0..count {
        let name = read_string(r)?;
        let len = r.read_u32::<LittleEndian>()? as usize;
        let items = read_items::<K, R>(r, len)?;
        add_loaded_group(tree, category, &name, &items)?;
    }
    Ok(())
}

fn read_items<K: GroupKind, R: Read>(r: &mut R, len: usize) -> Result<Vec<K::Index>> {
    let mut items = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        items.push(K::read_index(r)?);
    }
    Ok(items)
}

fn add_loaded_group<K: GroupKind>(
    tree: &mut GroupTree<K>,
    category: CategoryId,
    name: &str,
    items: &[K::Index],
) -> Result<()> {
    let index = tree
        .add_group(category, name)
        .map_err(|e| GroupError::invalid_data(format!("group {name:?}: {e}")))?;
    let id = tree
        .group_at(category, index)
        .ok_or_else(|| GroupError::invalid_data("group vanished while loading"))?;
    if let Some(mut group) = tree.group_mut(id) {
        let outcome = group.add_many(items);
        if outcome.added < items.len() {
            tracing::debug!(
                target: "zkanji_groups::persist",
                group = name,
                duplicates = items.len() - outcome.added,
                "dropped duplicate entries"
            );
        }
    }
    Ok(())
}

/// Reads one tree of a version 1 file. Every group sits in the root.
fn read_legacy_tree<K: GroupKind, R: Read>(r: &mut R) -> Result<GroupTree<K>> {
    let mut tree = GroupTree::new();
    let root = tree.root();
    let count = r.read_u16::<LittleEndian>()?;
    for _ in 0..count {
        let name = read_short_string(r)?;
        let len = usize::from(r.read_u16::<LittleEndian>()?);
        let items = read_items::<K, R>(r, len)?;
        add_loaded_group(&mut tree, root, &name, &items)?;
    }
    tree.rebuild_reverse_index();
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Groups {
        let mut groups = Groups::new();
        let words = groups.words_mut();
        let root = words.root();
        let index = words.add_category(root, "JLPT").unwrap();
        let jlpt = words.category_at(root, index).unwrap();
        words.add_group(jlpt, "N5").unwrap();
        let n5 = words.group_at(jlpt, 0).unwrap();
        words.group_mut(n5).unwrap().add_many(&[7, 2, 9]);
        words.set_last_selected(Some(n5));

        let kanji = groups.kanji_mut();
        let root = kanji.root();
        kanji.add_group(root, "Radicals").unwrap();
        let radicals = kanji.group_at(root, 0).unwrap();
        kanji.group_mut(radicals).unwrap().add_many(&[1, 300]);
        groups
    }

    fn legacy_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.write_u32::<LittleEndian>(1).unwrap();
        buf.write_u16::<LittleEndian>(1).unwrap();
        buf.write_u8(4).unwrap();
        buf.extend_from_slice(b"Food");
        buf.write_u16::<LittleEndian>(3).unwrap();
        for w in [5i32, 3, 5] {
            buf.write_i32::<LittleEndian>(w).unwrap();
        }
        buf.write_u16::<LittleEndian>(0).unwrap();
        buf
    }

    #[test]
    fn test_round_trip() {
        let source = sample();
        let mut buf = Vec::new();
        source.save(&mut buf).unwrap();

        let mut loaded = Groups::new();
        loaded.load(&mut Cursor::new(buf)).unwrap();

        let words = loaded.words();
        let n5 = words.find_group_by_encoded_name(words.root(), "JLPT/N5").unwrap();
        assert_eq!(words.group(n5).unwrap().indexes(), &[7, 2, 9]);
        assert_eq!(words.last_selected(), Some(n5));
        assert_eq!(words.word_groups(2), &[n5]);

        let kanji = loaded.kanji();
        let radicals = kanji.group_at(kanji.root(), 0).unwrap();
        assert_eq!(kanji.group(radicals).unwrap().indexes(), &[1, 300]);
        assert_eq!(kanji.last_selected(), None);
    }

    #[test]
    fn test_legacy_load() {
        let mut groups = Groups::new();
        groups.load(&mut Cursor::new(legacy_bytes())).unwrap();

        let words = groups.words();
        assert_eq!(words.category_count(), 0);
        let food = words.group_at(words.root(), 0).unwrap();
        assert_eq!(words.group(food).unwrap().name(), "Food");
        assert_eq!(words.group(food).unwrap().indexes(), &[5, 3]);
        assert!(groups.kanji().is_empty());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut buf = MAGIC.to_vec();
        buf.write_u32::<LittleEndian>(7).unwrap();
        let mut groups = Groups::new();
        assert!(matches!(
            groups.load(&mut Cursor::new(buf)),
            Err(GroupError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut groups = Groups::new();
        let result = groups.load(&mut Cursor::new(b"nope\x02\0\0\0".to_vec()));
        assert!(matches!(result, Err(GroupError::InvalidData(_))));
    }

    #[test]
    fn test_truncated_file_leaves_groups_untouched() {
        let mut buf = Vec::new();
        sample().save(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let mut groups = sample();
        assert!(matches!(
            groups.load(&mut Cursor::new(buf)),
            Err(GroupError::Io(_))
        ));
        assert_eq!(groups.words().group_count(), 1);
    }

    #[test]
    fn test_duplicate_sibling_names_rejected() {
        let mut buf = MAGIC.to_vec();
        buf.write_u32::<LittleEndian>(1).unwrap();
        buf.write_u16::<LittleEndian>(2).unwrap();
        for name in [b"Sunday", b"sunday"] {
            buf.write_u8(6).unwrap();
            buf.extend_from_slice(name);
            buf.write_u16::<LittleEndian>(0).unwrap();
        }
        buf.write_u16::<LittleEndian>(0).unwrap();

        let mut groups = Groups::new();
        assert!(matches!(
            groups.load(&mut Cursor::new(buf)),
            Err(GroupError::InvalidData(_))
        ));
    }

    #[test]
    fn test_last_group_not_saved_when_not_remembered() {
        let mut source = sample();
        source.words_mut().set_remember_last(false);
        let mut buf = Vec::new();
        source.save(&mut buf).unwrap();

        let mut loaded = Groups::new();
        loaded.load(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded.words().last_selected(), None);
    }
}
