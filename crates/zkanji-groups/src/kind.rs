//! The two kinds of group trees: words and kanji.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Which dictionary entries a group tree collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    /// Kanji groups, holding kanji indices.
    Kanji,
    /// Word groups, holding word indices.
    Words,
}

impl Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kanji => write!(f, "kanji"),
            Self::Words => write!(f, "words"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Words {}
    impl Sealed for super::Kanji {}
}

/// Static description of a group tree kind.
///
/// Implemented only by [`Words`] and [`Kanji`].
pub trait GroupKind: sealed::Sealed + Debug + Clone + Send + Sync + 'static {
    /// The entry index stored in groups of this kind.
    type Index: Copy + Eq + Ord + Hash + Debug + Display + Send + Sync + 'static;

    /// Runtime tag of the kind.
    const TYPE: GroupType;

    /// Whether trees of this kind keep an entry-to-groups reverse index.
    const REVERSE_INDEX: bool;

    /// Position of the entry in the dictionary, or `None` for an index that
    /// can never be valid.
    fn position(index: Self::Index) -> Option<usize>;

    /// Writes one index in the current file format.
    fn write_index<W: Write>(w: &mut W, index: Self::Index) -> io::Result<()>;

    /// Reads one index in the current file format.
    fn read_index<R: Read>(r: &mut R) -> io::Result<Self::Index>;
}

/// Word groups: indices are signed word positions.
#[derive(Debug, Clone, Copy)]
pub struct Words;

/// Kanji groups: indices are unsigned 16-bit kanji positions.
#[derive(Debug, Clone, Copy)]
pub struct Kanji;

impl GroupKind for Words {
    type Index = i32;
    const TYPE: GroupType = GroupType::Words;
    const REVERSE_INDEX: bool = true;

    fn position(index: i32) -> Option<usize> {
        usize::try_from(index).ok()
    }

    fn write_index<W: Write>(w: &mut W, index: i32) -> io::Result<()> {
        w.write_i32::<LittleEndian>(index)
    }

    fn read_index<R: Read>(r: &mut R) -> io::Result<i32> {
        r.read_i32::<LittleEndian>()
    }
}

impl GroupKind for Kanji {
    type Index = u16;
    const TYPE: GroupType = GroupType::Kanji;
    const REVERSE_INDEX: bool = false;

    fn position(index: u16) -> Option<usize> {
        Some(usize::from(index))
    }

    fn write_index<W: Write>(w: &mut W, index: u16) -> io::Result<()> {
        w.write_u16::<LittleEndian>(index)
    }

    fn read_index<R: Read>(r: &mut R) -> io::Result<u16> {
        r.read_u16::<LittleEndian>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Words::TYPE, GroupType::Words);
        assert_eq!(Kanji::TYPE, GroupType::Kanji);
        assert_eq!(GroupType::Words.to_string(), "words");
    }

    #[test]
    fn test_positions() {
        assert_eq!(Words::position(-1), None);
        assert_eq!(Words::position(12), Some(12));
        assert_eq!(Kanji::position(65535), Some(65535));
    }

    #[test]
    fn test_index_io() {
        let mut buf = Vec::new();
        Words::write_index(&mut buf, -5).unwrap();
        Kanji::write_index(&mut buf, 300).unwrap();
        assert_eq!(buf.len(), 6);

        let mut cursor = std::io::Cursor::new(buf);
        assert_eq!(Words::read_index(&mut cursor).unwrap(), -5);
        assert_eq!(Kanji::read_index(&mut cursor).unwrap(), 300);
    }
}
