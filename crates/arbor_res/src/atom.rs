//! Atoms - hierarchical asset identity
//!
//! An atom is a slash-separated path of name segments. It names a position
//! in a namespace whether or not an asset currently lives there.

use std::fmt;
use std::ops::Div;
use std::sync::Arc;

/// A position in the asset namespace
///
/// Atoms compare and order segment by segment, so every descendant of an
/// atom sorts directly after it and before its next sibling.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom {
    segments: Arc<[String]>,
}

impl Atom {
    /// The namespace root (no segments)
    pub fn root() -> Self {
        Self {
            segments: Arc::from(Vec::new()),
        }
    }

    /// Parse a slash-separated path. Empty segments are skipped, so
    /// `"/root//a/"` and `"root/a"` are the same atom. Never fails.
    pub fn resolve(path: &str) -> Self {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The atom for a child segment
    pub fn child(&self, name: &str) -> Self {
        self.segments
            .iter()
            .cloned()
            .chain(Atom::resolve(name).segments.iter().cloned())
            .collect()
    }

    /// The parent atom (`None` for the root)
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(init.iter().cloned().collect())
    }

    /// The last segment (empty for the root)
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// All segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check whether `other` lies strictly below this atom
    pub fn is_ancestor_of(&self, other: &Atom) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// Check whether `other` is this atom or lies below it
    pub fn contains(&self, other: &Atom) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// The immediate child of this atom on the way to `descendant`
    pub fn child_toward(&self, descendant: &Atom) -> Option<Atom> {
        if !self.is_ancestor_of(descendant) {
            return None;
        }
        Some(descendant.segments[..=self.segments.len()].iter().cloned().collect())
    }

    /// Human-readable path
    pub fn full_path(&self) -> String {
        self.segments.join("/")
    }
}

impl Default for Atom {
    fn default() -> Self {
        Self::root()
    }
}

impl FromIterator<String> for Atom {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl From<&str> for Atom {
    fn from(path: &str) -> Self {
        Self::resolve(path)
    }
}

impl Div<&str> for &Atom {
    type Output = Atom;

    fn div(self, name: &str) -> Atom {
        self.child(name)
    }
}

impl Div<&str> for Atom {
    type Output = Atom;

    fn div(self, name: &str) -> Atom {
        self.child(name)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.full_path())
    }
}
