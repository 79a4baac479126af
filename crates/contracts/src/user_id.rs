//! Subject identifier shared between the live and durable paths.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of the subject a signal stream belongs to.
///
/// Routing attaches one of these to every inbound message and it travels
/// with the data through the queue, the live window and the metadata rows,
/// getting cloned on each hop. Backing it with `Arc<str>` keeps those
/// clones to a refcount bump.
///
/// Keyed maps can be queried with a plain `&str` through `Borrow<str>`:
///
/// ```
/// use contracts::UserId;
/// use std::collections::HashMap;
///
/// let mut depths: HashMap<UserId, usize> = HashMap::new();
/// depths.insert(UserId::new("subject-7"), 512);
/// assert_eq!(depths.get("subject-7"), Some(&512));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct UserId(Arc<str>);

impl UserId {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// View as a plain string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for UserId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets HashMap<UserId, _> lookups take &str; Hash must therefore agree
// with str's, which the derived impl on the single Arc<str> field does.
impl Borrow<str> for UserId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UserId {
    #[inline]
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({:?})", &*self.0)
    }
}

// On the wire and in metadata files the id is a bare string.
impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}
