//! Secret buffers.
//!
//! Every plaintext secret and private key blob held in memory lives inside a
//! [`SecretBuffer`], whose backing bytes are overwritten with zeros when the
//! buffer is dropped. A decrypted environment file is returned as a
//! [`SecretMap`], an owning container that carries the same guarantee for
//! every value, so callers cannot forget to clean up.

use std::collections::BTreeMap;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// An owned byte buffer zeroed on drop.
///
/// Not `Clone`: copies of secret material must be explicit, via
/// [`SecretBuffer::duplicate`].
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer {
    data: Vec<u8>,
}

impl SecretBuffer {
    /// Take ownership of a byte vector. The bytes are zeroed on drop.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Copy a byte slice into a fresh buffer.
    pub fn from_slice(slice: &[u8]) -> Self {
        Self {
            data: slice.to_vec(),
        }
    }

    /// Borrow the buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Buffer contents as UTF-8, replacing invalid sequences.
    ///
    /// Values enter kiln as text (CLI arguments, JSON strings, env files),
    /// so the lossy conversion is a formality.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Explicitly copy into an independent buffer.
    pub fn duplicate(&self) -> Self {
        Self::from_slice(&self.data)
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("data", &"<redacted>")
            .field("len", &self.data.len())
            .finish()
    }
}

/// An environment variable map whose values are all [`SecretBuffer`]s.
///
/// Keys iterate in lexicographic order, which is the display and export
/// order for variables. Dropping the map zeroes every value.
#[derive(Default)]
pub struct SecretMap {
    vars: BTreeMap<String, SecretBuffer>,
}

impl SecretMap {
    pub fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Insert a value. A replaced value is zeroed as it is dropped.
    pub fn insert(&mut self, key: impl Into<String>, value: SecretBuffer) {
        self.vars.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&SecretBuffer> {
        self.vars.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variable names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Entries sorted by variable name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretBuffer)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for SecretMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMap")
            .field("vars", &format!("<{} redacted>", self.vars.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation_and_access() {
        let buf = SecretBuffer::new(vec![1, 2, 3, 4]);
        assert_eq!(buf.len(), 4);
        assert!(!buf.is_empty());
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_buffer_from_slice_is_independent() {
        let source = vec![9u8, 8, 7];
        let buf = SecretBuffer::from_slice(&source);
        drop(source);
        assert_eq!(buf.as_bytes(), &[9, 8, 7]);
    }

    #[test]
    fn test_buffer_duplicate() {
        let buf = SecretBuffer::from_slice(b"secret");
        let copy = buf.duplicate();
        drop(buf);
        assert_eq!(copy.as_bytes(), b"secret");
    }

    #[test]
    fn test_buffer_as_str() {
        let buf = SecretBuffer::from_slice(b"postgres://localhost/db");
        assert_eq!(buf.as_str(), "postgres://localhost/db");
    }

    #[test]
    fn test_buffer_debug_redacted() {
        let buf = SecretBuffer::from_slice(b"hunter2");
        let debug = format!("{:?}", buf);
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_map_insert_and_get() {
        let mut map = SecretMap::new();
        map.insert("API_KEY", SecretBuffer::from_slice(b"abc"));

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("API_KEY"));
        assert_eq!(map.get("API_KEY").unwrap().as_bytes(), b"abc");
        assert!(map.get("MISSING").is_none());
    }

    #[test]
    fn test_map_keys_sorted() {
        let mut map = SecretMap::new();
        map.insert("ZULU", SecretBuffer::from_slice(b"z"));
        map.insert("ALPHA", SecretBuffer::from_slice(b"a"));
        map.insert("MIKE", SecretBuffer::from_slice(b"m"));

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["ALPHA", "MIKE", "ZULU"]);
    }

    #[test]
    fn test_map_debug_redacted() {
        let mut map = SecretMap::new();
        map.insert("TOKEN", SecretBuffer::from_slice(b"tok"));
        let debug = format!("{:?}", map);
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("tok"));
    }
}
