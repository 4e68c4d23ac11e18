//! String interning for category tags and person names.
//!
//! The builder compares categories for every adjacent variable pair, so tags are
//! turned into dense integer ids once per request. Person names use the same
//! table so a person's id doubles as its index in the decision variable layout.

use rustc_hash::FxHashMap;

/// Interned symbol id (u32 for compact storage and fast hashing).
pub type SymbolId = u32;

/// Bidirectional string <-> dense id table. Ids are assigned in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    to_id: FxHashMap<String, SymbolId>,
    from_id: Vec<String>,
}

impl Interner {
    /// Create a new interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_id: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning its id. Re-interning returns the existing id.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.to_id.get(s) {
            return id;
        }
        self.push(s)
    }

    /// Intern a string that must not have been seen before.
    ///
    /// Returns the existing id as the error when `s` is already present.
    pub fn intern_unique(&mut self, s: &str) -> Result<SymbolId, SymbolId> {
        match self.to_id.get(s) {
            Some(&existing) => Err(existing),
            None => Ok(self.push(s)),
        }
    }

    fn push(&mut self, s: &str) -> SymbolId {
        let id = self.from_id.len() as SymbolId;
        self.from_id.push(s.to_string());
        self.to_id.insert(s.to_string(), id);
        id
    }

    #[inline]
    pub fn get(&self, s: &str) -> Option<SymbolId> {
        self.to_id.get(s).copied()
    }

    #[inline]
    pub fn resolve(&self, id: SymbolId) -> Option<&str> {
        self.from_id.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.from_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_id.is_empty()
    }

    /// Symbols in id order.
    pub fn symbols(&self) -> &[String] {
        &self.from_id
    }
}
