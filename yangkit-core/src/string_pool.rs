//! String interning pool shared by all modules of a context
//!
//! Schema trees repeat the same identifiers, prefixes and argument
//! strings many times over. The pool deduplicates them into `Arc<str>`
//! handles so string equality reduces to pointer equality and a module
//! set holds each distinct string once.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// String interning pool owned by a context
#[derive(Debug, Default)]
pub struct StringPool {
    pool: RwLock<HashMap<Box<str>, Arc<str>>>,
}

impl StringPool {
    /// Create a new string pool
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: RwLock::new(HashMap::new()),
        }
    }

    /// Intern a string and return an `Arc<str>`
    ///
    /// Equal inputs always return pointer-equal handles.
    pub fn intern(&self, s: &str) -> Arc<str> {
        // Read lock first for the common case
        {
            let pool = self.pool.read();
            if let Some(interned) = pool.get(s) {
                return Arc::clone(interned);
            }
        }

        let mut pool = self.pool.write();
        // Double-check in case another caller interned while we waited
        if let Some(interned) = pool.get(s) {
            return Arc::clone(interned);
        }

        let interned: Arc<str> = Arc::from(s);
        pool.insert(Box::from(s), Arc::clone(&interned));
        interned
    }

    /// Intern an `Option<&str>`
    pub fn intern_option(&self, s: Option<&str>) -> Option<Arc<str>> {
        s.map(|s| self.intern(s))
    }

    /// Number of distinct strings currently held
    pub fn size(&self) -> usize {
        self.pool.read().len()
    }

    /// Drop pool entries no longer referenced from outside the pool
    pub fn prune(&self) {
        self.pool
            .write()
            .retain(|_, interned| Arc::strong_count(interned) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_interning() {
        let pool = StringPool::new();

        let s1 = pool.intern("interface");
        let s2 = pool.intern("interface");
        let s3 = pool.intern("mtu");

        // Same string returns the same Arc
        assert!(Arc::ptr_eq(&s1, &s2));

        // Different strings do not
        assert!(!Arc::ptr_eq(&s1, &s3));

        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_option_interning() {
        let pool = StringPool::new();
        let some = pool.intern_option(Some("value"));
        let none = pool.intern_option(None);

        assert_eq!(some.as_deref(), Some("value"));
        assert_eq!(none, None);
    }

    #[test]
    fn test_prune() {
        let pool = StringPool::new();
        let kept = pool.intern("kept");
        {
            let _dropped = pool.intern("dropped");
        }
        pool.prune();
        assert_eq!(pool.size(), 1);
        assert_eq!(&*kept, "kept");
    }
}
