use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Named string bindings visible to `arg://` references.
///
/// Cloning is a reference-count bump. `extended` copies the bindings into a
/// fresh map, so a child document never observes siblings' extensions and
/// the parent is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    bindings: Rc<BTreeMap<String, String>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Child scope with `pairs` layered on top. Later duplicates win.
    pub fn extended<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_none() {
            return self.clone();
        }
        let mut bindings = (*self.bindings).clone();
        for (k, v) in pairs {
            bindings.insert(k.into(), v.into());
        }
        Self {
            bindings: Rc::new(bindings),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new().extended(iter)
    }
}

impl From<BTreeMap<String, String>> for Scope {
    fn from(bindings: BTreeMap<String, String>) -> Self {
        Self {
            bindings: Rc::new(bindings),
        }
    }
}

impl From<HashMap<String, String>> for Scope {
    fn from(bindings: HashMap<String, String>) -> Self {
        bindings.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_leaves_parent_untouched() {
        let parent: Scope = [("name", "foo"), ("env", "dev")].into_iter().collect();
        let child = parent.extended([("env", "prod"), ("region", "eu")]);

        assert_eq!(parent.get("env"), Some("dev"));
        assert_eq!(parent.get("region"), None);
        assert_eq!(child.get("env"), Some("prod"));
        assert_eq!(child.get("name"), Some("foo"));
        assert_eq!(child.len(), 3);
    }

    #[test]
    fn later_duplicates_overwrite_within_extension() {
        let child = Scope::new().extended([("k", "1"), ("k", "2")]);
        assert_eq!(child.get("k"), Some("2"));
    }

    #[test]
    fn empty_extension_shares_bindings() {
        let parent: Scope = [("a", "b")].into_iter().collect();
        let child = parent.extended(Vec::<(String, String)>::new());
        assert!(Rc::ptr_eq(&parent.bindings, &child.bindings));
    }
}
