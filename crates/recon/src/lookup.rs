use std::collections::HashMap;

use crate::config::DuplicatePolicy;

/// Records keyed by unit code, iterated in first-seen key order.
///
/// Unit codes are not unique within a file. A repeated code keeps its
/// original position; which record it holds depends on the policy
/// (`LastWins` overwrites in place, `FirstWins` ignores the repeat).
#[derive(Debug)]
pub struct UnitLookup<'a, T> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, &'a T)>,
    duplicates: usize,
}

impl<'a, T> UnitLookup<'a, T> {
    pub fn build<I>(items: I, key: impl Fn(&'a T) -> &'a str, policy: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = &'a T>,
    {
        let mut lookup = UnitLookup {
            index: HashMap::new(),
            entries: Vec::new(),
            duplicates: 0,
        };
        for item in items {
            lookup.insert(key(item), item, policy);
        }
        lookup
    }

    fn insert(&mut self, code: &'a str, item: &'a T, policy: DuplicatePolicy) {
        match self.index.get(code) {
            Some(&slot) => {
                self.duplicates += 1;
                if policy == DuplicatePolicy::LastWins {
                    self.entries[slot].1 = item;
                }
            }
            None => {
                self.index.insert(code, self.entries.len());
                self.entries.push((code, item));
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&'a T> {
        self.index.get(code).map(|&slot| self.entries[slot].1)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a T)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records collapsed into an existing key.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}
