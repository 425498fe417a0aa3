use serde::{Deserialize, Serialize};

/// Table names ordered so that every referenced table precedes its dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadOrder(Vec<String>);

impl LoadOrder {
    pub fn new(tables: Vec<String>) -> Self {
        Self(tables)
    }

    pub fn position(&self, table: &str) -> Option<usize> {
        self.0.iter().position(|t| t == table)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Dependents first; the order tables can be dropped in.
    pub fn reversed(&self) -> impl Iterator<Item = &str> {
        self.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl PartialEq<[&str]> for LoadOrder {
    fn eq(&self, other: &[&str]) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<const N: usize> PartialEq<[&str; N]> for LoadOrder {
    fn eq(&self, other: &[&str; N]) -> bool {
        self == &other[..]
    }
}
