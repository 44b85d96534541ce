//! Hierarchical key/value documents: the unit of scenario state that crosses
//! the wire.
//!
//! A [`Document`] has a name, an ordered list of `(key, value)` pairs where
//! keys may repeat, and an ordered list of child documents. Order is
//! significant everywhere, which keeps the encoded form deterministic.

use std::fmt;

/// An ordered tree node of string values and child documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    name: String,
    values: Vec<(String, String)>,
    children: Vec<Document>,
}

impl Document {
    /// Creates an empty document with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The document's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the document.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends a value. Existing values with the same key are kept.
    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.push((key.into(), value.into()));
    }

    /// Replaces the first value under `key`, or appends one if there is none.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.values.push((key.to_string(), value.into())),
        }
    }

    /// Returns the first value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value stored under `key`, in insertion order.
    pub fn get_values(&self, key: &str) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns `true` if at least one value is stored under `key`.
    pub fn has_value(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    /// All `(key, value)` pairs in insertion order.
    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    /// Appends an empty child named `name` and returns it for filling in.
    pub fn add_child(&mut self, name: impl Into<String>) -> &mut Document {
        self.children.push(Document::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Appends an already-built child document.
    pub fn push_child(&mut self, child: Document) {
        self.children.push(child);
    }

    /// Returns the first child named `name`.
    pub fn get_child(&self, name: &str) -> Option<&Document> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable access to the first child named `name`.
    pub fn get_child_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// All children in insertion order.
    pub fn children(&self) -> &[Document] {
        &self.children
    }

    /// Returns `true` if the document has neither values nor children.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }

    /// Number of levels in the tree; a document without children has depth 1.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }

    /// Human-readable nested dump for diagnostics. Not a wire format.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, "");
        out
    }

    fn write_pretty(&self, out: &mut String, indent: &str) {
        out.push_str(&format!("{indent}NodeName: '{}'\n", self.name));
        out.push_str(&format!("{indent}{{\n"));
        for (key, value) in &self.values {
            out.push_str(&format!("{indent}Value: '{key}' = '{value}'\n"));
        }
        let child_indent = format!("{indent}\t");
        for child in &self.children {
            child.write_pretty(out, &child_indent);
        }
        out.push_str(&format!("{indent}}}\n"));
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}
