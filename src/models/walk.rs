//! Depth-first traversal of property trees.

use super::property::{Properties, Property};

/// Label of the synthetic root segment.
pub const ROOT: &str = "root";

/// Lazy pre-order walk over a property tree.
///
/// Yields `(dotted_path, property)` for every node reachable through
/// `properties`, starting below the root (`root.a`, `root.a.b`, ...).
/// Multi-field `fields` are not descended into.
pub struct Walk<'a> {
    stack: Vec<(String, &'a Property)>,
}

impl<'a> Walk<'a> {
    pub fn new(properties: &'a Properties) -> Self {
        Self::under(ROOT, properties)
    }

    /// Walk with a custom prefix instead of `root`.
    pub fn under(prefix: &str, properties: &'a Properties) -> Self {
        let mut walk = Walk { stack: Vec::new() };
        walk.push_children(prefix, properties);
        walk
    }

    fn push_children(&mut self, prefix: &str, properties: &'a Properties) {
        // Reversed so the first child is popped first.
        for (name, property) in properties.iter().rev() {
            self.stack.push((format!("{}.{}", prefix, name), property));
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (String, &'a Property);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, property) = self.stack.pop()?;
        if let Some(children) = &property.properties {
            self.push_children(&path, children);
        }
        Some((path, property))
    }
}
