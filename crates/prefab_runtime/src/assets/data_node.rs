//! Generic attributed data tree
//!
//! Library files are parsed into [`DataNode`] trees before any prefab code
//! looks at them. Attributes are stored as strings and converted on access,
//! so a missing or malformed attribute simply reads as `None`.

use crate::foundation::math::{Quat, Quaternion, Vec3};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tagged node with string attributes and ordered children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataNode {
    /// Node tag
    pub tag: String,
    /// Attributes by name
    pub attributes: BTreeMap<String, String>,
    /// Child nodes in document order
    pub children: Vec<DataNode>,
}

impl DataNode {
    /// Create a node without attributes or children
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.insert(name.into(), value.to_string());
        self
    }

    /// Builder pattern: append a child
    pub fn with_child(mut self, child: DataNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child
    pub fn push_child(&mut self, child: DataNode) {
        self.children.push(child);
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// First child with the given tag
    pub fn child(&self, tag: &str) -> Option<&DataNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Raw attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Boolean attribute: `1`/`0` or `true`/`false`
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        match self.attr(name)?.trim() {
            "1" => Some(true),
            "0" => Some(false),
            other => other.parse().ok(),
        }
    }

    /// Signed integer attribute
    pub fn attr_i32(&self, name: &str) -> Option<i32> {
        self.attr(name)?.trim().parse().ok()
    }

    /// Unsigned integer attribute
    pub fn attr_u32(&self, name: &str) -> Option<u32> {
        self.attr(name)?.trim().parse().ok()
    }

    /// Float attribute
    pub fn attr_f32(&self, name: &str) -> Option<f32> {
        self.attr(name)?.trim().parse().ok()
    }

    /// Vector attribute written as `x,y,z`
    pub fn attr_vec3(&self, name: &str) -> Option<Vec3> {
        let [x, y, z] = parse_floats::<3>(self.attr(name)?)?;
        Some(Vec3::new(x, y, z))
    }

    /// Rotation attribute written as `w,x,y,z`
    pub fn attr_quat(&self, name: &str) -> Option<Quat> {
        let [w, x, y, z] = parse_floats::<4>(self.attr(name)?)?;
        let quaternion = Quaternion::new(w, x, y, z);
        if quaternion.norm() <= f32::EPSILON {
            return None;
        }
        Some(Quat::from_quaternion(quaternion))
    }

    /// Binary attribute stored as base64 text
    pub fn attr_base64(&self, name: &str) -> Option<Vec<u8>> {
        let text = self.attr(name)?;
        match base64::engine::general_purpose::STANDARD.decode(text.trim()) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::warn!("Attribute '{}' of <{}> is not valid base64: {}", name, self.tag, err);
                None
            }
        }
    }
}

fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut values = [0.0; N];
    let mut parts = text.split(',');
    for value in &mut values {
        *value = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(values)
}
