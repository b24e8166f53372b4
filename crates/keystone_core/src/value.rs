//! Attribute values that may point at another node's computed output.

use crate::id::LogicalId;
use serde::{Deserialize, Serialize};

/// A computed output of a resource, known only after materialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Resource ARN
    Arn,
    /// Physical name
    Name,
    /// Generated API id
    ApiId,
    /// Network handle of a network binding
    VpcId,
    /// Subnet handles of a network binding
    SubnetIds,
    /// Security boundary handle of a network binding
    SecurityGroupId,
}

/// Reference to an attribute of another node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrRef {
    /// Node owning the attribute
    #[serde(rename = "ref")]
    pub node: LogicalId,
    /// Attribute read from it
    #[serde(rename = "attr")]
    pub attribute: Attribute,
}

impl AttrRef {
    /// Create a new reference
    #[must_use]
    pub fn new(node: LogicalId, attribute: Attribute) -> Self {
        Self { node, attribute }
    }
}

impl std::fmt::Display for AttrRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:?}", self.node, self.attribute)
    }
}

/// A resource property value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Known at declaration time
    Literal(String),
    /// Resolved by the deployment tool
    Ref(AttrRef),
}

impl Value {
    /// Create a reference value
    #[must_use]
    pub fn reference(node: &LogicalId, attribute: Attribute) -> Self {
        Self::Ref(AttrRef::new(node.clone(), attribute))
    }

    /// Referenced node, if any
    #[must_use]
    pub fn node(&self) -> Option<&LogicalId> {
        match self {
            Self::Literal(_) => None,
            Self::Ref(r) => Some(&r.node),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<AttrRef> for Value {
    fn from(r: AttrRef) -> Self {
        Self::Ref(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_node() {
        let id = LogicalId::new("stack/table").unwrap();
        let v = Value::reference(&id, Attribute::Arn);
        assert_eq!(v.node(), Some(&id));
        assert_eq!(Value::from("eu-west-1").node(), None);
    }

    #[test]
    fn test_value_serde_shapes() {
        let id = LogicalId::new("stack/table").unwrap();
        let v = Value::reference(&id, Attribute::Arn);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({"ref": "stack/table", "attr": "Arn"}));

        let lit = serde_json::to_value(Value::from("UNIT")).unwrap();
        assert_eq!(lit, serde_json::json!("UNIT"));

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_attr_ref_display() {
        let r = AttrRef::new(LogicalId::new("a/b").unwrap(), Attribute::ApiId);
        assert_eq!(r.to_string(), "a/b.ApiId");
    }
}
