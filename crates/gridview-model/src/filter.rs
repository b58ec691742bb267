//! Filter tree data model.
//!
//! A filter tree is a nested boolean expression: groups combine their
//! children with AND/OR, leaves compare one field against a value. The
//! root of every tree is a [`FilterGroup`].
//!
//! # Wire format
//!
//! ```text
//! { "kind": "group", "id": "…", "logical": "AND", "children": [ … ] }
//! { "kind": "leaf",  "id": "…", "field": "balance", "operator": ">", "value": 10 }
//! ```

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Identifier of a node, unique within one tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(ModelError::UnknownLogical(s.to_string())),
        }
    }
}

/// Operand of a leaf condition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for null and for blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Convert to a JSON value for comparison against row cells.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(value) => serde_json::Value::Bool(*value),
            Self::Number(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(value) => serde_json::Value::String(value.clone()),
        }
    }

    /// Parse a user-typed value. Numbers and booleans are recognized,
    /// everything else stays text; `null` yields [`FilterValue::Null`].
    pub fn parse_loose(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed {
            "null" => Self::Null,
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => trimmed
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map_or_else(|| Self::Text(input.to_string()), Self::Number),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
        }
    }
}

/// Leaf condition: `field operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    pub id: NodeId,
    pub field: String,
    pub operator: String,
    pub value: FilterValue,
}

/// Logical group of conditions and nested groups.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGroup {
    pub id: NodeId,
    pub logical: LogicalOp,
    pub children: Vec<FilterNode>,
}

impl FilterGroup {
    /// Empty group with a freshly generated id.
    pub fn new(logical: LogicalOp) -> Self {
        Self {
            id: NodeId::generate(),
            logical,
            children: Vec::new(),
        }
    }

    pub fn with_id(id: impl Into<NodeId>, logical: LogicalOp) -> Self {
        Self {
            id: id.into(),
            logical,
            children: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Find a node (this group included) by id, depth-first.
    pub fn find(&self, id: &str) -> Option<NodeRef<'_>> {
        if self.id == id {
            return Some(NodeRef::Group(self));
        }
        self.children.iter().find_map(|child| match child {
            FilterNode::Leaf(leaf) if leaf.id == id => Some(NodeRef::Leaf(leaf)),
            FilterNode::Leaf(_) => None,
            FilterNode::Group(group) => group.find(id),
        })
    }

    pub fn find_group(&self, id: &str) -> Option<&FilterGroup> {
        match self.find(id) {
            Some(NodeRef::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn find_leaf(&self, id: &str) -> Option<&FilterLeaf> {
        match self.find(id) {
            Some(NodeRef::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// All node ids in depth-first pre-order, root first.
    pub fn node_ids(&self) -> Vec<&NodeId> {
        let mut ids = vec![&self.id];
        for child in &self.children {
            match child {
                FilterNode::Leaf(leaf) => ids.push(&leaf.id),
                FilterNode::Group(group) => ids.extend(group.node_ids()),
            }
        }
        ids
    }

    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                FilterNode::Leaf(_) => 1,
                FilterNode::Group(group) => group.leaf_count(),
            })
            .sum()
    }

    /// Nesting depth; a root without subgroups has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| match child {
                FilterNode::Leaf(_) => 0,
                FilterNode::Group(group) => group.depth(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl Default for FilterGroup {
    fn default() -> Self {
        Self::new(LogicalOp::And)
    }
}

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "NodeRepr")]
pub enum FilterNode {
    Group(FilterGroup),
    Leaf(FilterLeaf),
}

impl FilterNode {
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Group(group) => &group.id,
            Self::Leaf(leaf) => &leaf.id,
        }
    }

    pub fn as_group(&self) -> Option<&FilterGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&FilterLeaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Group(_) => None,
        }
    }
}

/// Borrowed view of a node found by id.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a FilterGroup),
    Leaf(&'a FilterLeaf),
}

// =============================================================================
// SERDE
// =============================================================================

impl Serialize for FilterGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FilterGroup", 4)?;
        state.serialize_field("kind", "group")?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("logical", &self.logical)?;
        state.serialize_field("children", &self.children)?;
        state.end()
    }
}

impl Serialize for FilterLeaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FilterLeaf", 5)?;
        state.serialize_field("kind", "leaf")?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("field", &self.field)?;
        state.serialize_field("operator", &self.operator)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Group(group) => group.serialize(serializer),
            Self::Leaf(leaf) => leaf.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterGroup {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match NodeRepr::deserialize(deserializer)? {
            NodeRepr::Group(fields) => Ok(fields.into()),
            NodeRepr::Leaf(_) => Err(serde::de::Error::custom(
                "expected a filter group, found a leaf",
            )),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum NodeRepr {
    Group(GroupFields),
    Leaf(LeafFields),
}

#[derive(Deserialize)]
struct GroupFields {
    id: NodeId,
    #[serde(default)]
    logical: LogicalOp,
    #[serde(default)]
    children: Vec<FilterNode>,
}

#[derive(Deserialize)]
struct LeafFields {
    id: NodeId,
    field: String,
    #[serde(default)]
    operator: String,
    #[serde(default)]
    value: FilterValue,
}

impl From<GroupFields> for FilterGroup {
    fn from(fields: GroupFields) -> Self {
        Self {
            id: fields.id,
            logical: fields.logical,
            children: fields.children,
        }
    }
}

impl From<NodeRepr> for FilterNode {
    fn from(repr: NodeRepr) -> Self {
        match repr {
            NodeRepr::Group(fields) => Self::Group(fields.into()),
            NodeRepr::Leaf(fields) => Self::Leaf(FilterLeaf {
                id: fields.id,
                field: fields.field,
                operator: fields.operator,
                value: fields.value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FilterGroup {
        FilterGroup {
            id: "root".into(),
            logical: LogicalOp::And,
            children: vec![
                FilterNode::Leaf(FilterLeaf {
                    id: "a".into(),
                    field: "balance".to_string(),
                    operator: ">".to_string(),
                    value: FilterValue::Number(10.0),
                }),
                FilterNode::Group(FilterGroup {
                    id: "g".into(),
                    logical: LogicalOp::Or,
                    children: vec![FilterNode::Leaf(FilterLeaf {
                        id: "b".into(),
                        field: "status".to_string(),
                        operator: "=".to_string(),
                        value: FilterValue::Text("open".to_string()),
                    })],
                }),
            ],
        }
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(NodeId::generate(), NodeId::generate());
    }

    #[test]
    fn find_by_id() {
        let tree = sample();
        assert!(matches!(tree.find("root"), Some(NodeRef::Group(_))));
        assert!(tree.find_group("g").is_some());
        assert_eq!(tree.find_leaf("b").map(|leaf| leaf.field.as_str()), Some("status"));
        assert!(tree.find_leaf("g").is_none());
        assert!(tree.find("zzz").is_none());
    }

    #[test]
    fn structure_queries() {
        let tree = sample();
        let ids: Vec<&str> = tree.node_ids().into_iter().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["root", "a", "g", "b"]);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 2);
        assert_eq!(FilterGroup::default().depth(), 1);
    }

    #[test]
    fn json_round_trip_keeps_structure() {
        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: FilterGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn leaf_is_not_a_root() {
        let json = r#"{"kind":"leaf","id":"x","field":"f","operator":"=","value":1}"#;
        assert!(serde_json::from_str::<FilterGroup>(json).is_err());
    }

    #[test]
    fn value_parsing() {
        assert_eq!(FilterValue::parse_loose("12.5"), FilterValue::Number(12.5));
        assert_eq!(FilterValue::parse_loose("true"), FilterValue::Bool(true));
        assert_eq!(FilterValue::parse_loose("null"), FilterValue::Null);
        assert_eq!(
            FilterValue::parse_loose("acme"),
            FilterValue::Text("acme".to_string())
        );
        assert!(FilterValue::Text("  ".to_string()).is_blank());
    }

    #[test]
    fn logical_parse_and_flip() {
        assert_eq!("or".parse::<LogicalOp>().unwrap(), LogicalOp::Or);
        assert_eq!(LogicalOp::And.flipped(), LogicalOp::Or);
        assert!("xor".parse::<LogicalOp>().is_err());
    }
}
