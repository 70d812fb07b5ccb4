//! Enum descriptors with dual-key member lookup.

use crate::error::{SchemaError, SchemaResult};
use std::collections::HashMap;

/// A single declared member of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Machine-readable member name.
    pub name: String,
    /// Human-readable member name.
    pub display_name: String,
    /// Numeric wire value.
    pub value: i64,
}

impl EnumMember {
    /// Creates a member whose display name equals its name.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            value,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// Metadata for an enum type.
///
/// Members can be resolved by their string name or by their numeric wire
/// value. The constructor enforces that every member is reachable by
/// exactly one string key and one numeric key.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    /// Machine-readable type name.
    pub name: String,
    /// Human-readable type name.
    pub display_name: String,
    members: Vec<EnumMember>,
    by_name: HashMap<String, usize>,
    by_value: HashMap<i64, usize>,
}

impl EnumDescriptor {
    /// Builds an enum descriptor, rejecting duplicate string or numeric keys.
    pub fn new(name: impl Into<String>, members: Vec<EnumMember>) -> SchemaResult<Self> {
        let name = name.into();
        let mut by_name = HashMap::with_capacity(members.len());
        let mut by_value = HashMap::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            if by_name.insert(member.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateEnumKey {
                    name,
                    key: member.name.clone(),
                });
            }
            if by_value.insert(member.value, index).is_some() {
                return Err(SchemaError::DuplicateEnumKey {
                    name,
                    key: member.value.to_string(),
                });
            }
        }
        Ok(Self {
            display_name: name.clone(),
            name,
            members,
            by_name,
            by_value,
        })
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// All declared members, in declaration order.
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Resolves a member by its string name.
    pub fn by_name(&self, name: &str) -> Option<&EnumMember> {
        self.by_name.get(name).map(|&i| &self.members[i])
    }

    /// Resolves a member by its numeric wire value.
    pub fn by_value(&self, value: i64) -> Option<&EnumMember> {
        self.by_value.get(&value).map(|&i| &self.members[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> EnumDescriptor {
        EnumDescriptor::new(
            "CaseStatus",
            vec![
                EnumMember::new("Open", 0),
                EnumMember::new("InProgress", 1).with_display_name("In Progress"),
                EnumMember::new("Closed", 2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn dual_key_lookup() {
        let e = status();
        assert_eq!(e.by_name("InProgress").unwrap().value, 1);
        assert_eq!(e.by_value(1).unwrap().display_name, "In Progress");
        assert_eq!(e.by_name("Open").unwrap().value, 0);
        assert!(e.by_name("open").is_none());
        assert!(e.by_value(9).is_none());
    }

    #[test]
    fn duplicate_string_key_rejected() {
        let err = EnumDescriptor::new(
            "Bad",
            vec![EnumMember::new("A", 0), EnumMember::new("A", 1)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEnumKey { ref key, .. } if key == "A"));
    }

    #[test]
    fn duplicate_numeric_key_rejected() {
        let err = EnumDescriptor::new(
            "Bad",
            vec![EnumMember::new("A", 0), EnumMember::new("B", 0)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEnumKey { ref key, .. } if key == "0"));
    }
}
