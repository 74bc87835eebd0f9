use super::{ClassInfo, InfoHeader, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fixed, named child object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassInfo>,
}

impl NodeInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            class: None,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.class = Some(class);
        self
    }

    /// The nested class, created empty on first access.
    pub fn class_mut(&mut self) -> &mut ClassInfo {
        self.class.get_or_insert_with(ClassInfo::default)
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            class: None,
        }
    }
}

/// A keyed collection of child objects addressed as a unit.
///
/// On the wire `nodes` is an object keyed by the decimal form of each key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGroupInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        with = "decimal_keys"
    )]
    pub nodes: BTreeMap<u32, ClassInfo>,
}

impl NodeGroupInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            nodes: BTreeMap::new(),
        }
    }

    /// Add a keyed child; keys are unique within the group.
    pub fn insert(&mut self, key: u32, class: ClassInfo) -> Result<(), TreeError> {
        if self.nodes.contains_key(&key) {
            return Err(TreeError::DuplicateKey {
                group: self.header.name.clone(),
                key,
            });
        }
        self.nodes.insert(key, class);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: u32) -> Option<&ClassInfo> {
        self.nodes.get(&key)
    }

    pub fn get_mut(&mut self, key: u32) -> Option<&mut ClassInfo> {
        self.nodes.get_mut(&key)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            nodes: BTreeMap::new(),
        }
    }
}

/// Object keys are strings in JSON; the group keys are `u32`.
///
/// Parsing the key text here keeps decoding independent of how serde
/// buffers flattened structs.
mod decimal_keys {
    use super::ClassInfo;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        nodes: &BTreeMap<u32, ClassInfo>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(nodes.len()))?;
        for (key, class) in nodes {
            map.serialize_entry(&key.to_string(), class)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u32, ClassInfo>, D::Error> {
        let raw = BTreeMap::<String, ClassInfo>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, class)| {
                key.parse::<u32>()
                    .map(|key| (key, class))
                    .map_err(|_| D::Error::custom(format!("invalid node group key '{key}'")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_rejected() {
        let mut group = NodeGroupInfo::new("Axes", "");
        group.insert(1, ClassInfo::new("Axis", "")).unwrap();
        let err = group.insert(1, ClassInfo::new("Axis", "")).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateKey {
                group: "Axes".to_string(),
                key: 1,
            }
        );
    }

    #[test]
    fn test_node_class_mut_creates_class() {
        let mut node = NodeInfo::new("Arm", "");
        assert!(node.class.is_none());
        node.class_mut().header.name = "Arm".to_string();
        assert!(node.class.is_some());
    }
}
