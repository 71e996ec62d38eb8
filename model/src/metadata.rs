use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The identity metadata carried by every clusterup object. A deliberately small subset of the
/// Kubernetes `ObjectMeta` shape: name, creation timestamp and labels are the only fields the
/// completion engine and the registry need.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set once, at first persistence (or pinned by the caller for reproducible output). Never
    /// changed afterward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Provides some conveniences for querying a clusterup object.
pub trait ObjectExt {
    /// Returns this object's metadata. Implement this by returning `&self.metadata`; the rest of
    /// the trait's functions are implemented for you.
    fn object_meta(&self) -> &ObjectMeta;

    /// Mutable access to the metadata, used by registries to stamp the creation timestamp.
    fn object_meta_mut(&mut self) -> &mut ObjectMeta;

    /// Returns the object's name, unwrapping a potential `None` with `""`. In practice an
    /// object's name cannot be missing since names are how objects are addressed, so we do away
    /// with the `Option` for convenience.
    fn object_name(&self) -> &str {
        self.object_meta().name.as_deref().unwrap_or("")
    }

    /// Returns this object's YAML representation as a String.
    fn to_yaml(&self) -> crate::Result<String>;

    /// Returns the value of the given label, if present.
    fn label(&self, key: &str) -> Option<&str> {
        self.object_meta()
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(|value| value.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    struct Fake {
        meta: ObjectMeta,
    }

    impl ObjectExt for Fake {
        fn object_meta(&self) -> &ObjectMeta {
            &self.meta
        }

        fn object_meta_mut(&mut self) -> &mut ObjectMeta {
            &mut self.meta
        }

        fn to_yaml(&self) -> crate::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn object_name_and_labels() {
        let fake = Fake {
            meta: ObjectMeta {
                name: Some("my-cluster.example.com".to_string()),
                creation_timestamp: None,
                labels: Some(btreemap! {
                    "clusterup.io/cluster".to_string() => "my-cluster.example.com".to_string(),
                }),
            },
        };
        assert_eq!(fake.object_name(), "my-cluster.example.com");
        assert_eq!(
            fake.label("clusterup.io/cluster"),
            Some("my-cluster.example.com")
        );
        assert_eq!(fake.label("nope"), None);
    }

    #[test]
    fn object_name_defaults_to_empty() {
        let fake = Fake {
            meta: ObjectMeta::default(),
        };
        assert_eq!(fake.object_name(), "");
    }
}
