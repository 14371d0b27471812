//! Authenticated identity produced by a client

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated user as reported by one client.
///
/// Built once by the client (builder methods consume `self`) and never
/// mutated afterwards. Serialized as JSON when persisted in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    id: String,
    client_name: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_name: client_name.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Identifier qualified by the originating client, e.g. `github#1234`.
    pub fn typed_id(&self) -> String {
        format!("{}#{}", self.client_name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_attributes() {
        let profile = UserProfile::new("42", "github")
            .with_attribute("login", "octocat")
            .with_attribute("admin", true);

        assert_eq!(profile.id(), "42");
        assert_eq!(profile.client_name(), "github");
        assert_eq!(profile.attribute("login"), Some(&json!("octocat")));
        assert_eq!(profile.attribute("admin"), Some(&json!(true)));
        assert_eq!(profile.typed_id(), "github#42");
    }

    #[test]
    fn deserializes_without_attributes() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": "u1", "client_name": "form"})).unwrap();
        assert!(profile.attributes().is_empty());
    }
}
