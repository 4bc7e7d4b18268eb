//! In-memory page document

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::Document;
use crate::fragment::{LoadError, LoadResult};
use crate::script::ScriptNode;

/// Receives script nodes at the moment they are appended to the body
///
/// This is where a page would execute them; hosts see nodes strictly in
/// append order.
pub trait ScriptHost: Send {
    fn execute(&mut self, node: &ScriptNode);
}

/// A placeholder element owned by the page
#[derive(Debug, Clone, Default, Serialize)]
pub struct Container {
    /// Current inner HTML
    pub contents: String,
    /// How many times the contents were replaced
    pub replacements: u32,
}

/// Page with a fixed set of containers and a script-only body
#[derive(Default)]
pub struct PageDocument {
    containers: BTreeMap<String, Container>,
    body_scripts: Vec<ScriptNode>,
    host: Option<Box<dyn ScriptHost>>,
}

/// Serializable view of a [`PageDocument`]
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSnapshot {
    pub containers: BTreeMap<String, Container>,
    pub body_scripts: Vec<ScriptNode>,
}

impl PageDocument {
    /// Create a document with empty containers for each identifier
    pub fn with_containers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::default();
        for id in ids {
            doc.add_container(id, "");
        }
        doc
    }

    /// Declare a container with initial (placeholder) contents
    pub fn add_container(&mut self, id: impl Into<String>, placeholder: impl Into<String>) {
        self.containers.insert(
            id.into(),
            Container {
                contents: placeholder.into(),
                replacements: 0,
            },
        );
    }

    /// Builder-style [`add_container`](Self::add_container)
    pub fn container(mut self, id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        self.add_container(id, placeholder);
        self
    }

    /// Install the hook that runs appended scripts
    pub fn with_script_host(mut self, host: impl ScriptHost + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Current contents of a container
    pub fn contents(&self, id: &str) -> Option<&str> {
        self.containers.get(id).map(|c| c.contents.as_str())
    }

    /// Number of replacements a container has received
    pub fn replacements(&self, id: &str) -> u32 {
        self.containers.get(id).map(|c| c.replacements).unwrap_or(0)
    }

    /// Script nodes appended to the body, in append order
    pub fn body_scripts(&self) -> &[ScriptNode] {
        &self.body_scripts
    }

    pub fn container_ids(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            containers: self.containers.clone(),
            body_scripts: self.body_scripts.clone(),
        }
    }
}

impl Document for PageDocument {
    fn contains_container(&self, container_id: &str) -> bool {
        self.containers.contains_key(container_id)
    }

    fn replace_contents(&mut self, container_id: &str, html: &str) -> LoadResult<()> {
        let container = self
            .containers
            .get_mut(container_id)
            .ok_or_else(|| LoadError::missing_container(container_id))?;

        container.contents = html.to_string();
        container.replacements += 1;
        Ok(())
    }

    fn append_script(&mut self, node: ScriptNode) {
        if let Some(host) = self.host.as_mut() {
            host.execute(&node);
        }
        self.body_scripts.push(node);
    }
}

impl fmt::Debug for PageDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDocument")
            .field("containers", &self.containers)
            .field("body_scripts", &self.body_scripts)
            .field("has_script_host", &self.host.is_some())
            .finish()
    }
}
