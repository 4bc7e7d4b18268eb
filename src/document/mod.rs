//! Document model
//!
//! The loader never owns the page. It only needs three capabilities from
//! it, captured by the [`Document`] trait:
//!
//! - look up a container by identifier
//! - replace a container's contents in one step
//! - append a live script node to the body
//!
//! [`PageDocument`] is the in-memory implementation used by the CLI and the
//! tests.

mod page;

pub use page::{Container, DocumentSnapshot, PageDocument, ScriptHost};

use crate::fragment::LoadResult;
use crate::script::ScriptNode;

/// The page the loader splices fragments into
pub trait Document {
    /// Whether a container with this identifier exists
    fn contains_container(&self, container_id: &str) -> bool;

    /// Replace the whole contents of a container
    ///
    /// Must be all-or-nothing: either the container holds exactly `html`
    /// afterwards, or it is unchanged and an error is returned.
    fn replace_contents(&mut self, container_id: &str, html: &str) -> LoadResult<()>;

    /// Append a script node to the document body
    fn append_script(&mut self, node: ScriptNode);
}

impl<D: Document + ?Sized> Document for &mut D {
    fn contains_container(&self, container_id: &str) -> bool {
        (**self).contains_container(container_id)
    }

    fn replace_contents(&mut self, container_id: &str, html: &str) -> LoadResult<()> {
        (**self).replace_contents(container_id, html)
    }

    fn append_script(&mut self, node: ScriptNode) {
        (**self).append_script(node)
    }
}
