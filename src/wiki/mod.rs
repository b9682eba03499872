//! Publishing rendered reports to a Confluence wiki.
//!
//! This module handles:
//! - The `WikiRpc` seam (login, logout, page lookup, page store)
//! - Page records that round-trip every attribute the server sent
//! - The per-report publish session: login, resolve parent, create or
//!   update the target page, logout
//!
//! # Module Organization
//!
//! - `xmlrpc` - XML-RPC call encoding and response parsing
//! - `client` - HTTP transport for the `confluence1` XML-RPC service

mod client;
mod xmlrpc;

pub use client::XmlRpcClient;
pub use xmlrpc::XmlRpcValue;

use crate::types::WikiTarget;
use log::{debug, info, warn};
use std::cell::Cell;

/// Fault text Confluence returns when a page is missing or hidden from the caller
pub const PAGE_NOT_FOUND_FAULT: &str = "You're not allowed to view that page, or it does not exist";

/// Errors from a single RPC round trip
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from wiki endpoint: {body}")]
    Http { status: u16, body: String },

    #[error("RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Malformed(String),
}

impl RpcError {
    /// Whether this is the "page missing or not viewable" fault.
    ///
    /// Confluence reports every fault with code 0, so the fault text is the
    /// only discriminator.
    pub fn is_page_not_found(&self) -> bool {
        match self {
            RpcError::Fault { message, .. } => message.contains(PAGE_NOT_FOUND_FAULT),
            _ => false,
        }
    }
}

/// Remote procedures the publisher needs from the wiki
pub trait WikiRpc {
    /// Authenticate and return a session token
    fn login(&self, username: &str, password: &str) -> Result<String, RpcError>;

    /// Invalidate a session token
    fn logout(&self, token: &str) -> Result<(), RpcError>;

    fn get_page(&self, token: &str, space: &str, title: &str) -> Result<Page, RpcError>;

    /// Create (no `id`) or update (with `id`) a page
    fn store_page(&self, token: &str, page: &Page) -> Result<Page, RpcError>;
}

/// A wiki page as an ordered attribute list.
///
/// Pages fetched from the server keep every attribute (id, version, ...) so
/// storing them back updates rather than duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    fields: Vec<(String, XmlRpcValue)>,
}

impl Page {
    /// A page that does not exist yet, to be created under `parent_id`
    pub fn new_child(space: &str, title: &str, parent_id: &str) -> Self {
        let mut page = Page::default();
        page.set("space", space);
        page.set("title", title);
        page.set("parentId", parent_id);
        page
    }

    /// Build a page from a struct value returned by the server
    pub fn from_value(value: XmlRpcValue) -> Result<Self, RpcError> {
        match value {
            XmlRpcValue::Struct(fields) => Ok(Self { fields }),
            other => Err(RpcError::Malformed(format!("expected page struct, found {:?}", other))),
        }
    }

    pub fn to_value(&self) -> XmlRpcValue {
        XmlRpcValue::Struct(self.fields.clone())
    }

    pub fn get(&self, name: &str) -> Option<&XmlRpcValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set an attribute, keeping its position if already present
    pub fn set(&mut self, name: &str, value: impl Into<XmlRpcValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(field) => field.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.get("id").and_then(|v| v.to_text()).filter(|id| !id.is_empty())
    }

    pub fn set_content(&mut self, content: &str) {
        self.set("content", content);
    }
}

#[cfg(test)]
impl Page {
    pub fn parent_id(&self) -> Option<String> {
        self.get("parentId").and_then(|v| v.to_text())
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(|v| v.as_str())
    }

    pub fn content(&self) -> Option<&str> {
        self.get("content").and_then(|v| v.as_str())
    }
}

/// Whether a publish created a new page or overwrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAction {
    Created,
    Updated,
}

/// Publisher session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Active,
    Publishing,
    Closed,
}

/// Errors from one publish, tagged with the step that failed
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Wiki login failed: {0}")]
    Login(#[source] RpcError),

    #[error("Failed to fetch parent page '{title}' in space '{space}': {source}")]
    ParentLookup { space: String, title: String, source: RpcError },

    #[error("Parent page '{title}' in space '{space}' has no id")]
    MissingParentId { space: String, title: String },

    #[error("Failed to fetch page '{title}' in space '{space}': {source}")]
    PageLookup { space: String, title: String, source: RpcError },

    #[error("Failed to store page '{title}' in space '{space}': {source}")]
    Store { space: String, title: String, source: RpcError },

    #[error("Wiki logout failed: {0}")]
    Logout(#[source] RpcError),
}

/// Publishes pages, opening a fresh session for every call
pub struct Publisher<R: WikiRpc> {
    rpc: R,
    username: String,
    password: String,
    state: Cell<SessionState>,
}

impl<R: WikiRpc> Publisher<R> {
    pub fn new(rpc: R, target: &WikiTarget) -> Self {
        Self {
            rpc,
            username: target.username.clone(),
            password: target.password.clone(),
            state: Cell::new(SessionState::Disconnected),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    #[cfg(test)]
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    fn transition(&self, next: SessionState) {
        debug!("Wiki session {:?} -> {:?}", self.state.get(), next);
        self.state.set(next);
    }

    /// Create or update page `title` under `parent` in `space` with `content`
    pub fn publish(&self, title: &str, parent: &str, space: &str, content: &str) -> Result<PageAction, PublishError> {
        debug!("Logging in to wiki as {}", self.username);
        let token = self.rpc.login(&self.username, &self.password).map_err(PublishError::Login)?;
        self.transition(SessionState::Active);

        let result = self.store_with_token(&token, title, parent, space, content);

        let logout = self.rpc.logout(&token);
        self.transition(SessionState::Closed);

        match (result, logout) {
            (Ok(action), Ok(())) => Ok(action),
            (Ok(_), Err(e)) => Err(PublishError::Logout(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(logout_err)) => {
                warn!("Logout after failed publish also failed: {}", logout_err);
                Err(e)
            }
        }
    }

    fn store_with_token(
        &self,
        token: &str,
        title: &str,
        parent: &str,
        space: &str,
        content: &str,
    ) -> Result<PageAction, PublishError> {
        self.transition(SessionState::Publishing);

        let parent_page = self.rpc.get_page(token, space, parent).map_err(|source| PublishError::ParentLookup {
            space: space.to_string(),
            title: parent.to_string(),
            source,
        })?;

        let mut page = match self.rpc.get_page(token, space, title) {
            Ok(page) => {
                debug!("Page '{}' exists in {} (id {:?}), updating", title, space, page.id());
                page
            }
            Err(e) if e.is_page_not_found() => {
                let parent_id = parent_page.id().ok_or_else(|| PublishError::MissingParentId {
                    space: space.to_string(),
                    title: parent.to_string(),
                })?;
                debug!("Page '{}' not found in {}, creating under parent {}", title, space, parent_id);
                Page::new_child(space, title, &parent_id)
            }
            Err(source) => {
                return Err(PublishError::PageLookup { space: space.to_string(), title: title.to_string(), source });
            }
        };

        let action = if page.id().is_some() { PageAction::Updated } else { PageAction::Created };
        page.set_content(content);

        self.rpc.store_page(token, &page).map_err(|source| PublishError::Store {
            space: space.to_string(),
            title: title.to_string(),
            source,
        })?;

        info!("{:?} page '{}' in space {}", action, title, space);
        Ok(action)
    }
}

#[cfg(test)]
#[path = "publisher_test.rs"]
mod publisher_test;
