use crate::ids::SessionId;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const FLASH_PREFIX: &str = "flash_";

/// The per-request session attribute bag.
///
/// A `Session` is handed to the request by the
/// [`SessionManager`](super::SessionManager) and written back when the response is finished.
/// Mutations only touch this in-memory copy until then.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    attributes: Map<String, Value>,
    /// The id arrived in the request cookie and was found in the store.
    persisted: bool,
    /// Ids to delete from the store when the request finishes.
    stale_ids: Vec<SessionId>,
    /// The id the client currently holds, if any.
    client_id: Option<SessionId>,
}

impl Default for Session {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Session {
    /// A new, empty session that the client does not know about yet.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            id: SessionId::new(),
            attributes: Map::new(),
            persisted: false,
            stale_ids: Vec::new(),
            client_id: None,
        }
    }

    pub(crate) fn restored(id: SessionId, attributes: Map<String, Value>) -> Self {
        Self {
            id,
            attributes,
            persisted: true,
            stale_ids: Vec::new(),
            client_id: Some(id),
        }
    }

    /// A fresh session for a client that sent an unknown or malformed id.
    pub(crate) fn replacing(client_id: Option<SessionId>) -> Self {
        Self {
            client_id,
            ..Self::fresh()
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Deserialize an attribute; `None` when missing or of another shape.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.attributes.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn forget(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Remove every attribute but keep the id.
    pub fn flush(&mut self) {
        self.attributes.clear();
    }

    #[must_use]
    pub fn all(&self) -> &Map<String, Value> {
        &self.attributes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Store a value that [`get_flash`](Self::get_flash) will consume.
    pub fn flash(&mut self, key: &str, value: impl Into<Value>) {
        self.put(format!("{FLASH_PREFIX}{key}"), value);
    }

    /// Read and remove a flashed value.
    pub fn get_flash(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(&format!("{FLASH_PREFIX}{key}"))
    }

    /// Read a flashed value without consuming it.
    #[must_use]
    pub fn peek_flash(&self, key: &str) -> Option<&Value> {
        self.attributes.get(&format!("{FLASH_PREFIX}{key}"))
    }

    /// Move the attributes to a new id. The old record is deleted when the request finishes.
    pub fn regenerate(&mut self) {
        if self.persisted || self.client_id == Some(self.id) {
            self.stale_ids.push(self.id);
        }
        self.id = SessionId::new();
        self.persisted = false;
    }

    /// Clear the attributes and retire the id. Anything stored afterwards goes to a new id.
    pub fn destroy(&mut self) {
        self.attributes.clear();
        self.regenerate();
    }

    /// `user_id` attribute, as set by a successful login.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.attributes.get("user_id").and_then(Value::as_i64)
    }

    pub(crate) fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn client_id(&self) -> Option<SessionId> {
        self.client_id
    }

    pub(crate) fn take_stale_ids(&mut self) -> Vec<SessionId> {
        std::mem::take(&mut self.stale_ids)
    }
}
