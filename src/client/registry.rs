//! Connector registry keyed by connection string.

use crate::client::connector::Connector;
use crate::connection::ConnectionParams;
use crate::error::ConnectionError;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shares one [`Connector`] between every caller that opens the same
/// connection string.
///
/// An entry lives from the first `open` until the last connection opened
/// through it is closed.
#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    connectors: Mutex<HashMap<String, Arc<Connector>>>,
}

impl ConnectorRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // A poisoned map is still consistent: every mutation is a single insert or remove.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Connector>>> {
        self.connectors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the connector registered for `dsn`, parsing and registering a
    /// new one on first use.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if `dsn` cannot be parsed. Nothing is
    /// registered in that case.
    pub fn open(self: &Arc<Self>, dsn: &str) -> Result<Arc<Connector>, ConnectionError> {
        let mut connectors = self.lock();
        if let Some(connector) = connectors.get(dsn) {
            return Ok(Arc::clone(connector));
        }

        let params = ConnectionParams::from_str(dsn)?;
        let connector = Arc::new(Connector::new(dsn, params, Arc::downgrade(self)));
        connectors.insert(dsn.to_string(), Arc::clone(&connector));
        tracing::debug!(host = %connector.params().host, "registered connector");
        Ok(connector)
    }

    /// Drop the entry for `connector`, unless the key was already reused by
    /// another connector.
    pub(crate) fn remove(&self, connector: &Connector) {
        let mut connectors = self.lock();
        let registered = connectors
            .get(connector.dsn())
            .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), connector));
        if registered {
            connectors.remove(connector.dsn());
        }
    }

    pub fn contains(&self, dsn: &str) -> bool {
        self.lock().contains_key(dsn)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
