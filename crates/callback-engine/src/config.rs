//! Client registry shared by every callback
//!
//! Built once at startup and shared as `Arc<Configuration>`; nothing mutates
//! it afterwards, so concurrent requests read it without locking.

use std::fmt;
use std::sync::Arc;

use auth_client::Client;
use session_store::SessionStore;

use crate::error::{CallbackError, Result};

/// Registered clients plus the session store they operate on.
pub struct Configuration {
    clients: Vec<Arc<dyn Client>>,
    session_store: Arc<dyn SessionStore>,
}

impl Configuration {
    pub fn builder(session_store: Arc<dyn SessionStore>) -> ConfigurationBuilder {
        ConfigurationBuilder {
            clients: Vec::new(),
            session_store,
        }
    }

    /// Look up a client by name, ignoring case and surrounding whitespace.
    pub fn find_client(&self, name: &str) -> Option<&Arc<dyn Client>> {
        let name = name.trim();
        self.clients
            .iter()
            .find(|client| client.name().trim().eq_ignore_ascii_case(name))
    }

    /// All clients in registration order.
    pub fn all_clients(&self) -> &[Arc<dyn Client>] {
        &self.clients
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session_store
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field(
                "clients",
                &self.clients.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

pub struct ConfigurationBuilder {
    clients: Vec<Arc<dyn Client>>,
    session_store: Arc<dyn SessionStore>,
}

impl ConfigurationBuilder {
    pub fn client(mut self, client: Arc<dyn Client>) -> Self {
        self.clients.push(client);
        self
    }

    pub fn clients(mut self, clients: impl IntoIterator<Item = Arc<dyn Client>>) -> Self {
        self.clients.extend(clients);
        self
    }

    /// Fails with `DuplicateClient` when two clients share a name (compared
    /// the same way `find_client` compares).
    pub fn build(self) -> Result<Configuration> {
        for (i, client) in self.clients.iter().enumerate() {
            let name = client.name().trim();
            if self.clients[..i]
                .iter()
                .any(|other| other.name().trim().eq_ignore_ascii_case(name))
            {
                return Err(CallbackError::DuplicateClient(name.to_owned()));
            }
        }
        Ok(Configuration {
            clients: self.clients,
            session_store: self.session_store,
        })
    }
}
