//! Service manager sessions.
//!
//! The service manager runs administrative tasks (backup, restore,
//! statistics, user maintenance) on the server. This module attaches to it,
//! starts a task from a caller-built request buffer and collects the task's
//! text output.

use std::sync::Arc;

use fb_protocol::service::{OUTPUT_REQUEST, QueryResponse};
use fb_protocol::Spb;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::handle::Owned;
use crate::library::{ClientLibrary, SvcHandle};
use crate::status;

/// Name of the service manager endpoint.
pub const SERVICE_MANAGER: &str = "service_mgr";

/// An attachment to a server's service manager.
pub struct ServiceManager {
    handle: Owned<SvcHandle>,
    service: String,
    settings: Settings,
}

impl ServiceManager {
    /// Attach to the service manager on `host`, or locally when `host` is
    /// `None`.
    pub fn connect(
        library: Arc<dyn ClientLibrary>,
        host: Option<&str>,
        user: &str,
        password: &str,
    ) -> Result<Self> {
        Self::connect_with(library, host, user, password, Settings::default())
    }

    /// Attach with explicit settings (poll interval, buffer size).
    pub fn connect_with(
        library: Arc<dyn ClientLibrary>,
        host: Option<&str>,
        user: &str,
        password: &str,
        settings: Settings,
    ) -> Result<Self> {
        let service = match host {
            Some(host) => format!("{host}:{SERVICE_MANAGER}"),
            None => SERVICE_MANAGER.to_owned(),
        };
        let spb = Spb::new().with_user(user).with_password(password).encode()?;

        let handle = library
            .service_attach(&service, &spb)
            .map_err(|s| Error::Connection(status::raise(&s, "Error attaching to service manager.")))?;

        tracing::info!(service = service.as_str(), %handle, "service manager attached");
        Ok(Self {
            handle: Owned::new(library, handle),
            service,
            settings,
        })
    }

    /// The service name attached to.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Whether the session is still attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.handle.is_null()
    }

    fn live_handle(&self) -> Result<SvcHandle> {
        if self.handle.is_null() {
            return Err(Error::usage("service manager is disconnected"));
        }
        Ok(self.handle.get())
    }

    /// Start a task described by `request`.
    pub fn start(&self, request: &[u8]) -> Result<()> {
        let handle = self.live_handle()?;
        self.handle
            .library()
            .service_start(handle, request)
            .map_err(|s| Error::Database(status::raise(&s, "Error starting service operation.")))?;
        tracing::debug!(%handle, len = request.len(), "service task started");
        Ok(())
    }

    /// Collect the running task's output until the server reports no more.
    ///
    /// Polls while the server reports the output as truncated or not ready,
    /// sleeping [`Settings::service_poll_interval`] between polls. The
    /// response buffer starts at [`Settings::service_buffer_size`] and doubles
    /// on every truncated response.
    pub fn query_output(&self) -> Result<String> {
        let handle = self.live_handle()?;
        let library = self.handle.library();

        let mut buffer_len = self.settings.service_buffer_size;
        let mut output = Vec::new();
        loop {
            let raw = library
                .service_query(handle, &OUTPUT_REQUEST, buffer_len)
                .map_err(|s| Error::Database(status::raise(&s, "Error querying service status.")))?;
            let response = QueryResponse::parse(&raw)?;
            output.extend_from_slice(&response.output);

            if !response.needs_retry() {
                break;
            }
            if response.truncated {
                buffer_len = buffer_len.saturating_mul(2);
            }
            tracing::trace!(%handle, buffer_len, "service output pending");
            std::thread::sleep(self.settings.service_poll_interval);
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Detach. Returns `Ok(false)` when already disconnected.
    pub fn disconnect(&mut self) -> Result<bool> {
        if self.handle.is_null() {
            return Ok(false);
        }
        let handle = self.handle.get();
        self.handle.release().map_err(|s| {
            Error::Connection(status::raise(&s, "Error detaching from service manager."))
        })?;
        tracing::info!(service = self.service.as_str(), %handle, "service manager detached");
        Ok(true)
    }
}

impl std::fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManager")
            .field("service", &self.service)
            .field("handle", &self.handle.get())
            .finish()
    }
}
