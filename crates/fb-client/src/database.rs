//! Database descriptors.

use std::sync::Arc;

use crate::config::{ConnectionOptions, Settings};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::handle::Attachment;
use crate::library::ClientLibrary;
use crate::status;

/// Page sizes accepted by [`Database::create`].
pub const PAGE_SIZES: [u32; 5] = [1024, 2048, 4096, 8192, 16384];

/// Identifies a database file and carries the settings for everything
/// opened from it.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Database {
    library: Arc<dyn ClientLibrary>,
    file: String,
    settings: Settings,
}

impl Database {
    /// Describe `file` (a path or `host:path`) reached through `library`.
    pub fn new(library: Arc<dyn ClientLibrary>, file: impl Into<String>) -> Self {
        Self {
            library,
            file: file.into(),
            settings: Settings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// The database file specification.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Settings handed to connections opened from this descriptor.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The client library used to reach the database.
    #[must_use]
    pub fn library(&self) -> &Arc<dyn ClientLibrary> {
        &self.library
    }

    /// Open a connection.
    pub fn connect(
        &self,
        user: Option<&str>,
        password: Option<&str>,
        options: &ConnectionOptions,
    ) -> Result<Connection> {
        Connection::open(self, user, password, options)
    }

    /// Create a new database file and return its descriptor.
    ///
    /// `page_size` must be one of [`PAGE_SIZES`]. The attachment the server
    /// opens on creation is detached before returning.
    pub fn create(
        library: Arc<dyn ClientLibrary>,
        file: &str,
        user: &str,
        password: &str,
        page_size: u32,
        charset: Option<&str>,
    ) -> Result<Self> {
        if !PAGE_SIZES.contains(&page_size) {
            return Err(Error::usage(format!(
                "invalid page size {page_size}, expected one of {PAGE_SIZES:?}"
            )));
        }

        let mut sql = format!(
            "CREATE DATABASE '{}' USER '{}' PASSWORD '{}' PAGE_SIZE = {page_size}",
            quote(file),
            quote(user),
            quote(password),
        );
        if let Some(charset) = charset {
            sql.push_str(" DEFAULT CHARACTER SET ");
            sql.push_str(charset);
        }

        let database = Self::new(library, file);
        let handle = database
            .library
            .create_database(&sql, database.settings.dialect)
            .map_err(|s| Error::Database(status::raise(&s, "Error creating database.")))?;

        let mut attachment = Attachment::new(Arc::clone(&database.library), handle);
        attachment.release().map_err(|s| {
            Error::Connection(status::raise(&s, "Error closing database connection."))
        })?;

        tracing::info!(file, page_size, "database created");
        Ok(database)
    }

    /// Attach and drop the database file.
    pub fn drop_database(&self, user: Option<&str>, password: Option<&str>) -> Result<()> {
        let dpb = ConnectionOptions::new().to_dpb(user, password).encode()?;
        let handle = self
            .library
            .attach_database(&self.file, &dpb)
            .map_err(|s| Error::Connection(status::raise(&s, "Error opening database connection.")))?;

        let mut attachment = Attachment::new(Arc::clone(&self.library), handle);
        self.library
            .drop_database(handle)
            .map_err(|s| Error::Database(status::raise(&s, "Error dropping database.")))?;
        attachment.forget();

        tracing::info!(file = self.file.as_str(), "database dropped");
        Ok(())
    }
}

fn quote(text: &str) -> String {
    text.replace('\'', "''")
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("file", &self.file)
            .field("settings", &self.settings)
            .finish()
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::FakeLibrary;

    #[test]
    fn test_settings_flow_to_connections() {
        let library = Arc::new(FakeLibrary::default());
        let database = Database::new(library, "test.fdb").with_settings(Settings::new().dialect(1));
        let connection = database.connect(None, None, &ConnectionOptions::new()).unwrap();
        assert_eq!(connection.settings().dialect, 1);
        assert_eq!(connection.user(), None);
        assert_eq!(connection.database().file(), "test.fdb");
    }

    #[test]
    fn test_create_rejects_bad_page_size() {
        let library = Arc::new(FakeLibrary::default());
        let error = Database::create(library, "new.fdb", "SYSDBA", "pw", 3000, None).unwrap_err();
        assert!(error.is_usage());
    }

    #[test]
    fn test_create_unsupported_by_library() {
        let library = Arc::new(FakeLibrary::default());
        let error = Database::create(library, "new.fdb", "SYSDBA", "pw", 4096, None).unwrap_err();
        assert_eq!(error.sql_code(), Some(-902));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("O'Brien"), "O''Brien");
    }
}
