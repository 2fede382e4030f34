//! SQL Server connection management over TDS

use crate::client;
use crate::config::ConnectionSettings;
use crate::db::driver::{Connection, Cursor, Driver};
use crate::db::query::{TdsClient, TdsCursor};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::TokioAsyncWriteCompatExt;

/// Driver backed by the `tiberius` TDS client.
///
/// tiberius speaks TDS itself and loads no native library. The client
/// directory check is therefore only a deployment-order check, off unless
/// asked for with [`TdsDriver::requiring_client`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TdsDriver {
    require_client: bool,
}

impl TdsDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to connect until [`client::init_client`] has run.
    pub fn requiring_client() -> Self {
        Self {
            require_client: true,
        }
    }

    fn config(settings: &ConnectionSettings) -> Config {
        let mut config = Config::new();

        config.host(&settings.hostname);
        config.port(settings.port);
        config.database(&settings.sid);
        config.authentication(AuthMethod::sql_server(&settings.username, &settings.password));

        if settings.trust_cert {
            config.trust_cert();
        }

        if !settings.encrypt {
            config.encryption(EncryptionLevel::NotSupported);
        }

        config
    }
}

#[async_trait]
impl Driver for TdsDriver {
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn Connection>> {
        if self.require_client {
            client::require_client()?;
        }
        if let Some(dir) = client::client_dir() {
            tracing::debug!(client_dir = %dir.display(), "native client registered");
        }

        let config = Self::config(settings);

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(Error::driver)?;
        tcp.set_nodelay(true).map_err(Error::driver)?;

        let client = Client::connect(config, tcp.compat_write()).await?;

        tracing::info!(
            host = %settings.hostname,
            port = settings.port,
            sid = %settings.sid,
            user = %settings.username,
            "connected"
        );

        Ok(Box::new(TdsConnection {
            client: Arc::new(Mutex::new(Some(client))),
        }))
    }
}

/// Open TDS connection. Cursors share the client through the mutex.
pub struct TdsConnection {
    client: Arc<Mutex<Option<TdsClient>>>,
}

#[async_trait]
impl Connection for TdsConnection {
    async fn cursor(&mut self) -> Result<Box<dyn Cursor>> {
        if self.client.lock().await.is_none() {
            return Err(Error::SessionClosed);
        }
        Ok(Box::new(TdsCursor::new(Arc::clone(&self.client))))
    }

    async fn close(&mut self) -> Result<()> {
        let client = self.client.lock().await.take();
        match client {
            Some(client) => {
                client.close().await?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}
