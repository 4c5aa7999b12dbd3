//! Session directory backed by systemd-logind (`org.freedesktop.login1`).
//!
//! Users are enumerated with `Manager.ListUsers`; each user's exporter lives
//! in the directory named by its `RuntimePath` property (`/run/user/<uid>`).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::trace;
use zbus::{Connection, connection, proxy, zvariant::OwnedObjectPath};

use sessmux_core::{DirectoryError, Session, SessionDirectory};

#[proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait Manager {
    /// Returns `(uid, name, object path)` for every logged-in user.
    fn list_users(&self) -> zbus::Result<Vec<(u32, String, OwnedObjectPath)>>;
}

#[proxy(
    interface = "org.freedesktop.login1.User",
    default_service = "org.freedesktop.login1"
)]
trait User {
    #[zbus(property)]
    fn runtime_path(&self) -> zbus::Result<String>;
}

/// Bus the directory talks to.
#[derive(Debug, Clone)]
enum Bus {
    System,
    Address(String),
}

/// logind client.
///
/// The bus connection is opened on first use and retried on the next request
/// while it cannot be established, so an unreachable bus fails single scrapes
/// rather than startup.
pub struct Login1Directory {
    bus: Bus,
    conn: OnceCell<Connection>,
}

impl Login1Directory {
    /// Directory on the system bus.
    pub fn system() -> Self {
        Self {
            bus: Bus::System,
            conn: OnceCell::new(),
        }
    }

    /// Directory on the bus at a D-Bus address such as `unix:path=/run/dbus/system_bus_socket`.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            bus: Bus::Address(address.into()),
            conn: OnceCell::new(),
        }
    }

    /// Directory on an already established connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            bus: Bus::System,
            conn: OnceCell::new_with(Some(conn)),
        }
    }

    async fn connection(&self) -> zbus::Result<&Connection> {
        self.conn
            .get_or_try_init(|| async {
                trace!(bus = ?self.bus, "connecting to logind");
                match &self.bus {
                    Bus::System => Connection::system().await,
                    Bus::Address(address) => {
                        connection::Builder::address(address.as_str())?.build().await
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl SessionDirectory for Login1Directory {
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError> {
        let unavailable = |e: zbus::Error| DirectoryError::Unavailable(e.to_string());

        let conn = self.connection().await.map_err(unavailable)?;
        let manager = ManagerProxy::new(conn).await.map_err(unavailable)?;
        let users = manager
            .list_users()
            .await
            .map_err(unavailable)?;

        trace!(users = users.len(), "logind users listed");
        Ok(users
            .into_iter()
            .map(|(_, name, path)| Session::new(name, path.as_str()))
            .collect())
    }

    async fn runtime_path(&self, session: &Session) -> Result<PathBuf, DirectoryError> {
        let resolve = |e: zbus::Error| DirectoryError::Resolve {
            identity: session.identity.clone(),
            reason: e.to_string(),
        };

        let conn = self.connection().await.map_err(resolve)?;
        let user = UserProxy::builder(conn)
            .path(session.handle.as_str())
            .map_err(resolve)?
            .build()
            .await
            .map_err(resolve)?;
        let path = user.runtime_path().await.map_err(resolve)?;

        Ok(PathBuf::from(path))
    }
}
