/*
[INPUT]:  Client handles installed by the connection manager
[OUTPUT]: Shared cell the sync and write layers pull live handles from
[POS]:    Session layer - holds the active read/write client pair
[UPDATE]: When new client capabilities join the session
*/

use std::sync::Arc;

use tokio::sync::Mutex;

use taskchain_adapter::{ReadClient, WriteClient};

#[derive(Default, Clone)]
struct Clients {
    read: Option<Arc<dyn ReadClient>>,
    write: Option<Arc<dyn WriteClient>>,
}

/// Shared holder for the active client handles.
///
/// Presence of a read client gates reads; presence of a write client (set
/// only while a signer is held) gates writes. Disconnect clears both, which
/// is what turns subsequent reads into no-ops.
#[derive(Default, Clone)]
pub struct ClientCell {
    inner: Arc<Mutex<Clients>>,
}

impl ClientCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_read(&self, read: Option<Arc<dyn ReadClient>>) {
        self.inner.lock().await.read = read;
    }

    pub async fn set_write(&self, write: Option<Arc<dyn WriteClient>>) {
        self.inner.lock().await.write = write;
    }

    pub async fn read(&self) -> Option<Arc<dyn ReadClient>> {
        self.inner.lock().await.read.clone()
    }

    pub async fn write(&self) -> Option<Arc<dyn WriteClient>> {
        self.inner.lock().await.write.clone()
    }

    pub async fn clear(&self) {
        let mut clients = self.inner.lock().await;
        clients.read = None;
        clients.write = None;
    }
}
