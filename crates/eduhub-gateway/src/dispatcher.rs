use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::debug;
use uuid::Uuid;

use eduhub_types::events::{GatewayEvent, Notification};

/// Manages all connected clients: board-wide events go out on a broadcast
/// channel, notifications go to one user's connection.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for board events; every connected client receives all of them
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// Per-user targeted send channels: user_id -> (conn_id, sender)
    user_channels: RwLock<HashMap<Uuid, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                user_channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Register a per-user targeted channel. A newer connection for the same
    /// user replaces the older one. Returns (conn_id, receiver).
    pub async fn register_user_channel(
        &self,
        user_id: Uuid,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.user_channels.write().await.insert(user_id, (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister a per-user targeted channel, but only if conn_id matches.
    pub async fn unregister_user_channel(&self, user_id: Uuid, conn_id: Uuid) {
        let mut channels = self.inner.user_channels.write().await;
        if let Some((stored_conn_id, _)) = channels.get(&user_id) {
            if *stored_conn_id == conn_id {
                channels.remove(&user_id);
            }
        }
    }

    /// Send a targeted event to a specific user. Returns false when the user
    /// has no live connection.
    pub async fn send_to_user(&self, user_id: Uuid, event: GatewayEvent) -> bool {
        let channels = self.inner.user_channels.read().await;
        match channels.get(&user_id) {
            Some((_, tx)) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Push a toast to one user. Users who are not connected simply miss it.
    pub async fn notify(&self, user_id: Uuid, notification: Notification) {
        if !self.send_to_user(user_id, GatewayEvent::Notification(notification)).await {
            debug!("No gateway connection for {}, notification dropped", user_id);
        }
    }

    pub async fn connected_users(&self) -> usize {
        self.inner.user_channels.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notification_reaches_only_its_user() {
        let dispatcher = Dispatcher::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (_, mut alice_rx) = dispatcher.register_user_channel(alice).await;
        let (_, mut bob_rx) = dispatcher.register_user_channel(bob).await;

        dispatcher.notify(alice, Notification::error("quiz generator offline")).await;

        match alice_rx.recv().await {
            Some(GatewayEvent::Notification(n)) => assert_eq!(n.message, "quiz generator offline"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_connection_cannot_unregister_newer_one() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();
        let (old_conn, _old_rx) = dispatcher.register_user_channel(user).await;
        let (_new_conn, mut new_rx) = dispatcher.register_user_channel(user).await;

        dispatcher.unregister_user_channel(user, old_conn).await;
        assert_eq!(dispatcher.connected_users().await, 1);

        let event = GatewayEvent::Notification(Notification::info("hi"));
        assert!(dispatcher.send_to_user(user, event).await);
        assert!(new_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let dispatcher = Dispatcher::new();
        let mut first = dispatcher.subscribe();
        let mut second = dispatcher.subscribe();

        dispatcher.broadcast(GatewayEvent::Notification(Notification::success("saved")));

        assert!(matches!(first.recv().await, Ok(GatewayEvent::Notification(_))));
        assert!(matches!(second.recv().await, Ok(GatewayEvent::Notification(_))));
    }

    #[tokio::test]
    async fn notify_without_connection_is_a_no_op() {
        let dispatcher = Dispatcher::new();
        dispatcher.notify(Uuid::new_v4(), Notification::info("nobody home")).await;
        assert_eq!(dispatcher.connected_users().await, 0);
    }
}
