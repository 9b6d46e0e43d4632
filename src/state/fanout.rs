use std::collections::HashMap;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Handle used to push messages to a connected client.
///
/// The sender feeds the dedicated writer task of that client's socket, so
/// queueing a message here never waits on the network.
#[derive(Clone)]
pub struct ClientSender {
    tx: mpsc::UnboundedSender<Message>,
}

impl ClientSender {
    /// Wrap the outbound channel of one socket's writer task.
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    /// Serialize `event` and queue it on this client's socket.
    ///
    /// A closed writer (client already gone) is not an error worth surfacing;
    /// the reader side of that socket is about to tear the connection down.
    pub fn send<T>(&self, event: &T)
    where
        T: ?Sized + serde::Serialize + std::fmt::Debug,
    {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize outbound event `{event:?}`");
                return;
            }
        };

        let _ = self.tx.send(Message::Text(payload.into()));
    }
}

/// Per-room subscriber sets backing the broadcast fanout.
///
/// Groups hold one [`ClientSender`] per member; delivery to one member is
/// independent of every other member, so a stalled socket only backs up its
/// own writer queue.
#[derive(Default)]
pub struct RoomGroups {
    groups: DashMap<Uuid, HashMap<Uuid, ClientSender>>,
}

impl RoomGroups {
    /// Create an empty group set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user`'s sender to the room's group, creating the group if needed.
    pub fn subscribe(&self, room_id: Uuid, user_id: Uuid, sender: ClientSender) {
        self.groups
            .entry(room_id)
            .or_default()
            .insert(user_id, sender);
    }

    /// Remove `user` from the room's group, dropping the group when empty.
    pub fn unsubscribe(&self, room_id: Uuid, user_id: Uuid) {
        let emptied = match self.groups.get_mut(&room_id) {
            Some(mut members) => {
                members.remove(&user_id);
                members.is_empty()
            }
            None => false,
        };

        if emptied {
            self.groups.remove(&room_id);
        }
    }

    /// Remove the whole group for a closed room, returning it so the caller
    /// can deliver final events to the former members.
    pub fn remove_group(&self, room_id: Uuid) -> HashMap<Uuid, ClientSender> {
        self.groups
            .remove(&room_id)
            .map(|(_, members)| members)
            .unwrap_or_default()
    }

    /// Queue `event` on every member of the room's group.
    pub fn broadcast<T>(&self, room_id: Uuid, event: &T)
    where
        T: ?Sized + serde::Serialize + std::fmt::Debug,
    {
        let Some(members) = self.groups.get(&room_id) else {
            return;
        };

        for sender in members.values() {
            sender.send(event);
        }
    }

    /// Number of subscribed members for a room, zero when the room has none.
    pub fn member_count(&self, room_id: Uuid) -> usize {
        self.groups
            .get(&room_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Tick {
        seq: u32,
    }

    fn sender() -> (ClientSender, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientSender::new(tx), rx)
    }

    fn text(message: Message) -> String {
        match message {
            Message::Text(payload) => payload.to_string(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let groups = RoomGroups::new();
        let room = Uuid::new_v4();
        let (alice, mut alice_rx) = sender();
        let (bob, mut bob_rx) = sender();

        groups.subscribe(room, Uuid::new_v4(), alice);
        groups.subscribe(room, Uuid::new_v4(), bob);
        groups.broadcast(room, &Tick { seq: 7 });

        assert_eq!(text(alice_rx.recv().await.unwrap()), r#"{"seq":7}"#);
        assert_eq!(text(bob_rx.recv().await.unwrap()), r#"{"seq":7}"#);
    }

    #[tokio::test]
    async fn unsubscribed_member_receives_nothing() {
        let groups = RoomGroups::new();
        let room = Uuid::new_v4();
        let user = Uuid::new_v4();
        let (sender, mut rx) = sender();

        groups.subscribe(room, user, sender);
        groups.unsubscribe(room, user);
        groups.broadcast(room, &Tick { seq: 1 });

        assert!(rx.try_recv().is_err());
        assert_eq!(groups.member_count(room), 0);
    }

    #[tokio::test]
    async fn removed_group_still_allows_final_delivery() {
        let groups = RoomGroups::new();
        let room = Uuid::new_v4();
        let user = Uuid::new_v4();
        let (sender, mut rx) = sender();

        groups.subscribe(room, user, sender);
        let members = groups.remove_group(room);
        assert_eq!(members.len(), 1);

        for member in members.values() {
            member.send(&Tick { seq: 9 });
        }
        assert_eq!(text(rx.recv().await.unwrap()), r#"{"seq":9}"#);

        // The group itself is gone.
        groups.broadcast(room, &Tick { seq: 10 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_writer_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sender = ClientSender::new(tx);
        sender.send(&Tick { seq: 3 });
    }
}
