//! WebSocket endpoints fed by the store's change channel.
//!
//! Each socket owns one broadcast receiver, subscribed before its first
//! snapshot is read, and drops it when the socket closes. Outgoing frames are
//! JSON tagged by `type`:
//!
//! - `/realtime/matches`: `{"type":"matches","matches":[…]}` on open and on
//!   every reload the configured [`ReloadPolicy`] asks for.
//! - `/realtime/matches/{id}`: one `snapshot` frame, then a `message` frame per
//!   new message. Text frames `{"content":"…"}` from the client are sent as
//!   chat messages; one that cannot be stored is answered with
//!   `{"type":"error","error":"…"}` so the client can keep its text.

use std::collections::HashSet;

use axum::{
  extract::{
    Path, State,
    ws::{Message as Frame, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use futures_util::{
  sink::SinkExt,
  stream::{SplitSink, StreamExt},
};
use jobswipe_core::{
  chat::{self, ChatLog},
  inbox::{self, MatchSummary, ReloadPolicy},
  matching::Message,
  realtime::ChangeEvent,
  store::SwipeStore,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{
  broadcast::{self, error::RecvError},
  mpsc,
};
use uuid::Uuid;

use crate::{AppState, Backend, auth::Viewer, error::Error};

type Sender = SplitSink<WebSocket, Frame>;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Outgoing {
  Matches { matches: Vec<MatchSummary> },
  Snapshot { messages: Vec<Message> },
  Message { message: Message },
  /// A client frame that was not stored.
  Error { error: String },
}

#[derive(Debug, Deserialize)]
struct Incoming {
  content: String,
}

/// Serialise and send one frame. `false` once the client is gone.
async fn send_json(sender: &mut Sender, frame: &Outgoing) -> bool {
  let text = match serde_json::to_string(frame) {
    Ok(text) => text,
    Err(e) => {
      tracing::error!(error = %e, "failed to encode realtime frame");
      return false;
    }
  };
  sender.send(Frame::Text(text.into())).await.is_ok()
}

// ─── Match list ───────────────────────────────────────────────────────────────

/// `GET /realtime/matches` (WebSocket)
pub async fn inbox<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  ws: WebSocketUpgrade,
) -> Response {
  let policy = state.config.reload_policy;
  ws.on_upgrade(move |socket| inbox_socket(socket, state, viewer.user_id, policy))
}

fn match_ids(matches: &[MatchSummary]) -> HashSet<Uuid> {
  matches.iter().map(|m| m.record.match_id).collect()
}

/// Wait for an event that makes the list built from `known` stale, then
/// rebuild it. A lagged receiver always rebuilds. `None` once the change
/// channel is closed.
async fn next_inbox_reload<S: SwipeStore>(
  rx: &mut broadcast::Receiver<ChangeEvent>,
  store: &S,
  viewer: Uuid,
  policy: ReloadPolicy,
  known: &HashSet<Uuid>,
) -> Option<Vec<MatchSummary>> {
  loop {
    match rx.recv().await {
      Ok(event) if policy.needs_reload(&event, viewer, known) => break,
      Ok(_) => {}
      Err(RecvError::Lagged(skipped)) => {
        tracing::debug!(%viewer, skipped, "inbox subscriber lagged; reloading");
        break;
      }
      Err(RecvError::Closed) => return None,
    }
  }
  Some(inbox::list_matches(store, viewer).await)
}

async fn inbox_socket<S: Backend>(
  socket: WebSocket,
  state: AppState<S>,
  viewer: Uuid,
  policy: ReloadPolicy,
) {
  let (mut sender, mut receiver) = socket.split();
  let mut rx = state.store.subscribe();
  let store = state.store.clone();
  tracing::debug!(%viewer, "inbox socket opened");

  let mut push = tokio::spawn(async move {
    let mut matches = inbox::list_matches(&*store, viewer).await;
    loop {
      let known = match_ids(&matches);
      if !send_json(&mut sender, &Outgoing::Matches { matches }).await {
        break;
      }
      match next_inbox_reload(&mut rx, &*store, viewer, policy, &known).await {
        Some(list) => matches = list,
        None => break,
      }
    }
  });

  // The client has nothing to say on this channel; wait for it to leave.
  loop {
    tokio::select! {
      frame = receiver.next() => match frame {
        Some(Ok(Frame::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
      _ = &mut push => break,
    }
  }
  push.abort();
  tracing::debug!(%viewer, "inbox socket closed");
}

// ─── Chat ─────────────────────────────────────────────────────────────────────

/// `GET /realtime/matches/{id}` (WebSocket). Participants only.
pub async fn chat<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Path(match_id): Path<Uuid>,
  ws: WebSocketUpgrade,
) -> Result<Response, Error> {
  chat::participant_match(&*state.store, match_id, viewer.user_id).await?;
  Ok(ws.on_upgrade(move |socket| chat_socket(socket, state, match_id, viewer.user_id)))
}

/// Fetch the stored messages into `log`. Failures keep what the log has.
async fn refresh_log<S: SwipeStore>(store: &S, log: &mut ChatLog) {
  match chat::load_messages(store, log.match_id()).await {
    Ok(snapshot) => log.load(snapshot),
    Err(e) => {
      tracing::warn!(match_id = %log.match_id(), error = %e, "failed to load messages");
    }
  }
}

fn snapshot(log: &ChatLog) -> Outgoing {
  Outgoing::Snapshot { messages: log.messages().to_vec() }
}

/// Wait for the next frame to push to a chat client: a message new to `log`,
/// or a fresh snapshot after the receiver lagged. `None` once the change
/// channel is closed.
async fn next_chat_frame<S: SwipeStore>(
  rx: &mut broadcast::Receiver<ChangeEvent>,
  store: &S,
  log: &mut ChatLog,
) -> Option<Outgoing> {
  loop {
    match rx.recv().await {
      Ok(event) => {
        if let Some(message) = log.apply(&event) {
          return Some(Outgoing::Message { message: message.clone() });
        }
      }
      Err(RecvError::Lagged(skipped)) => {
        tracing::debug!(match_id = %log.match_id(), skipped, "chat subscriber lagged; resending snapshot");
        refresh_log(store, log).await;
        return Some(snapshot(log));
      }
      Err(RecvError::Closed) => return None,
    }
  }
}

/// Send one client text frame as a chat message. The stored message comes
/// back through the change channel; a failure yields the error frame to
/// answer with.
async fn chat_reply<S: SwipeStore>(
  store: &S,
  match_id: Uuid,
  viewer: Uuid,
  text: &str,
) -> Option<Outgoing> {
  let incoming = match serde_json::from_str::<Incoming>(text) {
    Ok(incoming) => incoming,
    Err(e) => {
      tracing::debug!(%match_id, error = %e, "malformed chat frame");
      return Some(Outgoing::Error { error: format!("malformed chat frame: {e}") });
    }
  };
  match chat::send_message(store, match_id, viewer, &incoming.content).await {
    Ok(_) => None,
    Err(e) => {
      tracing::warn!(%match_id, %viewer, error = %e, "chat frame not sent");
      Some(Outgoing::Error { error: e.to_string() })
    }
  }
}

async fn chat_socket<S: Backend>(socket: WebSocket, state: AppState<S>, match_id: Uuid, viewer: Uuid) {
  let (mut sender, mut receiver) = socket.split();
  // Subscribe first so a message written during the snapshot read is not lost.
  let mut rx = state.store.subscribe();
  let store = state.store.clone();
  let (reply_tx, mut replies) = mpsc::channel::<Outgoing>(16);
  tracing::debug!(%match_id, %viewer, "chat socket opened");

  let mut push = tokio::spawn(async move {
    let mut log = ChatLog::new(match_id);
    refresh_log(&*store, &mut log).await;
    if !send_json(&mut sender, &snapshot(&log)).await {
      return;
    }

    loop {
      let frame = tokio::select! {
        frame = next_chat_frame(&mut rx, &*store, &mut log) => match frame {
          Some(frame) => frame,
          None => break,
        },
        Some(reply) = replies.recv() => reply,
      };
      if !send_json(&mut sender, &frame).await {
        break;
      }
    }
  });

  loop {
    tokio::select! {
      frame = receiver.next() => match frame {
        Some(Ok(Frame::Text(text))) => {
          if let Some(reply) = chat_reply(&*state.store, match_id, viewer, text.as_str()).await
            && reply_tx.send(reply).await.is_err()
          {
            break;
          }
        }
        Some(Ok(Frame::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
      _ = &mut push => break,
    }
  }
  push.abort();
  tracing::debug!(%match_id, %viewer, "chat socket closed");
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use jobswipe_core::{
    account::NewAccount,
    matching::{Match, NewMatch},
    store::AccountStore as _,
  };
  use jobswipe_store_sqlite::SqliteStore;

  use super::*;

  async fn account(store: &SqliteStore, email: &str) -> Uuid {
    store
      .create_account(NewAccount {
        email:         email.to_string(),
        password_hash: "x".to_string(),
        full_name:     None,
      })
      .await
      .unwrap()
      .unwrap()
      .user_id
  }

  /// A recruiter, a job seeker and a match between them.
  async fn matched(store: &SqliteStore) -> Match {
    let recruiter_id = account(store, "r@acme.test").await;
    let job_seeker_id = account(store, "s@x.test").await;
    store.create_match(NewMatch { recruiter_id, job_seeker_id }).await.unwrap()
  }

  async fn within<F: std::future::Future>(f: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), f).await.unwrap()
  }

  #[tokio::test]
  async fn message_event_reloads_inbox_with_unread_count() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut rx = store.subscribe();
    let m = matched(&store).await;
    let known = HashSet::new();

    chat::send_message(&store, m.match_id, m.job_seeker_id, "hello").await.unwrap();

    let list = within(next_inbox_reload(&mut rx, &store, m.recruiter_id, ReloadPolicy::AnyMessage, &known))
      .await
      .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].record.match_id, m.match_id);
    assert_eq!(list[0].counterpart_email, "s@x.test");
    assert_eq!(list[0].unread_count, 1);
  }

  #[tokio::test]
  async fn own_matches_policy_skips_foreign_matches() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let viewer = account(&store, "me@x.test").await;
    let mut rx = store.subscribe();

    // Someone else's match first, then one for the viewer.
    matched(&store).await;
    let other = account(&store, "other@acme.test").await;
    let mine = store
      .create_match(NewMatch { recruiter_id: other, job_seeker_id: viewer })
      .await
      .unwrap();

    let list = within(next_inbox_reload(&mut rx, &store, viewer, ReloadPolicy::OwnMatches, &HashSet::new()))
      .await
      .unwrap();
    assert_eq!(match_ids(&list), HashSet::from([mine.match_id]));
    // The foreign match event was consumed without a reload.
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn chat_pushes_only_new_messages_after_snapshot() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut rx = store.subscribe();
    let m = matched(&store).await;

    let first = chat::send_message(&store, m.match_id, m.job_seeker_id, "first").await.unwrap();
    let mut log = ChatLog::new(m.match_id);
    refresh_log(&store, &mut log).await;
    let Outgoing::Snapshot { messages } = snapshot(&log) else {
      panic!("expected a snapshot");
    };
    assert_eq!(messages, vec![first]);

    // The read receipt is an update, not a new message.
    inbox::mark_read(&store, m.match_id, m.recruiter_id).await.unwrap();
    let second = chat::send_message(&store, m.match_id, m.recruiter_id, "second").await.unwrap();

    let frame = within(next_chat_frame(&mut rx, &store, &mut log)).await;
    let Some(Outgoing::Message { message }) = frame else {
      panic!("expected a message frame, got {frame:?}");
    };
    assert_eq!(message, second);
    assert_eq!(log.messages().len(), 2);
  }

  #[tokio::test]
  async fn rejected_chat_text_gets_an_error_frame() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let m = matched(&store).await;
    let outsider = account(&store, "o@x.test").await;

    let blank = chat_reply(&store, m.match_id, m.job_seeker_id, r#"{"content":"   "}"#).await;
    let Some(Outgoing::Error { error }) = blank else {
      panic!("expected an error frame, got {blank:?}");
    };
    assert_eq!(error, "message content is empty");

    let foreign = chat_reply(&store, m.match_id, outsider, r#"{"content":"hi"}"#).await;
    assert!(matches!(foreign, Some(Outgoing::Error { .. })));
    let garbled = chat_reply(&store, m.match_id, m.job_seeker_id, "not json").await;
    assert!(matches!(garbled, Some(Outgoing::Error { .. })));
    assert!(store.list_messages(m.match_id).await.unwrap().is_empty());

    let sent = chat_reply(&store, m.match_id, m.job_seeker_id, r#"{"content":"hi"}"#).await;
    assert!(sent.is_none());
    assert_eq!(store.list_messages(m.match_id).await.unwrap().len(), 1);
  }

  #[test]
  fn error_frame_is_tagged() {
    let frame = Outgoing::Error { error: "message content is empty".into() };
    assert_eq!(
      serde_json::to_value(&frame).unwrap(),
      serde_json::json!({ "type": "error", "error": "message content is empty" })
    );
  }
}
