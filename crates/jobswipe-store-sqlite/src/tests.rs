//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use jobswipe_core::{
  Error as CoreError,
  account::NewAccount,
  chat::{self, ChatLog},
  feed::{FeedEntry, load_feed},
  inbox::{self, UNKNOWN_USER},
  matching::{Message, NewMatch},
  profile::{ProfileDraft, Role, save_profile},
  realtime::{Op, Table},
  role::{claim_pending_role, resolve_role},
  store::{AccountStore, SwipeStore},
  swipe::{self, MatchPolicy, Notice, PLACEHOLDER_RECRUITER_EMAIL},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Create an account with `role` and the given skills; returns its id.
async fn user(s: &SqliteStore, email: &str, role: Role, skills: &[&str]) -> Uuid {
  let account = s
    .create_account(NewAccount {
      email:         email.into(),
      password_hash: "x".into(),
      full_name:     Some(email.split('@').next().unwrap_or(email).into()),
    })
    .await
    .unwrap()
    .expect("fresh email");
  assert!(s.insert_role(account.user_id, role).await.unwrap());

  let mut draft = s.get_profile(account.user_id).await.unwrap().unwrap().draft();
  draft.skills = skills.iter().map(|s| s.to_string()).collect();
  if role == Role::Recruiter {
    draft.job_title = Some("Backend Engineer".into());
    draft.company = Some("Acme".into());
  }
  s.update_profile(account.user_id, draft).await.unwrap().unwrap();
  account.user_id
}

async fn pair(s: &SqliteStore) -> (Uuid, Uuid, Uuid) {
  let recruiter = user(s, "rita@acme.test", Role::Recruiter, &["rust"]).await;
  let seeker = user(s, "sam@example.test", Role::JobSeeker, &["rust"]).await;
  let m = s
    .create_match(NewMatch { recruiter_id: recruiter, job_seeker_id: seeker })
    .await
    .unwrap();
  (recruiter, seeker, m.match_id)
}

// ─── Accounts & sessions ─────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  user(&s, "a@b.test", Role::JobSeeker, &[]).await;

  let again = s
    .create_account(NewAccount {
      email:         "a@b.test".into(),
      password_hash: "y".into(),
      full_name:     None,
    })
    .await
    .unwrap();
  assert!(again.is_none());
}

#[tokio::test]
async fn account_creates_profile_row() {
  let s = store().await;
  let id = user(&s, "new@b.test", Role::JobSeeker, &[]).await;

  let profile = s.get_profile(id).await.unwrap().unwrap();
  assert_eq!(profile.email.as_deref(), Some("new@b.test"));
  assert_eq!(profile.full_name.as_deref(), Some("new"));
  assert!(profile.skills.is_empty());

  let found = s.find_account("new@b.test".into()).await.unwrap().unwrap();
  assert_eq!(found.user_id, id);
}

#[tokio::test]
async fn session_lifecycle() {
  let s = store().await;
  let id = user(&s, "a@b.test", Role::JobSeeker, &[]).await;

  s.create_session(id, "hash-1".into()).await.unwrap();
  let session = s.get_session("hash-1".into()).await.unwrap().unwrap();
  assert_eq!(session.user_id, id);

  assert!(s.delete_session("hash-1".into()).await.unwrap());
  assert!(s.get_session("hash-1".into()).await.unwrap().is_none());
  assert!(!s.delete_session("hash-1".into()).await.unwrap());
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_role_insert_is_ignored() {
  let s = store().await;
  let id = user(&s, "a@b.test", Role::JobSeeker, &[]).await;

  assert!(!s.insert_role(id, Role::Recruiter).await.unwrap());
  assert_eq!(s.get_role(id).await.unwrap(), Some(Role::JobSeeker));

  let resolved = resolve_role(&s, id, Some(Role::Recruiter)).await.unwrap();
  assert_eq!(resolved, Some(Role::JobSeeker));
}

#[tokio::test]
async fn pending_role_token_is_single_use() {
  let s = store().await;
  let account = s
    .create_account(NewAccount {
      email:         "late@b.test".into(),
      password_hash: "x".into(),
      full_name:     None,
    })
    .await
    .unwrap()
    .unwrap();

  s.put_pending_role("tok".into(), Role::Recruiter).await.unwrap();
  let role = claim_pending_role(&s, account.user_id, "tok".into()).await.unwrap();
  assert_eq!(role, Some(Role::Recruiter));

  assert!(s.take_pending_role("tok".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn no_role_and_no_pending_stays_unset() {
  let s = store().await;
  let account = s
    .create_account(NewAccount {
      email:         "none@b.test".into(),
      password_hash: "x".into(),
      full_name:     None,
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(resolve_role(&s, account.user_id, None).await.unwrap(), None);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_and_reload_profile() {
  let s = store().await;
  let id = user(&s, "a@b.test", Role::JobSeeker, &[]).await;

  let mut draft = ProfileDraft::default();
  draft.full_name = Some("Ada".into());
  draft.bio = Some("Writes compilers".into());
  assert!(draft.add_skill("Rust"));
  assert!(draft.add_skill("SQL"));
  let saved = save_profile(&s, id, draft).await.unwrap();

  let reloaded = s.get_profile(id).await.unwrap().unwrap();
  assert_eq!(reloaded, saved);
  assert_eq!(reloaded.skills, vec!["Rust".to_string(), "SQL".to_string()]);
  // Email is not part of the editable draft.
  assert_eq!(reloaded.email.as_deref(), Some("a@b.test"));
}

#[tokio::test]
async fn save_unknown_profile_fails() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = save_profile(&s, missing, ProfileDraft::default()).await.unwrap_err();
  assert!(matches!(err, CoreError::ProfileNotFound(id) if id == missing));
}

// ─── Feed & swiping ──────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_keeps_only_overlapping_counterparts() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["rust", "sql"]).await;
  let rustacean = user(&s, "s1@x.test", Role::JobSeeker, &["rust"]).await;
  user(&s, "s2@x.test", Role::JobSeeker, &["go"]).await;
  user(&s, "s3@x.test", Role::JobSeeker, &[]).await;
  user(&s, "r2@acme.test", Role::Recruiter, &["rust"]).await;

  let feed = load_feed(&s, recruiter, Role::Recruiter).await;
  let ids: Vec<Uuid> = feed.entries().iter().map(FeedEntry::identity).collect();
  assert_eq!(ids, vec![rustacean]);
}

#[tokio::test]
async fn accept_on_empty_feed_writes_nothing() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["cobol"]).await;
  user(&s, "s@x.test", Role::JobSeeker, &["rust"]).await;

  let mut feed = load_feed(&s, recruiter, Role::Recruiter).await;
  assert!(feed.is_empty());

  let notice = swipe::accept(&s, &mut feed, MatchPolicy::default()).await;
  assert!(notice.is_none());
  assert!(s.list_matches(recruiter).await.unwrap().is_empty());
}

#[tokio::test]
async fn seeker_accept_creates_match_in_the_right_slots() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["rust"]).await;
  let seeker = user(&s, "s@x.test", Role::JobSeeker, &["rust"]).await;

  let mut feed = load_feed(&s, seeker, Role::JobSeeker).await;
  let notice = swipe::accept(&s, &mut feed, MatchPolicy::default()).await.unwrap();

  let Notice::Matched(m) = notice else { panic!("expected a match, got {notice:?}") };
  assert_eq!(m.company.as_deref(), Some("Acme"));
  assert_eq!(m.title.as_deref(), Some("Backend Engineer"));
  assert_eq!(m.contact_email.as_deref(), Some(PLACEHOLDER_RECRUITER_EMAIL));

  let stored = s.get_match(m.match_id).await.unwrap().unwrap();
  assert_eq!(stored.recruiter_id, recruiter);
  assert_eq!(stored.job_seeker_id, seeker);
}

#[tokio::test]
async fn repeated_accepts_duplicate_unless_unique_pair() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["rust"]).await;
  user(&s, "s@x.test", Role::JobSeeker, &["rust"]).await;

  // Single-entry feed: the cursor wraps back to the same candidate.
  let mut feed = load_feed(&s, recruiter, Role::Recruiter).await;
  swipe::accept(&s, &mut feed, MatchPolicy::default()).await.unwrap();
  swipe::accept(&s, &mut feed, MatchPolicy::default()).await.unwrap();
  assert_eq!(s.list_matches(recruiter).await.unwrap().len(), 2);

  let unique = MatchPolicy { enforce_unique_pair: true, ..MatchPolicy::default() };
  swipe::accept(&s, &mut feed, unique).await.unwrap();
  assert_eq!(s.list_matches(recruiter).await.unwrap().len(), 2);
}

#[tokio::test]
async fn mutual_accept_waits_for_the_other_side() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["rust"]).await;
  let seeker = user(&s, "s@x.test", Role::JobSeeker, &["rust"]).await;
  let policy = MatchPolicy { require_mutual_accept: true, ..MatchPolicy::default() };

  let mut recruiter_feed = load_feed(&s, recruiter, Role::Recruiter).await;
  let first = swipe::accept(&s, &mut recruiter_feed, policy).await.unwrap();
  assert_eq!(first, Notice::Liked { target_id: seeker });
  assert!(s.list_matches(recruiter).await.unwrap().is_empty());

  let mut seeker_feed = load_feed(&s, seeker, Role::JobSeeker).await;
  let second = swipe::accept(&s, &mut seeker_feed, policy).await.unwrap();
  assert!(matches!(second, Notice::Matched(_)));
  assert_eq!(s.list_matches(recruiter).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reject_never_writes() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["rust"]).await;
  user(&s, "s@x.test", Role::JobSeeker, &["rust"]).await;

  let mut feed = load_feed(&s, recruiter, Role::Recruiter).await;
  let notice = swipe::reject(&mut feed).unwrap();
  assert_eq!(notice, Notice::Passed { description: "Candidate skipped".into() });
  assert!(s.list_matches(recruiter).await.unwrap().is_empty());
}

// ─── Chat ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn whitespace_message_is_not_stored() {
  let s = store().await;
  let (recruiter, _, match_id) = pair(&s).await;

  let err = chat::send_message(&s, match_id, recruiter, "   ").await.unwrap_err();
  assert!(matches!(err, CoreError::EmptyMessage));
  assert!(s.list_messages(match_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn outsider_cannot_send() {
  let s = store().await;
  let (_, _, match_id) = pair(&s).await;
  let outsider = user(&s, "o@x.test", Role::JobSeeker, &[]).await;

  let err = chat::send_message(&s, match_id, outsider, "hello").await.unwrap_err();
  assert!(matches!(err, CoreError::NotParticipant { .. }));

  let err = chat::send_message(&s, Uuid::new_v4(), outsider, "hello").await.unwrap_err();
  assert!(matches!(err, CoreError::MatchNotFound(_)));
}

#[tokio::test]
async fn sent_message_is_trimmed() {
  let s = store().await;
  let (_, seeker, match_id) = pair(&s).await;

  let sent = chat::send_message(&s, match_id, seeker, "  hi there \n").await.unwrap();
  assert_eq!(sent.content, "hi there");
  assert!(!sent.read);
  assert_eq!(s.list_messages(match_id).await.unwrap(), vec![sent]);
}

#[tokio::test]
async fn messages_load_oldest_first() {
  let s = store().await;
  let (recruiter, seeker, match_id) = pair(&s).await;
  let base = Utc::now();

  let mk = |sender_id, content: &str, offset: i64| Message {
    message_id: Uuid::new_v4(),
    match_id,
    sender_id,
    content: content.into(),
    created_at: base + Duration::seconds(offset),
    read: false,
  };

  // Inserted out of order on purpose.
  s.insert_message_row(&mk(seeker, "second", 1)).await.unwrap();
  s.insert_message_row(&mk(recruiter, "first", 0)).await.unwrap();
  s.insert_message_row(&mk(recruiter, "third", 2)).await.unwrap();

  let contents: Vec<String> = chat::load_messages(&s, match_id)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.content)
    .collect();
  assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn chat_log_dedupes_subscription_and_snapshot() {
  let s = store().await;
  let (recruiter, _, match_id) = pair(&s).await;

  let mut rx = s.subscribe();
  let mut log = ChatLog::new(match_id);
  chat::send_message(&s, match_id, recruiter, "hello").await.unwrap();

  let event = rx.recv().await.unwrap();
  assert!(log.apply(&event).is_some());
  log.load(chat::load_messages(&s, match_id).await.unwrap());
  assert_eq!(log.messages().len(), 1);
}

// ─── Inbox ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unread_counts_exclude_own_messages() {
  let s = store().await;
  let (recruiter, seeker, match_id) = pair(&s).await;

  chat::send_message(&s, match_id, seeker, "one").await.unwrap();
  chat::send_message(&s, match_id, seeker, "two").await.unwrap();
  chat::send_message(&s, match_id, recruiter, "reply").await.unwrap();

  let for_recruiter = inbox::list_matches(&s, recruiter).await;
  assert_eq!(for_recruiter.len(), 1);
  assert_eq!(for_recruiter[0].unread_count, 2);
  assert_eq!(for_recruiter[0].counterpart_id, seeker);
  assert_eq!(for_recruiter[0].counterpart_email, "sam@example.test");

  let for_seeker = inbox::list_matches(&s, seeker).await;
  assert_eq!(for_seeker[0].unread_count, 1);
}

#[tokio::test]
async fn mark_read_clears_unread_and_publishes_updates() {
  let s = store().await;
  let (recruiter, seeker, match_id) = pair(&s).await;
  chat::send_message(&s, match_id, seeker, "one").await.unwrap();
  chat::send_message(&s, match_id, seeker, "two").await.unwrap();

  let mut rx = s.subscribe();
  assert_eq!(inbox::mark_read(&s, match_id, recruiter).await.unwrap(), 2);
  assert_eq!(s.count_unread(match_id, recruiter).await.unwrap(), 0);

  let event = rx.recv().await.unwrap();
  assert_eq!((event.table, event.op), (Table::Messages, Op::Update));
  assert!(event.message().unwrap().read);

  // Nothing left to mark.
  assert_eq!(inbox::mark_read(&s, match_id, recruiter).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_counterpart_email_shows_unknown_user() {
  let s = store().await;
  let (recruiter, seeker, _) = pair(&s).await;
  s.conn
    .call(move |conn| {
      conn.execute(
        "UPDATE profiles SET email = NULL WHERE id = ?1",
        rusqlite::params![seeker.hyphenated().to_string()],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let list = inbox::list_matches(&s, recruiter).await;
  assert_eq!(list[0].counterpart_email, UNKNOWN_USER);
}

#[tokio::test]
async fn matches_list_newest_first() {
  let s = store().await;
  let (recruiter, seeker, first) = pair(&s).await;
  let second = s
    .create_match(NewMatch { recruiter_id: recruiter, job_seeker_id: seeker })
    .await
    .unwrap();

  let ids: Vec<Uuid> = s
    .list_matches(recruiter)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.match_id)
    .collect();
  assert_eq!(ids, vec![second.match_id, first]);
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn writes_are_published() {
  let s = store().await;
  let recruiter = user(&s, "r@acme.test", Role::Recruiter, &["rust"]).await;
  let seeker = user(&s, "s@x.test", Role::JobSeeker, &["rust"]).await;
  let mut rx = s.subscribe();

  let m = s
    .create_match(NewMatch { recruiter_id: recruiter, job_seeker_id: seeker })
    .await
    .unwrap();
  let sent = chat::send_message(&s, m.match_id, seeker, "hi").await.unwrap();

  let first = rx.recv().await.unwrap();
  assert_eq!((first.table, first.op), (Table::Matches, Op::Insert));
  assert_eq!(first.match_row(), Some(&m));

  let second = rx.recv().await.unwrap();
  assert_eq!((second.table, second.op), (Table::Messages, Op::Insert));
  assert_eq!(second.message(), Some(&sent));
}
