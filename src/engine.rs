//! Live query engine.
//!
//! Holds the two live inputs of the address book view: the latest
//! consolidated contact snapshot (written by the loader) and the latest
//! free-text query (written by the input handler). Whichever input
//! changes, the grouped view is recomputed in full from the freshest
//! pair and published through a watch channel.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use crate::consolidate;
use crate::group::{self, GroupedIndex};
use crate::model::Contact;
use crate::search;
use crate::source::ContactSource;

/// The single source of truth for what to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState<T> {
    Loading,
    Success(T),
    Error(String),
}

struct EngineState {
    /// Latest consolidated snapshot; `None` until a load succeeds, and
    /// cleared again while a load or a failed load is the newest event.
    contacts: Option<Vec<Contact>>,
    query: String,
    /// Monotonic load counter. A finishing load publishes its result
    /// only if no newer load (or shutdown) has bumped the counter.
    load_seq: u64,
}

/// Reactive state holder combining the contact snapshot with the query.
///
/// Both writers go through one mutex, so every published view is a pure
/// function of the freshest `(contacts, query)` pair and a stale
/// in-flight combination can never overwrite a newer one.
pub struct ContactsEngine {
    state: Mutex<EngineState>,
    tx: watch::Sender<UiState<GroupedIndex>>,
}

impl ContactsEngine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UiState::Loading);
        Self {
            state: Mutex::new(EngineState {
                contacts: None,
                query: String::new(),
                load_seq: 0,
            }),
            tx,
        }
    }

    /// Subscribe to view updates. The receiver starts at the current
    /// value and only ever observes the latest one.
    pub fn subscribe(&self) -> watch::Receiver<UiState<GroupedIndex>> {
        self.tx.subscribe()
    }

    /// The most recently published view.
    pub fn current_view(&self) -> UiState<GroupedIndex> {
        self.tx.borrow().clone()
    }

    /// Replace the active filter.
    ///
    /// Takes effect immediately when a snapshot is present; during a
    /// load or after a failure the query is retained and applied by the
    /// next successful load. The latest call always wins.
    pub fn set_query(&self, query: impl Into<String>) {
        let mut state = self.lock_state();
        state.query = query.into();
        if let Some(contacts) = state.contacts.as_deref() {
            // Published under the lock so a later set_query cannot be
            // overtaken by this one.
            self.tx.send_replace(combine(contacts, &state.query));
        }
    }

    /// Run one load cycle against `source`.
    ///
    /// Publishes `Loading` up front, then `Success`/`Error` when the
    /// source resolves. The newest cycle wins: if another load starts
    /// (or [`ContactsEngine::shutdown`] runs) while this one is waiting
    /// on the source, this one's result is discarded unpublished.
    pub async fn load<S: ContactSource>(&self, source: &S) {
        let seq = {
            let mut state = self.lock_state();
            state.load_seq += 1;
            state.contacts = None;
            self.tx.send_replace(UiState::Loading);
            state.load_seq
        };

        let fetched = source.fetch_all().await;

        let mut state = self.lock_state();
        if state.load_seq != seq {
            return;
        }
        match fetched {
            Ok(rows) => {
                let contacts = consolidate::consolidate(rows);
                self.tx.send_replace(combine(&contacts, &state.query));
                state.contacts = Some(contacts);
            }
            Err(err) => {
                self.tx
                    .send_replace(UiState::Error(err.message().to_string()));
            }
        }
    }

    /// Invalidate any in-flight load so its result is never published.
    /// Call when the hosting session is torn down.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        state.load_seq += 1;
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }
}

impl Default for ContactsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure combine step: filter the flat snapshot with the query, then
/// regroup the survivors. Groups emptied by the filter disappear from
/// the view entirely.
///
/// Contacts with an empty name cannot be keyed and are dropped from the
/// view rather than failing the whole combine.
fn combine(contacts: &[Contact], query: &str) -> UiState<GroupedIndex> {
    let active = search::active_query(query);
    let filtered: Vec<Contact> = contacts
        .iter()
        .filter(|c| !c.name.is_empty())
        .filter(|c| active.map_or(true, |q| search::name_matches(&c.name, q)))
        .cloned()
        .collect();

    match group::group(&filtered) {
        Ok(index) => UiState::Success(index),
        Err(err) => UiState::Error(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;
    use crate::model::RawContactRow;
    use crate::source::SourceUnavailable;

    fn row(id: &str, name: Option<&str>, number: Option<&str>) -> RawContactRow {
        RawContactRow {
            source_id: id.to_string(),
            display_name: name.map(str::to_string),
            phone_number: number.map(str::to_string),
            email_address: None,
        }
    }

    #[derive(Clone)]
    struct StaticSource {
        rows: Vec<RawContactRow>,
    }

    impl ContactSource for StaticSource {
        async fn fetch_all(&self) -> Result<Vec<RawContactRow>, SourceUnavailable> {
            Ok(self.rows.clone())
        }
    }

    struct FailingSource {
        message: &'static str,
    }

    impl ContactSource for FailingSource {
        async fn fetch_all(&self) -> Result<Vec<RawContactRow>, SourceUnavailable> {
            Err(SourceUnavailable::new(self.message))
        }
    }

    /// Blocks inside `fetch_all` until released, and reports entry, so
    /// tests can interleave loads deterministically.
    #[derive(Clone)]
    struct GatedSource {
        entered: Arc<Notify>,
        release: Arc<Notify>,
        rows: Vec<RawContactRow>,
    }

    impl ContactSource for GatedSource {
        async fn fetch_all(&self) -> Result<Vec<RawContactRow>, SourceUnavailable> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.rows.clone())
        }
    }

    fn people_source() -> StaticSource {
        StaticSource {
            rows: vec![
                row("1", Some("Alice"), Some("111")),
                row("2", Some("alicia"), Some("222")),
                row("3", Some("Bob"), Some("333")),
            ],
        }
    }

    fn view_names(view: &UiState<GroupedIndex>) -> Vec<String> {
        match view {
            UiState::Success(index) => index.contacts().map(|c| c.name.clone()).collect(),
            UiState::Loading => panic!("still loading"),
            UiState::Error(message) => panic!("unexpected error: {message}"),
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let engine = ContactsEngine::new();
        assert_eq!(engine.current_view(), UiState::Loading);
    }

    #[tokio::test]
    async fn test_load_publishes_grouped_view() {
        let engine = ContactsEngine::new();
        engine.load(&people_source()).await;

        let UiState::Success(index) = engine.current_view() else {
            panic!("expected success");
        };
        let keys: Vec<char> = index.keys().collect();
        assert_eq!(keys, vec!['A', 'B']);
        assert_eq!(index.get('A').unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive_substring() {
        let engine = ContactsEngine::new();
        engine.load(&people_source()).await;

        engine.set_query("ali");
        let view = engine.current_view();
        assert_eq!(view_names(&view), vec!["Alice", "alicia"]);
        let UiState::Success(index) = view else {
            panic!("expected success");
        };
        let keys: Vec<char> = index.keys().collect();
        assert_eq!(keys, vec!['A']);
    }

    #[tokio::test]
    async fn test_no_match_yields_empty_index_without_keys() {
        let engine = ContactsEngine::new();
        engine.load(&people_source()).await;

        engine.set_query("xyz");
        let UiState::Success(index) = engine.current_view() else {
            panic!("expected success");
        };
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_clearing_query_restores_unfiltered_view() {
        let engine = ContactsEngine::new();
        engine.load(&people_source()).await;
        let baseline = engine.current_view();

        engine.set_query("ali");
        engine.set_query("");
        assert_eq!(engine.current_view(), baseline);
    }

    #[tokio::test]
    async fn test_latest_query_wins() {
        let engine = ContactsEngine::new();
        engine.load(&people_source()).await;

        engine.set_query("a");
        engine.set_query("al");
        let view = engine.current_view();
        assert_eq!(view_names(&view), vec!["Alice", "alicia"]);
    }

    #[tokio::test]
    async fn test_query_set_while_loading_applies_on_success() {
        let engine = ContactsEngine::new();
        engine.set_query("bob");
        assert_eq!(engine.current_view(), UiState::Loading);

        engine.load(&people_source()).await;
        assert_eq!(view_names(&engine.current_view()), vec!["Bob"]);
    }

    #[tokio::test]
    async fn test_source_failure_surfaces_message_verbatim() {
        let engine = ContactsEngine::new();
        engine
            .load(&FailingSource {
                message: "permission denied",
            })
            .await;

        assert_eq!(
            engine.current_view(),
            UiState::Error("permission denied".to_string())
        );

        // A keystroke during the error state must not synthesize an
        // index in its place.
        engine.set_query("ali");
        assert_eq!(
            engine.current_view(),
            UiState::Error("permission denied".to_string())
        );
    }

    #[tokio::test]
    async fn test_reload_resets_error_state() {
        let engine = ContactsEngine::new();
        engine
            .load(&FailingSource {
                message: "permission denied",
            })
            .await;
        engine.load(&people_source()).await;

        assert!(matches!(engine.current_view(), UiState::Success(_)));
    }

    #[tokio::test]
    async fn test_superseded_load_is_discarded() {
        let engine = Arc::new(ContactsEngine::new());
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let slow = GatedSource {
            entered: entered.clone(),
            release: release.clone(),
            rows: vec![row("1", Some("Old"), None)],
        };

        let pending = tokio::spawn({
            let engine = engine.clone();
            async move { engine.load(&slow).await }
        });

        // Wait until the first load is parked inside its source, then
        // run a newer load to completion.
        entered.notified().await;
        engine
            .load(&StaticSource {
                rows: vec![row("2", Some("New"), None)],
            })
            .await;

        release.notify_one();
        pending.await.unwrap();

        assert_eq!(view_names(&engine.current_view()), vec!["New"]);
    }

    #[tokio::test]
    async fn test_shutdown_discards_pending_load() {
        let engine = Arc::new(ContactsEngine::new());
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let slow = GatedSource {
            entered: entered.clone(),
            release: release.clone(),
            rows: vec![row("1", Some("Late"), None)],
        };

        let pending = tokio::spawn({
            let engine = engine.clone();
            async move { engine.load(&slow).await }
        });

        entered.notified().await;
        engine.shutdown();
        release.notify_one();
        pending.await.unwrap();

        // Nothing was published after teardown.
        assert_eq!(engine.current_view(), UiState::Loading);
    }

    #[tokio::test]
    async fn test_unnamed_contacts_are_skipped_in_views() {
        let engine = ContactsEngine::new();
        engine
            .load(&StaticSource {
                rows: vec![
                    row("1", Some(""), Some("111")),
                    row("2", Some("Ada"), Some("222")),
                ],
            })
            .await;

        assert_eq!(view_names(&engine.current_view()), vec!["Ada"]);
    }

    #[tokio::test]
    async fn test_watch_subscribers_observe_updates() {
        let engine = ContactsEngine::new();
        let mut rx = engine.subscribe();
        assert_eq!(*rx.borrow(), UiState::Loading);

        engine.load(&people_source()).await;
        rx.changed().await.unwrap();
        assert!(matches!(*rx.borrow(), UiState::Success(_)));
    }
}
