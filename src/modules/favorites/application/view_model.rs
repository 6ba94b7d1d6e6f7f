//! Favorites reconciliation
//!
//! Local edits are applied to the published list immediately and the store
//! write is queued behind them. Every snapshot from the store's listener then
//! replaces the list wholesale, so optimistic entries only live until the
//! next snapshot.
//!
//! Each sign-in/sign-out starts a new session generation. Snapshots, listener
//! errors and write rollbacks are applied under the session lock only when
//! they carry the current generation, which keeps a previous user's data out
//! of the state once `reset_for_new_user` has returned.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::modules::auth::{AuthSession, AuthUser};
use crate::modules::catalog::domain::Movie;
use crate::modules::favorites::domain::{FavoritesStore, SnapshotResult};
use crate::shared::errors::AppError;
use crate::{log_debug, log_info, log_warn};

const SIGNED_OUT_MESSAGE: &str = "Sign in to manage your favorites.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    /// Most recently added first
    pub favorites: Vec<Movie>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Owner of `favorites`; `None` when signed out
    pub user_id: Option<String>,
}

impl FavoritesState {
    pub fn contains(&self, movie_id: i64) -> bool {
        self.favorites.iter().any(|movie| movie.id == movie_id)
    }
}

#[derive(Debug)]
enum WriteCommand {
    Add {
        user: AuthUser,
        generation: u64,
        seq: u64,
        movie: Movie,
    },
    Remove {
        user: AuthUser,
        generation: u64,
        seq: u64,
        movie_id: i64,
        removed: Option<Movie>,
    },
}

struct ListenerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    fn stop(self) {
        self.cancel.cancel();
        drop(self.task);
    }
}

#[derive(Default)]
struct Session {
    generation: u64,
    user: Option<AuthUser>,
    listener: Option<ListenerHandle>,
    next_seq: u64,
    /// Last local edit per movie id; a failed write is rolled back only if it is still the last one
    latest_edit: HashMap<i64, u64>,
}

impl Session {
    fn next_edit(&mut self, movie_id: i64) -> u64 {
        self.next_seq += 1;
        self.latest_edit.insert(movie_id, self.next_seq);
        self.next_seq
    }

    fn is_latest_edit(&self, generation: u64, movie_id: i64, seq: u64) -> bool {
        self.generation == generation && self.latest_edit.get(&movie_id) == Some(&seq)
    }
}

struct Inner {
    store: Arc<dyn FavoritesStore>,
    state: watch::Sender<FavoritesState>,
    session: Mutex<Session>,
    writes: mpsc::UnboundedSender<WriteCommand>,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_snapshot(&self, generation: u64, item: SnapshotResult) {
        let session = self.session();
        if session.generation != generation {
            log_debug!("Dropping favorites emission from session {}", generation);
            return;
        }

        self.state.send_modify(|state| {
            state.is_loading = false;
            match item {
                Ok(entries) => {
                    state.favorites = entries.iter().map(|entry| entry.to_movie()).collect();
                    state.error = None;
                }
                Err(e) => {
                    log_warn!("Favorites listener error: {}", e);
                    state.error = Some(e.user_message());
                }
            }
        });
    }

    fn complete_write(&self, command: WriteCommand, result: Result<(), AppError>) {
        let mut session = self.session();
        let (generation, seq, movie_id) = match &command {
            WriteCommand::Add {
                generation,
                seq,
                movie,
                ..
            } => (*generation, *seq, movie.id),
            WriteCommand::Remove {
                generation,
                seq,
                movie_id,
                ..
            } => (*generation, *seq, *movie_id),
        };
        let is_latest = session.is_latest_edit(generation, movie_id, seq);
        if is_latest {
            session.latest_edit.remove(&movie_id);
        }

        let error = match result {
            Ok(()) => return,
            Err(error) => error,
        };
        log_warn!("Favorites write for movie {} failed: {}", movie_id, error);

        if session.generation != generation {
            return;
        }

        self.state.send_modify(|state| {
            state.error = Some(error.user_message());
            if !is_latest {
                return;
            }
            match command {
                WriteCommand::Add { movie, .. } => {
                    state.favorites.retain(|m| m.id != movie.id);
                }
                WriteCommand::Remove {
                    removed: Some(movie),
                    ..
                } => {
                    if !state.contains(movie.id) {
                        state.favorites.insert(0, movie);
                    }
                }
                WriteCommand::Remove { removed: None, .. } => {}
            }
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let session = self.session.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(listener) = session.listener.take() {
            listener.stop();
        }
    }
}

/// App-wide favorites for the signed-in user.
///
/// Construct once (inside a Tokio runtime) and clone the handle into every
/// screen that needs it; clones share the same state and subscription.
#[derive(Clone)]
pub struct FavoritesViewModel {
    inner: Arc<Inner>,
}

impl FavoritesViewModel {
    pub fn new(store: Arc<dyn FavoritesStore>) -> Self {
        let (state, _) = watch::channel(FavoritesState::default());
        let (writes, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            store,
            state,
            session: Mutex::new(Session::default()),
            writes,
        });
        tokio::spawn(run_writer(Arc::downgrade(&inner), receiver));
        Self { inner }
    }

    pub fn state(&self) -> FavoritesState {
        self.inner.state.borrow().clone()
    }

    /// Favorites as currently shown, newest first
    pub fn snapshot(&self) -> Vec<Movie> {
        self.inner.state.borrow().favorites.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesState> {
        self.inner.state.subscribe()
    }

    pub fn is_favorite(&self, movie_id: i64) -> bool {
        self.inner.state.borrow().contains(movie_id)
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.inner.session().user.as_ref().map(|user| user.uid.clone())
    }

    /// Follow sign-in/sign-out on `auth`, resetting for every change
    pub fn bind_session(&self, auth: &AuthSession) -> JoinHandle<()> {
        let mut changes = auth.subscribe();
        let weak = Arc::downgrade(&self.inner);

        let initial = changes.borrow_and_update().clone();
        self.reset_for_new_user(initial);

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let user = changes.borrow_and_update().clone();
                match weak.upgrade() {
                    Some(inner) => FavoritesViewModel { inner }.reset_for_new_user(user),
                    None => break,
                }
            }
        })
    }

    /// Drop everything belonging to the previous user and start listening for `user`
    pub fn reset_for_new_user(&self, user: Option<AuthUser>) {
        let mut session = self.inner.session();
        if let Some(listener) = session.listener.take() {
            listener.stop();
        }
        session.generation += 1;
        session.latest_edit.clear();
        session.user = user.clone();
        let generation = session.generation;

        self.inner.state.send_replace(FavoritesState {
            favorites: Vec::new(),
            is_loading: user.is_some(),
            error: None,
            user_id: user.as_ref().map(|u| u.uid.clone()),
        });

        match user {
            Some(user) => {
                log_info!(
                    "Favorites: listening for user {} via {} (session {})",
                    user.uid,
                    self.inner.store.name(),
                    generation
                );
                let cancel = CancellationToken::new();
                let task = tokio::spawn(run_listener(
                    Arc::downgrade(&self.inner),
                    Arc::clone(&self.inner.store),
                    user,
                    generation,
                    cancel.clone(),
                ));
                session.listener = Some(ListenerHandle { cancel, task });
            }
            None => log_info!("Favorites: signed out (session {})", generation),
        }
    }

    /// Show `movie` as a favorite now and queue the store write
    pub fn add(&self, movie: Movie) {
        let mut session = self.inner.session();
        let Some(user) = session.user.clone() else {
            self.report_signed_out();
            return;
        };

        let mut inserted = false;
        self.inner.state.send_if_modified(|state| {
            if state.contains(movie.id) {
                return false;
            }
            state.favorites.insert(0, movie.clone());
            state.error = None;
            inserted = true;
            true
        });
        if !inserted {
            log_debug!("Movie {} is already a favorite", movie.id);
            return;
        }

        let seq = session.next_edit(movie.id);
        self.dispatch(WriteCommand::Add {
            user,
            generation: session.generation,
            seq,
            movie,
        });
    }

    /// Hide `movie_id` now and queue the store delete
    pub fn remove(&self, movie_id: i64) {
        let mut session = self.inner.session();
        let Some(user) = session.user.clone() else {
            self.report_signed_out();
            return;
        };

        let mut removed = None;
        self.inner.state.send_if_modified(|state| {
            match state.favorites.iter().position(|movie| movie.id == movie_id) {
                Some(index) => {
                    removed = Some(state.favorites.remove(index));
                    state.error = None;
                    true
                }
                None => false,
            }
        });

        let seq = session.next_edit(movie_id);
        self.dispatch(WriteCommand::Remove {
            user,
            generation: session.generation,
            seq,
            movie_id,
            removed,
        });
    }

    /// Add or remove; returns whether the movie is a favorite afterwards
    pub fn toggle(&self, movie: Movie) -> bool {
        if self.is_favorite(movie.id) {
            self.remove(movie.id);
            false
        } else {
            let movie_id = movie.id;
            self.add(movie);
            self.is_favorite(movie_id)
        }
    }

    fn dispatch(&self, command: WriteCommand) {
        if self.inner.writes.send(command).is_err() {
            log_warn!("Favorites writer stopped, write dropped");
        }
    }

    fn report_signed_out(&self) {
        self.inner.state.send_modify(|state| {
            state.error = Some(SIGNED_OUT_MESSAGE.to_string());
        });
    }
}

/// Apply the store's snapshots for one session until cancelled
async fn run_listener(
    weak: Weak<Inner>,
    store: Arc<dyn FavoritesStore>,
    user: AuthUser,
    generation: u64,
    cancel: CancellationToken,
) {
    let observed = tokio::select! {
        _ = cancel.cancelled() => return,
        observed = store.observe(&user) => observed,
    };

    let mut subscription = match observed {
        Ok(subscription) => subscription,
        Err(e) => {
            if let Some(inner) = weak.upgrade() {
                inner.apply_snapshot(generation, Err(e));
            }
            return;
        }
    };

    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = subscription.next() => item,
        };
        let Some(item) = item else {
            break;
        };
        let Some(inner) = weak.upgrade() else {
            break;
        };
        inner.apply_snapshot(generation, item);
    }
    subscription.cancel();
    log_debug!("Favorites listener for session {} finished", generation);
}

/// Send queued writes to the store one at a time, in call order
async fn run_writer(weak: Weak<Inner>, mut receiver: mpsc::UnboundedReceiver<WriteCommand>) {
    while let Some(command) = receiver.recv().await {
        let Some(store) = weak.upgrade().map(|inner| Arc::clone(&inner.store)) else {
            break;
        };

        let result = match &command {
            WriteCommand::Add { user, movie, .. } => store.add(user, movie).await,
            WriteCommand::Remove { user, movie_id, .. } => store.remove(user, *movie_id).await,
        };

        match weak.upgrade() {
            Some(inner) => inner.complete_write(command, result),
            None => break,
        }
    }
}
