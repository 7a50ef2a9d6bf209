//! The persona engine: load-merge-persist with per-user serialization.
//!
//! [`PersonaEngine`] is the only mutator of persisted records. Concurrent
//! merges for the *same* user are serialized through a per-user async lock so
//! additive and EMA fields never lose updates; merges for *different* users
//! never block each other. Signal recording is designed to run off the chat
//! response path — [`PersonaEngine::record_signals_detached`] spawns the
//! merge and only logs on failure, because a lost persona update is
//! tolerable and a delayed chat response is not.

use crate::persona::merge::merge_signals;
use crate::persona::record::{PersonaEdit, PersonaRecord, apply_edit};
use crate::persona::render::render_persona;
use crate::persona::signal::PersonaSignal;
use crate::persona::store::PersonaStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Confidence a freshly seeded (onboarded) record starts with.
const SEEDED_CONFIDENCE: f64 = 0.2;

/// Read-modify-write engine over a [`PersonaStore`].
pub struct PersonaEngine {
    store: Arc<dyn PersonaStore>,
    /// Per-user merge locks, created on first use.
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PersonaEngine {
    pub fn new(store: Arc<dyn PersonaStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The lock guarding one user's read-modify-write cycle.
    fn user_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("persona lock registry poisoned");
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Fetch a user's record without mutating anything.
    pub async fn load(&self, user_id: &str) -> Result<Option<PersonaRecord>, String> {
        self.store.load(user_id).await
    }

    /// Create (or re-seed) a user's record.
    ///
    /// Called from onboarding with a seed, or lazily with `None` on the first
    /// signal-bearing interaction. A seeded record starts with some
    /// confidence; a bare one starts at zero.
    pub async fn initialize(
        &self,
        user_id: &str,
        seed: Option<PersonaRecord>,
    ) -> Result<PersonaRecord, String> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut record = match seed {
            Some(seed) => {
                let mut record = seed;
                record.confidence_score = SEEDED_CONFIDENCE;
                record
            }
            None => PersonaRecord::neutral(),
        };
        record.last_refreshed_at = Some(Utc::now());

        self.store.upsert(user_id, record.clone()).await?;
        debug!("initialized persona for {user_id}");
        Ok(record)
    }

    /// Merge a batch of signals into a user's record.
    ///
    /// Creates the record lazily if the user has none. Returns the confidence
    /// delta. An empty batch does not touch the store.
    pub async fn record_signals(
        &self,
        user_id: &str,
        signals: &[PersonaSignal],
    ) -> Result<f64, String> {
        if signals.is_empty() {
            return Ok(0.0);
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut record = match self.store.load(user_id).await? {
            Some(record) => record,
            None => PersonaRecord::neutral(),
        };

        let delta = merge_signals(&mut record, signals);
        self.store.upsert(user_id, record).await?;

        debug!(
            "merged {} signal(s) for {user_id} (confidence +{delta:.3})",
            signals.len(),
        );
        Ok(delta)
    }

    /// Fire-and-forget variant of [`record_signals`](Self::record_signals).
    ///
    /// Spawns the merge as a background task. Failures are logged and
    /// dropped — this must never delay or fail the user-facing response.
    pub fn record_signals_detached(
        self: &Arc<Self>,
        user_id: impl Into<String>,
        signals: Vec<PersonaSignal>,
    ) {
        if signals.is_empty() {
            return;
        }
        let engine = Arc::clone(self);
        let user_id = user_id.into();
        tokio::spawn(async move {
            if let Err(err) = engine.record_signals(&user_id, &signals).await {
                warn!("dropping persona update for {user_id}: {err}");
            }
        });
    }

    /// Apply an explicit user edit.
    ///
    /// Fails if the user has no record yet — an edit is always an edit *of*
    /// something the user has seen. Edits refresh the timestamp but leave
    /// `confidence_score` alone.
    pub async fn apply_edit(
        &self,
        user_id: &str,
        edit: &PersonaEdit,
    ) -> Result<PersonaRecord, String> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut record = self
            .store
            .load(user_id)
            .await?
            .ok_or_else(|| format!("No persona found for {user_id}"))?;

        apply_edit(&mut record, edit);
        record.last_refreshed_at = Some(Utc::now());
        self.store.upsert(user_id, record.clone()).await?;
        Ok(record)
    }

    /// Render a user's profile block for prompt injection.
    ///
    /// `Ok(None)` when the user has no persona yet — the caller simply
    /// injects nothing.
    pub async fn render(&self, user_id: &str) -> Result<Option<String>, String> {
        Ok(self.store.load(user_id).await?.map(|r| render_persona(&r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::signal::extract_chat_signals;
    use crate::persona::store::MemoryStore;
    use std::time::Duration;

    fn engine() -> Arc<PersonaEngine> {
        Arc::new(PersonaEngine::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn records_are_created_lazily() {
        let engine = engine();
        assert!(engine.load("u1").await.unwrap().is_none());

        let signals = extract_chat_signals("I love Sony");
        let delta = engine.record_signals("u1", &signals).await.unwrap();
        assert!(delta > 0.0);

        let record = engine.load("u1").await.unwrap().unwrap();
        assert!(record.brand_affinities.contains_key("sony"));
        assert_eq!(record.locale.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_store() {
        let engine = engine();
        let delta = engine.record_signals("u1", &[]).await.unwrap();
        assert_eq!(delta, 0.0);
        assert!(engine.load("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_initialize_starts_with_confidence() {
        let engine = engine();
        let mut seed = PersonaRecord::neutral();
        seed.hobbies = vec!["cycling".into()];
        let record = engine.initialize("u1", Some(seed)).await.unwrap();
        assert_eq!(record.confidence_score, 0.2);
        assert!(record.last_refreshed_at.is_some());

        let bare = engine.initialize("u2", None).await.unwrap();
        assert_eq!(bare.confidence_score, 0.0);
    }

    #[tokio::test]
    async fn confidence_never_decreases_across_merges() {
        let engine = engine();
        let mut previous = 0.0;
        for text in ["I love Sony", "I'm vegan", "cheap please", "budget of $90"] {
            engine
                .record_signals("u1", &extract_chat_signals(text))
                .await
                .unwrap();
            let score = engine.load("u1").await.unwrap().unwrap().confidence_score;
            assert!(score >= previous);
            previous = score;
        }
    }

    #[tokio::test]
    async fn concurrent_merges_for_one_user_all_land() {
        let engine = engine();
        let mut handles = Vec::new();
        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                let signals = extract_chat_signals(&format!("I love Brand{i}"));
                engine.record_signals("u1", &signals).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = engine.load("u1").await.unwrap().unwrap();
        // Each task wrote a distinct brand; serialization means none were lost.
        assert_eq!(record.brand_affinities.len(), 10);
        assert!((record.confidence_score - 10.0 * 0.02).abs() < 1e-9);
    }

    #[tokio::test]
    async fn detached_recording_eventually_lands() {
        let engine = engine();
        engine.record_signals_detached("u1", extract_chat_signals("I'm vegan"));

        let mut landed = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if let Some(record) = engine.load("u1").await.unwrap()
                && record.dietary_restrictions.iter().any(|d| d == "vegan")
            {
                landed = true;
                break;
            }
        }
        assert!(landed, "detached merge should persist within the window");
    }

    #[tokio::test]
    async fn edit_requires_an_existing_record() {
        let engine = engine();
        let err = engine
            .apply_edit("ghost", &PersonaEdit::default())
            .await
            .unwrap_err();
        assert!(err.contains("No persona found"));
    }

    #[tokio::test]
    async fn edit_preserves_confidence() {
        let engine = engine();
        engine
            .record_signals("u1", &extract_chat_signals("I love Sony"))
            .await
            .unwrap();
        let before = engine.load("u1").await.unwrap().unwrap().confidence_score;

        let edit = PersonaEdit {
            country: Some("US".into()),
            ..PersonaEdit::default()
        };
        let record = engine.apply_edit("u1", &edit).await.unwrap();
        assert_eq!(record.country.as_deref(), Some("US"));
        assert_eq!(record.confidence_score, before);
    }

    #[tokio::test]
    async fn render_returns_none_for_unknown_user() {
        let engine = engine();
        assert_eq!(engine.render("nobody").await.unwrap(), None);

        engine
            .record_signals("u1", &extract_chat_signals("I love Sony"))
            .await
            .unwrap();
        let block = engine.render("u1").await.unwrap().unwrap();
        assert!(block.contains("## User Profile"));
        assert!(block.contains("sony"));
    }
}
