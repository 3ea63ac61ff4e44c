//! Paste orchestration: the single entry point transports call into.
//!
//! Create requests move through
//! `Received -> Validated -> RateChecked -> Identified -> Stored -> Referenced`
//! and stop at the first rejection. Nothing is retried here; retry is a
//! caller decision.

use crate::config::Config;
use crate::error::AppError;
use crate::ident::{is_well_formed, IdentifierMode};
use crate::models::paste::{Paste, PasteRef};
use crate::rate_limit::RateLimiter;
use crate::store::{CreateOutcome, PasteStore};
use crate::validate::validate_payload;
use std::sync::Arc;

/// Composition root for paste operations.
pub struct PasteService {
    store: Arc<dyn PasteStore>,
    limiter: Arc<RateLimiter>,
    mode: IdentifierMode,
    max_paste_bytes: usize,
}

impl PasteService {
    /// Wire a service from its collaborators.
    ///
    /// # Arguments
    /// - `store`: Durable paste storage.
    /// - `limiter`: Create throttle, owned independently of the store.
    /// - `mode`: Identifier mode for every paste created by this service.
    /// - `max_paste_bytes`: Largest accepted payload.
    pub fn new(
        store: Arc<dyn PasteStore>,
        limiter: Arc<RateLimiter>,
        mode: IdentifierMode,
        max_paste_bytes: usize,
    ) -> Self {
        Self {
            store,
            limiter,
            mode,
            max_paste_bytes,
        }
    }

    /// Wire a service using the limits and mode from `config`.
    pub fn from_config(config: &Config, store: Arc<dyn PasteStore>) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit,
            config.rate_window(),
            config.max_tracked_clients,
        ));
        Self::new(
            store,
            limiter,
            config.identifier_mode,
            config.max_paste_bytes,
        )
    }

    /// Identifier mode in effect.
    pub fn mode(&self) -> IdentifierMode {
        self.mode
    }

    /// Shared rate limiter (for periodic sweeping).
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Largest payload accepted by create and update.
    pub fn max_paste_bytes(&self) -> usize {
        self.max_paste_bytes
    }

    /// Store a new paste submitted by `client_key`.
    ///
    /// # Returns
    /// A [`PasteRef`]; in content mode `deduplicated` is set when the same
    /// bytes were already stored.
    ///
    /// # Errors
    /// - [`AppError::Validation`] for empty, all-null, or oversized payloads.
    /// - [`AppError::RateLimited`] when the client exhausted its window.
    /// - [`AppError::Conflict`] when a random identifier is already taken.
    /// - Storage errors from the backend.
    pub fn create(&self, content: &[u8], client_key: &str) -> Result<PasteRef, AppError> {
        validate_payload(content, self.max_paste_bytes)?;

        if !self.limiter.allow(client_key) {
            tracing::debug!("Rate limited create from {}", client_key);
            return Err(AppError::RateLimited);
        }

        let id = self.mode.assign(content);
        match (self.store.create(&id, content)?, self.mode) {
            (CreateOutcome::Created, _) => {
                tracing::debug!("Stored paste {} ({} bytes)", id, content.len());
                Ok(PasteRef::new(id, false))
            }
            (CreateOutcome::AlreadyExists, IdentifierMode::Content) => {
                tracing::debug!("Deduplicated paste {}", id);
                Ok(PasteRef::new(id, true))
            }
            (CreateOutcome::AlreadyExists, IdentifierMode::Random) => {
                tracing::warn!("Random paste id {} collided with an existing paste", id);
                Err(AppError::Conflict(format!(
                    "Identifier {} is already in use, please retry",
                    id
                )))
            }
        }
    }

    /// Fetch a paste by identifier.
    ///
    /// # Errors
    /// [`AppError::NotFound`] for unknown or malformed identifiers.
    pub fn read(&self, id: &str) -> Result<Paste, AppError> {
        if !is_well_formed(id) {
            return Err(AppError::NotFound);
        }
        self.store
            .read(id)?
            .map(|content| Paste::new(id, content))
            .ok_or(AppError::NotFound)
    }

    /// Replace the content of an existing paste.
    ///
    /// # Errors
    /// - [`AppError::Validation`] for invalid payloads.
    /// - [`AppError::Immutable`] in content mode, where the id is the digest.
    /// - [`AppError::NotFound`] when the paste does not exist.
    pub fn update(&self, id: &str, content: &[u8]) -> Result<PasteRef, AppError> {
        validate_payload(content, self.max_paste_bytes)?;
        if self.mode == IdentifierMode::Content {
            return Err(AppError::Immutable);
        }
        if !is_well_formed(id) || !self.store.update(id, content)? {
            return Err(AppError::NotFound);
        }
        tracing::debug!("Updated paste {} ({} bytes)", id, content.len());
        Ok(PasteRef::new(id.to_string(), false))
    }

    /// Remove a paste.
    ///
    /// # Errors
    /// [`AppError::NotFound`] when the paste does not exist.
    pub fn delete(&self, id: &str) -> Result<(), AppError> {
        if !is_well_formed(id) || !self.store.delete(id)? {
            return Err(AppError::NotFound);
        }
        tracing::debug!("Deleted paste {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::store::{FsPasteStore, RedbPasteStore};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    const CLIENT: &str = "198.51.100.7";

    fn service_with(
        mode: IdentifierMode,
        limit: u32,
    ) -> (PasteService, Arc<dyn PasteStore>, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let store: Arc<dyn PasteStore> =
            Arc::new(FsPasteStore::open(dir.path().join("data")).expect("open store"));
        let limiter = Arc::new(RateLimiter::new(limit, Duration::from_secs(60), 1000));
        let service = PasteService::new(store.clone(), limiter, mode, 1024);
        (service, store, dir)
    }

    #[test]
    fn create_then_read_round_trips_in_both_modes() {
        for mode in [IdentifierMode::Random, IdentifierMode::Content] {
            let (service, _store, _dir) = service_with(mode, 0);
            let content = b"fn main() {}\n\x01\x02";
            let reference = service.create(content, CLIENT).expect("create");
            let paste = service.read(&reference.id).expect("read");
            assert_eq!(paste.content, content, "mode: {}", mode);
            assert_eq!(paste.id, reference.id);
        }
    }

    #[test]
    fn hello_gets_its_digest_in_content_mode() {
        let (service, _store, _dir) = service_with(IdentifierMode::Content, 0);
        let reference = service.create(b"hello", CLIENT).expect("create");
        assert!(reference.id.starts_with("2cf24dba"));
        assert_eq!(reference.id.len(), 64);
    }

    #[test]
    fn empty_and_null_payloads_are_rejected_without_storing() {
        let (service, store, _dir) = service_with(IdentifierMode::Random, 0);
        for payload in [&b""[..], &[0u8; 1][..], &[0u8; 512][..]] {
            let err = service.create(payload, CLIENT).expect_err("should reject");
            assert!(matches!(
                err,
                AppError::Validation(ValidationError::Empty)
            ));
        }
        assert!(store.ids().expect("ids").is_empty());
    }

    #[test]
    fn oversized_payload_is_rejected_before_rate_check() {
        let (service, store, _dir) = service_with(IdentifierMode::Random, 1);
        let err = service
            .create(&[b'x'; 1025], CLIENT)
            .expect_err("should reject");
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::TooLarge { .. })
        ));
        // The rejected request must not have consumed the allowance.
        service.create(b"ok", CLIENT).expect("allowed create");
        assert_eq!(store.ids().expect("ids").len(), 1);
    }

    #[test]
    fn content_mode_deduplicates_identical_payloads() {
        let (service, store, _dir) = service_with(IdentifierMode::Content, 0);
        let first = service.create(b"same bytes", CLIENT).expect("first");
        let second = service.create(b"same bytes", CLIENT).expect("second");
        assert_eq!(first.id, second.id);
        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(store.ids().expect("ids"), vec![first.id]);
    }

    #[test]
    fn random_mode_stores_identical_payloads_separately() {
        let (service, store, _dir) = service_with(IdentifierMode::Random, 0);
        let first = service.create(b"same bytes", CLIENT).expect("first");
        let second = service.create(b"same bytes", CLIENT).expect("second");
        assert_ne!(first.id, second.id);
        assert_eq!(first.id.len(), 8);
        assert_eq!(store.ids().expect("ids").len(), 2);
    }

    /// Store whose every key is already taken.
    struct OccupiedStore;

    impl PasteStore for OccupiedStore {
        fn create(&self, _id: &str, _content: &[u8]) -> Result<CreateOutcome, AppError> {
            Ok(CreateOutcome::AlreadyExists)
        }
        fn read(&self, _id: &str) -> Result<Option<Vec<u8>>, AppError> {
            Ok(None)
        }
        fn update(&self, _id: &str, _content: &[u8]) -> Result<bool, AppError> {
            Ok(false)
        }
        fn delete(&self, _id: &str) -> Result<bool, AppError> {
            Ok(false)
        }
        fn ids(&self) -> Result<Vec<String>, AppError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn random_id_collision_is_a_conflict_not_an_overwrite() {
        let limiter = Arc::new(RateLimiter::new(0, Duration::from_secs(60), 10));
        let random = PasteService::new(
            Arc::new(OccupiedStore),
            limiter.clone(),
            IdentifierMode::Random,
            1024,
        );
        assert!(matches!(
            random.create(b"payload", CLIENT),
            Err(AppError::Conflict(_))
        ));

        let content = PasteService::new(
            Arc::new(OccupiedStore),
            limiter,
            IdentifierMode::Content,
            1024,
        );
        let reference = content.create(b"payload", CLIENT).expect("dedup");
        assert!(reference.deduplicated);
    }

    #[test]
    fn rate_limit_rejects_the_extra_create() {
        let (service, store, _dir) = service_with(IdentifierMode::Random, 2);
        service.create(b"one", CLIENT).expect("first");
        service.create(b"two", CLIENT).expect("second");
        assert!(matches!(
            service.create(b"three", CLIENT),
            Err(AppError::RateLimited)
        ));
        service.create(b"other client", "192.0.2.1").expect("other client");
        assert_eq!(store.ids().expect("ids").len(), 3);
    }

    #[test]
    fn reads_of_unknown_or_malformed_ids_are_not_found() {
        let (service, _store, _dir) = service_with(IdentifierMode::Random, 0);
        assert!(matches!(service.read("ffffffff"), Err(AppError::NotFound)));
        assert!(matches!(service.read("../../etc"), Err(AppError::NotFound)));
    }

    #[test]
    fn update_and_delete_lifecycle_in_random_mode() {
        let (service, _store, _dir) = service_with(IdentifierMode::Random, 0);
        let reference = service.create(b"v1", CLIENT).expect("create");
        service.update(&reference.id, b"v2").expect("update");
        assert_eq!(service.read(&reference.id).expect("read").content, b"v2");
        assert!(matches!(
            service.update(&reference.id, b""),
            Err(AppError::Validation(ValidationError::Empty))
        ));
        service.delete(&reference.id).expect("delete");
        assert!(matches!(service.read(&reference.id), Err(AppError::NotFound)));
        assert!(matches!(service.delete(&reference.id), Err(AppError::NotFound)));
        assert!(matches!(
            service.update(&reference.id, b"v3"),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn content_mode_pastes_cannot_be_updated() {
        let (service, _store, _dir) = service_with(IdentifierMode::Content, 0);
        let reference = service.create(b"fixed", CLIENT).expect("create");
        assert!(matches!(
            service.update(&reference.id, b"changed"),
            Err(AppError::Immutable)
        ));
        service.delete(&reference.id).expect("delete still allowed");
    }

    #[test]
    fn concurrent_content_creates_leave_one_entry() {
        let dir = TempDir::new().expect("temp dir");
        let store: Arc<dyn PasteStore> =
            Arc::new(RedbPasteStore::open(dir.path()).expect("open store"));
        let limiter = Arc::new(RateLimiter::new(0, Duration::from_secs(60), 10));
        let service = Arc::new(PasteService::new(
            store.clone(),
            limiter,
            IdentifierMode::Content,
            1024 * 1024,
        ));
        let content: Vec<u8> = (1..=255u8).cycle().take(200_000).collect();
        let workers = 16;
        let barrier = Arc::new(Barrier::new(workers));

        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let service = service.clone();
                let barrier = barrier.clone();
                let content = content.clone();
                thread::spawn(move || {
                    barrier.wait();
                    service
                        .create(&content, &format!("client-{}", i))
                        .expect("create")
                })
            })
            .collect();
        let references: Vec<PasteRef> = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker join"))
            .collect();

        assert!(references.iter().all(|r| r.id == references[0].id));
        assert_eq!(
            references.iter().filter(|r| !r.deduplicated).count(),
            1,
            "exactly one caller should perform the write"
        );
        assert_eq!(store.ids().expect("ids").len(), 1);
        assert_eq!(
            service.read(&references[0].id).expect("read").content,
            content
        );
    }
}
