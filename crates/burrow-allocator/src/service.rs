use async_trait::async_trait;
use burrow_core::{
    Advance, AllocateParams, AllocationError, Allocator, CodeRecord, CodeStore, ReservedNames,
    SequenceSeed, SequenceState, SequenceStore, ShortPath, StorageError,
};
use burrow_generator::{lcg, Lcg, SEQUENCE_CEILING};
use jiff::Timestamp;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, AllocationError>;

pub const DEFAULT_RETRY_WARN_THRESHOLD: u32 = 16;

/// Settings that stay fixed for the lifetime of a service.
#[derive(Debug, Clone, TypedBuilder)]
pub struct AllocatorSettings {
    /// Paths that are never handed out or accepted.
    #[builder(default)]
    pub reserved: ReservedNames,
    /// Warn after this many retries in one call, and again on every
    /// multiple of it. Zero turns the warning off.
    #[builder(default = DEFAULT_RETRY_WARN_THRESHOLD)]
    pub retry_warn_threshold: u32,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Whether a call that has retried `retries` times should warn about it.
fn should_warn(retries: u32, threshold: u32) -> bool {
    threshold != 0 && retries != 0 && retries % threshold == 0
}

/// Why a generated allocation went back to `FetchState`.
#[derive(Debug, Clone, Copy)]
enum Retry {
    Collision,
    Stale,
}

/// Retries taken by one generated allocation.
#[derive(Debug, Default)]
struct Retries {
    collisions: u32,
    stale: u32,
}

impl Retries {
    fn total(&self) -> u32 {
        self.collisions.saturating_add(self.stale)
    }
}

/// Where a generated allocation currently is.
#[derive(Debug)]
enum Phase {
    FetchState,
    ComputeNext(SequenceState),
    PersistNext {
        observed: SequenceState,
        step: lcg::Step,
    },
    Encode(lcg::Step),
    CheckCollision(ShortPath),
    Accept(ShortPath),
}

/// The allocation protocol over a sequence store and a code store.
///
/// The service keeps no state between calls: every attempt re-reads the
/// sequence row, so any number of services may share one backend as long
/// as the [`SequenceStore`] advances atomically.
#[derive(Debug)]
pub struct AllocatorService<S, C> {
    sequence: Arc<S>,
    codes: Arc<C>,
    lcg: Lcg,
    settings: AllocatorSettings,
}

impl<S, C> Clone for AllocatorService<S, C> {
    fn clone(&self) -> Self {
        Self {
            sequence: Arc::clone(&self.sequence),
            codes: Arc::clone(&self.codes),
            lcg: self.lcg,
            settings: self.settings.clone(),
        }
    }
}

impl<S: SequenceStore, C: CodeStore> AllocatorService<S, C> {
    pub fn new(sequence: S, codes: C, lcg: Lcg, settings: AllocatorSettings) -> Self {
        Self {
            sequence: Arc::new(sequence),
            codes: Arc::new(codes),
            lcg,
            settings,
        }
    }

    /// Creates the sequence row from `seed` if needed and builds a service
    /// from the constants actually stored, which win over `seed`'s.
    pub async fn bootstrap(
        sequence: S,
        codes: C,
        seed: SequenceSeed,
        settings: AllocatorSettings,
    ) -> Result<Self> {
        let stored = sequence.ensure_initialized(seed).await?;
        if (stored.a, stored.b) != (seed.a, seed.b) {
            warn!(
                configured_a = seed.a,
                configured_b = seed.b,
                stored_a = stored.a,
                stored_b = stored.b,
                "configured permutation constants differ from the stored ones; using stored"
            );
        }

        let lcg = Lcg::from_seed(&stored);
        if !lcg.has_full_period() {
            warn!(
                a = lcg.a(),
                b = lcg.b(),
                "permutation constants do not give a full period; expect collisions"
            );
        }

        info!(
            counter = stored.state.counter,
            reserved = settings.reserved.len(),
            "allocator ready"
        );
        Ok(Self::new(sequence, codes, lcg, settings))
    }

    pub fn lcg(&self) -> Lcg {
        self.lcg
    }

    pub fn sequence(&self) -> &S {
        &self.sequence
    }

    pub fn codes(&self) -> &C {
        &self.codes
    }

    /// Draws codes from the sequence until one is free, then stores it.
    ///
    /// Every committed advance consumes a counter tick, including attempts
    /// whose code turns out to be taken. A stale advance consumes nothing.
    async fn generate(&self, record: CodeRecord) -> Result<ShortPath> {
        let mut phase = Phase::FetchState;
        let mut retries = Retries::default();

        loop {
            phase = match phase {
                Phase::FetchState => Phase::ComputeNext(self.sequence.read_state().await?),
                Phase::ComputeNext(state) => {
                    if state.counter >= SEQUENCE_CEILING {
                        return Err(AllocationError::Exhausted {
                            counter: state.counter,
                        });
                    }
                    Phase::PersistNext {
                        observed: state,
                        step: self.lcg.next(state),
                    }
                }
                Phase::PersistNext { observed, step } => {
                    match self.sequence.advance(observed, step.output).await? {
                        Advance::Committed(counter) => {
                            trace!(counter, output = step.output, "sequence advanced");
                            Phase::Encode(step)
                        }
                        Advance::Stale => {
                            self.note_retry(&mut retries, Retry::Stale, None);
                            Phase::FetchState
                        }
                    }
                }
                Phase::Encode(step) => Phase::CheckCollision(ShortPath::generated(step.encode())),
                Phase::CheckCollision(path) => {
                    if self.is_taken(&path).await? {
                        self.note_retry(&mut retries, Retry::Collision, Some(&path));
                        Phase::FetchState
                    } else {
                        Phase::Accept(path)
                    }
                }
                Phase::Accept(path) => match self.codes.insert(&path, record.clone()).await {
                    Ok(()) => {
                        debug!(
                            path = %path,
                            collisions = retries.collisions,
                            stale = retries.stale,
                            "generated path accepted"
                        );
                        return Ok(path);
                    }
                    Err(StorageError::Conflict(_)) => {
                        self.note_retry(&mut retries, Retry::Collision, Some(&path));
                        Phase::FetchState
                    }
                    Err(err) => return Err(err.into()),
                },
            };
        }
    }

    /// Validates and stores a caller-chosen path. Never touches the sequence.
    async fn claim(&self, path: ShortPath, record: CodeRecord) -> Result<ShortPath> {
        if self.codes.exists(&path).await? {
            return Err(AllocationError::AlreadyExists(path.to_string()));
        }
        if self.settings.reserved.contains(path.as_str()) {
            return Err(AllocationError::NotAllowed(path.to_string()));
        }

        match self.codes.insert(&path, record).await {
            Ok(()) => {
                debug!(path = %path, "custom path accepted");
                Ok(path)
            }
            Err(StorageError::Conflict(_)) => Err(AllocationError::AlreadyExists(path.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn is_taken(&self, path: &ShortPath) -> Result<bool> {
        if self.settings.reserved.contains(path.as_str()) {
            return Ok(true);
        }
        Ok(self.codes.exists(path).await?)
    }

    fn note_retry(&self, retries: &mut Retries, retry: Retry, path: Option<&ShortPath>) {
        match retry {
            Retry::Collision => retries.collisions = retries.collisions.saturating_add(1),
            Retry::Stale => retries.stale = retries.stale.saturating_add(1),
        }

        let path = path.map(ShortPath::as_str);
        if should_warn(retries.total(), self.settings.retry_warn_threshold) {
            warn!(
                collisions = retries.collisions,
                stale = retries.stale,
                last = ?retry,
                path,
                "generated allocation keeps retrying"
            );
        } else {
            debug!(
                collisions = retries.collisions,
                stale = retries.stale,
                last = ?retry,
                path,
                "generated allocation retrying"
            );
        }
    }
}

#[async_trait]
impl<S: SequenceStore, C: CodeStore> Allocator for AllocatorService<S, C> {
    async fn allocate(&self, params: AllocateParams) -> Result<ShortPath> {
        let payload = params.payload.trim();
        if payload.is_empty() {
            return Err(AllocationError::InvalidPayload(
                "payload cannot be empty".to_string(),
            ));
        }

        let custom = match params.custom_path.as_deref() {
            Some(raw) => ShortPath::custom(raw)?,
            None => None,
        };

        let record = CodeRecord {
            payload: payload.to_string(),
            is_literal: params.is_literal,
            created_at: Timestamp::now(),
        };

        match custom {
            Some(path) => self.claim(path, record).await,
            None => self.generate(record).await,
        }
    }

    async fn resolve(&self, path: &ShortPath) -> Result<Option<CodeRecord>> {
        Ok(self.codes.get(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::error::Result as StoreResult;
    use burrow_core::ReadCodeStore;
    use burrow_generator::decode;
    use burrow_storage::{InMemoryCodeStore, InMemorySequenceStore};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    type MemoryService = AllocatorService<InMemorySequenceStore, InMemoryCodeStore>;

    fn seed(counter: u64, last_output: u64) -> SequenceSeed {
        SequenceSeed {
            a: 5,
            b: 7,
            state: SequenceState {
                counter,
                last_output,
            },
        }
    }

    fn lcg() -> Lcg {
        Lcg::builder().a(5).b(7).build()
    }

    fn service_with(settings: AllocatorSettings) -> MemoryService {
        AllocatorService::new(
            InMemorySequenceStore::with_seed(seed(0, 54)),
            InMemoryCodeStore::new(),
            lcg(),
            settings,
        )
    }

    fn test_service() -> MemoryService {
        service_with(AllocatorSettings::default())
    }

    async fn counter<S: SequenceStore, C: CodeStore>(service: &AllocatorService<S, C>) -> u64 {
        service.sequence().read_state().await.unwrap().counter
    }

    fn url(n: usize) -> AllocateParams {
        AllocateParams::generated(format!("https://example{n}.com"), false)
    }

    /// Code store that never reports existing paths, so conflicts only show
    /// up at insert time.
    struct BlindCodeStore(InMemoryCodeStore);

    #[async_trait]
    impl ReadCodeStore for BlindCodeStore {
        async fn get(&self, path: &ShortPath) -> StoreResult<Option<CodeRecord>> {
            self.0.get(path).await
        }

        async fn exists(&self, _path: &ShortPath) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl CodeStore for BlindCodeStore {
        async fn insert(&self, path: &ShortPath, record: CodeRecord) -> StoreResult<()> {
            self.0.insert(path, record).await
        }
    }

    /// Sequence store that loses the first advance race.
    struct RacedSequenceStore {
        inner: InMemorySequenceStore,
        raced: AtomicBool,
    }

    #[async_trait]
    impl SequenceStore for RacedSequenceStore {
        async fn ensure_initialized(&self, seed: SequenceSeed) -> StoreResult<SequenceSeed> {
            self.inner.ensure_initialized(seed).await
        }

        async fn read_state(&self) -> StoreResult<SequenceState> {
            self.inner.read_state().await
        }

        async fn advance(&self, observed: SequenceState, next_output: u64) -> StoreResult<Advance> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                return Ok(Advance::Stale);
            }
            self.inner.advance(observed, next_output).await
        }
    }

    /// Sequence store that loses the first `losses` advance races.
    struct StarvedSequenceStore {
        inner: InMemorySequenceStore,
        losses: AtomicU32,
    }

    #[async_trait]
    impl SequenceStore for StarvedSequenceStore {
        async fn ensure_initialized(&self, seed: SequenceSeed) -> StoreResult<SequenceSeed> {
            self.inner.ensure_initialized(seed).await
        }

        async fn read_state(&self) -> StoreResult<SequenceState> {
            self.inner.read_state().await
        }

        async fn advance(&self, observed: SequenceState, next_output: u64) -> StoreResult<Advance> {
            let lost = self
                .losses
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lost {
                return Ok(Advance::Stale);
            }
            self.inner.advance(observed, next_output).await
        }
    }

    /// Collects formatted log lines written while a subscriber is installed.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn warnings(&self) -> usize {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.contains("WARN"))
                .count()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_warnings() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    #[derive(Debug)]
    struct DownSequenceStore;

    #[async_trait]
    impl SequenceStore for DownSequenceStore {
        async fn ensure_initialized(&self, _seed: SequenceSeed) -> StoreResult<SequenceSeed> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn read_state(&self) -> StoreResult<SequenceState> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn advance(&self, _: SequenceState, _: u64) -> StoreResult<Advance> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn warns_on_every_multiple_of_the_threshold() {
        assert!(!should_warn(0, 4));
        assert!(!should_warn(1, 4));
        assert!(!should_warn(3, 4));
        assert!(should_warn(4, 4));
        assert!(!should_warn(5, 4));
        assert!(should_warn(8, 4));
        assert!(should_warn(1, 1));
    }

    #[test]
    fn zero_threshold_never_warns() {
        assert!(!should_warn(0, 0));
        assert!(!should_warn(1, 0));
        assert!(!should_warn(16, 0));
    }

    #[tokio::test]
    async fn lost_advance_races_count_toward_the_warning() {
        let service = AllocatorService::new(
            StarvedSequenceStore {
                inner: InMemorySequenceStore::with_seed(seed(0, 54)),
                losses: AtomicU32::new(9),
            },
            InMemoryCodeStore::new(),
            lcg(),
            AllocatorSettings::builder().retry_warn_threshold(4).build(),
        );
        let (logs, _guard) = capture_warnings();

        let path = service.allocate(url(0)).await.unwrap();

        assert_eq!(path.as_str(), "k");
        assert_eq!(counter(&service).await, 1);
        // Retries 4 and 8 reach a multiple of the threshold.
        assert_eq!(logs.warnings(), 2);
    }

    #[tokio::test]
    async fn repeated_collisions_warn_at_the_threshold() {
        let service = service_with(AllocatorSettings::builder().retry_warn_threshold(2).build());
        for taken in ["k", "K", "R"] {
            service
                .codes()
                .insert(
                    &ShortPath::new_unchecked(taken),
                    CodeRecord {
                        payload: "https://taken.example".to_string(),
                        is_literal: false,
                        created_at: Timestamp::now(),
                    },
                )
                .await
                .unwrap();
        }
        let (logs, _guard) = capture_warnings();

        service.allocate(url(0)).await.unwrap();

        assert_eq!(counter(&service).await, 4);
        assert_eq!(logs.warnings(), 1);
    }

    #[tokio::test]
    async fn first_generated_path_follows_the_sequence() {
        let service = test_service();

        let path = service.allocate(url(0)).await.unwrap();

        assert_eq!(path.as_str(), "k");
        assert!(path.is_generated());
        assert_eq!(counter(&service).await, 1);
        assert_eq!(
            service.sequence().read_state().await.unwrap().last_output,
            21
        );
    }

    #[tokio::test]
    async fn counter_tracks_allocations_without_collisions() {
        let service = test_service();
        let mut paths = HashSet::new();

        for n in 0..200 {
            let path = service.allocate(url(n)).await.unwrap();
            assert!(paths.insert(path.to_string()));
        }

        assert_eq!(counter(&service).await, 200);
        assert_eq!(service.codes().len(), 200);
    }

    #[tokio::test]
    async fn existing_path_burns_a_tick_and_retries() {
        let service = test_service();
        service
            .allocate(AllocateParams::custom("k", "https://taken.example", false))
            .await
            .unwrap();

        let path = service.allocate(url(0)).await.unwrap();

        // (5 * 21 + 7) mod 64 = 48, the symbol 'K'.
        assert_eq!(path.as_str(), "K");
        assert_eq!(decode(path.as_str()).unwrap(), 48);
        assert_eq!(counter(&service).await, 2);
    }

    #[tokio::test]
    async fn reserved_generated_path_is_skipped() {
        let settings = AllocatorSettings::builder()
            .reserved(ReservedNames::new(["k"]))
            .build();
        let service = service_with(settings);

        let path = service.allocate(url(0)).await.unwrap();

        assert_eq!(path.as_str(), "K");
        assert_eq!(counter(&service).await, 2);
        assert!(!service.codes().exists(&ShortPath::generated("k")).await.unwrap());
    }

    #[tokio::test]
    async fn counter_counts_collisions_too() {
        let service = test_service();
        // Occupy the first three codes of the sequence.
        for taken in ["k", "K", "R"] {
            service
                .codes()
                .insert(
                    &ShortPath::new_unchecked(taken),
                    CodeRecord {
                        payload: "https://taken.example".to_string(),
                        is_literal: false,
                        created_at: Timestamp::now(),
                    },
                )
                .await
                .unwrap();
        }

        for n in 0..5 {
            service.allocate(url(n)).await.unwrap();
        }

        assert_eq!(counter(&service).await, 5 + 3);
    }

    #[tokio::test]
    async fn conflict_at_insert_is_retried_for_generated_paths() {
        let codes = InMemoryCodeStore::new();
        codes
            .insert(
                &ShortPath::new_unchecked("k"),
                CodeRecord {
                    payload: "https://taken.example".to_string(),
                    is_literal: false,
                    created_at: Timestamp::now(),
                },
            )
            .await
            .unwrap();
        let service = AllocatorService::new(
            InMemorySequenceStore::with_seed(seed(0, 54)),
            BlindCodeStore(codes),
            lcg(),
            AllocatorSettings::default(),
        );

        let path = service.allocate(url(0)).await.unwrap();

        assert_eq!(path.as_str(), "K");
        assert_eq!(counter(&service).await, 2);
    }

    #[tokio::test]
    async fn stale_advance_does_not_burn_a_tick() {
        let service = AllocatorService::new(
            RacedSequenceStore {
                inner: InMemorySequenceStore::with_seed(seed(0, 54)),
                raced: AtomicBool::new(false),
            },
            InMemoryCodeStore::new(),
            lcg(),
            AllocatorSettings::default(),
        );

        let path = service.allocate(url(0)).await.unwrap();

        assert_eq!(path.as_str(), "k");
        assert_eq!(counter(&service).await, 1);
    }

    #[tokio::test]
    async fn custom_path_is_stripped_and_stored() {
        let service = test_service();

        let path = service
            .allocate(AllocateParams::custom("/my-link!", "Hello, world", true))
            .await
            .unwrap();

        assert_eq!(path.as_str(), "mylink");
        assert!(!path.is_generated());
        let record = service.resolve(&path).await.unwrap().unwrap();
        assert_eq!(record.payload, "Hello, world");
        assert!(record.is_literal);
        assert_eq!(counter(&service).await, 0);
    }

    #[tokio::test]
    async fn custom_path_that_exists_is_rejected_without_touching_the_counter() {
        let service = test_service();
        let params = AllocateParams::custom("promo", "https://one.example", false);
        service.allocate(params).await.unwrap();
        let before = service.sequence().read_state().await.unwrap();

        let err = service
            .allocate(AllocateParams::custom("promo", "https://two.example", false))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::AlreadyExists(ref p) if p == "promo"));
        assert!(err.is_rejection());
        assert_eq!(service.sequence().read_state().await.unwrap(), before);
    }

    #[tokio::test]
    async fn custom_path_conflict_at_insert_is_terminal() {
        let codes = InMemoryCodeStore::new();
        codes
            .insert(
                &ShortPath::new_unchecked("promo"),
                CodeRecord {
                    payload: "https://one.example".to_string(),
                    is_literal: false,
                    created_at: Timestamp::now(),
                },
            )
            .await
            .unwrap();
        let service = AllocatorService::new(
            InMemorySequenceStore::with_seed(seed(0, 54)),
            BlindCodeStore(codes),
            lcg(),
            AllocatorSettings::default(),
        );

        let err = service
            .allocate(AllocateParams::custom("promo", "https://two.example", false))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::AlreadyExists(_)));
        assert_eq!(counter(&service).await, 0);
    }

    #[tokio::test]
    async fn reserved_custom_path_is_not_allowed() {
        let service = test_service();

        for raw in ["admin", "/ad-min/", "login"] {
            let err = service
                .allocate(AllocateParams::custom(raw, "https://example.com", false))
                .await
                .unwrap_err();
            assert!(matches!(err, AllocationError::NotAllowed(_)), "{raw}");
        }
        assert!(service.codes().is_empty());
    }

    #[tokio::test]
    async fn custom_path_without_alphanumerics_falls_back_to_generation() {
        let service = test_service();

        let path = service
            .allocate(AllocateParams::custom("/-_/", "https://example.com", false))
            .await
            .unwrap();

        assert_eq!(path.as_str(), "k");
        assert!(path.is_generated());
    }

    #[tokio::test]
    async fn overlong_custom_path_is_invalid() {
        let service = test_service();

        let err = service
            .allocate(AllocateParams::custom("a".repeat(65), "https://example.com", false))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn blank_payload_is_rejected_before_the_sequence_moves() {
        let service = test_service();

        let err = service
            .allocate(AllocateParams::generated("  \n", false))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::InvalidPayload(_)));
        assert_eq!(counter(&service).await, 0);
    }

    #[tokio::test]
    async fn payload_is_trimmed() {
        let service = test_service();

        let path = service
            .allocate(AllocateParams::generated("  https://example.com \n", false))
            .await
            .unwrap();

        let record = service.resolve(&path).await.unwrap().unwrap();
        assert_eq!(record.payload, "https://example.com");
    }

    #[tokio::test]
    async fn resolve_unknown_path() {
        let service = test_service();

        let record = service
            .resolve(&ShortPath::new_unchecked("nope"))
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn refuses_to_run_past_the_ceiling() {
        let service = AllocatorService::new(
            InMemorySequenceStore::with_seed(seed(SEQUENCE_CEILING, 0)),
            InMemoryCodeStore::new(),
            lcg(),
            AllocatorSettings::default(),
        );

        let err = service.allocate(url(0)).await.unwrap_err();

        assert!(matches!(
            err,
            AllocationError::Exhausted { counter } if counter == SEQUENCE_CEILING
        ));
        assert!(!err.is_rejection());
        assert_eq!(counter(&service).await, SEQUENCE_CEILING);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let service = AllocatorService::new(
            DownSequenceStore,
            InMemoryCodeStore::new(),
            lcg(),
            AllocatorSettings::default(),
        );

        let err = service.allocate(url(0)).await.unwrap_err();

        assert!(matches!(
            err,
            AllocationError::Storage(StorageError::Unavailable(_))
        ));
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn uninitialized_sequence_is_a_storage_error() {
        let service = AllocatorService::new(
            InMemorySequenceStore::new(),
            InMemoryCodeStore::new(),
            lcg(),
            AllocatorSettings::default(),
        );

        let err = service.allocate(url(0)).await.unwrap_err();

        assert!(matches!(
            err,
            AllocationError::Storage(StorageError::Uninitialized)
        ));
    }

    #[tokio::test]
    async fn bootstrap_prefers_stored_constants() {
        let service = AllocatorService::bootstrap(
            InMemorySequenceStore::with_seed(seed(0, 54)),
            InMemoryCodeStore::new(),
            SequenceSeed {
                a: 9,
                b: 11,
                ..seed(0, 0)
            },
            AllocatorSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!((service.lcg().a(), service.lcg().b()), (5, 7));
        assert_eq!(service.allocate(url(0)).await.unwrap().as_str(), "k");
    }

    #[tokio::test]
    async fn bootstrap_initializes_an_empty_store() {
        let service = AllocatorService::bootstrap(
            InMemorySequenceStore::new(),
            InMemoryCodeStore::new(),
            seed(0, 54),
            AllocatorSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(service.allocate(url(0)).await.unwrap().as_str(), "k");
    }

    #[tokio::test]
    async fn bootstrap_surfaces_store_failure() {
        let err = AllocatorService::bootstrap(
            DownSequenceStore,
            InMemoryCodeStore::new(),
            seed(0, 54),
            AllocatorSettings::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AllocationError::Storage(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocations_are_unique() {
        let service = Arc::new(test_service());
        let mut handles = vec![];

        for n in 0..64 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.allocate(url(n)).await.unwrap()
            }));
        }

        let mut paths = HashSet::new();
        for handle in handles {
            let path = handle.await.unwrap();
            assert!(!ReservedNames::default().contains(path.as_str()));
            assert!(paths.insert(path.to_string()));
        }

        assert_eq!(paths.len(), 64);
        assert_eq!(counter(service.as_ref()).await, 64);
        assert_eq!(service.codes().len(), 64);
    }
}
