use crate::client::{self, ChainService};
use crate::codec;
use crate::pow::{self, Digest, Sha256, Solution};
use crate::session::{Generation, MiningSession, Phase};
use crate::types::{
    BlockCandidate, MiningLogEntry, MiningOutcome, MiningResult, MiningSubmission,
};
use rand::seq::SliceRandom as _;
use rand::Rng;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

pub const NO_BLOCKS_AVAILABLE: &str = "no blocks available";
pub const NOT_MINING: &str = "not mining";
pub const MINING_FAILURE: &str = "stopped due to mining failure";
pub const MINING_STOPPED: &str = "mining stopped";
pub const SERVER_UNREACHABLE: &str = "could not reach the chain server";

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(250);
pub const DEFAULT_IDLE_NOTICE_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_RECOVERABLE_STATUS: u16 = 401;
/// Difficulty the reference chain server ships with.
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Decides which rejected submissions leave the session running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionClassifier {
    recoverable: HashSet<u16>,
}

impl Default for RejectionClassifier {
    fn default() -> Self {
        Self::new([DEFAULT_RECOVERABLE_STATUS])
    }
}

impl RejectionClassifier {
    pub fn new(recoverable: impl IntoIterator<Item = u16>) -> Self {
        Self {
            recoverable: recoverable.into_iter().collect(),
        }
    }

    pub fn is_recoverable(&self, status_code: u16) -> bool {
        self.recoverable.contains(&status_code)
    }
}

#[derive(Clone)]
pub struct MinerConfig {
    /// Required number of leading zero hex digits.
    pub difficulty: u32,
    pub classifier: RejectionClassifier,
    /// Pause between an accepted block and the next fetch.
    pub cooldown: Duration,
    /// How long an exhausted candidate pool waits before reporting "not mining".
    pub idle_notice_delay: Duration,
    pub max_nonce: u64,
    pub digest: Arc<dyn Digest>,
}

impl MinerConfig {
    pub fn new(difficulty: u32) -> Self {
        Self {
            difficulty,
            classifier: RejectionClassifier::default(),
            cooldown: DEFAULT_COOLDOWN,
            idle_notice_delay: DEFAULT_IDLE_NOTICE_DELAY,
            max_nonce: pow::DEFAULT_MAX_NONCE,
            digest: Arc::new(Sha256),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningEvent {
    Status(String),
    Log(MiningLogEntry),
    /// A block was accepted, so the pending transaction pool changed.
    RefreshTransactions,
}

/// An event tagged with the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub generation: u64,
    pub event: MiningEvent,
}

pub struct Miner {
    service: Arc<dyn ChainService>,
    config: MinerConfig,
    generation: Arc<Generation>,
    session: Arc<watch::Sender<MiningSession>>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Miner {
    pub fn new(
        service: Arc<dyn ChainService>,
        config: MinerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (session, _) = watch::channel(MiningSession::idle());
        let (notices, receiver) = mpsc::unbounded_channel();
        let miner = Self {
            service,
            config,
            generation: Arc::new(Generation::default()),
            session: Arc::new(session),
            notices,
        };
        (miner, receiver)
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Snapshot of the latest run.
    pub fn session(&self) -> MiningSession {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MiningSession> {
        self.session.subscribe()
    }

    pub fn is_current(&self, notice: &Notice) -> bool {
        self.generation.is_current(notice.generation)
    }

    /// Stop the live run at its next decision point.
    pub fn stop(&self) {
        self.generation.request_stop();
    }

    /// Reset the session and return the future that drives the new run.
    /// Any run started earlier is abandoned.
    pub fn prepare<R: Rng + Send + 'static>(
        &self,
        miner_public_key: String,
        rng: R,
    ) -> impl Future<Output = MiningSession> + Send + 'static {
        let generation = self.generation.advance();
        let session = MiningSession::new(generation);
        self.session.send_replace(session.clone());
        info!(
            target: "toychain::miner",
            generation,
            difficulty = self.config.difficulty,
            "starting mining session"
        );
        let run = MiningRun {
            service: Arc::clone(&self.service),
            config: self.config.clone(),
            miner_public_key,
            generation: Arc::clone(&self.generation),
            session,
            session_tx: Arc::clone(&self.session),
            notices: self.notices.clone(),
            rng,
        };
        run.run()
    }

    /// Spawn a new run on the current tokio runtime.
    pub fn start<R: Rng + Send + 'static>(
        &self,
        miner_public_key: String,
        rng: R,
    ) -> tokio::task::JoinHandle<MiningSession> {
        tokio::spawn(self.prepare(miner_public_key, rng))
    }
}

enum Flow {
    Continue { cooldown: bool },
    Stop,
}

struct MiningRun<R> {
    service: Arc<dyn ChainService>,
    config: MinerConfig,
    miner_public_key: String,
    generation: Arc<Generation>,
    session: MiningSession,
    session_tx: Arc<watch::Sender<MiningSession>>,
    notices: mpsc::UnboundedSender<Notice>,
    rng: R,
}

impl<R: Rng + Send> MiningRun<R> {
    async fn run(mut self) -> MiningSession {
        while let Flow::Continue { cooldown } = self.cycle().await {
            if cooldown {
                tokio::time::sleep(self.config.cooldown).await;
            }
        }
        if self.is_current() {
            self.session.set_phase(Phase::Idle);
            self.publish();
            info!(
                target: "toychain::miner",
                generation = self.session.generation(),
                attempts = self.session.attempts(),
                successes = self.session.successes(),
                "mining session finished"
            );
        }
        self.session
    }

    /// One fetch, search, submit round. Every await is followed by a
    /// generation check so an abandoned run never touches shared state.
    async fn cycle(&mut self) -> Flow {
        if !self.is_current() {
            return Flow::Stop;
        }
        // A stop pressed during the cooldown must not mine another block.
        self.observe_stop_request();
        if !self.session.keep_mining() {
            self.publish();
            self.notify(MiningEvent::Status(MINING_STOPPED.into()));
            return Flow::Stop;
        }
        if !self.enter(Phase::FetchingCandidates) {
            return Flow::Stop;
        }
        let fetched = self.service.fetch_candidates().await;
        if !self.is_current() {
            return Flow::Stop;
        }
        let candidates = match fetched {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(target: "toychain::miner", %err, "fetching block candidates failed");
                self.session.stop();
                self.publish();
                self.notify(MiningEvent::Status(failure_status(&err)));
                return Flow::Stop;
            }
        };
        let Some(candidate) = candidates.choose(&mut self.rng).cloned() else {
            if self.session.attempts() == 0 {
                info!(target: "toychain::miner", "no block candidates available");
                self.notify(MiningEvent::Status(NO_BLOCKS_AVAILABLE.into()));
            } else {
                self.schedule_idle_notice();
            }
            return Flow::Stop;
        };
        debug!(
            target: "toychain::miner",
            candidates = candidates.len(),
            block = %candidate.id,
            "picked block candidate"
        );

        if !self.enter(Phase::Searching) {
            return Flow::Stop;
        }
        let solved = solve(&self.miner_public_key, &candidate, &self.config).await;
        if !self.is_current() {
            return Flow::Stop;
        }
        let solution = match solved {
            Ok(solution) => solution,
            Err(err) => {
                warn!(target: "toychain::miner", block = %candidate.id, %err, "giving up on block");
                self.session.record_failure();
                self.session.stop();
                self.publish();
                self.notify(MiningEvent::Log(MiningLogEntry {
                    block: candidate.id,
                    nonce: None,
                    result: MiningResult::Rejected,
                    message: err.to_string(),
                }));
                self.notify(MiningEvent::Status(MINING_FAILURE.into()));
                return Flow::Stop;
            }
        };

        if !self.enter(Phase::Submitting) {
            return Flow::Stop;
        }
        let submission = MiningSubmission {
            block_id: candidate.id.clone(),
            nonce: codec::encode_nonce(solution.nonce),
            miner_public_key: self.miner_public_key.clone(),
        };
        let submitted = self.service.submit(&submission).await;
        if !self.is_current() {
            return Flow::Stop;
        }
        match submitted {
            Ok(MiningOutcome::Accepted { server_message }) => {
                info!(
                    target: "toychain::miner",
                    block = %candidate.id,
                    nonce = solution.nonce,
                    hash = %solution.hash,
                    "block accepted"
                );
                self.session.record_success();
                self.observe_stop_request();
                self.publish();
                self.notify(MiningEvent::Log(MiningLogEntry {
                    block: candidate.id,
                    nonce: Some(solution.nonce),
                    result: MiningResult::Accepted,
                    message: server_message,
                }));
                self.notify(MiningEvent::RefreshTransactions);
                if self.session.keep_mining() {
                    Flow::Continue { cooldown: true }
                } else {
                    self.notify(MiningEvent::Status(MINING_STOPPED.into()));
                    Flow::Stop
                }
            }
            Ok(MiningOutcome::Rejected {
                status_code,
                server_message,
            }) => {
                let recoverable = self.config.classifier.is_recoverable(status_code);
                warn!(
                    target: "toychain::miner",
                    block = %candidate.id,
                    status_code,
                    recoverable,
                    message = %server_message,
                    "block rejected"
                );
                self.session.record_failure();
                if !recoverable {
                    self.session.stop();
                }
                self.observe_stop_request();
                self.publish();
                self.notify(MiningEvent::Log(MiningLogEntry {
                    block: candidate.id,
                    nonce: Some(solution.nonce),
                    result: MiningResult::Rejected,
                    message: server_message,
                }));
                if self.session.keep_mining() {
                    Flow::Continue { cooldown: false }
                } else {
                    let status = if recoverable {
                        MINING_STOPPED
                    } else {
                        MINING_FAILURE
                    };
                    self.notify(MiningEvent::Status(status.into()));
                    Flow::Stop
                }
            }
            Err(err) => {
                error!(target: "toychain::miner", block = %candidate.id, %err, "submitting block failed");
                self.session.stop();
                self.publish();
                self.notify(MiningEvent::Status(failure_status(&err)));
                Flow::Stop
            }
        }
    }

    fn is_current(&self) -> bool {
        self.generation.is_current(self.session.generation())
    }

    fn enter(&mut self, phase: Phase) -> bool {
        if !self.is_current() {
            return false;
        }
        self.session.set_phase(phase);
        self.publish();
        true
    }

    fn observe_stop_request(&mut self) {
        if self.generation.stop_requested(self.session.generation()) {
            self.session.stop();
        }
    }

    fn publish(&self) {
        let snapshot = self.session.clone();
        self.session_tx.send_if_modified(|current| {
            if current.generation() > snapshot.generation() {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    fn notify(&self, event: MiningEvent) {
        if !self.is_current() {
            return;
        }
        let notice = Notice {
            generation: self.session.generation(),
            event,
        };
        if self.notices.send(notice).is_err() {
            debug!(target: "toychain::miner", "no one is listening for mining events");
        }
    }

    fn schedule_idle_notice(&self) {
        let generation = Arc::clone(&self.generation);
        let notices = self.notices.clone();
        let current = self.session.generation();
        let delay = self.config.idle_notice_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.is_current(current) && !generation.stop_requested(current) {
                let _ = notices.send(Notice {
                    generation: current,
                    event: MiningEvent::Status(NOT_MINING.into()),
                });
            }
        });
    }
}

/// Status text for a request that failed before the server judged it.
fn failure_status(err: &client::Error) -> String {
    match err {
        client::Error::Status { status, .. } => format!("chain server answered {status}"),
        _ => SERVER_UNREACHABLE.into(),
    }
}

/// The nonce search is CPU bound, so it runs on the blocking pool.
fn solve(
    miner_public_key: &str,
    candidate: &BlockCandidate,
    config: &MinerConfig,
) -> impl Future<Output = Result<Solution, Error>> + Send + 'static {
    let prefix = codec::mining_prefix(miner_public_key, &candidate.payload);
    let digest = Arc::clone(&config.digest);
    let difficulty = config.difficulty;
    let max_nonce = config.max_nonce;
    async move {
        let prefix = prefix?;
        let solution = tokio::task::spawn_blocking(move || {
            pow::search(&prefix, difficulty, max_nonce, digest.as_ref())
        })
        .await??;
        Ok(solution)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("codec error")]
    Codec(#[from] codec::Error),
    #[error("proof of work error")]
    Pow(#[from] pow::Error),
    #[error("search task failed")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionRequest, WalletKeys};
    use async_trait::async_trait;
    use base64::Engine as _;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const MINER_KEY: &str = "30819f300d06092a864886f70d0101";

    /// Scripted chain server. Once a script runs dry it hands out no
    /// candidates.
    #[derive(Default)]
    struct FakeChain {
        candidates: Mutex<VecDeque<Result<Vec<BlockCandidate>, u16>>>,
        outcomes: Mutex<VecDeque<Result<MiningOutcome, u16>>>,
        submissions: Mutex<Vec<MiningSubmission>>,
        fetches: AtomicUsize,
        hold_submission: Option<Arc<Notify>>,
    }

    impl FakeChain {
        fn with_rounds(rounds: Vec<Vec<BlockCandidate>>, outcomes: Vec<MiningOutcome>) -> Self {
            Self {
                candidates: Mutex::new(rounds.into_iter().map(Ok).collect()),
                outcomes: Mutex::new(outcomes.into_iter().map(Ok).collect()),
                ..Self::default()
            }
        }

        fn submissions(&self) -> Vec<MiningSubmission> {
            self.submissions.lock().unwrap().clone()
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    /// Scripted failure: `0` means the server never answered.
    fn server_error(status: u16) -> client::Error {
        if status == 0 {
            return client::Error::Url(url::ParseError::EmptyHost);
        }
        client::Error::Status {
            status,
            message: "bad gateway".into(),
        }
    }

    #[async_trait]
    impl ChainService for FakeChain {
        async fn fetch_candidates(&self) -> Result<Vec<BlockCandidate>, client::Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.candidates.lock().unwrap().pop_front() {
                Some(Ok(candidates)) => Ok(candidates),
                Some(Err(status)) => Err(server_error(status)),
                None => Ok(vec![]),
            }
        }

        async fn fetch_difficulty(&self) -> Result<u32, client::Error> {
            Ok(2)
        }

        async fn submit(
            &self,
            submission: &MiningSubmission,
        ) -> Result<MiningOutcome, client::Error> {
            self.submissions.lock().unwrap().push(submission.clone());
            if let Some(gate) = &self.hold_submission {
                gate.notified().await;
            }
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Ok(outcome)) => Ok(outcome),
                Some(Err(status)) => Err(server_error(status)),
                None => Ok(accepted()),
            }
        }

        async fn fetch_transactions(&self) -> Result<Vec<Value>, client::Error> {
            Ok(vec![])
        }

        async fn fetch_chain(&self, _query: &str) -> Result<Vec<Value>, client::Error> {
            Ok(vec![])
        }

        async fn generate_wallet(&self) -> Result<WalletKeys, client::Error> {
            Err(server_error(404))
        }

        async fn sign_transaction(
            &self,
            _request: &TransactionRequest,
        ) -> Result<Value, client::Error> {
            Err(server_error(404))
        }

        async fn broadcast_transaction(&self, _transaction: &Value) -> Result<String, client::Error> {
            Err(server_error(404))
        }
    }

    fn candidate(id: &str) -> BlockCandidate {
        let payload = format!("transactions of block {id}");
        BlockCandidate {
            payload: base64::engine::general_purpose::STANDARD.encode(payload),
            id: id.into(),
        }
    }

    fn accepted() -> MiningOutcome {
        MiningOutcome::Accepted {
            server_message: "block mined".into(),
        }
    }

    fn rejected(status_code: u16) -> MiningOutcome {
        MiningOutcome::Rejected {
            status_code,
            server_message: format!("rejected with {status_code}"),
        }
    }

    fn config(difficulty: u32) -> MinerConfig {
        MinerConfig {
            cooldown: Duration::from_millis(1),
            idle_notice_delay: Duration::from_secs(5),
            ..MinerConfig::new(difficulty)
        }
    }

    fn new_miner(chain: &Arc<FakeChain>, config: MinerConfig) -> (Miner, mpsc::UnboundedReceiver<Notice>) {
        let service: Arc<dyn ChainService> = chain.clone();
        Miner::new(service, config)
    }

    fn drain(receiver: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<MiningEvent> {
        let mut events = vec![];
        while let Ok(notice) = receiver.try_recv() {
            events.push(notice.event);
        }
        events
    }

    fn statuses(events: &[MiningEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|event| match event {
                MiningEvent::Status(status) => Some(status.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_classifier_only_forgives_401() {
        let classifier = RejectionClassifier::default();
        assert!(classifier.is_recoverable(401));
        assert!(!classifier.is_recoverable(400));
        assert!(!classifier.is_recoverable(500));
        let classifier = RejectionClassifier::new([401, 409]);
        assert!(classifier.is_recoverable(409));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_on_first_fetch_reports_no_blocks() {
        let chain = Arc::new(FakeChain::default());
        let (miner, mut notices) = new_miner(&chain, config(2));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(chain.submissions().is_empty());
        assert!(session.keep_mining());
        assert!(!session.is_running());
        assert_eq!(miner.session(), session);
        let events = drain(&mut notices);
        assert_eq!(statuses(&events), [NO_BLOCKS_AVAILABLE]);
    }

    #[tokio::test(start_paused = true)]
    async fn submits_proof_for_the_fetched_block() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")]],
            vec![accepted()],
        ));
        let (miner, mut notices) = new_miner(&chain, config(2));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;

        let submissions = chain.submissions();
        assert_eq!(submissions.len(), 1);
        let submission = &submissions[0];
        assert_eq!(submission.block_id, "abc");
        assert_eq!(submission.miner_public_key, MINER_KEY);
        let mut input = MINER_KEY.as_bytes().to_vec();
        input.extend_from_slice(b"transactions of block abc");
        input.extend_from_slice(submission.nonce.as_bytes());
        assert!(sha256::digest(input.as_slice()).starts_with("00"));

        assert_eq!(session.attempts(), 1);
        assert_eq!(session.successes(), 1);
        assert!(session.keep_mining());
        // accepted, cooled down, fetched again and found nothing
        assert_eq!(chain.fetches(), 2);
        let events = drain(&mut notices);
        assert!(matches!(
            &events[0],
            MiningEvent::Log(entry) if entry.is_accepted() && entry.block == "abc"
        ));
        assert_eq!(events[1], MiningEvent::RefreshTransactions);
    }

    #[tokio::test(start_paused = true)]
    async fn recoverable_rejection_keeps_mining() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")]],
            vec![rejected(401)],
        ));
        let (miner, mut notices) = new_miner(&chain, config(1));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.successes(), 0);
        assert!(session.keep_mining());
        assert_eq!(chain.fetches(), 2);
        let events = drain(&mut notices);
        assert!(matches!(
            &events[0],
            MiningEvent::Log(entry) if !entry.is_accepted() && entry.message == "rejected with 401"
        ));
        assert!(statuses(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_rejection_stops_mining() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")], vec![candidate("def")]],
            vec![rejected(500)],
        ));
        let (miner, mut notices) = new_miner(&chain, config(1));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.successes(), 0);
        assert!(!session.keep_mining());
        assert_eq!(chain.fetches(), 1);
        assert_eq!(statuses(&drain(&mut notices)), [MINING_FAILURE]);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_stops_mining() {
        let chain = Arc::new(FakeChain {
            candidates: Mutex::new(VecDeque::from([Ok(vec![candidate("abc")])])),
            outcomes: Mutex::new(VecDeque::from([Err(0)])),
            ..FakeChain::default()
        });
        let (miner, mut notices) = new_miner(&chain, config(1));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert_eq!(session.attempts(), 0);
        assert!(!session.keep_mining());
        assert_eq!(statuses(&drain(&mut notices)), [SERVER_UNREACHABLE]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_stops_mining() {
        let chain = Arc::new(FakeChain {
            candidates: Mutex::new(VecDeque::from([Err(502)])),
            ..FakeChain::default()
        });
        let (miner, mut notices) = new_miner(&chain, config(1));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert!(!session.keep_mining());
        assert!(chain.submissions().is_empty());
        assert_eq!(statuses(&drain(&mut notices)), ["chain server answered 502"]);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_server_on_fetch_is_unreachable() {
        let chain = Arc::new(FakeChain {
            candidates: Mutex::new(VecDeque::from([Err(0)])),
            ..FakeChain::default()
        });
        let (miner, mut notices) = new_miner(&chain, config(1));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert!(!session.keep_mining());
        assert_eq!(statuses(&drain(&mut notices)), [SERVER_UNREACHABLE]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_search_counts_as_failure_without_submitting() {
        let chain = Arc::new(FakeChain::with_rounds(vec![vec![candidate("abc")]], vec![]));
        let config = MinerConfig {
            max_nonce: 0,
            ..config(64)
        };
        let (miner, mut notices) = new_miner(&chain, config);
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert!(chain.submissions().is_empty());
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.successes(), 0);
        assert!(!session.keep_mining());
        let events = drain(&mut notices);
        assert!(matches!(
            &events[0],
            MiningEvent::Log(entry) if entry.nonce.is_none() && !entry.is_accepted()
        ));
        assert_eq!(statuses(&events), [MINING_FAILURE]);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_payload_counts_as_failure() {
        let broken = BlockCandidate {
            payload: "%%%".into(),
            id: "abc".into(),
        };
        let chain = Arc::new(FakeChain::with_rounds(vec![vec![broken]], vec![]));
        let (miner, _notices) = new_miner(&chain, config(1));
        let session = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert!(chain.submissions().is_empty());
        assert_eq!(session.attempts(), 1);
        assert!(!session.keep_mining());
    }

    #[tokio::test(start_paused = true)]
    async fn reports_not_mining_after_pool_runs_dry() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")]],
            vec![accepted()],
        ));
        let (miner, mut notices) = new_miner(&chain, config(1));
        miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        assert!(statuses(&drain(&mut notices)).is_empty());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(statuses(&drain(&mut notices)), [NOT_MINING]);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_voids_pending_not_mining_notice() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")]],
            vec![accepted()],
        ));
        let (miner, mut notices) = new_miner(&chain, config(1));
        miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        let second = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(2)).await;
        assert_eq!(second.generation(), 2);
        tokio::time::sleep(Duration::from_secs(6)).await;
        let mut seen = vec![];
        while let Ok(notice) = notices.try_recv() {
            if let MiningEvent::Status(status) = notice.event {
                seen.push((notice.generation, status));
            }
        }
        assert_eq!(seen, [(2, NO_BLOCKS_AVAILABLE.to_string())]);
    }

    #[tokio::test]
    async fn abandoned_run_cannot_touch_new_session() {
        let gate = Arc::new(Notify::new());
        let chain = Arc::new(FakeChain {
            candidates: Mutex::new(VecDeque::from([Ok(vec![candidate("abc")])])),
            outcomes: Mutex::new(VecDeque::from([Ok(accepted())])),
            hold_submission: Some(gate.clone()),
            ..FakeChain::default()
        });
        let (miner, mut notices) = new_miner(&chain, config(1));
        let first = miner.start(MINER_KEY.into(), StdRng::seed_from_u64(1));
        while chain.submissions().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let second = miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(2));
        gate.notify_one();
        let abandoned = first.await.unwrap();
        assert_eq!(abandoned.attempts(), 0);
        assert_eq!(abandoned.phase(), Phase::Submitting);
        let current = miner.session();
        assert_eq!(current.generation(), 2);
        assert_eq!(current.attempts(), 0);

        drop(second);
        while let Ok(notice) = notices.try_recv() {
            assert_eq!(notice.generation, 2, "stale notice {notice:?}");
        }
    }

    #[tokio::test]
    async fn stop_request_ends_run_after_submission() {
        let gate = Arc::new(Notify::new());
        let chain = Arc::new(FakeChain {
            candidates: Mutex::new(VecDeque::from([
                Ok(vec![candidate("abc")]),
                Ok(vec![candidate("def")]),
            ])),
            hold_submission: Some(gate.clone()),
            ..FakeChain::default()
        });
        let (miner, mut notices) = new_miner(&chain, config(1));
        let run = miner.start(MINER_KEY.into(), StdRng::seed_from_u64(1));
        while chain.submissions().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        miner.stop();
        gate.notify_one();
        let session = run.await.unwrap();
        assert_eq!(session.successes(), 1);
        assert!(!session.keep_mining());
        assert_eq!(chain.fetches(), 1);
        assert_eq!(statuses(&drain(&mut notices)), [MINING_STOPPED]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_cooldown_skips_the_next_block() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")], vec![candidate("def")]],
            vec![accepted(), accepted()],
        ));
        let config = MinerConfig {
            cooldown: Duration::from_millis(1500),
            ..config(1)
        };
        let (miner, mut notices) = new_miner(&chain, config);
        let mut watcher = miner.subscribe();
        let run = miner.start(MINER_KEY.into(), StdRng::seed_from_u64(1));
        watcher
            .wait_for(|session| session.successes() == 1)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        miner.stop();
        let session = run.await.unwrap();
        assert_eq!(chain.submissions().len(), 1);
        assert_eq!(chain.fetches(), 1);
        assert_eq!(session.successes(), 1);
        assert!(!session.keep_mining());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(miner.session(), session);
        assert_eq!(statuses(&drain(&mut notices)), [MINING_STOPPED]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_voids_pending_not_mining_notice() {
        let chain = Arc::new(FakeChain::with_rounds(
            vec![vec![candidate("abc")]],
            vec![accepted()],
        ));
        let (miner, mut notices) = new_miner(&chain, config(1));
        miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(1)).await;
        miner.stop();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(statuses(&drain(&mut notices)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn candidate_choice_follows_the_random_source() {
        let pool = vec![candidate("a"), candidate("b"), candidate("c")];
        let mut picks = vec![];
        for _ in 0..2 {
            let chain = Arc::new(FakeChain::with_rounds(vec![pool.clone()], vec![accepted()]));
            let (miner, _notices) = new_miner(&chain, config(0));
            miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(42)).await;
            picks.push(chain.submissions()[0].block_id.clone());
        }
        assert_eq!(picks[0], picks[1]);
        assert!(["a", "b", "c"].contains(&picks[0].as_str()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn successes_never_exceed_attempts(script in proptest::collection::vec(0u8..3, 1..8)) {
            let outcomes: Vec<_> = script
                .iter()
                .map(|kind| match kind {
                    0 => accepted(),
                    1 => rejected(401),
                    _ => rejected(500),
                })
                .collect();
            let rounds = vec![vec![candidate("abc"), candidate("def")]; outcomes.len()];
            let chain = Arc::new(FakeChain::with_rounds(rounds, outcomes));
            let (miner, _notices) = new_miner(&chain, config(0));
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .start_paused(true)
                .build()
                .unwrap();
            let mut watcher = miner.subscribe();
            let session = runtime.block_on(miner.prepare(MINER_KEY.into(), StdRng::seed_from_u64(7)));
            let latest = watcher.borrow_and_update().clone();
            prop_assert!(session.successes() <= session.attempts());
            prop_assert_eq!(session.attempts() as usize, chain.submissions().len());
            prop_assert_eq!(&latest, &session);
            let fatal = script.iter().position(|kind| *kind == 2);
            if let Some(fatal) = fatal {
                prop_assert_eq!(session.attempts() as usize, fatal + 1);
                prop_assert!(!session.keep_mining());
            } else {
                prop_assert_eq!(session.attempts() as usize, script.len());
                prop_assert!(session.keep_mining());
            }
        }
    }
}
