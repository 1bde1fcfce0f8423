//! In-memory transport for channel tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use ojlive_core::events::{ChannelEvent, ChannelEventReceiver};
use ojlive_sdk::objects::{
    Language, ProblemId, SourceCode, SubmissionHandle, SubmissionId, SubmissionStatus, UserId,
};
use ojlive_sdk::transport::{EventTransport, RawEventStream, StreamTarget, TransportError};
use time::OffsetDateTime;
use tokio::sync::mpsc;

pub type Feed = mpsc::UnboundedSender<Result<String, TransportError>>;

enum Script {
    Stream(mpsc::UnboundedReceiver<Result<String, TransportError>>),
    Refuse(TransportError),
    Hang,
}

/// Counts streams handed out and streams released.
#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

struct ReleaseGuard(Arc<Counters>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport that plays back scripted streams, one per `open`.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<VecDeque<Script>>,
    pub counters: Arc<Counters>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a stream; payloads sent on the returned feed are delivered in
    /// order.  Dropping the feed ends the stream.
    pub fn feed(&self) -> Feed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripts.lock().unwrap().push_back(Script::Stream(rx));
        tx
    }

    /// Queue a refused `open`.
    pub fn refuse(&self, error: TransportError) {
        self.scripts.lock().unwrap().push_back(Script::Refuse(error));
    }

    /// Queue an `open` that never resolves.
    pub fn hang(&self) {
        self.scripts.lock().unwrap().push_back(Script::Hang);
    }
}

#[async_trait]
impl EventTransport for FakeTransport {
    async fn open(&self, _target: &StreamTarget) -> Result<RawEventStream, TransportError> {
        let script = self.scripts.lock().unwrap().pop_front();
        let rx = match script {
            Some(Script::Stream(rx)) => rx,
            Some(Script::Refuse(error)) => return Err(error),
            Some(Script::Hang) => return std::future::pending().await,
            None => return Err(TransportError::Connection("nothing scripted".to_owned())),
        };
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseGuard(Arc::clone(&self.counters));
        Ok(stream::unfold((rx, guard), |(mut rx, guard)| async move {
            let item = rx.recv().await?;
            Some((item, (rx, guard)))
        })
        .boxed())
    }
}

pub fn send(feed: &Feed, payload: &str) {
    feed.send(Ok(payload.to_owned())).unwrap();
}

pub fn handle(id: &str) -> SubmissionHandle {
    SubmissionHandle {
        id: SubmissionId::from(id),
        problem_id: ProblemId::from("P1"),
        user_id: UserId::from("U1"),
        language: Language::from("python"),
        source: SourceCode::new("print(1)").unwrap(),
        status: SubmissionStatus::Pending,
        created_at: OffsetDateTime::now_utc(),
    }
}

/// Every event up to and including `Closed`.
pub async fn collect(mut rx: ChannelEventReceiver) -> Vec<ChannelEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

pub fn count_updates(events: &[ChannelEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ChannelEvent::Update(_)))
        .count()
}

pub fn count_completes(events: &[ChannelEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ChannelEvent::Complete(_)))
        .count()
}
