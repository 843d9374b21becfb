//! Hand-written fakes for the runtime capabilities.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use soundgate_core::config::ChatRef;
use soundgate_core::fetch::{FetchError, FetchFailure, FetchedArtifact, MediaFetcher};
use soundgate_core::membership::{LookupError, MemberRole, MembershipLookup, MembershipOracle};
use soundgate_core::registry::{RegistryError, UserStore};
use soundgate_runtime::{AudioAttachment, ChoiceKeyboard, DocumentAttachment, Messenger, SessionMachine};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GROUP: &str = "tracks";

/// Something the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat: ChatRef,
        text: String,
    },
    Choices {
        chat: ChatRef,
        text: String,
        keyboard: ChoiceKeyboard,
    },
    Audio {
        chat: ChatRef,
        audio: AudioAttachment,
        file_present: bool,
    },
    Document {
        chat: ChatRef,
        document: DocumentAttachment,
    },
}

impl Sent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } | Self::Choices { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&ChoiceKeyboard> {
        match self {
            Self::Choices { keyboard, .. } => Some(keyboard),
            _ => None,
        }
    }
}

/// Records every outbound message; can be told to fail.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    fail_audio: Mutex<bool>,
    unreachable: Mutex<HashSet<i64>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }

    pub fn fail_audio(&self) {
        if let Ok(mut flag) = self.fail_audio.lock() {
            *flag = true;
        }
    }

    pub fn make_unreachable(&self, user_id: i64) {
        if let Ok(mut set) = self.unreachable.lock() {
            set.insert(user_id);
        }
    }

    fn check_reachable(&self, chat: &ChatRef) -> Result<()> {
        let blocked = match chat {
            ChatRef::Id(id) => self.unreachable.lock().map(|s| s.contains(id)).unwrap_or(false),
            ChatRef::Username(_) => false,
        };
        if blocked {
            Err(anyhow!("Forbidden: bot was blocked by the user"))
        } else {
            Ok(())
        }
    }

    fn record(&self, item: Sent) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(item);
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat: &ChatRef, text: &str) -> Result<()> {
        self.check_reachable(chat)?;
        self.record(Sent::Text {
            chat: chat.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_choices(&self, chat: &ChatRef, text: &str, keyboard: &ChoiceKeyboard) -> Result<()> {
        self.check_reachable(chat)?;
        self.record(Sent::Choices {
            chat: chat.clone(),
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn send_audio(&self, chat: &ChatRef, audio: &AudioAttachment) -> Result<()> {
        self.check_reachable(chat)?;
        if self.fail_audio.lock().map(|f| *f).unwrap_or(false) {
            return Err(anyhow!("Request Entity Too Large"));
        }
        self.record(Sent::Audio {
            chat: chat.clone(),
            audio: audio.clone(),
            file_present: audio.path.exists(),
        });
        Ok(())
    }

    async fn send_document(&self, chat: &ChatRef, document: &DocumentAttachment) -> Result<()> {
        self.check_reachable(chat)?;
        self.record(Sent::Document {
            chat: chat.clone(),
            document: document.clone(),
        });
        Ok(())
    }
}

/// Canned answer of the membership lookup.
#[derive(Debug, Clone)]
pub enum Answer {
    Role(MemberRole),
    Api(String),
    Network,
}

pub struct FakeLookup {
    answer: Mutex<Answer>,
    calls: AtomicUsize,
}

impl FakeLookup {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer: Mutex::new(answer),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answer_with(&self, answer: Answer) {
        if let Ok(mut current) = self.answer.lock() {
            *current = answer;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipLookup for FakeLookup {
    async fn member_role(&self, _group: &ChatRef, _user_id: i64) -> Result<MemberRole, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answer
            .lock()
            .map(|a| a.clone())
            .unwrap_or(Answer::Network);
        match answer {
            Answer::Role(role) => Ok(role),
            Answer::Api(message) => Err(LookupError::Api(message)),
            Answer::Network => Err(LookupError::Network("connection reset".to_string())),
        }
    }
}

/// Writes a small file per fetch, or fails with a fixed class.
pub struct FakeFetcher {
    dir: PathBuf,
    failure: Mutex<Option<FetchFailure>>,
    urls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            failure: Mutex::new(None),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, kind: FetchFailure) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(kind);
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn files_left(&self) -> usize {
        std::fs::read_dir(&self.dir).map(Iterator::count).unwrap_or(0)
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedArtifact, FetchError> {
        let index = {
            let mut urls = self
                .urls
                .lock()
                .map_err(|_| FetchError::new(FetchFailure::Unknown, "poisoned"))?;
            urls.push(url.to_string());
            urls.len()
        };
        if let Some(kind) = self.failure.lock().ok().and_then(|f| *f) {
            return Err(FetchError::new(kind, "fake failure"));
        }
        let path = self.dir.join(format!("sg-{index}.mp3"));
        std::fs::write(&path, b"ID3")
            .map_err(|e| FetchError::new(FetchFailure::Unknown, e.to_string()))?;
        Ok(FetchedArtifact::new(path, "Track Name", Some("Artist".to_string()), 3, Some(180)))
    }
}

/// In-memory registry counting every call.
#[derive(Default)]
pub struct MemoryUserStore {
    ids: Mutex<Vec<i64>>,
    calls: AtomicUsize,
    failures_left: AtomicUsize,
}

impl MemoryUserStore {
    pub fn with_users(ids: &[i64]) -> Self {
        Self {
            ids: Mutex::new(ids.to_vec()),
            ..Self::default()
        }
    }

    /// Fail the next `count` registrations with an I/O error.
    pub fn failing(count: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(count),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user_ids_now(&self) -> Vec<i64> {
        self.ids.lock().map(|ids| ids.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn register_if_absent(&self, user_id: i64) -> Result<bool, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RegistryError::Io(std::io::Error::other("disk full")));
        }
        let mut ids = self
            .ids
            .lock()
            .map_err(|_| RegistryError::Io(std::io::Error::other("poisoned")))?;
        if ids.contains(&user_id) {
            Ok(false)
        } else {
            ids.push(user_id);
            Ok(true)
        }
    }

    async fn user_ids(&self) -> Vec<i64> {
        self.ids.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    async fn count(&self) -> usize {
        self.ids.lock().map(|ids| ids.len()).unwrap_or(0)
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("users.csv")
    }
}

/// A machine wired to fakes.
pub struct Harness {
    pub machine: SessionMachine,
    pub messenger: Arc<RecordingMessenger>,
    pub lookup: Arc<FakeLookup>,
    pub fetcher: Arc<FakeFetcher>,
    pub registry: Arc<MemoryUserStore>,
    _artifacts: tempfile::TempDir,
}

impl Harness {
    pub fn new(answer: Answer) -> std::io::Result<Self> {
        let artifacts = tempfile::tempdir()?;
        let messenger = Arc::new(RecordingMessenger::default());
        let lookup = Arc::new(FakeLookup::new(answer));
        let fetcher = Arc::new(FakeFetcher::new(artifacts.path()));
        let registry = Arc::new(MemoryUserStore::default());
        let oracle = MembershipOracle::new(lookup.clone(), ChatRef::Username(GROUP.to_string()));
        let machine = SessionMachine::new(
            messenger.clone(),
            oracle,
            fetcher.clone(),
            registry.clone(),
        );
        Ok(Self {
            machine,
            messenger,
            lookup,
            fetcher,
            registry,
            _artifacts: artifacts,
        })
    }
}
