//! パイプラインのテスト用インメモリ実装。

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rtnotify_core::{
    DedupStore, Notifier, NotifyError, Post, ScrapeError, Scraper, SearchQuery, StoreError,
};

pub fn post(id: &str) -> Post {
    Post::new(id, format!("https://x.com/acme/status/{id}"))
        .unwrap()
        .with_body(format!("launch {id}"))
        .with_author("Acme", "acme")
        .with_icon("https://example.com/icon.png")
}

pub fn query() -> SearchQuery {
    SearchQuery::new("launch", Some("acme")).unwrap()
}

#[derive(Clone)]
pub enum ScrapeBehavior {
    Posts(Vec<Post>),
    QueryInvalid,
    Fail,
    Hang,
}

#[derive(Clone)]
pub struct FakeScraper {
    behavior: ScrapeBehavior,
    calls: Arc<AtomicUsize>,
}

impl FakeScraper {
    pub fn new(behavior: ScrapeBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn returning(posts: Vec<Post>) -> Self {
        Self::new(ScrapeBehavior::Posts(posts))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn fetch(&self, _query: &SearchQuery) -> Result<Vec<Post>, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ScrapeBehavior::Posts(posts) => Ok(posts.clone()),
            ScrapeBehavior::QueryInvalid => {
                Err(ScrapeError::QueryInvalid("keyword is empty".to_string()))
            }
            ScrapeBehavior::Fail => Err(ScrapeError::FetchFailed(Box::new(
                std::io::Error::other("connection reset"),
            ))),
            ScrapeBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(vec![])
            }
        }
    }
}

/// 条件付き書き込みをするインメモリのストア。
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<NaiveDate, String>>>,
    fail_exists: bool,
    fail_record: bool,
}

impl MemoryStore {
    pub fn failing_exists() -> Self {
        Self {
            fail_exists: true,
            ..Default::default()
        }
    }

    pub fn failing_record() -> Self {
        Self {
            fail_record: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, date: NaiveDate, post_id: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(date, post_id.to_string());
    }

    pub fn records(&self) -> HashMap<NaiveDate, String> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        if self.fail_exists {
            return Err(StoreError::Unavailable(Box::new(std::io::Error::other(
                "store is down",
            ))));
        }
        Ok(self.records.lock().unwrap().contains_key(&date))
    }

    async fn record(&self, date: NaiveDate, post_id: &str) -> Result<(), StoreError> {
        if self.fail_record {
            return Err(StoreError::WriteFailed(Box::new(std::io::Error::other(
                "throttled",
            ))));
        }
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&date) {
            return Err(StoreError::AlreadyExists(date));
        }
        records.insert(date, post_id.to_string());
        Ok(())
    }
}

#[derive(Clone)]
pub struct RecordingNotifier {
    status: u16,
    transport_error: bool,
    sent: Arc<Mutex<Vec<Post>>>,
}

impl RecordingNotifier {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            transport_error: false,
            sent: Arc::default(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            transport_error: true,
            ..Self::with_status(0)
        }
    }

    /// 送信を試みたポスト (失敗を含む)。
    pub fn sent(&self) -> Vec<Post> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, post: &Post) -> Result<u16, NotifyError> {
        self.sent.lock().unwrap().push(post.clone());
        // 並行実行のテストで他の実行に制御を渡す
        tokio::task::yield_now().await;
        if self.transport_error {
            return Err(NotifyError::Transport(Box::new(std::io::Error::other(
                "connection refused",
            ))));
        }
        Ok(self.status)
    }
}
