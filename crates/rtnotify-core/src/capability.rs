//! パイプラインが利用する外部機能のトレイト定義。
//!
//! 本番実装はそれぞれ 1 つずつバイナリクレートにあり、テストではインメモリの実装に差し替える。

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::post::{Post, SearchQuery};

/// 下位のエラーを保持するための型。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid search query: {0}")]
    QueryInvalid(String),
    #[error("Failed to fetch search results")]
    FetchFailed(#[source] BoxError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Dedup store is unavailable")]
    Unavailable(#[source] BoxError),
    #[error("Failed to write dedup record")]
    WriteFailed(#[source] BoxError),
    #[error("Dedup record for {0} already exists")]
    AlreadyExists(NaiveDate),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to deliver notification")]
    Transport(#[source] BoxError),
}

/// 検索結果を取得する。
#[async_trait]
pub trait Scraper: Send + Sync {
    /// 検索結果を新しい順に返す。
    ///
    /// 並び順は検証しない。順序が崩れていると鮮度判定が誤る。
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Post>, ScrapeError>;
}

/// 日付ごとの送信済み記録を保持するストア。
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn exists(&self, date: NaiveDate) -> Result<bool, StoreError>;

    /// 送信済み記録を書き込む。
    ///
    /// 同じ日付の記録が既にある場合は [`StoreError::AlreadyExists`] を返す条件付き書き込みにすること。
    async fn record(&self, date: NaiveDate, post_id: &str) -> Result<(), StoreError>;
}

/// ポストを通知先に送る。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 送信して HTTP ステータスコードを返す。400 以上の判定は呼び出し側で行う。
    async fn send(&self, post: &Post) -> Result<u16, NotifyError>;
}
