//! 1 日 1 回だけ通知するための判定手順。
//!
//! 1 回の呼び出しで以下を順に実行し、どこかで条件を満たさなければその場で終了する。
//!
//! 1. 今日の送信済み記録があるか確認する
//! 2. 検索結果を取得する
//! 3. 先頭 (最新) のポストを選ぶ
//! 4. そのポストの投稿日が今日か確認する
//! 5. 通知を送る
//! 6. 送信済み記録を書き込む
//!
//! 呼び出し間で共有する状態はストアにしか持たない。再試行は行わず、
//! 次回のスケジュール実行に任せる。

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::capability::{
    BoxError, DedupStore, NotifyError, Notifier, ScrapeError, Scraper, StoreError,
};
use crate::date::DateBoundary;
use crate::post::SearchQuery;
use crate::snowflake::InvalidId;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to check sent record for {date}")]
    StoreUnavailable {
        date: NaiveDate,
        #[source]
        source: StoreError,
    },
    #[error("Failed to scrape search results")]
    ScrapeFailed(#[source] ScrapeError),
    #[error("Search query was rejected")]
    QueryInvalid(#[source] ScrapeError),
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error("Failed to send post {post_id} (status: {status:?})")]
    NotifyFailed {
        post_id: String,
        status: Option<u16>,
        #[source]
        source: Option<NotifyError>,
    },
    #[error("Post {post_id} was sent but recording {date} failed")]
    RecordFailed {
        date: NaiveDate,
        post_id: String,
        #[source]
        source: StoreError,
    },
}

/// 1 回の実行結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 今日の分は送信済み
    AlreadySent { date: NaiveDate },
    /// 検索結果が 0 件
    NothingFound,
    /// 最新のポストが今日より前のもの
    NoNewPost {
        latest_id: String,
        published_at: DateTime<Utc>,
    },
    /// 通知して記録した
    Notified { date: NaiveDate, post_id: String },
}

/// 外部呼び出しごとのタイムアウト。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub scrape: Duration,
    pub store: Duration,
    pub notify: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            scrape: Duration::from_secs(30),
            store: Duration::from_secs(10),
            notify: Duration::from_secs(10),
        }
    }
}

pub struct NotificationPipeline<S, D, N> {
    scraper: S,
    store: D,
    notifier: N,
    query: SearchQuery,
    boundary: DateBoundary,
    deadlines: Deadlines,
}

impl<S, D, N> NotificationPipeline<S, D, N>
where
    S: Scraper,
    D: DedupStore,
    N: Notifier,
{
    /// JST 境界と既定のタイムアウトでパイプラインを作成する。
    pub fn new(scraper: S, store: D, notifier: N, query: SearchQuery) -> Self {
        Self {
            scraper,
            store,
            notifier,
            query,
            boundary: DateBoundary::jst(),
            deadlines: Deadlines::default(),
        }
    }

    pub fn with_boundary(mut self, boundary: DateBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// 現在時刻を基準に 1 回実行する。
    pub async fn run(&self) -> Result<Outcome, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// `now` を基準に 1 回実行する。
    ///
    /// 今日の日付はここで 1 度だけ求め、確認と記録の両方に使う。
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<Outcome, PipelineError> {
        let today = self.boundary.date_at(now);

        let already_sent = with_deadline(
            self.deadlines.store,
            self.store.exists(today),
            StoreError::Unavailable,
        )
        .await
        .map_err(|source| {
            warn!(date = %today, error = %source, "Failed to check sent record");
            PipelineError::StoreUnavailable {
                date: today,
                source,
            }
        })?;

        if already_sent {
            info!(date = %today, "Today's post has already been sent");
            return Ok(Outcome::AlreadySent { date: today });
        }

        let posts = with_deadline(
            self.deadlines.scrape,
            self.scraper.fetch(&self.query),
            ScrapeError::FetchFailed,
        )
        .await
        .map_err(|e| {
            warn!(
                keyword = %self.query.keyword(),
                author_id = ?self.query.author_id(),
                error = %e,
                "Failed to search posts"
            );
            match e {
                ScrapeError::QueryInvalid(_) => PipelineError::QueryInvalid(e),
                ScrapeError::FetchFailed(_) => PipelineError::ScrapeFailed(e),
            }
        })?;

        let found = posts.len();
        // 先頭が最新という前提で、それ以外は見ない
        let Some(latest) = posts.into_iter().next() else {
            info!(keyword = %self.query.keyword(), "No posts found");
            return Ok(Outcome::NothingFound);
        };

        let published_at = latest.published_at().map_err(|e| {
            warn!(
                post_id = %latest.id(),
                url = %latest.url(),
                "Failed to derive publish time"
            );
            PipelineError::from(e)
        })?;

        if !self.boundary.is_same_date_as(published_at, today) {
            info!(
                date = %today,
                post_id = %latest.id(),
                published_at = %self.boundary.to_target_zone(published_at),
                found,
                "Today's post has not been found yet"
            );
            return Ok(Outcome::NoNewPost {
                latest_id: latest.id().to_string(),
                published_at,
            });
        }

        let status = match with_deadline(
            self.deadlines.notify,
            self.notifier.send(&latest),
            NotifyError::Transport,
        )
        .await
        {
            Ok(status) if status < 400 => status,
            Ok(status) => {
                warn!(post_id = %latest.id(), status, "Notifier rejected the post");
                return Err(PipelineError::NotifyFailed {
                    post_id: latest.id().to_string(),
                    status: Some(status),
                    source: None,
                });
            }
            Err(e) => {
                warn!(post_id = %latest.id(), error = %e, "Failed to send post");
                return Err(PipelineError::NotifyFailed {
                    post_id: latest.id().to_string(),
                    status: None,
                    source: Some(e),
                });
            }
        };
        info!(post_id = %latest.id(), url = %latest.url(), status, "Post sent");

        if let Err(source) = with_deadline(
            self.deadlines.store,
            self.store.record(today, latest.id()),
            StoreError::WriteFailed,
        )
        .await
        {
            error!(
                date = %today,
                post_id = %latest.id(),
                error = %source,
                "Post was sent but not recorded; the next run may send it again"
            );
            return Err(PipelineError::RecordFailed {
                date: today,
                post_id: latest.id().to_string(),
                source,
            });
        }

        info!(date = %today, post_id = %latest.id(), "Sent record saved");
        Ok(Outcome::Notified {
            date: today,
            post_id: latest.id().to_string(),
        })
    }
}

/// `future` を `deadline` 以内に完了させる。超過した場合は `on_timeout` でエラーに変換する。
async fn with_deadline<T, E>(
    deadline: Duration,
    future: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(BoxError) -> E,
) -> Result<T, E> {
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(elapsed) => Err(on_timeout(Box::new(elapsed))),
    }
}
