//! リアルタイム検索の新着ポストを 1 日 1 回だけ Webhook に通知するためのコアロジック。
//!
//! スクレイパー・重複排除ストア・通知先はトレイトとして抽象化しており、
//! 実装はバイナリクレート側で提供する。

pub mod capability;
pub mod date;
pub mod pipeline;
pub mod post;
pub mod snowflake;

pub use capability::{DedupStore, Notifier, NotifyError, ScrapeError, Scraper, StoreError};
pub use date::DateBoundary;
pub use pipeline::{Deadlines, NotificationPipeline, Outcome, PipelineError};
pub use post::{EmptyUrl, InvalidQuery, Post, SearchQuery};
pub use snowflake::InvalidId;
