//! Yahoo! リアルタイム検索の結果ページからポストを取り出す。

use std::time::Duration;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use rtnotify_core::{EmptyUrl, Post, ScrapeError, Scraper, SearchQuery};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

/// 検索結果の各ポストのコンテナ
const CONTAINER_SELECTOR: &str = "div[class^='Tweet_TweetContainer']";
const ICON_SELECTOR: &str = "img";
const BODY_SELECTOR: &str = "div[class^='Tweet_bodyContainer'] div[class^='Tweet_body']";
const AUTHOR_NAME_SELECTOR: &str = "span[class^='Tweet_authorName__']";
const AUTHOR_ID_SELECTOR: &str = "a[class^='Tweet_authorID__']";
const PERMALINK_SELECTOR: &str = "time[class^='Tweet_time'] a";

/// 検索語に続けて投稿者を絞り込む演算子
const AUTHOR_OPERATOR: &str = "id:";

#[derive(Error, Debug, PartialEq, Eq)]
enum EntryError {
    #[error("Post URL not found")]
    MissingUrl(#[from] EmptyUrl),
    #[error("Post ID not found in URL: {0}")]
    MissingId(String),
}

/// 結果ページの解析に使うセレクタ一式。
pub struct PostSelectors {
    container: Selector,
    icon: Selector,
    body: Selector,
    author_name: Selector,
    author_id: Selector,
    permalink: Selector,
    status_id: Regex,
}

impl PostSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            container: selector(CONTAINER_SELECTOR)?,
            icon: selector(ICON_SELECTOR)?,
            body: selector(BODY_SELECTOR)?,
            author_name: selector(AUTHOR_NAME_SELECTOR)?,
            author_id: selector(AUTHOR_ID_SELECTOR)?,
            permalink: selector(PERMALINK_SELECTOR)?,
            status_id: Regex::new(r"/status/(\d+)").context("Invalid status id pattern")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid CSS selector {css:?}: {e:?}"))
}

/// リアルタイム検索のスクレイパー。
pub struct RealtimeSearch {
    http_client: reqwest::Client,
    endpoint: Url,
    selectors: PostSelectors,
}

impl RealtimeSearch {
    /// 新しい RealtimeSearch を作成する。
    ///
    /// # Arguments
    /// * `endpoint` - 検索ページの URL
    /// * `timeout` - 1 リクエストあたりのタイムアウト
    /// * `user_agent` - リクエストに付与する User-Agent
    pub fn new(endpoint: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).context("Invalid search endpoint")?;
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client for realtime search")?;

        Ok(Self {
            http_client,
            endpoint,
            selectors: PostSelectors::new()?,
        })
    }
}

#[async_trait]
impl Scraper for RealtimeSearch {
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Post>, ScrapeError> {
        let url = build_request_url(&self.endpoint, query);
        debug!(url = %url, "Searching posts");

        let html = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ScrapeError::FetchFailed(Box::new(e)))?
            .text()
            .await
            .map_err(|e| ScrapeError::FetchFailed(Box::new(e)))?;

        let posts = parse_posts(&html, &self.selectors);
        debug!(url = %url, count = posts.len(), "Search results parsed");

        Ok(posts)
    }
}

/// 検索語と投稿者から検索 URL を組み立てる。
///
/// 投稿者を指定した場合は `p=<keyword> id:<author>` となる。
pub fn build_request_url(endpoint: &Url, query: &SearchQuery) -> Url {
    let mut terms = query.keyword().to_string();
    if let Some(author_id) = query.author_id() {
        terms.push(' ');
        terms.push_str(AUTHOR_OPERATOR);
        terms.push_str(author_id);
    }

    let mut url = endpoint.clone();
    url.query_pairs_mut().clear().append_pair("p", &terms);
    url
}

/// 結果ページからポストをページ上の順 (新しい順) に取り出す。
///
/// 解析できなかったエントリはログに残して読み飛ばす。
pub fn parse_posts(html: &str, selectors: &PostSelectors) -> Vec<Post> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.container)
        .enumerate()
        .filter_map(|(index, element)| match parse_post(element, selectors) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!(index, error = %e, "Failed to parse a post, skipping");
                None
            }
        })
        .collect()
}

fn parse_post(element: ElementRef<'_>, selectors: &PostSelectors) -> Result<Post, EntryError> {
    let href = first_attr(element, &selectors.permalink, "href");
    // トラッキング用のクエリ文字列を除く
    let url = href.split('?').next().unwrap_or_default();

    let id = selectors
        .status_id
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    let post = Post::new(id, url)?;
    if post.id().is_empty() {
        return Err(EntryError::MissingId(post.url().to_string()));
    }

    Ok(post
        .with_body(first_text(element, &selectors.body))
        .with_author(
            first_text(element, &selectors.author_name),
            first_text(element, &selectors.author_id),
        )
        .with_icon(first_attr(element, &selectors.icon, "src")))
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn first_attr(element: ElementRef<'_>, selector: &Selector, attr: &str) -> String {
    element
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}
