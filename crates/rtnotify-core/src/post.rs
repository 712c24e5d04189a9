//! スクレイピング結果のポストと検索条件。

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::snowflake::{self, InvalidId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Post URL must not be empty (id: {id:?})")]
pub struct EmptyUrl {
    pub id: String,
}

/// 検索結果から取り出した 1 件のポスト。
///
/// 作成後は変更できない。投稿日時は表示テキストを信用せず、常に `id` から導出する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Snowflake 形式の数値 ID
    id: String,
    /// ポストの URL (クエリ文字列なし)
    url: String,
    body: String,
    author_name: String,
    author_id: String,
    /// アイコン画像の URL
    icon: String,
}

impl Post {
    /// ID と URL からポストを作成する。URL が空の場合はエラー。
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Result<Self, EmptyUrl> {
        let id = id.into();
        let url = url.into();
        if url.trim().is_empty() {
            return Err(EmptyUrl { id });
        }

        Ok(Self {
            id,
            url,
            body: String::new(),
            author_name: String::new(),
            author_id: String::new(),
            icon: String::new(),
        })
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_author(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_id = id.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// ID から導出した投稿日時を返す。
    pub fn published_at(&self) -> Result<DateTime<Utc>, InvalidId> {
        snowflake::decode(&self.id)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Search keyword must not be empty")]
pub struct InvalidQuery;

/// スクレイパーに渡す検索条件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    author_id: Option<String>,
}

impl SearchQuery {
    /// 検索条件を作成する。
    ///
    /// キーワードが空白のみの場合はエラー。空の投稿者 ID は未指定として扱う。
    pub fn new(
        keyword: impl Into<String>,
        author_id: Option<impl Into<String>>,
    ) -> Result<Self, InvalidQuery> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return Err(InvalidQuery);
        }

        let author_id: Option<String> = author_id
            .map(Into::into)
            .filter(|id| !id.trim().is_empty());

        Ok(Self { keyword, author_id })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }
}
