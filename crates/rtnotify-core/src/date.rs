//! 固定オフセットのタイムゾーンにおける日付境界の判定。

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// JST (UTC+9) のオフセット秒数。
const JST_OFFSET_SECONDS: i32 = 9 * 60 * 60;

/// 「今日」がいつかを決める固定オフセットのタイムゾーン。
///
/// 夏時間の規則を持たないゾーンだけを扱うため、タイムゾーンデータベースは参照しない。
/// 日付の比較はすべてこの型を経由させ、オフセットの適用を一箇所にまとめる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBoundary {
    offset: FixedOffset,
}

impl DateBoundary {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// 日本標準時 (UTC+9) の境界を返す。
    pub fn jst() -> Self {
        Self::new(FixedOffset::east_opt(JST_OFFSET_SECONDS).expect("JST offset is within range"))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// UTC の時刻を対象ゾーンの時刻に変換する。
    pub fn to_target_zone(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// 現在の対象ゾーンの日付を取得する。
    pub fn current_date(&self) -> NaiveDate {
        self.date_at(Utc::now())
    }

    /// 指定時刻における対象ゾーンの日付を取得する。
    pub fn date_at(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_target_zone(now).date_naive()
    }

    /// `instant` の対象ゾーンでの日付が `date` と一致するかを判定する。
    pub fn is_same_date_as(&self, instant: DateTime<Utc>, date: NaiveDate) -> bool {
        self.date_at(instant) == date
    }
}

impl Default for DateBoundary {
    fn default() -> Self {
        Self::jst()
    }
}
