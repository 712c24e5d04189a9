//! Snowflake 形式の ID から投稿日時を復元する。

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Snowflake のカスタムエポック (Unix エポックからのミリ秒)。
pub const EPOCH_MILLIS: i64 = 1_288_834_974_657;

/// マシン ID とシーケンス番号に使われる下位ビット数。
const TIMESTAMP_SHIFT: u32 = 22;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid snowflake id: {id:?}")]
pub struct InvalidId {
    pub id: String,
}

/// ID 文字列を投稿日時 (UTC, ミリ秒精度) に変換する。
///
/// 64 ビット符号付き整数として解釈できない ID は [`InvalidId`] になる。
/// 負の ID は算術シフトでエポックより前の時刻になる。
pub fn decode(id: &str) -> Result<DateTime<Utc>, InvalidId> {
    let invalid = || InvalidId { id: id.to_string() };

    let raw: i64 = id.parse().map_err(|_| invalid())?;
    // シフト後は ±2^41 に収まるので加算は溢れない
    let millis = (raw >> TIMESTAMP_SHIFT) + EPOCH_MILLIS;

    DateTime::from_timestamp_millis(millis).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn decode_known_id() {
        let published_at = decode("1362542178461196288").unwrap();
        let expected = Utc
            .with_ymd_and_hms(2021, 2, 18, 23, 19, 4)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(811))
            .unwrap();
        assert_eq!(published_at, expected);
    }

    #[test]
    fn decode_is_deterministic() {
        let id = "1741836671906742272";
        assert_eq!(decode(id).unwrap(), decode(id).unwrap());
    }

    #[test]
    fn decode_zero_is_epoch() {
        let published_at = decode("0").unwrap();
        assert_eq!(published_at.timestamp_millis(), EPOCH_MILLIS);
    }

    #[test]
    fn low_bits_do_not_affect_time() {
        // 下位 22 ビットが異なっても同じミリ秒になる
        let base: i64 = (1_362_542_178_461_196_288 >> 22) << 22;
        let a = decode(&base.to_string()).unwrap();
        let b = decode(&(base | 0x3F_FFFF).to_string()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ordering_is_preserved() {
        let older: i64 = 1_362_542_178_461_196_288;
        let newer = older + (1 << 22) * 1000;
        let older_at = decode(&older.to_string()).unwrap();
        let newer_at = decode(&newer.to_string()).unwrap();
        assert!(older_at <= newer_at);
        assert_eq!((newer_at - older_at).num_milliseconds(), 1000);
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(
            decode("abc"),
            Err(InvalidId {
                id: "abc".to_string()
            })
        );
        assert!(decode("").is_err());
        assert!(decode("123abc").is_err());
        assert!(decode("1.5").is_err());
    }

    #[test]
    fn rejects_values_beyond_i64() {
        assert!(decode("9223372036854775808").is_err());
        assert!(decode(&u64::MAX.to_string()).is_err());
    }

    #[test]
    fn accepts_full_i64_range() {
        assert!(decode(&i64::MAX.to_string()).is_ok());
        assert!(decode(&i64::MIN.to_string()).is_ok());
    }

    #[test]
    fn negative_id_is_before_epoch() {
        // -4194304 >> 22 == -1
        let published_at = decode("-4194304").unwrap();
        assert_eq!(published_at.timestamp_millis(), EPOCH_MILLIS - 1);
    }
}
