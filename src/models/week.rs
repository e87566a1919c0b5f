//! # 주차 키(WeekKey) 모델
//!
//! ISO-8601 주차 `(isoYear, isoWeek)`를 나타내는 값 타입입니다.
//! 내부적으로는 해당 주의 월요일 날짜를 저장하므로,
//! 파생된 `Ord`가 곧 시간순 정렬이 됩니다.
//!
//! ## 문자열 표현
//! `2025-W07`처럼 연도는 네 자리, 주차는 두 자리로 채웁니다.
//! 이렇게 하면 DB에서 `ORDER BY week_key`의 사전순 정렬이 시간순과 일치합니다.
//! 네 자리를 넘는 연도는 이 순서를 깨뜨리므로 ISO 연도 1..=9999만 다룹니다.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{Sqlite, SqliteTypeInfo},
    Database, Decode, Encode, Type,
};
use thiserror::Error;

/// ISO 주차 식별자
///
/// `#[serde(try_from, into)]`: JSON에서는 `"2025-W07"` 문자열로 주고받습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey(NaiveDate);

/// 주차 문자열 파싱 실패
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed week key: {0:?}")]
pub struct ParseWeekKeyError(pub String);

impl WeekKey {
    /// 지원하는 가장 이른 ISO 연도 (0001-01-01은 월요일)
    pub const MIN_YEAR: i32 = 1;
    /// 지원하는 가장 늦은 ISO 연도
    pub const MAX_YEAR: i32 = 9999;

    /// 주어진 날짜가 속한 ISO 주차를 반환합니다.
    ///
    /// 지원 범위 밖의 날짜는 가장 가까운 끝 주차(`0001-W01` / `9999-W52`)로 맞춥니다.
    /// 호출자는 `supports`로 먼저 걸러야 합니다.
    pub fn containing(date: NaiveDate) -> Self {
        let date = date.clamp(Self::first_day(), Self::last_day());
        let back = u64::from(date.weekday().num_days_from_monday());
        WeekKey(date.checked_sub_days(Days::new(back)).unwrap_or(date))
    }

    /// 날짜가 지원하는 주차 범위 안에 있는지
    pub fn supports(date: NaiveDate) -> bool {
        (Self::first_day()..=Self::last_day()).contains(&date)
    }

    /// ISO 연도와 주차 번호로 생성합니다. 존재하지 않거나 범위 밖이면 None.
    pub fn from_iso(year: i32, week: u32) -> Option<Self> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return None;
        }
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).map(WeekKey)
    }

    fn first_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(Self::MIN_YEAR, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    fn last_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(Self::MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    /// ISO 연도 (1월 초/12월 말에는 달력 연도와 다를 수 있음)
    pub fn year(&self) -> i32 {
        self.0.iso_week().year()
    }

    /// ISO 주차 번호 (1..=53)
    pub fn week(&self) -> u32 {
        self.0.iso_week().week()
    }

    /// 이 주의 월요일
    pub fn monday(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl FromStr for WeekKey {
    type Err = ParseWeekKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseWeekKeyError(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(malformed)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || week.len() != 2 || !digits(year) || !digits(week) {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let week: u32 = week.parse().map_err(|_| malformed())?;
        WeekKey::from_iso(year, week).ok_or_else(malformed)
    }
}

impl TryFrom<String> for WeekKey {
    type Error = ParseWeekKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

// ── sqlx 연동 ──
// DB에는 TEXT 컬럼으로 저장하고, 읽을 때 다시 파싱합니다.
// 이렇게 하면 `.bind(week_key)`와 `query_as::<_, (WeekKey, i64)>`를 바로 쓸 수 있습니다.

impl Type<Sqlite> for WeekKey {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for WeekKey {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for WeekKey {
    fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(text.parse::<WeekKey>()?)
    }
}
