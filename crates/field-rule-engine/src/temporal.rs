//! 时间规范化
//!
//! 时间点统一换算为距 1970-01-01T00:00:00Z 的毫秒数（UTC）。
//! 原始数值被视为已经是该毫秒偏移，经由数值规范化器换算。

use crate::error::{Result, RuleError};
use crate::numeric::NumericNormalizer;
use crate::value::Value;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 规范化后的时间点（UTC 毫秒偏移）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalInstant(f64);

impl CanonicalInstant {
    pub const fn from_millis(millis: f64) -> Self {
        Self(millis)
    }

    pub const fn millis(self) -> f64 {
        self.0
    }
}

impl fmt::Display for CanonicalInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// 时间规范化器
pub struct TemporalNormalizer;

impl TemporalNormalizer {
    /// 结构化时间点的毫秒偏移，保留亚毫秒精度
    pub fn instant_millis<Tz: TimeZone>(instant: &DateTime<Tz>) -> CanonicalInstant {
        let utc = instant.with_timezone(&Utc);
        let seconds = utc.timestamp() as f64;
        let nanos = f64::from(utc.timestamp_subsec_nanos());
        CanonicalInstant(seconds * 1_000.0 + nanos / 1_000_000.0)
    }

    /// 把值规范化为毫秒偏移，既不是时间点也不是数值时返回 None
    pub fn to_millis(value: &Value) -> Option<CanonicalInstant> {
        match value {
            Value::Instant(instant) => Some(Self::instant_millis(instant)),
            other => NumericNormalizer::to_canonical(other).map(|n| CanonicalInstant(n.value())),
        }
    }
}

/// 时钟
///
/// 与当前时间比较的规则每次评估都重新读取时钟。
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时间里程碑
///
/// 在规则定义时计算毫秒偏移，无效日期在定义时即报错。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstantMilestone {
    at: DateTime<Utc>,
    millis: CanonicalInstant,
}

impl InstantMilestone {
    pub fn from_datetime<Tz: TimeZone>(at: DateTime<Tz>) -> Self {
        let at = at.with_timezone(&Utc);
        Self {
            millis: TemporalNormalizer::instant_millis(&at),
            at,
        }
    }

    /// 由年月日时分秒毫秒构造（UTC）
    pub fn from_components(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Result<Self> {
        let at = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_milli_opt(hour, minute, second, millisecond))
            .ok_or_else(|| {
                RuleError::InvalidMilestone(format!(
                    "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{millisecond:03}"
                ))
            })?;

        Ok(Self::from_datetime(at.and_utc()))
    }

    /// 指定年份的最后一毫秒（12-31T23:59:59.999Z）
    pub fn end_of_year(year: i32) -> Result<Self> {
        Self::from_components(year, 12, 31, 23, 59, 59, 999)
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn millis(&self) -> CanonicalInstant {
        self.millis
    }

    pub fn year(&self) -> i32 {
        self.at.year()
    }

    pub fn month(&self) -> u32 {
        self.at.month()
    }

    pub fn day(&self) -> u32 {
        self.at.day()
    }
}
