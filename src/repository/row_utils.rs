// ==========================================
// 订舱履约核心 - 行映射工具
// ==========================================
// 职责: 时间戳/枚举列的统一读写，消除各仓储重复代码
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Row;

use crate::db::TS_FORMAT;

/// 时间戳格式化为存储文本
pub fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 读取必填时间戳列
pub fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 读取可空时间戳列
pub fn get_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDateTime::parse_from_str(&raw, TS_FORMAT)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

/// 读取枚举列（未知代码视为数据损坏）
pub fn get_enum<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("未知枚举值: {}", raw).into(),
        )
    })
}

/// 读取 0/1 布尔列
pub fn get_flag(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_ts_roundtrip_through_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let ts = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();

        let read = conn
            .query_row("SELECT ?1, NULL", [fmt_ts(ts)], |row| {
                Ok((get_ts(row, 0)?, get_opt_ts(row, 1)?))
            })
            .unwrap();

        assert_eq!(read, (ts, None));
    }

    #[test]
    fn test_unknown_enum_is_conversion_failure() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let result = conn.query_row("SELECT 'LOST'", [], |row| {
            get_enum(row, 0, crate::domain::ContainerStatus::parse)
        });
        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(0, _, _))
        ));
    }
}
