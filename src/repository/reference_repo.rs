// ==========================================
// 订舱履约核心 - 参考数据查询接口
// ==========================================
// 职责: 收款银行账户、附加费等外部主数据的只读查询
// 实现者: SqlReferenceLookup（使用 rusqlite）
// ==========================================

use crate::domain::reference::{BankAccount, Surcharge};
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::get_flag;
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// ReferenceLookup Trait
// ==========================================
// 查询在调用方连接/事务内执行，保证与写入看到同一快照
pub trait ReferenceLookup: Send + Sync {
    /// 当前启用的默认收款账户（无则 None）
    fn default_active_bank_account(&self, conn: &Connection) -> RepositoryResult<Option<BankAccount>>;

    /// 按名称查询附加费（无则 None）
    fn surcharge_by_name(&self, conn: &Connection, name: &str) -> RepositoryResult<Option<Surcharge>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlReferenceLookup;

impl ReferenceLookup for SqlReferenceLookup {
    fn default_active_bank_account(&self, conn: &Connection) -> RepositoryResult<Option<BankAccount>> {
        let account = conn
            .query_row(
                r#"SELECT account_id, bank_name, account_no, currency, is_active, is_default
                   FROM bank_account
                   WHERE is_active = 1 AND is_default = 1
                   ORDER BY account_id
                   LIMIT 1"#,
                [],
                |row| {
                    Ok(BankAccount {
                        account_id: row.get(0)?,
                        bank_name: row.get(1)?,
                        account_no: row.get(2)?,
                        currency: row.get(3)?,
                        is_active: get_flag(row, 4)?,
                        is_default: get_flag(row, 5)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    fn surcharge_by_name(&self, conn: &Connection, name: &str) -> RepositoryResult<Option<Surcharge>> {
        let surcharge = conn
            .query_row(
                "SELECT surcharge_id, name, amount_minor, currency FROM surcharge WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Surcharge {
                        surcharge_id: row.get(0)?,
                        name: row.get(1)?,
                        amount_minor: row.get(2)?,
                        currency: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(surcharge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_account_requires_active_and_default() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let lookup = SqlReferenceLookup;

        conn.execute_batch(
            r#"
            INSERT INTO bank_account VALUES ('A1', 'DBS', '001', 'USD', 0, 1);
            INSERT INTO bank_account VALUES ('A2', 'OCBC', '002', 'USD', 1, 0);
            "#,
        )
        .unwrap();
        assert!(lookup.default_active_bank_account(&conn).unwrap().is_none());

        conn.execute("INSERT INTO bank_account VALUES ('A3', 'UOB', '003', 'USD', 1, 1)", [])
            .unwrap();
        let account = lookup.default_active_bank_account(&conn).unwrap().unwrap();
        assert_eq!(account.account_id, "A3");
    }

    #[test]
    fn test_surcharge_by_name() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO surcharge VALUES ('S1', 'CUSTOMS_FILING_FEE', 3500, 'USD')",
            [],
        )
        .unwrap();

        let lookup = SqlReferenceLookup;
        assert_eq!(
            lookup.surcharge_by_name(&conn, "CUSTOMS_FILING_FEE").unwrap().unwrap().amount_minor,
            3500
        );
        assert!(lookup.surcharge_by_name(&conn, "OTHER").unwrap().is_none());
    }
}
