// ==========================================
// 订舱履约核心 - 进口申报数据仓储
// ==========================================

use crate::domain::declaration::ImportDeclaration;
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::fmt_ts;
use rusqlite::{params, Transaction};

pub struct ImportDeclarationRepository;

impl ImportDeclarationRepository {
    pub fn insert_tx(tx: &Transaction, decl: &ImportDeclaration) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO import_declaration (
                declaration_id, booking_id, declaration_no, declared_value_minor,
                currency, filed_by, filed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                decl.declaration_id,
                decl.booking_id,
                decl.declaration_no,
                decl.declared_value_minor,
                decl.currency,
                decl.filed_by,
                fmt_ts(decl.filed_at),
            ],
        )?;
        Ok(())
    }
}
