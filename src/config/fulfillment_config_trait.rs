// ==========================================
// 订舱履约核心 - 履约配置读取 Trait
// ==========================================
// 职责: 定义履约流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;

// ==========================================
// FulfillmentConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取，缺省回落默认值）
pub trait FulfillmentConfigReader: Send + Sync {
    /// 新建发票的币种
    ///
    /// # 默认值
    /// - USD
    fn get_invoice_currency(&self) -> RepositoryResult<String>;

    /// 进口申报费对应的附加费名称
    ///
    /// # 默认值
    /// - IMPORT_DECLARATION_FEE
    fn get_import_declaration_fee_name(&self) -> RepositoryResult<String>;

    /// 出口报关费对应的附加费名称
    ///
    /// # 默认值
    /// - CUSTOMS_FILING_FEE
    fn get_customs_filing_fee_name(&self) -> RepositoryResult<String>;

    /// 放箱单号前缀（默认 CRO）
    fn get_cro_no_prefix(&self) -> RepositoryResult<String>;

    /// 发票号前缀（默认 INV）
    fn get_invoice_no_prefix(&self) -> RepositoryResult<String>;
}
