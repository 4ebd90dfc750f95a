// ==========================================
// 订舱履约核心 - 单证冻结守卫
// ==========================================
// 规则（按顺序判定）:
// 1. 单证处于终态 → FINALIZED（与截止时间无关）
// 2. 订舱设置了对应截止时间且 now >= 截止时间 → CUTOFF_PASSED
// 3. 否则允许修改
// 红线: 判定与写入必须在同一事务内（由修订引擎保证）
// ==========================================

use crate::domain::booking::Booking;
use crate::domain::types::DocumentKind;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// 拒绝原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreezeDenial {
    Finalized {
        kind: DocumentKind,
        status: String,
    },
    CutoffPassed {
        kind: DocumentKind,
        cutoff_at: NaiveDateTime,
    },
}

impl FreezeDenial {
    pub fn code(&self) -> &'static str {
        match self {
            FreezeDenial::Finalized { .. } => "FINALIZED",
            FreezeDenial::CutoffPassed { .. } => "CUTOFF_PASSED",
        }
    }
}

impl fmt::Display for FreezeDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreezeDenial::Finalized { kind, status } => {
                write!(f, "{} 已处于终态 {}，不可修改", kind, status)
            }
            FreezeDenial::CutoffPassed { kind, cutoff_at } => {
                write!(f, "{} 已过截止时间 {}，不可修改", kind, cutoff_at)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeDecision {
    Allowed,
    Denied(FreezeDenial),
}

impl FreezeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FreezeDecision::Allowed)
    }
}

// ==========================================
// FreezePolicy - 单证类型的冻结策略
// ==========================================
#[derive(Clone, Copy)]
pub struct FreezePolicy {
    pub kind: DocumentKind,
    pub terminal_statuses: &'static [&'static str],
    pub cutoff_resolver: fn(&Booking) -> Option<NaiveDateTime>,
}

impl FreezePolicy {
    /// 各单证类型的策略
    ///
    /// - BL_DRAFT: 终态 APPROVED/RELEASED，截单时间
    /// - VGM_TRANSMISSION: 无终态，VGM 截止时间
    /// - CUSTOMS_DECLARATION: 终态 CLEARED，截关时间
    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::BlDraft => FreezePolicy {
                kind,
                terminal_statuses: &["APPROVED", "RELEASED"],
                cutoff_resolver: |b| b.si_cutoff_at,
            },
            DocumentKind::VgmTransmission => FreezePolicy {
                kind,
                terminal_statuses: &[],
                cutoff_resolver: |b| b.vgm_cutoff_at,
            },
            DocumentKind::CustomsDeclaration => FreezePolicy {
                kind,
                terminal_statuses: &["CLEARED"],
                cutoff_resolver: |b| b.customs_cutoff_at,
            },
        }
    }

    pub fn check(&self, doc_status: &str, booking: &Booking, now: NaiveDateTime) -> FreezeDecision {
        if self.terminal_statuses.iter().any(|s| *s == doc_status) {
            return FreezeDecision::Denied(FreezeDenial::Finalized {
                kind: self.kind,
                status: doc_status.to_string(),
            });
        }

        if let Some(cutoff_at) = (self.cutoff_resolver)(booking) {
            if now >= cutoff_at {
                return FreezeDecision::Denied(FreezeDenial::CutoffPassed {
                    kind: self.kind,
                    cutoff_at,
                });
            }
        }

        FreezeDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{BlDraftStatus, CustomsStatus};
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn booking(si_cutoff: Option<NaiveDateTime>, vgm_cutoff: Option<NaiveDateTime>) -> Booking {
        Booking {
            booking_id: "B1".to_string(),
            booking_no: "BK-1".to_string(),
            depot_unlocode: "SGSIN".to_string(),
            carrier_id: None,
            si_cutoff_at: si_cutoff,
            vgm_cutoff_at: vgm_cutoff,
            customs_cutoff_at: None,
        }
    }

    #[test]
    fn test_terminal_status_denied_before_cutoff_check() {
        let policy = FreezePolicy::for_kind(DocumentKind::BlDraft);
        let decision = policy.check(BlDraftStatus::Released.as_str(), &booking(Some(at(1)), None), at(12));
        assert_eq!(decision, FreezeDecision::Denied(FreezeDenial::Finalized {
            kind: DocumentKind::BlDraft,
            status: "RELEASED".to_string(),
        }));
    }

    #[test]
    fn test_cutoff_boundary_is_inclusive() {
        let policy = FreezePolicy::for_kind(DocumentKind::VgmTransmission);
        let b = booking(None, Some(at(10)));

        assert!(policy.check("ACCEPTED", &b, at(9)).is_allowed());
        match policy.check("ACCEPTED", &b, at(10)) {
            FreezeDecision::Denied(denial) => assert_eq!(denial.code(), "CUTOFF_PASSED"),
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_missing_cutoff_means_no_restriction() {
        let policy = FreezePolicy::for_kind(DocumentKind::BlDraft);
        assert!(policy
            .check(BlDraftStatus::Draft.as_str(), &booking(None, Some(at(1))), at(23))
            .is_allowed());
    }

    #[test]
    fn test_terminal_codes_match_status_enums() {
        for code in FreezePolicy::for_kind(DocumentKind::BlDraft).terminal_statuses {
            assert!(BlDraftStatus::parse(code).is_some());
        }
        for code in FreezePolicy::for_kind(DocumentKind::CustomsDeclaration).terminal_statuses {
            assert_eq!(CustomsStatus::parse(code), Some(CustomsStatus::Cleared));
        }
    }
}
