use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::rbac::types::Role;

/// A closed string enumeration on the wire. `VARIANTS` feeds validation messages.
pub trait WireEnum: DeserializeOwned {
    const VARIANTS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalType {
    Project,
    Investment,
    Payout,
    Kyc,
    FallbackKyc,
    Document,
    Upgrade,
}

impl WireEnum for ApprovalType {
    const VARIANTS: &'static [&'static str] = &[
        "project",
        "investment",
        "payout",
        "kyc",
        "fallback_kyc",
        "document",
        "upgrade",
    ];
}

impl ApprovalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalType::Project => "project",
            ApprovalType::Investment => "investment",
            ApprovalType::Payout => "payout",
            ApprovalType::Kyc => "kyc",
            ApprovalType::FallbackKyc => "fallback_kyc",
            ApprovalType::Document => "document",
            ApprovalType::Upgrade => "upgrade",
        }
    }
}

impl std::fmt::Display for ApprovalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Used for both the user's own risk tier and their country's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl WireEnum for RiskTier {
    const VARIANTS: &'static [&'static str] = &["low", "medium", "high"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    NotStarted,
    Pending,
    Verified,
    Failed,
}

impl WireEnum for KycStatus {
    const VARIANTS: &'static [&'static str] = &["not_started", "pending", "verified", "failed"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKycStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl WireEnum for FallbackKycStatus {
    const VARIANTS: &'static [&'static str] = &["none", "pending", "approved", "rejected"];
}

impl WireEnum for Role {
    const VARIANTS: &'static [&'static str] = &[
        "Investor",
        "ProjectOwner",
        "Support",
        "AccountingOperator",
        "ComplianceOfficer",
        "Admin",
        "SuperAdmin",
        "investor",
        "project_owner",
        "support",
        "accounting_operator",
        "compliance_officer",
        "admin",
        "super_admin",
    ];
}

/// Risk and verification state of the user the request concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    /// 0..=100, kept exactly as received
    pub risk_score: Number,
    pub risk_tier: RiskTier,
    pub risk_flags: Vec<String>,
    pub kyc_status: KycStatus,
    pub fallback_kyc_status: FallbackKycStatus,
    pub payout_blocked: bool,
    pub country_risk_tier: RiskTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityContext {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: ApprovalType,
    pub fields: EntityFields,
}

impl EntityContext {
    pub fn new(id: impl Into<String>, fields: EntityFields) -> Self {
        Self {
            id: id.into(),
            entity_type: fields.approval_type(),
            fields,
        }
    }
}

/// Typed payload per approval type. Keys not modelled here are kept in
/// `extra` and forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityFields {
    Project(ProjectFields),
    Investment(InvestmentFields),
    Payout(PayoutFields),
    Kyc(KycFields),
    FallbackKyc(FallbackKycFields),
    Document(DocumentFields),
    Upgrade(UpgradeFields),
}

impl EntityFields {
    pub fn approval_type(&self) -> ApprovalType {
        match self {
            EntityFields::Project(_) => ApprovalType::Project,
            EntityFields::Investment(_) => ApprovalType::Investment,
            EntityFields::Payout(_) => ApprovalType::Payout,
            EntityFields::Kyc(_) => ApprovalType::Kyc,
            EntityFields::FallbackKyc(_) => ApprovalType::FallbackKyc,
            EntityFields::Document(_) => ApprovalType::Document,
            EntityFields::Upgrade(_) => ApprovalType::Upgrade,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    pub title: String,
    pub funding_goal: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentFields {
    pub amount: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutFields {
    pub amount: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_verified: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,
    /// 0..=1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackKycFields {
    pub submitted_documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFields {
    pub document_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeFields {
    pub requested_role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated approval request. Only `validate::parse_request` builds one
/// from untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalRequest {
    #[serde(rename = "type")]
    pub approval_type: ApprovalType,
    pub user: UserContext,
    pub entity: EntityContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approve,
    Reject,
    Escalate,
}

/// The decision engine's verdict, returned to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    pub decision: Verdict,
    pub reason: String,
    pub requires_manual_review: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_to_wire_shape() {
        let request = ApprovalRequest {
            approval_type: ApprovalType::FallbackKyc,
            user: UserContext {
                risk_score: Number::from(10),
                risk_tier: RiskTier::Low,
                risk_flags: vec![],
                kyc_status: KycStatus::Failed,
                fallback_kyc_status: FallbackKycStatus::Pending,
                payout_blocked: true,
                country_risk_tier: RiskTier::Medium,
            },
            entity: EntityContext::new(
                "u-9",
                EntityFields::FallbackKyc(FallbackKycFields {
                    submitted_documents: vec!["passport".into()],
                    ..Default::default()
                }),
            ),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "type": "fallback_kyc",
                "user": {
                    "riskScore": 10,
                    "riskTier": "low",
                    "riskFlags": [],
                    "kycStatus": "failed",
                    "fallbackKycStatus": "pending",
                    "payoutBlocked": true,
                    "countryRiskTier": "medium"
                },
                "entity": {
                    "id": "u-9",
                    "type": "fallback_kyc",
                    "fields": { "submittedDocuments": ["passport"] }
                }
            })
        );
    }

    #[test]
    fn test_extra_fields_are_flattened() {
        let mut extra = Map::new();
        extra.insert("referralCode".into(), json!("SPRING"));
        let fields = EntityFields::Investment(InvestmentFields {
            amount: Number::from(250),
            project_id: None,
            currency: None,
            extra,
        });
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({ "amount": 250, "referralCode": "SPRING" })
        );
    }

    #[test]
    fn test_decision_wire_shape() {
        let decision: ApprovalDecision = serde_json::from_value(json!({
            "decision": "escalate",
            "reason": "High-risk country",
            "requiresManualReview": true
        }))
        .unwrap();
        assert_eq!(decision.decision, Verdict::Escalate);
        assert!(decision.requires_manual_review);

        assert!(serde_json::from_value::<ApprovalDecision>(json!({
            "decision": "maybe",
            "reason": "",
            "requiresManualReview": false
        }))
        .is_err());
        assert!(serde_json::from_value::<ApprovalDecision>(json!({
            "decision": "approve",
            "reason": "ok"
        }))
        .is_err());
    }

    #[test]
    fn test_wire_enum_variants_deserialize() {
        for v in ApprovalType::VARIANTS {
            assert!(serde_json::from_value::<ApprovalType>(json!(v)).is_ok(), "{v}");
        }
        for v in KycStatus::VARIANTS {
            assert!(serde_json::from_value::<KycStatus>(json!(v)).is_ok(), "{v}");
        }
        for v in FallbackKycStatus::VARIANTS {
            assert!(serde_json::from_value::<FallbackKycStatus>(json!(v)).is_ok(), "{v}");
        }
        for v in Role::VARIANTS {
            assert!(serde_json::from_value::<Role>(json!(v)).is_ok(), "{v}");
            assert!(v.parse::<Role>().is_ok(), "{v}");
        }
        for role in Role::ALL {
            assert!(Role::VARIANTS.contains(&role.as_str()));
        }
    }
}
