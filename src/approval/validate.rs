//! Boundary validation for approval requests.
//!
//! Input arrives as untyped JSON. Every field is checked and every problem is
//! collected before anything is returned, so a caller sees the complete list
//! of offending fields in one round trip. A request is either fully typed or
//! rejected; nothing partially validated leaves this module.

use serde_json::{Map, Number, Value};

use crate::approval::errors::{FieldError, ValidationError};
use crate::approval::types::*;
use crate::rbac::types::Role;

const MAX_RISK_SCORE: f64 = 100.0;

/// Validate a JSON-shaped approval request.
pub fn parse_request(input: &Value) -> Result<ApprovalRequest, ValidationError> {
    let mut c = Collector::default();

    let Some(root) = object(input, "", &mut c) else {
        return Err(c.finish());
    };

    let approval_type = required(root, "type", "", &mut c)
        .and_then(|v| enumeration::<ApprovalType>(v, "type", &mut c));
    let user = required(root, "user", "", &mut c).and_then(|v| parse_user(v, &mut c));
    let entity = required(root, "entity", "", &mut c)
        .and_then(|v| parse_entity(v, approval_type, &mut c));

    match (approval_type, user, entity) {
        (Some(approval_type), Some(user), Some(entity)) if c.is_empty() => Ok(ApprovalRequest {
            approval_type,
            user,
            entity,
        }),
        _ => Err(c.finish()),
    }
}

fn parse_user(value: &Value, c: &mut Collector) -> Option<UserContext> {
    let obj = object(value, "user", c)?;
    let p = "user";

    let risk_score = required(obj, "riskScore", p, c)
        .and_then(|v| number_in_range(v, 0.0, MAX_RISK_SCORE, "user.riskScore", c));
    let risk_tier =
        required(obj, "riskTier", p, c).and_then(|v| enumeration::<RiskTier>(v, "user.riskTier", c));
    let risk_flags = optional(obj, "riskFlags", p, c, string_array).map(Option::unwrap_or_default);
    let kyc_status = required(obj, "kycStatus", p, c)
        .and_then(|v| enumeration::<KycStatus>(v, "user.kycStatus", c));
    let fallback_kyc_status =
        optional(obj, "fallbackKycStatus", p, c, enumeration::<FallbackKycStatus>)
            .map(Option::unwrap_or_default);
    let payout_blocked =
        required(obj, "payoutBlocked", p, c).and_then(|v| boolean(v, "user.payoutBlocked", c));
    let country_risk_tier = required(obj, "countryRiskTier", p, c)
        .and_then(|v| enumeration::<RiskTier>(v, "user.countryRiskTier", c));

    Some(UserContext {
        risk_score: risk_score?,
        risk_tier: risk_tier?,
        risk_flags: risk_flags?,
        kyc_status: kyc_status?,
        fallback_kyc_status: fallback_kyc_status?,
        payout_blocked: payout_blocked?,
        country_risk_tier: country_risk_tier?,
    })
}

fn parse_entity(
    value: &Value,
    request_type: Option<ApprovalType>,
    c: &mut Collector,
) -> Option<EntityContext> {
    let obj = object(value, "entity", c)?;
    let p = "entity";

    let id = required(obj, "id", p, c).and_then(|v| non_empty_string(v, "entity.id", c));
    let entity_type = required(obj, "type", p, c)
        .and_then(|v| enumeration::<ApprovalType>(v, "entity.type", c));

    if let (Some(request_type), Some(entity_type)) = (request_type, entity_type) {
        if request_type != entity_type {
            c.push(
                "entity.type",
                format!("must match request type `{request_type}`, got `{entity_type}`"),
            );
        }
    }

    // Shape the field bag by whichever tag is usable so its problems are
    // reported alongside a bad top-level type.
    let fields = match request_type.or(entity_type) {
        Some(tag) => {
            let empty = Value::Object(Map::new());
            let raw = match obj.get("fields") {
                None | Some(Value::Null) => &empty,
                Some(v) => v,
            };
            parse_fields(raw, tag, c)
        }
        None => None,
    };

    Some(EntityContext {
        id: id?,
        entity_type: entity_type?,
        fields: fields?,
    })
}

fn parse_fields(value: &Value, tag: ApprovalType, c: &mut Collector) -> Option<EntityFields> {
    const P: &str = "entity.fields";
    let obj = object(value, P, c)?;
    let mut fc = FieldCursor::new(obj);

    let fields = match tag {
        ApprovalType::Project => {
            let title = fc
                .required("title", c)
                .and_then(|v| non_empty_string(v, "entity.fields.title", c));
            let funding_goal = fc
                .required("fundingGoal", c)
                .and_then(|v| positive_number(v, "entity.fields.fundingGoal", c));
            let category = fc.optional("category", c, string);
            let description = fc.optional("description", c, string);
            let duration_days = fc.optional("durationDays", c, unsigned);
            EntityFields::Project(ProjectFields {
                title: title?,
                funding_goal: funding_goal?,
                category: category?,
                description: description?,
                duration_days: duration_days?,
                extra: fc.extra(),
            })
        }
        ApprovalType::Investment => {
            let amount = fc
                .required("amount", c)
                .and_then(|v| positive_number(v, "entity.fields.amount", c));
            let project_id = fc.optional("projectId", c, string);
            let currency = fc.optional("currency", c, string);
            EntityFields::Investment(InvestmentFields {
                amount: amount?,
                project_id: project_id?,
                currency: currency?,
                extra: fc.extra(),
            })
        }
        ApprovalType::Payout => {
            let amount = fc
                .required("amount", c)
                .and_then(|v| positive_number(v, "entity.fields.amount", c));
            let project_id = fc.optional("projectId", c, string);
            let bank_account_verified = fc.optional("bankAccountVerified", c, boolean);
            EntityFields::Payout(PayoutFields {
                amount: amount?,
                project_id: project_id?,
                bank_account_verified: bank_account_verified?,
                extra: fc.extra(),
            })
        }
        ApprovalType::Kyc => {
            let provider = fc.optional("provider", c, string);
            let document_count = fc.optional("documentCount", c, unsigned);
            let match_score = fc.optional("matchScore", c, |v, path, c| {
                number_in_range(v, 0.0, 1.0, path, c)
            });
            EntityFields::Kyc(KycFields {
                provider: provider?,
                document_count: document_count?,
                match_score: match_score?,
                extra: fc.extra(),
            })
        }
        ApprovalType::FallbackKyc => {
            let submitted_documents = fc.optional("submittedDocuments", c, string_array);
            let reviewer_notes = fc.optional("reviewerNotes", c, string);
            EntityFields::FallbackKyc(FallbackKycFields {
                submitted_documents: submitted_documents?.unwrap_or_default(),
                reviewer_notes: reviewer_notes?,
                extra: fc.extra(),
            })
        }
        ApprovalType::Document => {
            let document_type = fc
                .required("documentType", c)
                .and_then(|v| non_empty_string(v, "entity.fields.documentType", c));
            let file_name = fc.optional("fileName", c, string);
            EntityFields::Document(DocumentFields {
                document_type: document_type?,
                file_name: file_name?,
                extra: fc.extra(),
            })
        }
        ApprovalType::Upgrade => {
            let requested_role = fc
                .required("requestedRole", c)
                .and_then(|v| role(v, "entity.fields.requestedRole", c));
            let current_role = fc.optional("currentRole", c, role);
            let justification = fc.optional("justification", c, string);
            EntityFields::Upgrade(UpgradeFields {
                requested_role: requested_role?,
                current_role: current_role?,
                justification: justification?,
                extra: fc.extra(),
            })
        }
    };

    Some(fields)
}

// ─── Collector ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn finish(self) -> ValidationError {
        ValidationError {
            fields: self.errors,
        }
    }
}

/// Tracks which keys of a field bag were consumed so the rest can be kept verbatim.
struct FieldCursor<'a> {
    obj: &'a Map<String, Value>,
    seen: Vec<&'static str>,
}

impl<'a> FieldCursor<'a> {
    fn new(obj: &'a Map<String, Value>) -> Self {
        Self { obj, seen: Vec::new() }
    }

    fn required(&mut self, key: &'static str, c: &mut Collector) -> Option<&'a Value> {
        self.seen.push(key);
        required(self.obj, key, "entity.fields", c)
    }

    fn optional<T>(
        &mut self,
        key: &'static str,
        c: &mut Collector,
        parse: impl FnOnce(&Value, &str, &mut Collector) -> Option<T>,
    ) -> Option<Option<T>> {
        self.seen.push(key);
        optional(self.obj, key, "entity.fields", c, parse)
    }

    fn extra(&self) -> Map<String, Value> {
        self.obj
            .iter()
            .filter(|(k, _)| !self.seen.iter().any(|seen| *seen == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ─── Field checks ───────────────────────────────────────────────────────

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn object<'a>(
    value: &'a Value,
    path: &str,
    c: &mut Collector,
) -> Option<&'a Map<String, Value>> {
    match value.as_object() {
        Some(obj) => Some(obj),
        None => {
            let field = if path.is_empty() { "$" } else { path };
            c.push(field, "must be an object");
            None
        }
    }
}

/// Missing and `null` are both "absent".
fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
    c: &mut Collector,
) -> Option<&'a Value> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            c.push(join(parent, key), "is required");
            None
        }
        Some(v) => Some(v),
    }
}

/// `Some(None)` when absent, `Some(Some(_))` when present and valid, `None` when invalid.
fn optional<T>(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    c: &mut Collector,
    parse: impl FnOnce(&Value, &str, &mut Collector) -> Option<T>,
) -> Option<Option<T>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(v) => parse(v, &join(parent, key), c).map(Some),
    }
}

fn string(value: &Value, path: &str, c: &mut Collector) -> Option<String> {
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            c.push(path, "must be a string");
            None
        }
    }
}

fn non_empty_string(value: &Value, path: &str, c: &mut Collector) -> Option<String> {
    let s = string(value, path, c)?;
    if s.trim().is_empty() {
        c.push(path, "must not be empty");
        return None;
    }
    Some(s)
}

fn string_array(value: &Value, path: &str, c: &mut Collector) -> Option<Vec<String>> {
    let Some(items) = value.as_array() else {
        c.push(path, "must be an array of strings");
        return None;
    };
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => out.push(s.to_string()),
            None => {
                c.push(format!("{path}[{i}]"), "must be a string");
                ok = false;
            }
        }
    }
    ok.then_some(out)
}

/// Numbers are kept as received so the engine sees the caller's exact value;
/// `f64` is only used for range checks.
fn number(value: &Value, path: &str, c: &mut Collector) -> Option<Number> {
    match value {
        Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => Some(n.clone()),
        _ => {
            c.push(path, "must be a number");
            None
        }
    }
}

fn positive_number(value: &Value, path: &str, c: &mut Collector) -> Option<Number> {
    let n = number(value, path, c)?;
    match n.as_f64() {
        Some(f) if f > 0.0 => Some(n),
        _ => {
            c.push(path, "must be greater than 0");
            None
        }
    }
}

fn unsigned(value: &Value, path: &str, c: &mut Collector) -> Option<u64> {
    match value.as_u64() {
        Some(n) => Some(n),
        None => {
            c.push(path, "must be a non-negative integer");
            None
        }
    }
}

fn number_in_range(
    value: &Value,
    min: f64,
    max: f64,
    path: &str,
    c: &mut Collector,
) -> Option<Number> {
    let n = number(value, path, c)?;
    match n.as_f64() {
        Some(f) if f >= min && f <= max => Some(n),
        _ => {
            c.push(path, format!("must be between {min} and {max}"));
            None
        }
    }
}

fn boolean(value: &Value, path: &str, c: &mut Collector) -> Option<bool> {
    match value.as_bool() {
        Some(b) => Some(b),
        None => {
            c.push(path, "must be a boolean");
            None
        }
    }
}

fn enumeration<T: WireEnum>(value: &Value, path: &str, c: &mut Collector) -> Option<T> {
    let parsed = value
        .as_str()
        .and_then(|s| serde_json::from_value::<T>(Value::String(s.to_string())).ok());
    if parsed.is_none() {
        c.push(path, format!("must be one of: {}", T::VARIANTS.join(", ")));
    }
    parsed
}

fn role(value: &Value, path: &str, c: &mut Collector) -> Option<Role> {
    enumeration::<Role>(value, path, c)
}
