use serde_json::{json, Value};

/// Builder for approval request bodies as the platform sends them.
pub struct ApprovalRequestBuilder {
    approval_type: String,
    entity_type: Option<String>,
    entity_id: String,
    fields: Value,
    user: Value,
}

impl ApprovalRequestBuilder {
    pub fn new(approval_type: &str) -> Self {
        Self {
            approval_type: approval_type.to_string(),
            entity_type: None,
            entity_id: "entity-1".to_string(),
            fields: json!({}),
            user: json!({
                "riskScore": 10,
                "riskTier": "low",
                "riskFlags": [],
                "kycStatus": "verified",
                "fallbackKycStatus": "none",
                "payoutBlocked": false,
                "countryRiskTier": "low"
            }),
        }
    }

    pub fn investment(amount: f64) -> Self {
        Self::new("investment").with_fields(json!({ "amount": amount }))
    }

    pub fn kyc() -> Self {
        Self::new("kyc").with_fields(json!({ "provider": "plaid" }))
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.entity_id = id.to_string();
        self
    }

    pub fn with_entity_type(mut self, entity_type: &str) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = fields;
        self
    }

    /// Overwrite one key of the user context.
    pub fn with_user(mut self, key: &str, value: Value) -> Self {
        self.user[key] = value;
        self
    }

    pub fn without_user_key(mut self, key: &str) -> Self {
        if let Some(obj) = self.user.as_object_mut() {
            obj.remove(key);
        }
        self
    }

    pub fn build(self) -> Value {
        let entity_type = self.entity_type.unwrap_or_else(|| self.approval_type.clone());
        json!({
            "type": self.approval_type,
            "user": self.user,
            "entity": {
                "id": self.entity_id,
                "type": entity_type,
                "fields": self.fields
            }
        })
    }
}
