//! Structured policy fields recovered from free text.

use serde::{Deserialize, Serialize};

/// Canonical insurance/case metadata.
///
/// Every field is either empty or a whitespace-collapsed, trimmed substring of
/// the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredPolicyFields {
    pub insured_name: String,
    pub market_ref: String,
    pub line_slip_no: String,
    pub certificate_ref: String,
    pub policy_period_start: String,
    pub policy_period_end: String,
    pub retro_start: String,
    pub retro_end: String,
}

impl StructuredPolicyFields {
    pub const FIELD_NAMES: [&'static str; 8] = [
        "insuredName",
        "marketRef",
        "lineSlipNo",
        "certificateRef",
        "policyPeriodStart",
        "policyPeriodEnd",
        "retroStart",
        "retroEnd",
    ];

    /// Field values in declaration order, paired with their external names.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        let values = [
            self.insured_name.as_str(),
            self.market_ref.as_str(),
            self.line_slip_no.as_str(),
            self.certificate_ref.as_str(),
            self.policy_period_start.as_str(),
            self.policy_period_end.as_str(),
            self.retro_start.as_str(),
            self.retro_end.as_str(),
        ];
        let mut out = [("", ""); 8];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (Self::FIELD_NAMES[i], value);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let fields = StructuredPolicyFields::default();
        assert!(fields.is_empty());
        assert_eq!(
            serde_json::to_value(&fields).unwrap()["certificateRef"],
            serde_json::Value::String(String::new())
        );
    }

    #[test]
    fn test_entries_follow_declaration_order() {
        let fields = StructuredPolicyFields {
            market_ref: "B0180FN2100".to_string(),
            ..Default::default()
        };
        assert!(!fields.is_empty());
        assert_eq!(fields.entries()[1], ("marketRef", "B0180FN2100"));
    }
}
