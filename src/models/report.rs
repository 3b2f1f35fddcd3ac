use crate::error::PixelLabError;
use serde::Serialize;
use serde_json::Value;

/// Cost or credit counters exactly as the service reported them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReport {
    raw: Option<Value>,
}

impl UsageReport {
    pub fn new(raw: Option<Value>) -> Self {
        Self {
            raw: raw.filter(|v| !v.is_null()),
        }
    }

    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    /// USD cost when the service charged money, zero otherwise.
    pub fn cost_usd(&self) -> f64 {
        self.raw
            .as_ref()
            .and_then(|v| v.get("usd"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// The single JSON object printed for one invocation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvocationResult {
    pub success: bool,
    pub output_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_variations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl InvocationResult {
    pub fn success(output_files: Vec<String>, usage: &UsageReport) -> Self {
        Self {
            success: true,
            output_files,
            cost_usd: Some(usage.cost_usd()),
            total_variations: None,
            usage: usage.raw().cloned(),
            balance_usd: None,
            keypoints: None,
            error: None,
            error_kind: None,
        }
    }

    /// Failed invocation; `written` lists files that made it to disk before the failure.
    pub fn failure(err: &PixelLabError, written: Vec<String>) -> Self {
        Self {
            success: false,
            output_files: written,
            cost_usd: None,
            total_variations: None,
            usage: None,
            balance_usd: None,
            keypoints: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }

    /// Attach the service's usage report; the cost is still reported when a later write failed.
    pub fn with_usage(mut self, usage: &UsageReport) -> Self {
        self.cost_usd = Some(usage.cost_usd());
        self.usage = usage.raw().cloned();
        self
    }

    pub fn with_total_variations(mut self, total: usize) -> Self {
        self.total_variations = Some(total);
        self
    }

    pub fn with_balance(mut self, usd: f64) -> Self {
        self.balance_usd = Some(usd);
        self
    }

    pub fn with_keypoints(mut self, keypoints: Value) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":"failed to serialize report"}"#.to_string()
        })
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_report_shape() {
        let usage = UsageReport::new(Some(json!({"type": "usd", "usd": 0.012})));
        let result = InvocationResult::success(vec!["out.png".into()], &usage);
        let value: Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["output_files"], json!(["out.png"]));
        assert_eq!(value["cost_usd"], 0.012);
        assert!(value.get("error").is_none());
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn test_credit_usage_passes_through() {
        let raw = json!({"type": "credits", "credits_used": 4, "remaining_credits": 96});
        let usage = UsageReport::new(Some(raw.clone()));
        assert_eq!(usage.cost_usd(), 0.0);
        let result = InvocationResult::success(vec![], &usage).with_total_variations(4);
        assert_eq!(result.usage, Some(raw));
        assert_eq!(result.total_variations, Some(4));
    }

    #[test]
    fn test_failure_report_shape() {
        let err = PixelLabError::ConfigError("PIXELLAB_API_KEY environment variable is not set".into());
        let result = InvocationResult::failure(&err, vec![]);
        let value: Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error_kind"], "configuration");
        assert!(value["error"].as_str().unwrap().contains("PIXELLAB_API_KEY"));
        assert_eq!(result.exit_code(), 1);
    }
}
