use intern_atoms::tasks::TaskSummary;
use serde::Serialize;
use serde_json::Value;

/// Uniform response body: `{success, data|error, ...}`
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TaskSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_summary(mut self, summary: TaskSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_left_out() {
        let deleted = Envelope::ok().with_message("Intern deleted successfully");
        let body = serde_json::to_value(deleted).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Intern deleted successfully"}));

        let body = serde_json::to_value(Envelope::failure("Route not found")).unwrap();
        assert_eq!(body, json!({"success": false, "error": "Route not found"}));
    }

    #[test]
    fn list_shape() {
        let body = serde_json::to_value(Envelope::ok().with_data(json!([])).with_total(0)).unwrap();
        assert_eq!(body, json!({"success": true, "data": [], "total": 0}));
    }
}
