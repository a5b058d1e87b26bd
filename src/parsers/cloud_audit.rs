//! Cloud audit-trail parsers (spec.md §4.4's fifth leaf family). All three
//! providers ship newline-delimited JSON records for their activity logs,
//! so these share the `jsonl` scan shape from `test_frameworks` rather than
//! the regex shape from `app_logging`/`infra_security`.

use crate::model::{make_event, ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::parser::{priority, ToolParser};
use crate::registry::ToolParserRegistry;
use serde_json::Value;

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

fn jsonl_objects(content: &str) -> impl Iterator<Item = Value> + '_ {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
}

macro_rules! parser_meta {
    ($ty:ident, $name:expr, $category:expr, $priority:expr) => {
        impl ToolParser for $ty {
            fn can_parse(&self, content: &str) -> bool {
                self.detect(content)
            }
            fn parse(&self, content: &str) -> Vec<ValidationEvent> {
                self.parse_impl(content)
            }
            fn format_name(&self) -> &'static str {
                $name
            }
            fn name(&self) -> &'static str {
                $name
            }
            fn category(&self) -> &'static str {
                $category
            }
            fn priority(&self) -> i32 {
                $priority
            }
        }
    };
}

/// AWS CloudTrail record (either one per JSONL line, or the batch
/// `{"Records":[...]}` the console/S3 delivery exports — both are
/// accepted): `{eventTime,eventSource,eventName,userIdentity:{arn,type},
/// errorCode,errorMessage,sourceIPAddress}`.
pub struct CloudTrailParser;

impl CloudTrailParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"eventSource\"") && content.contains("\"eventName\"") && content.contains("\"userIdentity\"")
    }

    fn record_to_event(r: &Value) -> ValidationEvent {
        let mut e = make_event("cloudtrail", ValidationEventType::SecurityFinding);
        e.category = "cloud_audit".to_string();
        e.started_at = str_field(r, "eventTime").to_string();
        e.origin = str_field(r, "sourceIPAddress").to_string();
        e.target = format!("{}:{}", str_field(r, "eventSource"), str_field(r, "eventName"));
        e.external_id = str_field(r, "eventID").to_string();
        if let Some(identity) = r.get("userIdentity") {
            e.principal = str_field(identity, "arn").to_string();
            e.actor_type = str_field(identity, "type").to_string();
        }
        let error_code = str_field(r, "errorCode");
        if !error_code.is_empty() {
            e.error_code = error_code.to_string();
            e.message = str_field(r, "errorMessage").to_string();
            if error_code.contains("Unauthorized") || error_code.contains("AccessDenied") {
                e.set_outcome(ValidationEventStatus::Error, "error");
            } else {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            }
        } else {
            e.message = format!("{} {}", str_field(r, "eventName"), str_field(r, "eventSource"));
            e.set_outcome(ValidationEventStatus::Pass, "");
        }
        e
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            if let Ok(root) = serde_json::from_str::<Value>(content) {
                if let Some(Value::Array(records)) = root.get("Records") {
                    return records.iter().map(Self::record_to_event).collect();
                }
            }
        }
        jsonl_objects(content).map(|r| Self::record_to_event(&r)).collect()
    }
}
parser_meta!(CloudTrailParser, "cloudtrail", "cloud_audit", priority::VERY_HIGH);

/// GCP Cloud Logging / Audit Log entry (JSONL export):
/// `{timestamp,severity,logName,protoPayload:{methodName,resourceName,
/// authenticationInfo:{principalEmail},status:{code,message}}}`.
pub struct GcpCloudLoggingParser;

impl GcpCloudLoggingParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"protoPayload\"") && content.contains("\"methodName\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        jsonl_objects(content)
            .map(|r| {
                let mut e = make_event("gcp_cloud_logging", ValidationEventType::SecurityFinding);
                e.category = "cloud_audit".to_string();
                e.started_at = str_field(&r, "timestamp").to_string();
                let payload = r.get("protoPayload").cloned().unwrap_or(Value::Null);
                e.target = format!("{} {}", str_field(&payload, "methodName"), str_field(&payload, "resourceName"));
                if let Some(auth) = payload.get("authenticationInfo") {
                    e.principal = str_field(auth, "principalEmail").to_string();
                }
                let severity = str_field(&r, "severity");
                let status_code = payload.get("status").and_then(|s| s.get("code")).and_then(Value::as_i64).unwrap_or(0);
                e.message = format!(
                    "{} {}",
                    str_field(&payload, "methodName"),
                    payload.get("status").map(|s| str_field(s, "message")).unwrap_or("")
                );
                if status_code != 0 {
                    e.set_outcome(ValidationEventStatus::Warning, "warning");
                } else {
                    match severity {
                        "ERROR" | "CRITICAL" | "ALERT" | "EMERGENCY" => e.set_outcome(ValidationEventStatus::Error, "error"),
                        "WARNING" => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                        _ => e.set_outcome(ValidationEventStatus::Pass, ""),
                    }
                }
                e
            })
            .collect()
    }
}
parser_meta!(GcpCloudLoggingParser, "gcp_cloud_logging", "cloud_audit", priority::VERY_HIGH);

/// Azure Activity Log entry (JSONL export):
/// `{eventTimestamp,operationName:{value},caller,level,status:{value},resourceId}`.
pub struct AzureActivityLogParser;

impl AzureActivityLogParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"operationName\"") && content.contains("\"resourceId\"") && content.contains("\"caller\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        jsonl_objects(content)
            .map(|r| {
                let mut e = make_event("azure_activity_log", ValidationEventType::SecurityFinding);
                e.category = "cloud_audit".to_string();
                e.started_at = str_field(&r, "eventTimestamp").to_string();
                e.principal = str_field(&r, "caller").to_string();
                e.target = str_field(&r, "resourceId").to_string();
                let op = r.get("operationName").map(|o| str_field(o, "value")).unwrap_or("");
                let status = r.get("status").map(|s| str_field(s, "value")).unwrap_or("");
                e.message = format!("{op} -> {status}");
                let (s, sev) = match status {
                    "Failed" => (ValidationEventStatus::Error, "error"),
                    "Warning" => (ValidationEventStatus::Warning, "warning"),
                    _ => match str_field(&r, "level") {
                        "Error" | "Critical" => (ValidationEventStatus::Error, "error"),
                        "Warning" => (ValidationEventStatus::Warning, "warning"),
                        _ => (ValidationEventStatus::Pass, ""),
                    },
                };
                e.set_outcome(s, sev);
                e
            })
            .collect()
    }
}
parser_meta!(AzureActivityLogParser, "azure_activity_log", "cloud_audit", priority::VERY_HIGH);

pub fn register(registry: &mut ToolParserRegistry) {
    registry.register(Box::new(CloudTrailParser));
    registry.register(Box::new(GcpCloudLoggingParser));
    registry.register(Box::new(AzureActivityLogParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloudtrail_access_denied_is_error() {
        let content = r#"{"eventTime":"2024-01-02T03:04:05Z","eventSource":"s3.amazonaws.com","eventName":"GetObject","eventID":"abc","userIdentity":{"arn":"arn:aws:iam::1:user/bob","type":"IAMUser"},"errorCode":"AccessDenied","errorMessage":"denied","sourceIPAddress":"203.0.113.1"}"#;
        assert!(CloudTrailParser.can_parse(content));
        let events = CloudTrailParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
        assert_eq!(events[0].principal, "arn:aws:iam::1:user/bob");
    }

    #[test]
    fn cloudtrail_batch_records_array() {
        let content = r#"{"Records":[{"eventTime":"t","eventSource":"ec2.amazonaws.com","eventName":"RunInstances","userIdentity":{"arn":"a","type":"Root"}}]}"#;
        let events = CloudTrailParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ValidationEventStatus::Pass);
    }

    #[test]
    fn gcp_non_zero_status_code_is_warning() {
        let content = r#"{"timestamp":"t","severity":"INFO","protoPayload":{"methodName":"storage.objects.get","resourceName":"r","status":{"code":7,"message":"denied"}}}"#;
        let events = GcpCloudLoggingParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Warning);
    }

    #[test]
    fn azure_failed_status_is_error() {
        let content = r#"{"eventTimestamp":"t","caller":"bob@example.com","resourceId":"/sub/rg/vm","operationName":{"value":"Microsoft.Compute/virtualMachines/write"},"status":{"value":"Failed"},"level":"Error"}"#;
        let events = AzureActivityLogParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
    }
}
