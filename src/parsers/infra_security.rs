//! Infrastructure and security log parsers (spec.md §4.4's fourth leaf
//! family): firewalls, Kubernetes control-plane logs, OS audit trails and
//! access logs. Mostly regex-over-lines like `app_logging`, grounded the
//! same way.

use crate::common::{detects_by_head_sample, numbered_lines};
use crate::model::{make_event, ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::parser::{priority, ToolParser};
use crate::registry::ToolParserRegistry;
use once_cell::sync::Lazy;
use regex::Regex;

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

/// Linux `iptables` logging target, typical kernel-log rendering:
/// `... IN=eth0 OUT= MAC=... SRC=10.0.0.1 DST=10.0.0.2 ... PROTO=TCP SPT=443 DPT=80 ...`.
static IPTABLES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"IN=(?P<in>\S*) OUT=(?P<out>\S*).*SRC=(?P<src>\S+) DST=(?P<dst>\S+).*PROTO=(?P<proto>\S+)").unwrap()
});

pub struct IptablesParser;

impl IptablesParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| IPTABLES_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = IPTABLES_RE.captures(line) else { continue };
            let mut e = make_event("iptables", ValidationEventType::SecurityFinding);
            e.category = "firewall".to_string();
            e.origin = caps["src"].to_string();
            e.target = caps["dst"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = format!("{} -> {} ({})", &caps["src"], &caps["dst"], &caps["proto"]);
            let blocked = line.contains("DROP") || line.contains("REJECT") || line.contains("DENY");
            if blocked {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            } else {
                e.set_outcome(ValidationEventStatus::Pass, "");
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(IptablesParser, "iptables", "firewall", priority::MEDIUM);

/// OpenBSD `pf` logging (`pflog`/`tcpdump -e -ttt` rendering):
/// `rule 3/0(match): block in on em0: 10.0.0.1.1234 > 10.0.0.2.80: ...`.
static PF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rule \S+\((?P<action>\w+)\): (?P<dir>\w+) (?:in|out) on \S+: (?P<src>\S+) > (?P<dst>\S+):").unwrap()
});

pub struct PfParser;

impl PfParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| PF_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = PF_RE.captures(line) else { continue };
            let mut e = make_event("pf", ValidationEventType::SecurityFinding);
            e.category = "firewall".to_string();
            e.origin = caps["src"].to_string();
            e.target = caps["dst"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = format!("{} {} -> {}", &caps["action"], &caps["src"], &caps["dst"]);
            if &caps["action"] == "block" {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            } else {
                e.set_outcome(ValidationEventStatus::Pass, "");
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(PfParser, "pf", "firewall", priority::MEDIUM);

/// Cisco ASA syslog: `%ASA-4-106023: Deny tcp src outside:10.0.0.1/1234 dst inside:10.0.0.2/80 ...`.
static ASA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%ASA-(?P<level>\d)-(?P<msgid>\d+): (?P<action>\w+) (?P<proto>\w+) src \S+:(?P<src>[^/]+).*dst \S+:(?P<dst>[^/]+)").unwrap());

pub struct CiscoAsaParser;

impl CiscoAsaParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| ASA_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = ASA_RE.captures(line) else { continue };
            let mut e = make_event("cisco_asa", ValidationEventType::SecurityFinding);
            e.category = "firewall".to_string();
            e.error_code = format!("%ASA-{}-{}", &caps["level"], &caps["msgid"]);
            e.origin = caps["src"].to_string();
            e.target = caps["dst"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = format!("{} {} {} -> {}", &caps["action"], &caps["proto"], &caps["src"], &caps["dst"]);
            let asa_level: u32 = caps["level"].parse().unwrap_or(6);
            if asa_level <= 3 {
                e.set_outcome(ValidationEventStatus::Error, "error");
            } else if &caps["action"] == "Deny" {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            } else {
                e.set_outcome(ValidationEventStatus::Pass, "");
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(CiscoAsaParser, "cisco_asa", "firewall", priority::MEDIUM);

/// AWS VPC Flow Logs default format (space-separated, version 2):
/// `version account-id eni-id srcaddr dstaddr srcport dstport protocol packets bytes start end action log-status`.
pub struct VpcFlowLogParser;

impl VpcFlowLogParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| {
            let fields: Vec<&str> = l.split_whitespace().collect();
            fields.len() >= 13 && fields[0].parse::<u32>().is_ok() && matches!(fields[12], "OK" | "NODATA" | "SKIPDATA")
        })
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 13 || fields[0].parse::<u32>().is_err() {
                continue;
            }
            let mut e = make_event("vpc_flow_log", ValidationEventType::SecurityFinding);
            e.category = "cloud_network".to_string();
            e.origin = format!("{}:{}", fields[3], fields[5]);
            e.target = format!("{}:{}", fields[4], fields[6]);
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = format!("{} {} -> {} ({})", fields[11], fields[3], fields[4], fields[7]);
            match fields[11] {
                "REJECT" => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                "ACCEPT" => e.set_outcome(ValidationEventStatus::Pass, ""),
                _ => e.set_outcome(ValidationEventStatus::Info, "info"),
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(VpcFlowLogParser, "vpc_flow_log", "cloud_network", priority::MEDIUM);

/// Kubernetes `klog` format: `E0102 03:04:05.678901   1 reflector.go:123] message`.
static KLOG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<level>[IWEF])\d{4} \d{2}:\d{2}:\d{2}\.\d+\s+\d+ (?P<file>\S+)\] (?P<msg>.*)$").unwrap());

pub struct KlogParser;

impl KlogParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| KLOG_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = KLOG_RE.captures(line) else { continue };
            let mut e = make_event("klog", ValidationEventType::DebugEvent);
            e.category = "kubernetes_control_plane".to_string();
            e.ref_file = caps["file"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            match &caps["level"] {
                "F" => e.set_outcome(ValidationEventStatus::Error, "critical"),
                "E" => e.set_outcome(ValidationEventStatus::Error, "error"),
                "W" => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                _ => e.set_outcome(ValidationEventStatus::Info, "info"),
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(KlogParser, "klog", "kubernetes_control_plane", priority::MEDIUM);

/// Linux `auditd` raw format: `type=SYSCALL msg=audit(1700000000.123:456): ... key="access"`.
static AUDITD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"type=(?P<type>\w+) msg=audit\((?P<ts>\d+\.\d+):(?P<serial>\d+)\):"#).unwrap()
});

pub struct AuditdParser;

impl AuditdParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| AUDITD_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = AUDITD_RE.captures(line) else { continue };
            let mut e = make_event("auditd", ValidationEventType::SecurityFinding);
            e.category = "os_audit".to_string();
            e.external_id = caps["serial"].to_string();
            e.started_at = caps["ts"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = format!("{} event", &caps["type"]);
            let failed = line.contains("res=failed") || line.contains("success=no");
            if failed {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            } else {
                e.set_outcome(ValidationEventStatus::Pass, "");
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(AuditdParser, "auditd", "os_audit", priority::MEDIUM);

/// S3 server access log format (space-separated with quoted fields):
/// `bucket-owner bucket [date] remote-ip requester request-id operation key "request-uri" status ...`.
static S3_ACCESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\S+ (?P<bucket>\S+) \[[^\]]+\] (?P<remote_ip>\S+) \S+ \S+ (?P<operation>\S+) (?P<key>\S+) "(?P<request>[^"]*)" (?P<status>\d+)"#).unwrap()
});

pub struct S3AccessLogParser;

impl S3AccessLogParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| S3_ACCESS_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = S3_ACCESS_RE.captures(line) else { continue };
            let status: u32 = caps["status"].parse().unwrap_or(0);
            let mut e = make_event("s3_access_log", ValidationEventType::SecurityFinding);
            e.category = "cloud_storage_access".to_string();
            e.origin = caps["remote_ip"].to_string();
            e.target = format!("{}/{}", &caps["bucket"], &caps["key"]);
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = format!("{} {} -> {}", &caps["operation"], &caps["request"], status);
            if status >= 500 {
                e.set_outcome(ValidationEventStatus::Error, "error");
            } else if status >= 400 {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            } else {
                e.set_outcome(ValidationEventStatus::Pass, "");
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(S3AccessLogParser, "s3_access_log", "cloud_storage_access", priority::MEDIUM);

/// Windows Event Log XML export fragment: `<Level>2</Level>` (1=critical,
/// 2=error, 3=warning, 4=info) alongside `<EventID>` / `<Provider Name=...>`.
/// Scanned as a flat line stream rather than a full XML parse, matching
/// this family's line-oriented treatment.
static WINEVT_EVENTID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<EventID[^>]*>(\d+)</EventID>").unwrap());
static WINEVT_LEVEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Level>(\d)</Level>").unwrap());
static WINEVT_PROVIDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<Provider Name="([^"]+)""#).unwrap());

pub struct WindowsEventLogParser;

impl WindowsEventLogParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("<EventID") && content.contains("<Provider")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        let mut event_id = String::new();
        let mut provider = String::new();
        for (line_no, line) in numbered_lines(content) {
            if let Some(c) = WINEVT_EVENTID_RE.captures(line) {
                event_id = c[1].to_string();
            }
            if let Some(c) = WINEVT_PROVIDER_RE.captures(line) {
                provider = c[1].to_string();
            }
            if let Some(c) = WINEVT_LEVEL_RE.captures(line) {
                let mut e = make_event("windows_event_log", ValidationEventType::SecurityFinding);
                e.category = "windows_event_log".to_string();
                e.external_id = event_id.clone();
                e.origin = provider.clone();
                e.log_line_start = line_no as i32;
                e.log_line_end = line_no as i32;
                e.message = format!("EventID {event_id} from {provider}");
                match &c[1] {
                    "1" => e.set_outcome(ValidationEventStatus::Error, "critical"),
                    "2" => e.set_outcome(ValidationEventStatus::Error, "error"),
                    "3" => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                    _ => e.set_outcome(ValidationEventStatus::Info, "info"),
                }
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(WindowsEventLogParser, "windows_event_log", "windows_event_log", priority::LOW);

pub fn register(registry: &mut ToolParserRegistry) {
    registry.register(Box::new(IptablesParser));
    registry.register(Box::new(PfParser));
    registry.register(Box::new(CiscoAsaParser));
    registry.register(Box::new(VpcFlowLogParser));
    registry.register(Box::new(KlogParser));
    registry.register(Box::new(AuditdParser));
    registry.register(Box::new(S3AccessLogParser));
    registry.register(Box::new(WindowsEventLogParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iptables_drop_is_warning() {
        let content = "Jan  2 03:04:05 host kernel: DROP IN=eth0 OUT= MAC=aa:bb SRC=10.0.0.1 DST=10.0.0.2 LEN=60 PROTO=TCP SPT=1234 DPT=22";
        assert!(IptablesParser.can_parse(content));
        let events = IptablesParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Warning);
        assert_eq!(events[0].origin, "10.0.0.1");
    }

    #[test]
    fn klog_fatal_maps_to_critical() {
        let content = "F0102 03:04:05.678901       1 main.go:42] panic: disk full";
        let events = KlogParser.parse(content);
        assert_eq!(events[0].severity, "critical");
    }

    #[test]
    fn s3_access_log_server_error() {
        let content = r#"abcd mybucket [02/Jan/2024:03:04:05 +0000] 203.0.113.1 arn:aws:iam requestid REST.GET.OBJECT key.txt "GET /key.txt HTTP/1.1" 500 InternalError 1234 1234 12 12 "-" "curl/7.0" -"#;
        let events = S3AccessLogParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
    }

    #[test]
    fn windows_event_log_level_2_is_error() {
        let content = "<Provider Name=\"Service Control Manager\"/>\n<EventID>7000</EventID>\n<Level>2</Level>\n";
        let events = WindowsEventLogParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
        assert_eq!(events[0].external_id, "7000");
    }
}
