//! End-to-end coverage for the scenarios in spec.md §8, driven entirely
//! through the public `read_events` entry point rather than individual
//! parser units.

use devlog_harvest::{read_events, ReadOptions, Registries, SeverityLevel, ValidationEventStatus};

fn rows(events: &[devlog_harvest::ValidationEvent]) -> Vec<devlog_harvest::boundary::OutputRow> {
    events.iter().map(|e| e.to_output_row()).collect()
}

/// S1 — ESLint JSON.
#[test]
fn eslint_json_end_to_end() {
    let mut regs = Registries::bootstrap();
    let content = r#"[{"filePath":"/a.js","messages":[{"ruleId":"no-unused-vars","severity":2,"message":"x is unused","line":3,"column":5}]}]"#;
    let events = read_events(&mut regs, content, "auto", &ReadOptions::default()).unwrap();
    assert_eq!(events.len(), 1);
    let row = &rows(&events)[0];
    assert_eq!(row.event_id, 1);
    assert_eq!(row.tool_name, "eslint");
    assert_eq!(row.event_type, "LintIssue");
    assert_eq!(row.ref_file.as_deref(), Some("/a.js"));
    assert_eq!(row.ref_line, Some(3));
    assert_eq!(row.ref_column, Some(5));
    assert_eq!(row.error_code.as_deref(), Some("no-unused-vars"));
    assert_eq!(row.status, "Error");
    assert_eq!(row.severity, "error");
    assert_eq!(row.message.as_deref(), Some("x is unused"));
}

/// S2 — Go test JSONL correlation.
#[test]
fn go_test_jsonl_correlation_end_to_end() {
    let mut regs = Registries::bootstrap();
    let content = concat!(
        "{\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"T1\"}\n",
        "{\"Action\":\"pass\",\"Package\":\"p\",\"Test\":\"T1\",\"Elapsed\":0.12}\n",
        "{\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"T2\"}\n",
        "{\"Action\":\"fail\",\"Package\":\"p\",\"Test\":\"T2\",\"Elapsed\":0.30}\n",
    );
    let events = read_events(&mut regs, content, "go_test", &ReadOptions::default()).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].test_name, "T1");
    assert_eq!(events[0].status, ValidationEventStatus::Pass);
    assert_eq!(events[0].execution_time, 0.12);
    assert_eq!(events[1].test_name, "T2");
    assert_eq!(events[1].status, ValidationEventStatus::Fail);
    assert_eq!(events[1].execution_time, 0.30);
}

/// S3 — Auto-detect precedence: GitHub Actions workflow markers win over
/// an embedded ESLint payload that would otherwise also match. The payload
/// is kept verbatim as a step-line event rather than delegated, since
/// GitHub Actions never content-sniffs a step body.
#[test]
fn auto_detect_prefers_workflow_over_embedded_tool_json() {
    let mut regs = Registries::bootstrap();
    let content = concat!(
        "##[group]Setup\n",
        "[{\"filePath\":\"/a.js\",\"messages\":[{\"ruleId\":\"r\",\"severity\":1,\"message\":\"m\",\"line\":1,\"column\":1}]}]\n",
        "##[endgroup]\n",
    );
    let events = read_events(&mut regs, content, "auto", &ReadOptions::default()).unwrap();
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.workflow_type == "github_actions"));
    assert!(events
        .iter()
        .any(|e| e.hierarchy_level == 3 && e.log_content.contains("filePath")));
}

/// S4 — Jenkins with delegation: ESLint output echoed via a `+ command`
/// step surfaces as a delegated, deepest-hierarchy subunit event whose
/// failure status propagates up to the enclosing stage and pipeline.
#[test]
fn jenkins_delegates_embedded_command_output() {
    let mut regs = Registries::bootstrap();
    let content = concat!(
        "Started by user admin\n",
        "[Pipeline] { (Lint)\n",
        "+ eslint --format=json src/\n",
        "[{\"filePath\":\"/a.js\",\"messages\":[{\"ruleId\":\"r\",\"severity\":2,\"message\":\"m\",\"line\":1,\"column\":1}]}]\n",
        "[Pipeline] }\n",
        "Finished: FAILURE\n",
    );
    let events = read_events(&mut regs, content, "jenkins", &ReadOptions::default()).unwrap();
    let delegated = events
        .iter()
        .find(|e| e.subunit == "eslint")
        .expect("eslint delegated event present");
    assert_eq!(delegated.hierarchy_level, 4);
    assert_eq!(delegated.workflow_type, "jenkins");
    assert_eq!(delegated.unit, "Lint");
    assert_eq!(delegated.status, ValidationEventStatus::Error);

    let stage = events
        .iter()
        .find(|e| e.hierarchy_level == 2 && e.unit == "Lint")
        .expect("stage summary present");
    assert_eq!(stage.status, ValidationEventStatus::Error);

    let pipeline = events
        .iter()
        .find(|e| e.hierarchy_level == 1)
        .expect("pipeline summary present");
    assert_eq!(pipeline.status, ValidationEventStatus::Error);
}

/// S5 — Severity filter: only WARN/ERROR survive a `warning` threshold,
/// and event ids close the gap left by the three dropped rows.
#[test]
fn severity_threshold_filters_and_renumbers() {
    let mut regs = Registries::bootstrap();
    let content = concat!(
        "2024-01-02 03:04:05,678 TRACE [main] com.foo.Bar - trace line\n",
        "2024-01-02 03:04:05,679 DEBUG [main] com.foo.Bar - debug line\n",
        "2024-01-02 03:04:05,680 INFO [main] com.foo.Bar - info line\n",
        "2024-01-02 03:04:05,681 WARN [main] com.foo.Bar - warn line\n",
        "2024-01-02 03:04:05,682 ERROR [main] com.foo.Bar - error line\n",
    );
    let opts = ReadOptions {
        severity_threshold: SeverityLevel::Warning,
        ignore_errors: false,
    };
    let events = read_events(&mut regs, content, "log4j", &opts).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, 1);
    assert_eq!(events[0].severity, "warning");
    assert_eq!(events[1].event_id, 2);
    assert_eq!(events[1].severity, "error");
}

/// S6 — GitHub Actions ZIP fan-out: events from the lower-numbered entry
/// come first and every row carries the job stamped from its entry name.
#[test]
fn github_actions_zip_fan_out_stamps_job_order() {
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    let build_log = concat!(
        "##[group]Checkout\n",
        "ok\n",
        "##[endgroup]\n",
        "##[group]Build\n",
        "ok\n",
        "##[endgroup]\n",
    );
    let test_log = concat!(
        "##[group]Unit\n",
        "ok\n",
        "##[endgroup]\n",
        "##[group]Integration\n",
        "ok\n",
        "##[endgroup]\n",
        "##[group]Lint\n",
        "ok\n",
        "##[endgroup]\n",
    );

    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("0_build.txt", options).unwrap();
        zip.write_all(build_log.as_bytes()).unwrap();
        zip.start_file("1_test.txt", options).unwrap();
        zip.write_all(test_log.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    let tmp = std::env::temp_dir().join("devlog_harvest_s6_scenario.zip");
    std::fs::write(&tmp, buf.into_inner()).unwrap();

    let mut regs = Registries::bootstrap();
    let events = read_events(
        &mut regs,
        tmp.to_str().unwrap(),
        "github_actions_zip",
        &ReadOptions::default(),
    )
    .unwrap();
    std::fs::remove_file(&tmp).ok();

    assert!(!events.is_empty());
    let build_events: Vec<_> = events.iter().filter(|e| e.job_order == 0).collect();
    let test_events: Vec<_> = events.iter().filter(|e| e.job_order == 1).collect();
    assert!(!build_events.is_empty());
    assert!(!test_events.is_empty());
    assert!(build_events.iter().all(|e| e.job_name == "build"));
    assert!(test_events.iter().all(|e| e.job_name == "test"));

    let first_build_pos = events.iter().position(|e| e.job_order == 0).unwrap();
    let first_test_pos = events.iter().position(|e| e.job_order == 1).unwrap();
    assert!(first_build_pos < first_test_pos);
}
