//! End-to-end comparison tests against mock capabilities.
//!
//! These tests drive the full pipeline:
//! 1. Acquire and validate candidates
//! 2. Normalize to markdown
//! 3. Extract attributes (batched)
//! 4. Group keys and select columns
//! 5. Assemble records

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use spec_compare::testing::{datasheet_text, fake_pdf, MockAI, MockConverter, MockReply};
use spec_compare::{
    AiTask, CandidateSource, CompareConfig, CompareError, CompareRequest, Comparator,
    ComparisonStatus, ConverterSet, ErrorKind, FailureStage, MockFetcher, MockWebSearcher,
    RecordStatus, NOT_AVAILABLE,
};

type TestComparator = Comparator<MockAI, MockFetcher, MockWebSearcher>;

/// Helper to build a datasheet body.
fn datasheet(name: &str, specs: &[(&str, &str)]) -> Vec<u8> {
    fake_pdf(&datasheet_text(name, specs))
}

fn mock_converters() -> ConverterSet {
    let converter = Arc::new(MockConverter::new().with_pages("MANY-PAGES", 15));
    ConverterSet::new(converter.clone(), converter)
}

fn test_config() -> CompareConfig {
    CompareConfig::default().with_contact_crawl(false)
}

fn comparator(ai: &MockAI, fetcher: &MockFetcher) -> TestComparator {
    Comparator::new(ai.clone(), fetcher.clone(), MockWebSearcher::new())
        .with_converters(mock_converters())
        .with_config(test_config())
}

fn sources(urls: &[&str]) -> Vec<CandidateSource> {
    urls.iter().map(|u| CandidateSource::datasheet(*u)).collect()
}

fn batch_item(index: usize, entity: &str, attributes: Value) -> Value {
    json!({
        "index": index,
        "entity_name": entity,
        "item_identifier": format!("{}-part", entity),
        "attributes": attributes
    })
}

/// Three regulators sharing voltage, current and package.
fn three_regulators(fetcher: MockFetcher, urls: &[&str; 3]) -> MockFetcher {
    fetcher
        .with_body(urls[0], datasheet("REG-A", &[("Voltage", "5 V"), ("Current", "1 A")]))
        .with_body(urls[1], datasheet("REG-B", &[("voltage", "12 V"), ("Current", "1.5 A")]))
        .with_body(urls[2], datasheet("REG-C", &[("Voltage", "3.3 V"), ("Current", "0.8 A")]))
}

fn three_regulator_batch() -> MockReply {
    MockReply::json(json!({"items": [
        batch_item(1, "Acme", json!({"Voltage": "5 V", "Current": "1 A", "Package": "TO-220"})),
        batch_item(2, "Bolt", json!({"voltage": "12 V", "Current": "1.5 A", "Package": "SOT-223"})),
        batch_item(3, "Core", json!({"Voltage": "3.3 V", "Current": "0.8 A", "Package": "DPAK"}))
    ]}))
}

fn three_regulator_groups() -> MockReply {
    MockReply::json(json!({
        "voltage": {"display_name": "Voltage", "sources": {"1": "Voltage", "2": "voltage", "3": "Voltage"}},
        "current": {"display_name": "Current", "sources": {"1": "Current", "2": "Current", "3": "Current"}},
        "package": {"display_name": "Package", "sources": {"1": "Package", "2": "Package", "3": "Package"}}
    }))
}

#[tokio::test]
async fn test_five_candidates_three_compared() {
    let urls = [
        "https://down.example/ds.pdf",
        "https://catalog.example/big.pdf",
        "https://ti.example/lm7805.pdf",
        "https://st.example/l7805.pdf",
        "https://onsemi.example/mc7805.pdf",
    ];

    let fetcher = MockFetcher::new()
        .with_status(urls[0], 503)
        .with_body(urls[1], fake_pdf("MANY-PAGES product family overview"))
        .with_body(urls[2], datasheet("LM7805", &[("Output Voltage", "5 V"), ("Output Current", "1.5 A")]))
        .with_body(urls[3], datasheet("L7805", &[("Vout", "5 V"), ("Iout", "1.5 A")]))
        .with_body(urls[4], datasheet("MC7805", &[("Output voltage", "5 V"), ("Output current", "1 A")]));

    let ai = MockAI::new()
        .with_task_reply(
            AiTask::ExtractBatch,
            MockReply::json(json!({"items": [
                batch_item(1, "Texas Instruments", json!({
                    "Output Voltage": "5 V",
                    "Max Input Voltage": "35 V",
                    "Output Current": "1.5 A",
                    "Dropout Voltage": "2 V",
                    "Package": "TO-220",
                    "Weight": "2 g"
                })),
                batch_item(2, "STMicroelectronics", json!({
                    "Vout": "5 V",
                    "Vin max": "35 V",
                    "Iout": "1.5 A",
                    "Dropout": "2 V",
                    "Operating Temp": "-40 to 125 C"
                })),
                batch_item(3, "onsemi", json!({
                    "Output voltage": "5.0 V",
                    "Input Voltage (max)": "35 V",
                    "Output current": "1 A",
                    "Package Type": "D2PAK"
                }))
            ]})),
        )
        .with_task_reply(
            AiTask::GroupKeys,
            MockReply::json(json!({
                "output_voltage": {"display_name": "Output Voltage",
                    "sources": {"1": "Output Voltage", "2": "Vout", "3": "Output voltage"}},
                "max_input_voltage": {"display_name": "Max Input Voltage",
                    "sources": {"1": "Max Input Voltage", "2": "Vin max", "3": "Input Voltage (max)"}},
                "output_current": {"display_name": "Output Current",
                    "sources": {"1": "Output Current", "2": "Iout", "3": "Output current"}},
                "dropout_voltage": {"display_name": "Dropout Voltage",
                    "sources": {"1": "Dropout Voltage", "2": "Dropout"}},
                "package": {"display_name": "Package",
                    "sources": {"1": "Package", "3": "Package Type"}},
                "weight": {"display_name": "Weight", "sources": {"1": "Weight"}},
                "operating_temperature": {"display_name": "Operating Temperature",
                    "sources": {"2": "Operating Temp"}}
            })),
        );

    let response = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("7805 regulator"), sources(&urls))
        .await
        .unwrap();

    assert_eq!(
        response.column_keys(),
        vec![
            "output_voltage",
            "max_input_voltage",
            "output_current",
            "dropout_voltage",
            "package"
        ]
    );
    assert_eq!(response.records.len(), 3);
    for record in &response.records {
        assert_eq!(record.status, RecordStatus::Ok);
        assert_eq!(record.specs.len(), 5);
        assert!(record.filled() >= 3, "{} filled {}", record.url, record.filled());
    }
    assert_eq!(response.records[1].specs["package"], NOT_AVAILABLE);
    assert_eq!(response.records[2].specs["package"], "D2PAK");

    assert_eq!(response.status, ComparisonStatus::Degraded);
    assert_eq!(response.failures.len(), 2);
    assert_eq!(response.failures[0].kind, ErrorKind::Http);
    assert_eq!(response.failures[1].kind, ErrorKind::PageCountExceeded);
    assert!(response
        .failures
        .iter()
        .all(|f| f.stage == FailureStage::Acquisition));

    assert_eq!(ai.calls_for(AiTask::ExtractBatch), 1);
    assert_eq!(ai.calls_for(AiTask::GroupKeys), 1);
    assert_eq!(
        response.records[0].contact_url.as_deref(),
        Some("https://ti.example/contact")
    );
}

#[tokio::test]
async fn test_failed_batch_splits_and_isolates_bad_half() {
    let urls = [
        "https://a1.example/ds.pdf",
        "https://a2.example/ds.pdf",
        "https://a3.example/ds.pdf",
        "https://b1.example/ds.pdf",
        "https://b2.example/ds.pdf",
        "https://b3.example/ds.pdf",
    ];
    let names = ["ALPHA-1", "ALPHA-2", "ALPHA-3", "BETA-1", "BETA-2", "BETA-3"];

    let fetcher = urls.iter().zip(names).fold(MockFetcher::new(), |f, (url, name)| {
        f.with_body(url, datasheet(name, &[("Voltage", "5 V"), ("Current", "1 A")]))
    });

    let ai = MockAI::new()
        .with_task_reply_containing(
            AiTask::ExtractBatch,
            "Below are 6 documents",
            MockReply::text("Six documents is more than I can read at once."),
        )
        .with_task_reply_containing(AiTask::ExtractBatch, "ALPHA-1", three_regulator_batch())
        .with_task_reply(AiTask::ExtractBatch, MockReply::text("Sorry, that was too long."))
        .with_task_reply(AiTask::GroupKeys, three_regulator_groups());

    let response = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    assert_eq!(ai.calls_for(AiTask::ExtractBatch), 3);

    let ok: Vec<_> = response.ok_records().map(|r| r.url.as_str()).collect();
    assert_eq!(ok, &urls[..3]);

    let failed: Vec<_> = response
        .records
        .iter()
        .filter(|r| r.status == RecordStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 3);
    for record in failed {
        assert!(record.error.is_some());
        assert!(record.specs.values().all(|v| v == NOT_AVAILABLE));
        assert_eq!(record.specs.len(), response.columns.len());
    }

    assert_eq!(response.failures.len(), 3);
    assert!(response
        .failures
        .iter()
        .all(|f| f.stage == FailureStage::Extraction && f.kind == ErrorKind::ExtractionFailed));
    assert_eq!(response.status, ComparisonStatus::Degraded);
}

#[tokio::test]
async fn test_slow_source_does_not_delay_others() {
    let urls = [
        "https://a.example/ds.pdf",
        "https://slow.example/ds.pdf",
        "https://b.example/ds.pdf",
        "https://c.example/ds.pdf",
    ];
    let fetcher = three_regulators(MockFetcher::new(), &[urls[0], urls[2], urls[3]])
        .with_body(urls[1], datasheet("SLOW", &[("Voltage", "9 V")]))
        .with_delay(urls[1], Duration::from_secs(10));

    let ai = MockAI::new()
        .with_task_reply(AiTask::ExtractBatch, three_regulator_batch())
        .with_task_reply(AiTask::GroupKeys, three_regulator_groups());

    let mut config = test_config();
    config.acquire.timeout_ms = 200;
    let comparator = comparator(&ai, &fetcher).with_config(config);

    let started = tokio::time::Instant::now();
    let response = comparator
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(response.ok_records().count(), 3);
    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].url, urls[1]);
    assert_eq!(response.failures[0].kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_grouping_garbage_falls_back_to_first_source_keys() {
    let urls = [
        "https://a.example/ds.pdf",
        "https://b.example/ds.pdf",
        "https://c.example/ds.pdf",
    ];
    let fetcher = three_regulators(MockFetcher::new(), &urls);
    let ai = MockAI::new()
        .with_task_reply(AiTask::ExtractBatch, three_regulator_batch())
        .with_task_reply(AiTask::GroupKeys, MockReply::text("These all look similar to me."));

    let response = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    assert_eq!(response.column_keys(), vec!["voltage", "current", "package"]);
    assert_eq!(response.records[1].specs["voltage"], "12 V");
    assert_eq!(response.status, ComparisonStatus::Degraded);
    assert!(response.failures.is_empty());
    assert!(response.warnings.iter().any(|w| w.contains("first source")));
}

#[tokio::test]
async fn test_clean_run_is_complete() {
    let urls = [
        "https://a.example/ds.pdf",
        "https://b.example/ds.pdf",
        "https://c.example/ds.pdf",
    ];
    let fetcher = three_regulators(MockFetcher::new(), &urls);
    let ai = MockAI::new()
        .with_task_reply(AiTask::ExtractBatch, three_regulator_batch())
        .with_task_reply(AiTask::GroupKeys, three_regulator_groups());

    let response = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    assert_eq!(response.status, ComparisonStatus::Complete);
    assert!(response.warnings.is_empty());
    assert!(response.timings.is_none());
    assert!(response.columns.iter().all(|c| c.coverage == 3));
    assert_eq!(response.records[0].entity_name.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_textless_pdf_gets_failed_record() {
    let urls = [
        "https://a.example/ds.pdf",
        "https://b.example/ds.pdf",
        "https://c.example/ds.pdf",
        "https://scan.example/ds.pdf",
    ];
    let fetcher = three_regulators(MockFetcher::new(), &[urls[0], urls[1], urls[2]])
        .with_body(urls[3], fake_pdf("scanned page"));
    let ai = MockAI::new()
        .with_task_reply(AiTask::ExtractBatch, three_regulator_batch())
        .with_task_reply(AiTask::GroupKeys, three_regulator_groups());

    let response = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    assert_eq!(response.status, ComparisonStatus::Degraded);
    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].stage, FailureStage::Normalization);
    assert_eq!(response.failures[0].kind, ErrorKind::NoContent);

    assert_eq!(response.records.len(), 4);
    let scanned = &response.records[3];
    assert_eq!(scanned.url, urls[3]);
    assert_eq!(scanned.status, RecordStatus::Failed);
    assert!(scanned.error.is_some());
    assert_eq!(scanned.specs.len(), response.columns.len());
    assert!(scanned.specs.values().all(|v| v == NOT_AVAILABLE));
}

#[tokio::test]
async fn test_too_few_documents_returns_raw_attributes() {
    let urls = ["https://a.example/ds.pdf", "https://b.example/ds.pdf"];
    let fetcher = MockFetcher::new()
        .with_body(urls[0], datasheet("REG-A", &[("Voltage", "5 V"), ("Current", "1 A")]))
        .with_body(urls[1], datasheet("REG-B", &[("Vcc", "12 V"), ("Color", "black")]));
    let ai = MockAI::new().with_task_reply(
        AiTask::ExtractBatch,
        MockReply::json(json!({"items": [
            batch_item(1, "Acme", json!({"Voltage": "5 V"})),
            batch_item(2, "Bolt", json!({"Vcc": "12 V", "Color": "black"}))
        ]})),
    );

    let response = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    assert_eq!(response.status, ComparisonStatus::Uncompared);
    assert!(response.columns.is_empty());
    assert_eq!(response.records.len(), 2);
    assert_eq!(response.records[1].specs["Color"], "black");
    assert_eq!(ai.calls_for(AiTask::GroupKeys), 0);
    assert!(!response.warnings.is_empty());
}

#[tokio::test]
async fn test_no_usable_sources_is_an_error() {
    let urls = ["https://a.example/ds.pdf", "https://b.example/ds.pdf"];
    let fetcher = MockFetcher::new()
        .with_html(urls[1], "<html><body>No links here</body></html>");
    let ai = MockAI::new();

    let result = comparator(&ai, &fetcher)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await;

    match result {
        Err(CompareError::NoUsableSources { failures }) => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].kind, ErrorKind::Http);
            assert_eq!(failures[1].kind, ErrorKind::InvalidFormat);
        }
        other => panic!("expected NoUsableSources, got {:?}", other.map(|r| r.status)),
    }
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn test_request_budget_bounds_the_whole_pipeline() {
    let urls = ["https://a.example/ds.pdf"];
    let fetcher = MockFetcher::new()
        .with_body(urls[0], datasheet("REG-A", &[("Voltage", "5 V"), ("Current", "1 A")]))
        .with_delay(urls[0], Duration::from_secs(10));
    let ai = MockAI::new();

    let config = test_config().with_request_timeout(Duration::from_millis(100));
    let result = comparator(&ai, &fetcher)
        .with_config(config)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await;

    assert!(matches!(result, Err(CompareError::Timeout { .. })));
}

#[tokio::test]
async fn test_compare_discovers_and_filters_candidates() {
    let fetcher = three_regulators(
        MockFetcher::new(),
        &[
            "https://a.example/ds.pdf",
            "https://b.example/ds.pdf",
            "https://c.example/ds.pdf",
        ],
    );
    let searcher = MockWebSearcher::new().with_fallback_urls(&[
        "https://a.example/ds.pdf",
        "https://vendor.example/full-catalog.pdf",
        "https://b.example/ds.pdf",
        "https://www.aliexpress.example/item.pdf",
        "https://c.example/ds.pdf",
    ]);
    let ai = MockAI::new()
        .with_task_reply(AiTask::ExtractBatch, three_regulator_batch())
        .with_task_reply(AiTask::GroupKeys, three_regulator_groups());

    let comparator = Comparator::new(ai.clone(), fetcher.clone(), searcher)
        .with_converters(mock_converters())
        .with_config(test_config());

    let response = comparator
        .compare(&CompareRequest::new("LM7805").with_count(3))
        .await
        .unwrap();

    let urls: Vec<_> = response.records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://a.example/ds.pdf",
            "https://b.example/ds.pdf",
            "https://c.example/ds.pdf"
        ]
    );
    assert_eq!(fetcher.fetch_call_count(), 3);
}

#[tokio::test]
async fn test_debug_mode_dumps_markdown_and_timings() {
    let urls = [
        "https://a.example/ds.pdf",
        "https://b.example/ds.pdf",
        "https://c.example/ds.pdf",
    ];
    let fetcher = three_regulators(MockFetcher::new(), &urls);
    let ai = MockAI::new()
        .with_task_reply(AiTask::ExtractBatch, three_regulator_batch())
        .with_task_reply(AiTask::GroupKeys, three_regulator_groups());

    let dump_dir = std::env::temp_dir().join(format!("spec-compare-{}", uuid::Uuid::new_v4()));
    let mut config = test_config().with_debug(true);
    config.debug.dump_dir = Some(dump_dir.clone());

    let response = comparator(&ai, &fetcher)
        .with_config(config)
        .compare_sources(&CompareRequest::new("regulator"), sources(&urls))
        .await
        .unwrap();

    let timings = response.timings.expect("debug mode records timings");
    assert!(timings.total >= timings.extract);

    let dumped = std::fs::read_dir(&dump_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("markdown_"))
        .count();
    assert_eq!(dumped, 3);

    std::fs::remove_dir_all(&dump_dir).ok();
}
