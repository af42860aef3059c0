//! End-to-end tests for the merge pipeline against a mock HTTP server.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use sgmodule_merger::clean::divider;
use sgmodule_merger::config::{MergeConfig, DATE_FORMAT, MAX_RESPONSE_SIZE};
use sgmodule_merger::http::create_client;
use sgmodule_merger::types::{Category, SourceDescriptor};
use sgmodule_merger::{merge_sources, run, MergeOutcome, MergerError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

async fn mount_module(server: &MockServer, route: &str, fixture: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture(fixture)))
        .expect(1)
        .mount(server)
        .await;
}

/// Write a sources list and the fixture template into `dir`, returning a config
/// whose outputs also live in `dir`.
fn write_inputs(dir: &Path, sources: &[(&str, &str)]) -> MergeConfig {
    let yaml: String = sources
        .iter()
        .map(|(url, header)| format!("- url: {url}\n  header: {header}\n"))
        .collect();
    let sources_path = dir.join("sgmodules.yaml");
    fs::write(&sources_path, yaml).unwrap();

    let template_path = dir.join("All-in-One.sgmodule.template");
    fs::write(&template_path, load_fixture("All-in-One.sgmodule.template")).unwrap();

    MergeConfig::default()
        .with_sources_path(sources_path)
        .with_template_path(template_path)
        .with_rule_list_path(dir.join("ruleset").join("reject.list"))
        .with_direct_list_path(dir.join("ruleset").join("direct.list"))
        .with_output_path(dir.join("sgmodule").join("All-in-One.sgmodule"))
}

async fn run_blocking(config: MergeConfig) -> sgmodule_merger::Result<sgmodule_merger::MergeSummary> {
    tokio::task::spawn_blocking(move || run(&config))
        .await
        .expect("merge task panicked")
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_merge_skips_failed_source() {
    let server = MockServer::start().await;
    mount_module(&server, "/ads.sgmodule", "ads.sgmodule").await;
    mount_module(&server, "/video.sgmodule", "video.sgmodule").await;
    Mock::given(method("GET"))
        .and(path("/broken.sgmodule"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let base = server.uri();
    let ads_url = format!("{base}/ads.sgmodule");
    let broken_url = format!("{base}/broken.sgmodule");
    let video_url = format!("{base}/video.sgmodule");
    let config = write_inputs(
        dir.path(),
        &[
            (ads_url.as_str(), "Ads"),
            (broken_url.as_str(), "Broken"),
            (video_url.as_str(), "Video"),
        ],
    );

    let summary = run_blocking(config.clone()).await.unwrap();

    assert_eq!(summary.merged, ["Ads", "Video"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].header, "Broken");
    assert!(summary.failed[0].error.contains("404"));
    assert!(summary.counts.contains(&(Category::Script, 2)));
    assert!(summary.counts.contains(&(Category::Mitm, 3)));
    assert_eq!(summary.reject_stats.total(), 4);
    assert_eq!(summary.direct_stats.total(), 2);

    assert_eq!(
        read(&config.rule_list_path),
        "# >> Ads\n\
         DOMAIN-SUFFIX,ads.example.com\n\
         DOMAIN,tracker.example.com\n\
         IP-CIDR,203.0.113.0/24,no-resolve\n\
         \n\
         # >> Video\n\
         DOMAIN-KEYWORD,preroll\n"
    );
    assert_eq!(
        read(&config.direct_list_path),
        "# >> Ads\nDOMAIN,static.example.com\n\n# >> Video\nDOMAIN,cdn.example.net\n"
    );

    let module = read(&config.output_path);
    let date_line = module
        .lines()
        .find_map(|l| l.strip_prefix("#!date="))
        .expect("date line present");
    assert!(chrono::NaiveDate::parse_from_str(date_line, DATE_FORMAT).is_ok());

    let ads = divider("Ads");
    let video = divider("Video");
    let expected = format!(
        "#!name=All-in-One\n\
         #!desc=Merged from: Ads, Video\n\
         #!date={date_line}\n\
         \n\
         [Rule]\n\
         RULE-SET,https://example.com/ruleset/reject.list,REJECT\n\
         \n\
         [URL Rewrite]\n\
         {ads}\n\
         ^https:\\/\\/api\\.example\\.com\\/splash - reject\n\
         \n\
         [Map Local]\n\
         {ads}\n\
         ^https:\\/\\/api\\.example\\.com\\/banner data-type=text data=\"{{}}\" status-code=200\n\
         \n\
         [Script]\n\
         {ads}\n\
         ads-clean = type=http-response,pattern=^https:\\/\\/api\\.example\\.com\\/feed,requires-body=1,script-path=https://scripts.example.com/feed.js\n\
         \n\
         {video}\n\
         video-clean = type=http-response,pattern=^https:\\/\\/video\\.example\\.net\\/play,requires-body=1,script-path=https://scripts.example.com/video.js\n\
         \n\
         [MITM]\n\
         hostname = %APPEND% api.example.com, ads.example.com, video.example.net\n"
    );
    assert_eq!(module, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_merge_with_all_sources_failing_still_writes_outputs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/ads.sgmodule", server.uri());
    let config = write_inputs(dir.path(), &[(url.as_str(), "Ads")]);

    let summary = run_blocking(config.clone()).await.unwrap();

    assert!(summary.merged.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(read(&config.rule_list_path), "");
    assert_eq!(read(&config.direct_list_path), "");

    let module = read(&config.output_path);
    assert!(module.contains("#!desc=Merged from: \n"));
    assert!(module.contains("[Script]\n\n"));
    assert!(module.contains("hostname = %APPEND% \n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_template_fails_before_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("ads.sgmodule")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/ads.sgmodule", server.uri());
    let config = write_inputs(dir.path(), &[(url.as_str(), "Ads")])
        .with_template_path(dir.path().join("missing.template"));

    let err = run_blocking(config.clone()).await.unwrap_err();

    assert!(matches!(err, MergerError::TemplateRead { .. }));
    assert!(!config.output_path.exists());
    assert!(!config.rule_list_path.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_source_fails_before_download() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path(), &[("ftp://example.com/ads.sgmodule", "Ads")]);

    let err = run_blocking(config).await.unwrap_err();

    assert!(matches!(err, MergerError::InvalidSource { .. }));
}

async fn merge_blocking(sources: Vec<SourceDescriptor>) -> MergeOutcome {
    tokio::task::spawn_blocking(move || {
        let client = create_client().unwrap();
        merge_sources(&client, &sources)
    })
    .await
    .expect("merge task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_merge_sources_in_order() {
    let server = MockServer::start().await;
    mount_module(&server, "/ads.sgmodule", "ads.sgmodule").await;
    mount_module(&server, "/video.sgmodule", "video.sgmodule").await;

    let base = server.uri();
    let outcome = merge_blocking(vec![
        SourceDescriptor::new(format!("{base}/video.sgmodule"), "Video"),
        SourceDescriptor::new(format!("{base}/ads.sgmodule"), "Ads"),
    ])
    .await;

    assert_eq!(outcome.headers, ["Video", "Ads"]);
    assert!(outcome.failed.is_empty());
    let scripts = outcome.sections.blocks(Category::Script);
    assert_eq!(scripts.len(), 2);
    assert!(scripts[0].starts_with(&divider("Video")));
    assert!(scripts[1].starts_with(&divider("Ads")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_source_is_skipped() {
    let server = MockServer::start().await;
    mount_module(&server, "/ads.sgmodule", "ads.sgmodule").await;
    let oversized = vec![b'#'; MAX_RESPONSE_SIZE as usize + 1];
    Mock::given(method("GET"))
        .and(path("/huge.sgmodule"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(oversized))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let outcome = merge_blocking(vec![
        SourceDescriptor::new(format!("{base}/huge.sgmodule"), "Huge"),
        SourceDescriptor::new(format!("{base}/ads.sgmodule"), "Ads"),
    ])
    .await;

    assert_eq!(outcome.headers, ["Ads"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].header, "Huge");
    assert!(outcome.failed[0].error.contains("too large"));
    assert_eq!(outcome.sections.count(Category::Script), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_utf8_source_still_merges() {
    let server = MockServer::start().await;
    let mut body = b"[Script]\nlatin = type=cron,argument=caf".to_vec();
    body.push(0xe9);
    body.extend_from_slice(b"\n[MITM]\nhostname = %APPEND% latin.example.com\n");
    Mock::given(method("GET"))
        .and(path("/latin.sgmodule"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = merge_blocking(vec![SourceDescriptor::new(
        format!("{}/latin.sgmodule", server.uri()),
        "Latin",
    )])
    .await;

    assert_eq!(outcome.headers, ["Latin"]);
    assert_eq!(
        outcome.sections.blocks(Category::Script)[0],
        format!("{}\nlatin = type=cron,argument=caf\u{fffd}", divider("Latin"))
    );
    assert_eq!(outcome.sections.hostnames().joined(), "latin.example.com");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unwritable_module_leaves_rule_lists_untouched() {
    let server = MockServer::start().await;
    mount_module(&server, "/ads.sgmodule", "ads.sgmodule").await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/ads.sgmodule", server.uri());
    let blocker = dir.path().join("sgmodule");
    fs::write(&blocker, "not a directory").unwrap();
    let config = write_inputs(dir.path(), &[(url.as_str(), "Ads")])
        .with_output_path(blocker.join("All-in-One.sgmodule"));

    let err = run_blocking(config.clone()).await.unwrap_err();

    assert!(matches!(err, MergerError::OutputWrite { .. }));
    assert!(!config.rule_list_path.exists());
    assert!(!config.direct_list_path.exists());
}
