//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a miniature TOP500 site and run the
//! full harvest cycle end-to-end against it.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use top500_harvest::config::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use top500_harvest::crawler::{
    build_http_client, crawl, Coordinator, Crawler, Fetcher, Pacer, ReleaseSelection,
};
use top500_harvest::output::{sinks_from_config, CrawlEvent, RecordingReporter};
use top500_harvest::storage::{RunStatus, SqliteStorage, Storage};
use top500_harvest::{BaseUrl, FetchError, HarvestError, ReleaseId, Stage};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const PAGES: u32 = 5;

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

fn index_html(releases: &[&str]) -> String {
    let links: String = releases
        .iter()
        .map(|r| format!(r#"<li><a href="/lists/{}">TOP500 {}</a></li>"#, r, r))
        .collect();
    format!(
        r#"<html><body>
        <a href="/lists/top500/">Lists</a>
        <ul>{}</ul>
        </body></html>"#,
        links
    )
}

fn listing_html(system_ids: &[u32]) -> String {
    let rows: String = system_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                r#"<tr><td>{}</td><td><a href="/system/{}"><b>System {}</b></a></td><td><a href="/site/1">Site</a></td></tr>"#,
                i + 1,
                id,
                id
            )
        })
        .collect();
    format!(
        r#"<html><body><table class="table">
        <tr><th>Rank</th><th>System</th><th>Site</th></tr>
        {}
        </table></body></html>"#,
        rows
    )
}

fn detail_html(rank: u32, name: &str, os: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{name}</h1>
        <table class="table">
            <tr><th>Name:</th><td>{name}</td></tr>
            <tr><th>Manufacturer:</th><td>HPE</td></tr>
            <tr><th>Operating System:</th><td>{os}</td></tr>
        </table>
        <table class="table">
            <tr><th>List</th><th>Rank</th></tr>
            <tr class="sublist odd"><td>current</td><td>{rank}</td></tr>
            <tr class="sublist even"><td>previous</td><td>999</td></tr>
        </table>
        </body></html>"#,
        name = name,
        os = os,
        rank = rank
    )
}

async fn mount_index(server: &MockServer, releases: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/lists/top500"))
        .respond_with(html(index_html(releases)))
        .mount(server)
        .await;
}

/// Mounts all five listing pages of a release; missing pages are empty
async fn mount_release(server: &MockServer, release: &str, pages: &[&[u32]]) {
    for page in 1..=PAGES {
        let ids = pages.get(page as usize - 1).copied().unwrap_or(&[]);
        Mock::given(method("GET"))
            .and(path(format!("/list/{}/", release)))
            .and(query_param("page", page.to_string()))
            .respond_with(html(listing_html(ids)))
            .mount(server)
            .await;
    }
}

async fn mount_detail(server: &MockServer, id: u32, rank: u32, os: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/system/{}", id)))
        .respond_with(html(detail_html(rank, &format!("System {}", id), os)))
        .mount(server)
        .await;
}

/// Serves `/system/{n}` as the detail page of the system ranked `n`
struct RankedDetails;

impl Respond for RankedDetails {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id: u32 = request
            .url
            .path()
            .trim_start_matches("/system/")
            .parse()
            .unwrap_or(0);
        html(detail_html(id, &format!("System {}", id), "Linux"))
    }
}

fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
        },
        crawler: CrawlerConfig {
            page_delay_ms: 0,
            respect_robots: false,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: dir.path().join("top500.db").display().to_string(),
            summary_path: dir.path().join("summary.md").display().to_string(),
            release_dir: None,
        },
    }
}

async fn create_coordinator(config: &Config, reporter: Arc<RecordingReporter>) -> Coordinator {
    let sinks = sinks_from_config(config, "test-hash").expect("Failed to open sinks");
    Coordinator::from_config(config, reporter)
        .await
        .expect("Failed to create coordinator")
        .with_sinks(sinks)
}

fn create_crawler(base_url: &str, reporter: Arc<RecordingReporter>) -> Crawler {
    let config = CrawlerConfig::default();
    let agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    let client = build_http_client(&agent, &config).expect("Failed to build client");
    Crawler::new(
        BaseUrl::parse(base_url).expect("Invalid base URL"),
        Fetcher::new(client, "TestBot"),
        Pacer::disabled(),
        reporter,
    )
}

fn release(id: &str) -> ReleaseId {
    ReleaseId::parse(id).expect("Invalid release id")
}

fn open_db(config: &Config) -> SqliteStorage {
    SqliteStorage::new(Path::new(&config.output.database_path)).expect("Failed to open DB")
}

#[tokio::test]
async fn test_full_crawl_newest_release_first() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&mock_server, &["2019/11", "2020/06"]).await;

    // Listed in reverse rank order: the detail page decides the key
    mount_release(&mock_server, "2020/06", &[&[11, 10]]).await;
    mount_detail(&mock_server, 10, 1, "Linux").await;
    mount_detail(&mock_server, 11, 2, "CentOS").await;

    mount_release(&mock_server, "2019/11", &[&[20]]).await;
    mount_detail(&mock_server, 20, 1, "AIX").await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let reporter = Arc::new(RecordingReporter::new());
    let mut coordinator = create_coordinator(&config, reporter.clone()).await;

    let result = coordinator.run().await.expect("Crawl failed");
    drop(coordinator);

    assert_eq!(
        reporter.started_releases(),
        vec![release("2020/06"), release("2019/11")]
    );

    assert!(result.is_complete());
    assert_eq!(result.releases.len(), 2);
    assert_eq!(result.total_systems(), 3);

    let june = &result.releases[&release("2020/06")];
    assert_eq!(june.get(1).unwrap()["Name"], "System 10");
    assert_eq!(june.get(1).unwrap()["Operating System"], "Linux");
    assert_eq!(june.get(2).unwrap()["Name"], "System 11");
    assert_eq!(
        result.releases[&release("2019/11")].get(1).unwrap()["Operating System"],
        "AIX"
    );

    let storage = open_db(&config);
    let run = storage.get_latest_run().unwrap().expect("No run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(storage.count_systems().unwrap(), 3);
    assert_eq!(
        storage.load_release(&release("2020/06")).unwrap(),
        june.clone()
    );

    let summary = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(summary.contains("| 2020/06 | 2 | 0 |"));
}

#[tokio::test]
async fn test_full_release_of_500_systems() {
    let mock_server = MockServer::start().await;

    let pages: Vec<Vec<u32>> = (0..PAGES)
        .map(|p| (p * 100 + 1..=p * 100 + 100).collect())
        .collect();
    let pages: Vec<&[u32]> = pages.iter().map(Vec::as_slice).collect();
    mount_release(&mock_server, "2020/06", &pages).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/system/\d+$"))
        .respond_with(RankedDetails)
        .expect(500)
        .mount(&mock_server)
        .await;

    let reporter = Arc::new(RecordingReporter::new());
    let crawler = create_crawler(&mock_server.uri(), reporter.clone());

    let record = crawler
        .aggregate_release(&release("2020/06"))
        .await
        .expect("Aggregation failed");

    assert_eq!(record.len(), 500);
    assert_eq!(record.ranks().collect::<Vec<_>>(), (1..=500).collect::<Vec<_>>());
    assert_eq!(record.get(137).unwrap()["Name"], "System 137");
    assert!(record.skipped.is_empty());
    assert!(record.rank_collisions.is_empty());

    let pages_started = reporter
        .events()
        .iter()
        .filter(|e| matches!(e, CrawlEvent::PageStarted { .. }))
        .count();
    assert_eq!(pages_started, PAGES as usize);
}

#[tokio::test]
async fn test_broken_detail_page_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&mock_server, &["2020/06"]).await;
    mount_release(&mock_server, "2020/06", &[&[1, 2, 3]]).await;
    mount_detail(&mock_server, 1, 1, "Linux").await;
    mount_detail(&mock_server, 3, 3, "Linux").await;

    // No summary row: the rank cannot be read
    Mock::given(method("GET"))
        .and(path("/system/2"))
        .respond_with(html(
            "<html><body><table><tr><th>Name:</th><td>Broken</td></tr></table></body></html>"
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let reporter = Arc::new(RecordingReporter::new());
    let mut coordinator = create_coordinator(&config, reporter.clone()).await;

    let result = coordinator.run().await.expect("Crawl failed");
    drop(coordinator);

    let record = &result.releases[&release("2020/06")];
    assert_eq!(record.ranks().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(record.skipped.len(), 1);
    assert!(record.skipped[0].url.ends_with("/system/2"));
    assert!(record.skipped[0].page_url.ends_with("/list/2020/06/?page=1"));
    assert!(!result.is_complete());

    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, CrawlEvent::EntrySkipped { url, .. } if url.ends_with("/system/2"))));

    let storage = open_db(&config);
    assert_eq!(
        storage.get_latest_run().unwrap().unwrap().status,
        RunStatus::Partial
    );
}

#[tokio::test]
async fn test_failed_release_is_skipped_by_default() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&mock_server, &["2019/11", "2020/06"]).await;
    mount_release(&mock_server, "2020/06", &[&[1]]).await;
    mount_detail(&mock_server, 1, 1, "Linux").await;

    mount_release(&mock_server, "2019/11", &[&[2]]).await;
    Mock::given(method("GET"))
        .and(path("/system/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let reporter = Arc::new(RecordingReporter::new());
    let mut coordinator = create_coordinator(&config, reporter.clone()).await;

    let result = coordinator.run().await.expect("Crawl failed");
    drop(coordinator);

    assert_eq!(result.releases.len(), 1);
    assert!(result.releases.contains_key(&release("2020/06")));

    assert_eq!(result.failed_releases.len(), 1);
    let failed = &result.failed_releases[0];
    assert_eq!(failed.release, release("2019/11"));
    assert_eq!(failed.stage, Stage::SystemDetail);
    assert!(failed.url.ends_with("/system/2"));
    assert!(failed.message.contains("500"));

    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, CrawlEvent::ReleaseFailed { stage: Stage::SystemDetail, .. })));

    let storage = open_db(&config);
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(storage.get_failed_releases(run.id).unwrap(), result.failed_releases);
}

#[tokio::test]
async fn test_failed_release_aborts_when_not_skipping() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&mock_server, &["2019/11", "2020/06"]).await;

    // Page 3 of the newest release is not mounted and answers 404
    for page in 1..=2 {
        Mock::given(method("GET"))
            .and(path("/list/2020/06/"))
            .and(query_param("page", page.to_string()))
            .respond_with(html(listing_html(&[])))
            .mount(&mock_server)
            .await;
    }

    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawler.skip_failed_releases = false;
    let reporter = Arc::new(RecordingReporter::new());
    let mut coordinator = create_coordinator(&config, reporter.clone()).await;

    let err = coordinator.run().await.expect_err("Crawl should abort");
    drop(coordinator);

    match err {
        HarvestError::Release { release: failed, source } => {
            assert_eq!(failed, release("2020/06"));
            assert_eq!(source.stage, Stage::ListingPage);
            assert!(source.url.ends_with("/list/2020/06/?page=3"));
            assert!(matches!(
                source.source,
                HarvestError::Fetch(FetchError::Status { status: 404, .. })
            ));
        }
        other => panic!("expected a release failure, got {:?}", other),
    }

    // The older release is never started
    assert_eq!(reporter.started_releases(), vec![release("2020/06")]);

    let storage = open_db(&config);
    assert_eq!(
        storage.get_latest_run().unwrap().unwrap().status,
        RunStatus::Failed
    );
}

#[tokio::test]
async fn test_non_html_index_fails_discovery() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/lists/top500"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let mut coordinator = create_coordinator(&config, Arc::new(RecordingReporter::new())).await;

    match coordinator.run().await {
        Err(HarvestError::Discovery(stage)) => {
            assert_eq!(stage.stage, Stage::Discovery);
            assert!(matches!(
                stage.source,
                HarvestError::Fetch(FetchError::ContentMismatch { .. })
            ));
        }
        other => panic!("expected a discovery failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_index_is_an_empty_crawl() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&mock_server, &[]).await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let mut coordinator = create_coordinator(&config, Arc::new(RecordingReporter::new())).await;

    let result = coordinator.run().await.expect("Crawl failed");
    assert!(result.releases.is_empty());
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_empty_release_pages() {
    let mock_server = MockServer::start().await;
    mount_release(&mock_server, "1993/06", &[]).await;

    let crawler = create_crawler(&mock_server.uri(), Arc::new(RecordingReporter::new()));

    let page = crawler
        .extract_page(&format!("{}/list/1993/06/?page=5", mock_server.uri()))
        .await
        .expect("Page extraction failed");
    assert!(page.is_empty());

    let record = crawler
        .aggregate_release(&release("1993/06"))
        .await
        .expect("Aggregation failed");
    assert!(record.is_empty());
}

#[tokio::test]
async fn test_aggregation_is_repeatable() {
    let mock_server = MockServer::start().await;
    mount_release(&mock_server, "2020/06", &[&[1, 2], &[3]]).await;
    mount_detail(&mock_server, 1, 1, "Linux").await;
    mount_detail(&mock_server, 2, 2, "Linux").await;
    mount_detail(&mock_server, 3, 3, "Cray Linux Environment").await;

    let crawler = create_crawler(&mock_server.uri(), Arc::new(RecordingReporter::new()));

    let first = crawler.aggregate_release(&release("2020/06")).await.unwrap();
    let second = crawler.aggregate_release(&release("2020/06")).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rank_collision_keeps_later_record() {
    let mock_server = MockServer::start().await;
    mount_release(&mock_server, "2020/06", &[&[1], &[2]]).await;
    mount_detail(&mock_server, 1, 7, "Linux").await;
    mount_detail(&mock_server, 2, 7, "Windows").await;

    let reporter = Arc::new(RecordingReporter::new());
    let crawler = create_crawler(&mock_server.uri(), reporter.clone());

    let record = crawler.aggregate_release(&release("2020/06")).await.unwrap();

    assert_eq!(record.len(), 1);
    assert_eq!(record.get(7).unwrap()["Operating System"], "Windows");
    assert_eq!(record.rank_collisions.len(), 1);
    assert!(record.rank_collisions[0].url.ends_with("/system/2"));

    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, CrawlEvent::RankCollision { rank: 7, .. })));
}

#[tokio::test]
async fn test_robots_disallow_fails_release() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("User-agent: *\nDisallow: /system", "text/plain"),
        )
        .mount(&mock_server)
        .await;
    mount_index(&mock_server, &["2020/06"]).await;
    mount_release(&mock_server, "2020/06", &[&[1]]).await;
    mount_detail(&mock_server, 1, 1, "Linux").await;

    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawler.respect_robots = true;
    let mut coordinator = create_coordinator(&config, Arc::new(RecordingReporter::new())).await;

    let result = coordinator.run().await.expect("Crawl failed");

    assert!(result.releases.is_empty());
    assert_eq!(result.failed_releases.len(), 1);
    assert!(result.failed_releases[0].message.contains("robots.txt"));
}

#[tokio::test]
async fn test_selection_limits_releases() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Only the newest release is served
    mount_index(&mock_server, &["2018/11", "2019/11", "2020/06"]).await;
    mount_release(&mock_server, "2020/06", &[&[1]]).await;
    mount_detail(&mock_server, 1, 1, "Linux").await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let reporter = Arc::new(RecordingReporter::new());
    let mut coordinator = create_coordinator(&config, reporter.clone())
        .await
        .with_selection(ReleaseSelection {
            only: vec![],
            latest: Some(1),
        });

    let result = coordinator.run().await.expect("Crawl failed");

    assert_eq!(reporter.started_releases(), vec![release("2020/06")]);
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_crawl_writes_json_exports() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&mock_server, &["2020/06"]).await;
    mount_release(&mock_server, "2020/06", &[&[1]]).await;
    mount_detail(&mock_server, 1, 1, "Linux").await;

    let mut config = create_test_config(&mock_server.uri(), &dir);
    let release_dir = dir.path().join("releases");
    config.output.release_dir = Some(release_dir.display().to_string());

    let result = crawl(&config, "test-hash", ReleaseSelection::all())
        .await
        .expect("Crawl failed");
    assert_eq!(result.total_systems(), 1);

    let json = std::fs::read_to_string(release_dir.join("top500_2020_06.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["systems"]["1"]["Operating System"], "Linux");

    assert!(release_dir.join("top500.json").exists());
    assert!(Path::new(&config.output.summary_path).exists());
}
