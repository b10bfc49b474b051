//! End-to-end pipeline runs against a mock catalog

use crate::common::{
    forbid_search_page, ids, item_href, mount_items, mount_search_page, read_lines, test_config,
};
use catalog_crawler::crawler::{CrawlPipeline, CrawlResult, ProgressEvent, SearchQuery};
use catalog_crawler::state::PipelineState;
use catalog_crawler::CatalogError;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let page1 = ids("a", 5);
    let page2 = ids("b", 3);
    mount_search_page(&server, "monitor", 1, &page1).await;
    mount_search_page(&server, "monitor", 2, &page2).await;
    forbid_search_page(&server, "monitor", 3).await;
    mount_items(&server, &page1).await;
    mount_items(&server, &page2).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("monitor", 2).unwrap();
    let mut events = Vec::new();

    let result = pipeline
        .run(&query, |e| events.push(e), &CancellationToken::new())
        .await
        .expect("Crawl failed");

    let CrawlResult::Completed { path, records } = result else {
        panic!("Expected a completed crawl, got {:?}", result);
    };
    assert_eq!(records, 8);
    assert_eq!(pipeline.state(), PipelineState::Completed);

    // Rows follow discovery order: page order, then encounter order
    let expected: Vec<String> = std::iter::once("product_id".to_string())
        .chain(page1.iter().cloned())
        .chain(page2.iter().cloned())
        .collect();
    assert_eq!(read_lines(&path), expected);

    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("resultado_monitor_"));
    assert!(file_name.ends_with(".csv"));

    let stats = pipeline.stats();
    assert_eq!(stats.pages_requested, 2);
    assert_eq!(stats.links_discovered, 8);
    assert_eq!(stats.items_attempted, 8);
    assert_eq!(stats.records_written, 8);
    assert_eq!(stats.items_skipped, 0);

    assert_eq!(
        events.first(),
        Some(&ProgressEvent::new(1, 4, "Fetched search page 1 (5 links so far)"))
    );
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::new(10, 12, "Extracted 8 products"))
    );
}

#[tokio::test]
async fn test_discovery_stops_at_first_empty_page() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let page1 = ids("x", 2);
    mount_search_page(&server, "tv", 1, &page1).await;
    mount_search_page(&server, "tv", 2, &[]).await;
    forbid_search_page(&server, "tv", 3).await;
    forbid_search_page(&server, "tv", 4).await;
    mount_items(&server, &page1).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("tv", 5).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.records(), 2);
    assert_eq!(pipeline.stats().pages_requested, 2);
}

#[tokio::test]
async fn test_links_repeated_across_pages_are_visited_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let page1 = ids("p", 3);
    let mut page2 = ids("q", 2);
    page2.push("p1".to_string());
    mount_search_page(&server, "cabo", 1, &page1).await;
    mount_search_page(&server, "cabo", 2, &page2).await;
    mount_items(&server, &page1).await;
    mount_items(&server, &ids("q", 2)).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("cabo", 2).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.records(), 5);
    assert_eq!(pipeline.stats().links_discovered, 5);
}

#[tokio::test]
async fn test_no_links_creates_no_file() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let output_dir = out.path().join("CSV");

    mount_search_page(&server, "nada", 1, &[]).await;
    forbid_search_page(&server, "nada", 2).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), &output_dir)).unwrap();
    let query = SearchQuery::new("nada", 3).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result, CrawlResult::NoRecords);
    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_failed_search_page_ends_discovery() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // One initial attempt plus three retries, then the page counts as empty
    Mock::given(method("GET"))
        .and(path("/busca/monitor/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&server)
        .await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("monitor", 3).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result, CrawlResult::NoRecords);
    assert_eq!(pipeline.stats().pages_requested, 1);
}

#[tokio::test]
async fn test_single_503_is_retried_not_skipped() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let items = ids("r", 1);
    mount_search_page(&server, "monitor", 1, &items).await;

    Mock::given(method("GET"))
        .and(path(item_href(&items[0])))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_items(&server, &items).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("monitor", 1).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.records(), 1);
    assert_eq!(pipeline.stats().items_skipped, 0);
}

#[tokio::test]
async fn test_one_permanently_failing_item_among_ten() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let items = ids("m", 10);
    mount_search_page(&server, "monitor", 1, &items).await;

    Mock::given(method("GET"))
        .and(path(item_href(&items[4])))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;
    let healthy: Vec<String> = items
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 4)
        .map(|(_, id)| id.clone())
        .collect();
    mount_items(&server, &healthy).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("monitor", 1).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.records(), 9);
    assert_eq!(pipeline.stats().items_attempted, 10);
    assert_eq!(pipeline.stats().items_skipped, 1);

    let lines = read_lines(result.output_path().unwrap());
    assert_eq!(lines.len(), 10);
    assert!(!lines.contains(&items[4]));
}

#[tokio::test]
async fn test_identifier_read_from_final_url() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/busca/fone/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/go/p/short1/">A</a>
               <a href="/go/p/short2/">B</a>
               <a href="/go/p/short3/">C</a>"#,
        ))
        .mount(&server)
        .await;

    // Redirects to the canonical item URL
    let canonical = format!("{}/fone-jbl/p/canon99/", server.uri());
    Mock::given(method("GET"))
        .and(path("/go/p/short1/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", canonical.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fone-jbl/p/canon99/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // Redirects somewhere without an identifier: skipped
    let unavailable = format!("{}/indisponivel/", server.uri());
    Mock::given(method("GET"))
        .and(path("/go/p/short2/"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", unavailable.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/indisponivel/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // Client errors are skipped without a retry
    Mock::given(method("GET"))
        .and(path("/go/p/short3/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("fone", 1).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.records(), 1);
    assert_eq!(
        read_lines(result.output_path().unwrap()),
        vec!["product_id", "canon99"]
    );
}

#[tokio::test]
async fn test_cancel_during_extraction_keeps_partial_file() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let items = ids("c", 25);
    mount_search_page(&server, "monitor", 1, &items).await;
    for id in &items {
        Mock::given(method("GET"))
            .and(path(item_href(id)))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("monitor", 1).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    // Cancel as soon as the tenth record is reported
    let result = pipeline
        .run(
            &query,
            move |event: ProgressEvent| {
                if event.message == "Extracted 10 products..." {
                    trigger.cancel();
                }
            },
            &cancel,
        )
        .await
        .expect("Cancellation is not an error");

    let CrawlResult::Cancelled {
        partial: Some(path),
        records,
    } = result
    else {
        panic!("Expected a cancelled crawl with a partial file, got {:?}", result);
    };
    assert_eq!(records, 10);
    assert_eq!(pipeline.state(), PipelineState::Cancelled);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], "product_id");
    assert_eq!(lines[1..], items[..10]);

    assert_eq!(pipeline.stats().items_attempted, 10);
}

#[tokio::test]
async fn test_cancel_during_discovery_writes_nothing() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let output_dir = out.path().join("CSV");

    mount_search_page(&server, "monitor", 1, &ids("d", 4)).await;
    forbid_search_page(&server, "monitor", 2).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), &output_dir)).unwrap();
    let query = SearchQuery::new("monitor", 3).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let result = pipeline
        .run(&query, move |_| trigger.cancel(), &cancel)
        .await
        .unwrap();

    assert_eq!(
        result,
        CrawlResult::Cancelled {
            partial: None,
            records: 0
        }
    );
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_cancel_on_last_search_page_writes_nothing() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let output_dir = out.path().join("CSV");

    mount_search_page(&server, "monitor", 1, &ids("e", 3)).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), &output_dir)).unwrap();
    let query = SearchQuery::new("monitor", 1).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let result = pipeline
        .run(&query, move |_| trigger.cancel(), &cancel)
        .await
        .unwrap();

    assert_eq!(
        result,
        CrawlResult::Cancelled {
            partial: None,
            records: 0
        }
    );
    assert_eq!(pipeline.state(), PipelineState::Cancelled);
    assert_eq!(pipeline.stats().items_attempted, 0);
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_unwritable_output_fails_run() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("not-a-directory");
    std::fs::write(&blocker, "").unwrap();

    mount_search_page(&server, "monitor", 1, &ids("f", 2)).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), &blocker)).unwrap();
    let query = SearchQuery::new("monitor", 1).unwrap();

    let result = pipeline
        .run(&query, |_| {}, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(CatalogError::Sink(_))));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let items = ids("g", 23);
    mount_search_page(&server, "monitor", 1, &items).await;
    mount_search_page(&server, "monitor", 2, &[]).await;
    mount_items(&server, &items).await;

    let mut pipeline = CrawlPipeline::new(test_config(&server.uri(), out.path())).unwrap();
    let query = SearchQuery::new("monitor", 4).unwrap();
    let mut events = Vec::new();

    pipeline
        .run(&query, |e| events.push(e), &CancellationToken::new())
        .await
        .unwrap();

    let completed: Vec<u64> = events.iter().map(|e| e.completed).collect();
    assert_eq!(completed, vec![1, 4, 14, 24, 27]);

    let totals: Vec<u64> = events.iter().map(|e| e.total).collect();
    assert!(totals.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(totals[0], 8);
    assert_eq!(*totals.last().unwrap(), 8 + 23);
}
