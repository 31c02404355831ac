// Tests for crawl orchestration against a mock site

use linkharvest_core::{
    ArtifactKind, CrawlError, CrawlSettings, CrawlState, GoogleMode, Harvester, MemorySink,
    UrlFilter, UrlMode,
};
use linkharvest_scanner::PageFetcher;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn harvester() -> Harvester {
    Harvester::with_fetcher(PageFetcher::with_timeout(5).unwrap())
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

/// A small blog: `/blog` links to one child, one sibling section and one
/// external site.
async fn blog_site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/blog",
        html_page(
            "Blog",
            r#"<p>Welcome to the blog about crawling.</p>
               <a href="/blog/post-1">First post</a>
               <a href="/about">About</a>
               <a href="https://other.com/x">Elsewhere</a>"#,
        ),
    )
    .await;
    mount_page(
        &server,
        "/blog/post-1",
        html_page("First post", "<p>Crawling a blog one post at a time.</p>"),
    )
    .await;
    mount_page(&server, "/about", html_page("About", "<p>About us.</p>")).await;
    server
}

fn page_urls(session: &linkharvest_core::CrawlSession) -> Vec<String> {
    session.pages.iter().map(|p| p.url.clone()).collect()
}

// ============================================================================
// Scope and quotas
// ============================================================================

#[tokio::test]
async fn test_crawl_stays_within_base_path() {
    let server = blog_site().await;
    let base = format!("{}/blog", server.uri());

    let mut settings = CrawlSettings::new([base.clone()]);
    settings.max_depth = 1;
    settings.max_pages = 10;

    let sink = MemorySink::new();
    let session = harvester().run_crawl(settings, &sink).await.unwrap();

    let urls = page_urls(&session);
    assert_eq!(urls, vec![base.clone(), format!("{}/blog/post-1", server.uri())]);
    assert_eq!(session.pages[0].depth, 0);
    assert_eq!(session.pages[1].depth, 1);
    assert!(!urls.iter().any(|u| u.ends_with("/about")));
    assert!(!urls.iter().any(|u| u.contains("other.com")));
    assert_eq!(session.processed, 2);
}

#[tokio::test]
async fn test_max_depth_zero_fetches_only_base() {
    let server = blog_site().await;
    let base = format!("{}/blog", server.uri());

    let settings = CrawlSettings::new([base.clone()]);
    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(page_urls(&session), vec![base]);
}

#[tokio::test]
async fn test_page_quota_stops_crawl() {
    let server = blog_site().await;
    let base = format!("{}/blog", server.uri());

    let mut settings = CrawlSettings::new([base.clone()]);
    settings.max_depth = 3;
    settings.max_pages = 1;

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(session.processed, 1);
    assert_eq!(page_urls(&session), vec![base.clone()]);
    assert_eq!(session.processed_for(&base), 1);
}

#[tokio::test]
async fn test_url_filter_limits_followed_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs",
        html_page(
            "Docs",
            r#"<a href="/docs/guide">Guide</a><a href="/docs/api">API</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/docs/guide", html_page("Guide", "<p>Guide</p>")).await;
    mount_page(&server, "/docs/api", html_page("API", "<p>API</p>")).await;

    let base = format!("{}/docs", server.uri());
    let mut settings = CrawlSettings::new([base.clone()]);
    settings.max_depth = 1;
    settings.url_filter = UrlFilter::contains("GUIDE");

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(
        page_urls(&session),
        vec![base, format!("{}/docs/guide", server.uri())]
    );
}

#[tokio::test]
async fn test_invalid_filter_is_ignored() {
    let server = blog_site().await;
    let base = format!("{}/blog", server.uri());

    let mut settings = CrawlSettings::new([base]);
    settings.max_depth = 1;
    settings.url_filter = UrlFilter::regex("(unclosed");

    let actions = Arc::new(Mutex::new(Vec::new()));
    let recorded = actions.clone();
    let harvester = harvester().with_action_callback(Arc::new(move |action: String| {
        recorded.lock().unwrap().push(action);
    }));

    let session = harvester
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(session.pages.len(), 2);
    let actions = actions.lock().unwrap();
    assert!(actions.iter().any(|a| a.starts_with("Invalid URL filter ignored")));
}

#[tokio::test]
async fn test_list_mode_never_follows_links() {
    let server = blog_site().await;
    let blog = format!("{}/blog", server.uri());
    let about = format!("{}/about", server.uri());

    let mut settings = CrawlSettings::new([blog.clone(), about.clone()]);
    settings.url_mode = UrlMode::List;
    settings.max_depth = 2;

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(page_urls(&session), vec![blog, about]);
}

// ============================================================================
// Failures and broken links
// ============================================================================

#[tokio::test]
async fn test_missing_page_recorded_as_broken_link() {
    let server = MockServer::start().await;
    let base = format!("{}/missing", server.uri());

    let mut settings = CrawlSettings::new([base.clone()]);
    settings.broken_link_checker = true;

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert!(session.pages.is_empty());
    assert_eq!(session.processed, 1);
    assert_eq!(session.failures.len(), 1);
    assert_eq!(session.broken_links.len(), 1);
    assert_eq!(session.broken_links[0].url, base);
    assert_eq!(session.broken_links[0].status_code, Some(404));
    assert!(session.broken_links[0].error.is_some());
}

#[tokio::test]
async fn test_missing_page_without_checker_is_only_a_failure() {
    let server = MockServer::start().await;
    let base = format!("{}/missing", server.uri());

    let session = harvester()
        .run_crawl(CrawlSettings::new([base]), &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(session.failures.len(), 1);
    assert!(session.broken_links.is_empty());
}

#[tokio::test]
async fn test_every_visited_url_is_a_page_or_failure() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/shop",
        html_page(
            "Shop",
            r#"<a href="/shop/a">A</a><a href="/shop/gone">Gone</a><a href="/shop/b">B</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/shop/a", html_page("A", "<p>A</p>")).await;
    mount_page(&server, "/shop/b", html_page("B", "<p>B</p>")).await;

    let mut settings = CrawlSettings::new([format!("{}/shop", server.uri())]);
    settings.max_depth = 1;

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(session.pages.len(), 3);
    assert_eq!(session.failures.len(), 1);
    assert_eq!(session.visited.len(), session.pages.len() + session.failures.len());
    assert_eq!(session.processed, session.visited.len());
}

#[tokio::test]
async fn test_invalid_settings_fail_run() {
    let harvester = harvester();
    let result = harvester
        .run_crawl(CrawlSettings::default(), &MemorySink::new())
        .await;

    assert!(matches!(result, Err(CrawlError::InvalidSettings(_))));
    assert!(matches!(harvester.state(), CrawlState::Failed(_)));
}

// ============================================================================
// Run lifecycle
// ============================================================================

#[tokio::test]
async fn test_state_transitions_to_completed() {
    let server = blog_site().await;
    let harvester = harvester();
    assert_eq!(harvester.state(), CrawlState::Idle);

    let progress = Arc::new(Mutex::new(Vec::new()));
    let recorded = progress.clone();
    let harvester = harvester.with_progress_callback(Arc::new(
        move |processed: usize, total: usize, status: String| {
            recorded.lock().unwrap().push((processed, total, status));
        },
    ));

    let settings = CrawlSettings::new([format!("{}/blog", server.uri())]);
    harvester
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(harvester.state(), CrawlState::Completed);
    let progress = progress.lock().unwrap();
    assert_eq!(progress.first().map(|p| p.2.as_str()), Some("Starting crawl"));
    assert_eq!(progress.last().map(|p| p.2.as_str()), Some("Crawl complete"));
}

#[tokio::test]
async fn test_second_run_rejected_while_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Slow", "<p>Eventually.</p>"))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let harvester = harvester();
    let sink = MemorySink::new();
    let settings = CrawlSettings::new([format!("{}/slow", server.uri())]);

    let (first, second) = tokio::join!(harvester.run_crawl(settings.clone(), &sink), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        harvester.run_crawl(settings.clone(), &sink).await
    });

    assert!(matches!(second, Err(CrawlError::AlreadyRunning)));
    let session = first.unwrap();
    assert_eq!(session.pages.len(), 1);
    assert_eq!(harvester.state(), CrawlState::Completed);
}

#[tokio::test]
async fn test_cancellation_keeps_completed_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/news",
        html_page(
            "News",
            r#"<a href="/news/one">One</a><a href="/news/two">Two</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/news/one", html_page("One", "<p>One</p>")).await;
    mount_page(&server, "/news/two", html_page("Two", "<p>Two</p>")).await;

    let harvester = harvester();
    let cancel = harvester.cancel_flag();
    let harvester = harvester.with_progress_callback(Arc::new(
        move |processed: usize, _total: usize, _status: String| {
            if processed == 1 {
                cancel.store(true, Ordering::Relaxed);
            }
        },
    ));

    let mut settings = CrawlSettings::new([format!("{}/news", server.uri())]);
    settings.max_depth = 1;

    let sink = MemorySink::new();
    let result = harvester.run_crawl(settings, &sink).await;

    assert!(matches!(result, Err(CrawlError::Cancelled)));
    assert!(matches!(harvester.state(), CrawlState::Failed(_)));

    let reports = sink.find(ArtifactKind::MasterReport);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].content.contains("Total Pages Processed: 1"));
}

// ============================================================================
// Seeding from sitemaps and search results
// ============================================================================

#[tokio::test]
async fn test_sitemap_seeds_frontier_within_depth() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{uri}/docs</loc></url>
  <url><loc>{uri}/docs/intro</loc></url>
  <url><loc>{uri}/docs/intro/deep</loc></url>
  <url><loc>{uri}/pricing</loc></url>
</urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/docs/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;
    mount_page(&server, "/docs", html_page("Docs", "<p>Docs</p>")).await;
    mount_page(&server, "/docs/intro", html_page("Intro", "<p>Intro</p>")).await;
    mount_page(&server, "/docs/intro/deep", html_page("Deep", "<p>Deep</p>")).await;

    let mut settings = CrawlSettings::new([format!("{}/docs", uri)]);
    settings.crawl_sitemap = true;
    settings.max_depth = 1;

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    let urls = page_urls(&session);
    assert_eq!(urls.len(), 2);
    assert!(urls.contains(&format!("{}/docs", uri)));
    assert!(urls.contains(&format!("{}/docs/intro", uri)));
}

#[tokio::test]
async fn test_sitemap_mode_without_sitemap_crawls_nothing() {
    let server = blog_site().await;

    let mut settings = CrawlSettings::new([format!("{}/blog", server.uri())]);
    settings.crawl_sitemap = true;

    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert!(session.pages.is_empty());
    assert_eq!(session.processed, 0);
}

#[tokio::test]
async fn test_google_queries_resolve_to_list_crawl() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let results = format!(
        r#"<html><body>
            <a href="/url?q={uri}/result-a&amp;sa=U">A</a>
            <a href="{uri}/result-b?utm=1">B</a>
            <a href="https://www.google.com/preferences">Prefs</a>
        </body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust crawler"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/result-a",
        html_page("Result A", r#"<a href="/result-a/more">More</a>"#),
    )
    .await;
    mount_page(&server, "/result-b", html_page("Result B", "<p>B</p>")).await;

    let mut settings = CrawlSettings::new(["rust crawler"]);
    settings.url_mode = UrlMode::Google;
    settings.google_mode = GoogleMode::Queries;
    settings.max_depth = 2;

    let session = harvester()
        .with_search_endpoint(format!("{}/search", uri))
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    assert_eq!(session.settings.url_mode, UrlMode::List);
    assert_eq!(session.settings.max_depth, 0);
    assert_eq!(
        page_urls(&session),
        vec![format!("{}/result-a", uri), format!("{}/result-b", uri)]
    );
}

#[tokio::test]
async fn test_google_mode_without_results_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nothing</html>"))
        .mount(&server)
        .await;

    let mut settings = CrawlSettings::new(["no such thing"]);
    settings.url_mode = UrlMode::Google;

    let result = harvester()
        .with_search_endpoint(format!("{}/search", server.uri()))
        .run_crawl(settings, &MemorySink::new())
        .await;

    assert!(matches!(result, Err(CrawlError::NoSearchResults)));
}

// ============================================================================
// Rate limiting
// ============================================================================

const DELAY_MS: u64 = 400;

/// `/docs` linking to the given children, each of which is mounted unless
/// listed in `missing`.
async fn docs_site(children: &[&str], missing: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    let links: String = children
        .iter()
        .map(|c| format!(r#"<a href="/docs/{}">{}</a>"#, c, c))
        .collect();
    mount_page(&server, "/docs", html_page("Docs", &links)).await;
    for child in children.iter().filter(|c| !missing.contains(*c)) {
        mount_page(
            &server,
            &format!("/docs/{}", child),
            html_page(child, "<p>Reference material.</p>"),
        )
        .await;
    }
    server
}

async fn timed_crawl(settings: CrawlSettings) -> (linkharvest_core::CrawlSession, Duration) {
    let started = Instant::now();
    let session = harvester()
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();
    (session, started.elapsed())
}

#[tokio::test]
async fn test_delay_between_fetches_but_not_after_last() {
    let server = docs_site(&["a", "b"], &[]).await;
    let mut settings = CrawlSettings::new([format!("{}/docs", server.uri())]);
    settings.max_depth = 1;
    settings.delay_ms = DELAY_MS;

    let (session, elapsed) = timed_crawl(settings).await;

    assert_eq!(session.pages.len(), 3);
    // two gaps between three fetches, none after the last
    assert!(elapsed >= Duration::from_millis(2 * DELAY_MS), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3 * DELAY_MS), "{:?}", elapsed);
}

#[tokio::test]
async fn test_delay_follows_failed_fetch() {
    let server = docs_site(&["gone", "a"], &["gone"]).await;
    let mut settings = CrawlSettings::new([format!("{}/docs", server.uri())]);
    settings.max_depth = 1;
    settings.delay_ms = DELAY_MS;

    let (session, elapsed) = timed_crawl(settings).await;

    assert_eq!(session.pages.len(), 2);
    assert_eq!(session.failures.len(), 1);
    assert!(session.failures[0].url.ends_with("/docs/gone"));
    assert!(elapsed >= Duration::from_millis(2 * DELAY_MS), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3 * DELAY_MS), "{:?}", elapsed);
}

#[tokio::test]
async fn test_no_delay_once_quota_reached() {
    let server = docs_site(&["a", "b"], &[]).await;
    let mut settings = CrawlSettings::new([format!("{}/docs", server.uri())]);
    settings.max_depth = 1;
    settings.max_pages = 2;
    settings.delay_ms = DELAY_MS;

    let (session, elapsed) = timed_crawl(settings).await;

    assert_eq!(session.pages.len(), 2);
    assert!(elapsed >= Duration::from_millis(DELAY_MS), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2 * DELAY_MS), "{:?}", elapsed);
}

// ============================================================================
// Outputs
// ============================================================================

#[tokio::test]
async fn test_outputs_delivered_in_order() {
    let server = blog_site().await;

    let mut settings = CrawlSettings::new([format!("{}/blog", server.uri())]);
    settings.max_depth = 1;
    settings.keyword_density = true;
    settings.csv_export = true;
    settings.save_individual_files = true;

    let sink = MemorySink::new();
    let session = harvester().run_crawl(settings, &sink).await.unwrap();

    let artifacts = sink.artifacts();
    assert_eq!(artifacts[0].kind, ArtifactKind::MasterReport);
    assert!(artifacts[0].prompt_save_location);
    assert!(artifacts[0].filename.starts_with("linkharvest_"));
    assert!(artifacts[0].content.starts_with("LINKHARVEST EXTRACTION RESULTS"));

    let csvs = sink.find(ArtifactKind::Csv);
    assert!(csvs.iter().any(|a| a.filename.starts_with("seo_analysis_")));
    assert!(csvs.iter().any(|a| a.filename.starts_with("keyword_density_")));

    let page_files = sink.find(ArtifactKind::PageFile);
    assert_eq!(page_files.len(), session.pages.len());
    assert!(page_files.iter().all(|a| a.filename.starts_with("LinkHarvest/")));
    assert!(!session.aggregate_keywords.is_empty());
}

#[tokio::test]
async fn test_webhook_posted_on_success() {
    let server = blog_site().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = CrawlSettings::new([format!("{}/blog", server.uri())]);
    settings.webhook_url = Some(format!("{}/hook", server.uri()));

    let actions = Arc::new(Mutex::new(Vec::new()));
    let recorded = actions.clone();
    let harvester = harvester().with_action_callback(Arc::new(move |action: String| {
        recorded.lock().unwrap().push(action);
    }));

    harvester
        .run_crawl(settings, &MemorySink::new())
        .await
        .unwrap();

    let actions = actions.lock().unwrap();
    assert!(actions.iter().any(|a| a == "Webhook notification sent successfully"));
}

#[tokio::test]
async fn test_webhook_failure_does_not_fail_crawl() {
    let server = blog_site().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut settings = CrawlSettings::new([format!("{}/blog", server.uri())]);
    settings.webhook_url = Some(format!("{}/hook", server.uri()));

    let harvester = harvester();
    let result = harvester.run_crawl(settings, &MemorySink::new()).await;

    assert!(result.is_ok());
    assert_eq!(harvester.state(), CrawlState::Completed);
}

// ============================================================================
// Sitemap extraction
// ============================================================================

#[tokio::test]
async fn test_extract_sitemap_content_respects_page_limit() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let sitemap = format!(
        r#"<urlset>
  <url><loc>{uri}/a</loc></url>
  <url><loc>{uri}/b</loc></url>
  <url><loc>{uri}/c</loc></url>
</urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;
    mount_page(&server, "/a", html_page("A", "<p>Alpha</p>")).await;
    mount_page(&server, "/b", html_page("B", "<p>Beta</p>")).await;

    let mut settings = CrawlSettings::new([uri.clone()]);
    settings.max_pages = 2;

    let sink = MemorySink::new();
    let extraction = harvester()
        .extract_sitemap_content(settings, &sink)
        .await
        .unwrap();

    assert_eq!(extraction.validation.total_urls, 3);
    assert_eq!(extraction.validation.valid_sitemaps, 1);
    assert_eq!(extraction.processed, 2);
    assert_eq!(extraction.pages.len(), 2);

    let reports = sink.find(ArtifactKind::SitemapReport);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].filename.starts_with("sitemap_extract_"));
}

#[tokio::test]
async fn test_extract_sitemap_content_without_sitemaps_fails() {
    let server = MockServer::start().await;
    let settings = CrawlSettings::new([server.uri()]);

    let harvester = harvester();
    let sink = MemorySink::new();
    let result = harvester.extract_sitemap_content(settings, &sink).await;

    assert!(matches!(result, Err(CrawlError::InvalidSettings(_))));
    assert!(sink.is_empty());
    assert!(matches!(harvester.state(), CrawlState::Failed(_)));
}

#[tokio::test]
async fn test_extract_sitemap_content_keeps_broken_links() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<urlset><url><loc>{uri}/guide</loc></url></urlset>")),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/guide",
        html_page("Guide", r#"<a href="/retired">Old guide</a>"#),
    )
    .await;

    let mut settings = CrawlSettings::new([uri.clone()]);
    settings.broken_link_checker = true;

    let sink = MemorySink::new();
    let extraction = harvester()
        .extract_sitemap_content(settings, &sink)
        .await
        .unwrap();

    assert_eq!(extraction.pages.len(), 1);
    assert_eq!(extraction.broken_links.len(), 1);
    assert_eq!(extraction.broken_links[0].url, format!("{}/retired", uri));
    assert_eq!(extraction.broken_links[0].status_code, Some(404));
    assert_eq!(
        extraction.broken_links[0].found_on.as_deref(),
        Some(format!("{}/guide", uri).as_str())
    );

    let reports = sink.find(ArtifactKind::SitemapReport);
    assert!(reports[0].content.contains("BROKEN LINKS FOUND:\n"));
    assert!(reports[0].content.contains("Status Code: 404\n"));
}

#[tokio::test]
async fn test_extract_sitemap_content_delays_between_pages() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{uri}/a</loc></url><url><loc>{uri}/b</loc></url></urlset>"
        )))
        .mount(&server)
        .await;
    mount_page(&server, "/a", html_page("A", "<p>Alpha</p>")).await;
    mount_page(&server, "/b", html_page("B", "<p>Beta</p>")).await;

    let mut settings = CrawlSettings::new([uri]);
    settings.delay_ms = DELAY_MS;

    let started = Instant::now();
    let extraction = harvester()
        .extract_sitemap_content(settings, &MemorySink::new())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(extraction.pages.len(), 2);
    assert!(elapsed >= Duration::from_millis(DELAY_MS), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2 * DELAY_MS), "{:?}", elapsed);
}
