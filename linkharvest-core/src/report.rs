// Report generation from a finished session

use crate::analysis::KeywordCount;
use crate::output::{ArtifactKind, ReportArtifact};
use crate::session::CrawlSession;
use crate::settings::CrawlSettings;
use crate::sitemap_extract::SitemapValidation;
use chrono::{DateTime, Utc};
use linkharvest_scanner::{BrokenLinkRecord, PageMetadata, PageRecord};
use std::fmt::Write;
use url::Url;

pub const TOP_REPORT_KEYWORDS: usize = 20;
pub const TOP_PAGE_KEYWORDS: usize = 10;
pub const PAGE_FILE_ROOT: &str = "LinkHarvest";

/// Read-only view of what the report generators need from a session.
#[derive(Debug, Clone)]
pub struct OutputContext<'a> {
    pub settings: &'a CrawlSettings,
    pub pages: &'a [PageRecord],
    pub broken_links: &'a [BrokenLinkRecord],
    pub aggregate_keywords: &'a [KeywordCount],
    pub processed: usize,
    pub generated_at: DateTime<Utc>,
    /// File-name-safe host of the first base URL.
    pub host_slug: String,
}

impl<'a> OutputContext<'a> {
    pub fn from_session(session: &'a CrawlSession) -> Self {
        let host_slug = session
            .settings
            .urls
            .first()
            .map(|u| host_slug(u))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            settings: &session.settings,
            pages: &session.pages,
            broken_links: &session.broken_links,
            aggregate_keywords: &session.aggregate_keywords,
            processed: session.processed,
            generated_at: session.finished_at.unwrap_or_else(Utc::now),
            host_slug,
        }
    }

    pub fn date_stamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d").to_string()
    }
}

/// Replace everything but ASCII letters and digits with `_`.
pub fn slugify(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn host_slug(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(slugify))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn separator(out: &mut String) {
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");
}

fn write_metadata(out: &mut String, metadata: &PageMetadata) {
    if metadata.is_empty() {
        return;
    }
    out.push_str("METADATA:\n");
    let fields = [
        ("Description", &metadata.description),
        ("Keywords", &metadata.keywords),
        ("OG Title", &metadata.og_title),
        ("OG Description", &metadata.og_description),
        ("OG Image", &metadata.og_image),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }
    out.push('\n');
}

fn write_issues(out: &mut String, heading: &str, issues: &[String]) {
    if issues.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for issue in issues {
        let _ = writeln!(out, "- {}", issue);
    }
}

pub fn render_master_report(ctx: &OutputContext<'_>) -> String {
    let settings = ctx.settings;
    let mut out = String::new();

    out.push_str("LINKHARVEST EXTRACTION RESULTS\n");
    out.push_str(&"=".repeat(30));
    out.push_str("\n\n");
    let _ = writeln!(out, "Base URLs: {}", settings.urls.join(", "));
    let _ = writeln!(out, "Crawl Date: {}", format_timestamp(&ctx.generated_at));
    let _ = writeln!(out, "Total Pages Processed: {}", ctx.processed);
    out.push('\n');

    out.push_str("CRAWL SETTINGS:\n");
    let _ = writeln!(out, "- Max Depth: {}", settings.max_depth);
    let _ = writeln!(out, "- Max Pages: {}", settings.max_pages);
    let _ = writeln!(out, "- Extract HTML: {}", yes_no(settings.extract_html));
    let _ = writeln!(out, "- Extract Text: {}", yes_no(settings.extract_text));
    let _ = writeln!(out, "- Extract Metadata: {}", yes_no(settings.extract_metadata));
    if let Some(filter) = settings.url_filter.describe() {
        let _ = writeln!(out, "- URL Pattern Filter: {}", filter);
    }
    if settings.crawl_sitemap {
        out.push_str("- Crawl Sitemap: Yes\n");
    }
    if settings.keyword_density {
        out.push_str("- Keyword Density Analysis: Yes\n");
    }
    if settings.broken_link_checker {
        out.push_str("- Broken Link Check: Yes\n");
    }
    out.push('\n');
    separator(&mut out);

    if settings.keyword_density && !ctx.aggregate_keywords.is_empty() {
        out.push_str("TOP KEYWORDS ACROSS ALL PAGES:\n");
        out.push_str(&"-".repeat(30));
        out.push('\n');
        for keyword in ctx.aggregate_keywords.iter().take(TOP_REPORT_KEYWORDS) {
            let _ = writeln!(out, "{}: {} occurrences", keyword.word, keyword.count);
        }
        out.push('\n');
        separator(&mut out);
    }

    if settings.broken_link_checker && !ctx.broken_links.is_empty() {
        write_broken_links(&mut out, ctx.broken_links);
    }

    let total = ctx.pages.len();
    for (index, page) in ctx.pages.iter().enumerate() {
        write_page_block(&mut out, page, index + 1, total, settings);
    }

    out
}

fn write_broken_links(out: &mut String, links: &[BrokenLinkRecord]) {
    out.push_str("BROKEN LINKS FOUND:\n");
    out.push_str(&"-".repeat(20));
    out.push('\n');
    for link in links {
        let _ = writeln!(out, "URL: {}", link.url);
        if let Some(found_on) = &link.found_on {
            let _ = writeln!(out, "Found on: {}", found_on);
        }
        if let Some(status) = link.status_code {
            let _ = writeln!(out, "Status Code: {}", status);
        }
        if let Some(error) = &link.error {
            let _ = writeln!(out, "Error: {}", error);
        }
        out.push('\n');
    }
    separator(out);
}

fn write_page_block(
    out: &mut String,
    page: &PageRecord,
    number: usize,
    total: usize,
    settings: &CrawlSettings,
) {
    let _ = writeln!(out, "PAGE {} OF {}", number, total);
    out.push_str(&"-".repeat(40));
    out.push('\n');
    let _ = writeln!(out, "URL: {}", page.url);
    let _ = writeln!(out, "Timestamp: {}\n", format_timestamp(&page.timestamp));

    let seo = &page.seo_analysis;
    out.push_str("SEO ANALYSIS:\n");
    write_issues(out, "Title Issues", &seo.title_issues);
    write_issues(out, "Meta Description Issues", &seo.meta_description_issues);
    write_issues(out, "Heading Issues", &seo.heading_issues);
    out.push('\n');

    let stats = &page.link_stats;
    out.push_str("LINK STATISTICS:\n");
    let _ = writeln!(out, "- Internal Links: {}", stats.internal_count);
    let _ = writeln!(out, "- External Links: {}", stats.external_count);
    let _ = writeln!(out, "- External/Internal Ratio: {}", stats.ratio);
    let _ = writeln!(out, "- Unique Anchor Texts: {}", stats.anchor_text_diversity);
    if !stats.duplicate_anchors.is_empty() {
        out.push_str("Top Duplicate Anchor Texts:\n");
        for anchor in &stats.duplicate_anchors {
            let _ = writeln!(out, "  - \"{}\": {} times", anchor.text, anchor.count);
        }
    }
    out.push('\n');

    if settings.extract_text
        && let Some(text) = &page.text
    {
        out.push_str(text);
        out.push_str("\n\n");
    }

    if settings.extract_metadata
        && let Some(metadata) = &page.metadata
    {
        write_metadata(out, metadata);
    }

    if settings.keyword_density {
        if let Some(keywords) = &page.keyword_density {
            out.push_str("TOP KEYWORDS FOR THIS PAGE:\n");
            for kw in keywords.iter().take(TOP_PAGE_KEYWORDS) {
                let _ = writeln!(out, "- {}: {} times ({})", kw.word, kw.count, kw.density);
            }
            out.push('\n');
        }

        if let Some(ngrams) = &page.ngram_analysis {
            for (heading, phrases) in [
                ("TOP 2-WORD PHRASES:", &ngrams.bigrams),
                ("TOP 3-WORD PHRASES:", &ngrams.trigrams),
            ] {
                if phrases.is_empty() {
                    continue;
                }
                let _ = writeln!(out, "{}", heading);
                for phrase in phrases {
                    let _ = writeln!(out, "- \"{}\": {} times", phrase.phrase, phrase.count);
                }
                out.push('\n');
            }
        }
    }

    separator(out);
}

pub fn master_report_filename(ctx: &OutputContext<'_>) -> String {
    format!("linkharvest_{}_{}.txt", ctx.host_slug, ctx.date_stamp())
}

pub fn master_report(ctx: &OutputContext<'_>) -> ReportArtifact {
    ReportArtifact::new(
        master_report_filename(ctx),
        render_master_report(ctx),
        ArtifactKind::MasterReport,
    )
    .prompting()
}

/// `LinkHarvest/<domain>/<path>.txt`, the root path becoming `_index`.
pub fn page_file_path(url: &str) -> String {
    let (domain, name) = match Url::parse(url) {
        Ok(parsed) => {
            let path = if parsed.path() == "/" { "/index" } else { parsed.path() };
            (
                parsed.host_str().map(slugify).unwrap_or_else(|| "unknown".to_string()),
                slugify(path),
            )
        }
        Err(_) => ("unknown".to_string(), String::new()),
    };
    let name = if name.is_empty() { "page".to_string() } else { name };
    format!("{}/{}/{}.txt", PAGE_FILE_ROOT, domain, name)
}

pub fn render_page_file(page: &PageRecord, settings: &CrawlSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "URL: {}", page.url);
    let _ = writeln!(out, "Crawled: {}", format_timestamp(&page.timestamp));
    let _ = writeln!(out, "Title: {}", page.title);
    out.push('\n');
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    if let Some(text) = &page.text {
        out.push_str(text);
    }

    if settings.extract_metadata
        && let Some(metadata) = &page.metadata
    {
        out.push_str("\n\nMETADATA:\n");
        if let Ok(json) = serde_json::to_string_pretty(metadata) {
            out.push_str(&json);
        }
    }

    if settings.keyword_density
        && let Some(keywords) = &page.keyword_density
    {
        out.push_str("\n\nKEYWORD DENSITY:\n");
        for kw in keywords.iter().take(TOP_PAGE_KEYWORDS) {
            let _ = writeln!(out, "{}: {} times ({})", kw.word, kw.count, kw.density);
        }
    }

    out
}

/// One artifact per page, grouped by domain.
pub fn page_files(session: &CrawlSession) -> Vec<ReportArtifact> {
    session
        .pages_by_domain
        .keys()
        .flat_map(|host| session.pages_for_domain(host))
        .map(|page| {
            ReportArtifact::new(
                page_file_path(&page.url),
                render_page_file(page, &session.settings),
                ArtifactKind::PageFile,
            )
        })
        .collect()
}

pub fn render_sitemap_report(
    settings: &CrawlSettings,
    pages: &[PageRecord],
    broken_links: &[BrokenLinkRecord],
    validation: &SitemapValidation,
    generated_at: &DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("SITEMAP CONTENT EXTRACTION RESULTS\n");
    out.push_str(&"=".repeat(34));
    out.push_str("\n\n");
    let _ = writeln!(out, "Extraction Date: {}", format_timestamp(generated_at));
    let _ = writeln!(out, "Total Pages Extracted: {}\n", pages.len());

    out.push_str("SITEMAPS PROCESSED:\n");
    out.push_str(&"-".repeat(20));
    out.push('\n');
    for base in &validation.bases {
        if let Some(sitemap_url) = &base.sitemap_url {
            let _ = writeln!(out, "Base URL: {}", base.base_url);
            let _ = writeln!(out, "Sitemap: {}", sitemap_url);
            let _ = writeln!(out, "URLs found: {}\n", base.urls.len());
        }
    }
    separator(&mut out);

    if settings.broken_link_checker && !broken_links.is_empty() {
        write_broken_links(&mut out, broken_links);
    }

    let total = pages.len();
    for (index, page) in pages.iter().enumerate() {
        let _ = writeln!(out, "PAGE {} OF {}", index + 1, total);
        out.push_str(&"-".repeat(40));
        out.push('\n');
        let _ = writeln!(out, "URL: {}", page.url);
        let title = if page.title.is_empty() { "No title" } else { &page.title };
        let _ = writeln!(out, "Title: {}", title);
        let _ = writeln!(out, "Timestamp: {}\n", format_timestamp(&page.timestamp));

        if settings.extract_text
            && let Some(text) = &page.text
        {
            out.push_str(text);
            out.push_str("\n\n");
        }
        if settings.extract_metadata
            && let Some(metadata) = &page.metadata
        {
            write_metadata(&mut out, metadata);
        }
        separator(&mut out);
    }

    out
}

pub fn sitemap_report(
    settings: &CrawlSettings,
    pages: &[PageRecord],
    broken_links: &[BrokenLinkRecord],
    validation: &SitemapValidation,
    generated_at: &DateTime<Utc>,
) -> ReportArtifact {
    ReportArtifact::new(
        format!("sitemap_extract_{}.txt", generated_at.format("%Y-%m-%d")),
        render_sitemap_report(settings, pages, broken_links, validation, generated_at),
        ArtifactKind::SitemapReport,
    )
    .prompting()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs() {
        assert_eq!(host_slug("https://www.ex-ample.com/a"), "www_ex_ample_com");
        assert_eq!(host_slug("not a url"), "unknown");
        assert_eq!(slugify("/blog/post-1"), "_blog_post_1");
    }

    #[test]
    fn test_page_file_path() {
        assert_eq!(page_file_path("https://ex.com/"), "LinkHarvest/ex_com/_index.txt");
        assert_eq!(
            page_file_path("https://ex.com/blog/post-1"),
            "LinkHarvest/ex_com/_blog_post_1.txt"
        );
    }
}
