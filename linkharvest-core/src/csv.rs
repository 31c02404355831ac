//! CSV tables built from a finished session.
//!
//! Every cell is quoted, embedded quotes doubled.

use crate::analysis::{summarize_keywords, summarize_phrases};
use crate::error::{CrawlError, Result};
use crate::output::{ArtifactKind, ReportArtifact};
use crate::report::OutputContext;
use ::csv::{QuoteStyle, Writer, WriterBuilder};
use linkharvest_scanner::analytics::fixed_2dp;
use linkharvest_scanner::{BrokenLinkRecord, PageRecord};

pub const TOP_CSV_KEYWORDS: usize = 100;
pub const TOP_CSV_PHRASES: usize = 50;
pub const MAX_TEXT_CELL_CHARS: usize = 5000;

fn table(headers: &[&str]) -> Result<Writer<Vec<u8>>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    Ok(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CrawlError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| CrawlError::Output(format!("CSV is not UTF-8: {}", e)))
}

fn join_issues(issues: &[String]) -> String {
    if issues.is_empty() {
        "None".to_string()
    } else {
        issues.join("; ")
    }
}

pub fn seo_analysis_csv(pages: &[PageRecord]) -> Result<String> {
    let mut csv = table(&[
        "URL",
        "Title",
        "Title Length",
        "Title Issues",
        "Meta Description Length",
        "Meta Description Issues",
        "H1 Count",
        "H1 Issues",
    ])?;

    for page in pages {
        let seo = &page.seo_analysis;
        csv.write_record([
            page.url.as_str(),
            page.title.as_str(),
            page.title.chars().count().to_string().as_str(),
            join_issues(&seo.title_issues).as_str(),
            seo.meta_description_length.to_string().as_str(),
            join_issues(&seo.meta_description_issues).as_str(),
            seo.h1_count.to_string().as_str(),
            join_issues(&seo.heading_issues).as_str(),
        ])?;
    }
    finish(csv)
}

pub fn keyword_density_csv(pages: &[PageRecord]) -> Result<String> {
    let mut csv = table(&["Keyword", "Total Count", "Average Density", "Pages Found On"])?;

    for keyword in summarize_keywords(pages, TOP_CSV_KEYWORDS) {
        csv.write_record([
            keyword.word.as_str(),
            keyword.total_count.to_string().as_str(),
            format!("{}%", fixed_2dp(keyword.average_density)).as_str(),
            keyword.pages_found_on.to_string().as_str(),
        ])?;
    }
    finish(csv)
}

pub fn ngram_csv(pages: &[PageRecord]) -> Result<String> {
    let mut csv = table(&["Type", "Phrase", "Total Count", "Pages Found On"])?;
    let (bigrams, trigrams) = summarize_phrases(pages, TOP_CSV_PHRASES);

    for (label, phrases) in [("2-gram", bigrams), ("3-gram", trigrams)] {
        for phrase in phrases {
            csv.write_record([
                label,
                phrase.phrase.as_str(),
                phrase.total_count.to_string().as_str(),
                phrase.pages_found_on.to_string().as_str(),
            ])?;
        }
    }
    finish(csv)
}

pub fn link_statistics_csv(pages: &[PageRecord]) -> Result<String> {
    let mut csv = table(&[
        "URL",
        "Internal Links",
        "External Links",
        "External/Internal Ratio",
        "Unique Anchor Texts",
        "Most Duplicated Anchor",
    ])?;

    for page in pages {
        let stats = &page.link_stats;
        let most_duplicated = stats
            .duplicate_anchors
            .first()
            .map(|a| format!("{} ({})", a.text, a.count))
            .unwrap_or_else(|| "None".to_string());

        csv.write_record([
            page.url.as_str(),
            stats.internal_count.to_string().as_str(),
            stats.external_count.to_string().as_str(),
            stats.ratio.as_str(),
            stats.anchor_text_diversity.to_string().as_str(),
            most_duplicated.as_str(),
        ])?;
    }
    finish(csv)
}

pub fn broken_links_csv(broken_links: &[BrokenLinkRecord]) -> Result<String> {
    let mut csv = table(&["Broken URL", "Found On", "Status Code", "Error Message"])?;

    for link in broken_links {
        let status = link
            .status_code
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        csv.write_record([
            link.url.as_str(),
            link.found_on.as_deref().unwrap_or(""),
            status.as_str(),
            link.error.as_deref().unwrap_or("N/A"),
        ])?;
    }
    finish(csv)
}

pub fn scraped_text_csv(pages: &[PageRecord]) -> Result<String> {
    let mut csv = table(&["URL", "Title", "Text Content", "Word Count"])?;

    for page in pages {
        let Some(text) = page.text.as_deref() else {
            continue;
        };
        let words: Vec<&str> = text.split_whitespace().collect();
        let flattened: String = words.join(" ").chars().take(MAX_TEXT_CELL_CHARS).collect();

        csv.write_record([
            page.url.as_str(),
            page.title.as_str(),
            flattened.as_str(),
            words.len().to_string().as_str(),
        ])?;
    }
    finish(csv)
}

/// Every CSV table the session's settings ask for, in a fixed order.
pub fn csv_reports(ctx: &OutputContext<'_>) -> Result<Vec<ReportArtifact>> {
    let settings = ctx.settings;
    let pages = ctx.pages;
    let stamp = format!("{}_{}", ctx.host_slug, ctx.date_stamp());
    let mut artifacts = Vec::new();

    let mut push = |name: &str, content: String| {
        artifacts.push(ReportArtifact::new(
            format!("{}_{}.csv", name, stamp),
            content,
            ArtifactKind::Csv,
        ));
    };

    if !pages.is_empty() {
        push("seo_analysis", seo_analysis_csv(pages)?);
    }
    if settings.keyword_density {
        push("keyword_density", keyword_density_csv(pages)?);
        if pages.iter().any(|p| p.ngram_analysis.is_some()) {
            push("ngram_analysis", ngram_csv(pages)?);
        }
    }
    if !pages.is_empty() {
        push("link_statistics", link_statistics_csv(pages)?);
    }
    if settings.broken_link_checker && !ctx.broken_links.is_empty() {
        push("broken_links", broken_links_csv(ctx.broken_links)?);
    }
    if settings.extract_text {
        push("scraped_text", scraped_text_csv(pages)?);
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use linkharvest_scanner::{AnchorCount, KeywordDensity, LinkStats, SeoAnalysis};

    fn page(url: &str, title: &str, text: Option<&str>) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            base_url: url.to_string(),
            timestamp: Utc::now(),
            depth: 0,
            title: title.to_string(),
            raw_html: String::new(),
            seo_analysis: SeoAnalysis {
                title_issues: vec!["Title too short (5 chars)".into()],
                h1_count: 1,
                ..Default::default()
            },
            internal_links: vec![],
            external_links: vec![],
            link_stats: LinkStats {
                internal_count: 3,
                external_count: 1,
                ratio: "0.33".into(),
                anchor_text_diversity: 2,
                duplicate_anchors: vec![AnchorCount { text: "home".into(), count: 2 }],
            },
            text: text.map(str::to_string),
            metadata: None,
            keyword_density: None,
            ngram_analysis: None,
        }
    }

    #[test]
    fn test_quotes_are_doubled() {
        let csv = seo_analysis_csv(&[page("https://ex.com/", r#"say "hi", ok"#, None)]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(r#""https://ex.com/","say ""hi"", ok","12","#));
    }

    #[test]
    fn test_seo_row() {
        let csv = seo_analysis_csv(&[page("https://ex.com/", "Short", None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#""URL","Title","Title Length","Title Issues","Meta Description Length","Meta Description Issues","H1 Count","H1 Issues""#
        );
        assert_eq!(
            lines[1],
            r#""https://ex.com/","Short","5","Title too short (5 chars)","0","None","1","None""#
        );
    }

    #[test]
    fn test_link_statistics_row() {
        let csv = link_statistics_csv(&[page("https://ex.com/", "T", None)]).unwrap();
        assert_eq!(
            csv.lines().last().unwrap(),
            r#""https://ex.com/","3","1","0.33","2","home (2)""#
        );
    }

    #[test]
    fn test_keyword_average_density_rounds_half_up() {
        let mut pages = vec![page("https://ex.com/a", "A", None), page("https://ex.com/b", "B", None)];
        for (page, density) in pages.iter_mut().zip(["1.00%", "1.25%"]) {
            page.keyword_density = Some(vec![KeywordDensity {
                word: "crawl".into(),
                count: 2,
                density: density.into(),
            }]);
        }

        let csv = keyword_density_csv(&pages).unwrap();
        assert_eq!(csv.lines().nth(1).unwrap(), r#""crawl","4","1.13%","2""#);
    }

    #[test]
    fn test_broken_links_defaults() {
        let csv = broken_links_csv(&[
            BrokenLinkRecord::with_status("https://ex.com/gone".into(), None, 404),
            BrokenLinkRecord::with_error(
                "https://ex.com/x".into(),
                Some("https://ex.com/".into()),
                "connection refused".into(),
            ),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], r#""https://ex.com/gone","","404","N/A""#);
        assert_eq!(
            lines[2],
            r#""https://ex.com/x","https://ex.com/","N/A","connection refused""#
        );
    }

    #[test]
    fn test_scraped_text_flattens_and_caps() {
        let long = format!("Title: T\n\n{}", "word ".repeat(2000));
        let csv = scraped_text_csv(&[
            page("https://ex.com/a", "A", Some(&long)),
            page("https://ex.com/b", "B", None),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",\"2002\""));

        let text_cell = lines[1].split("\",\"").nth(2).unwrap();
        assert!(text_cell.starts_with("Title: T word"));
        assert!(text_cell.chars().count() <= MAX_TEXT_CELL_CHARS);
    }
}
