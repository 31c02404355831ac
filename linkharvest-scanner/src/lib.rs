pub mod analytics;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod normalize;
pub mod pipeline;
pub mod result;
pub mod sitemap;

pub use analytics::{
    AnchorCount, KeywordDensity, LinkAnalysis, LinkStats, NgramAnalysis, OrderedCounter,
    PhraseCount, SeoAnalysis,
};
pub use error::ScanError;
pub use fetcher::PageFetcher;
pub use pipeline::{ExtractOptions, PageOutcome, fetch_and_extract};
pub use result::{BrokenLinkRecord, LinkInfo, PageMetadata, PageRecord};
pub use sitemap::{SitemapDiscovery, discover_sitemap, resolve_sitemap};
