//! Leaderboard page crawl
//!
//! Page 1 is fetched alone to learn `total_pages`; pages `2..=N` then go
//! through a bounded pool and are joined before anything is returned. Any
//! page failure aborts the crawl.

use crate::error::PipelineError;
use crate::pool::BoundedWorkerPool;
use crate::transport::Transport;
use lstats_model::{LeadersPage, UserRef};
use std::sync::Arc;

/// Listing endpoint crawler
pub struct PageCrawler {
    transport: Arc<dyn Transport>,
    listing_url: String,
    pool: BoundedWorkerPool,
}

impl PageCrawler {
    /// Create crawler fetching up to `page_concurrency` pages at once
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        listing_url: impl Into<String>,
        page_concurrency: usize,
    ) -> Self {
        Self {
            transport,
            listing_url: listing_url.into(),
            pool: BoundedWorkerPool::new(page_concurrency).named("pages"),
        }
    }

    /// URL of a listing page
    #[inline]
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        page_url(&self.listing_url, page)
    }

    /// Every listed user: page 1 first, later pages in completion order
    ///
    /// # Errors
    /// `PipelineError::Pagination` if any page fails to fetch or decode
    pub async fn crawl(&self) -> Result<Vec<UserRef>, PipelineError> {
        tracing::info!("fetching initial listing page");
        let first = fetch_page(self.transport.as_ref(), &self.page_url(1), 1).await?;
        let total_pages = first.total_pages;
        let mut users: Vec<UserRef> = first.user_refs().collect();

        if total_pages <= 1 {
            tracing::info!(users = users.len(), "listing has a single page");
            return Ok(users);
        }

        tracing::info!(pages = total_pages, "fetching remaining listing pages");
        let transport = Arc::clone(&self.transport);
        let base = self.listing_url.clone();
        let pages = self
            .pool
            .run(2..=total_pages, move |page| {
                let transport = Arc::clone(&transport);
                let url = page_url(&base, page);
                async move { fetch_page(transport.as_ref(), &url, page).await }
            })
            .await?;

        for page in &pages {
            users.extend(page.user_refs());
        }
        tracing::info!(pages = total_pages, users = users.len(), "listing crawl complete");
        Ok(users)
    }
}

fn page_url(base: &str, page: u32) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}page={page}")
}

async fn fetch_page(
    transport: &dyn Transport,
    url: &str,
    page: u32,
) -> Result<LeadersPage, PipelineError> {
    let response = transport
        .get(url)
        .await
        .map_err(|e| PipelineError::pagination(page, e))?;

    if !response.is_success() {
        return Err(PipelineError::pagination(
            page,
            format!("http status {}", response.status),
        ));
    }

    let listing: LeadersPage = serde_json::from_slice(&response.body)
        .map_err(|e| PipelineError::pagination(page, format!("decode: {e}")))?;
    tracing::info!(page, entries = listing.data.len(), "listing page fetched");
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned pages keyed by URL
    struct PagedTransport {
        pages: HashMap<String, Result<HttpResponse, TransportError>>,
    }

    #[async_trait]
    impl Transport for PagedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::new())))
        }
    }

    fn page_body(total_pages: u32, ids: &[&str]) -> Result<HttpResponse, TransportError> {
        let data: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({"rank": 1, "user": {"id": id, "username": id}}))
            .collect();
        let body = serde_json::json!({"data": data, "total_pages": total_pages});
        Ok(HttpResponse::new(200, serde_json::to_vec(&body).unwrap()))
    }

    fn crawler(pages: Vec<(u32, Result<HttpResponse, TransportError>)>) -> PageCrawler {
        let pages = pages
            .into_iter()
            .map(|(n, reply)| (format!("http://api.test/leaders?page={n}"), reply))
            .collect();
        PageCrawler::new(
            Arc::new(PagedTransport { pages }),
            "http://api.test/leaders",
            5,
        )
    }

    fn ids(users: &[UserRef]) -> Vec<&str> {
        let mut ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn page_url_appends_query() {
        assert_eq!(page_url("http://a/leaders", 3), "http://a/leaders?page=3");
        assert_eq!(
            page_url("http://a/leaders?language=Rust", 2),
            "http://a/leaders?language=Rust&page=2"
        );
    }

    #[tokio::test]
    async fn single_page_listing() {
        let crawler = crawler(vec![(1, page_body(1, &["a", "b", "c"]))]);

        let users = crawler.crawl().await.unwrap();

        assert_eq!(ids(&users), vec!["a", "b", "c"]);
        assert_eq!(users[0].username.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn multi_page_listing_is_concatenated() {
        let crawler = crawler(vec![
            (1, page_body(3, &["a", "b"])),
            (2, page_body(3, &["c"])),
            (3, page_body(3, &["d", "e"])),
        ]);

        let users = crawler.crawl().await.unwrap();

        assert_eq!(ids(&users), vec!["a", "b", "c", "d", "e"]);
        // Page 1 always leads
        assert_eq!(
            &users[..2],
            &[
                UserRef::new("a").with_username("a"),
                UserRef::new("b").with_username("b")
            ]
        );
    }

    #[tokio::test]
    async fn failing_later_page_aborts_crawl() {
        let crawler = crawler(vec![
            (1, page_body(3, &["a"])),
            (2, page_body(3, &["b"])),
            (3, Ok(HttpResponse::new(503, Vec::new()))),
        ]);

        let err = crawler.crawl().await.unwrap_err();

        assert!(matches!(err, PipelineError::Pagination { page: 3, .. }));
    }

    #[tokio::test]
    async fn first_page_transport_error_aborts_crawl() {
        let crawler = crawler(vec![(1, Err(TransportError::Timeout))]);

        let err = crawler.crawl().await.unwrap_err();

        assert!(matches!(err, PipelineError::Pagination { page: 1, .. }));
    }

    #[tokio::test]
    async fn undecodable_page_aborts_crawl() {
        let crawler = crawler(vec![
            (1, page_body(2, &["a"])),
            (2, Ok(HttpResponse::new(200, b"{\"data\": 7}".to_vec()))),
        ]);

        let err = crawler.crawl().await.unwrap_err();

        assert!(err.to_string().contains("decode"));
    }
}
