// src/services/fetcher.rs

//! Page fetching for one site.
//!
//! A fetcher reports its progress as [`PageEvent`]s to a
//! [`PageEventHandler`]. For every URL it delivers `Started` first and
//! later exactly one `Completed` or `Failed`. Links returned while handling
//! a page's `Fetched` event get their `Started` before that page's
//! `Completed`, so a handler's in-flight count only reaches zero once the
//! whole crawl is over.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::http::{create_async_client, is_html};

/// Progress of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A request for `url` has been scheduled.
    Started { url: String },
    /// An HTML body was received; `url` is the final URL after redirects.
    Fetched { url: String, body: String },
    /// The request failed; `status` is set for HTTP error responses.
    Failed {
        url: String,
        status: Option<u16>,
        error: String,
    },
    /// The request finished successfully.
    Completed { url: String },
}

/// Consumer of page events.
#[async_trait]
pub trait PageEventHandler: Send + Sync {
    /// Handle one event. For `Fetched` events the returned links are
    /// requested as follow-ups; the value is ignored for other events.
    async fn handle(&self, event: PageEvent) -> Vec<String>;
}

/// Crawls one site starting from a seed URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Crawl until no request is left in flight.
    ///
    /// Returns an error without emitting any event when the seed cannot be
    /// requested at all.
    async fn crawl(&self, seed: &str, handler: Arc<dyn PageEventHandler>) -> Result<()>;
}

/// HTTP fetcher with bounded per-site parallelism, request pacing and a
/// depth limit.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_concurrent: usize,
    request_delay: Duration,
    max_depth: usize,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?, config))
    }

    pub fn with_client(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_concurrent: config.max_concurrent.max(1),
            request_delay: Duration::from_millis(config.request_delay_ms),
            max_depth: config.max_depth.max(1),
        }
    }
}

/// A page waiting to be fetched.
#[derive(Debug)]
struct Visit {
    url: Url,
    depth: usize,
}

/// Everything a page task needs, cloned into each spawned task.
#[derive(Clone)]
struct PageTask {
    client: Client,
    permits: Arc<Semaphore>,
    request_delay: Duration,
    max_depth: usize,
    handler: Arc<dyn PageEventHandler>,
    tx_visit: mpsc::UnboundedSender<Visit>,
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn crawl(&self, seed: &str, handler: Arc<dyn PageEventHandler>) -> Result<()> {
        let seed_url = Url::parse(seed.trim()).map_err(|e| AppError::crawl(seed, e))?;

        let (tx_visit, mut rx_visit) = mpsc::unbounded_channel::<Visit>();
        let task = PageTask {
            client: self.client.clone(),
            permits: Arc::new(Semaphore::new(self.max_concurrent)),
            request_delay: self.request_delay,
            max_depth: self.max_depth,
            handler: Arc::clone(&handler),
            tx_visit,
        };

        handler
            .handle(PageEvent::Started {
                url: seed_url.to_string(),
            })
            .await;

        let mut tasks = JoinSet::new();
        tasks.spawn(task.clone().run(Visit {
            url: seed_url,
            depth: 1,
        }));

        // Follow-ups are queued before their parent task finishes, so
        // draining after every join sees all of them.
        loop {
            while let Ok(visit) = rx_visit.try_recv() {
                tasks.spawn(task.clone().run(visit));
            }
            match tasks.join_next().await {
                Some(Ok(())) => {}
                Some(Err(e)) => log::error!("Page task for {seed} aborted: {e}"),
                None => break,
            }
        }

        Ok(())
    }
}

impl PageTask {
    async fn run(self, visit: Visit) {
        let url = visit.url.to_string();
        let outcome = self.fetch(&visit).await;

        match outcome {
            Ok(Some((final_url, body))) => {
                let follow = self
                    .handler
                    .handle(PageEvent::Fetched {
                        url: final_url,
                        body,
                    })
                    .await;
                self.schedule(follow, visit.depth + 1).await;
                self.handler.handle(PageEvent::Completed { url }).await;
            }
            Ok(None) => {
                self.handler.handle(PageEvent::Completed { url }).await;
            }
            Err((status, error)) => {
                log::warn!("Fetch failed url={url} status={status:?} err={error}");
                self.handler
                    .handle(PageEvent::Failed { url, status, error })
                    .await;
            }
        }
    }

    /// Fetch a page. Returns `None` for non-HTML bodies.
    async fn fetch(
        &self,
        visit: &Visit,
    ) -> std::result::Result<Option<(String, String)>, (Option<u16>, String)> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| (None, e.to_string()))?;

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let resp = self
            .client
            .get(visit.url.clone())
            .send()
            .await
            .map_err(|e| (e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err((Some(status.as_u16()), format!("HTTP {status}")));
        }

        let final_url = resp.url().to_string();
        let html = is_html(
            resp.headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let body = resp
            .text()
            .await
            .map_err(|e| (Some(status.as_u16()), e.to_string()))?;

        log::debug!("Fetched {final_url} ({} bytes)", body.len());
        Ok(html.then_some((final_url, body)))
    }

    /// Queue follow-up links at `depth`, announcing each before it is queued.
    async fn schedule(&self, links: Vec<String>, depth: usize) {
        if links.is_empty() {
            return;
        }
        if depth > self.max_depth {
            log::debug!("Max depth reached, dropping {} links", links.len());
            return;
        }

        for link in links {
            let Ok(url) = Url::parse(&link) else {
                log::debug!("Skipping unparseable link {link}");
                continue;
            };

            self.handler
                .handle(PageEvent::Started { url: link.clone() })
                .await;
            if self.tx_visit.send(Visit { url, depth }).is_err() {
                self.handler
                    .handle(PageEvent::Failed {
                        url: link,
                        status: None,
                        error: "crawl already finished".to_string(),
                    })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Records every event and answers `Fetched` with canned follow links.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<PageEvent>>,
        links: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl PageEventHandler for Recorder {
        async fn handle(&self, event: PageEvent) -> Vec<String> {
            let follow = match &event {
                PageEvent::Fetched { url, .. } => self.links.get(url).cloned().unwrap_or_default(),
                _ => Vec::new(),
            };
            self.events.lock().unwrap().push(event);
            follow
        }
    }

    /// Minimal HTTP/1.1 server answering one request per connection.
    async fn serve(listener: TcpListener) {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    match stream.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, content_type) = match path {
                    "/" | "/contact" | "/contact/more" => ("200 OK", "text/html; charset=utf-8"),
                    "/menu.pdf" => ("200 OK", "application/pdf"),
                    _ => ("404 Not Found", "text/html"),
                };
                let body = "<html><body>Call 949-555-1212</body></html>";
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    }

    fn position(events: &[PageEvent], wanted: &PageEvent) -> usize {
        events
            .iter()
            .position(|e| e == wanted)
            .unwrap_or_else(|| panic!("missing event {wanted:?}"))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_event_contract_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(serve(listener));

        let seed = format!("{base}/");
        let contact = format!("{base}/contact");
        let about = format!("{base}/about");
        let menu = format!("{base}/menu.pdf");
        let deeper = format!("{base}/contact/more");

        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
            links: HashMap::from([
                (seed.clone(), vec![contact.clone(), about.clone(), menu.clone()]),
                (contact.clone(), vec![deeper.clone()]),
            ]),
        });

        let config = CrawlerConfig {
            request_delay_ms: 0,
            timeout_secs: 5,
            max_depth: 2,
            ..CrawlerConfig::default()
        };
        HttpFetcher::new(&config)
            .unwrap()
            .crawl(&seed, recorder.clone())
            .await
            .unwrap();

        let events = recorder.events.lock().unwrap().clone();
        let started = |url: &str| PageEvent::Started { url: url.to_string() };
        let completed = |url: &str| PageEvent::Completed { url: url.to_string() };

        // Children are announced before their parent completes
        let seed_done = position(&events, &completed(&seed));
        for child in [&contact, &about, &menu] {
            assert!(position(&events, &started(child)) < seed_done);
        }

        // Depth 3 is never requested
        assert!(events.iter().all(|e| !matches!(e,
            PageEvent::Started { url } | PageEvent::Completed { url } if *url == deeper)));

        // Error status surfaces as Failed with the code
        assert!(events.iter().any(|e| matches!(e,
            PageEvent::Failed { url, status: Some(404), .. } if *url == about)));

        // Non-HTML body: completed without a Fetched event
        position(&events, &completed(&menu));
        assert!(!events.iter().any(|e| matches!(e, PageEvent::Fetched { url, .. } if *url == menu)));
        assert!(events.iter().any(|e| matches!(e, PageEvent::Fetched { url, .. } if *url == contact)));

        // In-flight count only reaches zero on the very last event
        let mut pending = 0i32;
        for (i, event) in events.iter().enumerate() {
            match event {
                PageEvent::Started { .. } => pending += 1,
                PageEvent::Completed { .. } | PageEvent::Failed { .. } => pending -= 1,
                PageEvent::Fetched { .. } => {}
            }
            assert!(pending > 0 || i == events.len() - 1, "pending hit zero at {i}");
        }
        assert_eq!(pending, 0);
        assert_eq!(
            events.iter().filter(|e| matches!(e, PageEvent::Started { .. })).count(),
            4
        );
    }

    #[tokio::test]
    async fn test_invalid_seed_emits_nothing() {
        let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
        let recorder = Arc::new(Recorder::default());

        let result = fetcher.crawl("not a url", recorder.clone()).await;
        assert!(matches!(result, Err(AppError::Crawl { context, .. }) if context == "not a url"));
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_seed_fails_once() {
        let config = CrawlerConfig {
            request_delay_ms: 0,
            timeout_secs: 2,
            ..CrawlerConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let recorder = Arc::new(Recorder::default());

        // Port 9 (discard) on localhost is closed in test environments
        fetcher
            .crawl("http://127.0.0.1:9/", recorder.clone())
            .await
            .unwrap();

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            PageEvent::Started {
                url: "http://127.0.0.1:9/".to_string()
            }
        );
        assert!(matches!(&events[1], PageEvent::Failed { url, .. } if url == "http://127.0.0.1:9/"));
    }
}
