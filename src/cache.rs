use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Page {
    html: Arc<str>,
    rendered: Instant,
    revalidate: Duration,
    regenerating: bool,
}

impl Page {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.rendered) < self.revalidate
    }
}

/// Rendered pages, keyed by route, each kept until its revalidation
/// interval runs out.
#[derive(Default)]
pub struct PageCache {
    pages: RwLock<HashMap<String, Page>>,
}

impl PageCache {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the cached page for `key`.
    ///
    /// A fresh page is returned as is. A stale page is also returned as is,
    /// and the first request to see it starts one background re-render; if
    /// that fails the old page stays and the next request tries again.
    /// Only a page we've never rendered waits on `render`, and its failure is
    /// the caller's error. No lock is held while `render` runs.
    pub async fn get_or_render<F, Fut, E>(
        self: &Arc<Self>,
        key: &str,
        revalidate: Duration,
        render: F,
    ) -> Result<Arc<str>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        {
            let pages = self.pages.read().await;
            if let Some(page) = pages.get(key) {
                if page.regenerating || page.is_fresh(Instant::now()) {
                    debug!("{key}: cached");
                    return Ok(Arc::clone(&page.html));
                }
            }
        }

        let stale = {
            let mut pages = self.pages.write().await;
            match pages.get_mut(key) {
                Some(page) if page.regenerating || page.is_fresh(Instant::now()) => {
                    return Ok(Arc::clone(&page.html));
                }
                Some(page) => {
                    page.regenerating = true;
                    Some(Arc::clone(&page.html))
                }
                None => None,
            }
        };

        match stale {
            Some(html) => {
                debug!("{key}: stale, regenerating in the background");
                self.regenerate(key.to_string(), revalidate, render());
                Ok(html)
            }
            None => {
                let html: Arc<str> = render().await?.into();
                debug!("{key}: rendered");
                self.store(key, Arc::clone(&html), revalidate).await;
                Ok(html)
            }
        }
    }

    fn regenerate<Fut, E>(self: &Arc<Self>, key: String, revalidate: Duration, render: Fut)
    where
        Fut: Future<Output = Result<String, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let cache = Arc::clone(self);

        tokio::spawn(async move {
            match render.await {
                Ok(html) => {
                    debug!("{key}: revalidated");
                    cache.store(&key, html.into(), revalidate).await;
                }
                Err(e) => {
                    warn!("{key}: regeneration failed, keeping stale page: {e}");
                    if let Some(page) = cache.pages.write().await.get_mut(&key) {
                        page.regenerating = false;
                    }
                }
            }
        });
    }

    async fn store(&self, key: &str, html: Arc<str>, revalidate: Duration) {
        self.pages.write().await.insert(
            key.to_string(),
            Page {
                html,
                rendered: Instant::now(),
                revalidate,
                regenerating: false,
            },
        );
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    const REVALIDATE: Duration = Duration::from_secs(60);

    async fn render(cache: &Arc<PageCache>, count: &Arc<AtomicUsize>) -> Result<Arc<str>, String> {
        let count = Arc::clone(count);
        cache
            .get_or_render("/", REVALIDATE, move || async move {
                let n = count.fetch_add(1, Ordering::SeqCst);
                Ok(format!("render {n}"))
            })
            .await
    }

    async fn fail(cache: &Arc<PageCache>) -> Result<Arc<str>, String> {
        cache
            .get_or_render("/", REVALIDATE, || async { Err("upstream down".to_string()) })
            .await
    }

    // lets spawned regenerations finish
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_pages_are_reused() {
        let cache = Arc::new(PageCache::new());
        let count = Arc::new(AtomicUsize::new(0));

        assert_eq!(&*render(&cache, &count).await.unwrap(), "render 0");
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(&*render(&cache, &count).await.unwrap(), "render 0");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_page_served_while_regenerating_once() {
        let cache = Arc::new(PageCache::new());
        let count = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_render("/", REVALIDATE, || async { Ok::<_, String>("old".to_string()) })
            .await
            .unwrap();
        tokio::time::advance(REVALIDATE).await;

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let count = Arc::clone(&count);
                tokio::spawn(async move {
                    cache
                        .get_or_render("/", REVALIDATE, move || async move {
                            tokio::time::sleep(Duration::from_secs(8)).await;
                            count.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, String>("new".to_string())
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(&*handle.await.unwrap(), "old");
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(&*render(&cache, &count).await.unwrap(), "new");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_revalidation_keeps_stale_page() {
        let cache = Arc::new(PageCache::new());
        let count = Arc::new(AtomicUsize::new(0));

        render(&cache, &count).await.unwrap();
        tokio::time::advance(REVALIDATE * 2).await;

        assert_eq!(&*fail(&cache).await.unwrap(), "render 0");
        settle().await;

        // still stale, so the next request tries again
        assert_eq!(&*render(&cache, &count).await.unwrap(), "render 0");
        settle().await;
        assert_eq!(&*render(&cache, &count).await.unwrap(), "render 1");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_first_render() {
        let cache = Arc::new(PageCache::new());

        assert_eq!(fail(&cache).await.unwrap_err(), "upstream down");
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn keys_are_separate() {
        let cache = Arc::new(PageCache::new());

        for key in ["/", "/episodes/a", "/episodes/b"] {
            let html = cache
                .get_or_render(key, REVALIDATE, move || async move {
                    Ok::<_, String>(format!("page {key}"))
                })
                .await
                .unwrap();
            assert_eq!(&*html, format!("page {key}"));
        }
        assert_eq!(cache.len().await, 3);
    }
}
