use std::{fmt, result, sync::Arc, time::Duration};

use askama::Template;
use log::{error, info, trace};
use warp::http;

use crate::api::{ApiClient, ApiError, ListQuery};
use crate::cache::PageCache;
use crate::episode::{Episode, HomeEpisodes};
use crate::pages::{EpisodePage, HomePage};
use crate::slug::episode_slug;

pub struct Site {
    api: ApiClient,
    cache: Arc<PageCache>,
    config: SiteConfig,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// How many episodes the home page asks for.
    pub home_limit: u32,
    pub home_revalidate: Duration,
    pub episode_revalidate: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            home_limit: 12,
            home_revalidate: Duration::from_secs(60 + 60 * 8),
            episode_revalidate: Duration::from_secs(60 * 60 * 24),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    NotFound,
    BadRequest,
    Upstream,
    Internal,
}

pub type Result<T> = result::Result<T, Error>;

impl From<Error> for http::StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound => http::StatusCode::NOT_FOUND,
            Error::BadRequest => http::StatusCode::BAD_REQUEST,
            Error::Upstream => http::StatusCode::BAD_GATEWAY,
            Error::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status: http::StatusCode = (*self).into();
        write!(fmt, "{status}")
    }
}

impl std::error::Error for Error {}

impl warp::reject::Reject for Error {}

fn upstream(e: ApiError) -> Error {
    match e {
        ApiError::NotFound { endpoint } => {
            info!("{endpoint}: not found upstream");
            Error::NotFound
        }
        e => {
            error!("episodes API: {e}");
            Error::Upstream
        }
    }
}

pub fn render(template: &impl Template) -> Result<String> {
    template.render().map_err(|e| {
        error!("couldn't render page: {e}");
        Error::Internal
    })
}

impl Site {
    pub fn new(api: ApiClient, config: SiteConfig) -> Self {
        Self {
            api,
            cache: Arc::new(PageCache::new()),
            config,
        }
    }

    /// Stale pages are re-rendered in the background, which holds on to
    /// the site, hence the `Arc`.
    pub async fn home(self: &Arc<Self>) -> Result<Arc<str>> {
        let site = Arc::clone(self);

        self.cache
            .get_or_render("/", self.config.home_revalidate, move || async move {
                site.render_home().await
            })
            .await
    }

    pub async fn episode(self: &Arc<Self>, slug: &str) -> Result<Arc<str>> {
        let id = episode_slug(slug)?.to_string();
        let key = format!("/episodes/{id}");
        let site = Arc::clone(self);

        self.cache
            .get_or_render(&key, self.config.episode_revalidate, move || async move {
                site.render_episode(&id).await
            })
            .await
    }

    pub async fn home_episodes(&self) -> Result<HomeEpisodes> {
        let query = ListQuery::latest(self.config.home_limit);

        let episodes = self
            .api
            .list_episodes(&query)
            .await
            .map_err(upstream)?
            .into_iter()
            .map(Episode::from)
            .collect::<Vec<_>>();

        let home = HomeEpisodes::split(episodes);
        trace!(
            "home: {} latest, {} more",
            home.latest.len(),
            home.all.len()
        );
        Ok(home)
    }

    pub async fn render_home(&self) -> Result<String> {
        let home = self.home_episodes().await?;
        render(&HomePage::from(&home))
    }

    pub async fn render_episode(&self, slug: &str) -> Result<String> {
        let id = episode_slug(slug)?;
        let episode: Episode = self.api.episode(id).await.map_err(upstream)?.into();

        info!("rendering episode {}", episode.id);
        render(&EpisodePage { episode: &episode })
    }
}
