use crate::api::ApiEpisode;
use crate::duration::duration_to_time_string;
use crate::time::PublishedAt;

/// An episode as the pages show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub description: String, // raw markup
    pub members: String,
    pub published_at: PublishedAt,
    pub duration: u64,
    pub duration_as_string: String,
    pub url: String,
}

impl From<ApiEpisode> for Episode {
    fn from(api: ApiEpisode) -> Self {
        let ApiEpisode {
            id,
            title,
            members,
            published_at,
            thumbnail,
            description,
            file,
        } = api;

        Self {
            id,
            title,
            thumbnail,
            description,
            members,
            published_at,
            duration: file.duration,
            duration_as_string: duration_to_time_string(file.duration),
            url: file.url,
        }
    }
}

/// The home page's two lists, split from one newest-first listing.
#[derive(Debug, Default)]
pub struct HomeEpisodes {
    pub latest: Vec<Episode>,
    pub all: Vec<Episode>,
}

impl HomeEpisodes {
    pub const LATEST: usize = 2;

    pub fn split(mut episodes: Vec<Episode>) -> Self {
        let rest = episodes.split_off(Self::LATEST.min(episodes.len()));

        Self {
            latest: episodes,
            all: rest,
        }
    }
}
