use askama::Template;

use crate::episode::{Episode, HomeEpisodes};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage<'a> {
    pub latest: &'a [Episode],
    pub all: &'a [Episode],
}

#[derive(Template)]
#[template(path = "episode.html")]
pub struct EpisodePage<'a> {
    pub episode: &'a Episode,
}

impl<'a> From<&'a HomeEpisodes> for HomePage<'a> {
    fn from(home: &'a HomeEpisodes) -> Self {
        Self {
            latest: &home.latest,
            all: &home.all,
        }
    }
}
