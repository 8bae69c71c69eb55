use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs;

use crate::pages::HomePage;
use crate::site::{self, Site};
use crate::slug::episode_slug;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("couldn't build page: {0}")]
    Site(#[from] site::Error),

    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Exported {
    pub pages: usize,
    pub assets: usize,
    pub skipped: usize,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn write_page(out: &Path, route: &Path, html: &str) -> Result<(), ExportError> {
    let dir = out.join(route);
    fs::create_dir_all(&dir).await.map_err(io_err(&dir))?;

    let file = dir.join("index.html");
    fs::write(&file, html).await.map_err(io_err(&file))?;

    info!("wrote {}", file.display());
    Ok(())
}

async fn copy_dir(from: &Path, to: &Path) -> Result<usize, ExportError> {
    let mut copied = 0;
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst).await.map_err(io_err(&dst))?;

        let mut entries = fs::read_dir(&src).await.map_err(io_err(&src))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&src))? {
            let path = entry.path();
            let target = dst.join(entry.file_name());

            if entry.file_type().await.map_err(io_err(&path))?.is_dir() {
                pending.push((path, target));
            } else {
                fs::copy(&path, &target).await.map_err(io_err(&path))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}

/// Writes the whole site under `out`: `index.html`, one
/// `episodes/{id}/index.html` per listed episode, and the public assets.
///
/// Any failed fetch fails the export. Episodes whose id can't be used as a
/// directory name are left out.
pub async fn export(site: &Site, out: &Path, public: Option<&Path>) -> Result<Exported, ExportError> {
    let mut exported = Exported::default();

    let home = site.home_episodes().await?;
    let html = site::render(&HomePage::from(&home))?;
    write_page(out, Path::new(""), &html).await?;
    exported.pages += 1;

    for episode in home.latest.iter().chain(&home.all) {
        if episode_slug(&episode.id).is_err() {
            warn!("skipping episode with unusable id {:?}", episode.id);
            exported.skipped += 1;
            continue;
        }

        let html = site.render_episode(&episode.id).await?;
        let route = Path::new("episodes").join(&episode.id);

        write_page(out, &route, &html).await?;
        exported.pages += 1;
    }

    match public {
        Some(dir) if dir.is_dir() => {
            exported.assets = copy_dir(dir, out).await?;
        }
        Some(dir) => warn!("public directory {} not found, no assets copied", dir.display()),
        None => {}
    }

    info!(
        "exported {} pages ({} skipped) and {} assets to {}",
        exported.pages,
        exported.skipped,
        exported.assets,
        out.display()
    );
    Ok(exported)
}
