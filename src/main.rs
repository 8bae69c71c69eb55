use std::{convert::Infallible, path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use log::{error, info, LevelFilter};
use warp::{http, Filter, Rejection, Reply};

mod api;
mod args;
mod cache;
mod duration;
mod episode;
mod export;
mod pages;
mod site;
mod slug;
mod time;

use api::ApiClient;
use args::{Args, Command};
use site::Site;

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let args = Args::parse();
    let api_config = args.api_config();

    let api = match ApiClient::new(&api_config) {
        Ok(api) => api,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let site = Site::new(api, args.site_config());

    match args.command() {
        Command::Serve(serve) => {
            let addr = match serve.addr() {
                Ok(addr) => addr,
                Err(e) => {
                    error!("invalid address: {e}");
                    return ExitCode::FAILURE;
                }
            };

            info!("serving on {addr}, episodes from {}", api_config.base_url);

            let routes = routes(Arc::new(site), args.public().to_path_buf());
            warp::serve(routes).run(addr).await;
            ExitCode::SUCCESS
        }
        Command::Build { out } => match export::export(&site, out, Some(args.public())).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                error!("export failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn routes(
    site: Arc<Site>,
    public: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_site = warp::any().map(move || Arc::clone(&site));

    let home = warp::path::end()
        .and(warp::get())
        .and(with_site.clone())
        .and_then(|site: Arc<Site>| async move {
            site.home().await.map(html).map_err(warp::reject::custom)
        });

    let episode = warp::path!("episodes" / String)
        .and(warp::get())
        .and(with_site)
        .and_then(|slug: String, site: Arc<Site>| async move {
            site.episode(&slug)
                .await
                .map(html)
                .map_err(warp::reject::custom)
        });

    let assets = warp::get().and(warp::fs::dir(public));

    home.or(episode)
        .or(assets)
        .recover(handle_rejection)
        .with(warp::log("podcastr"))
}

fn html(page: Arc<str>) -> warp::reply::Html<String> {
    warp::reply::html(page.to_string())
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let status = if let Some(e) = err.find::<site::Error>() {
        (*e).into()
    } else if err.is_not_found() {
        http::StatusCode::NOT_FOUND
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        http::StatusCode::METHOD_NOT_ALLOWED
    } else {
        error!("unhandled rejection: {err:?}");
        http::StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = status.canonical_reason().unwrap_or_default().to_string();
    Ok(warp::reply::with_status(body, status))
}
