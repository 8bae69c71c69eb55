use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::api::ApiConfig;
use crate::site::SiteConfig;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Base URL of the episodes API.
    #[arg(long, env = "PODCASTR_API_URL", default_value = "http://localhost:3333")]
    api_url: String,

    /// How many of the newest episodes the home page lists.
    /// The first two are shown as latest releases.
    #[arg(short, long, default_value_t = 12)]
    limit: u32,

    /// Timeout for each request to the episodes API, in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Directory of static assets (styles, icons), served at `/`
    /// and copied into exports.
    #[arg(long, default_value = "public")]
    public: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the site, rendering each page again once it's older
    /// than its revalidation interval.
    Serve(ServeArgs),

    /// Render the home page and every listed episode to static files.
    Build {
        /// Output directory.
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// The address podcastr should listen on. By default
    /// podcastr will listen just on the IPv4 loopback.
    #[arg(short, long)]
    address: Option<String>,

    /// The port podcastr listens on.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds before the home page is rendered again.
    #[arg(long, default_value_t = 60 + 60 * 8)]
    home_revalidate: u64,

    /// Seconds before an episode page is rendered again.
    #[arg(long, default_value_t = 60 * 60 * 24)]
    episode_revalidate: u64,
}

impl Args {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn public(&self) -> &Path {
        &self.public
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout_secs: self.timeout,
        }
    }

    pub fn site_config(&self) -> SiteConfig {
        let config = SiteConfig {
            home_limit: self.limit,
            ..Default::default()
        };

        match &self.command {
            Command::Serve(serve) => SiteConfig {
                home_revalidate: Duration::from_secs(serve.home_revalidate),
                episode_revalidate: Duration::from_secs(serve.episode_revalidate),
                ..config
            },
            Command::Build { .. } => config,
        }
    }
}

impl ServeArgs {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse()
            .map(|addr: IpAddr| (addr, self.port).into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("podcastr").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn serve_defaults() {
        let args = parse(&["serve"]);

        let Command::Serve(serve) = args.command() else {
            panic!("expected serve")
        };
        assert_eq!(serve.addr().unwrap(), "127.0.0.1:3000".parse::<SocketAddr>().unwrap());

        let site = args.site_config();
        assert_eq!(site.home_limit, 12);
        assert_eq!(site.home_revalidate, Duration::from_secs(540));
        assert_eq!(site.episode_revalidate, Duration::from_secs(86_400));
        assert_eq!(args.public(), Path::new("public"));
    }

    #[test]
    fn serve_overrides() {
        let args = parse(&[
            "--api-url",
            "https://api.example.com/",
            "--limit",
            "6",
            "--timeout",
            "3",
            "serve",
            "--address",
            "::",
            "--port",
            "8080",
            "--home-revalidate",
            "30",
        ]);

        let Command::Serve(serve) = args.command() else {
            panic!("expected serve")
        };
        assert_eq!(serve.addr().unwrap(), "[::]:8080".parse::<SocketAddr>().unwrap());

        let api = args.api_config();
        assert_eq!(api.base_url, "https://api.example.com/");
        assert_eq!(api.timeout_secs, 3);

        let site = args.site_config();
        assert_eq!(site.home_limit, 6);
        assert_eq!(site.home_revalidate, Duration::from_secs(30));
    }

    #[test]
    fn build() {
        let args = parse(&["build", "--out", "dist"]);
        match args.command() {
            Command::Build { out } => assert_eq!(out, Path::new("dist")),
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn api_url_from_env() {
        std::env::set_var("PODCASTR_API_URL", "https://env.example.com");

        let from_env = parse(&["build"]).api_config();
        let from_flag = parse(&["--api-url", "https://flag.example.com", "build"]).api_config();

        std::env::remove_var("PODCASTR_API_URL");

        assert_eq!(from_env.base_url, "https://env.example.com");
        assert_eq!(from_flag.base_url, "https://flag.example.com");
    }

    #[test]
    fn bad_address() {
        let args = parse(&["serve", "--address", "localhost"]);
        let Command::Serve(serve) = args.command() else {
            panic!("expected serve")
        };
        assert!(serve.addr().is_err());
    }
}
