//! Command-line interface for hubbridge
//!
//! `hubbridge serve` runs the HTTP gateway; `hubbridge authorize-url` prints
//! the consent URL so an operator can connect the account without the UI.

use crate::auth::AuthorizationEndpoint;
use crate::config::Config;
use crate::constants::{CONFIG_FILE_NAME, ENV_HOST, ENV_PORT};
use crate::Result;
use clap::{Arg, ArgMatches, Command};

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = load_config(&matches)?;

    crate::init_logging(&config.log);

    match matches.subcommand() {
        Some(("serve", sub_matches)) => handle_serve_command(config, sub_matches).await,
        Some(("authorize-url", _)) => handle_authorize_url_command(&config),
        _ => {
            eprintln!("No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn build_cli() -> Command {
    Command::new("hubbridge")
        .about("HubSpot OAuth2 integration gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value(CONFIG_FILE_NAME)
                .help("Path to a JSON or YAML config file"),
        )
        .subcommand(
            Command::new("serve")
                .about("Start the HTTP gateway")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .env(ENV_HOST)
                        .help("Server host (overrides config)"),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .short('p')
                        .env(ENV_PORT)
                        .value_parser(clap::value_parser!(u16))
                        .help("Server port (overrides config)"),
                ),
        )
        .subcommand(
            Command::new("authorize-url").about("Print the URL that starts the consent flow"),
        )
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(CONFIG_FILE_NAME);
    Config::load_from_path(path)
}

/// Apply `--host`/`--port` on top of the loaded config
fn apply_serve_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(host) = matches.get_one::<String>("host") {
        config.http.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.http.port = *port;
    }
}

async fn handle_serve_command(mut config: Config, matches: &ArgMatches) -> Result<()> {
    apply_serve_overrides(&mut config, matches);
    crate::http::start_server(config).await
}

fn handle_authorize_url_command(config: &Config) -> Result<()> {
    let url = AuthorizationEndpoint::from_config(config).authorization_url()?;
    println!("{}", url);
    Ok(())
}
