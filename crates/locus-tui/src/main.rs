use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use locus_core::location::source_from_config;
use locus_core::{
    format_distance, links, AssistantClient, Config, Coordinate, GeminiClient, Locale,
    LocationProvider, Session, WatchHandle, WatchOptions,
};
use tracing::{error, info};

mod app;
mod handler;
mod logging;
mod system;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "locus")]
#[command(version, about = "Share your location, track the distance to a friend, ask about the area")]
struct Cli {
    /// Interface language: bn (Bengali) or en (English)
    #[arg(long, global = true, value_parser = parse_locale)]
    locale: Option<Locale>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive map and distance tracker (default)
    Track(TrackArgs),
    /// Print the distance between two points
    Distance {
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        from: Coordinate,
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        to: Coordinate,
    },
    /// Print the walking directions link between two points
    Directions {
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        from: Coordinate,
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        to: Coordinate,
        /// Also open the link in the browser
        #[arg(long)]
        open: bool,
    },
    /// Describe the area around a point
    Insight {
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        at: Coordinate,
    },
    /// Ask the assistant one question about a point
    Ask {
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        at: Coordinate,
        question: String,
    },
    /// Synthesize spoken guidance toward a friend and save it as WAV
    Guide {
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        from: Coordinate,
        #[arg(allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
        to: Coordinate,
        /// Output file
        #[arg(short, long, default_value = "guidance.wav")]
        out: PathBuf,
    },
}

#[derive(Args, Default)]
struct TrackArgs {
    /// Use a fixed position instead of a live source
    #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinate_arg, conflicts_with_all = ["replay", "ip"])]
    at: Option<Coordinate>,
    /// Replay positions from a file of "lat, lng" lines
    #[arg(long, conflicts_with = "ip")]
    replay: Option<PathBuf>,
    /// Locate by IP address
    #[arg(long)]
    ip: bool,
    /// Friend's position to start with
    #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinate_arg)]
    friend: Option<Coordinate>,
}

fn parse_coordinate_arg(s: &str) -> Result<Coordinate, String> {
    locus_core::parse_coordinate(s).map_err(|e| e.to_string())
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::from_str(s).ok_or_else(|| format!("unknown locale '{}', expected bn or en", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing file yields defaults; an unreadable one stops here
    let mut config = Config::load().context("Failed to load config")?;
    if let Some(locale) = cli.locale {
        config.locale = Some(locale);
    }

    let command = cli.command.unwrap_or(Commands::Track(TrackArgs::default()));
    if !matches!(command, Commands::Track(_)) {
        logging::init_stderr_logging()?;
    }
    run_command(config, command).await
}

async fn run_command(config: Config, command: Commands) -> Result<()> {
    let locale = config.locale();
    match command {
        Commands::Track(args) => return run_tui(config, args).await,
        Commands::Distance { from, to } => {
            println!("{}", format_distance(locus_core::distance_km(from, to), locale));
        }
        Commands::Directions { from, to, open } => {
            let url = links::directions_url(from, to);
            println!("{}", url);
            if open {
                system::open_url(&url)?;
            }
        }
        Commands::Insight { at } => {
            let client = GeminiClient::from_config(&config)?;
            println!("{}", client.area_insight(at).await);
        }
        Commands::Ask { at, question } => {
            let client = GeminiClient::from_config(&config)?;
            println!("{}", client.chat(at, &question).await);
        }
        Commands::Guide { from, to, out } => {
            let client = GeminiClient::from_config(&config)?;
            let km = locus_core::distance_km(from, to);
            let clip = client
                .voice_guidance(from, to, km)
                .await
                .ok_or_else(|| anyhow::anyhow!(locale.voice_failed()))?;
            system::write_wav(&clip, &out).await?;
            println!("{} ({:.1}s)", out.display(), clip.duration().as_secs_f64());
        }
    }
    Ok(())
}

/// Session flags take precedence over the saved config.
fn apply_track_args(config: &mut Config, args: &TrackArgs) {
    if let Some(at) = args.at {
        config.location_provider = Some(LocationProvider::Fixed.as_str().to_string());
        config.fixed_location = Some(at.to_string());
    } else if let Some(path) = &args.replay {
        config.location_provider = Some(LocationProvider::Replay.as_str().to_string());
        config.replay_file = Some(path.clone());
    } else if args.ip {
        config.location_provider = Some(LocationProvider::Ip.as_str().to_string());
    }
}

async fn run_tui(mut config: Config, args: TrackArgs) -> Result<()> {
    let log_dir = logging::init_file_logging()?;
    apply_track_args(&mut config, &args);

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let assistant: Arc<dyn AssistantClient> = Arc::new(GeminiClient::from_config(&config)?);

    let mut session = Session::new(config.locale());
    if let Some(friend) = args.friend {
        session.set_friend(friend);
    }

    let mut events = EventHandler::new();

    // One subscription for the whole session
    let watch = match source_from_config(&config, http) {
        Ok(source) => {
            session.start_tracking();
            let (watch, mut positions) = WatchHandle::spawn(source, WatchOptions::from_config(&config));
            let tx = events.sender();
            tokio::spawn(async move {
                while let Some(event) = positions.recv().await {
                    if tx.send(AppEvent::Position(event)).is_err() {
                        break;
                    }
                }
            });
            Some(watch)
        }
        Err(e) => {
            session.tracking_unavailable(&e);
            None
        }
    };

    let mut app = App::new(session, assistant, events.sender(), system::guidance_path());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    info!(
        target: "locus",
        source = config.location_provider().display_name(),
        log_dir = %log_dir.display(),
        "Session started"
    );

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    if let Some(watch) = watch {
        watch.stop().await;
    }
    tui::restore()?;

    if let Err(e) = &result {
        error!(target: "locus", "Session ended with error: {:#}", e);
    }
    info!(target: "locus", "Session ended");
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_track() {
        let cli = Cli::try_parse_from(["locus"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.locale.is_none());
    }

    #[test]
    fn test_cli_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["locus", "--locale", "en", "distance", "-33.86,151.21", "51.5,-0.12"]).unwrap();
        assert_eq!(cli.locale, Some(Locale::English));
        match cli.command {
            Some(Commands::Distance { from, to }) => {
                assert_eq!(from, Coordinate::new_unchecked(-33.86, 151.21));
                assert_eq!(to, Coordinate::new_unchecked(51.5, -0.12));
            }
            _ => panic!("expected distance command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_coordinate() {
        assert!(Cli::try_parse_from(["locus", "insight", "abc"]).is_err());
        assert!(Cli::try_parse_from(["locus", "track", "--at", "91,0"]).is_err());
        assert!(Cli::try_parse_from(["locus", "track", "--at", "1,2", "--ip"]).is_err());
    }

    #[test]
    fn test_track_args_override_config() {
        let mut config = Config::new();
        let args = TrackArgs {
            at: Some(Coordinate::new_unchecked(23.8103, 90.4125)),
            ..Default::default()
        };
        apply_track_args(&mut config, &args);
        assert_eq!(config.location_provider(), LocationProvider::Fixed);
        assert_eq!(config.fixed_location().unwrap(), Some(Coordinate::new_unchecked(23.8103, 90.4125)));

        let mut config = Config::new();
        let args = TrackArgs {
            replay: Some(PathBuf::from("walk.txt")),
            ..Default::default()
        };
        apply_track_args(&mut config, &args);
        assert_eq!(config.location_provider(), LocationProvider::Replay);
    }
}
