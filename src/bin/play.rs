use clap::Parser;
use fogwall::client::HttpPlayer;
use fogwall::judge::{self, LocalJudge};
use tracing_subscriber::EnvFilter;

/// Plays one game on a random hidden grid against a running agent.
#[derive(Parser)]
struct Cli {
    #[clap(long, short = 'u', default_value = "http://localhost:8080")]
    url: String,
    #[clap(long, short = 'n', default_value_t = 10)]
    grid_size: i64,
    #[clap(long, short = 'w', default_value_t = 10)]
    walls: usize,
    #[clap(long, short = 'c', default_value_t = 1)]
    crows: usize,
    #[clap(long, short = 's')]
    seed: Option<u64>,
    #[clap(long, default_value_t = 1000)]
    max_requests: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut judge = LocalJudge::random(
        &format!("play-{}", seed),
        cli.grid_size,
        cli.walls,
        cli.crows,
        seed,
    );
    let v = judge::play(&mut judge, HttpPlayer::new(&cli.url), cli.max_requests)?;
    println!("{}", serde_json::to_string_pretty(&v)?);
    Ok(())
}
