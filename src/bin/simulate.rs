use clap::Parser;
use fogwall::config::Config;
use fogwall::judge::{self, LocalJudge};
use fogwall::service::FogService;
use tracing_subscriber::EnvFilter;

/// Plays games against the in-process agent on random hidden grids.
#[derive(Parser)]
struct Cli {
    #[clap(long, short = 'n', default_value_t = 10)]
    grid_size: i64,
    #[clap(long, short = 'w', default_value_t = 10)]
    walls: usize,
    #[clap(long, short = 'c', default_value_t = 1)]
    crows: usize,
    /// Number of games; game `i` uses seed `seed + i`.
    #[clap(long, short = 'g', default_value_t = 1)]
    games: u64,
    #[clap(long, short = 's', default_value_t = 0)]
    seed: u64,
    #[clap(long, default_value_t = 1000)]
    max_requests: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let service = FogService::new(&Config::from_env()?);
    let (mut found, mut total, mut wrong, mut actions) = (0, 0, 0, 0);
    for i in 0..cli.games {
        let seed = cli.seed + i;
        let mut judge = LocalJudge::random(
            &format!("sim-{}", seed),
            cli.grid_size,
            cli.walls,
            cli.crows,
            seed,
        );
        let v = judge::play(&mut judge, &service, cli.max_requests)?;
        println!(
            "seed={} found={}/{} wrong={} actions={}",
            seed,
            v.found,
            v.found + v.missed,
            v.wrong,
            v.actions
        );
        found += v.found;
        total += v.found + v.missed;
        wrong += v.wrong;
        actions += v.actions;
    }
    if cli.games > 1 {
        println!(
            "total: found={}/{} ({:.1}%) wrong={} avg_actions={:.1}",
            found,
            total,
            100.0 * found as f64 / total.max(1) as f64,
            wrong,
            actions as f64 / cli.games as f64
        );
    }
    Ok(())
}
