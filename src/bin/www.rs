use actix_web::{App, HttpServer, web};
use clap::Parser;
use fogwall::config::Config;
use fogwall::service::FogService;
use fogwall::www;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    /// Address to listen on.
    #[clap(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    bind: String,
    #[clap(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Log at debug level unless RUST_LOG is set.
    #[clap(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!(?config, "loaded configuration");
    let service = web::Data::new(FogService::new(&config));

    let bind_address = format!("{}:{}", cli.bind, cli.port);
    info!("Starting server at: http://{}/fog-of-wall", bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(www::routes)
    })
    .bind(bind_address)?
    .run()
    .await?;
    Ok(())
}
