use clap::Parser;

use mailshot::cli::{Cli, Commands};
use mailshot::config::{get_config, init_config_from};
use mailshot::runtime::modes;
use mailshot::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);
    let config = get_config();

    // 日志 guard 必须存活到进程结束
    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    match cli.command() {
        Commands::Serve => modes::run_server(&config).await,
        Commands::Worker { workers } => modes::run_worker(&config, workers).await,
        command => {
            if let Err(e) = modes::run_cli(command, &config).await {
                match e.downcast_ref::<mailshot::errors::MailshotError>() {
                    Some(err) => eprintln!("{}", err.format_colored()),
                    None => eprintln!("Error: {:#}", e),
                }
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
