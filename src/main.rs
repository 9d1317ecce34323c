mod cli;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let code = match cli::run() {
        cli::RunOutcome::Serve(config) => match bakpdl::serve(config).await {
            Ok(()) => 0,
            Err(err) => {
                tracing::error!(error = %err, "server stopped");
                1
            }
        },
        cli::RunOutcome::Lookup(config, queries) => {
            match bakpdl::lookup(&config, &queries).await {
                Ok(reply) => {
                    println!("{reply}");
                    0
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    1
                }
            }
        }
        cli::RunOutcome::Event(config, input) => cli::print_event(&config, &input).await,
        cli::RunOutcome::Exit(code) => code,
    };
    std::process::exit(code);
}
