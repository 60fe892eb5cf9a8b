// src/main.rs

use soloist::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("soloist error: {err:?}");
        std::process::exit(1);
    }

    let code = match run(args).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            tracing::error!(error = %err, "soloist failed");
            err.exit_code()
        }
    };

    std::process::exit(code);
}
