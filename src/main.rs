use pixellab::cli::{self, CliOutcome};
use pixellab::{invocation, logger, InvocationResult, PixelLabConfig};

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    if let Err(e) = logger::init() {
        eprintln!("Failed to initialize logger: {}", e);
    }
    if dotenv_loaded {
        log::debug!(".env file loaded");
    }

    let result = match cli::parse_from(std::env::args_os()) {
        Ok(CliOutcome::Display(text)) => {
            print!("{}", text);
            return;
        }
        Ok(CliOutcome::Invoke(parsed)) => {
            let config = PixelLabConfig::from_env();
            log::debug!("Configuration: {:?}", config);
            invocation::run(&config, &parsed).await
        }
        Err(e) => {
            log::error!("{}", e);
            InvocationResult::failure(&e, Vec::new())
        }
    };

    println!("{}", result.to_json());
    std::process::exit(result.exit_code());
}
