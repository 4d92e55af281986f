use abroad::cli::run;
use abroad::error::is_user_error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("ABROAD_LOG", "warn"))
        .format_timestamp(None)
        .init();

    // Colour falls back to plain text where the console refuses ANSI
    if enable_ansi_support::enable_ansi_support().is_err() {
        log::debug!("ANSI escape codes not supported by this console");
    }

    if let Err(e) = run() {
        if is_user_error(&e) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }

        eprintln!("Internal error: {}", e);
        let mut source = e.source();
        if source.is_some() {
            eprintln!("\nCaused by:");
            let mut indent = 1;
            while let Some(err) = source {
                eprintln!("{:indent$}  {}", "", err);
                source = err.source();
                indent += 1;
            }
        }
        std::process::exit(2);
    }
}
