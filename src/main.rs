use taskmq::config::{load_config, Config};
use taskmq::logging::init_logging;
use taskmq::run;

use std::path::Path;
use std::process;

const CONFIG_FILE: &str = "taskmq.toml";

#[tokio::main]
async fn main() {
    let _guard = init_logging();

    let config: Config = if Path::new(CONFIG_FILE).exists() {
        match load_config(CONFIG_FILE) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("[FATAL] Failed to load config: {e}");
                process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    if let Err(e) = run(config).await {
        eprintln!("[FATAL] Server crashed: {e}");
        process::exit(1);
    }
}
