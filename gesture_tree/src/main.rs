//! gesture_tree — interactive entry point.

use gesture_tree::app::run;
use gesture_tree::config::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Gesture Tree — Tree ↔ Galaxy Hand Controller        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_camera = !args.iter().any(|a| a == "--no-camera");

    let cfg = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let Some(path) = args.get(i + 1) else {
                eprintln!("Error: --config needs a path");
                std::process::exit(2);
            };
            match AppConfig::load(path) {
                Ok(cfg) => {
                    println!("  Config: {}", path);
                    cfg
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => AppConfig::default(),
    };

    if !use_camera {
        println!("  Camera disabled — pointer only");
    }
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg, use_camera) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
