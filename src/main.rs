use ownship_map::utils::ConfigurationManager;
use ownship_map::{Application, FileIconSource, JsonLinesSurface, SystemClock};

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config_path: Option<String>,
    /// Stop after this many fixes; run forever when absent
    ticks: Option<u64>,
    /// Write the effective configuration here and exit
    dump_config: Option<String>,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => {
                let value = args.next().ok_or("--ticks needs a value")?;
                let ticks = value
                    .parse::<u64>()
                    .map_err(|e| format!("Invalid --ticks value '{}': {}", value, e))?;
                parsed.ticks = Some(ticks);
            }
            "--dump-config" => {
                parsed.dump_config = Some(args.next().ok_or("--dump-config needs a path")?);
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            path => {
                if parsed.config_path.is_some() {
                    return Err(format!("Unexpected argument '{}'", path));
                }
                parsed.config_path = Some(path.to_string());
            }
        }
    }
    Ok(parsed)
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [config.json] [--ticks N] [--dump-config PATH]\n\
         Frames are written to stdout as JSON lines; set RUST_LOG to override the log level.",
        program
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut raw = std::env::args();
    let program = raw.next().unwrap_or_else(|| "ownship-map".to_string());
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", usage(&program));
            return Err(message.into());
        }
    };

    let mut manager = match &args.config_path {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    let config = manager.get_config().clone();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();
    for warning in manager.validate_config(&config).warnings {
        log::warn!("Configuration: {}", warning);
    }

    if let Some(path) = &args.dump_config {
        manager.save_to_file(path)?;
        log::info!("Configuration written to {}", path);
        return Ok(());
    }

    let mut app = Application::new(config.clone(), SystemClock::new())?;
    app.load_icons(FileIconSource::new(&config.assets_root))?;
    app.attach(Some(Box::new(JsonLinesSurface::new(
        "stdout",
        config.view.viewport_px,
        std::io::stdout(),
    ))))?;
    app.start()?;

    match args.ticks {
        Some(ticks) => log::info!("Emitting {} fixes", ticks),
        None => log::info!("Emitting fixes until interrupted"),
    }
    let fired = app.run(args.ticks);
    log::info!(
        "Done: {} fixes emitted, {} rejected, {} frames rendered, {} not presented",
        fired,
        app.rejected_fixes(),
        app.map().render_count(),
        app.surface_failures()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_config_and_ticks() {
        let args = parse(&["map.json", "--ticks", "5"]).unwrap();
        assert_eq!(args.config_path.as_deref(), Some("map.json"));
        assert_eq!(args.ticks, Some(5));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--ticks"]).is_err());
        assert!(parse(&["--ticks", "many"]).is_err());
        assert!(parse(&["--fast"]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
    }
}
