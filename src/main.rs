//! `cs10` — bridge a JLCooper CS-10 to an MMC/MTC-speaking workstation.

use std::path::PathBuf;
use std::process;

struct Options {
    verbose: bool,
    settings_file: Option<PathBuf>,
    hardware: Option<(i32, i32)>,
}

fn usage(program: &str) -> ! {
    eprintln!("{} options:", program);
    eprintln!("  --file, -f [path] to persistent data file");
    eprintln!("  --port, -p [client:port] of midi hardware interface");
    eprintln!("  --verbose, -v print debug information");
    eprintln!("  --help, -h show this help and exit");
    process::exit(0);
}

fn parse_port(arg: &str) -> Option<(i32, i32)> {
    let (client, port) = arg.split_once(':')?;
    Some((client.trim().parse().ok()?, port.trim().parse().ok()?))
}

fn parse_args() -> Options {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "cs10".into());
    let mut options = Options {
        verbose: false,
        settings_file: None,
        hardware: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => options.verbose = true,
            "-f" | "--file" => match args.next() {
                Some(path) => options.settings_file = Some(PathBuf::from(path)),
                None => usage(&program),
            },
            "-p" | "--port" => {
                let spec = args.next();
                match spec.as_deref().and_then(parse_port) {
                    Some(hardware) => options.hardware = Some(hardware),
                    None => {
                        eprintln!("bad parameter: {}", spec.as_deref().unwrap_or(""));
                        usage(&program);
                    }
                }
            }
            "-h" | "--help" => usage(&program),
            _ => usage(&program),
        }
    }
    options
}

#[cfg(target_os = "linux")]
fn main() {
    use cs10::persist;
    use cs10::seq::SeqBridge;
    use cs10::surface::Surface;
    use log::debug;

    let options = parse_args();
    env_logger::Builder::new()
        .filter_level(if options.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let settings = options
        .settings_file
        .or_else(persist::default_settings_path);
    match &settings {
        Some(path) => debug!("using settings file {}", path.display()),
        None => debug!("no settings path; snapshots will not persist"),
    }

    let mut bridge = match SeqBridge::open() {
        Ok(bridge) => bridge,
        Err(err) => {
            eprintln!("cs10: {}", err);
            process::exit(1);
        }
    };
    SeqBridge::install_signal_handler();

    if let Some((client, port)) = options.hardware {
        debug!("connecting control port to {}:{}", client, port);
        bridge.connect_hardware(client, port);
    }

    let mut surface = Surface::new(settings);
    bridge.run(&mut surface);
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("cs10 requires the ALSA sequencer and only runs on Linux");
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::parse_port;

    #[test]
    fn parses_client_and_port() {
        assert_eq!(parse_port("20:0"), Some((20, 0)));
        assert_eq!(parse_port("128:1"), Some((128, 1)));
    }

    #[test]
    fn rejects_malformed_port_specs() {
        assert_eq!(parse_port("20"), None);
        assert_eq!(parse_port(":1"), None);
        assert_eq!(parse_port("a:b"), None);
        assert_eq!(parse_port(""), None);
    }
}
