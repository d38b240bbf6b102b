use clap::Parser;
use maestro_meter::config::{Config, ConfigLoader, ConnectionKind};
use maestro_meter::{logging, stdio, DeviceController};
use std::path::PathBuf;
use tracing::{error, info};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Control adapter for the Gentec-EO Maestro power/energy meter.",
    long_about = "Connects to a Maestro over a serial line or TCP and serves attribute reads and writes as line-delimited JSON on stdin/stdout."
)]
struct Args {
    /// Configuration file. Defaults to the standard search path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Link type: serial or net.
    #[arg(long)]
    kind: Option<ConnectionKind>,

    /// Serial device path (e.g. /dev/ttyUSB0 or COM3).
    #[arg(long)]
    serial_port: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Host for a network link.
    #[arg(long)]
    host: Option<String>,

    /// TCP port for a network link.
    #[arg(short, long)]
    port: Option<u16>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        let conn = &mut config.connection;
        if let Some(kind) = self.kind {
            conn.kind = kind;
        }
        if let Some(ref serial_port) = self.serial_port {
            conn.serial_port = serial_port.clone();
        }
        if let Some(baud_rate) = self.baud_rate {
            conn.baud_rate = baud_rate;
        }
        if let Some(ref host) = self.host {
            conn.host = host.clone();
        }
        if let Some(port) = self.port {
            conn.port = port;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    args.apply(&mut config);
    config.validate()?;

    logging::init(&config.logging)?;

    let mut controller = DeviceController::new(config.connection.clone());
    if let Err(e) = controller.init() {
        error!(error = %e, "startup failed");
        return Err(e.into());
    }
    info!(state = ?controller.state(), "serving attributes on stdio");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let served = stdio::run(&mut controller, stdin.lock(), stdout.lock());

    controller.teardown();
    served?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_host_completes_a_net_config() {
        let mut config: Config = toml::from_str("[connection]\nkind = \"net\"\nhost = \"\"").unwrap();
        assert!(config.validate().is_err());

        let args = Args::parse_from(["maestro_meter", "--host", "10.0.0.7", "-p", "4001"]);
        args.apply(&mut config);

        assert!(config.validate().is_ok());
        assert_eq!(config.connection.kind, ConnectionKind::Net);
        assert_eq!(config.connection.host, "10.0.0.7");
        assert_eq!(config.connection.port, 4001);
    }
}
