use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use hexlink_protocol::{
    DEFAULT_BAUD_RATE, LinkConfig, SendResult, SenderConfig, Session, SimulatedPeer,
    TracingLogger, extension_from_path, open_serial, send_file,
};

/// Bounds one byte read after the port reported data pending.
const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(
    name = "hexlink-send",
    version,
    about = "Upload a file to a serial-attached radio board, one handshake per chunk"
)]
struct Args {
    /// File to send. Its extension goes into the header.
    file: PathBuf,

    /// Serial device, e.g. /dev/ttyACM0
    #[arg(short, long, env = "HEXLINK_PORT", required_unless_present = "dry_run")]
    port: Option<String>,

    /// Serial speed
    #[arg(short, long, env = "HEXLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Already encoded payload text. Defaults to the file's bytes as hex.
    #[arg(long)]
    payload: Option<String>,

    /// Give up on a handshake after this many milliseconds
    #[arg(long, env = "HEXLINK_HANDSHAKE_TIMEOUT_MS", default_value_t = 10_000)]
    handshake_timeout_ms: u64,

    /// Sleep between polls of an idle port
    #[arg(long, env = "HEXLINK_POLL_INTERVAL_MS", default_value_t = 1)]
    poll_interval_ms: u64,

    /// Print the board's echo text after every chunk
    #[arg(long, env = "HEXLINK_ECHO")]
    echo: bool,

    /// Run against an in-memory board instead of a serial device
    #[arg(long)]
    dry_run: bool,

    /// Print the transfer report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hexlink_send=info,hexlink_protocol=info".into()),
        )
        .init();

    let args = Args::parse();

    let link = LinkConfig::default()
        .with_handshake_timeout(Duration::from_millis(args.handshake_timeout_ms))
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_echo(args.echo);
    link.validate()?;
    let config = SenderConfig::new(link).with_logger(Arc::new(TracingLogger));

    let extension = extension_from_path(&args.file)?;
    let payload = match &args.payload {
        Some(text) => text.clone().into_bytes(),
        None => {
            let raw = std::fs::read(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            hex::encode(raw).into_bytes()
        }
    };
    info!(
        "Prepared {} ({} payload bytes, extension {:?})",
        args.file.display(),
        payload.len(),
        extension
    );

    let result = if args.dry_run {
        dry_run(&extension, &payload, args.baud, &config)?
    } else {
        let port = args.port.as_deref().context("no serial port given")?;
        let session = open_serial(port, args.baud, SERIAL_READ_TIMEOUT)
            .with_context(|| format!("opening {}", port))?;
        send_file(session, &extension, &payload, &config)
            .with_context(|| format!("sending {} over {}", args.file.display(), port))?
    };

    report(&result, args.json)
}

fn dry_run(
    extension: &str,
    payload: &[u8],
    baud: u32,
    config: &SenderConfig,
) -> anyhow::Result<SendResult> {
    let mut peer = SimulatedPeer::new(&config.link);
    let result = send_file(Session::open(&mut peer, "loopback", baud), extension, payload, config)?;

    if peer.payload() != payload {
        bail!(
            "loopback board reassembled {} bytes, expected {}",
            peer.payload().len(),
            payload.len()
        );
    }
    if peer.extension().as_deref() != Some(extension) {
        bail!("loopback board decoded extension {:?}", peer.extension());
    }
    info!("Loopback board received chunks {:?}", peer.chunk_sizes());
    Ok(result)
}

fn report(result: &SendResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for text in &result.echoes {
        println!("{}", text);
    }
    println!(
        "sent .{} payload to {}: {} bytes, {} chunks, {} handshakes, {} ms",
        result.extension,
        result.endpoint,
        result.payload_bytes,
        result.chunks_sent,
        result.handshakes,
        result.elapsed_ms
    );
    println!("payload sha256 {}", result.payload_sha256);
    Ok(())
}
