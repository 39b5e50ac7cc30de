pub mod calibrate;
pub mod decode;
pub mod device;
pub mod layout;

#[cfg(test)]
pub mod cli_test;

use std::{error::Error, io, path::PathBuf};

use calibrate::{handle_calibrate, handle_collect};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use decode::{handle_profile, handle_run};
use device::handle_devices;
use layout::{handle_infer, handle_validate};

use crate::{
    config::{layout::Layout, store::LayoutStore, DecoderConfig},
    input::source::{simulator::Simulator, InputError, ReportSource},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the layout and collected samples
    /// (default: "$XDG_DATA_HOME/hidmap")
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Decoder configuration file (default: first "decoder.yaml" found)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Decode a report stream and print input events as JSON lines (default)
    Run {
        /// Use a simulated controller instead of a HID device
        #[arg(long, action)]
        simulate: bool,
        /// HID device path to open (e.g. "/dev/hidraw3")
        #[arg(long)]
        device: Option<String>,
    },
    /// List attached HID devices
    Devices,
    /// Locate every control by actuating them one at a time
    Calibrate {
        /// Use a simulated controller instead of a HID device
        #[arg(long, action)]
        simulate: bool,
        /// Seconds to wait for each control
        #[arg(long, default_value_t = 8)]
        timeout: u64,
        /// Number of times each control is prompted for
        #[arg(long, default_value_t = 1)]
        trials: usize,
        /// Only print the inferred layout
        #[arg(long, action)]
        no_save: bool,
    },
    /// Collect labelled samples for one control and re-infer buttons
    Collect {
        /// Name of the control (e.g. "cross")
        #[arg(long)]
        label: String,
        /// Number of samples to collect (1-100)
        #[arg(long, default_value_t = 3)]
        count: usize,
        /// Generate samples instead of reading a HID device
        #[arg(long, action)]
        simulate: bool,
        /// Seconds to wait for each sample
        #[arg(long, default_value_t = 8)]
        timeout: u64,
        /// Store the samples but do not save the inferred layout
        #[arg(long, action)]
        no_save: bool,
    },
    /// Infer button mappings from the stored samples
    Infer,
    /// Validate the stored layout against the stored samples
    Validate,
    /// Look for sensor-like bytes in a window of reports
    Profile {
        /// Use a simulated controller instead of a HID device
        #[arg(long, action)]
        simulate: bool,
        /// HID device path to open (e.g. "/dev/hidraw3")
        #[arg(long)]
        device: Option<String>,
        /// Number of reports to sample
        #[arg(long, default_value_t = 64)]
        reports: usize,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

/// Shared state of all commands
#[derive(Debug, Clone)]
pub struct Context {
    pub store: LayoutStore,
    pub config: DecoderConfig,
}

impl Context {
    pub fn new(args: &Args) -> Self {
        let store = match args.data_dir.as_ref() {
            Some(dir) => LayoutStore::new(dir),
            None => LayoutStore::default(),
        };
        let config = DecoderConfig::load(args.config.as_deref());
        log::debug!("Using data directory: {}", store.dir().display());
        Self { store, config }
    }
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error>> {
    let ctx = Context::new(&args);
    let cmd = args.cmd.unwrap_or(Commands::Run {
        simulate: false,
        device: None,
    });

    match cmd {
        Commands::Run { simulate, device } => handle_run(&ctx, simulate, device).await?,
        Commands::Devices => handle_devices()?,
        Commands::Calibrate {
            simulate,
            timeout,
            trials,
            no_save,
        } => handle_calibrate(&ctx, simulate, timeout, trials, no_save).await?,
        Commands::Collect {
            label,
            count,
            simulate,
            timeout,
            no_save,
        } => handle_collect(&ctx, label, count, simulate, timeout, no_save).await?,
        Commands::Infer => handle_infer(&ctx)?,
        Commands::Validate => handle_validate(&ctx)?,
        Commands::Profile {
            simulate,
            device,
            reports,
        } => handle_profile(&ctx, simulate, device, reports).await?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "hidmap", &mut io::stdout());
        }
    }

    Ok(())
}

/// Open the given HID device, or the first attached controller
#[cfg(feature = "hidraw")]
pub fn open_device(path: Option<&str>) -> Result<Box<dyn ReportSource>, InputError> {
    use crate::input::source::hidraw::HidrawSource;

    let source = match path {
        Some(path) => HidrawSource::open(path)?,
        None => HidrawSource::open_first_controller()?,
    };
    Ok(Box::new(source))
}

#[cfg(not(feature = "hidraw"))]
pub fn open_device(_path: Option<&str>) -> Result<Box<dyn ReportSource>, InputError> {
    Err(InputError::Device("built without hidraw support".into()))
}

/// Open a report source. Without `--simulate` a HID device is tried first;
/// if none is found and no path was given, a simulated controller is used.
pub fn open_source(
    simulate: bool,
    device: Option<&str>,
    layout: &Layout,
) -> Result<Box<dyn ReportSource>, InputError> {
    if !simulate {
        match open_device(device) {
            Ok(source) => return Ok(source),
            Err(e) if device.is_some() => return Err(e),
            Err(e) => log::warn!("No controller available ({e}). Falling back to simulation."),
        }
    }
    Ok(Box::new(Simulator::new(layout.clone())))
}
