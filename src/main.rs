mod devenum;

use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use devenum::{
    find_device, list_devices, set_enabled, DeviceError, DeviceInfo, DevicePlatform, MatchRule,
    TOUCHSCREEN_CLASS, TOUCHSCREEN_DRIVER_KEY,
};

/// Find the HID touch screen and enable it at the device manager level.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Setup class name the device must report
    #[arg(long, value_name = "NAME", default_value = TOUCHSCREEN_CLASS)]
    class: String,

    /// Driver key the device must be bound to
    #[arg(long, value_name = "KEY", default_value = TOUCHSCREEN_DRIVER_KEY)]
    driver_key: String,

    /// Also require this exact device description
    #[arg(long, value_name = "TEXT")]
    description: Option<String>,

    /// Disable the device instead of enabling it
    #[arg(long)]
    disable: bool,

    /// List HID devices and exit
    #[arg(long, conflicts_with = "disable")]
    list: bool,

    /// Log what is being inspected
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn rule(&self) -> MatchRule {
        MatchRule {
            device_class: self.class.clone(),
            driver_key: self.driver_key.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Changed(DeviceInfo),
    NotFound,
    ChangeFailed(DeviceInfo, DeviceError),
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    #[cfg(windows)]
    let platform = devenum::win32::SetupApi;
    #[cfg(not(windows))]
    let platform = devenum::unsupported::Unsupported;

    process::exit(execute(&platform, &args));
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the command and return the process exit code.
fn execute<P: DevicePlatform>(platform: &P, args: &Args) -> i32 {
    if args.list {
        return match list_devices(platform) {
            Ok(devices) => {
                if devices.is_empty() {
                    println!("No HID devices found");
                }
                for device in devices {
                    println!(
                        "{:>6}  {:<12} {:<48} {}",
                        device.instance_handle,
                        device.device_class,
                        device.driver_name,
                        device.display_name()
                    );
                }
                0
            }
            Err(err) => fatal(&err),
        };
    }

    let enable = !args.disable;
    match run(platform, &args.rule(), enable) {
        Ok(outcome) => {
            report(&outcome, enable);
            0
        }
        Err(err) => fatal(&err),
    }
}

/// Locate the device, then set its state. Only a failure to enumerate HID
/// devices is an error; a missing device or a refused state change is an
/// outcome.
fn run<P: DevicePlatform>(platform: &P, rule: &MatchRule, enable: bool) -> Result<Outcome, DeviceError> {
    let Some(device) = find_device(platform, rule)? else {
        return Ok(Outcome::NotFound);
    };
    Ok(match set_enabled(platform, device.key(), enable) {
        Ok(()) => Outcome::Changed(device),
        Err(err) => Outcome::ChangeFailed(device, err),
    })
}

fn report(outcome: &Outcome, enable: bool) {
    let action = if enable { "enabled" } else { "disabled" };
    match outcome {
        Outcome::Changed(device) => {
            println!("Device {action}: {} ({})", device.display_name(), device.key());
        }
        Outcome::NotFound => println!("Device not found"),
        Outcome::ChangeFailed(device, err) => {
            println!("Device found: {} ({})", device.display_name(), device.key());
            println!("{err}");
            println!("Failed to change device state");
        }
    }
}

fn fatal(err: &DeviceError) -> i32 {
    println!("Cannot enumerate HID devices: {err}");
    exit_code(err)
}

/// The platform error code, or 1 when there is none to pass on.
fn exit_code(err: &DeviceError) -> i32 {
    match err.code() {
        Some(0) | None => 1,
        Some(code) => code as i32,
    }
}
