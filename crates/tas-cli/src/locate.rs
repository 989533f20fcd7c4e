//! `locate`: drive the nearest-branch resolver with fixed capabilities.

use std::time::Duration;

use clap::{Args, ValueEnum};
use tas_core::{Coordinates, OfficeDirectory};
use tas_locator::{
    Banner, FixedPermission, FixedPosition, MemorySessionStore, NearestBranchResolver,
    PermissionState, PositionOptions, PositionSource, Resolution, Unsupported,
};

#[derive(Debug, Args)]
pub struct LocateArgs {
    /// Reported latitude; omit both coordinates to simulate no positioning
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Reported longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// Permission answer; omit to simulate a platform that cannot be asked
    #[arg(long, value_enum)]
    pub permission: Option<PermissionArg>,
    /// Press "enable location" after mounting
    #[arg(long)]
    pub enable: bool,
    /// Dismiss the banner after mounting
    #[arg(long)]
    pub dismiss: bool,
    /// Override the acquisition timeout
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Granted,
    Denied,
    Prompt,
}

impl From<PermissionArg> for PermissionState {
    fn from(value: PermissionArg) -> Self {
        match value {
            PermissionArg::Granted => Self::Granted,
            PermissionArg::Denied => Self::Denied,
            PermissionArg::Prompt => Self::Prompt,
        }
    }
}

/// Resolve once and print the outcome.
///
/// # Errors
///
/// Returns an error for a zero timeout or if JSON output fails to serialize.
pub(crate) async fn run_locate(
    directory: OfficeDirectory,
    mut options: PositionOptions,
    args: &LocateArgs,
) -> anyhow::Result<()> {
    if let Some(ms) = args.timeout_ms {
        if ms == 0 {
            anyhow::bail!("--timeout-ms must be greater than zero");
        }
        options.timeout = Duration::from_millis(ms);
    }

    let point = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        _ => None,
    };

    let resolution = match point {
        Some(point) => resolve(directory, Some(FixedPosition(point)), args, options).await,
        None => resolve(directory, None::<Unsupported>, args, options).await,
    };
    let banner = resolution.banner();

    if args.json {
        let out = serde_json::json!({
            "resolution": resolution,
            "banner": banner,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("status:   {}", resolution.status);
    match (&resolution.office, resolution.distance_km) {
        (Some(office), Some(km)) => println!("office:   {} ({km:.3} km)", office.name),
        (Some(office), None) => println!("office:   {}", office.name),
        (None, _) => println!("office:   \u{2014}"),
    }
    println!("banner:   {}", describe_banner(&banner));

    Ok(())
}

async fn resolve<P: PositionSource>(
    offices: OfficeDirectory,
    position: Option<P>,
    args: &LocateArgs,
    options: PositionOptions,
) -> Resolution {
    let permissions = args.permission.map(|p| FixedPermission(p.into()));
    let resolver =
        NearestBranchResolver::new(offices, position, permissions, MemorySessionStore::new())
            .with_options(options);

    resolver.mount().await;
    if args.enable {
        resolver.enable_location().await;
    }
    if args.dismiss {
        resolver.dismiss();
    }
    resolver.snapshot()
}

/// One-line rendering of a banner for terminal output.
pub(crate) fn describe_banner(banner: &Banner) -> String {
    match banner {
        Banner::Finding => "finding your nearest branch...".to_string(),
        Banner::EnableLocation => "enable location to find your nearest branch".to_string(),
        Banner::Denied { contact: Some(c) } => {
            format!("location access denied; contact {} at {}", c.name, c.phone)
        }
        Banner::Denied { contact: None } => "location access denied".to_string(),
        Banner::Branch {
            office_name,
            contact,
            distance_label,
            is_fallback,
        } => {
            let mut line = format!(
                "{office_name}: {} at {}",
                contact.name, contact.phone
            );
            if let Some(label) = distance_label {
                line.push_str(&format!(" ({label})"));
            }
            if *is_fallback {
                line.push_str(" [head office]");
            }
            line
        }
        Banner::Hidden => "(hidden)".to_string(),
    }
}
