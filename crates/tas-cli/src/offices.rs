//! `offices` subcommands: list, validate and query the office directory.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use tas_core::{format_distance, whatsapp_link, Coordinates, OfficeDirectory, PrimaryContact};

#[derive(Debug, Subcommand)]
pub enum OfficesCommands {
    /// List configured offices in fallback order
    List {
        /// Print the offices as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the offices file
    Check,
    /// Find the office closest to a coordinate
    Nearest {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
}

/// Load and validate the offices file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub(crate) fn load_directory(
    path: &Path,
) -> anyhow::Result<(OfficeDirectory, Option<PrimaryContact>)> {
    let file = tas_core::load_offices(path)
        .with_context(|| format!("loading offices from {}", path.display()))?;
    let primary = file.primary_contact.clone();
    let directory = file.into_directory()?;
    tracing::debug!(path = %path.display(), offices = directory.len(), "offices loaded");
    Ok((directory, primary))
}

pub(crate) fn run_offices(
    command: &OfficesCommands,
    path: &Path,
    country_code: &str,
) -> anyhow::Result<()> {
    match command {
        OfficesCommands::List { json } => run_offices_list(path, *json),
        OfficesCommands::Check => run_offices_check(path, country_code),
        OfficesCommands::Nearest { lat, lng } => {
            run_offices_nearest(path, Coordinates::new(*lat, *lng))
        }
    }
}

fn run_offices_list(path: &Path, json: bool) -> anyhow::Result<()> {
    let (directory, _) = load_directory(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(directory.as_slice())?);
        return Ok(());
    }

    println!("{:<20}{:<28}{:<22}PHONE", "ID", "NAME", "CONTACT");
    for office in &directory {
        let (contact, phone) = office
            .display_contact()
            .map_or(("\u{2014}", "\u{2014}"), |c| (c.name.as_str(), c.phone.as_str()));
        println!("{:<20}{:<28}{:<22}{}", office.id, office.name, contact, phone);
    }

    Ok(())
}

fn run_offices_check(path: &Path, country_code: &str) -> anyhow::Result<()> {
    let (directory, primary) = load_directory(path)?;
    let contacts: usize = directory.iter().map(|o| o.contacts.len()).sum();

    println!(
        "ok: {} offices, {} contacts in {}",
        directory.len(),
        contacts,
        path.display()
    );
    println!("head office: {}", directory.head_office().name);
    match primary {
        Some(p) => println!(
            "primary contact: {} ({})",
            p.name,
            whatsapp_link(&p.whatsapp, None, country_code)
        ),
        None => println!("primary contact: none configured"),
    }

    Ok(())
}

fn run_offices_nearest(path: &Path, point: Coordinates) -> anyhow::Result<()> {
    if !point.is_valid() {
        anyhow::bail!(
            "coordinates out of range: ({}, {})",
            point.lat,
            point.lng
        );
    }

    let (directory, _) = load_directory(path)?;
    let (office, km) = directory.nearest(point);
    println!(
        "{} ({}) {:.3} km, {}",
        office.name,
        office.id,
        km,
        format_distance(km)
    );
    println!("maps: {}", office.maps_url);

    Ok(())
}
