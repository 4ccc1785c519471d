//! Plain-text rendering of registry results.
//!
//! Function-calling results travel back to the model as text, so every
//! lookup ends here rather than returning structured data.

use crate::parish::{ParishRecord, format_date};

/// Render search results, including visual centers when known.
#[must_use]
pub fn search_results(query: &str, parishes: &[ParishRecord]) -> String {
    if parishes.is_empty() {
        return no_matches(query);
    }

    let lines: Vec<String> = parishes
        .iter()
        .map(|parish| {
            let mut line = summary_line(parish);
            if let Some((lon, lat)) = parish.center() {
                line.push_str(&format!(" - Center: [{lon:.4}, {lat:.4}]"));
            }
            line
        })
        .collect();

    format!(
        "Found {} parish(es) matching '{query}':\n{}",
        parishes.len(),
        lines.join("\n")
    )
}

/// Render the detail block for a single parish.
///
/// Optional fields are left out entirely when the record does not carry them.
#[must_use]
pub fn details(parish: &ParishRecord) -> String {
    let mut lines = vec![
        format!("Name: {}", parish.name),
        format!("Code: {}", parish.code),
    ];

    if let Some((lon, lat)) = parish.center() {
        lines.push(format!(
            "Visual Center (Longitude, Latitude): [{lon:.6}, {lat:.6}]"
        ));
    }

    if let Some([min_lon, min_lat, max_lon, max_lat]) = parish.bbox() {
        lines.push(format!(
            "Bounding Box: [MinLon: {min_lon:.4}, MinLat: {min_lat:.4}, MaxLon: {max_lon:.4}, MaxLat: {max_lat:.4}]"
        ));
    }

    if let Some(changed) = &parish.changed
        && let Ok(date) = format_date(changed)
    {
        lines.push(format!("Last Changed: {date}"));
    }

    if let Some(geo_changed) = &parish.geo_changed
        && let Ok(date) = format_date(geo_changed)
    {
        lines.push(format!("Geometry Changed: {date}"));
    }

    lines.join("\n")
}

/// Render a listing. `filter` is the caller's filter as given, blank or not.
#[must_use]
pub fn listing(filter: Option<&str>, parishes: &[ParishRecord]) -> String {
    if parishes.is_empty() {
        return match filter {
            Some(filter) => no_matches(filter),
            None => "No parishes found.".to_string(),
        };
    }

    let header = match filter {
        Some(filter) => format!("Parishes matching '{filter}' (showing {}):", parishes.len()),
        None => format!("Sample of Danish parishes (showing {}):", parishes.len()),
    };

    let lines: Vec<String> = parishes.iter().map(summary_line).collect();
    format!("{header}\n{}", lines.join("\n"))
}

#[must_use]
pub fn not_found(code: &str) -> String {
    format!("Parish with code '{code}' not found.")
}

fn no_matches(query: &str) -> String {
    format!("No parishes found matching '{query}'.")
}

fn summary_line(parish: &ParishRecord) -> String {
    format!("- {} (Code: {})", parish.name, parish.code)
}
