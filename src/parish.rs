//! Parish (sogn) records as served by the Dataforsyningen registry.
//!
//! The registry speaks Danish field names (`navn`, `kode`, `ændret`, ...);
//! [`ParishRecord`] maps them onto English names and keeps every geometry
//! field optional, since records routinely come back with a center but no
//! bounding box or without any change timestamps at all.

use serde::{Deserialize, Deserializer};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// One administrative parish unit.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ParishRecord {
    #[serde(rename = "navn", default)]
    pub name: String,

    /// Registry-assigned identifier. Opaque, never parsed as a number.
    #[serde(rename = "kode", default)]
    pub code: String,

    /// `[longitude, latitude]` of the label placement point.
    #[serde(rename = "visueltcenter", default)]
    pub visual_center: Option<Vec<f64>>,

    /// `[min_lon, min_lat, max_lon, max_lat]`.
    #[serde(rename = "bbox", default)]
    pub bounding_box: Option<Vec<f64>>,

    #[serde(rename = "ændret", default, deserialize_with = "lenient_timestamp")]
    pub changed: Option<OffsetDateTime>,

    #[serde(rename = "geo_ændret", default, deserialize_with = "lenient_timestamp")]
    pub geo_changed: Option<OffsetDateTime>,

    #[serde(rename = "geo_version", default)]
    pub geo_version: Option<i64>,
}

impl ParishRecord {
    /// Visual center as `(longitude, latitude)`, if at least two components are present.
    #[must_use]
    pub fn center(&self) -> Option<(f64, f64)> {
        match self.visual_center.as_deref() {
            Some([lon, lat, ..]) => Some((*lon, *lat)),
            _ => None,
        }
    }

    /// Bounding box as `[min_lon, min_lat, max_lon, max_lat]`, if complete.
    #[must_use]
    pub fn bbox(&self) -> Option<[f64; 4]> {
        match self.bounding_box.as_deref() {
            Some([min_lon, min_lat, max_lon, max_lat, ..]) => {
                Some([*min_lon, *min_lat, *max_lon, *max_lat])
            }
            _ => None,
        }
    }
}

// The details lookup omits a missing center entirely; this rendering shows N/A.
impl fmt::Display for ParishRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parish: {} (Code: {}, Center: ", self.name, self.code)?;
        match self.center() {
            Some((lon, lat)) => write!(f, "[{lon:.4}, {lat:.4}])"),
            None => write!(f, "N/A)"),
        }
    }
}

/// Format a timestamp as `yyyy-MM-dd`, in the offset it was written with.
///
/// # Errors
/// Returns the formatting error if the date cannot be rendered.
pub fn format_date(timestamp: &OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.format(format_description!("[year]-[month]-[day]"))
}

/// Parse a registry timestamp.
///
/// Accepts RFC 3339 (`2023-03-22T22:00:35.123Z`). Without an offset the value
/// is taken as UTC, and may drop its seconds (`2023-03-22T22:00`) or its time
/// entirely (`2023-03-22`, read as midnight).
///
/// # Errors
/// Returns the parse error of the date-only attempt when no form matches.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| PrimitiveDateTime::parse(raw, local).map(PrimitiveDateTime::assume_utc))
        .or_else(|_| {
            Date::parse(raw, format_description!("[year]-[month]-[day]"))
                .map(|date| date.midnight().assume_utc())
        })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "href": "https://api.dataforsyningen.dk/sogne/7003",
            "kode": "7003",
            "navn": "Trinitatis",
            "ændret": "2023-03-22T22:00:35.123Z",
            "geo_version": 4,
            "geo_ændret": "2021-11-04T10:15:00.000Z",
            "bbox": [12.5664, 55.6761, 12.5842, 55.6869],
            "visueltcenter": [12.5731, 55.6815]
        }"#;

        let parish: ParishRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parish.name, "Trinitatis");
        assert_eq!(parish.code, "7003");
        assert_eq!(parish.geo_version, Some(4));
        assert_eq!(parish.center(), Some((12.5731, 55.6815)));
        assert_eq!(parish.bbox(), Some([12.5664, 55.6761, 12.5842, 55.6869]));
        assert_eq!(format_date(&parish.changed.unwrap()).unwrap(), "2023-03-22");
        assert_eq!(format_date(&parish.geo_changed.unwrap()).unwrap(), "2021-11-04");
    }

    #[test]
    fn test_deserialize_sparse_record() {
        let parish: ParishRecord =
            serde_json::from_str(r#"{"navn": "Vor Frue", "kode": "7002"}"#).unwrap();

        assert_eq!(parish.visual_center, None);
        assert_eq!(parish.bounding_box, None);
        assert_eq!(parish.changed, None);
        assert_eq!(parish.geo_changed, None);
        assert_eq!(parish.geo_version, None);
    }

    #[test]
    fn test_null_geometry_fields() {
        let parish: ParishRecord = serde_json::from_str(
            r#"{"navn": "X", "kode": "1", "visueltcenter": null, "bbox": null, "ændret": null}"#,
        )
        .unwrap();

        assert_eq!(parish.center(), None);
        assert_eq!(parish.bbox(), None);
        assert_eq!(parish.changed, None);
    }

    #[test]
    fn test_center_requires_two_components() {
        let parish = ParishRecord {
            visual_center: Some(vec![12.0]),
            ..ParishRecord::default()
        };
        assert_eq!(parish.center(), None);

        let parish = ParishRecord {
            visual_center: Some(vec![12.0, 55.0, 99.0]),
            ..ParishRecord::default()
        };
        assert_eq!(parish.center(), Some((12.0, 55.0)));
    }

    #[test]
    fn test_bbox_requires_four_components() {
        let parish = ParishRecord {
            bounding_box: Some(vec![1.0, 2.0, 3.0]),
            ..ParishRecord::default()
        };
        assert_eq!(parish.bbox(), None);
    }

    #[test]
    fn test_timestamp_without_offset() {
        let ts = parse_timestamp("2018-04-30T13:30:11.287").unwrap();
        assert_eq!(format_date(&ts).unwrap(), "2018-04-30");

        let ts = parse_timestamp("2018-04-30T13:30:11").unwrap();
        assert_eq!(format_date(&ts).unwrap(), "2018-04-30");
    }

    #[test]
    fn test_timestamp_without_seconds_or_time() {
        let ts = parse_timestamp("2023-03-22T22:00").unwrap();
        assert_eq!(format_date(&ts).unwrap(), "2023-03-22");

        let ts = parse_timestamp("2023-03-22").unwrap();
        assert_eq!(ts.hour(), 0);
        assert_eq!(format_date(&ts).unwrap(), "2023-03-22");

        let json = r#"{
            "navn": "X",
            "kode": "1",
            "ændret": "2023-03-22",
            "geo_ændret": "2023-03-22T22:00"
        }"#;
        let parish: ParishRecord = serde_json::from_str(json).unwrap();
        assert_eq!(format_date(&parish.changed.unwrap()).unwrap(), "2023-03-22");
        assert_eq!(format_date(&parish.geo_changed.unwrap()).unwrap(), "2023-03-22");
    }

    #[test]
    fn test_format_date_pads_components() {
        let ts = parse_timestamp("0987-01-05T08:00:00Z").unwrap();
        assert_eq!(format_date(&ts).unwrap(), "0987-01-05");
    }

    #[test]
    fn test_timestamp_keeps_written_offset() {
        let ts = parse_timestamp("2020-01-01T00:30:00+01:00").unwrap();
        assert_eq!(format_date(&ts).unwrap(), "2020-01-01");
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let result: Result<ParishRecord, _> =
            serde_json::from_str(r#"{"navn": "X", "kode": "1", "ændret": "yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_code_in_record_is_rejected() {
        let result: Result<ParishRecord, _> =
            serde_json::from_str(r#"{"navn": "X", "kode": 7003}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_with_center() {
        let parish = ParishRecord {
            name: "Trinitatis".to_string(),
            code: "7003".to_string(),
            visual_center: Some(vec![12.57, 55.68]),
            ..ParishRecord::default()
        };
        assert_eq!(
            parish.to_string(),
            "Parish: Trinitatis (Code: 7003, Center: [12.5700, 55.6800])"
        );
    }

    #[test]
    fn test_display_without_center() {
        let parish = ParishRecord {
            name: "Vor Frue".to_string(),
            code: "7002".to_string(),
            ..ParishRecord::default()
        };
        assert_eq!(
            parish.to_string(),
            "Parish: Vor Frue (Code: 7002, Center: N/A)"
        );
    }
}
