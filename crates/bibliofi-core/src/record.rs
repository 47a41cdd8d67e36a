//! # Record
//!
//! The validated dataset entity: one row of the `wifi-library` open dataset
//! (a library building offering public Wi-Fi, with coverage and location
//! metadata).
//!
//! ## Invariants
//!
//! - A `Record` can only be obtained through [`Record::new`] (or serde
//!   deserialization, which funnels into the same constructor), so every
//!   observable instance has passed the full rule set.
//! - Records are immutable: fields are private and exposed through read
//!   accessors only.
//! - Constraints are checked in a fixed order and the first offending wire
//!   field is named in the [`ValidationError`].

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Wire names of the sixteen fields, in canonical column order.
///
/// Index positions in this array are the token positions of the delimited
/// text format and the object keys of the JSON format.
pub const WIRE_NAMES: [&str; 16] = [
    "ID",
    "LibraryName",
    "AdmArea",
    "District",
    "Address",
    "NumberOfAccessPoints",
    "WiFiName",
    "CoverageArea",
    "FunctionFlag",
    "AccessFlag",
    "Password",
    "Latitude_WGS84",
    "Longitude_WGS84",
    "global_id",
    "geodata_center",
    "geoarea",
];

// =============================================================================
// RECORD
// =============================================================================

/// One validated row of the dataset.
///
/// Field order matches the canonical column order; serialization uses the
/// upstream wire names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "LibraryName")]
    library_name: String,
    #[serde(rename = "AdmArea")]
    adm_area: String,
    #[serde(rename = "District")]
    district: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "NumberOfAccessPoints")]
    number_of_access_points: i64,
    #[serde(rename = "WiFiName")]
    wifi_name: String,
    #[serde(rename = "CoverageArea")]
    coverage_area: f64,
    #[serde(rename = "FunctionFlag")]
    function_flag: String,
    #[serde(rename = "AccessFlag")]
    access_flag: String,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "Latitude_WGS84")]
    latitude: f64,
    #[serde(rename = "Longitude_WGS84")]
    longitude: f64,
    #[serde(rename = "global_id")]
    global_id: f64,
    #[serde(rename = "geodata_center")]
    geodata_center: String,
    #[serde(rename = "geoarea")]
    geoarea: String,
}

impl Record {
    /// Construct a record, validating every constraint.
    ///
    /// Checks run in fixed order: id, access-point count, coverage area,
    /// latitude, longitude, global id. Text fields are non-null by
    /// construction in Rust; empty strings are allowed. All-or-nothing:
    /// on error no record exists.
    pub fn new(
        id: i64,
        library_name: String,
        adm_area: String,
        district: String,
        address: String,
        number_of_access_points: i64,
        wifi_name: String,
        coverage_area: f64,
        function_flag: String,
        access_flag: String,
        password: String,
        latitude: f64,
        longitude: f64,
        global_id: f64,
        geodata_center: String,
        geoarea: String,
    ) -> Result<Self, ValidationError> {
        if id < 0 {
            return Err(ValidationError::Negative(WIRE_NAMES[0]));
        }
        if number_of_access_points < 0 {
            return Err(ValidationError::Negative(WIRE_NAMES[5]));
        }
        // NaN fails the comparison and is rejected with the same error.
        if coverage_area.is_nan() || coverage_area < 0.0 {
            return Err(ValidationError::Negative(WIRE_NAMES[7]));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::OutOfRange {
                field: WIRE_NAMES[11],
                min: -90.0,
                max: 90.0,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::OutOfRange {
                field: WIRE_NAMES[12],
                min: -180.0,
                max: 180.0,
            });
        }
        if global_id.is_nan() || global_id < 0.0 {
            return Err(ValidationError::Negative(WIRE_NAMES[13]));
        }

        Ok(Self {
            id,
            library_name,
            adm_area,
            district,
            address,
            number_of_access_points,
            wifi_name,
            coverage_area,
            function_flag,
            access_flag,
            password,
            latitude,
            longitude,
            global_id,
            geodata_center,
            geoarea,
        })
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    #[must_use]
    pub fn adm_area(&self) -> &str {
        &self.adm_area
    }

    #[must_use]
    pub fn district(&self) -> &str {
        &self.district
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn number_of_access_points(&self) -> i64 {
        self.number_of_access_points
    }

    #[must_use]
    pub fn wifi_name(&self) -> &str {
        &self.wifi_name
    }

    #[must_use]
    pub fn coverage_area(&self) -> f64 {
        self.coverage_area
    }

    #[must_use]
    pub fn function_flag(&self) -> &str {
        &self.function_flag
    }

    #[must_use]
    pub fn access_flag(&self) -> &str {
        &self.access_flag
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn global_id(&self) -> f64 {
        self.global_id
    }

    #[must_use]
    pub fn geodata_center(&self) -> &str {
        &self.geodata_center
    }

    #[must_use]
    pub fn geoarea(&self) -> &str {
        &self.geoarea
    }
}

// =============================================================================
// RAW RECORD (deserialization door)
// =============================================================================

/// The unvalidated wire shape of a record.
///
/// Deserialization lands here first; [`Record::try_from`] then runs the full
/// constructor so serde input cannot bypass validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "LibraryName")]
    pub library_name: String,
    #[serde(rename = "AdmArea")]
    pub adm_area: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "NumberOfAccessPoints")]
    pub number_of_access_points: i64,
    #[serde(rename = "WiFiName")]
    pub wifi_name: String,
    #[serde(rename = "CoverageArea")]
    pub coverage_area: f64,
    #[serde(rename = "FunctionFlag")]
    pub function_flag: String,
    #[serde(rename = "AccessFlag")]
    pub access_flag: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Latitude_WGS84")]
    pub latitude: f64,
    #[serde(rename = "Longitude_WGS84")]
    pub longitude: f64,
    #[serde(rename = "global_id")]
    pub global_id: f64,
    #[serde(rename = "geodata_center")]
    pub geodata_center: String,
    #[serde(rename = "geoarea")]
    pub geoarea: String,
}

impl TryFrom<RawRecord> for Record {
    type Error = ValidationError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Self::new(
            raw.id,
            raw.library_name,
            raw.adm_area,
            raw.district,
            raw.address,
            raw.number_of_access_points,
            raw.wifi_name,
            raw.coverage_area,
            raw.function_flag,
            raw.access_flag,
            raw.password,
            raw.latitude,
            raw.longitude,
            raw.global_id,
            raw.geodata_center,
            raw.geoarea,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
