// Report configuration. Every field has a default so a config file only needs the
// values it changes.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::schema::SchemaVersion;
use crate::style::ReportStyle;

/// Brand and contact details printed in the header and footer bands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub name: String,
    pub tagline: String,
    pub report_title: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub disclaimer: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "InspectionWale".to_string(),
            tagline: "Professional Vehicle Inspection Services".to_string(),
            report_title: "Vehicle Inspection Report".to_string(),
            email: "hello@inspectionwale.com".to_string(),
            phone: "9167558998".to_string(),
            website: "inspectionwale.com".to_string(),
            disclaimer: "Professional vehicle inspection report. Valid for 2 days or 20 km."
                .to_string(),
        }
    }
}

/// Who hears about a finished report. No recipients means no email.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub from: String,
    pub to: Vec<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from: "reports@inspectionwale.com".to_string(),
            to: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub style: ReportStyle,
    pub branding: Branding,
    /// When false, photo sections are left out entirely.
    pub include_images: bool,
    pub schema: SchemaVersion,
    pub grid_columns: usize,
    /// Put a verification QR code in the first page header.
    pub qr_code: bool,
    pub notify: NotifyConfig,
    /// Upper bound on generation time; `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            style: ReportStyle::default(),
            branding: Branding::default(),
            include_images: true,
            schema: SchemaVersion::Standard,
            grid_columns: 3,
            qr_code: false,
            notify: NotifyConfig::default(),
            timeout_secs: None,
        }
    }
}

impl ReportConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ReportError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ReportConfig = serde_json::from_str(&text).map_err(|e| {
            ReportError::ConfigError(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if !(1..=6).contains(&self.grid_columns) {
            return Err(ReportError::ConfigError(format!(
                "grid_columns must be between 1 and 6, got {}",
                self.grid_columns
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(ReportError::ConfigError(
                "timeout_secs must be positive".to_string(),
            ));
        }
        self.style.geometry.validate()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
