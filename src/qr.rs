// Verification QR code for the first page header.

use ::image::{DynamicImage, Luma};
use chrono::NaiveDate;
use qrcode::QrCode;
use serde::Serialize;

use crate::canvas::RasterImage;
use crate::error::ReportError;
use crate::photo::flatten_on_white;

/// QR code data payload
#[derive(Debug, Serialize)]
struct QrPayload<'a> {
    app: &'a str,
    report_id: &'a str,
    vehicle: &'a str,
    date: String,
}

pub fn verification_qr(report_id: &str, vehicle: &str, date: NaiveDate) -> Result<RasterImage, ReportError> {
    let payload = QrPayload {
        app: "inspection-report",
        report_id,
        vehicle,
        date: date.format("%Y-%m-%d").to_string(),
    };

    let json = serde_json::to_string(&payload).map_err(|e| ReportError::QrError(e.to_string()))?;

    let code = QrCode::new(json.as_bytes()).map_err(|e| ReportError::QrError(e.to_string()))?;

    let image = code.render::<Luma<u8>>().build();
    Ok(flatten_on_white(&DynamicImage::ImageLuma8(image), false))
}
