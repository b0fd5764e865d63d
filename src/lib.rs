// inspection-report: paginated PDF reports for vehicle inspections

pub mod assembler;
pub mod canvas;
pub mod config;
pub mod email;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod photo;
pub mod qr;
pub mod record;
pub mod schema;
pub mod service;
pub mod storage;
pub mod style;

use std::time::Instant;

use log::info;

pub use assembler::{RenderedDocument, ReportAssembler, ReportMeta};
pub use config::{Branding, NotifyConfig, ReportConfig};
pub use error::{AssetError, BoundaryError, ReportError};
pub use record::{FieldValue, InspectionRecord, PLACEHOLDER};
pub use schema::SchemaVersion;
pub use service::{ReportReceipt, ReportRequest, ReportService};
pub use style::{Palette, ReportStyle, Rgb};

/// Lay out a report without serialising it.
pub fn render_report(
    record: &InspectionRecord,
    config: &ReportConfig,
    meta: &ReportMeta,
) -> Result<RenderedDocument, ReportError> {
    assembler::render(record, config, meta)
}

/// Generate the PDF bytes for one inspection. Either the whole document is returned
/// or an error; never a partial file.
pub fn generate_report(
    record: &InspectionRecord,
    config: &ReportConfig,
    meta: &ReportMeta,
) -> Result<Vec<u8>, ReportError> {
    let start = Instant::now();
    let document = render_report(record, config, meta)?;
    let bytes = pdf::write_pdf(&document)?;
    info!(
        "generated {} ({} pages, {} bytes) in {:?}",
        meta.report_id,
        document.page_count(),
        bytes.len(),
        start.elapsed()
    );
    Ok(bytes)
}
