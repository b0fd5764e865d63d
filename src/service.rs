// Report service: record in, stored PDF plus metadata out.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, SecondsFormat};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::assembler::{render, ReportMeta};
use crate::config::ReportConfig;
use crate::email::{send_best_effort, EmailMessage, EmailSender};
use crate::error::{BoundaryError, ReportError};
use crate::pdf::write_pdf;
use crate::photo::{fetch_url, is_url};
use crate::record::InspectionRecord;
use crate::storage::{BlobStore, RecordStore};

pub const INSPECTIONS_COLLECTION: &str = "inspections";

/// One report request: the parsed record plus photo references by slot.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRequest {
    pub record: InspectionRecord,
    /// Slot to blob key or URL. `None` keeps the slot as a placeholder.
    pub photos: BTreeMap<String, Option<String>>,
    /// Fixed identity, e.g. for re-rendering. Generated when absent.
    pub meta: Option<ReportMeta>,
}

impl ReportRequest {
    /// Split a JSON request into fields and the `photos` reference map.
    pub fn from_json(mut value: Value) -> Result<Self, ReportError> {
        let object = value.as_object_mut().ok_or_else(|| {
            ReportError::InvalidRecord("inspection data must be a JSON object".to_string())
        })?;
        let photos = match object.remove("photos") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(slot, reference)| match reference {
                    Value::String(s) if !s.trim().is_empty() => Ok((slot, Some(s))),
                    Value::String(_) | Value::Null => Ok((slot, None)),
                    other => Err(ReportError::InvalidRecord(format!(
                        "photo '{}' must be a string reference, got {}",
                        slot, other
                    ))),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ReportError::InvalidRecord(
                    "'photos' must be an object of slot references".to_string(),
                ))
            }
        };
        Ok(Self {
            record: InspectionRecord::from_json(&value)?,
            photos,
            meta: None,
        })
    }

    /// Build from flat form fields. `photos.<slot>` keys are photo references, a blank
    /// value keeps the slot as a placeholder; every other key is a record field.
    pub fn from_form_fields<I, K, V>(pairs: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut fields = Vec::new();
        let mut photos = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value: String = value.into();
            match key.strip_prefix("photos.") {
                Some(slot) if !slot.is_empty() => {
                    let reference = (!value.trim().is_empty()).then(|| value.trim().to_string());
                    photos.insert(slot.to_string(), reference);
                }
                _ => fields.push((key.to_string(), value)),
            }
        }
        Ok(Self {
            record: InspectionRecord::from_form_fields(fields)?,
            photos,
            meta: None,
        })
    }
}

/// What the caller gets back once a report is stored.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportReceipt {
    pub report_id: String,
    pub vehicle_number: String,
    pub pdf_key: String,
    pub pdf_locator: String,
    pub page_count: usize,
    pub photo_count: usize,
    pub notified: bool,
}

/// Metadata row written to the record store.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub report_id: String,
    pub vehicle_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub inspector_name: Option<String>,
    pub generated_at: String,
    pub pdf_url: String,
    pub photo_count: usize,
    pub page_count: usize,
    pub status: String,
}

/// Keep letters, digits and dashes so a registration number is safe in a key.
fn key_segment(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_uppercase()
}

pub fn pdf_key(vehicle_number: &str, report_id: &str) -> String {
    format!("reports/{}_{}.pdf", key_segment(vehicle_number), report_id)
}

pub struct ReportService<'s> {
    config: ReportConfig,
    deadline: Option<Duration>,
    photos: &'s dyn BlobStore,
    reports: &'s dyn BlobStore,
    records: &'s dyn RecordStore,
    mailer: &'s dyn EmailSender,
}

impl<'s> ReportService<'s> {
    pub fn new(
        config: ReportConfig,
        photos: &'s dyn BlobStore,
        reports: &'s dyn BlobStore,
        records: &'s dyn RecordStore,
        mailer: &'s dyn EmailSender,
    ) -> Self {
        Self {
            config,
            deadline: None,
            photos,
            reports,
            records,
            mailer,
        }
    }

    /// Render deadline that takes precedence over `timeout_secs` in the config.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build, render, store and announce one report.
    pub fn submit(&self, request: ReportRequest) -> Result<ReportReceipt, ReportError> {
        let start = Instant::now();
        let mut record = request.record;
        record.validate()?;
        let vehicle_number = record.registration_number()?;

        if self.config.include_images {
            for (slot, reference) in &request.photos {
                let bytes = reference.as_deref().and_then(|r| self.load_photo(slot, r));
                record = record.with_photo(slot, bytes);
            }
        }

        let meta = request
            .meta
            .unwrap_or_else(|| ReportMeta::generate(Local::now().date_naive()));
        let (bytes, page_count) = self.render_with_deadline(&record, &meta)?;

        let key = pdf_key(&vehicle_number, &meta.report_id);
        let locator = self.reports.put(&key, &bytes, "application/pdf")?;

        let metadata = ReportMetadata {
            report_id: meta.report_id.clone(),
            vehicle_number: vehicle_number.clone(),
            make: record.text("make"),
            model: record.text("model"),
            inspector_name: record.text("inspectorName"),
            generated_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            pdf_url: locator.clone(),
            photo_count: record.photo_count(),
            page_count,
            status: "completed".to_string(),
        };
        let metadata = serde_json::to_value(&metadata).map_err(BoundaryError::from)?;
        self.records
            .put(INSPECTIONS_COLLECTION, &meta.report_id, &metadata)?;

        let notified = self.notify(&record, &meta, &vehicle_number, &locator);

        info!(
            "report {} for {} stored at {} in {:?}",
            meta.report_id,
            vehicle_number,
            locator,
            start.elapsed()
        );
        Ok(ReportReceipt {
            report_id: meta.report_id,
            vehicle_number,
            pdf_key: key,
            pdf_locator: locator,
            page_count,
            photo_count: record.photo_count(),
            notified,
        })
    }

    /// Fetch one photo. Any failure leaves the slot empty so it renders as a placeholder.
    fn load_photo(&self, slot: &str, reference: &str) -> Option<Vec<u8>> {
        let result = if is_url(reference) {
            fetch_url(reference).map_err(|e| e.to_string())
        } else {
            self.photos.get(reference).map_err(|e| e.to_string())
        };
        match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("photo '{}' unavailable ({}): {}", slot, reference, e);
                None
            }
        }
    }

    /// Render on a worker thread when a deadline is set, in place otherwise.
    fn render_with_deadline(
        &self,
        record: &InspectionRecord,
        meta: &ReportMeta,
    ) -> Result<(Vec<u8>, usize), ReportError> {
        let Some(deadline) = self.deadline.or_else(|| self.config.timeout()) else {
            return render_pdf(record, &self.config, meta);
        };
        let record = record.clone();
        let config = self.config.clone();
        let meta = meta.clone();
        run_with_deadline(deadline, move || render_pdf(&record, &config, &meta))
    }

    fn notify(&self, record: &InspectionRecord, meta: &ReportMeta, vehicle: &str, locator: &str) -> bool {
        let notify = &self.config.notify;
        if notify.to.is_empty() {
            return false;
        }
        let vehicle_name = [record.text("make"), record.text("model")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let message = EmailMessage {
            from: notify.from.clone(),
            to: notify.to.clone(),
            subject: format!("Inspection report {} ({})", vehicle, meta.report_id),
            html_body: Some(format!(
                "<p>The inspection report for <strong>{}</strong> {} is ready.</p><p><a href=\"{}\">Download report</a></p>",
                vehicle, vehicle_name, locator
            )),
            text_body: Some(format!(
                "The inspection report for {} {} is ready: {}",
                vehicle, vehicle_name, locator
            )),
        };
        send_best_effort(self.mailer, &message)
    }
}

/// Run `job` on a worker thread and wait at most `deadline` for its result.
///
/// Threads cannot be cancelled, so a job that overruns is abandoned: it keeps running
/// to completion and its result is dropped when the channel is gone.
pub fn run_with_deadline<T, F>(deadline: Duration, job: F) -> Result<T, ReportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ReportError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("report-render".to_string())
        .spawn(move || {
            let _ = tx.send(job());
        })
        .map_err(|e| ReportError::WorkerError(format!("cannot start render thread: {}", e)))?;

    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!("render exceeded {:?}, abandoning worker", deadline);
            Err(ReportError::Timeout(deadline))
        }
        Err(RecvTimeoutError::Disconnected) => Err(ReportError::WorkerError(
            "render thread exited without a result".to_string(),
        )),
    }
}

fn render_pdf(
    record: &InspectionRecord,
    config: &ReportConfig,
    meta: &ReportMeta,
) -> Result<(Vec<u8>, usize), ReportError> {
    let document = render(record, config, meta)?;
    let bytes = write_pdf(&document)?;
    Ok((bytes, document.page_count()))
}
