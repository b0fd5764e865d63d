use std::io::Cursor;
use std::time::Duration;

use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;

use inspection_report::email::MemoryOutbox;
use inspection_report::storage::{BlobStore, MemoryBlobStore, MemoryRecordStore, RecordStore};
use inspection_report::{NotifyConfig, ReportConfig, ReportError, ReportMeta, ReportRequest, ReportService};

const REPORT_ID: &str = "INS-20261019-ABCDEF12";

fn meta() -> ReportMeta {
    ReportMeta::new(REPORT_ID, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
}

fn jpeg() -> Vec<u8> {
    let img = RgbImage::from_pixel(40, 30, Rgb([90, 90, 160]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Large enough that decoding and downscaling takes real time.
fn large_png(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(2400, 1800, |x, y| Rgb([(x % 251) as u8, (y % 241) as u8, seed]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn request(value: serde_json::Value) -> ReportRequest {
    let mut request = ReportRequest::from_json(value).unwrap();
    request.meta = Some(meta());
    request
}

fn brezza() -> serde_json::Value {
    json!({
        "registrationNumber": "MH04KD2255",
        "make": "Maruti",
        "model": "Brezza",
        "inspectorName": "Amit Patil",
        "exteriorChecks": ["Paint good", "No dents"],
        "photos": {
            "frontBumper": "uploads/front.jpg",
            "bonnet": "uploads/missing.jpg",
            "rcBook": "uploads/rc.jpg"
        }
    })
}

struct Stores {
    photos: MemoryBlobStore,
    reports: MemoryBlobStore,
    records: MemoryRecordStore,
}

fn stores() -> Stores {
    let photos = MemoryBlobStore::new();
    photos.insert("uploads/front.jpg", jpeg());
    photos.insert("uploads/rc.jpg", jpeg());
    Stores {
        photos,
        reports: MemoryBlobStore::new(),
        records: MemoryRecordStore::new(),
    }
}

#[test]
fn stores_pdf_and_metadata() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let service = ReportService::new(ReportConfig::default(), &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service.submit(request(brezza())).unwrap();

    assert_eq!(receipt.report_id, REPORT_ID);
    assert_eq!(receipt.vehicle_number, "MH04KD2255");
    assert_eq!(receipt.pdf_key, "reports/MH04KD2255_INS-20261019-ABCDEF12.pdf");
    assert_eq!(receipt.pdf_locator, "memory://reports/MH04KD2255_INS-20261019-ABCDEF12.pdf");
    assert_eq!(receipt.photo_count, 2);
    assert!(receipt.page_count >= 1);
    assert!(!receipt.notified);

    let pdf = s.reports.get(&receipt.pdf_key).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(s.reports.content_type(&receipt.pdf_key).unwrap(), "application/pdf");

    let record = s.records.get("inspections", REPORT_ID).unwrap();
    assert_eq!(record["reportId"], REPORT_ID);
    assert_eq!(record["vehicleNumber"], "MH04KD2255");
    assert_eq!(record["make"], "Maruti");
    assert_eq!(record["model"], "Brezza");
    assert_eq!(record["inspectorName"], "Amit Patil");
    assert_eq!(record["pdfUrl"], receipt.pdf_locator.as_str());
    assert_eq!(record["photoCount"], 2);
    assert_eq!(record["pageCount"], receipt.page_count);
    assert_eq!(record["status"], "completed");
    assert!(record["generatedAt"].as_str().unwrap().contains('T'));
}

#[test]
fn unreadable_photo_does_not_fail_the_report() {
    let s = stores();
    s.photos.insert("uploads/front.jpg", b"truncated".to_vec());
    let outbox = MemoryOutbox::new();
    let service = ReportService::new(ReportConfig::default(), &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service.submit(request(brezza())).unwrap();
    assert_eq!(s.reports.keys(), vec![receipt.pdf_key.clone()]);
    assert_eq!(s.records.len(), 1);
}

#[test]
fn notification_failure_is_not_fatal() {
    let s = stores();
    let outbox = MemoryOutbox::failing();
    let config = ReportConfig {
        notify: NotifyConfig {
            to: vec!["ops@inspectionwale.com".to_string()],
            ..NotifyConfig::default()
        },
        ..ReportConfig::default()
    };
    let service = ReportService::new(config, &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service.submit(request(brezza())).unwrap();
    assert!(!receipt.notified);
    assert!(s.reports.get(&receipt.pdf_key).is_ok());
    assert!(outbox.sent().is_empty());
}

#[test]
fn recipients_are_notified_with_the_locator() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let config = ReportConfig {
        notify: NotifyConfig {
            to: vec!["ops@inspectionwale.com".to_string()],
            ..NotifyConfig::default()
        },
        ..ReportConfig::default()
    };
    let service = ReportService::new(config, &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service.submit(request(brezza())).unwrap();
    assert!(receipt.notified);
    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("MH04KD2255"));
    assert!(sent[0].text_body.as_deref().unwrap().contains(&receipt.pdf_locator));
}

#[test]
fn missing_registration_number_stores_nothing() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let service = ReportService::new(ReportConfig::default(), &s.photos, &s.reports, &s.records, &outbox);

    let err = service
        .submit(request(json!({"make": "Maruti", "model": "Brezza"})))
        .unwrap_err();
    assert!(matches!(err, ReportError::MissingField(ref f) if f == "registrationNumber"));
    assert!(s.reports.keys().is_empty());
    assert!(s.records.is_empty());
}

#[test]
fn images_off_skips_photo_loading() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let config = ReportConfig {
        include_images: false,
        ..ReportConfig::default()
    };
    let service = ReportService::new(config, &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service.submit(request(brezza())).unwrap();
    assert_eq!(receipt.photo_count, 0);
}

#[test]
fn generous_deadline_still_renders() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let config = ReportConfig {
        timeout_secs: Some(60),
        ..ReportConfig::default()
    };
    let service = ReportService::new(config, &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service.submit(request(brezza())).unwrap();
    assert!(s.reports.get(&receipt.pdf_key).unwrap().starts_with(b"%PDF"));
}

#[test]
fn generated_ids_are_used_when_none_is_given() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let service = ReportService::new(ReportConfig::default(), &s.photos, &s.reports, &s.records, &outbox);

    let receipt = service
        .submit(ReportRequest::from_json(brezza()).unwrap())
        .unwrap();
    assert!(receipt.report_id.starts_with("INS-"));
    assert!(s.records.get("inspections", &receipt.report_id).is_ok());
}

#[test]
fn overrunning_render_times_out_and_stores_nothing() {
    let s = stores();
    let slots = ["frontBumper", "bonnet", "grille", "frontLeft", "frontRight", "leftSide"];
    let mut photos = serde_json::Map::new();
    for (i, slot) in slots.iter().enumerate() {
        let key = format!("uploads/{}.png", slot);
        s.photos.insert(&key, large_png(i as u8));
        photos.insert(slot.to_string(), json!(key));
    }
    let outbox = MemoryOutbox::new();
    let service = ReportService::new(ReportConfig::default(), &s.photos, &s.reports, &s.records, &outbox)
        .with_deadline(Duration::ZERO);

    let err = service
        .submit(request(json!({
            "registrationNumber": "MH04KD2255",
            "photos": photos,
        })))
        .unwrap_err();
    assert!(matches!(err, ReportError::Timeout(d) if d == Duration::ZERO));
    assert!(s.reports.keys().is_empty());
    assert!(s.records.is_empty());
    assert!(outbox.sent().is_empty());
}

#[test]
fn form_field_requests_are_rendered() {
    let s = stores();
    let outbox = MemoryOutbox::new();
    let service = ReportService::new(ReportConfig::default(), &s.photos, &s.reports, &s.records, &outbox);

    let mut request = ReportRequest::from_form_fields(vec![
        ("registrationNumber", "MH04KD2255"),
        ("make", "Maruti"),
        ("exteriorChecks[0]", "Paint good"),
        ("photos.frontBumper", "uploads/front.jpg"),
    ])
    .unwrap();
    request.meta = Some(meta());
    let receipt = service.submit(request).unwrap();
    assert_eq!(receipt.photo_count, 1);
    let record = s.records.get("inspections", REPORT_ID).unwrap();
    assert_eq!(record["make"], "Maruti");
}
