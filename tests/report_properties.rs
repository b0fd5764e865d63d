use std::io::Cursor;

use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use inspection_report::canvas::DrawOp;
use inspection_report::layout::grid::{CAPTION_HEIGHT, CELL_IMAGE_HEIGHT, NO_IMAGE};
use inspection_report::{
    generate_report, render_report, InspectionRecord, RenderedDocument, ReportConfig, ReportMeta,
    ReportStyle, SchemaVersion, PLACEHOLDER,
};

fn meta() -> ReportMeta {
    ReportMeta::new(
        "INS-20261019-ABCDEF12",
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
    )
}

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(80, 60, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn checks(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{} check {}", prefix, i)).collect()
}

/// Maruti Brezza, owner email left blank.
fn brezza() -> InspectionRecord {
    InspectionRecord::new()
        .with_field("registrationNumber", "MH04KD2255")
        .with_field("make", "Maruti")
        .with_field("model", "Brezza")
        .with_field("manufactureYear", 2019.0)
        .with_field("fuelType", "Petrol")
        .with_field("odometerReading", 45320.0)
        .with_field("ownerName", "Rahul Sharma")
        .with_field("ownerContact", "9876543210")
        .with_field("inspectorName", "Amit Patil")
}

/// Enough content to run over several pages.
fn full_record() -> InspectionRecord {
    let notes = "Paint depth within factory range on all panels except the left rear door. \
                 Minor scratches on the rear bumper and a small dent near the fuel lid. "
        .repeat(3);
    brezza()
        .with_field("accidental", "No")
        .with_field("floodDamage", "No")
        .with_field("fireDamage", "No")
        .with_field("highlights", "Single owner, full service history, original paint on most panels.")
        .with_field("exteriorChecks", checks("Exterior", 20))
        .with_field("exteriorNotes", notes.clone())
        .with_field("interiorChecks", checks("Interior", 14))
        .with_field("interiorNotes", notes.clone())
        .with_field("engineChecks", checks("Engine", 18))
        .with_field("engineNotes", notes.clone())
        .with_field("tiresChecks", checks("Tire", 6))
        .with_field("structureChecks", checks("Structure", 11))
        .with_field("structureNotes", notes)
        .with_field("testDrive", "Yes")
        .with_field("testDriveNotes", "Smooth gear shifts, slight pull to the left under braking.")
        .with_field("issuesFound", "Left rear door repainted.")
        .with_field("recommendations", "Wheel alignment at next service.")
        .with_field("overallRating", "Good")
        .with_field("marketValue", "₹5,40,000")
        .with_photo("frontBumper", Some(png([200, 40, 40])))
        .with_photo("bonnet", None)
        .with_photo("dashboard", Some(b"not an image".to_vec()))
        .with_photo("rcBook", Some(png([40, 40, 200])))
}

/// Lowest point an op reaches, ignoring full-page backgrounds.
fn op_bottom(op: &DrawOp, page_height: f32) -> Option<f32> {
    match op {
        DrawOp::Text { y, .. } => Some(*y),
        DrawOp::Rect { height, .. } if *height >= page_height - 1.0 => None,
        DrawOp::Rect { y, height, .. } => Some(y + height),
        DrawOp::Line { from, to, .. } => Some(from.1.max(to.1)),
        DrawOp::Polygon { points, .. } | DrawOp::Path { points, .. } => {
            points.iter().map(|p| p.1).reduce(f32::max)
        }
        DrawOp::Image { y, height, .. } => Some(y + height),
    }
}

fn assert_content_above_footer(doc: &RenderedDocument) {
    let g = doc.geometry();
    for (i, page) in doc.pages().iter().enumerate() {
        for op in &page.content.ops {
            if let Some(bottom) = op_bottom(op, g.height) {
                assert!(
                    bottom <= g.content_bottom() + 0.5,
                    "page {} op reaches {} below content bottom {}: {:?}",
                    i + 1,
                    bottom,
                    g.content_bottom(),
                    op
                );
            }
        }
    }
}

#[test]
fn missing_values_print_the_placeholder() {
    let doc = render_report(&brezza(), &ReportConfig::default(), &meta()).unwrap();
    let owner_page = doc
        .pages()
        .iter()
        .find(|p| p.contains_text("Email Address"))
        .expect("owner section drawn");
    assert!(owner_page.texts().any(|t| t == PLACEHOLDER));
    assert!(doc.contains_text("Rahul Sharma"));
    assert!(doc.contains_text("Maruti Brezza"));
    assert!(doc.contains_text("45320 km"));
}

#[test]
fn content_never_enters_the_footer_band() {
    for style in ["classic", "vibrant"] {
        let config = ReportConfig {
            style: ReportStyle::preset(style).unwrap(),
            schema: SchemaVersion::Extended,
            ..ReportConfig::default()
        };
        let doc = render_report(&full_record(), &config, &meta()).unwrap();
        assert!(doc.page_count() >= 3, "{} pages", doc.page_count());
        assert_content_above_footer(&doc);
    }
}

#[test]
fn photo_grid_rows_stay_whole() {
    let mut record = brezza();
    for i in 1..=18 {
        record = record.with_photo(&format!("extraPhoto{:02}", i), None);
    }
    let doc = render_report(&record, &ReportConfig::default(), &meta()).unwrap();
    assert!(doc.contains_text("Additional Photos"));

    let placeholders: usize = doc
        .pages()
        .iter()
        .map(|p| p.texts().filter(|t| *t == NO_IMAGE).count())
        .sum();
    assert_eq!(placeholders, 18);

    let bottom = doc.geometry().content_bottom();
    let mut rows = 0;
    for page in doc.pages() {
        let mut tops: Vec<f32> = page
            .content
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { y, height, .. } if *height == CELL_IMAGE_HEIGHT => Some(*y),
                _ => None,
            })
            .collect();
        tops.dedup();
        for top in &tops {
            assert!(top + CELL_IMAGE_HEIGHT + CAPTION_HEIGHT <= bottom + 0.5);
        }
        rows += tops.len();
    }
    assert_eq!(rows, 6);
}

#[test]
fn every_footer_carries_the_final_page_count() {
    let doc = render_report(&full_record(), &ReportConfig::default(), &meta()).unwrap();
    let total = doc.page_count();
    for (i, page) in doc.pages().iter().enumerate() {
        assert_eq!(page.stamp.page_number, i + 1);
        assert_eq!(page.stamp.total_pages, total);
        assert!(page.footer.contains_text(&format!("Page {} of {}", i + 1, total)));
        assert!(page.footer.contains_text("Email: hello@inspectionwale.com"));
    }
    assert!(doc.pages()[0].contains_text("Vehicle Inspection Report"));
    for page in &doc.pages()[1..] {
        assert!(page.contains_text("Report INS-20261019-ABCDEF12"));
    }
}

#[test]
fn sections_without_data_are_left_out() {
    let config = ReportConfig::default();
    let doc = render_report(&brezza(), &config, &meta()).unwrap();
    for title in [
        "Key Highlights",
        "Overall Ratings",
        "Document Photos",
        "Exterior / Body Inspection",
        "Interior Inspection",
        "Engine & Mechanical Inspection",
        "Tires & Wheels Inspection",
        "Structure & Undercarriage",
        "Additional Photos",
        "Test Drive Assessment",
        "Issues & Recommendations",
        "Overall Condition",
    ] {
        assert!(!doc.contains_text(title), "'{}' should be suppressed", title);
    }
    for title in [
        "Vehicle Registration Details",
        "Current Owner Details",
        "Inspection Details",
    ] {
        assert!(doc.contains_text(title), "'{}' is always drawn", title);
    }

    let doc = render_report(
        &brezza().with_field("interiorNotes", "Seats clean."),
        &config,
        &meta(),
    )
    .unwrap();
    assert!(doc.contains_text("Interior Inspection"));
    assert!(doc.contains_text("Seats clean."));
    assert!(!doc.contains_text("Exterior / Body Inspection"));
}

#[test]
fn declared_area_slots_render_as_placeholders_once_the_area_is_drawn() {
    let record = brezza().with_photo("frontBumper", Some(png([10, 120, 10])));
    let doc = render_report(&record, &ReportConfig::default(), &meta()).unwrap();
    assert!(doc.contains_text("Exterior / Body Inspection"));
    assert!(doc.contains_text("Front Bumper"));
    assert!(doc.contains_text("Roof"));
    let placeholders: usize = doc
        .pages()
        .iter()
        .map(|p| p.texts().filter(|t| *t == NO_IMAGE).count())
        .sum();
    assert_eq!(placeholders, 9);
    assert_eq!(doc.images().len(), 1);
}

#[test]
fn same_input_gives_the_same_document() {
    let config = ReportConfig {
        qr_code: true,
        ..ReportConfig::default()
    };
    let first = render_report(&full_record(), &config, &meta()).unwrap();
    let second = render_report(&full_record(), &config, &meta()).unwrap();
    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(first.text_content(), second.text_content());
    assert_eq!(first.pages(), second.pages());
}

#[test]
fn rupee_values_are_printable() {
    let doc = render_report(&full_record(), &ReportConfig::default(), &meta()).unwrap();
    assert!(doc.contains_text("Rs.5,40,000"));
    assert!(!doc.text_content().iter().flatten().any(|t| t.contains('\u{20b9}')));
}

#[test]
fn generated_bytes_are_a_pdf() {
    let config = ReportConfig {
        qr_code: true,
        schema: SchemaVersion::Extended,
        ..ReportConfig::default()
    };
    let bytes = generate_report(&full_record(), &config, &meta()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 1000);
}

#[test]
fn missing_registration_number_produces_nothing() {
    let record = InspectionRecord::new().with_field("make", "Maruti");
    let err = generate_report(&record, &ReportConfig::default(), &meta()).unwrap_err();
    assert!(err.to_string().contains("registrationNumber"));
}
