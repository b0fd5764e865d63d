// Document assembler: fixed section order, section suppression, footer stamping.

use chrono::NaiveDate;
use log::{debug, info};
use uuid::Uuid;

use crate::canvas::RasterImage;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::layout::checklist::{draw_checklist, draw_rating, first_band_height, RATING_ROW_HEIGHT};
use crate::layout::frame::{format_report_date, FinishedPage, PageFrame};
use crate::layout::grid::{draw_image_grid, row_height, GridItem};
use crate::layout::section::{
    draw_rows, draw_section, draw_title_bar, measure_rows_box, OpenBox, Row, SectionBody,
    BOX_PADDING, SECTION_SPACING, TITLE_BAR_GAP, TITLE_BAR_HEIGHT,
};
use crate::layout::text::{
    draw_badge, draw_flowing_text, full_width_column, measure_flowing_text, TextBlock, BADGE_HEIGHT,
};
use crate::layout::LayoutContext;
use crate::metrics::Font;
use crate::qr::verification_qr;
use crate::record::InspectionRecord;
use crate::schema::{humanize_slot, Area, AreaSpec, FieldSchema, PhotoSlot, RowSpec};
use crate::style::{PageGeometry, Palette, ReportStyle, Rgb};

const BANNER_HEIGHT: f32 = 46.0;

/// Identity of one generated report. Supplied by the caller so identical input
/// renders identically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportMeta {
    pub report_id: String,
    pub date: NaiveDate,
}

impl ReportMeta {
    pub fn new(report_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            report_id: report_id.into(),
            date,
        }
    }

    /// Fresh id of the form `INS-YYYYMMDD-XXXXXXXX`.
    pub fn generate(date: NaiveDate) -> Self {
        Self::new(
            format!("INS-{}-{}", date.format("%Y%m%d"), generate_short_id()),
            date,
        )
    }
}

fn generate_short_id() -> String {
    let uuid = Uuid::new_v4();
    let hex = format!("{:x}", uuid);
    hex[..8].to_uppercase()
}

// ============================================================================
// Rendered document
// ============================================================================

/// Sealed output of layout: pages with footers, plus the images they reference.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    title: String,
    geometry: PageGeometry,
    pages: Vec<FinishedPage>,
    images: Vec<RasterImage>,
}

impl RenderedDocument {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn pages(&self) -> &[FinishedPage] {
        &self.pages
    }

    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of every page, in drawing order.
    pub fn text_content(&self) -> Vec<Vec<String>> {
        self.pages
            .iter()
            .map(|page| page.texts().map(str::to_string).collect())
            .collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|page| page.contains_text(needle))
    }
}

// ============================================================================
// Assembler
// ============================================================================

pub struct ReportAssembler<'c> {
    config: &'c ReportConfig,
    schema: FieldSchema,
}

impl<'c> ReportAssembler<'c> {
    pub fn new(config: &'c ReportConfig) -> Self {
        Self {
            config,
            schema: FieldSchema::for_version(config.schema),
        }
    }

    /// Lay out the whole report. Fails before drawing anything when the record
    /// cannot produce a report.
    pub fn assemble(
        &self,
        record: &InspectionRecord,
        meta: &ReportMeta,
    ) -> Result<RenderedDocument, ReportError> {
        self.config.validate()?;
        let vehicle = record.registration_number()?;
        let style = &self.config.style;

        let qr = if self.config.qr_code {
            Some(verification_qr(&meta.report_id, &vehicle, meta.date)?)
        } else {
            None
        };
        let frame = PageFrame::new(self.config.branding.clone(), &meta.report_id, meta.date, &vehicle);

        // Accumulating
        let mut ctx = LayoutContext::new(style, &frame, qr);
        self.registration(&mut ctx, record);
        self.owner(&mut ctx, record);
        self.inspector(&mut ctx, record, meta);
        self.key_highlights(&mut ctx, record);
        self.ratings(&mut ctx, record);
        if self.config.include_images {
            self.document_photos(&mut ctx, record);
        }
        for spec in &self.schema.areas {
            self.area(&mut ctx, record, spec);
        }
        if self.config.include_images {
            self.additional_photos(&mut ctx, record);
        }
        self.test_drive(&mut ctx, record);
        self.issues(&mut ctx, record);
        self.overall(&mut ctx, record);
        let surface = ctx.finish();

        // Finalizing
        debug!("stamping footers on {} pages", surface.pages.len());
        let pages = frame.stamp_footers(style, surface.pages);

        // Sealed
        info!(
            "laid out report {} for {}: {} pages, {} images",
            meta.report_id,
            vehicle,
            pages.len(),
            surface.images.len()
        );
        Ok(RenderedDocument {
            title: format!("{} - {}", self.config.branding.report_title, vehicle),
            geometry: style.geometry.clone(),
            pages,
            images: surface.images,
        })
    }

    fn rows(&self, record: &InspectionRecord, specs: &[RowSpec]) -> Vec<Row> {
        specs
            .iter()
            .map(|spec| Row::new(spec.label, record.resolve(&spec.source)))
            .collect()
    }

    /// Title bar kept on the same page as the section's first block of `first_block` height.
    fn open_section(&self, ctx: &mut LayoutContext, title: &str, first_block: f32) {
        ctx.ensure_space(TITLE_BAR_HEIGHT + TITLE_BAR_GAP + first_block);
        draw_title_bar(ctx, title);
    }

    fn registration(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let left = self.rows(record, &self.schema.registration_left);
        let right = self.rows(record, &self.schema.registration_right);
        draw_section(ctx, "Vehicle Registration Details", SectionBody::Split(&left, &right));
    }

    fn owner(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let left = self.rows(record, &self.schema.owner_left);
        let right = self.rows(record, &self.schema.owner_right);
        draw_section(ctx, "Current Owner Details", SectionBody::Split(&left, &right));
    }

    fn inspector(&self, ctx: &mut LayoutContext, record: &InspectionRecord, meta: &ReportMeta) {
        let mut rows = self.rows(record, &self.schema.inspector);
        rows.push(Row::new("Inspection Date", Some(format_report_date(meta.date))));
        draw_section(ctx, "Inspection Details", SectionBody::Single(&rows));
    }

    fn key_highlights(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        const FLAGS: [(&str, &str); 3] = [
            ("Accident", "accidental"),
            ("Flood", "floodDamage"),
            ("Fire", "fireDamage"),
        ];
        let flags: Vec<(&str, Option<String>)> =
            FLAGS.iter().map(|(label, key)| (*label, record.text(key))).collect();
        let any_flag = flags.iter().any(|(_, v)| v.is_some());
        let highlights = record.text("highlights");
        if !any_flag && highlights.is_none() {
            debug!("skipping key highlights: no data");
            return;
        }

        let p = &ctx.style().palette;
        let t = &ctx.style().type_scale;
        let block = TextBlock::card(p);
        let column = full_width_column(ctx.style());
        let first_block = if any_flag {
            BANNER_HEIGHT
        } else {
            text_height(ctx.style(), &block, highlights.as_deref(), column)
        };
        self.open_section(ctx, "Key Highlights", first_block);

        if any_flag {
            let clean = flags
                .iter()
                .all(|(_, v)| v.as_deref().is_some_and(|v| v.eq_ignore_ascii_case("no")));
            let (fill, headline) = if clean {
                (p.success, "No accident, flood or fire damage reported")
            } else {
                (p.danger, "Damage reported, see inspection details")
            };
            let summary = flags
                .iter()
                .map(|(label, v)| format!("{}: {}", label, v.as_deref().unwrap_or("N/A")))
                .collect::<Vec<_>>()
                .join("   |   ");

            let top = ctx.ensure_space(BANNER_HEIGHT);
            let left = ctx.cursor().left();
            let width = ctx.cursor().width();
            let page = ctx.page();
            page.fill_rect(left, top, width, BANNER_HEIGHT, fill);
            page.text(left + BOX_PADDING, top + 19.0, headline, Font::Bold, t.value, Rgb::WHITE);
            page.text(left + BOX_PADDING, top + 35.0, &summary, Font::Regular, t.small, Rgb::WHITE);
            ctx.advance(BANNER_HEIGHT + BOX_PADDING);
        }

        draw_flowing_text(ctx, &block, highlights.as_deref(), column);
        ctx.advance(SECTION_SPACING);
    }

    fn ratings(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let scores: Vec<(&str, Option<f64>)> = self
            .schema
            .ratings
            .iter()
            .map(|r| (r.label, record.number_in("ratings", r.key)))
            .collect();
        if scores.iter().all(|(_, s)| s.is_none()) {
            debug!("skipping ratings: no scores");
            return;
        }

        // kept together: title bar and every row on one page
        let body = scores.len() as f32 * RATING_ROW_HEIGHT + 2.0 * BOX_PADDING;
        ctx.ensure_space(TITLE_BAR_HEIGHT + TITLE_BAR_GAP + body);
        draw_title_bar(ctx, "Overall Ratings");
        let card = OpenBox::open(ctx);
        ctx.advance(BOX_PADDING);
        for (label, score) in &scores {
            draw_rating(ctx, label, *score);
        }
        let bottom = ctx.y() + BOX_PADDING;
        card.close(ctx, bottom);
        ctx.advance(SECTION_SPACING);
    }

    fn grid_items<'r>(&self, record: &'r InspectionRecord, slots: &[PhotoSlot]) -> Vec<(String, Option<&'r [u8]>)> {
        slots
            .iter()
            .map(|slot| (slot.caption.to_string(), record.photo(slot.key).flatten()))
            .collect()
    }

    fn draw_grid(&self, ctx: &mut LayoutContext, items: &[(String, Option<&[u8]>)]) {
        let cells: Vec<GridItem> = items
            .iter()
            .map(|(caption, bytes)| GridItem::new(caption, *bytes))
            .collect();
        draw_image_grid(ctx, &cells, self.config.grid_columns);
    }

    fn document_photos(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let slots = &self.schema.document_photos;
        if !slots.iter().any(|s| record.has_photo_slot(s.key)) {
            debug!("skipping document photos: none supplied");
            return;
        }
        self.open_section(ctx, "Document Photos", row_height());
        let items = self.grid_items(record, slots);
        self.draw_grid(ctx, &items);
        ctx.advance(SECTION_SPACING);
    }

    /// Declared slots of an area plus any `area/slot` extras, or nothing when the
    /// record names none of them.
    fn area_photos<'r>(&self, record: &'r InspectionRecord, spec: &AreaSpec) -> Vec<(String, Option<&'r [u8]>)> {
        let prefix = format!("{}/", spec.area.slug());
        let extras: Vec<(String, Option<&'r [u8]>)> = record
            .photos()
            .iter()
            .filter_map(|(key, bytes)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (humanize_slot(rest), bytes.as_deref()))
            })
            .collect();
        let declared = spec.photo_slots.iter().any(|s| record.has_photo_slot(s.key));
        if !declared && extras.is_empty() {
            return Vec::new();
        }
        let mut items = self.grid_items(record, &spec.photo_slots);
        items.extend(extras);
        items
    }

    fn area(&self, ctx: &mut LayoutContext, record: &InspectionRecord, spec: &AreaSpec) {
        let checks = record.list(spec.checklist);
        let notes = record.text(spec.notes);
        let rows = self.rows(record, &spec.rows);
        let has_rows = rows.iter().any(|r| r.value.is_some());
        let detail = spec
            .detail
            .and_then(|(heading, key)| record.text(key).map(|text| (heading, text)));
        let cost = spec
            .cost
            .and_then(|(label, key)| record.text(key).map(|value| (label, value)));
        let photos = if self.config.include_images {
            self.area_photos(record, spec)
        } else {
            Vec::new()
        };

        if checks.is_empty() && notes.is_none() && !has_rows && detail.is_none() && cost.is_none() && photos.is_empty() {
            debug!("skipping section '{}': no data", spec.title);
            return;
        }

        let style = ctx.style();
        let p = &style.palette;
        let column = full_width_column(style);
        let first_block = if !checks.is_empty() {
            first_band_height(ctx, &checks, spec.rows_per_column)
        } else if has_rows {
            measure_rows_box(style, SectionBody::Single(&rows))
        } else if let Some((heading, text)) = &detail {
            text_height(style, &TextBlock::note(p, heading), Some(text.as_str()), column)
        } else if cost.is_some() {
            BADGE_HEIGHT
        } else if notes.is_some() {
            text_height(style, &TextBlock::note(p, "Additional Notes:"), notes.as_deref(), column)
        } else {
            row_height()
        };

        self.open_section(ctx, spec.title, first_block);
        draw_checklist(ctx, &checks, spec.rows_per_column);
        if has_rows {
            draw_rows(ctx, SectionBody::Single(&rows));
        }
        if let Some((heading, text)) = &detail {
            draw_flowing_text(ctx, &TextBlock::note(p, heading), Some(text.as_str()), column);
        }
        if let Some((label, value)) = &cost {
            draw_badge(ctx, label, value, p.warning);
        }
        draw_flowing_text(ctx, &TextBlock::note(p, "Additional Notes:"), notes.as_deref(), column);
        self.draw_grid(ctx, &photos);
        ctx.advance(SECTION_SPACING);
    }

    /// Photos whose slot no section claims.
    fn additional_photos(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let claimed = |key: &str| {
            self.schema.declares_slot(key)
                || Area::ALL
                    .iter()
                    .any(|a| key.starts_with(&format!("{}/", a.slug())))
        };
        let items: Vec<(String, Option<&[u8]>)> = record
            .photos()
            .iter()
            .filter(|(key, _)| !claimed(key.as_str()))
            .map(|(key, bytes)| (humanize_slot(key), bytes.as_deref()))
            .collect();
        if items.is_empty() {
            return;
        }
        self.open_section(ctx, "Additional Photos", row_height());
        self.draw_grid(ctx, &items);
        ctx.advance(SECTION_SPACING);
    }

    fn test_drive(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let conducted = record.text("testDrive");
        let notes = record.text("testDriveNotes");
        if conducted.is_none() && notes.is_none() {
            return;
        }
        let p = &ctx.style().palette;
        let rows = [Row::new("Test Drive Conducted", conducted)];
        let first_block = measure_rows_box(ctx.style(), SectionBody::Single(&rows));
        self.open_section(ctx, "Test Drive Assessment", first_block);
        draw_rows(ctx, SectionBody::Single(&rows));
        let column = full_width_column(ctx.style());
        draw_flowing_text(ctx, &TextBlock::note(p, "Test Drive Notes:"), notes.as_deref(), column);
        ctx.advance(SECTION_SPACING);
    }

    fn issues(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let issues = record.text("issuesFound");
        let recommendations = record.text("recommendations");
        if issues.is_none() && recommendations.is_none() {
            return;
        }
        let style = ctx.style();
        let p = &style.palette;
        let column = full_width_column(style);
        let issues_block = TextBlock::alert(p.danger, "Major Issues Found:");
        let recommendations_block = TextBlock::alert(p.info, "Recommendations:");
        let first_block = if issues.is_some() {
            text_height(style, &issues_block, issues.as_deref(), column)
        } else {
            text_height(style, &recommendations_block, recommendations.as_deref(), column)
        };
        self.open_section(ctx, "Issues & Recommendations", first_block);
        draw_flowing_text(ctx, &issues_block, issues.as_deref(), column);
        draw_flowing_text(ctx, &recommendations_block, recommendations.as_deref(), column);
        ctx.advance(SECTION_SPACING);
    }

    fn overall(&self, ctx: &mut LayoutContext, record: &InspectionRecord) {
        let rating = record.text("overallRating");
        let market_value = record.text("marketValue");
        if rating.is_none() && market_value.is_none() {
            return;
        }
        let p = &ctx.style().palette;
        self.open_section(ctx, "Overall Condition", BADGE_HEIGHT);
        if let Some(rating) = &rating {
            draw_badge(ctx, "Overall Condition", rating, condition_color(p, rating));
        }
        if let Some(value) = &market_value {
            draw_badge(ctx, "Estimated Market Value", value, p.info);
        }
        ctx.advance(SECTION_SPACING);
    }
}

/// Box height of a flowing text block, 0 when the text is blank.
fn text_height(style: &ReportStyle, block: &TextBlock, text: Option<&str>, column: f32) -> f32 {
    text.and_then(|text| measure_flowing_text(style, block, text, column))
        .map_or(0.0, |measured| measured.height)
}

/// Badge colour for an overall condition rating.
fn condition_color(palette: &Palette, rating: &str) -> Rgb {
    match rating.trim().to_ascii_lowercase().as_str() {
        "excellent" | "good" => palette.success,
        "average" | "fair" => palette.warning,
        "poor" | "bad" => palette.danger,
        _ => palette.primary,
    }
}

/// Convenience wrapper used by the library entry points.
pub fn render(
    record: &InspectionRecord,
    config: &ReportConfig,
    meta: &ReportMeta,
) -> Result<RenderedDocument, ReportError> {
    ReportAssembler::new(config).assemble(record, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use crate::schema::SchemaVersion;
    use std::collections::BTreeMap;

    fn meta() -> ReportMeta {
        ReportMeta::new("INS-20261019-ABCDEF12", NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    fn brezza() -> InspectionRecord {
        InspectionRecord::new()
            .with_field("registrationNumber", "MH04KD2255")
            .with_field("make", "Maruti")
            .with_field("model", "Brezza")
            .with_field(
                "exteriorChecks",
                vec!["Paint good", "No dents", "Glass intact", "Lights ok", "Mirrors ok", "Wipers ok"],
            )
    }

    #[test]
    fn generated_ids_carry_the_date() {
        let meta = ReportMeta::generate(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(meta.report_id.starts_with("INS-20261019-"));
        assert_eq!(meta.report_id.len(), "INS-20261019-".len() + 8);
    }

    #[test]
    fn missing_registration_number_fails_before_drawing() {
        let config = ReportConfig::default();
        let record = InspectionRecord::new().with_field("make", "Maruti");
        let err = render(&record, &config, &meta()).unwrap_err();
        assert!(matches!(err, ReportError::MissingField(ref f) if f == "registrationNumber"));
    }

    #[test]
    fn empty_areas_are_suppressed() {
        let config = ReportConfig::default();
        let doc = render(&brezza(), &config, &meta()).unwrap();
        assert!(doc.contains_text("Vehicle Registration Details"));
        assert!(doc.contains_text("Exterior / Body Inspection"));
        assert!(doc.contains_text("Maruti Brezza"));
        assert!(!doc.contains_text("Interior Inspection"));
        assert!(!doc.contains_text("Overall Ratings"));
        assert!(!doc.contains_text("Document Photos"));
        assert!(!doc.contains_text("Test Drive Assessment"));
    }

    #[test]
    fn clean_highlights_banner_is_green() {
        let config = ReportConfig::default();
        let record = brezza()
            .with_field("accidental", "No")
            .with_field("floodDamage", "no")
            .with_field("fireDamage", "NO");
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(doc.contains_text("No accident, flood or fire damage reported"));
        let record = brezza().with_field("accidental", "Yes");
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(doc.contains_text("Damage reported"));
        assert!(doc.contains_text("Flood: N/A"));
    }

    #[test]
    fn ratings_show_missing_categories_as_not_available() {
        let config = ReportConfig::default();
        let mut scores = BTreeMap::new();
        scores.insert("engine".to_string(), FieldValue::Number(4.5));
        let record = brezza().with_field("ratings", FieldValue::Map(scores));
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(doc.contains_text("Overall Ratings"));
        assert!(doc.contains_text("(4.5/5)"));
        assert!(doc.contains_text("(N/A)"));
    }

    #[test]
    fn unparseable_ratings_show_as_not_available() {
        let config = ReportConfig::default();
        let mut scores = BTreeMap::new();
        scores.insert("engine".to_string(), FieldValue::Text("nan".to_string()));
        scores.insert("exterior".to_string(), FieldValue::Text("inf".to_string()));
        scores.insert("interior".to_string(), FieldValue::Number(4.0));
        let record = brezza().with_field("ratings", FieldValue::Map(scores));
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(doc.contains_text("(4/5)"));
        assert!(doc.contains_text("(N/A)"));
        let all_text: Vec<String> = doc.text_content().concat();
        assert!(all_text.iter().all(|t| !t.contains("NaN") && !t.contains("inf/5")));
    }

    #[test]
    fn section_title_moves_with_its_first_checklist_band() {
        let config = ReportConfig::default();
        let assembler = ReportAssembler::new(&config);
        let spec = assembler
            .schema
            .areas
            .iter()
            .find(|a| a.title == "Exterior / Body Inspection")
            .unwrap();
        let checks: Vec<String> = (1..=12).map(|i| format!("Exterior check {}", i)).collect();
        let record = brezza().with_field("exteriorChecks", checks.clone());

        let frame = crate::layout::test_support::frame();
        let mut ctx = LayoutContext::new(&config.style, &frame, None);
        // room for the title bar but not for twelve check rows
        let near_bottom = ctx.cursor().bottom() - 150.0;
        ctx.move_to(near_bottom);
        assembler.area(&mut ctx, &record, spec);
        let surface = ctx.finish();

        assert_eq!(surface.pages.len(), 2);
        assert!(!surface.pages[0].contains_text(spec.title));
        let page = &surface.pages[1];
        assert!(page.contains_text(spec.title));
        for check in &checks {
            assert!(page.contains_text(check), "{} not with its title", check);
        }
    }

    #[test]
    fn extended_schema_draws_tire_rows() {
        let config = ReportConfig {
            schema: SchemaVersion::Extended,
            ..ReportConfig::default()
        };
        let record = brezza().with_field("tireFrontLHS", "80%");
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(doc.contains_text("Tires & Wheels Inspection"));
        assert!(doc.contains_text("Front LHS"));
        assert!(doc.contains_text("Spare Tire"));

        let standard = render(&record, &ReportConfig::default(), &meta()).unwrap();
        assert!(!standard.contains_text("Tires & Wheels Inspection"));
    }

    #[test]
    fn unclaimed_photo_slots_are_not_dropped() {
        let config = ReportConfig::default();
        let record = brezza()
            .with_photo("sunroof", None)
            .with_photo("interior/cupHolder", None);
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(doc.contains_text("Additional Photos"));
        assert!(doc.contains_text("Sunroof"));
        assert!(doc.contains_text("Interior Inspection"));
        assert!(doc.contains_text("Cup Holder"));
    }

    #[test]
    fn images_can_be_switched_off() {
        let config = ReportConfig {
            include_images: false,
            ..ReportConfig::default()
        };
        let record = brezza().with_photo("rcBook", None).with_photo("dashboard", None);
        let doc = render(&record, &config, &meta()).unwrap();
        assert!(!doc.contains_text("Document Photos"));
        assert!(!doc.contains_text("Interior Inspection"));
        assert!(!doc.contains_text("No Image"));
    }
}
