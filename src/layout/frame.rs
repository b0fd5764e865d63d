// Header and footer bands.

use chrono::NaiveDate;

use crate::canvas::{DrawOp, ImageId, PageBuffer, Stroke};
use crate::config::Branding;
use crate::metrics::{text_width, truncate_to_width, Font};
use crate::style::ReportStyle;

/// Verification QR code edge length in points.
const QR_SIZE: f32 = 62.0;

/// Everything the page bands print. Built once per report.
#[derive(Clone, Debug, PartialEq)]
pub struct PageFrame {
    branding: Branding,
    report_id: String,
    date_label: String,
    vehicle: String,
}

/// Footer numbering for one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FooterStamp {
    pub page_number: usize,
    pub total_pages: usize,
}

impl FooterStamp {
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.total_pages)
    }
}

/// A page after phase two: its content plus the footer band stamped on top.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedPage {
    pub content: PageBuffer,
    pub footer: PageBuffer,
    pub stamp: FooterStamp,
}

impl FinishedPage {
    /// Content ops followed by footer ops, in painting order.
    pub fn ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.content.ops.iter().chain(self.footer.ops.iter())
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.texts().chain(self.footer.texts())
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

impl PageFrame {
    pub fn new(branding: Branding, report_id: &str, date: NaiveDate, vehicle: &str) -> Self {
        Self {
            branding,
            report_id: report_id.to_string(),
            date_label: format_report_date(date),
            vehicle: vehicle.to_string(),
        }
    }

    /// Rich band on page one: brand, tagline, report title, id, date, optional QR code.
    pub fn draw_first_header(&self, page: &mut PageBuffer, style: &ReportStyle, qr: Option<ImageId>) {
        let g = &style.geometry;
        let p = &style.palette;
        let t = &style.type_scale;
        let band = g.first_header_height;
        let left = g.content_left();
        let right = g.content_right();

        page.fill_rect(0.0, 0.0, g.width, band, p.card_background);

        page.text(left, 32.0, &self.branding.name, Font::Bold, t.brand, p.primary);
        page.text(left, 46.0, &self.branding.tagline, Font::Regular, t.small, p.muted);
        page.text(left, 70.0, &self.branding.report_title, Font::Bold, t.title, p.text);

        page.text_right(right, 24.0, "Inspection ID", Font::Regular, t.small, p.muted);
        page.text_right(right, 37.0, &self.report_id, Font::Bold, t.value, p.text);
        page.text_right(right, 53.0, "Date", Font::Regular, t.small, p.muted);
        page.text_right(right, 66.0, &self.date_label, Font::Bold, t.value, p.text);

        if let Some(id) = qr {
            let block = text_width(&self.report_id, Font::Bold, t.value)
                .max(text_width(&self.date_label, Font::Bold, t.value));
            page.push(DrawOp::Image {
                id,
                x: right - block - 10.0 - QR_SIZE,
                y: (band - QR_SIZE) / 2.0,
                width: QR_SIZE,
                height: QR_SIZE,
            });
        }

        page.line(0.0, band, g.width, band, Stroke::new(p.accent, 2.0));
    }

    /// Compact band on every later page.
    pub fn draw_header(&self, page: &mut PageBuffer, style: &ReportStyle) {
        let g = &style.geometry;
        let p = &style.palette;
        let t = &style.type_scale;
        let band = g.header_height;
        let left = g.content_left();
        let right = g.content_right();

        page.fill_rect(0.0, 0.0, g.width, band, p.card_background);
        page.text(left, 30.0, &self.branding.name, Font::Bold, t.section + 2.0, p.primary);
        page.text(left, 44.0, &self.branding.report_title, Font::Regular, t.small, p.muted);
        page.text_right(
            right,
            30.0,
            &format!("Report {}", self.report_id),
            Font::Bold,
            t.small,
            p.text,
        );
        page.text_right(right, 44.0, &self.vehicle, Font::Regular, t.small, p.muted);
        page.line(0.0, band, g.width, band, Stroke::new(p.accent, 1.0));
    }

    /// Footer band: contact line, page number, disclaimer.
    pub fn draw_footer(&self, page: &mut PageBuffer, style: &ReportStyle, stamp: FooterStamp) {
        let g = &style.geometry;
        let p = &style.palette;
        let t = &style.type_scale;
        let top = g.footer_top();
        let left = g.content_left();
        let right = g.content_right();
        let center = g.width / 2.0;

        if p.page_background.is_some() {
            page.fill_rect(0.0, top, g.width, g.footer_height, p.card_background);
        }
        page.line(left, top, right, top, Stroke::new(p.border, 0.75));

        let b = &self.branding;
        page.text(left, top + 18.0, &format!("Email: {}", b.email), Font::Regular, t.small, p.label);
        page.text_centered(center, top + 18.0, &format!("Mobile: {}", b.phone), Font::Regular, t.small, p.label);
        page.text_right(right, top + 18.0, &format!("Web: {}", b.website), Font::Regular, t.small, p.label);

        page.text_centered(center, top + 34.0, &stamp.label(), Font::Bold, t.small, p.text);

        let disclaimer = truncate_to_width(&b.disclaimer, Font::Regular, t.tiny, g.content_width());
        page.text_centered(center, top + 50.0, &disclaimer, Font::Regular, t.tiny, p.muted);
    }

    /// Phase two. Numbers every page against the final count; content is left untouched.
    pub fn stamp_footers(&self, style: &ReportStyle, pages: Vec<PageBuffer>) -> Vec<FinishedPage> {
        let total_pages = pages.len();
        pages
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let stamp = FooterStamp {
                    page_number: index + 1,
                    total_pages,
                };
                let mut footer = PageBuffer::new();
                self.draw_footer(&mut footer, style, stamp);
                FinishedPage {
                    content,
                    footer,
                    stamp,
                }
            })
            .collect()
    }
}
