use std::io::BufWriter;

use chrono::NaiveDate;
use printpdf::*;

use crate::error::{AppError, Result};
use crate::fmt::{long_date, number, rupiah};
use crate::models::TripStatRecord;
use crate::report::MonthlyReport;

// A4 portrait (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 10.0;
pub const CONTENT_H: f32 = PAGE_H - 2.0 * MARGIN;

const ROW_H: f32 = 7.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_SIZE: f32 = 12.0;

const TABLE_HEADERS: [&str; 3] = ["Nama Gunung", "Jumlah Peserta", "Pendapatan"];
const COL_W: [f32; 3] = [95.0, 40.0, 55.0];

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// An atomic piece of the document. Blocks are never split across pages.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { text: String, size: f32, bold: bool },
    Line { left: String, right: String },
    Rule,
    Spacer(f32),
    Section(String),
    KeyValue { label: String, value: String },
    TableHeader { table: usize },
    TableRow { table: usize, cells: [String; 3], bold: bool },
    Total { label: String, value: String },
    Signature { place_date: String, company: String },
}

impl Block {
    pub fn height(&self) -> f32 {
        match self {
            Block::Heading { size, .. } => size * 0.45 + 2.0,
            Block::Line { .. } => 6.0,
            Block::Rule => 3.0,
            Block::Spacer(h) => *h,
            Block::Section(_) => 9.0,
            Block::KeyValue { .. } => 6.5,
            Block::TableHeader { .. } => 9.0,
            Block::TableRow { .. } => ROW_H,
            Block::Total { .. } => 12.0,
            Block::Signature { .. } => 40.0,
        }
    }

    /// Headings and table headers must not end a page on their own.
    fn keeps_with_next(&self) -> bool {
        matches!(self, Block::Section(_) | Block::TableHeader { .. })
    }
}

/// Greedy page fill. Returns block indices per page, in order. A page that
/// starts with a table row gets that table's header repeated, so its height
/// is reserved here too.
pub fn paginate(blocks: &[Block], available: f32) -> Vec<Vec<usize>> {
    let header_h = Block::TableHeader { table: 0 }.height();
    let mut pages = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut used = 0.0;

    for (i, block) in blocks.iter().enumerate() {
        let mut needed = block.height();
        let mut j = i;
        while blocks[j].keeps_with_next() {
            match blocks.get(j + 1) {
                Some(next) => {
                    needed += next.height();
                    j += 1;
                }
                None => break,
            }
        }

        if !current.is_empty() && used + needed > available {
            pages.push(std::mem::take(&mut current));
            used = 0.0;
            if matches!(block, Block::TableRow { .. }) {
                used += header_h;
            }
        }
        current.push(i);
        used += block.height();
    }
    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// The header to repeat at the top of a page that continues a table.
pub fn continuation_header(blocks: &[Block], page: &[usize]) -> Option<usize> {
    let first = *page.first()?;
    let Block::TableRow { table, .. } = blocks[first] else {
        return None;
    };
    blocks[..first]
        .iter()
        .rposition(|b| matches!(b, Block::TableHeader { table: t } if *t == table))
}

fn trip_table(blocks: &mut Vec<Block>, table: usize, title: &str, records: &[TripStatRecord], total: u64) {
    blocks.push(Block::Section(format!("{title} ({})", records.len())));
    blocks.push(Block::TableHeader { table });
    for r in records {
        blocks.push(Block::TableRow {
            table,
            cells: [
                r.mountain_name.clone(),
                number(r.total_participants),
                rupiah(r.total_price),
            ],
            bold: false,
        });
    }
    blocks.push(Block::TableRow {
        table,
        cells: [format!("Total {title}"), String::new(), rupiah(total)],
        bold: true,
    });
    blocks.push(Block::Spacer(4.0));
}

pub fn layout_monthly_report(
    report: &MonthlyReport,
    company: &str,
    city: &str,
    today: NaiveDate,
) -> Vec<Block> {
    let totals = report.totals();
    let date = long_date(today);
    let mut blocks = vec![
        Block::Line {
            left: company.to_string(),
            right: format!("Tanggal: {date}"),
        },
        Block::Line {
            left: "Laporan Bulanan".to_string(),
            right: String::new(),
        },
        Block::Rule,
        Block::Spacer(4.0),
        Block::Heading {
            text: "LAPORAN TRIP".to_string(),
            size: TITLE_SIZE,
            bold: true,
        },
        Block::Heading {
            text: report.period.label(),
            size: SUBTITLE_SIZE,
            bold: false,
        },
        Block::Spacer(4.0),
        Block::Section("Ringkasan".to_string()),
        Block::KeyValue {
            label: "Total Trip".to_string(),
            value: totals.total_trip_count.to_string(),
        },
        Block::KeyValue {
            label: "Open Trip".to_string(),
            value: totals.open_trip_count.to_string(),
        },
        Block::KeyValue {
            label: "Private Trip".to_string(),
            value: totals.private_trip_count.to_string(),
        },
        Block::KeyValue {
            label: "Total Pendapatan".to_string(),
            value: rupiah(totals.grand_total),
        },
        Block::Spacer(4.0),
    ];

    trip_table(&mut blocks, 0, "Open Trip", &report.open_trips, totals.total_open_revenue);
    trip_table(&mut blocks, 1, "Private Trip", &report.private_trips, totals.total_private_revenue);

    blocks.push(Block::Total {
        label: "Total Keseluruhan Pendapatan".to_string(),
        value: rupiah(totals.grand_total),
    });
    blocks.push(Block::Signature {
        place_date: format!("{city}, {date}"),
        company: company.to_string(),
    });
    blocks
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN;
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer().use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn text_right(&self, s: &str, right: f32, size: f32, bold: bool) {
        self.text(s, right - approx_text_width(s, size), size, bold);
    }

    fn text_center(&self, s: &str, size: f32, bold: bool) {
        self.text(s, (PAGE_W - approx_text_width(s, size)) / 2.0, size, bold);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self.layer();
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        });
    }

    fn table_cells(&self, cells: [&str; 3], bold: bool) {
        let mut x = MARGIN;
        for (i, cell) in cells.iter().enumerate() {
            if i == 0 {
                self.text(cell, x + 1.0, FONT_SIZE, bold);
            } else {
                self.text_right(cell, x + COL_W[i] - 1.0, FONT_SIZE, bold);
            }
            x += COL_W[i];
        }
    }

    fn draw(&mut self, block: &Block) {
        let right = PAGE_W - MARGIN;
        let baseline = block.height() - 2.0;
        match block {
            Block::Heading { text, size, bold } => {
                self.y += baseline;
                self.text_center(text, *size, *bold);
                self.y += 2.0;
            }
            Block::Line { left, right: r } => {
                self.y += baseline;
                self.text(left, MARGIN, FONT_SIZE, true);
                if !r.is_empty() {
                    self.text_right(r, right, FONT_SIZE, false);
                }
                self.y += 2.0;
            }
            Block::Rule => {
                self.y += 1.5;
                self.hline(MARGIN, right);
                self.y += 1.5;
            }
            Block::Spacer(h) => self.y += h,
            Block::Section(label) => {
                self.y += baseline;
                self.text(label, MARGIN, SUBTITLE_SIZE, true);
                self.y += 2.0;
            }
            Block::KeyValue { label, value } => {
                self.y += baseline;
                self.text(label, MARGIN + 1.0, FONT_SIZE, false);
                self.text_right(value, right - 1.0, FONT_SIZE, true);
                self.y += 2.0;
            }
            Block::TableHeader { .. } => {
                self.y += baseline;
                self.table_cells(TABLE_HEADERS, true);
                self.y += 1.0;
                self.hline(MARGIN, right);
                self.y += 1.0;
            }
            Block::TableRow { cells, bold, .. } => {
                self.y += baseline;
                if *bold {
                    // total row spans the first two columns
                    self.table_cells([cells[0].as_str(), "", cells[2].as_str()], true);
                } else {
                    self.table_cells([cells[0].as_str(), cells[1].as_str(), cells[2].as_str()], false);
                }
                self.y += 2.0;
            }
            Block::Total { label, value } => {
                self.y += 2.0;
                self.hline(MARGIN, right);
                self.y += baseline - 2.0;
                self.text(label, MARGIN + 1.0, SUBTITLE_SIZE, true);
                self.text_right(value, right - 1.0, SUBTITLE_SIZE, true);
                self.y += 2.0;
            }
            Block::Signature { place_date, company } => {
                let x = right - 60.0;
                self.y += 12.0;
                self.text(place_date, x, FONT_SIZE, false);
                self.y += 20.0;
                self.hline(x, right);
                self.y += 5.0;
                self.text(company, x, FONT_SIZE, true);
                self.y += 3.0;
            }
        }
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| AppError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| AppError::Pdf(e.to_string()))
    }
}

fn render_blocks(title: &str, blocks: &[Block]) -> Result<Vec<u8>> {
    let pages = paginate(blocks, CONTENT_H);
    tracing::debug!(blocks = blocks.len(), pages = pages.len(), "rendering pdf");
    let mut pdf = PdfWriter::new(title)?;
    for (n, page) in pages.iter().enumerate() {
        if n > 0 {
            pdf.new_page();
        }
        if let Some(header) = continuation_header(blocks, page) {
            pdf.draw(&blocks[header]);
        }
        for &i in page {
            pdf.draw(&blocks[i]);
        }
    }
    pdf.to_bytes()
}

pub fn render_monthly_report(
    report: &MonthlyReport,
    company: &str,
    city: &str,
    today: NaiveDate,
) -> Result<Vec<u8>> {
    let blocks = layout_monthly_report(report, company, city, today);
    render_blocks(&format!("Laporan Trip {}", report.period.label()), &blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Month, ReportPeriod};

    fn rec(name: &str, participants: u64, price: u64) -> TripStatRecord {
        TripStatRecord {
            mountain_name: name.to_string(),
            total_participants: participants,
            total_price: price,
        }
    }

    fn report_with(open: usize, private: usize) -> MonthlyReport {
        let period = ReportPeriod::new(Month::from_number(4).unwrap(), 2025, &(2023..=2025)).unwrap();
        MonthlyReport::new(
            period,
            (0..open).map(|i| rec(&format!("Open {i}"), 2, 1_000_000)).collect(),
            (0..private).map(|i| rec(&format!("Private {i}"), 1, 500_000)).collect(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn all_text(blocks: &[Block]) -> String {
        format!("{blocks:?}")
    }

    #[test]
    fn test_layout_contents() {
        let report = MonthlyReport::new(
            report_with(0, 0).period,
            vec![rec("Rinjani", 10, 5_000_000)],
            vec![],
        );
        let blocks = layout_monthly_report(&report, "GaPakeRem Adventure", "Makassar", today());
        let text = all_text(&blocks);
        assert!(text.contains("LAPORAN TRIP"));
        assert!(text.contains("April 2025"));
        assert!(text.contains("Tanggal: 19 Oktober 2026"));
        assert!(text.contains("Makassar, 19 Oktober 2026"));
        assert!(text.contains("Total Open Trip"));
        assert!(text.contains("Rp 5.000.000"));
        assert!(text.contains("Open Trip (1)"));
        assert!(text.contains("Private Trip (0)"));
        assert_eq!(TABLE_HEADERS[2], "Pendapatan");
    }

    #[test]
    fn test_paginate_keeps_every_block_once_in_order() {
        let blocks = layout_monthly_report(&report_with(60, 45), "Co", "Makassar", today());
        let pages = paginate(&blocks, CONTENT_H);
        assert!(pages.len() > 1);
        let flat: Vec<usize> = pages.iter().flatten().copied().collect();
        assert_eq!(flat, (0..blocks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_pages_never_overflow() {
        let blocks = layout_monthly_report(&report_with(80, 30), "Co", "Makassar", today());
        let header_h = Block::TableHeader { table: 0 }.height();
        for page in paginate(&blocks, CONTENT_H) {
            let mut used: f32 = page.iter().map(|&i| blocks[i].height()).sum();
            if continuation_header(&blocks, &page).is_some() {
                used += header_h;
            }
            assert!(used <= CONTENT_H + 0.01, "page overflows: {used}");
        }
    }

    #[test]
    fn test_continuation_page_repeats_header() {
        let blocks = layout_monthly_report(&report_with(80, 0), "Co", "Makassar", today());
        let pages = paginate(&blocks, CONTENT_H);
        let second = &pages[1];
        let header = continuation_header(&blocks, second).expect("header repeated");
        assert_eq!(blocks[header], Block::TableHeader { table: 0 });
        assert!(continuation_header(&blocks, &pages[0]).is_none());
    }

    #[test]
    fn test_table_header_not_orphaned() {
        let blocks = layout_monthly_report(&report_with(40, 40), "Co", "Makassar", today());
        for page in paginate(&blocks, CONTENT_H) {
            let last = *page.last().unwrap();
            assert!(!blocks[last].keeps_with_next() || last == blocks.len() - 1);
        }
    }

    #[test]
    fn test_greedy_fill_is_minimal_for_uniform_rows() {
        let blocks: Vec<Block> = (0..10).map(|_| Block::Spacer(10.0)).collect();
        assert_eq!(paginate(&blocks, 30.0).len(), 4);
        assert_eq!(paginate(&blocks, 100.0).len(), 1);
        assert!(paginate(&[], 100.0).is_empty());
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_monthly_report(&report_with(3, 2), "GaPakeRem Adventure", "Makassar", today()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_empty_report() {
        let bytes = render_monthly_report(&report_with(0, 0), "GaPakeRem Adventure", "Makassar", today()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
