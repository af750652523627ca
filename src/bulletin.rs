use crate::calc;
use crate::store::{self, grades, grades::SubjectGradeRow, students};
use anyhow::{anyhow, Context};
use printpdf::{BuiltinFont, Line, Mm, PdfDocument, Point};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

pub const CONTENT_TYPE: &str = "application/pdf";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 10.0;
const BREAK_MARGIN: f32 = 15.0;
const CELL_PAD: f32 = 1.0;
const PT_TO_MM: f32 = 0.3528;

const TITLE: &str = "Bulletin de notes";
const HEADER: [(&str, f32, Align); 3] = [
    ("Matiere", 80.0, Align::Left),
    ("Coeff.", 30.0, Align::Center),
    ("Note", 30.0, Align::Center),
];

#[derive(Debug, Clone)]
pub struct BulletinModel {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub matricule: String,
    /// Sorted by subject name.
    pub rows: Vec<SubjectGradeRow>,
    pub average: Option<Decimal>,
}

impl BulletinModel {
    pub fn load(conn: &Connection, student_id: &str) -> store::Result<Self> {
        let student = students::get(conn, student_id)?;
        let rows = grades::for_student(conn, student_id)?;
        let average = calc::student_average(conn, student_id)?;
        Ok(Self {
            student_id: student.id,
            last_name: student.last_name,
            first_name: student.first_name,
            matricule: student.matricule,
            rows,
            average,
        })
    }
}

pub fn file_name(student_id: &str) -> String {
    format!("bulletin_{student_id}.pdf")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Positions are in millimetres from the top-left corner of the page;
/// text `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    Text {
        x: f32,
        y: f32,
        size: f32,
        text: String,
    },
    Border {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct LayoutPage {
    pub items: Vec<LayoutItem>,
}

#[derive(Debug, Clone)]
pub struct BulletinLayout {
    pub pages: Vec<LayoutPage>,
}

#[cfg(test)]
impl BulletinLayout {
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.pages.iter().flat_map(|p| {
            p.items.iter().filter_map(|i| match i {
                LayoutItem::Text { text, .. } => Some(text.as_str()),
                LayoutItem::Border { .. } => None,
            })
        })
    }
}

struct Cursor {
    pages: Vec<LayoutPage>,
    y: f32,
    font_size: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![LayoutPage::default()],
            y: MARGIN,
            font_size: 12.0,
        }
    }

    fn page(&mut self) -> &mut LayoutPage {
        // `pages` starts with one page and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn fits(&self, h: f32) -> bool {
        self.y + h <= PAGE_H - BREAK_MARGIN
    }

    fn add_page(&mut self) {
        self.pages.push(LayoutPage::default());
        self.y = MARGIN;
    }

    fn break_if_needed(&mut self, h: f32) -> bool {
        if self.fits(h) {
            return false;
        }
        self.add_page();
        true
    }

    fn text_in_cell(&mut self, x: f32, w: f32, h: f32, text: &str, align: Align) {
        if text.is_empty() {
            return;
        }
        let size = self.font_size;
        let text = fit_text(text, w - 2.0 * CELL_PAD, size);
        let tw = text_width(&text, size);
        let tx = match align {
            Align::Left => x + CELL_PAD,
            Align::Center => x + (w - tw) / 2.0,
        };
        let baseline = self.y + 0.5 * h + 0.3 * size * PT_TO_MM;
        self.page().items.push(LayoutItem::Text {
            x: tx,
            y: baseline,
            size,
            text,
        });
    }

    /// Full-width line without border.
    fn line(&mut self, h: f32, text: &str, align: Align) {
        self.break_if_needed(h);
        self.text_in_cell(MARGIN, PAGE_W - 2.0 * MARGIN, h, text, align);
        self.y += h;
    }

    fn gap(&mut self, h: f32) {
        self.y += h;
    }

    fn bordered_row(&mut self, h: f32, cells: &[(String, f32, Align)]) {
        let mut x = MARGIN;
        for (text, w, align) in cells {
            let y = self.y;
            self.page().items.push(LayoutItem::Border { x, y, w: *w, h });
            self.text_in_cell(x, *w, h, text, *align);
            x += w;
        }
        self.y += h;
    }

    fn table_header(&mut self, h: f32) {
        let cells: Vec<_> = HEADER
            .iter()
            .map(|(t, w, a)| (t.to_string(), *w, *a))
            .collect();
        self.bordered_row(h, &cells);
    }
}

/// Approximate Helvetica advance widths, in em.
fn glyph_em(c: char) -> f32 {
    match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | 'i' | 'j' | 'l' | 'I' | '|' => 0.278,
        'f' | 't' | 'r' | '(' | ')' | '-' => 0.333,
        '0'..='9' => 0.556,
        'm' | 'w' | 'M' | 'W' => 0.833,
        'A'..='Z' => 0.667,
        _ => 0.556,
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(glyph_em).sum::<f32>() * size * PT_TO_MM
}

/// Truncates with "..." so the text stays inside its cell.
fn fit_text(text: &str, max_w: f32, size: f32) -> String {
    if text_width(text, size) <= max_w {
        return text.to_string();
    }
    let ellipsis = "...";
    let budget = max_w - text_width(ellipsis, size);
    let mut out = String::new();
    let mut used = 0.0;
    for c in text.chars() {
        let w = glyph_em(c) * size * PT_TO_MM;
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ellipsis);
    out
}

fn format_grade(value: Decimal) -> String {
    calc::round_2_decimals(value).to_string()
}

pub fn layout(model: &BulletinModel) -> BulletinLayout {
    let mut c = Cursor::new();

    c.font_size = 12.0;
    c.line(8.0, TITLE, Align::Center);
    c.gap(4.0);
    c.line(
        6.0,
        &format!("Nom: {} {}", model.last_name, model.first_name),
        Align::Left,
    );
    c.line(6.0, &format!("Matricule: {}", model.matricule), Align::Left);
    c.gap(6.0);

    c.font_size = 11.0;
    let row_h = 7.0;
    // Keep the header together with at least one row.
    c.break_if_needed(2.0 * row_h);
    c.table_header(row_h);
    for r in &model.rows {
        if c.break_if_needed(row_h) {
            c.table_header(row_h);
        }
        c.bordered_row(
            row_h,
            &[
                (r.subject.clone(), HEADER[0].1, HEADER[0].2),
                (r.coefficient.to_string(), HEADER[1].1, HEADER[1].2),
                (format_grade(r.value), HEADER[2].1, HEADER[2].2),
            ],
        );
    }

    c.gap(4.0);
    c.line(
        row_h,
        &format!("Moyenne generale: {}", calc::format_average(model.average)),
        Align::Left,
    );

    BulletinLayout { pages: c.pages }
}

pub fn render_pdf(layout: &BulletinLayout, title: &str) -> anyhow::Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("failed to load builtin font: {e:?}"))?;

    for (i, page) in layout.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        layer.set_outline_thickness(0.2);

        for item in &page.items {
            match item {
                LayoutItem::Text { x, y, size, text } => {
                    layer.use_text(text.clone(), *size, Mm(*x), Mm(PAGE_H - y), &font);
                }
                LayoutItem::Border { x, y, w, h } => {
                    let top = PAGE_H - y;
                    let bottom = top - h;
                    let corner = |px: f32, py: f32| (Point::new(Mm(px), Mm(py)), false);
                    layer.add_line(Line {
                        points: vec![
                            corner(*x, top),
                            corner(x + w, top),
                            corner(x + w, bottom),
                            corner(*x, bottom),
                        ],
                        is_closed: true,
                    });
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("failed to serialize pdf: {e:?}"))
}

/// Renders the bulletin for one student into a PDF byte buffer.
pub fn render(model: &BulletinModel) -> anyhow::Result<Vec<u8>> {
    let title = format!("{} - {} {}", TITLE, model.last_name, model.first_name);
    render_pdf(&layout(model), &title)
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: usize,
    pub pages: usize,
}

pub fn export(model: &BulletinModel, out_dir: &Path) -> anyhow::Result<ExportSummary> {
    let pages = layout(model).pages.len();
    let bytes = render(model)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;
    let name = file_name(&model.student_id);
    let path = out_dir.join(&name);
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;

    Ok(ExportSummary {
        path,
        file_name: name,
        bytes: bytes.len(),
        pages,
    })
}
