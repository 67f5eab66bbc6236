// PDF export: renders a stored report as a self-contained PDF document.
//
// The writer emits plain PDF 1.4 objects with a base-14 Helvetica font and
// absolute-positioned text, the same way the attachment converters elsewhere
// in this codebase speak file formats directly instead of pulling in a
// rendering engine.
use crate::storage::ReportRecord;

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN_X: f64 = 72.0;
const TOP_Y: f64 = 760.0;
const BOTTOM_Y: f64 = 56.0;
const WRAP_COLUMNS: usize = 92;

struct Line {
    text: String,
    size: i32,
    indent: f64,
}

impl Line {
    fn new(text: impl Into<String>, size: i32, indent: f64) -> Self {
        Self {
            text: text.into(),
            size,
            indent,
        }
    }

    fn blank() -> Self {
        Self::new("", 10, 0.0)
    }
}

/// Renders the fixed export layout: title, summary, bulleted findings,
/// bulleted risks, recommendation. No configurability.
pub fn render_report_pdf(record: &ReportRecord) -> Vec<u8> {
    let lines = layout_lines(record);
    let streams = paginate(&lines);
    build_pdf(&streams)
}

fn layout_lines(record: &ReportRecord) -> Vec<Line> {
    let mut lines = Vec::new();
    lines.push(Line::new("Synapse Intelligence Report", 16, 0.0));
    lines.push(Line::new(
        format!("Report #{} - {}", record.id, record.created_at),
        9,
        0.0,
    ));
    lines.push(Line::blank());

    lines.push(Line::new("Summary:", 12, 0.0));
    push_wrapped(&mut lines, &record.summary, 0.0);
    lines.push(Line::blank());

    lines.push(Line::new("Key Findings:", 12, 0.0));
    for finding in &record.findings {
        push_bullet(&mut lines, finding);
    }
    lines.push(Line::blank());

    lines.push(Line::new("Risks:", 12, 0.0));
    for risk in &record.risks {
        push_bullet(&mut lines, risk);
    }
    lines.push(Line::blank());

    lines.push(Line::new("Strategic Recommendation:", 12, 0.0));
    push_wrapped(&mut lines, &record.recommendation, 0.0);
    lines
}

fn push_wrapped(lines: &mut Vec<Line>, text: &str, indent: f64) {
    for wrapped in wrap_text(text, WRAP_COLUMNS) {
        lines.push(Line::new(wrapped, 10, indent));
    }
}

fn push_bullet(lines: &mut Vec<Line>, text: &str) {
    let mut first = true;
    for wrapped in wrap_text(text, WRAP_COLUMNS - 2) {
        if first {
            lines.push(Line::new(format!("- {wrapped}"), 10, 8.0));
            first = false;
        } else {
            lines.push(Line::new(wrapped, 10, 18.0));
        }
    }
}

/// Greedy word wrap; a single overlong word gets its own line rather than
/// being split mid-token.
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= columns {
            current.push(' ');
            current.push_str(word);
        } else {
            wrapped.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Splits the laid-out lines into per-page content streams.
fn paginate(lines: &[Line]) -> Vec<String> {
    let mut streams = Vec::new();
    let mut content = String::new();
    let mut y = TOP_Y;
    for line in lines {
        let leading = f64::from(line.size) + 6.0;
        if y - leading < BOTTOM_Y {
            streams.push(std::mem::take(&mut content));
            y = TOP_Y;
        }
        y -= leading;
        if !line.text.is_empty() {
            let x = MARGIN_X + line.indent;
            content.push_str(&format!(
                "BT /F1 {} Tf {x:.1} {y:.1} Td ({}) Tj ET\n",
                line.size,
                escape_pdf_text(&line.text)
            ));
        }
    }
    streams.push(content);
    streams
}

/// Escapes the PDF string delimiters and replaces anything outside
/// printable ASCII, which base-14 Helvetica cannot address reliably.
fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            ' '..='~' => escaped.push(ch),
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// Assembles catalog, page tree, font, page and content objects with a
/// correct cross-reference table.
fn build_pdf(streams: &[String]) -> Vec<u8> {
    let mut buf: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets: Vec<usize> = Vec::new();
    let object_count = 3 + streams.len() * 2;

    push_object(&mut buf, &mut offsets, 1, "<< /Type /Catalog /Pages 2 0 R >>");
    let kids = (0..streams.len())
        .map(|index| format!("{} 0 R", 4 + index * 2))
        .collect::<Vec<_>>()
        .join(" ");
    push_object(
        &mut buf,
        &mut offsets,
        2,
        &format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            streams.len()
        ),
    );
    push_object(
        &mut buf,
        &mut offsets,
        3,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>",
    );
    for (index, content) in streams.iter().enumerate() {
        let page_id = 4 + index * 2;
        let content_id = page_id + 1;
        push_object(
            &mut buf,
            &mut offsets,
            page_id,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            ),
        );
        offsets.push(buf.len());
        buf.extend(
            format!(
                "{content_id} 0 obj\n<< /Length {} >>\nstream\n",
                content.len()
            )
            .bytes(),
        );
        buf.extend(content.bytes());
        buf.extend(b"endstream\nendobj\n");
    }

    let xref_offset = buf.len();
    buf.extend(format!("xref\n0 {}\n", object_count + 1).bytes());
    buf.extend(b"0000000000 65535 f \n");
    for offset in &offsets {
        buf.extend(format!("{offset:010} 00000 n \n").bytes());
    }
    buf.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            object_count + 1
        )
        .bytes(),
    );
    buf
}

fn push_object(buf: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize, body: &str) {
    offsets.push(buf.len());
    buf.extend(format!("{id} 0 obj\n{body}\nendobj\n").bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ReportRecord {
        ReportRecord {
            id: 7,
            summary: "A short summary of the situation.".to_string(),
            risks: vec!["First risk".to_string(), "Second (nested) risk".to_string()],
            findings: vec!["Finding one".to_string()],
            recommendation: "Hold the course.".to_string(),
            risk_score: 40,
            confidence: 92,
            created_at: "2024-01-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn output_is_a_pdf_with_the_fixed_section_order() {
        let bytes = render_report_pdf(&sample_record());
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let text = String::from_utf8_lossy(&bytes).to_string();
        let summary = text.find("Summary:").expect("summary heading");
        let findings = text.find("Key Findings:").expect("findings heading");
        let risks = text.find("Risks:").expect("risks heading");
        let recommendation = text
            .find("Strategic Recommendation:")
            .expect("recommendation heading");
        assert!(summary < findings && findings < risks && risks < recommendation);
        assert!(text.contains("Helvetica"));
        assert!(text.contains("- Finding one"));
    }

    #[test]
    fn startxref_points_at_the_xref_table() {
        let bytes = render_report_pdf(&sample_record());
        let text = String::from_utf8_lossy(&bytes).to_string();
        let start = text.find("startxref\n").expect("startxref keyword") + "startxref\n".len();
        let end = text[start..].find('\n').expect("offset line") + start;
        let offset: usize = text[start..end].trim().parse().expect("numeric offset");
        assert_eq!(&bytes[offset..offset + 5], b"xref\n");
    }

    #[test]
    fn parens_and_non_ascii_are_escaped() {
        assert_eq!(escape_pdf_text(r"a(b)c\d"), r"a\(b\)c\\d");
        assert_eq!(escape_pdf_text("café"), "caf?");
    }

    #[test]
    fn long_reports_spill_onto_extra_pages() {
        let mut record = sample_record();
        record.risks = (0..120).map(|index| format!("Risk number {index}")).collect();
        let bytes = render_report_pdf(&record);
        let text = String::from_utf8_lossy(&bytes).to_string();
        let start = text.find("/Count ").expect("page count") + "/Count ".len();
        let end = text[start..].find(' ').expect("count terminator") + start;
        let count: usize = text[start..end].trim().parse().expect("numeric page count");
        assert!(count > 1, "expected pagination, got {count} page(s)");
    }

    #[test]
    fn wrap_keeps_words_whole() {
        let wrapped = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(wrapped, vec!["alpha beta".to_string(), "gamma delta".to_string()]);
        assert_eq!(wrap_text("", 10), Vec::<String>::new());
    }
}
