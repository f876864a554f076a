//! Structure recovery for the free-text AI report.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum ReportBlock {
    Heading(String),
    Bullet(String),
    Numbered(String),
    Paragraph(String),
}

/// Splits the report into display blocks, one per non-blank line.
pub fn parse_report(text: &str) -> Vec<ReportBlock> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify_line)
        .collect()
}

fn classify_line(line: &str) -> ReportBlock {
    if let Some(item) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix('-').filter(|rest| !starts_with_digit(rest)))
        .or_else(|| line.strip_prefix('*'))
    {
        return ReportBlock::Bullet(item.trim().to_string());
    }
    if let Some(item) = numbered_item(line) {
        return ReportBlock::Numbered(item.to_string());
    }
    if line.ends_with(':') {
        return ReportBlock::Heading(line.trim_end_matches(':').trim().to_string());
    }
    ReportBlock::Paragraph(line.to_string())
}

fn numbered_item(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn starts_with_digit(text: &str) -> bool {
    text.bytes().next().is_some_and(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_headings_lists_and_paragraphs() {
        let blocks = parse_report(
            "Summary:\nStrong location.\n\n- near highway\n* flat lot\n1. Confirm zoning\n12. Order survey",
        );

        assert_eq!(
            blocks,
            vec![
                ReportBlock::Heading("Summary".to_string()),
                ReportBlock::Paragraph("Strong location.".to_string()),
                ReportBlock::Bullet("near highway".to_string()),
                ReportBlock::Bullet("flat lot".to_string()),
                ReportBlock::Numbered("Confirm zoning".to_string()),
                ReportBlock::Numbered("Order survey".to_string()),
            ]
        );
    }

    #[test]
    fn negative_numbers_and_decimals_stay_paragraphs() {
        assert_eq!(
            parse_report("-18400 affordability gap"),
            vec![ReportBlock::Paragraph("-18400 affordability gap".to_string())]
        );
        assert_eq!(
            parse_report("3.5 acres usable"),
            vec![ReportBlock::Paragraph("3.5 acres usable".to_string())]
        );
    }

    #[test]
    fn blank_report_has_no_blocks() {
        assert!(parse_report("  \n\n").is_empty());
    }
}
