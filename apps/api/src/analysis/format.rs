/// Section headings the analysis prompt asks for, in report order.
const SECTIONS: [&str; 6] = [
    "Overview Summary",
    "Detailed Metric Breakdown",
    "Strengths Identified",
    "Weaknesses Identified",
    "Actionable Improvements",
    "Viral Potential Score",
];

const METRIC_LABELS: [&str; 5] = [
    "Like-to-View",
    "Comment-to-View",
    "Comment-to-Like",
    "Save-to-View",
    "Save-to-Like",
];

/// Renders a generated report as markdown: known section headings that start
/// a line (optionally numbered, optionally followed by `:`) become `##`
/// headings, and metric labels are bolded.
pub fn format_report_for_display(report: &str) -> String {
    report
        .lines()
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_line(line: &str) -> String {
    let body = strip_numbering(line.trim_start());
    for section in SECTIONS {
        if let Some(rest) = body.strip_prefix(section) {
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            return format!("## {section}{rest}");
        }
    }

    let mut formatted = line.to_string();
    for label in METRIC_LABELS {
        formatted = formatted.replace(&format!("{label}:"), &format!("**{label}:**"));
    }
    formatted
}

/// Drops a leading `3. ` style list number.
fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    line[digits..]
        .strip_prefix('.')
        .map(str::trim_start)
        .unwrap_or(line)
}
