use std::fmt::Write;

use crate::core::time::format_report_stamp;
use crate::services::grading::{GradeReport, RubricCategory, MAX_TOTAL};

const REPORT_STYLE: &str = r#"
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;background:#f9fafb;margin:0;padding:20px}
.card{max-width:820px;margin:40px auto;background:#fff;border-radius:28px;overflow:hidden;box-shadow:0 25px 70px rgba(0,0,0,.14)}
.header{background:linear-gradient(135deg,#1e3a8a,#1e40af);color:#e0e7ff;padding:70px 50px;text-align:center}
.header h1{margin:0;font-size:52px;font-weight:900;letter-spacing:-2px;color:#f0f9ff}
.header p{margin:16px 0 0;font-size:26px;color:#c7d2fe}
.header .score{font-size:110px;font-weight:900;margin:28px 0 0;letter-spacing:-8px;color:#fff}
.content{padding:60px 70px}
table{width:100%;border-collapse:collapse;font-size:21px}
tr{border-bottom:1px solid #e2e8f0}
td{padding:22px 0}
.label{font-weight:600;color:#1e293b}
.value{text-align:right;font-weight:700;color:#1d4ed8}
.feedback{margin-top:60px;padding:36px;background:#f0fdf4;border-left:8px solid #22c55e;border-radius:18px;font-size:19px;line-height:1.9;color:#166534}
.feedback.unevaluated{background:#fefce8;border-left-color:#f59e0b;color:#92400e}
.footer{text-align:center;margin-top:60px;color:#94a3b8;font-size:17px}
@media(max-width:640px){.header{padding:50px 30px}.header h1{font-size:38px}.header .score{font-size:80px}.content{padding:40px 30px}table{font-size:19px}td{padding:18px 0}}
"#;

/// Renders a standalone HTML grade report. Pure: no clock, network or disk.
pub(crate) fn render_html(report: &GradeReport) -> String {
    let mut rows = String::new();
    for category in RubricCategory::ALL {
        let _ = write!(
            rows,
            r#"<tr><td class="label">{}</td><td class="value">{}/{}</td></tr>"#,
            category.label(),
            report.scores().get(category),
            category.max()
        );
    }

    let feedback_class = if report.evaluated() { "feedback" } else { "feedback unevaluated" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>Grade Report for {name}</title>
<style>{style}</style></head>
<body>
<div class="card">
<div class="header">
<h1>Grade Report</h1>
<p>Student: <strong>{name}</strong></p>
<p>{email}</p>
<div class="score">{total}/{max_total}</div>
</div>
<div class="content">
<table>{rows}</table>
<div class="{feedback_class}"><strong>AI Feedback:</strong><br>{feedback}</div>
<div class="footer">Generated {stamp}</div>
</div>
</div>
</body></html>
"#,
        name = escape_html(report.name()),
        email = escape_html(report.email()),
        style = REPORT_STYLE,
        total = report.total(),
        max_total = MAX_TOTAL,
        rows = rows,
        feedback_class = feedback_class,
        feedback = multiline(report.feedback()),
        stamp = format_report_stamp(report.graded_at()),
    )
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn multiline(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::grading::{extract, fallback, normalize, FALLBACK_FEEDBACK};
    use time::macros::datetime;

    fn report(name: &str, email: &str, text: &str) -> GradeReport {
        GradeReport::new(name, email, normalize(&extract(text)), datetime!(2025-11-05 14:30 UTC))
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape_html("Zoë"), "Zoë");
    }

    #[test]
    fn renders_every_category_and_total() {
        let html = report(
            "Ada",
            "ada@example.com",
            r#"{"scores":{"sketch":20,"description":18,"dimensions":25,"scale":8,"compass":10,"differences":4},"feedback":"Nice."}"#,
        );
        let html = render_html(&html);

        assert!(html.contains("<div class=\"score\">85/100</div>"));
        assert!(html.contains("Sketch Quality</td><td class=\"value\">20/25"));
        assert!(html.contains("Differences Noted</td><td class=\"value\">4/5"));
        assert!(html.contains("Generated November 05, 2025 at 02:30 PM UTC"));
        assert!(html.contains("<div class=\"feedback\">"));
    }

    #[test]
    fn user_supplied_text_cannot_inject_markup() {
        let html = render_html(&report(
            "<img src=x onerror=alert(1)>",
            "\"><script>@evil.test",
            r#"{"scores":{},"feedback":"<b>bold</b>\nsecond line"}"#,
        ));

        assert!(!html.contains("<img src=x"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;<br>second line"));
    }

    #[test]
    fn fallback_report_is_flagged() {
        let report = GradeReport::new(
            "Ada",
            "ada@example.com",
            fallback(),
            datetime!(2025-11-05 14:30 UTC),
        );
        let html = render_html(&report);

        assert!(html.contains("0/100"));
        assert!(html.contains("feedback unevaluated"));
        assert!(html.contains(&escape_html(FALLBACK_FEEDBACK)));
    }

    #[test]
    fn rendering_is_deterministic() {
        let report = report("Ada", "ada@example.com", r#"{"scores":{"scale":5}}"#);
        assert_eq!(render_html(&report), render_html(&report));
    }
}
