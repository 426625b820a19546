// src/extract/markdown.rs
//! Lightweight markdown → HTML for feed readers.
//!
//! A fixed chain of regex substitutions, not a parser. Nested or malformed
//! markdown may render imperfectly.

use once_cell::sync::Lazy;
use regex::Regex;

struct Rule {
    re: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        re: Regex::new(pattern).expect("markdown rule regex"),
        replacement,
    }
}

// Order matters: headings before emphasis, bold before italic, list items before the list wrapper.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(r"(?m)^### (.+)$", "<h3>${1}</h3>"),
        rule(r"(?m)^## (.+)$", "<h2>${1}</h2>"),
        rule(r"(?m)^# (.+)$", "<h1>${1}</h1>"),
        rule(r"\*\*(.+?)\*\*", "<strong>${1}</strong>"),
        rule(r"\*(.+?)\*", "<em>${1}</em>"),
        rule(r"\[(.+?)\]\((.+?)\)", r#"<a href="${2}">${1}</a>"#),
        rule(r"(?m)^- (.+)$", "<li>${1}</li>"),
        rule(r"(<li>.+</li>\n)+", "<ul>${0}</ul>"),
    ]
});

pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = markdown.to_string();
    for r in RULES.iter() {
        html = r.re.replace_all(&html, r.replacement).into_owned();
    }

    html = html.replace("\n\n", "</p><p>").replace('\n', "<br/>");

    if !html.starts_with('<') {
        html = format!("<p>{html}</p>");
    }
    html
}
