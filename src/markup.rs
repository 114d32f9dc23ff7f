//! HTML view of a composed [`Fragment`], for embedding in an admin preview.

use crate::compose::{BlockRole, Fragment, Inline};

/// Render the fragment as escaped `<p>` / `<strong>` markup.
pub fn to_html(fragment: &Fragment) -> String {
    let mut out = String::new();
    for block in &fragment.blocks {
        out.push_str(&format!("<p class=\"{}\">", role_class(block.role)));
        for inline in &block.inlines {
            match inline {
                Inline::Text(s) => out.push_str(&escape(s)),
                Inline::Strong(s) => {
                    out.push_str("<strong>");
                    out.push_str(&escape(s));
                    out.push_str("</strong>");
                }
            }
        }
        out.push_str("</p>\n");
    }
    out
}

fn role_class(role: BlockRole) -> &'static str {
    match role {
        BlockRole::Body => "certificate-body",
        BlockRole::Coauthors => "certificate-coauthors",
        BlockRole::Metadata => "certificate-metadata",
        BlockRole::Closing => "certificate-closing",
        BlockRole::Custom => "certificate-custom",
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
