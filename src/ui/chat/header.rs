//! Application header with the theme toggle.

use crate::ui::{Theme, escape_html};

/// Render the page header.
///
/// The toggle is a plain GET form so it works without scripting: it reloads
/// the page with the other theme selected.
pub fn render_header(title: &str, theme: Theme) -> String {
    let title = escape_html(title);
    let next = theme.toggled().as_str();
    let label = theme.toggle_label();

    format!(
        r#"<header class="app-header">
    <h1>{title}</h1>
    <form method="get" action="/">
        <input type="hidden" name="theme" value="{next}">
        <button type="submit" class="theme-toggle">{label}</button>
    </form>
</header>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_offers_other_theme() {
        let html = render_header("AI Chat Demo", Theme::Light);
        assert!(html.contains("<h1>AI Chat Demo</h1>"));
        assert!(html.contains(r#"value="dark""#));
        assert!(html.contains(r#"class="theme-toggle">🌙 Dark</button>"#));

        let html = render_header("AI Chat Demo", Theme::Dark);
        assert!(html.contains(r#"value="light""#));
        assert!(html.contains("☀️ Light"));
    }
}
