use pulldown_cmark::{Event, Options, Parser, html};

/// Renders Markdown to HTML. Raw HTML in the input is escaped as text.
#[must_use]
pub fn markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

    let mut output = String::new();
    html::push_html(&mut output, parser);

    output
}
