//! Default markdown renderer.
//!
//! Parses GFM into mdast and maps it onto markup, then runs the result through the
//! sanitizer. Raw HTML in the source is shown as literal text, never interpreted.

use markdown::mdast::{self, AlignKind};
use markdown::{to_mdast, ParseOptions};

use crate::core::markup::MarkupNode;
use crate::error::RenderError;
use crate::render::sanitize::sanitize;
use crate::render::{Renderer, SafeHtml};

/// GFM renderer; `:shortcode:` emoji in text nodes are expanded.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    fn text_node(&self, value: &str) -> MarkupNode {
        MarkupNode::text(expand_shortcodes(value))
    }

    fn push_children(&self, children: &[mdast::Node], out: &mut Vec<MarkupNode>) {
        for child in children {
            self.push_node(child, out);
        }
    }

    fn children_of(&self, children: &[mdast::Node]) -> Vec<MarkupNode> {
        let mut out = Vec::new();
        self.push_children(children, &mut out);
        out
    }

    fn push_node(&self, node: &mdast::Node, out: &mut Vec<MarkupNode>) {
        match node {
            mdast::Node::Root(root) => self.push_children(&root.children, out),
            mdast::Node::Paragraph(paragraph) => {
                out.push(MarkupNode::element("p", [], self.children_of(&paragraph.children)));
            }
            mdast::Node::Heading(heading) => {
                let tag = format!("h{}", heading.depth.clamp(1, 6));
                out.push(MarkupNode::element(&tag, [], self.children_of(&heading.children)));
            }
            mdast::Node::Text(text) => out.push(self.text_node(&text.value)),
            mdast::Node::Strong(strong) => {
                out.push(MarkupNode::element("strong", [], self.children_of(&strong.children)));
            }
            mdast::Node::Emphasis(emphasis) => {
                out.push(MarkupNode::element("em", [], self.children_of(&emphasis.children)));
            }
            mdast::Node::Delete(delete) => {
                out.push(MarkupNode::element("del", [], self.children_of(&delete.children)));
            }
            mdast::Node::InlineCode(code) => {
                out.push(MarkupNode::element("code", [], vec![MarkupNode::text(code.value.clone())]));
            }
            mdast::Node::Code(code) => {
                let class = code
                    .lang
                    .as_deref()
                    .filter(|lang| is_language_token(lang))
                    .map(|lang| format!("language-{lang}"));
                let attrs: Vec<(&str, &str)> = class
                    .as_deref()
                    .map(|class| vec![("class", class)])
                    .unwrap_or_default();
                let code = MarkupNode::element("code", attrs, vec![MarkupNode::text(code.value.clone())]);
                out.push(MarkupNode::element("pre", [], vec![code]));
            }
            mdast::Node::InlineMath(math) => {
                out.push(MarkupNode::element(
                    "code",
                    [("class", "math-inline")],
                    vec![MarkupNode::text(math.value.clone())],
                ));
            }
            mdast::Node::Math(math) => {
                let code = MarkupNode::element(
                    "code",
                    [("class", "math-display")],
                    vec![MarkupNode::text(math.value.clone())],
                );
                out.push(MarkupNode::element("pre", [], vec![code]));
            }
            mdast::Node::Link(link) => {
                let mut attrs = vec![("href", link.url.as_str())];
                if let Some(title) = link.title.as_deref() {
                    attrs.push(("title", title));
                }
                out.push(MarkupNode::element("a", attrs, self.children_of(&link.children)));
            }
            mdast::Node::Image(image) => {
                let mut attrs = vec![("src", image.url.as_str()), ("alt", image.alt.as_str())];
                if let Some(title) = image.title.as_deref() {
                    attrs.push(("title", title));
                }
                out.push(MarkupNode::element("img", attrs, Vec::new()));
            }
            mdast::Node::List(list) => {
                let tag = if list.ordered { "ol" } else { "ul" };
                let start = list.start.filter(|start| list.ordered && *start != 1).map(|start| start.to_string());
                let attrs: Vec<(&str, &str)> = start
                    .as_deref()
                    .map(|start| vec![("start", start)])
                    .unwrap_or_default();
                out.push(MarkupNode::element(tag, attrs, self.children_of(&list.children)));
            }
            mdast::Node::ListItem(item) => {
                let mut children = Vec::new();
                if let Some(checked) = item.checked {
                    let mut attrs = vec![("type", "checkbox")];
                    if checked {
                        attrs.push(("checked", ""));
                    }
                    children.push(MarkupNode::element("input", attrs, Vec::new()));
                }
                for child in &item.children {
                    match child {
                        // Tight list items render their paragraphs inline.
                        mdast::Node::Paragraph(paragraph) if !item.spread => {
                            self.push_children(&paragraph.children, &mut children);
                        }
                        other => self.push_node(other, &mut children),
                    }
                }
                out.push(MarkupNode::element("li", [], children));
            }
            mdast::Node::Blockquote(quote) => {
                out.push(MarkupNode::element("blockquote", [], self.children_of(&quote.children)));
            }
            mdast::Node::ThematicBreak(_) => out.push(MarkupNode::element("hr", [], Vec::new())),
            mdast::Node::Break(_) => out.push(MarkupNode::element("br", [], Vec::new())),
            mdast::Node::Html(html) => out.push(MarkupNode::text(html.value.clone())),
            mdast::Node::Table(table) => out.push(self.table(table)),
            mdast::Node::FootnoteReference(reference) => {
                out.push(MarkupNode::element(
                    "sup",
                    [],
                    vec![MarkupNode::text(format!("[{}]", reference.identifier))],
                ));
            }
            mdast::Node::FootnoteDefinition(definition) => {
                let mut children = vec![MarkupNode::text(format!("[{}] ", definition.identifier))];
                self.push_children(&definition.children, &mut children);
                out.push(MarkupNode::element("div", [("class", "footnote")], children));
            }
            mdast::Node::Definition(_) | mdast::Node::Yaml(_) | mdast::Node::Toml(_) => {}
            other => {
                if let Some(children) = other.children() {
                    self.push_children(children, out);
                } else {
                    let text = other.to_string();
                    if !text.is_empty() {
                        out.push(self.text_node(&text));
                    }
                }
            }
        }
    }

    fn table(&self, table: &mdast::Table) -> MarkupNode {
        let mut head = Vec::new();
        let mut body = Vec::new();
        for (row_index, row) in table.children.iter().enumerate() {
            let mdast::Node::TableRow(row) = row else {
                continue;
            };
            let cell_tag = if row_index == 0 { "th" } else { "td" };
            let cells = row
                .children
                .iter()
                .enumerate()
                .map(|(column, cell)| {
                    let children = match cell {
                        mdast::Node::TableCell(cell) => self.children_of(&cell.children),
                        other => self.children_of(std::slice::from_ref(other)),
                    };
                    let attrs: Vec<(&str, &str)> = align_name(table.align.get(column))
                        .map(|align| vec![("align", align)])
                        .unwrap_or_default();
                    MarkupNode::element(cell_tag, attrs, children)
                })
                .collect();
            let row = MarkupNode::element("tr", [], cells);
            if row_index == 0 {
                head.push(row);
            } else {
                body.push(row);
            }
        }

        let mut sections = vec![MarkupNode::element("thead", [], head)];
        if !body.is_empty() {
            sections.push(MarkupNode::element("tbody", [], body));
        }
        MarkupNode::element("table", [], sections)
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, raw: &str) -> Result<SafeHtml, RenderError> {
        if raw.trim().is_empty() {
            return Ok(SafeHtml::default());
        }
        let root = match to_mdast(raw, &ParseOptions::gfm()) {
            Ok(root) => root,
            Err(message) => {
                tracing::debug!(%message, "markdown parse failed; rendering escaped text");
                return Ok(SafeHtml::escaped_text(raw));
            }
        };

        let mut nodes = Vec::new();
        self.push_node(&root, &mut nodes);
        Ok(sanitize(&nodes))
    }
}

fn align_name(align: Option<&AlignKind>) -> Option<&'static str> {
    match align? {
        AlignKind::Left => Some("left"),
        AlignKind::Right => Some("right"),
        AlignKind::Center => Some("center"),
        AlignKind::None => None,
    }
}

fn is_language_token(lang: &str) -> bool {
    !lang.is_empty()
        && lang
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+' | '#' | '.'))
}

/// Replaces `:shortcode:` sequences that name a known emoji.
pub fn expand_shortcodes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(':') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let candidate_len = after
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-')))
            .unwrap_or(after.len());
        let candidate = &after[..candidate_len];
        let closes = after[candidate_len..].starts_with(':');
        match emojis::get_by_shortcode(candidate).filter(|_| closes && !candidate.is_empty()) {
            Some(emoji) => {
                out.push_str(emoji.as_str());
                rest = &after[candidate_len + 1..];
            }
            None => {
                out.push(':');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::{expand_shortcodes, MarkdownRenderer};
    use crate::render::Renderer;

    fn html(input: &str) -> String {
        MarkdownRenderer::new()
            .render(input)
            .expect("default renderer is total")
            .to_html()
    }

    #[test]
    fn inline_styles_map_to_elements() {
        assert_eq!(
            html("**bold** and `code`"),
            "<p><strong>bold</strong> and <code>code</code></p>"
        );
    }

    #[test]
    fn headings_and_code_blocks() {
        assert_eq!(html("# Title"), "<h1>Title</h1>");
        assert_eq!(
            html("```rust\nfn main() {}\n```"),
            "<pre><code class=\"language-rust\">fn main() {}</code></pre>"
        );
    }

    #[test]
    fn raw_html_is_shown_not_executed() {
        let rendered = html("<script>alert(1)</script>");
        assert!(!rendered.contains("<script"));
        assert!(rendered.contains("&lt;script&gt;"));
    }

    #[test]
    fn dangerous_links_lose_their_target() {
        assert_eq!(html("[x](javascript:alert(1))"), "<p><a>x</a></p>");
    }

    #[test]
    fn tight_lists_and_tasks() {
        assert_eq!(
            html("- [x] done\n- todo"),
            "<ul><li><input checked=\"\" disabled=\"\" type=\"checkbox\">done</li><li>todo</li></ul>"
        );
    }

    #[test]
    fn blank_input_renders_nothing() {
        assert!(MarkdownRenderer::new().render("  \n").expect("total").is_empty());
    }

    #[test]
    fn shortcodes_expand_only_when_known() {
        assert_eq!(expand_shortcodes(":rocket: launch"), "🚀 launch");
        assert_eq!(expand_shortcodes("10:30 :not_an_emoji_name:"), "10:30 :not_an_emoji_name:");
    }

    #[test]
    fn rendered_text_expands_shortcodes() {
        assert_eq!(html("ship it :rocket:"), "<p>ship it 🚀</p>");
    }
}
