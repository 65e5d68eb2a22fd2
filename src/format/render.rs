use super::parser::Node;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders parsed nodes as HTML. Consecutive list items share one `<ul>`.
pub fn render_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut in_list = false;

    for node in nodes {
        let is_item = matches!(node, Node::ListItem(_));
        if is_item && !in_list {
            out.push_str("<ul>");
        } else if !is_item && in_list {
            out.push_str("</ul>");
        }
        in_list = is_item;
        write_html(node, &mut out);
    }
    if in_list {
        out.push_str("</ul>");
    }

    out
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_html(text)),
        Node::Strong(children) => wrap_html("strong", children, out),
        Node::Emphasis(children) => wrap_html("em", children, out),
        Node::Underline(children) => wrap_html("u", children, out),
        Node::ListItem(children) => wrap_html("li", children, out),
        Node::InlineCode(code) => {
            out.push_str("<code>");
            out.push_str(&escape_html(code));
            out.push_str("</code>");
        }
        Node::CodeBlock(code) => {
            out.push_str("<pre><code>");
            out.push_str(&escape_html(code));
            out.push_str("</code></pre>");
        }
        Node::LineBreak => out.push_str("<br>"),
    }
}

fn wrap_html(tag: &str, children: &[Node], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for child in children {
        write_html(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

const BOLD: (&str, &str) = ("\x1b[1m", "\x1b[22m");
const ITALIC: (&str, &str) = ("\x1b[3m", "\x1b[23m");
const UNDERLINE: (&str, &str) = ("\x1b[4m", "\x1b[24m");
const CODE: (&str, &str) = ("\x1b[36m", "\x1b[39m");

/// Renders parsed nodes for a terminal using ANSI SGR sequences.
pub fn render_ansi(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_ansi(node, &mut out);
    }
    out
}

fn write_ansi(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Strong(children) => wrap_ansi(BOLD, children, out),
        Node::Emphasis(children) => wrap_ansi(ITALIC, children, out),
        Node::Underline(children) => wrap_ansi(UNDERLINE, children, out),
        Node::InlineCode(code) => {
            out.push_str(CODE.0);
            out.push_str(code);
            out.push_str(CODE.1);
        }
        Node::CodeBlock(code) => {
            start_line(out);
            for line in code.lines() {
                out.push_str("    ");
                out.push_str(CODE.0);
                out.push_str(line);
                out.push_str(CODE.1);
                out.push('\n');
            }
        }
        Node::ListItem(children) => {
            start_line(out);
            out.push_str("  • ");
            for child in children {
                write_ansi(child, out);
            }
            out.push('\n');
        }
        Node::LineBreak => out.push('\n'),
    }
}

fn start_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn wrap_ansi((open, close): (&str, &str), children: &[Node], out: &mut String) {
    out.push_str(open);
    for child in children {
        write_ansi(child, out);
    }
    out.push_str(close);
}
