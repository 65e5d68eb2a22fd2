//! Parser for the lightweight markup used in assistant replies.
//!
//! Recognised syntax: `**strong**`, `*emphasis*`, `_underline_`, `` `code` ``,
//! fenced ```` ``` ```` blocks, and lines starting with `* ` as list items.
//! Anything that does not close properly stays literal text.

/// One piece of formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Strong(Vec<Node>),
    Emphasis(Vec<Node>),
    Underline(Vec<Node>),
    InlineCode(String),
    CodeBlock(String),
    ListItem(Vec<Node>),
    LineBreak,
}

const FENCE: &str = "```";

pub fn parse(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(FENCE) {
        let body_start = start + FENCE.len();
        let Some(len) = rest[body_start..].find(FENCE) else {
            break;
        };
        parse_lines(&rest[..start], &mut nodes);
        nodes.push(Node::CodeBlock(code_body(&rest[body_start..body_start + len])));
        rest = &rest[body_start + len + FENCE.len()..];
    }
    parse_lines(rest, &mut nodes);

    nodes
}

/// Drops an info string such as `rust` from the first fence line.
fn code_body(raw: &str) -> String {
    let body = match raw.split_once('\n') {
        Some((first, remainder)) if is_info_string(first) => remainder,
        _ => raw,
    };
    body.trim_end_matches(['\n', '\r']).to_string()
}

fn is_info_string(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_alphanumeric() || "+-#_.".contains(c))
}

fn parse_lines(segment: &str, nodes: &mut Vec<Node>) {
    if segment.is_empty() {
        return;
    }

    let mut previous_was_item = false;
    for (index, raw_line) in segment.split('\n').enumerate() {
        let line = raw_line.trim_end_matches('\r');
        let item = line.strip_prefix("* ");

        // list items sit on their own lines, so the newline around them is implied
        if index > 0 && !previous_was_item && item.is_none() {
            nodes.push(Node::LineBreak);
        }

        match item {
            Some(content) => nodes.push(Node::ListItem(parse_inline(content))),
            None => nodes.extend(parse_inline(line)),
        }
        previous_was_item = item.is_some();
    }
}

pub fn parse_inline(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut plain = String::new();
    let mut index = 0;

    while index < text.len() {
        let rest = &text[index..];
        let previous = text[..index].chars().next_back();

        if let Some((node, consumed)) = match_span(rest, previous) {
            if !plain.is_empty() {
                nodes.push(Node::Text(std::mem::take(&mut plain)));
            }
            nodes.push(node);
            index += consumed;
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        plain.push(ch);
        index += ch.len_utf8();
    }

    if !plain.is_empty() {
        nodes.push(Node::Text(plain));
    }
    nodes
}

fn match_span(rest: &str, previous: Option<char>) -> Option<(Node, usize)> {
    if let Some(inner) = rest.strip_prefix('`') {
        let end = inner.find('`').filter(|&end| end > 0)?;
        return Some((Node::InlineCode(inner[..end].to_string()), end + 2));
    }

    // a `***` run opens strong and emphasis together
    if let Some(inner) = rest.strip_prefix("***") {
        if let Some(end) = inner.find("***").filter(|&end| is_tight(&inner[..end])) {
            let emphasis = Node::Emphasis(parse_inline(&inner[..end]));
            return Some((Node::Strong(vec![emphasis]), end + 6));
        }
    }

    if let Some(inner) = rest.strip_prefix("**") {
        let end = inner.find("**").filter(|&end| is_tight(&inner[..end]))?;
        return Some((Node::Strong(parse_inline(&inner[..end])), end + 4));
    }

    if let Some(inner) = rest.strip_prefix('*') {
        let end = find_single_star(inner).filter(|&end| is_tight(&inner[..end]))?;
        return Some((Node::Emphasis(parse_inline(&inner[..end])), end + 2));
    }

    if let Some(inner) = rest.strip_prefix('_') {
        // snake_case identifiers are not underlined
        if previous.is_some_and(char::is_alphanumeric) {
            return None;
        }
        let end = find_closing_underscore(inner).filter(|&end| is_tight(&inner[..end]))?;
        return Some((Node::Underline(parse_inline(&inner[..end])), end + 2));
    }

    None
}

/// Non-empty and not padded with whitespace.
fn is_tight(inner: &str) -> bool {
    !inner.is_empty() && inner.trim() == inner
}

/// Position of the next `*` that is not half of a `**` pair.
fn find_single_star(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'*' {
            if bytes.get(index + 1) == Some(&b'*') {
                index += 2;
                continue;
            }
            return Some(index);
        }
        index += 1;
    }
    None
}

fn find_closing_underscore(text: &str) -> Option<usize> {
    text.char_indices()
        .filter(|&(_, c)| c == '_')
        .map(|(index, _)| index)
        .find(|&index| {
            let next = text[index + 1..].chars().next();
            !next.is_some_and(char::is_alphanumeric)
        })
}
