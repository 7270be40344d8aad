use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Visible text of an HTML document: script and style content dropped, text nodes
/// joined by single spaces, whitespace collapsed, lowercased.
///
/// Never fails. Garbage in gives whatever text the lenient parser recovers, possibly "".
pub fn extract_text(raw: &[u8]) -> String {
    let Some(dom) = get_dom(raw) else {
        return String::new();
    };
    let mut chunks = Vec::new();
    walk_html(&dom.document, &mut chunks);
    chunks.join(" ").to_lowercase()
}

fn get_dom(raw: &[u8]) -> Option<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut std::io::Cursor::new(raw))
        .ok()
}

fn is_hidden(local: &LocalName) -> bool {
    matches!(&**local, "script" | "style")
}

fn walk_html(handle: &Handle, out: &mut Vec<String>) {
    match &handle.data {
        NodeData::Text { contents } => {
            let s = contents.borrow();
            let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
            if !normalized.is_empty() {
                out.push(normalized);
            }
        }
        NodeData::Element { name, .. } if is_hidden(&name.local) => {}
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
        _ => {
            for child in handle.children.borrow().iter() {
                walk_html(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_excluded_and_lowercased() {
        let html = b"<html><script>ignore</script><body>Visible Text</body></html>";
        assert_eq!(extract_text(html), "visible text");
    }

    #[test]
    fn test_style_excluded() {
        let html = b"<style>body { color: red; }</style><p>Content</p>";
        assert_eq!(extract_text(html), "content");
    }

    #[test]
    fn test_text_nodes_joined_with_single_space() {
        let html = b"<div><p>Hello</p><p>World</p></div>";
        assert_eq!(extract_text(html), "hello world");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_text(b""), "");
    }
}
