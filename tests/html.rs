//! Tag-soup normalization tests
//!
//! Loose HTML goes through both normalization passes and the result is
//! walked and queried like any XHTML document.

use tagcursor::html::{force_wellformed, rewrite};
use tagcursor::{normalize_html, Parser, SyntaxErrorKind};

fn normalize(input: &str) -> String {
    String::from_utf8(normalize_html(input.as_bytes()).output).unwrap()
}

// ============================================================================
// REPAIR
// ============================================================================

#[test]
fn test_misnested_close() {
    assert_eq!(
        normalize("<div><p>Hello <b>World</b></div>"),
        "<div><p>Hello <b>World</b></p></div>"
    );
}

#[test]
fn test_void_and_raw_text_elements() {
    assert_eq!(normalize("<BR>"), "<br />");
    assert_eq!(
        normalize("<script>if(a<b){}</script>"),
        "<script><![CDATA[if(a<b){}]]></script>"
    );
}

#[test]
fn test_orphan_and_extra_closers() {
    assert_eq!(normalize("<div></div></div></div>"), "<div></div>");
    assert_eq!(normalize("</div>"), "");
}

#[test]
fn test_unclosed_tags() {
    assert_eq!(normalize("<div><p><span>text"), "<div><p><span>text</span></p></div>");
}

#[test]
fn test_diagnostics_reported() {
    let repair = normalize_html(b"<ul><li>one</ul>");
    assert!(repair.repaired);
    assert_eq!(repair.output, b"<ul><li>one</li></ul>");
    assert_eq!(repair.diagnostics.len(), 1);
    assert_eq!(repair.diagnostics[0].kind, SyntaxErrorKind::HtmlTagClosureMismatch);
    assert_eq!(repair.diagnostics[0].code(), 103);
}

#[test]
fn test_empty_and_text_only() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("   \t\n "), "   \t\n ");
    assert_eq!(normalize("1 < 2 & 3 > 2"), "1 &lt; 2 & 3 &gt; 2");
}

#[test]
fn test_control_bytes_stripped() {
    assert_eq!(normalize("<p>a\u{7}b\u{7f}c</p>"), "<p>abc</p>");
}

#[test]
fn test_repair_is_idempotent() {
    for input in [
        "<html><body><p>one<p>two</body>",
        "<div><span></div></span>",
        "<p>a</p><p>b</p>text",
        "<table><tr><td>1<td>2</tr></table>",
        "<a href=x>link<img src=y.png>",
        "<!-- unterminated",
    ] {
        let once = normalize_html(input.as_bytes()).output;
        let again = force_wellformed(&once);
        assert!(!again.repaired, "second pass changed {input:?}");
        assert_eq!(again.output, once);
    }
}

#[test]
fn test_rewrite_alone_keeps_nesting() {
    assert_eq!(rewrite(b"<B><I>x</B></I>"), b"<b><i>x</b></i>");
}

// ============================================================================
// LOADING
// ============================================================================

const SOUP: &str = r#"<!DOCTYPE html>
<HTML>
<HEAD><TITLE>Soup</TITLE>
<META charset=utf-8>
</HEAD>
<BODY>
<DIV Class="nav"><A HREF="http">one</A><A href=/two>two</DIV>
<P>Tom &amp; Jerry<BR>
<SCRIPT>var x = "<b>";</SCRIPT>
</BODY>
</HTML>"#;

#[test]
fn test_load_html_and_query() {
    let mut p = Parser::new(b"");
    assert!(p.load_html(SOUP.as_bytes()));
    assert!(!p.is_borrowed());

    let links = p.select_all("/html/body//a[@href]").unwrap();
    let texts: Vec<String> = links
        .iter()
        .map(|n| p.view(n).inner_text().unwrap())
        .collect();
    assert_eq!(texts, vec!["one", "two"]);

    let title = p.select_all("//title").unwrap();
    assert_eq!(p.view(&title[0]).inner_text().unwrap(), "Soup");

    let script = p.select_all("//script").unwrap();
    assert_eq!(p.view(&script[0]).cdata().unwrap(), Some(&b"var x = \"<b>\";"[..]));
}

#[test]
fn test_html_constructor_walks_whole_document() {
    let mut p = Parser::html(SOUP.as_bytes());
    let mut count = 0;
    while p.enter_succeeding_node() {
        count += 1;
    }
    assert_eq!(p.last_error(), None);
    // html head title meta body div a a p br script
    assert_eq!(count, 11);
}
