//! Query selection tests: XPath subset, CSS paths and parallel evaluation

use tagcursor::{select_parallel, Error, Parser, QueryErrorKind, SyntaxErrorKind};

const PAGE: &str = r#"<html>
  <head><title>Links</title></head>
  <body>
    <div id="nav" class="menu main">
      <a href="http" class="btn">Home</a>
      <a href="/local" class="btn-primary" title="a &amp; b">Local</a>
    </div>
    <p>
      <a href="ftp http" class="primary-btn">Mirror</a>
      <a href="https://example.com/">Secure</a>
    </p>
    <a href="mailto:x@example.com">Mail</a>
  </body>
</html>"#;

fn texts(p: &mut Parser<'_>, query: &str) -> Vec<String> {
    let nodes = p.select_all(query).unwrap();
    nodes.iter().map(|n| p.view(n).inner_text().unwrap()).collect()
}

fn css_texts(p: &mut Parser<'_>, css: &str) -> Vec<String> {
    let nodes = p.select_all_css(css).unwrap();
    nodes.iter().map(|n| p.view(n).inner_text().unwrap()).collect()
}

fn body(p: &mut Parser<'_>) {
    assert!(p.enter_first_child(Some("html")));
    assert!(p.enter_first_child(Some("body")));
}

// ============================================================================
// PATHS
// ============================================================================

#[test]
fn test_descendants_with_whole_word() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(texts(&mut p, "/html/body//a[@href^='http']"), vec!["Home", "Mirror"]);
}

#[test]
fn test_all_descendants_in_document_order() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(
        texts(&mut p, "//a"),
        vec!["Home", "Local", "Mirror", "Secure", "Mail"]
    );
}

#[test]
fn test_exact_levels() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(texts(&mut p, "/html/body/a"), vec!["Mail"]);
    assert_eq!(texts(&mut p, "/html/*/title"), vec!["Links"]);
    assert!(texts(&mut p, "/body/a").is_empty());
}

#[test]
fn test_attribute_operators() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(texts(&mut p, "//a[@class:='btn']"), vec!["Home", "Local"]);
    assert_eq!(texts(&mut p, "//a[@class~='btn']"), vec!["Home", "Local", "Mirror"]);
    assert_eq!(texts(&mut p, "//a[@class^='btn']"), vec!["Home"]);
    assert_eq!(texts(&mut p, "//a[@class?='btn']"), vec!["Home", "Mirror"]);
    assert_eq!(texts(&mut p, "//a[@class!='btn']"), vec!["Local", "Mirror"]);
    assert_eq!(texts(&mut p, "//a[@class]").len(), 3);
    assert_eq!(texts(&mut p, "//a[@title='a & b']"), vec!["Local"]);
}

#[test]
fn test_ordinals_count_per_parent() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(texts(&mut p, "/html/body/div/a[1]"), vec!["Local"]);
    assert_eq!(texts(&mut p, "//a[0]"), vec!["Home", "Mirror", "Mail"]);
    assert!(texts(&mut p, "/html/body/div/a[2]").is_empty());
}

#[test]
fn test_ordinal_selects_once() {
    let mut p = Parser::new(b"<r><a/><a/><a/></r>");
    p.select("/r/a[1]").unwrap();
    let mut hits = Vec::new();
    while p.next_match() {
        hits.push(p.current().unwrap().outer_start);
    }
    assert_eq!(hits, vec![7]);
}

// ============================================================================
// RELATIVE SELECTION
// ============================================================================

#[test]
fn test_relative_selection_restores_cursor() {
    let mut p = Parser::new(PAGE.as_bytes());
    body(&mut p);
    assert!(p.enter_first_child(Some("div")));
    assert_eq!(texts(&mut p, "a"), vec!["Home", "Local"]);
    assert_eq!(p.node_name(), Some("div"));
    assert_eq!(texts(&mut p, "../p/a"), vec!["Mirror", "Secure"]);
    assert_eq!(p.node_name(), Some("div"));
    assert_eq!(p.depth(), 3);
}

#[test]
fn test_stepping_through_a_selection() {
    let mut p = Parser::new(PAGE.as_bytes());
    p.select("//title").unwrap();
    assert!(p.selection().is_some());
    assert!(p.enter_succeeding_node());
    assert_eq!(p.node_name(), Some("title"));
    assert_eq!(p.inner_text().unwrap(), "Links");
    assert!(!p.enter_succeeding_node());
    assert!(p.selection().is_none());
    assert_eq!(p.depth(), 0);
}

#[test]
fn test_clear_selection() {
    let mut p = Parser::new(PAGE.as_bytes());
    body(&mut p);
    p.select("p/a").unwrap();
    assert!(p.next_match());
    assert_eq!(p.depth(), 4);
    p.clear_selection();
    assert_eq!(p.node_name(), Some("body"));
    assert!(p.selection().is_none());
}

// ============================================================================
// CSS
// ============================================================================

#[test]
fn test_css_paths() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(css_texts(&mut p, "a.btn"), vec!["Home", "Local"]);
    assert_eq!(css_texts(&mut p, "a~btn"), vec!["Home"]);

    body(&mut p);
    assert_eq!(css_texts(&mut p, "div.menu a"), vec!["Home", "Local"]);
    assert_eq!(css_texts(&mut p, "#nav > a"), vec!["Home", "Local"]);
    assert_eq!(css_texts(&mut p, "p > a[@href~='example']"), vec!["Secure"]);
}

#[test]
fn test_css_paths_from_document() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(css_texts(&mut p, "div a"), vec!["Home", "Local"]);
    assert_eq!(css_texts(&mut p, "body > p > a"), vec!["Mirror", "Secure"]);
    assert_eq!(css_texts(&mut p, "html a").len(), 5);
    assert!(css_texts(&mut p, "head > a").is_empty());
    assert_eq!(p.depth(), 0);

    let mut p = Parser::new(b"<html><body><div><p><a>1</a></p></div></body></html>");
    assert_eq!(css_texts(&mut p, "div > p > a"), vec!["1"]);
    assert_eq!(css_texts(&mut p, "body > div a"), vec!["1"]);
}

#[test]
fn test_css_nested_matches() {
    let mut p = Parser::new(b"<r><div><div><a>x</a></div><a>y</a></div><a>z</a></r>");
    assert_eq!(css_texts(&mut p, "div > a"), vec!["x", "y"]);
    assert_eq!(css_texts(&mut p, "div a"), vec!["x", "y"]);
    assert_eq!(css_texts(&mut p, "r > div > div > a"), vec!["x"]);
}

// ============================================================================
// ERRORS
// ============================================================================

fn query_error(p: &mut Parser<'_>, query: &str) -> QueryErrorKind {
    match p.select(query) {
        Err(Error::Query(e)) => e.kind,
        other => panic!("expected a query error for {query}, got {other:?}"),
    }
}

#[test]
fn test_query_errors() {
    let mut p = Parser::new(PAGE.as_bytes());
    assert_eq!(query_error(&mut p, "/html//body/a"), QueryErrorKind::DescendantNotLast);
    assert_eq!(query_error(&mut p, "/a[@x='1]"), QueryErrorKind::QuoteMismatch);
    assert_eq!(query_error(&mut p, "/a[@x"), QueryErrorKind::PredicateClosure);
    assert_eq!(query_error(&mut p, "/html/"), QueryErrorKind::NodeNameMissing);
    assert_eq!(query_error(&mut p, "../a"), QueryErrorKind::AscendBeyondRoot);
    assert!(p.selection().is_none());
}

#[test]
fn test_css_errors() {
    let mut p = Parser::new(PAGE.as_bytes());
    match p.select_css("a + b") {
        Err(Error::Syntax(e)) => assert_eq!(e.kind, SyntaxErrorKind::UnsupportedCssOperator),
        other => panic!("unexpected {other:?}"),
    }
    match p.select_all_css("body div a") {
        Err(Error::Syntax(e)) => {
            assert_eq!(e.kind, SyntaxErrorKind::UnsupportedCssOperator);
            assert_eq!(e.offset, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(p.selection().is_none());
}

// ============================================================================
// PARALLEL
// ============================================================================

#[test]
fn test_parallel_queries() {
    let p = Parser::new(PAGE.as_bytes());
    let results = select_parallel(&p, &["//a", "/html/head/title", "//a[@href^='http']", "/x//"]);
    assert_eq!(results[0].as_ref().unwrap().len(), 5);
    assert_eq!(results[1].as_ref().unwrap().len(), 1);
    assert_eq!(results[2].as_ref().unwrap().len(), 2);
    assert!(results[3].is_err());
}
