//! Well-formedness repair
//!
//! Second HTML pass. Walks the markup with an explicit stack of open
//! elements and records every fix as an edit against the input; the edits
//! are applied in a single compaction pass at the end. Running the repair
//! on its own output changes nothing.

use super::Repair;
use crate::core::tokenizer::{read_markup, TokenKind};
use crate::error::{SyntaxError, SyntaxErrorKind};
use memchr::{memchr, memchr2};

const HTML_ROOT: &[u8] = b"<html xmlns=\"http://www.w3.org/1999/xhtml\">";

#[derive(Debug)]
enum Edit {
    Insert { at: usize, text: Vec<u8> },
    Drop { start: usize, end: usize },
}

impl Edit {
    /// Inserts at a position go before drops starting there
    fn sort_key(&self) -> (usize, u8) {
        match self {
            Edit::Insert { at, .. } => (*at, 0),
            Edit::Drop { start, .. } => (*start, 1),
        }
    }
}

#[derive(Default)]
struct Edits {
    edits: Vec<Edit>,
    diagnostics: Vec<SyntaxError>,
}

impl Edits {
    fn insert(&mut self, at: usize, text: impl Into<Vec<u8>>, kind: SyntaxErrorKind) {
        self.edits.push(Edit::Insert { at, text: text.into() });
        self.diagnostics.push(SyntaxError::new(kind, at));
    }

    fn drop_range(&mut self, start: usize, end: usize, kind: SyntaxErrorKind) {
        self.edits.push(Edit::Drop { start, end });
        self.diagnostics.push(SyntaxError::new(kind, start));
    }

    fn close(&mut self, at: usize, name: &[u8], kind: SyntaxErrorKind) {
        let mut text = Vec::with_capacity(name.len() + 3);
        text.extend_from_slice(b"</");
        text.extend_from_slice(name);
        text.push(b'>');
        self.insert(at, text, kind);
    }

    fn apply(mut self, input: &[u8]) -> Repair {
        if self.edits.is_empty() {
            return Repair {
                output: input.to_vec(),
                repaired: false,
                diagnostics: self.diagnostics,
            };
        }

        // Stable sort keeps recording order among equal keys
        self.edits.sort_by_key(Edit::sort_key);
        let extra: usize = self
            .edits
            .iter()
            .map(|e| match e {
                Edit::Insert { text, .. } => text.len(),
                Edit::Drop { .. } => 0,
            })
            .sum();

        let mut output = Vec::with_capacity(input.len() + extra);
        let mut cursor = 0;
        for edit in &self.edits {
            match edit {
                Edit::Insert { at, text } => {
                    if *at > cursor {
                        output.extend_from_slice(&input[cursor..*at]);
                        cursor = *at;
                    }
                    output.extend_from_slice(text);
                }
                Edit::Drop { start, end } => {
                    if *start > cursor {
                        output.extend_from_slice(&input[cursor..*start]);
                    }
                    cursor = cursor.max(*end);
                }
            }
        }
        if cursor < input.len() {
            output.extend_from_slice(&input[cursor..]);
        }

        Repair {
            output,
            repaired: true,
            diagnostics: self.diagnostics,
        }
    }
}

/// First top-level element
struct Root {
    start: usize,
    is_html: bool,
    /// Range of its close tag once seen
    closer: Option<(usize, usize)>,
}

/// Repair nesting and termination of XHTML-shaped markup
pub fn force_wellformed(input: &[u8]) -> Repair {
    let mut edits = Edits::default();
    let mut stack: Vec<&[u8]> = Vec::new();
    let mut root: Option<Root> = None;
    let mut pos = 0;

    while let Some(lt) = memchr(b'<', &input[pos..]).map(|i| pos + i) {
        let token = match read_markup(input, lt, false) {
            Ok(Some(token)) => token,
            Ok(None) => {
                escape_lt(&mut edits, lt);
                pos = lt + 1;
                continue;
            }
            Err(e) => {
                pos = recover(&mut edits, input, lt, e.kind);
                continue;
            }
        };

        let is_tag = matches!(token.kind, TokenKind::OpenTag { .. } | TokenKind::CloseTag);
        if is_tag {
            // A '<' inside the tag means it was cut short
            if let Some(i) = memchr(b'<', &input[lt + 1..token.end]) {
                let stop = lt + 1 + i;
                edits.drop_range(lt, stop, SyntaxErrorKind::HtmlUnexpectedSymbol);
                pos = stop;
                continue;
            }
        }

        let name = token.name.slice(input);
        match token.kind {
            TokenKind::OpenTag { compact } => {
                if stack.is_empty() {
                    match root.as_mut() {
                        None => {
                            root = Some(Root {
                                start: lt,
                                // A compact root cannot be reopened
                                is_html: name == b"html" && !compact,
                                closer: None,
                            });
                        }
                        Some(r) => {
                            if r.is_html {
                                if let Some((start, end)) = r.closer.take() {
                                    edits.drop_range(start, end, SyntaxErrorKind::HtmlTagClosureMismatch);
                                }
                            } else {
                                edits.insert(r.start, HTML_ROOT, SyntaxErrorKind::HtmlUnexpectedSymbol);
                                r.is_html = true;
                                r.closer = None;
                            }
                            stack.push(b"html");
                        }
                    }
                }
                if !compact {
                    stack.push(name);
                }
            }
            TokenKind::CloseTag => match stack.iter().rposition(|open| *open == name) {
                Some(index) => {
                    for open in stack[index + 1..].iter().rev() {
                        edits.close(lt, open, SyntaxErrorKind::HtmlTagClosureMismatch);
                    }
                    stack.truncate(index);
                    if stack.is_empty() {
                        if let Some(r) = root.as_mut() {
                            r.closer = Some((lt, token.end));
                        }
                    }
                }
                None => edits.drop_range(lt, token.end, SyntaxErrorKind::HtmlTagClosureMismatch),
            },
            _ => {}
        }
        pos = token.end;
    }

    for open in stack.iter().rev() {
        edits.close(input.len(), open, SyntaxErrorKind::HtmlUnexpectedEnd);
    }

    let repair = edits.apply(input);
    if repair.repaired {
        tracing::debug!(
            "html repair: {} fixes, {} -> {} bytes",
            repair.diagnostics.len(),
            input.len(),
            repair.output.len()
        );
    }
    repair
}

fn escape_lt(edits: &mut Edits, lt: usize) {
    edits.drop_range(lt, lt + 1, SyntaxErrorKind::HtmlUnexpectedSymbol);
    edits.insert(lt, &b"&lt;"[..], SyntaxErrorKind::HtmlUnexpectedSymbol);
}

/// Record the fix for markup at `lt` that failed with `kind`; returns
/// where scanning resumes
fn recover(edits: &mut Edits, input: &[u8], lt: usize, kind: SyntaxErrorKind) -> usize {
    let end = input.len();
    match kind {
        SyntaxErrorKind::CommentClosureMismatch => {
            edits.insert(end, &b"-->"[..], SyntaxErrorKind::HtmlCommentClosureMismatch);
            end
        }
        SyntaxErrorKind::CDataClosureMismatch => {
            edits.insert(end, &b"]]>"[..], SyntaxErrorKind::HtmlUnexpectedEnd);
            end
        }
        SyntaxErrorKind::ProcessingInstructionClosureMismatch => {
            edits.insert(end, &b"?>"[..], SyntaxErrorKind::HtmlUnexpectedEnd);
            end
        }
        SyntaxErrorKind::TagClosureMismatch if input[lt..].starts_with(b"<!") => {
            let subset = memchr2(b'[', b'>', &input[lt..]).is_some_and(|i| input[lt + i] == b'[');
            let closer: &[u8] = if subset { b"]>" } else { b">" };
            edits.insert(end, closer, SyntaxErrorKind::HtmlUnexpectedEnd);
            end
        }
        SyntaxErrorKind::TagClosureMismatch => {
            // Unterminated tag: drop it, up to the next '<' if any
            match memchr(b'<', &input[lt + 1..]) {
                Some(i) => {
                    edits.drop_range(lt, lt + 1 + i, SyntaxErrorKind::HtmlUnexpectedSymbol);
                    lt + 1 + i
                }
                None => {
                    edits.drop_range(lt, end, SyntaxErrorKind::HtmlUnexpectedEnd);
                    end
                }
            }
        }
        _ => {
            escape_lt(edits, lt);
            lt + 1
        }
    }
}
