// WHY: Renders the tagged text windows the three classifiers consume
// All renderers are pure functions of the aligned tokens and the mention offsets

use crate::document::Mention;
use crate::error::Result;
use crate::offsets::{AlignedTokens, TokenSpan};

/// Context tokens kept on each side of a DTR mention
pub const DTR_RADIUS: usize = 10;

/// Context tokens kept before the first and after the second TLink argument
pub const TLINK_PAD: usize = 2;

const FIRST_OPEN: &str = "<e>";
const FIRST_CLOSE: &str = "</e>";
const SECOND_OPEN: &str = "<t>";
const SECOND_CLOSE: &str = "</t>";

/// Collects window pieces and joins them with single spaces
struct WindowWriter<'t> {
    aligned: &'t AlignedTokens,
    parts: Vec<&'t str>,
}

impl<'t> WindowWriter<'t> {
    fn new(aligned: &'t AlignedTokens) -> Self {
        Self {
            aligned,
            parts: Vec::new(),
        }
    }

    fn tokens(&mut self, start: usize, end: usize) -> &mut Self {
        let aligned = self.aligned;
        self.parts.extend(aligned.tokens.texts(start, end));
        self
    }

    fn tagged(&mut self, span: TokenSpan, open: &'static str, close: &'static str) -> &mut Self {
        self.parts.push(open);
        self.tokens(span.start, span.end);
        self.parts.push(close);
        self
    }

    fn finish(&self) -> String {
        self.parts.join(" ")
    }
}

/// Modality instance: the full sentence with the mention wrapped in `<e> … </e>`
///
/// `sentence` must be built from the tokens of the sentence covering the mention.
pub fn modality_instance(sentence: &AlignedTokens, mention: &Mention<'_>) -> Result<String> {
    let span = sentence.resolve(mention)?;
    Ok(WindowWriter::new(sentence)
        .tokens(0, span.start)
        .tagged(span, FIRST_OPEN, FIRST_CLOSE)
        .tokens(span.end, sentence.tokens.len())
        .finish())
}

/// DTR instance: `radius` tokens of document context on each side, clipped at the edges
pub fn dtr_instance(document: &AlignedTokens, mention: &Mention<'_>, radius: usize) -> Result<String> {
    let span = document.resolve(mention)?;
    Ok(WindowWriter::new(document)
        .tokens(span.start.saturating_sub(radius), span.start)
        .tagged(span, FIRST_OPEN, FIRST_CLOSE)
        .tokens(span.end, span.end.saturating_add(radius))
        .finish())
}

/// TLink instance over two mentions
///
/// The mention starting first is tagged `<e>`, the other `<t>`, regardless of which one is
/// the focal mention. Everything between the two spans is kept; `pad` tokens are kept before
/// the first and after the second.
pub fn tlink_instance(
    document: &AlignedTokens,
    focal: &Mention<'_>,
    other: &Mention<'_>,
    pad: usize,
) -> Result<String> {
    let focal_span = document.resolve(focal)?;
    let other_span = document.resolve(other)?;

    let (first, second) = if other_span.start < focal_span.start {
        (other_span, focal_span)
    } else {
        (focal_span, other_span)
    };

    Ok(WindowWriter::new(document)
        .tokens(first.start.saturating_sub(pad), first.start)
        .tagged(first, FIRST_OPEN, FIRST_CLOSE)
        .tokens(first.end, second.start)
        .tagged(second, SECOND_OPEN, SECOND_CLOSE)
        .tokens(second.end, second.end.saturating_add(pad))
        .finish())
}
