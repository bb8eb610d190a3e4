// WHY: Character offsets on annotations are keys into a small per-document token arena
// Built once per document (or per sentence) and dropped with it; never shared across documents

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

use crate::document::{Mention, RawToken, Span};
use crate::error::{Boundary, Result, TimelineError};

/// Text substituted for newline tokens in every classifier window
pub const NEWLINE_PLACEHOLDER: &str = "<cr>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub begin: usize,
    pub end: usize,
    pub text: String,
}

/// Two raw tokens shared a begin offset; `kept` is the later one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTokenBoundary {
    pub offset: usize,
    pub replaced: Token,
    pub kept: Token,
}

/// Tokens of a document or sentence, sorted by begin offset, one per begin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Vec<Token>,
    duplicates: Vec<DuplicateTokenBoundary>,
}

impl TokenSequence {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Token texts for `start..end`, clamped to the sequence
    pub fn texts(&self, start: usize, end: usize) -> impl Iterator<Item = &str> + '_ {
        let end = end.min(self.tokens.len());
        let start = start.min(end);
        self.tokens[start..end].iter().map(|t| t.text.as_str())
    }

    /// Begin-offset conflicts resolved while building
    pub fn duplicates(&self) -> &[DuplicateTokenBoundary] {
        &self.duplicates
    }
}

/// Build the ordered token sequence from raw tokens
///
/// Tokens whose span matches a newline span get the placeholder text. On a repeated begin
/// offset the later-seen token wins and the conflict is logged and recorded.
pub fn build_tokens<'a, I>(raw_tokens: I, newline_spans: &[Span], placeholder: &str) -> TokenSequence
where
    I: IntoIterator<Item = &'a RawToken>,
{
    let newlines: HashSet<(usize, usize)> = newline_spans.iter().map(|s| (s.begin, s.end)).collect();

    let mut by_begin: BTreeMap<usize, Token> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for raw in raw_tokens {
        let text = if newlines.contains(&(raw.begin, raw.end)) {
            placeholder.to_string()
        } else {
            raw.text.clone()
        };
        let token = Token {
            begin: raw.begin,
            end: raw.end,
            text,
        };

        if let Some(previous) = by_begin.insert(raw.begin, token.clone()) {
            warn!(
                offset = raw.begin,
                replaced = ?previous,
                kept = ?token,
                "Duplicate token begin offset, keeping later token"
            );
            duplicates.push(DuplicateTokenBoundary {
                offset: raw.begin,
                replaced: previous,
                kept: token,
            });
        }
    }

    TokenSequence {
        tokens: by_begin.into_values().collect(),
        duplicates,
    }
}

/// Half-open token index range `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Inverse lookup from character boundaries to token indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    begins: HashMap<usize, usize>,
    ends: HashMap<usize, usize>,
    collisions: usize,
}

impl OffsetMap {
    /// Index every token boundary; later collisions overwrite and are reported
    pub fn invert(tokens: &TokenSequence) -> Self {
        let mut begins = HashMap::with_capacity(tokens.len());
        let mut ends = HashMap::with_capacity(tokens.len());
        let mut collisions = 0;

        for (index, token) in tokens.tokens().iter().enumerate() {
            if let Some(previous) = begins.insert(token.begin, index) {
                warn!(offset = token.begin, previous, index, "Pre-existing token begin entry in offset map");
                collisions += 1;
            }
            if let Some(previous) = ends.insert(token.end, index) {
                warn!(offset = token.end, previous, index, "Pre-existing token end entry in offset map");
                collisions += 1;
            }
        }

        Self {
            begins,
            ends,
            collisions,
        }
    }

    /// Number of overwritten entries across both maps
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn token_at_begin(&self, offset: usize) -> Result<usize> {
        self.begins.get(&offset).copied().ok_or(TimelineError::OffsetResolution {
            offset,
            boundary: Boundary::Begin,
        })
    }

    pub fn token_at_end(&self, offset: usize) -> Result<usize> {
        self.ends.get(&offset).copied().ok_or(TimelineError::OffsetResolution {
            offset,
            boundary: Boundary::End,
        })
    }

    /// Resolve a character span to its half-open token span
    pub fn resolve(&self, begin: usize, end: usize) -> Result<TokenSpan> {
        let start = self.token_at_begin(begin)?;
        let last = self.token_at_end(end)?;
        // An end boundary before the begin token cannot describe a slice
        if last < start {
            return Err(TimelineError::OffsetResolution {
                offset: end,
                boundary: Boundary::End,
            });
        }
        Ok(TokenSpan { start, end: last + 1 })
    }
}

/// Token sequence bundled with its offset maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedTokens {
    pub tokens: TokenSequence,
    pub offsets: OffsetMap,
}

impl AlignedTokens {
    pub fn build<'a, I>(raw_tokens: I, newline_spans: &[Span], placeholder: &str) -> Self
    where
        I: IntoIterator<Item = &'a RawToken>,
    {
        let tokens = build_tokens(raw_tokens, newline_spans, placeholder);
        let offsets = OffsetMap::invert(&tokens);
        Self { tokens, offsets }
    }

    pub fn resolve(&self, mention: &Mention<'_>) -> Result<TokenSpan> {
        self.offsets.resolve(mention.begin(), mention.end())
    }
}
