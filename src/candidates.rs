// WHY: Selects TLink partners within a bounded token distance of a focal mention
// The window is computed in token space and checked in character space

use tracing::debug;

use crate::document::Mention;
use crate::error::Result;
use crate::offsets::AlignedTokens;

/// Default token distance for TLink candidates
pub const TLINK_WINDOW: usize = 10;

/// Inclusive character window derived from a token window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharWindow {
    pub begin: usize,
    pub end: usize,
}

impl CharWindow {
    pub fn contains(&self, offset: usize) -> bool {
        self.begin <= offset && offset <= self.end
    }

    pub fn encloses(&self, mention: &Mention<'_>) -> bool {
        self.contains(mention.begin()) && self.contains(mention.end())
    }
}

/// Character window covering `max_token_distance` tokens on each side of the focal mention
pub fn char_window(
    document: &AlignedTokens,
    focal: &Mention<'_>,
    max_token_distance: usize,
) -> Result<CharWindow> {
    let span = document.resolve(focal)?;
    let last_index = document.tokens.len().saturating_sub(1);

    let first = span.start.saturating_sub(max_token_distance);
    let last = (span.end - 1).saturating_add(max_token_distance).min(last_index);

    // resolve() succeeded, so both indices are inside the sequence
    let begin = document.tokens.get(first).map_or(focal.begin(), |t| t.begin);
    let end = document.tokens.get(last).map_or(focal.end(), |t| t.end);
    Ok(CharWindow { begin, end })
}

/// Lazily yield the pool members enclosed by the focal mention's window, in pool order
///
/// The returned iterator is one-shot; call again to re-evaluate.
pub fn window_candidates<'p, 'a, I>(
    document: &AlignedTokens,
    focal: &Mention<'_>,
    pool: I,
    max_token_distance: usize,
) -> Result<impl Iterator<Item = &'p Mention<'a>>>
where
    'a: 'p,
    I: IntoIterator<Item = &'p Mention<'a>>,
{
    let window = char_window(document, focal, max_token_distance)?;
    debug!(begin = window.begin, end = window.end, "TLink candidate window");
    Ok(pool.into_iter().filter(move |candidate| window.encloses(candidate)))
}

/// Candidate pool for the focal mention at `focal_index`: every other accepted focal mention
/// followed by the normalized time expressions
pub fn candidate_pool<'p, 'a>(
    focal_mentions: &'p [Mention<'a>],
    focal_index: usize,
    time_expressions: &'p [Mention<'a>],
) -> impl Iterator<Item = &'p Mention<'a>> {
    focal_mentions
        .iter()
        .enumerate()
        .filter(move |(index, _)| *index != focal_index)
        .map(|(_, mention)| mention)
        .chain(time_expressions.iter().filter(|m| m.is_link_candidate()))
}
