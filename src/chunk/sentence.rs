//! Sentence splitting and overlap-preserving packing.

use super::tokenizer::TokenCounter;

/// Split on `.`, `!` and `?`.
///
/// A sentence closes at a terminator once its trimmed text is longer than
/// one character, so a stray "." does not form a sentence of its own. Any
/// trailing text without a terminator becomes the last sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let trimmed = current.trim();
            if trimmed.chars().count() > 1 {
                sentences.push(trimmed.to_string());
                current.clear();
            }
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// A sentence with its token count.
#[derive(Debug, Clone)]
struct Counted {
    text: String,
    tokens: usize,
}

/// Greedily pack sentences into chunks of at most `max_tokens`, seeding
/// each new chunk with the previous chunk's trailing sentences up to
/// `overlap_tokens`.
///
/// The budget is checked against the joined text. Sentences larger than
/// `max_tokens` are first broken at whitespace, and words still over budget
/// are sliced at character boundaries. Overlap
/// sentences are shed from the front while they would push the next
/// sentence over budget.
pub fn pack_sentences<T: TokenCounter + ?Sized>(
    sentences: Vec<String>,
    max_tokens: usize,
    overlap_tokens: usize,
    counter: &T,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<Counted> = Vec::new();

    for sentence in fit_sentences(sentences, max_tokens, counter) {
        if !current.is_empty() && joined_tokens(&current, &sentence, counter) > max_tokens {
            chunks.push(join(&current));

            let carried = overlap_tail(&current, overlap_tokens);
            current = current.split_off(current.len() - carried);

            while !current.is_empty() && joined_tokens(&current, &sentence, counter) > max_tokens {
                current.remove(0);
            }
        }
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(join(&current));
    }
    chunks
}

/// Tokens in `current` joined with `next`.
fn joined_tokens<T: TokenCounter + ?Sized>(current: &[Counted], next: &Counted, counter: &T) -> usize {
    let mut text = join(current);
    text.push(' ');
    text.push_str(&next.text);
    counter.count(&text)
}

/// Number of trailing sentences whose combined tokens fit in `budget`.
fn overlap_tail(sentences: &[Counted], budget: usize) -> usize {
    let mut used = 0usize;
    let mut taken = 0usize;
    for s in sentences.iter().rev() {
        if used + s.tokens > budget {
            break;
        }
        used += s.tokens;
        taken += 1;
    }
    taken
}

fn join(sentences: &[Counted]) -> String {
    sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count every sentence, breaking any that alone exceed the budget.
fn fit_sentences<T: TokenCounter + ?Sized>(
    sentences: Vec<String>,
    max_tokens: usize,
    counter: &T,
) -> Vec<Counted> {
    let mut out = Vec::with_capacity(sentences.len());
    for text in sentences {
        let tokens = counter.count(&text);
        if tokens <= max_tokens {
            out.push(Counted { text, tokens });
        } else {
            out.extend(break_at_whitespace(&text, max_tokens, counter));
        }
    }
    out
}

/// Break an oversized sentence into word runs of at most `max_tokens`,
/// counting each word separately.
fn break_at_whitespace<T: TokenCounter + ?Sized>(
    text: &str,
    max_tokens: usize,
    counter: &T,
) -> Vec<Counted> {
    let mut pieces = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    let mut tokens = 0usize;

    for word in text.split_whitespace() {
        let n = counter.count(word);
        if n > max_tokens {
            if !words.is_empty() {
                pieces.push(Counted {
                    text: words.join(" "),
                    tokens,
                });
                words.clear();
                tokens = 0;
            }
            pieces.extend(slice_word(word, max_tokens, counter));
            continue;
        }
        if tokens + n > max_tokens && !words.is_empty() {
            pieces.push(Counted {
                text: words.join(" "),
                tokens,
            });
            words.clear();
            tokens = 0;
        }
        words.push(word);
        tokens += n;
    }
    if !words.is_empty() {
        pieces.push(Counted {
            text: words.join(" "),
            tokens,
        });
    }
    pieces
}

/// Slice a run with no whitespace into the longest prefixes that fit
/// `max_tokens`. Every piece holds at least one character.
fn slice_word<T: TokenCounter + ?Sized>(word: &str, max_tokens: usize, counter: &T) -> Vec<Counted> {
    let mut pieces = Vec::new();
    let mut rest = word;

    while !rest.is_empty() {
        let ends: Vec<usize> = rest
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(rest.len()))
            .collect();

        let (mut lo, mut hi) = (0usize, ends.len() - 1);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if counter.count(&rest[..ends[mid]]) <= max_tokens {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        let (piece, tail) = rest.split_at(ends[lo]);
        pieces.push(Counted {
            text: piece.to_string(),
            tokens: counter.count(piece),
        });
        rest = tail;
    }
    pieces
}
