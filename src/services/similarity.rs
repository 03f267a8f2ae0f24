/// Questions longer than this are compared on their prefix; the overlap
/// count is cubic in the input length.
pub const MAX_COMPARED_CHARS: usize = 200;

/// Character-overlap similarity of two strings in `[0, 1]`, after case
/// folding and punctuation removal.
///
/// The overlap is counted by repeatedly taking the longest common substring
/// and recursing into the pieces left and right of it; the ratio is
/// `2 * common / (len_a + len_b)`. Only the first `MAX_COMPARED_CHARS` of
/// each normalized string take part.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().take(MAX_COMPARED_CHARS).collect();
    let b: Vec<char> = normalize(b).chars().take(MAX_COMPARED_CHARS).collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = common_chars(&a, &b);
    (2 * common) as f64 / (a.len() + b.len()) as f64
}

/// True when `candidate` is at least `threshold` similar to any of `existing`.
pub fn is_near_duplicate<'a, I>(candidate: &str, existing: I, threshold: f64) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .any(|other| similarity(candidate, other) >= threshold)
}

fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn common_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (mut best, mut pos_a, mut pos_b) = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > best {
                best = k;
                pos_a = i;
                pos_b = j;
            }
        }
    }

    if best == 0 {
        return 0;
    }

    best + common_chars(&a[..pos_a], &b[..pos_b])
        + common_chars(&a[pos_a + best..], &b[pos_b + best..])
}
