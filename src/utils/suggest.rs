//! "Did you mean" candidates for misspelled tool names and argument keys.

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn score(input: &str, candidate: &str) -> Option<usize> {
    let a = normalize(input);
    let b = normalize(candidate);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(0);
    }
    if a.contains(&b) || b.contains(&a) {
        return Some(1);
    }
    let allowed = match a.len() {
        0..=4 => 1,
        5..=8 => 2,
        len => (len / 3).max(3),
    };
    let distance = levenshtein(&a, &b);
    (distance <= allowed).then_some(distance)
}

pub fn suggest<S: AsRef<str>>(input: &str, candidates: &[S], limit: usize) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            score(input, candidate.as_ref()).map(|distance| (distance, candidate.as_ref()))
        })
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(_, name)| name.to_string())
        .collect()
}
