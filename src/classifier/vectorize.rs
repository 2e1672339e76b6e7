use std::collections::HashMap;

use super::model::ClassifierModel;

/// Lower-cases, keeps only `[a-z0-9\s$]`, splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '$')
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Contiguous word n-grams for every `n` in `[min_n, max_n]`, with counts.
pub fn ngram_counts(tokens: &[String], min_n: usize, max_n: usize) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for n in min_n..=max_n {
        if n == 0 || n > tokens.len() {
            continue;
        }
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}

/// Sparse smoothed tf-idf vector, sorted by vocabulary index.
///
/// Out-of-vocabulary n-grams are dropped; an empty result means nothing in
/// the text was recognized.
pub fn vectorize(model: &ClassifierModel, text: &str) -> Vec<(usize, f32)> {
    let mut tokens = tokenize(text);
    if let Some(stop_words) = &model.stop_words {
        tokens.retain(|t| !stop_words.contains(t));
    }

    let (min_n, max_n) = model.ngram_range;
    let counts = ngram_counts(&tokens, min_n, max_n);
    let max_count = match counts.values().max() {
        Some(&m) if m > 0 => m as f32,
        _ => return Vec::new(),
    };

    let mut vector: Vec<(usize, f32)> = counts
        .iter()
        .filter_map(|(gram, &count)| {
            let index = *model.vocabulary.get(gram)?;
            let tf = 0.5 + 0.5 * count as f32 / max_count;
            Some((index, tf * model.idf[index]))
        })
        .collect();
    vector.sort_by_key(|&(i, _)| i);
    vector
}
