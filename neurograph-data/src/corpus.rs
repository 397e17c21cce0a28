// neurograph-data/src/corpus.rs
//! # Pattern corpus loading
//!
//! Parses a plain-text corpus into a `PatternSet`. The format is
//! line-oriented:
//!
//! ```text
//! # xor corpus
//! in  input  0 1
//! out output 1
//!
//! in  input  1 1
//! out output 0
//! ```
//!
//! Each block of `in`/`out` lines is one pattern; blank lines separate
//! patterns and `#` starts a comment. The named clusters are resolved
//! through the net the corpus is meant for, and value counts must match
//! the cluster sizes.

use neurograph_core::{NeuralNet, NeuroGraphError, Pattern, PatternSet};

/// Parses a plain-text corpus, resolving cluster names through `net`.
///
/// # Errors
/// `UnknownName` for an unresolved cluster, `SizeMismatch` when a line
/// carries the wrong number of values, `ParseError` for anything that is
/// neither an `in` nor an `out` line.
pub fn parse_pattern_set(text: &str, net: &NeuralNet) -> Result<PatternSet, NeuroGraphError> {
    let mut set = PatternSet::new();
    let mut current: Option<Pattern> = None;

    for (line_no, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();

        if line.is_empty() {
            if let Some(pattern) = current.take() {
                set.push(pattern);
            }
            continue;
        }

        let mut tokens = line.split_whitespace();
        let direction = tokens.next().unwrap_or_default();
        let cluster_name = tokens.next().ok_or_else(|| NeuroGraphError::ParseError {
            message: format!("line {}: missing cluster name", line_no + 1),
        })?;
        let values: Vec<f32> = tokens
            .map(|tok| {
                tok.parse::<f32>().map_err(|_| NeuroGraphError::ParseError {
                    message: format!("line {}: bad real '{}'", line_no + 1, tok),
                })
            })
            .collect::<Result<_, _>>()?;

        let cluster = net
            .find_cluster(cluster_name)
            .ok_or_else(|| NeuroGraphError::UnknownName {
                name: cluster_name.to_string(),
            })?;
        if values.len() != cluster.size() {
            return Err(NeuroGraphError::SizeMismatch {
                expected: cluster.size(),
                actual: values.len(),
                operation: format!("corpus line {}", line_no + 1),
            });
        }

        let pattern = current.get_or_insert_with(Pattern::new);
        match direction {
            "in" => pattern.set_inputs_of(&cluster, values),
            "out" => pattern.set_outputs_of(&cluster, values),
            other => {
                return Err(NeuroGraphError::ParseError {
                    message: format!("line {}: unknown directive '{}'", line_no + 1, other),
                })
            }
        }
    }

    if let Some(pattern) = current.take() {
        set.push(pattern);
    }
    Ok(set)
}

#[cfg(test)]
#[path = "corpus_test.rs"]
mod tests;
