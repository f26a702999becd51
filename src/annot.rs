//! Stimulus annotations.
//!
//! Each recording session carries an ordered event stream describing when
//! every audio stimulus segment was playing. Acquisition software stores the
//! per-event payload as a Python-dict-style literal
//! (`{'sound_id': 3.0, 'story': 'lw1', …}`); of that payload only
//! `sound_id` matters here. The parser is strict: a malformed literal or a
//! missing `sound_id` aborts the run rather than silently skipping, since it
//! indicates a corrupt events file.
use anyhow::{bail, Context, Result};

/// One annotation event: a span of stimulus audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Onset in seconds since recording start.
    pub onset: f64,
    /// Span duration in seconds.
    pub duration: f64,
    /// Identifier of the sound file playing during the span. Consecutive
    /// events share the id while one stimulus plays; a change marks a
    /// segment boundary.
    pub sound_id: f64,
}

/// Parse a whole `*_events.tsv` file.
///
/// The first line is a header naming at least `onset`, `duration` and
/// `description` columns (any order, extra columns ignored). Every data row
/// must parse; blank trailing lines are allowed.
pub fn parse_events(text: &str) -> Result<Vec<Annotation>> {
    let mut lines = text.lines();
    let header = lines.next().context("events file is empty")?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let col = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .with_context(|| format!("events header missing '{name}' column"))
    };
    let onset_col = col("onset")?;
    let duration_col = col("duration")?;
    let desc_col = col("description")?;

    let mut events = Vec::new();
    for (i, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let field = |idx: usize| {
            fields
                .get(idx)
                .map(|s| s.trim())
                .with_context(|| format!("events row {}: missing column {idx}", i + 2))
        };
        let onset: f64 = field(onset_col)?
            .parse()
            .with_context(|| format!("events row {}: bad onset", i + 2))?;
        let duration: f64 = field(duration_col)?
            .parse()
            .with_context(|| format!("events row {}: bad duration", i + 2))?;
        let sound_id = sound_id_of(field(desc_col)?)
            .with_context(|| format!("events row {}: bad description", i + 2))?;
        events.push(Annotation { onset, duration, sound_id });
    }
    Ok(events)
}

/// Extract `sound_id` from a `{'key': value, …}` description literal.
pub fn sound_id_of(description: &str) -> Result<f64> {
    let inner = description
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .with_context(|| format!("description is not a braced literal: {description:?}"))?;

    for pair in split_top_level(inner) {
        let (key, value) = pair
            .split_once(':')
            .with_context(|| format!("malformed key/value pair: {pair:?}"))?;
        let key = key.trim().trim_matches('\'').trim_matches('"');
        if key == "sound_id" {
            let value = value.trim();
            return value
                .parse::<f64>()
                .with_context(|| format!("sound_id is not numeric: {value:?}"));
        }
    }
    bail!("description has no 'sound_id' key: {description:?}")
}

/// Split `a: 1, b: 'x, y'` on commas outside quotes.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (None, '\'') | (None, '"') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, ',') => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_id_from_typical_literal() {
        let id = sound_id_of("{'sound_id': 3.0, 'story': 'lw1', 'kind': 'word'}").unwrap();
        approx::assert_abs_diff_eq!(id, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn sound_id_integer_and_double_quotes() {
        approx::assert_abs_diff_eq!(sound_id_of("{\"sound_id\": 7}").unwrap(), 7.0);
    }

    #[test]
    fn sound_id_survives_commas_inside_strings() {
        let id = sound_id_of("{'story': 'cable, spool', 'sound_id': 1.5}").unwrap();
        approx::assert_abs_diff_eq!(id, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn missing_key_fails_loudly() {
        assert!(sound_id_of("{'story': 'the'}").is_err());
    }

    #[test]
    fn non_numeric_sound_id_fails() {
        assert!(sound_id_of("{'sound_id': 'three'}").is_err());
    }

    #[test]
    fn unbraced_description_fails() {
        assert!(sound_id_of("sound_id: 3").is_err());
    }

    #[test]
    fn events_tsv_round_trip() {
        let text = "onset\tduration\tdescription\n\
                    0.5\t0.25\t{'sound_id': 0.0}\n\
                    0.75\t0.25\t{'sound_id': 0.0}\n\
                    1.0\t0.5\t{'sound_id': 1.0}\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Annotation { onset: 0.5, duration: 0.25, sound_id: 0.0 }
        );
        approx::assert_abs_diff_eq!(events[2].sound_id, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn events_tsv_extra_columns_any_order() {
        let text = "trial\tdescription\tonset\tduration\n\
                    1\t{'sound_id': 2}\t3.5\t0.1\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
        approx::assert_abs_diff_eq!(events[0].onset, 3.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(events[0].sound_id, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn events_tsv_bad_row_aborts() {
        let text = "onset\tduration\tdescription\nnot-a-number\t0.1\t{'sound_id': 1}\n";
        assert!(parse_events(text).is_err());
    }
}
