//! Turns raw latest-tweets responses into new corpus tokens.

use std::{collections::HashSet, sync::Arc};

use serde_json::Value;

use crate::{domain::HarvestRecord, errors::Error, ports::SourceService, Result};

/// Index of the tweet text in the array-shaped records MocaTwitterUtil returns.
const ARRAY_TEXT_INDEX: usize = 2;
const MIN_TOKEN_CHARS: usize = 3;

#[derive(Clone)]
pub struct Harvester {
    source: Arc<dyn SourceService>,
    dedupe_within_harvest: bool,
}

impl Harvester {
    pub fn new(source: Arc<dyn SourceService>, dedupe_within_harvest: bool) -> Self {
        Self {
            source,
            dedupe_within_harvest,
        }
    }

    /// Fetch and filter `entity`'s latest tweets, returning tokens not already in
    /// `existing`.
    ///
    /// An unreachable service, an empty body, or an unparseable body is
    /// `HarvestFailed`, which is distinct from `Ok(vec![])` (data arrived, nothing new).
    pub async fn harvest(&self, entity: &str, existing: &[String]) -> Result<Vec<String>> {
        let failed = |reason: String| Error::HarvestFailed {
            entity: entity.to_string(),
            reason,
        };

        let body = self
            .source
            .latest_tweets(entity)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(failed("empty response".to_string()));
        }
        let records = parse_records(&body).map_err(|e| failed(e.to_string()))?;

        Ok(new_tokens(&records, existing, self.dedupe_within_harvest))
    }
}

/// Parse a latest-tweets body: a JSON array of either `[.., .., text, ..]` rows or
/// `{ "text": .., "retweeted": .. }` objects. Rows without text are dropped.
pub fn parse_records(body: &str) -> Result<Vec<HarvestRecord>> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(items) = value else {
        return Err(Error::External(
            "latest-tweets response is not a JSON array".to_string(),
        ));
    };
    Ok(items.iter().filter_map(record_from_value).collect())
}

fn record_from_value(v: &Value) -> Option<HarvestRecord> {
    let (text, flagged) = match v {
        Value::Array(cols) => (cols.get(ARRAY_TEXT_INDEX)?.as_str()?, false),
        Value::Object(map) => {
            let text = map.get("text")?.as_str()?;
            let flagged = ["retweeted", "is_retweet"]
                .iter()
                .any(|k| map.get(*k).and_then(Value::as_bool).unwrap_or(false));
            (text, flagged)
        }
        _ => return None,
    };
    Some(HarvestRecord {
        // The upstream service marks retweets only by an "RT" inside the text.
        retweet: flagged || text.contains("RT"),
        text: text.to_string(),
    })
}

/// `true` if a single word survives the mention/hashtag/link/length/digit filter.
pub fn keep_token(token: &str) -> bool {
    !(token.contains('@')
        || token.contains('#')
        || token.contains("http")
        || token.chars().count() < MIN_TOKEN_CHARS
        || token.chars().all(is_digit))
}

/// First code point of each run of ten decimal digits (general category Nd).
const DECIMAL_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x11066, 0x110F0, 0x11136, 0x111D0, 0x112F0,
    0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11C50, 0x11D50, 0x11DA0, 0x16A60,
    0x16B50, 0x1E140, 0x1E2F0, 0x1E950, 0x1FBF0,
];

/// Digit-valued characters outside Nd: superscripts, subscripts, circled and
/// parenthesized forms, Ethiopic digits. Inclusive ranges.
const OTHER_DIGITS: &[(u32, u32)] = &[
    (0x00B2, 0x00B3),
    (0x00B9, 0x00B9),
    (0x1369, 0x1371),
    (0x19DA, 0x19DA),
    (0x2070, 0x2070),
    (0x2074, 0x2079),
    (0x2080, 0x2089),
    (0x2460, 0x2468),
    (0x2474, 0x247C),
    (0x2488, 0x2490),
    (0x24EA, 0x24EA),
    (0x24F5, 0x24FD),
    (0x24FF, 0x24FF),
    (0x2776, 0x277E),
    (0x2780, 0x2788),
    (0x278A, 0x2792),
    (0x1D7CE, 0x1D7FF),
    (0x1F100, 0x1F10A),
];

/// A character with a single digit value, in any script.
///
/// Narrower than `char::is_numeric`: Roman numerals and vulgar fractions are
/// numeric but not digits, so `ⅠⅡⅢ` or `½½½` stay words.
fn is_digit(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_digit();
    }
    if !c.is_numeric() {
        return false;
    }
    let cp = c as u32;
    DECIMAL_ZEROS.iter().any(|&zero| (zero..zero + 10).contains(&cp))
        || OTHER_DIGITS.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Filter every non-retweet record and keep tokens absent from `existing`.
///
/// Without `dedupe_within_harvest`, a word that appears several times in this
/// harvest is emitted each time.
pub fn new_tokens(
    records: &[HarvestRecord],
    existing: &[String],
    dedupe_within_harvest: bool,
) -> Vec<String> {
    let known: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();

    for record in records.iter().filter(|r| !r.retweet) {
        for token in record.text.split_whitespace() {
            if !keep_token(token) || known.contains(token) {
                continue;
            }
            if dedupe_within_harvest && !emitted.insert(token) {
                continue;
            }
            out.push(token.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;

    fn rec(text: &str) -> HarvestRecord {
        HarvestRecord {
            retweet: false,
            text: text.to_string(),
        }
    }

    #[test]
    fn filters_links_tags_mentions_short_and_digits() {
        let out = new_tokens(&[rec("hello world http://x #tag @bob 12 ab")], &[], false);
        assert_eq!(out, vec!["hello", "world"]);
    }

    #[test]
    fn keep_token_rules() {
        assert!(keep_token("abc"));
        assert!(keep_token("12a"));
        assert!(keep_token("日本語"));
        assert!(!keep_token("ab"));
        assert!(!keep_token("日本"));
        assert!(!keep_token("2024"));
        assert!(!keep_token("mail@example"));
        assert!(!keep_token("c#sharp"));
        assert!(!keep_token("xhttps"));
    }

    #[test]
    fn only_digit_runs_count_as_numbers() {
        // numeric but not digits: kept
        assert!(keep_token("ⅠⅡⅢ"));
        assert!(keep_token("½½½"));
        assert!(keep_token("一二三"));
        // digits in other scripts and digit-valued forms: dropped
        assert!(!keep_token("٢٠٢٤"));
        assert!(!keep_token("१२३"));
        assert!(!keep_token("１２３"));
        assert!(!keep_token("²³⁴"));
        assert!(!keep_token("①②③"));
        // mixed digits and fractions are not all digits
        assert!(keep_token("12½"));
    }

    #[test]
    fn retweets_are_dropped_whole() {
        let records = vec![
            HarvestRecord {
                retweet: true,
                text: "lovely weather".into(),
            },
            rec("rainy weather"),
        ];
        assert_eq!(new_tokens(&records, &[], false), vec!["rainy", "weather"]);
    }

    #[test]
    fn existing_corpus_suppresses_but_same_harvest_repeats_by_default() {
        let existing = vec!["hello".to_string()];
        let records = vec![rec("hello again again"), rec("again hello")];
        assert_eq!(
            new_tokens(&records, &existing, false),
            vec!["again", "again", "again"]
        );
        assert_eq!(new_tokens(&records, &existing, true), vec!["again"]);
    }

    #[test]
    fn parses_array_and_object_rows() {
        let body = r#"[
            [1, "2021-01-01", "plain text here", 0],
            [2, "2021-01-01", "RT @x: copied text"],
            {"text": "object form", "retweeted": false},
            {"text": "flagged form", "is_retweet": true},
            {"id": 5},
            "junk"
        ]"#;
        let records = parse_records(body).unwrap();
        assert_eq!(records.len(), 4);
        assert!(!records[0].retweet);
        assert!(records[1].retweet);
        assert!(!records[2].retweet);
        assert!(records[3].retweet);
    }

    #[test]
    fn non_array_body_is_rejected() {
        assert!(parse_records(r#"{"error":"bad key"}"#).is_err());
        assert!(parse_records("not json").is_err());
    }

    #[tokio::test]
    async fn empty_body_is_harvest_failed_not_empty_result() {
        let source = Arc::new(FakeSource::healthy().with_body("alice", "  "));
        let h = Harvester::new(source, false);
        assert!(matches!(
            h.harvest("alice", &[]).await,
            Err(Error::HarvestFailed { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_source_is_harvest_failed() {
        let h = Harvester::new(Arc::new(FakeSource::healthy()), false);
        let err = h.harvest("nobody", &[]).await.unwrap_err();
        assert!(matches!(err, Error::HarvestFailed { ref entity, .. } if entity == "nobody"));
    }

    #[tokio::test]
    async fn no_new_tokens_is_ok_empty() {
        let source = Arc::new(
            FakeSource::healthy().with_body("alice", r#"[[0, 0, "hello world"]]"#),
        );
        let h = Harvester::new(source, false);
        let existing = vec!["hello".to_string(), "world".to_string()];
        assert_eq!(h.harvest("alice", &existing).await.unwrap(), Vec::<String>::new());
    }
}
