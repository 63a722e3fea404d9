//! Reply Agent
//!
//! Answers a question about the active document without any model call.
//! The canonical text is classified once per call: if it parses as JSON the
//! agent walks the object tree for matching keys and string values,
//! otherwise it scans lines for query keywords. Located data is wrapped in
//! phrases from [`crate::agents::phrases`], with more detail at higher
//! temperatures.

use rand::Rng;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::agents::phrases::{self, FOLLOW_UP_PHRASES, INTRO_PHRASES, NO_INFO_PHRASES};

/// How the canonical text is searched
#[derive(Debug, Clone, PartialEq)]
pub enum ContentMode {
    /// Text parsed as JSON
    Structured(Value),
    /// Free-form text, searched line by line
    Unstructured,
}

/// Response detail tier selected by temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// First match only
    Low,
    /// First match, plus a follow-up when more exist
    Medium,
    /// Every match as a numbered list
    High,
}

impl Verbosity {
    pub fn from_temperature(temperature: f32) -> Self {
        if temperature < 0.3 {
            Verbosity::Low
        } else if temperature < 0.7 {
            Verbosity::Medium
        } else {
            Verbosity::High
        }
    }
}

pub struct ReplyAgent;

impl ReplyAgent {
    /// Generate a reply using the thread-local RNG.
    pub fn respond(content: &str, query: &str, temperature: f32) -> String {
        Self::generate_response(content, query, temperature, &mut rand::thread_rng())
    }

    /// Generate a reply for `query` against `content`.
    ///
    /// Never fails: when nothing matches, a no-info phrase is returned.
    pub fn generate_response<R: Rng + ?Sized>(
        content: &str,
        query: &str,
        temperature: f32,
        rng: &mut R,
    ) -> String {
        let matches = match Self::classify_content(content) {
            ContentMode::Structured(value) => Self::find_matching_values(&value, query),
            ContentMode::Unstructured => Self::find_relevant_paragraphs(content, query)
                .into_iter()
                .map(|p| format!("\"{}\"", p))
                .collect(),
        };

        let verbosity = Verbosity::from_temperature(temperature);
        debug!(
            query_len = query.len(),
            matches = matches.len(),
            verbosity = ?verbosity,
            "Rendering reply"
        );

        if matches.is_empty() {
            return phrases::pick(NO_INFO_PHRASES, rng).to_string();
        }

        Self::render(&matches, verbosity, rng)
    }

    /// Decide between JSON walking and line scanning.
    pub fn classify_content(content: &str) -> ContentMode {
        match serde_json::from_str::<Value>(content) {
            Ok(value) => ContentMode::Structured(value),
            Err(_) => ContentMode::Unstructured,
        }
    }

    /// Collect formatted values whose key, or string value, contains `query`
    /// (case-insensitive). Objects are searched recursively; arrays are not.
    /// A top-level array is searched as if its indices were keys.
    pub fn find_matching_values(root: &Value, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        let mut matches = Vec::new();

        match root {
            Value::Object(map) => collect_object(map, &needle, &mut matches),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    visit_pair(&index.to_string(), item, &needle, &mut matches);
                }
            }
            _ => {}
        }

        matches
    }

    /// Non-blank lines containing at least one whitespace-separated query
    /// token (case-insensitive), in document order.
    pub fn find_relevant_paragraphs<'a>(content: &'a str, query: &str) -> Vec<&'a str> {
        let lowered = query.to_lowercase();
        let keywords: Vec<&str> = lowered.split_whitespace().collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        content
            .lines()
            .filter(|p| !p.trim().is_empty())
            .filter(|p| {
                let paragraph = p.to_lowercase();
                keywords.iter().any(|k| paragraph.contains(k))
            })
            .collect()
    }

    /// Human-readable rendering of a JSON value.
    ///
    /// Arrays use plain list joining: elements keep their raw form
    /// (`true`, empty for null) and nested arrays join with a bare comma.
    pub fn format_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(n),
            Value::Bool(true) => "Yes".to_string(),
            Value::Bool(false) => "No".to_string(),
            Value::Array(items) => join_elements(items, ", "),
            Value::Object(map) => map
                .values()
                .map(Self::format_value)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null => "null".to_string(),
        }
    }

    fn render<R: Rng + ?Sized>(matches: &[String], verbosity: Verbosity, rng: &mut R) -> String {
        let intro = phrases::pick(INTRO_PHRASES, rng);

        match verbosity {
            Verbosity::Low => format!("{} {}", intro, matches[0]),
            Verbosity::Medium => {
                let mut reply = format!("{} {}", intro, matches[0]);
                if matches.len() > 1 {
                    reply.push_str("\n\n");
                    reply.push_str(phrases::pick(FOLLOW_UP_PHRASES, rng));
                }
                reply
            }
            Verbosity::High => {
                let details = matches
                    .iter()
                    .enumerate()
                    .map(|(i, m)| format!("{}. {}", i + 1, m))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                format!(
                    "{}\n\n{}\n\n{}",
                    intro,
                    details,
                    phrases::pick(FOLLOW_UP_PHRASES, rng)
                )
            }
        }
    }
}

fn collect_object(map: &Map<String, Value>, needle: &str, matches: &mut Vec<String>) {
    for (key, value) in map {
        visit_pair(key, value, needle, matches);
    }
}

fn visit_pair(key: &str, value: &Value, needle: &str, matches: &mut Vec<String>) {
    let key_match = key.to_lowercase().contains(needle);
    let value_match = value
        .as_str()
        .is_some_and(|s| s.to_lowercase().contains(needle));

    if key_match || value_match {
        matches.push(ReplyAgent::format_value(value));
    }

    if let Value::Object(inner) = value {
        collect_object(inner, needle, matches);
    }
}

fn join_elements(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(n),
            Value::String(s) => s.clone(),
            Value::Array(inner) => join_elements(inner, ","),
            Value::Object(_) => "[object Object]".to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        format_float(n.as_f64().unwrap_or_default())
    }
}

// Shortest round-trip digits. Integral values print without a fraction
// ("30", not "30.0"); magnitudes from 1e21 up or below 1e-6 switch to
// exponent form ("1e+21", "1.5e-7").
fn format_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }

    let magnitude = f.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", f);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }

    if f.fract() == 0.0 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn profile() -> String {
        json!({
            "name": "John Doe",
            "age": 30,
            "occupation": "Developer",
            "details": {
                "experience": "5 years",
                "skills": ["JavaScript", "React", "Node.js"]
            }
        })
        .to_string()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    #[test]
    fn test_name_found_at_every_temperature() {
        for temperature in [0.0, 0.2, 0.3, 0.5, 0.7, 0.8, 1.0] {
            let response = ReplyAgent::respond(&profile(), "name", temperature);
            assert!(response.contains("John Doe"), "temperature {}: {}", temperature, response);
        }
    }

    #[test]
    fn test_medium_temperature() {
        let response = ReplyAgent::respond(&profile(), "occupation", 0.5);
        assert!(response.contains("Developer"));
    }

    #[test]
    fn test_skills_listed_in_order_at_high_temperature() {
        let response = ReplyAgent::respond(&profile(), "skills", 0.8);
        assert!(response.contains("1. JavaScript, React, Node.js"));
    }

    #[test]
    fn test_nested_properties() {
        let response = ReplyAgent::respond(&profile(), "experience", 0.5);
        assert!(response.contains("5 years"));
    }

    #[test]
    fn test_no_matches_uses_no_info_phrase() {
        let response = ReplyAgent::respond(&profile(), "invalid", 0.5);
        assert!(NO_INFO_PHRASES.contains(&response.as_str()));
        assert!(!response.contains("John"));
    }

    #[test]
    fn test_text_content() {
        let response = ReplyAgent::respond("Hello world\nThis is a test", "hello", 0.5);
        assert!(response.contains("\"Hello world\""));
        assert!(!response.contains("This is a test"));
    }

    #[test]
    fn test_key_match_on_object_value_and_recursion() {
        let matches = ReplyAgent::find_matching_values(&serde_json::from_str(&profile()).unwrap(), "DETAILS");
        assert_eq!(matches, vec!["5 years, JavaScript, React, Node.js"]);

        let matches = ReplyAgent::find_matching_values(&serde_json::from_str(&profile()).unwrap(), "e");
        // keys name, age, details, experience plus the "Developer" value
        assert_eq!(matches.len(), 5);
        assert_eq!(matches[0], "John Doe");
        assert_eq!(matches[1], "30");
    }

    #[test]
    fn test_value_match_is_case_insensitive() {
        let doc = json!({"owner": "Jane SMITH", "count": 3});
        assert_eq!(ReplyAgent::find_matching_values(&doc, "smith"), vec!["Jane SMITH"]);
    }

    #[test]
    fn test_arrays_are_not_searched_for_keys() {
        let doc = json!({"items": [{"color": "red"}], "meta": {"color": "blue"}});
        assert_eq!(ReplyAgent::find_matching_values(&doc, "color"), vec!["blue"]);
        assert!(ReplyAgent::find_matching_values(&doc, "red").is_empty());
    }

    #[test]
    fn test_top_level_array_uses_indices() {
        let doc = json!([{"title": "first"}, "second"]);
        assert_eq!(ReplyAgent::find_matching_values(&doc, "title"), vec!["first"]);
        assert_eq!(ReplyAgent::find_matching_values(&doc, "second"), vec!["second"]);
        assert_eq!(ReplyAgent::find_matching_values(&doc, "1"), vec!["second"]);
    }

    #[test]
    fn test_scalar_json_has_no_pairs() {
        assert_eq!(ReplyAgent::classify_content("42"), ContentMode::Structured(json!(42)));
        let response = ReplyAgent::generate_response("42", "42", 0.9, &mut rng());
        assert!(NO_INFO_PHRASES.contains(&response.as_str()));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(ReplyAgent::format_value(&json!("text")), "text");
        assert_eq!(ReplyAgent::format_value(&json!(30)), "30");
        assert_eq!(ReplyAgent::format_value(&json!(-4)), "-4");
        assert_eq!(ReplyAgent::format_value(&json!(2.5)), "2.5");
        assert_eq!(ReplyAgent::format_value(&json!(30.0)), "30");
        assert_eq!(ReplyAgent::format_value(&json!(true)), "Yes");
        assert_eq!(ReplyAgent::format_value(&json!(false)), "No");
        assert_eq!(ReplyAgent::format_value(&json!(null)), "null");
        assert_eq!(ReplyAgent::format_value(&json!([1, "a", false])), "1, a, false");
        assert_eq!(
            ReplyAgent::format_value(&json!({"city": "Oslo", "zip": 150, "tags": ["x", "y"]})),
            "Oslo, 150, x, y"
        );
    }

    #[test]
    fn test_format_value_array_elements_stay_raw() {
        assert_eq!(ReplyAgent::format_value(&json!([true, null])), "true, ");
        assert_eq!(ReplyAgent::format_value(&json!([[1, 2], [3]])), "1,2, 3");
        assert_eq!(ReplyAgent::format_value(&json!(["a", {"b": 1}])), "a, [object Object]");
        assert_eq!(ReplyAgent::format_value(&json!([1.5, 2.0])), "1.5, 2");
    }

    #[test]
    fn test_format_value_extreme_numbers() {
        assert_eq!(ReplyAgent::format_value(&json!(1e21)), "1e+21");
        assert_eq!(ReplyAgent::format_value(&json!(1.5e300)), "1.5e+300");
        assert_eq!(ReplyAgent::format_value(&json!(1e-7)), "1e-7");
        assert_eq!(ReplyAgent::format_value(&json!(-2.5e-8)), "-2.5e-8");
        assert_eq!(ReplyAgent::format_value(&json!(1e20)), "100000000000000000000");
        assert_eq!(ReplyAgent::format_value(&json!(0.000001)), "0.000001");
        assert_eq!(ReplyAgent::format_value(&json!(-0.0)), "0");
    }

    #[test]
    fn test_verbosity_bands() {
        assert_eq!(Verbosity::from_temperature(0.0), Verbosity::Low);
        assert_eq!(Verbosity::from_temperature(0.29), Verbosity::Low);
        assert_eq!(Verbosity::from_temperature(0.3), Verbosity::Medium);
        assert_eq!(Verbosity::from_temperature(0.69), Verbosity::Medium);
        assert_eq!(Verbosity::from_temperature(0.7), Verbosity::High);
        assert_eq!(Verbosity::from_temperature(1.5), Verbosity::High);
        assert_eq!(Verbosity::from_temperature(-1.0), Verbosity::Low);
    }

    #[test]
    fn test_low_temperature_shows_first_match_only() {
        let doc = json!({"city": "Oslo", "home_city": "Bergen"}).to_string();
        let response = ReplyAgent::generate_response(&doc, "city", 0.1, &mut rng());

        let (intro, rest) = response.split_once(' ').unwrap();
        assert!(!intro.is_empty());
        assert!(rest.ends_with("Oslo"));
        assert!(!response.contains("Bergen"));
        assert!(!response.contains('\n'));
    }

    #[test]
    fn test_medium_temperature_follow_up_only_with_several_matches() {
        let several = json!({"city": "Oslo", "home_city": "Bergen"}).to_string();
        let response = ReplyAgent::generate_response(&several, "city", 0.5, &mut rng());
        let (head, follow_up) = response.split_once("\n\n").unwrap();
        assert!(head.ends_with("Oslo"));
        assert!(FOLLOW_UP_PHRASES.contains(&follow_up));

        let single = json!({"city": "Oslo"}).to_string();
        let response = ReplyAgent::generate_response(&single, "city", 0.5, &mut rng());
        assert!(!response.contains("\n\n"));
        assert!(response.ends_with("Oslo"));
    }

    #[test]
    fn test_high_temperature_numbered_list() {
        let content = "Rust is fast\n\n   \nGo is simple\nrust has traits";
        let response = ReplyAgent::generate_response(content, "RUST", 0.9, &mut rng());

        let parts: Vec<&str> = response.split("\n\n").collect();
        assert_eq!(parts.len(), 4);
        assert!(INTRO_PHRASES.contains(&parts[0]));
        assert_eq!(parts[1], "1. \"Rust is fast\"");
        assert_eq!(parts[2], "2. \"rust has traits\"");
        assert!(FOLLOW_UP_PHRASES.contains(&parts[3]));
    }

    #[test]
    fn test_any_keyword_matches_a_paragraph() {
        let content = "alpha beta\ngamma\ndelta alpha";
        assert_eq!(
            ReplyAgent::find_relevant_paragraphs(content, "Gamma  delta"),
            vec!["gamma", "delta alpha"]
        );
    }

    #[test]
    fn test_blank_query_matches_no_paragraphs() {
        assert!(ReplyAgent::find_relevant_paragraphs("some text", "   ").is_empty());
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let first = ReplyAgent::generate_response(&profile(), "name", 0.8, &mut rng());
        let second = ReplyAgent::generate_response(&profile(), "name", 0.8, &mut rng());
        assert_eq!(first, second);
    }

    #[test]
    fn test_nan_temperature_is_high() {
        let response = ReplyAgent::generate_response(&profile(), "age", f32::NAN, &mut rng());
        assert!(response.contains("1. 30"));
    }
}
