use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Which strategy produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOrigin {
    InitialState,
    PreloadedState,
    LinkedData,
}

#[derive(Debug, Clone)]
pub struct LocatedPayload {
    pub payload: Value,
    pub origin: PayloadOrigin,
    /// The blob only parsed after trailing commas were stripped.
    pub repaired: bool,
}

static STATE_PATTERNS: Lazy<Vec<(PayloadOrigin, Regex)>> = Lazy::new(|| {
    vec![
        (
            PayloadOrigin::InitialState,
            Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.+?\});\s*(?:window|\n|<|$)")
                .expect("valid regex"),
        ),
        (
            PayloadOrigin::PreloadedState,
            Regex::new(r"(?s)window\.__PRELOADED_STATE__\s*=\s*(\{.+?\});").expect("valid regex"),
        ),
    ]
});

static TRAILING_BRACE_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*\}").expect("valid regex"));
static TRAILING_BRACKET_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*\]").expect("valid regex"));

static LINKED_DATA: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});

/// Finds the embedded application-state JSON in a page. `None` means the page carries
/// no usable data, which callers treat as a normal outcome.
pub fn locate(doc: &str) -> Option<LocatedPayload> {
    for (origin, pattern) in STATE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(doc) else {
            continue;
        };
        let Some(blob) = caps.get(1) else {
            continue;
        };
        match parse_state_blob(blob.as_str()) {
            Some((payload, repaired)) => {
                debug!(?origin, repaired, "state assignment located");
                return Some(LocatedPayload {
                    payload,
                    origin: *origin,
                    repaired,
                });
            }
            None => debug!(?origin, "state assignment matched but did not parse"),
        }
    }

    locate_linked_data(doc)
}

fn parse_state_blob(blob: &str) -> Option<(Value, bool)> {
    if let Ok(value) = serde_json::from_str::<Value>(blob) {
        return Some((value, false));
    }
    let repaired = repair_trailing_commas(blob);
    serde_json::from_str::<Value>(&repaired)
        .ok()
        .map(|value| (value, true))
}

/// Drops `,` (plus whitespace) directly before a closing brace or bracket.
pub fn repair_trailing_commas(blob: &str) -> String {
    let pass = TRAILING_BRACE_COMMA.replace_all(blob, "}");
    TRAILING_BRACKET_COMMA.replace_all(&pass, "]").into_owned()
}

fn locate_linked_data(doc: &str) -> Option<LocatedPayload> {
    let html = Html::parse_document(doc);
    for script in html.select(&LINKED_DATA) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(payload) => {
                debug!("linked-data block located");
                return Some(LocatedPayload {
                    payload,
                    origin: PayloadOrigin::LinkedData,
                    repaired: false,
                });
            }
            Err(err) => debug!("skipping linked-data block: {err}"),
        }
    }
    None
}
