//! Hidden form-state token extraction.
//!
//! ASP.NET pages embed `__VIEWSTATE`, `__VIEWSTATEGENERATOR` and
//! `__EVENTVALIDATION` inputs that must be echoed back verbatim on the
//! next post; a post with stale or missing tokens is rejected. The
//! markup varies (attribute order, `name` vs `id`), so extraction runs
//! three independent strategies in order and keeps the first match per
//! token.

use regex::Regex;
use std::sync::LazyLock;

// Strategy 1: name attribute before value
static NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"name="(__VIEWSTATE|__VIEWSTATEGENERATOR|__EVENTVALIDATION)"[^>]*value="([^"]*)""#,
    )
    .unwrap()
});

// Strategy 2: value before name (common in ASP.NET output)
static VALUE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"value="([^"]*)"[^>]*name="(__VIEWSTATE|__VIEWSTATEGENERATOR|__EVENTVALIDATION)""#,
    )
    .unwrap()
});

// Strategy 3: id attribute instead of name
static ID_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"id="(__VIEWSTATE|__VIEWSTATEGENERATOR|__EVENTVALIDATION)"[^>]*value="([^"]*)""#,
    )
    .unwrap()
});

/// The three per-page state tokens. `viewstate` is mandatory for any
/// postback; the other two may legitimately be absent and are then
/// submitted empty.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub viewstate: Option<String>,
    pub viewstate_generator: Option<String>,
    pub event_validation: Option<String>,
}

impl PageState {
    fn set_if_absent(&mut self, token: &str, value: &str) {
        let slot = match token {
            "__VIEWSTATE" => &mut self.viewstate,
            "__VIEWSTATEGENERATOR" => &mut self.viewstate_generator,
            "__EVENTVALIDATION" => &mut self.event_validation,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    /// The token whose absence signals an unreachable portal or an
    /// expired session, depending on which page it was expected on.
    pub fn has_viewstate(&self) -> bool {
        self.viewstate.is_some()
    }

    pub fn viewstate(&self) -> &str {
        self.viewstate.as_deref().unwrap_or("")
    }

    pub fn viewstate_generator(&self) -> &str {
        self.viewstate_generator.as_deref().unwrap_or("")
    }

    pub fn event_validation(&self) -> &str {
        self.event_validation.as_deref().unwrap_or("")
    }
}

/// Extracts the hidden state tokens from an HTML page.
pub fn extract_page_state(html: &str) -> PageState {
    let mut state = PageState::default();

    for caps in NAME_FIRST.captures_iter(html) {
        state.set_if_absent(&caps[1], &caps[2]);
    }
    for caps in VALUE_FIRST.captures_iter(html) {
        state.set_if_absent(&caps[2], &caps[1]);
    }
    for caps in ID_FIRST.captures_iter(html) {
        state.set_if_absent(&caps[1], &caps[2]);
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_before_value() {
        let html = r#"<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="vs1" />
                      <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen1" />
                      <input type="hidden" name="__EVENTVALIDATION" value="ev1" />"#;
        let state = extract_page_state(html);
        assert_eq!(state.viewstate(), "vs1");
        assert_eq!(state.viewstate_generator(), "gen1");
        assert_eq!(state.event_validation(), "ev1");
    }

    #[test]
    fn extracts_value_before_name() {
        let html = r#"<input type="hidden" value="vs2" name="__VIEWSTATE" />
                      <input type="hidden" value="gen2" name="__VIEWSTATEGENERATOR" />"#;
        let state = extract_page_state(html);
        assert_eq!(state.viewstate(), "vs2");
        assert_eq!(state.viewstate_generator(), "gen2");
        assert_eq!(state.event_validation(), "");
    }

    #[test]
    fn extracts_id_based() {
        let html = r#"<input type="hidden" id="__VIEWSTATE" value="vs3" />"#;
        let state = extract_page_state(html);
        assert_eq!(state.viewstate(), "vs3");
    }

    #[test]
    fn first_strategy_wins_per_token() {
        // name-first match must not be overwritten by the id-based one
        let html = r#"<input name="__VIEWSTATE" value="primary" />
                      <input id="__VIEWSTATE" value="secondary" />"#;
        let state = extract_page_state(html);
        assert_eq!(state.viewstate(), "primary");
    }

    #[test]
    fn mixed_orderings_across_tokens() {
        let html = r#"<input name="__VIEWSTATE" value="vs" />
                      <input value="gen" name="__VIEWSTATEGENERATOR" />
                      <input id="__EVENTVALIDATION" value="ev" />"#;
        let state = extract_page_state(html);
        assert_eq!(state.viewstate(), "vs");
        assert_eq!(state.viewstate_generator(), "gen");
        assert_eq!(state.event_validation(), "ev");
    }

    #[test]
    fn missing_viewstate_detected() {
        let state = extract_page_state("<html><body>maintenance page</body></html>");
        assert!(!state.has_viewstate());
        assert_eq!(state.viewstate(), "");
    }
}
