//! Element-hiding selectors
//!
//! Selectors are validated and collected while a list is loaded. Nothing in
//! the request path reads them.

use std::collections::HashMap;

const SEPARATOR: &str = " , ";

#[derive(Debug, Default, Clone)]
pub struct ElementHiding {
    generic: Vec<String>,
    per_domain: HashMap<String, Vec<String>>,
}

impl ElementHiding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selector that applies to every site. Returns false if the
    /// selector was rejected.
    pub fn add_generic(&mut self, selector: &str) -> bool {
        if !is_valid_selector(selector) {
            return false;
        }
        self.generic.push(selector.to_string());
        true
    }

    /// Add a `domains<sep>selector` rule. `domains` is a comma-separated
    /// list; a leading `~` is stripped.
    pub fn add_per_domain(&mut self, line: &str, separator: &str) -> bool {
        let (domains, selector) = match line.split_once(separator) {
            Some(parts) => parts,
            None => return false,
        };
        if selector.is_empty() || !is_valid_selector(selector) {
            return false;
        }

        for domain in domains.split(',') {
            // Firefox-specific
            if domain == "~pregecko2" {
                continue;
            }
            let domain = domain.strip_prefix('~').unwrap_or(domain).trim();
            if domain.is_empty() {
                continue;
            }
            self.per_domain
                .entry(domain.to_string())
                .or_default()
                .push(selector.to_string());
        }
        true
    }

    /// Selectors for `domain`, generic ones first, joined for a stylesheet.
    pub fn css_for(&self, domain: &str) -> String {
        let specific = self.per_domain.get(domain).map(Vec::as_slice).unwrap_or(&[]);
        self.generic
            .iter()
            .chain(specific.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    pub fn generic_count(&self) -> usize {
        self.generic.len()
    }

    pub fn domain_count(&self) -> usize {
        self.per_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generic.is_empty() && self.per_domain.is_empty()
    }

    pub fn clear(&mut self) {
        self.generic.clear();
        self.per_domain.clear();
    }
}

/// Reject selectors with a quote, or with a colon outside `[...]`
/// (pseudo-classes and script-looking payloads).
fn is_valid_selector(selector: &str) -> bool {
    if selector.contains('\'') {
        return false;
    }
    !selector.contains(':') || has_bracketed_colon(selector)
}

fn has_bracketed_colon(selector: &str) -> bool {
    let open = match selector.find('[') {
        Some(pos) => pos,
        None => return false,
    };
    match selector[open..].find(':') {
        Some(colon) => selector[open + colon..].contains(']'),
        None => false,
    }
}
