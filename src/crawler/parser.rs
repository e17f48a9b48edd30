//! Link extractor
//!
//! Applies the run's extraction rules to a fetched document and returns the
//! raw href strings, in document order, that should re-enter the frontier.
//! Resolution, scoping and deduplication happen later in the engine.

use crate::config::ExtractionRule;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// An extraction rule with its selectors compiled
#[derive(Debug, Clone)]
pub enum CompiledRule {
    /// Every `a[href]` in the document
    AllAnchors { anchors: Selector },

    /// Elements matching `selector`, read through a descendant-or-self anchor
    Selector {
        selector: Selector,
        anchor: Selector,
        attribute: String,
    },
}

/// Compiles extraction rules once per run
///
/// An empty rule list compiles to a single "all anchors" rule.
///
/// # Errors
///
/// Returns `ConfigError::InvalidSelector` for a selector that does not parse
/// or an empty attribute name.
pub fn compile_rules(rules: &[ExtractionRule]) -> Result<Vec<CompiledRule>, ConfigError> {
    if rules.is_empty() {
        return Ok(vec![compile_rule(&ExtractionRule::AllAnchors)?]);
    }
    rules.iter().map(compile_rule).collect()
}

fn compile_rule(rule: &ExtractionRule) -> Result<CompiledRule, ConfigError> {
    match rule {
        ExtractionRule::AllAnchors => Ok(CompiledRule::AllAnchors {
            anchors: parse_selector("a[href]")?,
        }),
        ExtractionRule::Selector {
            selector,
            attribute,
        } => {
            if attribute.trim().is_empty() {
                return Err(ConfigError::InvalidSelector {
                    selector: selector.clone(),
                    message: "attribute name cannot be empty".to_string(),
                });
            }
            Ok(CompiledRule::Selector {
                selector: parse_selector(selector)?,
                anchor: parse_selector("a")?,
                attribute: attribute.clone(),
            })
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parses an HTML body and extracts candidate hrefs
///
/// The parsed document never outlives this call, so callers in async tasks
/// do not hold it across an await point.
pub fn extract_links_from_html(html: &str, rules: &[CompiledRule]) -> Vec<String> {
    let document = Html::parse_document(html);
    extract_links(&document, rules)
}

/// Extracts candidate hrefs from a parsed document
///
/// # Extraction Rules
///
/// - All anchors: the `href` of every anchor element, in document order
/// - Selector: for each element matching the selector, the attribute of the
///   element itself when it is an anchor, otherwise of its first descendant
///   anchor; elements without such an anchor yield nothing
///
/// Each rule runs independently over the whole document and the results are
/// concatenated in rule order. Duplicates are kept. Empty attribute values are
/// passed through for the resolver to reject.
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use web_trawl::config::ExtractionRule;
/// use web_trawl::crawler::{compile_rules, extract_links};
///
/// let html = Html::parse_document(r#"<div class="n"><a href="/next">next</a></div><a href="/x">x</a>"#);
/// let rules = compile_rules(&[ExtractionRule::selector("div.n")]).unwrap();
/// assert_eq!(extract_links(&html, &rules), vec!["/next"]);
/// ```
pub fn extract_links(document: &Html, rules: &[CompiledRule]) -> Vec<String> {
    let mut links = Vec::new();

    for rule in rules {
        match rule {
            CompiledRule::AllAnchors { anchors } => {
                links.extend(
                    document
                        .select(anchors)
                        .filter_map(|a| a.value().attr("href"))
                        .map(str::to_string),
                );
            }
            CompiledRule::Selector {
                selector,
                anchor,
                attribute,
            } => {
                links.extend(
                    document
                        .select(selector)
                        .filter_map(|element| anchor_attribute(element, anchor, attribute))
                        .map(str::to_string),
                );
            }
        }
    }

    links
}

/// Reads `attribute` from the element itself if it is an anchor carrying it,
/// otherwise from its first descendant anchor
fn anchor_attribute<'a>(
    element: ElementRef<'a>,
    anchor: &Selector,
    attribute: &str,
) -> Option<&'a str> {
    if element.value().name() == "a" {
        if let Some(value) = element.value().attr(attribute) {
            return Some(value);
        }
    }

    element
        .select(anchor)
        .find_map(|a| a.value().attr(attribute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, rules: &[ExtractionRule]) -> Vec<String> {
        let compiled = compile_rules(rules).unwrap();
        extract_links_from_html(html, &compiled)
    }

    #[test]
    fn test_all_anchors_in_document_order() {
        let html = r#"
            <html><body>
                <a href="/first">1</a>
                <p><a href="https://other.com/second">2</a></p>
                <a name="no-href">skip</a>
                <a href="third">3</a>
            </body></html>
        "#;
        assert_eq!(
            extract(html, &[ExtractionRule::AllAnchors]),
            vec!["/first", "https://other.com/second", "third"]
        );
    }

    #[test]
    fn test_empty_rules_follow_all_anchors() {
        let html = r#"<a href="/a">a</a><a href="/b">b</a>"#;
        assert_eq!(extract(html, &[]), vec!["/a", "/b"]);
    }

    #[test]
    fn test_empty_href_passed_through() {
        let html = r#"<a href="">empty</a><a href="/ok">ok</a>"#;
        assert_eq!(extract(html, &[ExtractionRule::AllAnchors]), vec!["", "/ok"]);
    }

    #[test]
    fn test_special_schemes_passed_through() {
        let html = r#"<a href="mailto:x@example.com">m</a><a href="javascript:void(0)">j</a>"#;
        assert_eq!(extract(html, &[]).len(), 2);
    }

    #[test]
    fn test_selector_reads_descendant_anchor() {
        let html = r#"
            <ul>
                <li class="item"><span><a href="/one">one</a></span></li>
                <li class="item"><a href="/two">two</a><a href="/two-b">b</a></li>
                <li class="other"><a href="/skip">skip</a></li>
            </ul>
        "#;
        assert_eq!(
            extract(html, &[ExtractionRule::selector("li.item")]),
            vec!["/one", "/two"]
        );
    }

    #[test]
    fn test_selector_matching_anchor_itself() {
        let html = r#"<a class="next" href="/page/2">next</a><a href="/x">x</a>"#;
        assert_eq!(
            extract(html, &[ExtractionRule::selector("a.next")]),
            vec!["/page/2"]
        );
    }

    #[test]
    fn test_selector_without_anchor_yields_nothing() {
        let html = r#"<div class="card">no link here</div><div class="card"><a href="/c">c</a></div>"#;
        assert_eq!(extract(html, &[ExtractionRule::selector("div.card")]), vec!["/c"]);
    }

    #[test]
    fn test_selector_anchor_missing_attribute_is_skipped() {
        let html = r#"<div class="card"><a name="x">x</a></div>"#;
        assert!(extract(html, &[ExtractionRule::selector("div.card")]).is_empty());
    }

    #[test]
    fn test_selector_custom_attribute() {
        let html = r#"<div class="row"><a data-url="/real" href="/fake">x</a></div>"#;
        let rule = ExtractionRule::Selector {
            selector: "div.row".to_string(),
            attribute: "data-url".to_string(),
        };
        assert_eq!(extract(html, &[rule]), vec!["/real"]);
    }

    #[test]
    fn test_multiple_rules_concatenated_with_duplicates() {
        let html = r#"
            <nav><a href="/home">home</a></nav>
            <div class="post"><a href="/post/1">p1</a></div>
            <div class="post"><a href="/home">home again</a></div>
        "#;
        let rules = [
            ExtractionRule::selector("div.post"),
            ExtractionRule::selector("nav"),
        ];
        assert_eq!(extract(html, &rules), vec!["/post/1", "/home", "/home"]);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let result = compile_rules(&[ExtractionRule::selector("div[[")]);
        assert!(matches!(result, Err(ConfigError::InvalidSelector { .. })));
    }

    #[test]
    fn test_empty_attribute_rejected() {
        let rule = ExtractionRule::Selector {
            selector: "div".to_string(),
            attribute: " ".to_string(),
        };
        assert!(matches!(
            compile_rules(&[rule]),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
