use crate::error::AcquireError;
use crate::html::{element_text, Page};
use crate::normalize;
use dirscrape_model::{DetailRecord, Filter, ListingRecord};
use scraper::ElementRef;
use url::Url;

/// Resolve a listing's link against the site base.
///
/// Root-relative links (`/directory_record/...`) land on the base host;
/// absolute links are kept as they are.
pub fn resolve_link(site_base: &str, link: &str) -> Result<String, AcquireError> {
    let invalid = |source: url::ParseError| AcquireError::InvalidUrl {
        base: site_base.to_string(),
        link: link.to_string(),
        source,
    };
    let base = Url::parse(site_base).map_err(invalid)?;
    let resolved = base.join(link).map_err(invalid)?;
    Ok(resolved.into())
}

/// Read the definition list on a detail page into a record.
///
/// Only the list's own `dt`/`dd` children count, either directly or grouped
/// in `div` wrappers; a nested `dl` inside a value stays part of that value.
/// Each `dt` is paired with the `dd` that follows it. Counts that differ, an
/// ordering that cannot be paired (a `dd` before any `dt`, two `dt` in a
/// row) or a label that appears twice is an error rather than a silently
/// shortened record. The listing's name and the page address are merged in
/// last as `org_name` / `org_url`.
pub fn extract_detail(page: &Page, filter: &Filter, listing: &ListingRecord) -> Result<DetailRecord, AcquireError> {
    let container = page.require(filter)?;

    let terms: Vec<(bool, String)> = definition_terms(container)
        .map(|el| {
            let is_label = el.value().name() == "dt";
            let text = if is_label { element_text(el) } else { value_text(el) };
            (is_label, normalize::clean_field(&text))
        })
        .collect();

    let labels = terms.iter().filter(|(is_label, _)| *is_label).count();
    let values = terms.len() - labels;
    if labels != values {
        return Err(AcquireError::DefinitionMismatch {
            url: page.url().to_string(),
            labels,
            values,
        });
    }

    let unpaired = |detail: String| AcquireError::UnpairedDefinition {
        url: page.url().to_string(),
        detail,
    };

    let mut record = DetailRecord::new();
    let mut pending: Option<String> = None;
    for (position, (is_label, text)) in terms.into_iter().enumerate() {
        match (is_label, pending.take()) {
            (true, None) => pending = Some(text),
            (true, Some(previous)) => {
                return Err(unpaired(format!(
                    "label '{previous}' has no value before label '{text}' (element {position})"
                )));
            }
            (false, Some(label)) => {
                if record.get(&label).is_some() {
                    return Err(AcquireError::DuplicateLabel {
                        url: page.url().to_string(),
                        label,
                    });
                }
                record.insert(label, text);
            }
            (false, None) => {
                return Err(unpaired(format!("value '{text}' has no label (element {position})")));
            }
        }
    }
    if let Some(label) = pending {
        return Err(unpaired(format!("label '{label}' has no value")));
    }

    Ok(record.with_origin(&listing.name, page.url()))
}

/// Text of a `dd`. A nested `dl` becomes one `label: value` line per pair.
fn value_text(dd: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in dd.children() {
        match ElementRef::wrap(node) {
            Some(el) if el.value().name() == "dl" => {
                let mut terms = definition_terms(el).peekable();
                while let Some(term) = terms.next() {
                    text.push('\n');
                    text.push_str(element_text(term).trim());
                    if term.value().name() == "dt" {
                        if let Some(value) = terms.next_if(|next| next.value().name() == "dd") {
                            text.push_str(": ");
                            text.push_str(value_text(value).trim());
                        }
                    }
                }
                text.push('\n');
            }
            Some(el) => text.push_str(&element_text(el)),
            None => {
                if let Some(t) = node.value().as_text() {
                    text.push_str(t);
                }
            }
        }
    }
    text
}

/// The `dt`/`dd` elements belonging to `list` itself, in document order.
fn definition_terms<'a>(list: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    list.children()
        .filter_map(ElementRef::wrap)
        .flat_map(|el| -> Vec<ElementRef<'a>> {
            match el.value().name() {
                "dt" | "dd" => vec![el],
                "div" => el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|inner| matches!(inner.value().name(), "dt" | "dd"))
                    .collect(),
                _ => Vec::new(),
            }
        })
}

/// Convenience wrapper: parse raw HTML fetched from `url` and extract the record.
pub fn parse_detail(url: &str, html: &str, filter: &Filter, listing: &ListingRecord) -> Result<DetailRecord, AcquireError> {
    extract_detail(&Page::parse(url, html), filter, listing)
}
