use crate::error::AcquireError;
use crate::html::{child_elements, element_text, selector, Page};
use crate::normalize;
use dirscrape_model::{Filter, ListingRecord};

/// Parse one index page into its listings.
///
/// Finds the single container matching `filter` and reads the first anchor of
/// every immediate `li` child: anchor text becomes the name, `href` the link.
/// A missing container is [`AcquireError::SelectorMiss`]; items without an
/// anchor or without an `href` are skipped.
pub fn extract_listings(page: &Page, filter: &Filter) -> Result<Vec<ListingRecord>, AcquireError> {
    let container = page.require(filter)?;
    let anchor_sel = selector("a")?;

    let mut listings = Vec::new();
    for (position, item) in child_elements(container, "li").enumerate() {
        let Some(anchor) = item.select(&anchor_sel).next() else {
            tracing::warn!(url = %page.url(), position, "List item has no link; skipping");
            continue;
        };
        let name = normalize::clean_field(&element_text(anchor));
        let Some(href) = anchor.value().attr("href") else {
            tracing::warn!(url = %page.url(), position, name = %name, "Link has no href; skipping");
            continue;
        };
        tracing::debug!(name = %name, href, "Listing");
        listings.push(ListingRecord::new(name, href.trim()));
    }

    Ok(listings)
}

/// Convenience wrapper: parse raw HTML and extract listings from it.
pub fn parse_listings(url: &str, html: &str, filter: &Filter) -> Result<Vec<ListingRecord>, AcquireError> {
    extract_listings(&Page::parse(url, html), filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_filter() -> Filter {
        Filter::class("ul", "list list--record")
    }

    #[test]
    fn test_single_listing() {
        let html = r#"<ul class="list list--record"><li><a href="/org/1">Alpha</a></li></ul>"#;
        let listings = parse_listings("https://example.org/A", html, &record_filter()).unwrap();
        assert_eq!(listings, vec![ListingRecord::new("Alpha", "/org/1")]);
    }

    #[test]
    fn test_one_listing_per_list_item() {
        let html = r#"
        <html><body>
        <nav><ul class="list"><li><a href="/home">Home</a></li></ul></nav>
        <ul class="list list--record">
            <li class="list__item"><a class="list__link" href="/directory_record/1/central-library">
                Central Library
            </a></li>
            <li class="list__item"><a class="list__link" href="/directory_record/2/corstorphine-library">Corstorphine Library</a></li>
            <li class="list__item"><a class="list__link" href="/directory_record/3/craigmillar-library">Craigmillar Library</a></li>
        </ul>
        </body></html>
        "#;
        let listings = parse_listings("https://example.org/C", html, &record_filter()).unwrap();
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].name, "Central Library");
        assert_eq!(listings[0].relative_link, "/directory_record/1/central-library");
        assert_eq!(listings[2].name, "Craigmillar Library");
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let html = r#"<ul class="list list--record">
            <li><a href="/org/2">Beta</a></li>
            <li><a href="/org/1">Alpha</a></li>
        </ul>"#;
        let page = Page::parse("https://example.org/A", html);
        let first = extract_listings(&page, &record_filter()).unwrap();
        let second = extract_listings(&page, &record_filter()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].name, "Beta");
    }

    #[test]
    fn test_missing_container_is_selector_miss() {
        let html = "<html><body><p>There are no entries for this letter.</p></body></html>";
        let err = parse_listings("https://example.org/X", html, &record_filter()).unwrap_err();
        assert!(matches!(err, AcquireError::SelectorMiss { .. }));
    }

    #[test]
    fn test_items_without_links_are_skipped() {
        let html = r#"<ul class="list list--record">
            <li>No link here</li>
            <li><a name="anchor-only">Gamma</a></li>
            <li><a href="/org/4">Delta</a></li>
        </ul>"#;
        let listings = parse_listings("https://example.org/D", html, &record_filter()).unwrap();
        assert_eq!(listings, vec![ListingRecord::new("Delta", "/org/4")]);
    }

    #[test]
    fn test_nested_lists_are_not_flattened() {
        let html = r#"<ul class="list list--record">
            <li><a href="/org/5">Epsilon</a>
                <ul><li><a href="/org/5/branch">Epsilon Branch</a></li></ul>
            </li>
        </ul>"#;
        let listings = parse_listings("https://example.org/E", html, &record_filter()).unwrap();
        assert_eq!(listings, vec![ListingRecord::new("Epsilon", "/org/5")]);
    }
}
