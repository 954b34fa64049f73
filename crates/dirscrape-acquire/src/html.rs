use crate::error::AcquireError;
use dirscrape_model::Filter;
use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document remembered together with the address it came from,
/// so selector misses can say which page they happened on.
pub struct Page {
    url: String,
    document: Html,
}

impl Page {
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// First element matching `filter`, if any.
    pub fn find(&self, filter: &Filter) -> Result<Option<ElementRef<'_>>, AcquireError> {
        let sel = selector(&filter.css())?;
        Ok(self.document.select(&sel).next())
    }

    /// Every element matching `filter`, in document order.
    pub fn find_all(&self, filter: &Filter) -> Result<Vec<ElementRef<'_>>, AcquireError> {
        let sel = selector(&filter.css())?;
        Ok(self.document.select(&sel).collect())
    }

    /// Like [`Page::find`], but a miss is a typed [`AcquireError::SelectorMiss`].
    pub fn require(&self, filter: &Filter) -> Result<ElementRef<'_>, AcquireError> {
        self.find(filter)?.ok_or_else(|| AcquireError::SelectorMiss {
            url: self.url.clone(),
            selector: filter.css(),
        })
    }
}

pub fn selector(css: &str) -> Result<Selector, AcquireError> {
    Selector::parse(css).map_err(|e| AcquireError::InvalidSelector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Immediate element children of `parent` with the given tag name.
pub fn child_elements<'a>(parent: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

/// All descendant text of an element, concatenated.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}
