//! Parsed documents and predicate-based tree search
//!
//! Extraction is written as pure predicates over elements (`is_system_link`,
//! `is_spec_row`, ...) handed to [`Document::find_all`]. Predicates inspect
//! only the element they are given, so they can be tested against hand-built
//! fixtures without any network access.

use scraper::{ElementRef, Html};

/// A fetched and parsed HTML document
pub struct Document {
    url: String,
    html: Html,
}

impl Document {
    /// Parses an HTML body retrieved from `url`
    pub fn parse(url: impl Into<String>, body: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(body),
        }
    }

    /// The URL the document was retrieved from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every element, in document order, for which `predicate` holds
    pub fn find_all<P>(&self, predicate: P) -> Vec<ElementRef<'_>>
    where
        P: Fn(&ElementRef<'_>) -> bool,
    {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| predicate(element))
            .collect()
    }
}

/// The `href` attribute of an element
pub fn href<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    element.value().attr("href")
}

/// Concatenated text of an element and its descendants, untrimmed
pub fn text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// Descendant elements with the given tag name, in document order
pub fn descendants_named<'a>(element: &ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == name)
        .collect()
}

/// First descendant element with the given tag name
pub fn first_descendant_named<'a>(element: &ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
}

/// Element predicates used by the extractors
pub mod predicates {
    use super::{first_descendant_named, href};
    use scraper::ElementRef;

    /// Links to a release, e.g. `/lists/2020/06`
    ///
    /// The href must contain `/lists/` and its third `/`-separated component
    /// (the year) must be exactly four characters long.
    pub fn is_release_link(element: &ElementRef<'_>) -> bool {
        href(element).is_some_and(|href| {
            href.contains("/lists/")
                && href
                    .split('/')
                    .nth(2)
                    .is_some_and(|year| year.chars().count() == 4)
        })
    }

    /// Links to a system detail page, e.g. `/system/179807`
    pub fn is_system_link(element: &ElementRef<'_>) -> bool {
        href(element).is_some_and(|href| href.starts_with("/system"))
    }

    /// Attribute rows: a `tr` holding both a `th` label and a `td` value
    pub fn is_spec_row(element: &ElementRef<'_>) -> bool {
        element.value().name() == "tr"
            && first_descendant_named(element, "th").is_some()
            && first_descendant_named(element, "td").is_some()
    }

    /// The footer row carrying the system's rank (`tr.sublist.odd`)
    pub fn is_summary_row(element: &ElementRef<'_>) -> bool {
        let value = element.value();
        value.name() == "tr"
            && value.classes().any(|c| c == "sublist")
            && value.classes().any(|c| c == "odd")
    }
}

#[cfg(test)]
mod tests {
    use super::predicates::*;
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse("https://www.top500.org/test", body)
    }

    #[test]
    fn test_find_all_document_order() {
        let document = doc(r#"<ul><li id="a"></li><li id="b"><li id="c"></li></ul>"#);
        let ids: Vec<&str> = document
            .find_all(|el| el.value().name() == "li")
            .iter()
            .filter_map(|el| el.value().attr("id"))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_all_no_matches() {
        let document = doc("<p>nothing here</p>");
        assert!(document.find_all(is_system_link).is_empty());
    }

    #[test]
    fn test_is_release_link() {
        let document = doc(
            r#"
            <a id="yes1" href="/lists/2020/06">June 2020</a>
            <a id="yes2" href="/lists/1993/06/">June 1993</a>
            <a id="no1" href="/lists/top500/">Lists</a>
            <a id="no2" href="https://www.top500.org/lists/2020/06">absolute</a>
            <a id="no3" href="/list/2020/06/">singular</a>
            <a id="no4">no href</a>
            "#,
        );
        let ids: Vec<&str> = document
            .find_all(is_release_link)
            .iter()
            .filter_map(|el| el.value().attr("id"))
            .collect();
        assert_eq!(ids, vec!["yes1", "yes2"]);
    }

    #[test]
    fn test_is_system_link() {
        let document = doc(
            r#"
            <a id="yes1" href="/system/179807">Fugaku</a>
            <a id="yes2" href="/system/">bare</a>
            <a id="no1" href="/site/50831">site</a>
            <a id="no2" href="https://www.top500.org/system/1">absolute</a>
            "#,
        );
        let ids: Vec<&str> = document
            .find_all(is_system_link)
            .iter()
            .filter_map(|el| el.value().attr("id"))
            .collect();
        assert_eq!(ids, vec!["yes1", "yes2"]);
    }

    #[test]
    fn test_is_spec_row() {
        let document = doc(
            r#"<table>
                <tr id="spec"><th>Cores:</th><td>7,630,848</td></tr>
                <tr id="header"><th>Only header</th></tr>
                <tr id="data"><td>Only</td><td>data</td></tr>
            </table>"#,
        );
        let ids: Vec<&str> = document
            .find_all(is_spec_row)
            .iter()
            .filter_map(|el| el.value().attr("id"))
            .collect();
        assert_eq!(ids, vec!["spec"]);
    }

    #[test]
    fn test_is_summary_row() {
        let document = doc(
            r#"<table>
                <tr id="yes1" class="sublist odd"><td>2020/06</td><td>1</td></tr>
                <tr id="yes2" class="odd sublist extra"><td>2019/11</td><td>2</td></tr>
                <tr id="no1" class="sublist even"><td>x</td><td>3</td></tr>
                <tr id="no2" class="odd"><td>x</td><td>4</td></tr>
            </table>"#,
        );
        let ids: Vec<&str> = document
            .find_all(is_summary_row)
            .iter()
            .filter_map(|el| el.value().attr("id"))
            .collect();
        assert_eq!(ids, vec!["yes1", "yes2"]);
    }

    #[test]
    fn test_text_is_verbatim() {
        let document = doc("<table><tr><td>  Linux <b>x86</b>\n</td></tr></table>");
        let cell = document.find_all(|e| e.value().name() == "td").remove(0);
        assert_eq!(text(&cell), "  Linux x86\n");
    }
}
