//! Metadata extraction from an HTML document

use std::sync::LazyLock;

use scraper::ElementRef;
use scraper::Html;
use scraper::Selector;

use super::LinkMetadata;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Valid title selector"));

static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("Valid description selector")
});

static OG_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#).expect("Valid og:description selector")
});

/// Extract the metadata from an HTML document
///
/// Every field is looked up on its own, a missing element only leaves that field empty
pub fn extract_metadata(html: &str) -> LinkMetadata {
    let document = Html::parse_document(html);

    LinkMetadata {
        title: first_text(&document, &TITLE),
        description: first_content(&document, &DESCRIPTION),
        og_description: first_content(&document, &OG_DESCRIPTION),
    }
}

/// Text of the first element matching the selector
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .and_then(|text| clean(&text))
}

/// `content` attribute of the first element matching the selector
fn first_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .find_map(|element: ElementRef<'_>| element.value().attr("content"))
        .and_then(clean)
}

/// Drop line breaks and surrounding whitespace, nothing left means nothing found
fn clean(text: &str) -> Option<String> {
    let text = text.replace(['\r', '\n'], "");
    let text = text.trim();

    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_everything() {
        let html = r#"<!doctype html>
            <html>
            <head>
                <title>Example Domain</title>
                <meta name="description" content="An example page">
                <meta property="og:description" content="Example for sharing">
            </head>
            <body><p>Hi</p></body>
            </html>"#;

        assert_eq!(
            LinkMetadata {
                title: Some("Example Domain".to_string()),
                description: Some("An example page".to_string()),
                og_description: Some("Example for sharing".to_string()),
            },
            extract_metadata(html)
        );
    }

    #[test]
    fn test_title_newlines_are_stripped() {
        let metadata = extract_metadata("<html><head><title>A\nB</title></head></html>");

        assert_eq!(Some("AB".to_string()), metadata.title);
    }

    #[test]
    fn test_description_newlines_are_stripped() {
        let metadata = extract_metadata(
            "<html><head><meta name=\"description\" content=\"one\r\ntwo\"></head></html>",
        );

        assert_eq!(Some("onetwo".to_string()), metadata.description);
    }

    #[test]
    fn test_fields_are_independent() {
        let metadata = extract_metadata(
            r#"<html><head><title>Only a title</title><meta name="keywords" content="x"></head></html>"#,
        );

        assert_eq!(Some("Only a title".to_string()), metadata.title);
        assert_eq!(None, metadata.description);
        assert_eq!(None, metadata.og_description);
    }

    #[test]
    fn test_og_description_without_title() {
        let metadata = extract_metadata(
            r#"<html><head><meta property="og:description" content="Shared"></head></html>"#,
        );

        assert_eq!(None, metadata.title);
        assert_eq!(Some("Shared".to_string()), metadata.og_description);
    }

    #[test]
    fn test_first_title_wins() {
        let metadata =
            extract_metadata("<html><head><title>First</title><title>Second</title></head></html>");

        assert_eq!(Some("First".to_string()), metadata.title);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let metadata = extract_metadata(
            r#"<html><head><title> </title><meta name="description" content=""></head></html>"#,
        );

        assert_eq!(LinkMetadata::default(), metadata);
    }

    #[test]
    fn test_not_html() {
        assert_eq!(LinkMetadata::default(), extract_metadata("{\"json\": true}"));
    }
}
