use std::fmt::{Display, Formatter, Result};

pub struct UrlToken<'a> {
    pub slug: Option<&'a str>,
    pub name: String,
    pub base_url: &'a str,
    pub class: &'a str,
}

impl Display for UrlToken<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        Display::fmt(&get_link(self), f)
    }
}

/// Takes a UrlToken and returns an HTML string.
pub fn get_link(token: &UrlToken) -> String {
    if let Some(slug) = token.slug {
        format!(
            "<a class=\"{}\" href=\"/{}/{}/\">{}</a>",
            token.class, token.base_url, slug, token.name
        )
    } else {
        format!("<span class=\"{}\">{}</span>", token.class, token.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_with_slug_renders_an_anchor() {
        let token = UrlToken {
            slug: Some("rust-lang"),
            name: "Rust".to_owned(),
            base_url: "group",
            class: "group-link",
        };
        assert_eq!(
            token.to_string(),
            "<a class=\"group-link\" href=\"/group/rust-lang/\">Rust</a>"
        );
    }

    #[test]
    fn token_without_slug_renders_a_span() {
        let token = UrlToken {
            slug: None,
            name: "nowhere".to_owned(),
            base_url: "group",
            class: "group-link",
        };
        assert_eq!(
            token.to_string(),
            "<span class=\"group-link\">nowhere</span>"
        );
    }
}
