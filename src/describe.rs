//! Human-readable value descriptions for error messages.

use crate::value::Value;

/// Which article to lead a description with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Article {
    /// "the str 'x'": type name followed by the value's rendering.
    The,
    /// "a str" / "an int": type name only.
    A,
}

/// Describes a value, e.g. `the str 'x'` or `an int`.
#[must_use]
pub fn describe(article: Article, value: &Value) -> String {
    let typename = value.type_name();
    match article {
        Article::The => add_article(&format!("{typename} {value}"), true, false),
        Article::A => add_article(&typename, false, false),
    }
}

/// Prefixes `name` with "the" or with "a"/"an" chosen by its first letter.
#[must_use]
pub fn add_article(name: &str, definite: bool, capital: bool) -> String {
    let article = if definite {
        "the"
    } else if name
        .chars()
        .next()
        .is_some_and(|c| "aeiouAEIOU".contains(c))
    {
        "an"
    } else {
        "a"
    };
    let article = if capital {
        let mut chars = article.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    } else {
        article.to_owned()
    };
    format!("{article} {name}")
}

/// Renders a list of alternatives as `a, b or c`.
#[must_use]
pub fn join_alternatives(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definite_includes_rendering() {
        assert_eq!(describe(Article::The, &Value::str("x")), "the str 'x'");
        assert_eq!(describe(Article::The, &Value::None), "the NoneType None");
    }

    #[test]
    fn indefinite_picks_a_or_an() {
        assert_eq!(describe(Article::A, &Value::Int(3)), "an int");
        assert_eq!(describe(Article::A, &Value::Float(3.0)), "a float");
    }

    #[test]
    fn capitalized_article() {
        assert_eq!(add_article("Foo", false, true), "A Foo");
        assert_eq!(add_article("int", true, true), "The int");
    }

    #[test]
    fn alternatives_join() {
        let items = vec!["an int".to_owned(), "a str".to_owned(), "None".to_owned()];
        assert_eq!(join_alternatives(&items), "an int, a str or None");
        assert_eq!(join_alternatives(&items[..1]), "an int");
    }
}
