use super::{Formatter, Params, ToSql};

use tabula_core::driver::Flavor;

pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let quoted = quote_ident(f.serializer.flavor, self.0.as_ref());
        f.dst.push_str(&quoted);
    }
}

/// Quotes an identifier for the given flavor, doubling any embedded quote
/// character.
pub fn quote_ident(flavor: Flavor, name: &str) -> String {
    let quote = match flavor {
        Flavor::Postgresql => '"',
        Flavor::Sqlite => '`',
    };

    let mut ret = String::with_capacity(name.len() + 2);
    ret.push(quote);
    for c in name.chars() {
        if c == quote {
            ret.push(quote);
        }
        ret.push(c);
    }
    ret.push(quote);
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(quote_ident(Flavor::Postgresql, "col"), "\"col\"");
        assert_eq!(quote_ident(Flavor::Sqlite, "col"), "`col`");
        assert_eq!(quote_ident(Flavor::Postgresql, "a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_ident(Flavor::Sqlite, "a`b"), "`a``b`");
    }
}
