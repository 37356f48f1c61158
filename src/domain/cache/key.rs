//! Cache key composition

use std::fmt;

use uuid::Uuid;

/// Separator between key segments
pub const SEGMENT_SEPARATOR: char = '|';

/// Separator between the members of a list segment
pub const LIST_SEPARATOR: char = '_';

/// Prefixes a separator (or itself) occurring inside a value
pub const ESCAPE: char = '\\';

/// A composed, opaque cache key
///
/// Keys are order- and case-sensitive: two calls with the same logical inputs
/// in the same order produce identical keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Joins the parts with `|`, list parts joined internally with `_`.
    ///
    /// Separators inside values are escaped with `\\`, so free text such as a
    /// channel or a path cannot collide with the segment structure.
    pub fn compose(parts: &[KeyPart]) -> Self {
        let mut key = String::new();

        for (index, part) in parts.iter().enumerate() {
            if index > 0 {
                key.push(SEGMENT_SEPARATOR);
            }
            part.write_to(&mut key);
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// One segment of a cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Single(String),
    List(Vec<String>),
}

impl KeyPart {
    /// Marker for an absent argument
    pub fn empty() -> Self {
        Self::List(Vec::new())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        Self::List(items.into_iter().map(|item| item.to_string()).collect())
    }

    fn write_to(&self, out: &mut String) {
        match self {
            KeyPart::Single(value) => push_escaped(out, value),
            KeyPart::List(values) => {
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        out.push(LIST_SEPARATOR);
                    }
                    push_escaped(out, value);
                }
            }
        }
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, SEGMENT_SEPARATOR | LIST_SEPARATOR | ESCAPE) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<Uuid> for KeyPart {
    fn from(value: Uuid) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        Self::Single(value.to_string())
    }
}

macro_rules! key_part_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for KeyPart {
                fn from(value: $ty) -> Self {
                    Self::Single(value.to_string())
                }
            }
        )*
    };
}

key_part_from_integer!(i32, i64, u32, u64, usize);

impl<T: fmt::Display> From<&[T]> for KeyPart {
    fn from(values: &[T]) -> Self {
        Self::list(values)
    }
}

impl<T: fmt::Display> From<Vec<T>> for KeyPart {
    fn from(values: Vec<T>) -> Self {
        Self::list(values)
    }
}

/// Fluent builder for `{prefix}|{operation}|{arg1}_{arg2}_...` keys
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    prefix: Vec<KeyPart>,
    operation: Option<String>,
    args: Vec<KeyPart>,
}

impl CacheKeyBuilder {
    pub fn new(prefix: impl Into<KeyPart>) -> Self {
        Self {
            prefix: vec![prefix.into()],
            ..Default::default()
        }
    }

    /// Appends another prefix segment (entity kind, type name, scope...)
    pub fn scope(mut self, part: impl Into<KeyPart>) -> Self {
        self.prefix.push(part.into());
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Appends an argument; list arguments are flattened into the argument segment
    pub fn arg(mut self, arg: impl Into<KeyPart>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn build(self) -> CacheKey {
        let mut parts = self.prefix;

        if let Some(operation) = self.operation {
            parts.push(KeyPart::Single(operation));
        }

        let CacheKey(mut key) = CacheKey::compose(&parts);
        key.push(SEGMENT_SEPARATOR);
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                key.push(LIST_SEPARATOR);
            }
            arg.write_to(&mut key);
        }

        CacheKey(key)
    }
}
