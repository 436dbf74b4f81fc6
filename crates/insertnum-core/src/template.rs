use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::ParseError;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^%(?:(?P<position>[1-9][0-9]*)\$|\((?P<key>[^)]+)\))?",
        r"(?P<sign>\+)?(?P<pad>0|'[^$])?(?P<left>-)?(?P<width>[0-9]+)?",
        r"(?:\.(?P<precision>[0-9]+))?(?P<conversion>[b-gijostTuvxX])",
    ))
    .expect("placeholder grammar")
});

static KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("key grammar"));
static KEY_ACCESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.([A-Za-z_][A-Za-z0-9_]*)").expect("key access grammar"));
static INDEX_ACCESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([0-9]+)\]").expect("index access grammar"));

/// A parsed format template: literal text interleaved with directives.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatTemplate {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text copied to the output unchanged (`%%` becomes `Literal("%")`).
    Literal(String),
    Directive(Directive),
}

/// One `%...conversion` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub arg: ArgRef,
    pub force_sign: bool,
    pub pad: Option<Pad>,
    pub left_align: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub conversion: Conversion,
}

/// Which render argument a directive consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgRef {
    /// The next argument from the per-render cursor.
    Next,
    /// `N$`, 1-based.
    Position(usize),
    /// `(key.path)`, resolved against the first argument.
    Named(KeyPath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pad {
    Zero,
    Custom(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Binary,
    Char,
    Decimal,
    Integer,
    Json,
    Exponential,
    Fixed,
    General,
    Octal,
    String,
    Bool,
    TypeName,
    Unsigned,
    Primitive,
    Hex,
    HexUpper,
}

impl Conversion {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'b' => Conversion::Binary,
            'c' => Conversion::Char,
            'd' => Conversion::Decimal,
            'i' => Conversion::Integer,
            'j' => Conversion::Json,
            'e' => Conversion::Exponential,
            'f' => Conversion::Fixed,
            'g' => Conversion::General,
            'o' => Conversion::Octal,
            's' => Conversion::String,
            't' => Conversion::Bool,
            'T' => Conversion::TypeName,
            'u' => Conversion::Unsigned,
            'v' => Conversion::Primitive,
            'x' => Conversion::Hex,
            'X' => Conversion::HexUpper,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Conversion::Binary => 'b',
            Conversion::Char => 'c',
            Conversion::Decimal => 'd',
            Conversion::Integer => 'i',
            Conversion::Json => 'j',
            Conversion::Exponential => 'e',
            Conversion::Fixed => 'f',
            Conversion::General => 'g',
            Conversion::Octal => 'o',
            Conversion::String => 's',
            Conversion::Bool => 't',
            Conversion::TypeName => 'T',
            Conversion::Unsigned => 'u',
            Conversion::Primitive => 'v',
            Conversion::Hex => 'x',
            Conversion::HexUpper => 'X',
        }
    }

    /// Conversions whose argument must coerce to a number.
    pub fn requires_number(self) -> bool {
        matches!(
            self,
            Conversion::Binary
                | Conversion::Char
                | Conversion::Decimal
                | Conversion::Integer
                | Conversion::Exponential
                | Conversion::Fixed
                | Conversion::General
                | Conversion::Unsigned
                | Conversion::Hex
                | Conversion::HexUpper
        )
    }

    /// Conversions that print an explicit `+`/`-` in front of the padding.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Conversion::Decimal
                | Conversion::Integer
                | Conversion::Exponential
                | Conversion::Fixed
                | Conversion::General
        )
    }

    /// `T` and `v` look at a lazy value itself; everything else looks at its result.
    pub fn resolves_lazy(self) -> bool {
        !matches!(self, Conversion::TypeName | Conversion::Primitive)
    }
}

/// A pre-tokenized named-argument path such as `user.tags[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    accessors: Vec<Accessor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Key(String),
    Index(usize),
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Key(k) => f.write_str(k),
            Accessor::Index(i) => write!(f, "{i}"),
        }
    }
}

impl KeyPath {
    /// Tokenize `first.key[0].other`. The path must start with a plain key.
    pub fn parse(field: &str) -> Result<Self, ParseError> {
        let malformed = || ParseError::MalformedKey { key: field.to_string() };

        let first = KEY.find(field).ok_or_else(malformed)?;
        let mut accessors = vec![Accessor::Key(first.as_str().to_string())];
        let mut rest = &field[first.end()..];

        while !rest.is_empty() {
            if let Some(caps) = KEY_ACCESS.captures(rest) {
                accessors.push(Accessor::Key(caps[1].to_string()));
                rest = &rest[caps[0].len()..];
            } else if let Some(caps) = INDEX_ACCESS.captures(rest) {
                let index = caps[1].parse::<usize>().map_err(|_| malformed())?;
                accessors.push(Accessor::Index(index));
                rest = &rest[caps[0].len()..];
            } else {
                return Err(malformed());
            }
        }
        Ok(Self { accessors })
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, accessor) in self.accessors.iter().enumerate() {
            match accessor {
                Accessor::Key(k) if i == 0 => f.write_str(k)?,
                Accessor::Key(k) => write!(f, ".{k}")?,
                Accessor::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FormatTemplate {
    /// Parse a template in one left-to-right pass.
    ///
    /// At each position the scanner takes, in order: a run of non-`%` text, a `%%`
    /// escape, or a full directive. Anything else is an unexpected placeholder.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut has_named = false;
        let mut has_positional = false;

        while !rest.is_empty() {
            let offset = source.len() - rest.len();
            let literal_len = rest.find('%').unwrap_or(rest.len());

            let consumed = if literal_len > 0 {
                segments.push(Segment::Literal(rest[..literal_len].to_string()));
                literal_len
            } else if rest.starts_with("%%") {
                segments.push(Segment::Literal("%".to_string()));
                2
            } else if let Some(caps) = PLACEHOLDER.captures(rest) {
                let directive = directive_from_captures(&caps, offset)?;
                match directive.arg {
                    ArgRef::Named(_) => has_named = true,
                    ArgRef::Next | ArgRef::Position(_) => has_positional = true,
                }
                if has_named && has_positional {
                    return Err(ParseError::MixedReference);
                }
                segments.push(Segment::Directive(directive));
                caps[0].len()
            } else {
                return Err(ParseError::UnexpectedPlaceholder { offset });
            };

            rest = &rest[consumed..];
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template string this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Directive(d) => Some(d),
            Segment::Literal(_) => None,
        })
    }
}

fn directive_from_captures(caps: &Captures<'_>, offset: usize) -> Result<Directive, ParseError> {
    let number = |name: &str| -> Result<Option<usize>, ParseError> {
        caps.name(name)
            .map(|m| m.as_str().parse::<usize>())
            .transpose()
            .map_err(|_| ParseError::UnexpectedPlaceholder { offset })
    };

    let arg = if let Some(key) = caps.name("key") {
        ArgRef::Named(KeyPath::parse(key.as_str())?)
    } else if let Some(position) = number("position")? {
        ArgRef::Position(position)
    } else {
        ArgRef::Next
    };

    let pad = caps.name("pad").map(|m| match m.as_str().strip_prefix('\'') {
        Some(custom) => Pad::Custom(custom.chars().next().unwrap_or(' ')),
        None => Pad::Zero,
    });

    let conversion = caps
        .name("conversion")
        .and_then(|m| m.as_str().chars().next())
        .and_then(Conversion::from_char)
        .ok_or(ParseError::UnexpectedPlaceholder { offset })?;

    Ok(Directive {
        arg,
        force_sign: caps.name("sign").is_some(),
        pad,
        left_align: caps.name("left").is_some(),
        width: number("width")?,
        precision: number("precision")?,
        conversion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_directive(source: &str) -> Directive {
        let t = FormatTemplate::parse(source).unwrap();
        let mut it = t.directives();
        let d = it.next().unwrap().clone();
        assert!(it.next().is_none());
        d
    }

    #[test]
    fn parse_all_modifiers() {
        let d = only_directive("%2$+'*-8.3f");
        assert_eq!(d.arg, ArgRef::Position(2));
        assert!(d.force_sign);
        assert_eq!(d.pad, Some(Pad::Custom('*')));
        assert!(d.left_align);
        assert_eq!(d.width, Some(8));
        assert_eq!(d.precision, Some(3));
        assert_eq!(d.conversion, Conversion::Fixed);
    }

    #[test]
    fn zero_flag_is_not_width() {
        let d = only_directive("%05d");
        assert_eq!(d.pad, Some(Pad::Zero));
        assert_eq!(d.width, Some(5));
        let d = only_directive("%10d");
        assert_eq!(d.pad, None);
        assert_eq!(d.width, Some(10));
    }

    #[test]
    fn literals_and_escapes() {
        let t = FormatTemplate::parse("a%%b%sc").unwrap();
        assert_eq!(t.segments().len(), 5);
        assert_eq!(t.segments()[1], Segment::Literal("%".to_string()));
        assert_eq!(t.source(), "a%%b%sc");
    }

    #[test]
    fn named_key_path_is_tokenized() {
        let d = only_directive("%(user.tags[0].name)s");
        let ArgRef::Named(path) = d.arg else { panic!("expected named argument") };
        assert_eq!(
            path.accessors(),
            &[
                Accessor::Key("user".to_string()),
                Accessor::Key("tags".to_string()),
                Accessor::Index(0),
                Accessor::Key("name".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "user.tags[0].name");
    }

    #[test]
    fn rejects_unknown_conversion() {
        let err = FormatTemplate::parse("ab%q").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedPlaceholder { offset: 2 });
        let err = FormatTemplate::parse("100%").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedPlaceholder { offset: 3 });
    }

    #[test]
    fn rejects_malformed_key() {
        let err = FormatTemplate::parse("%(1abc)s").unwrap_err();
        assert!(matches!(err, ParseError::MalformedKey { .. }));
        let err = FormatTemplate::parse("%(a..b)s").unwrap_err();
        assert_eq!(err, ParseError::MalformedKey { key: "a..b".to_string() });
    }

    #[test]
    fn rejects_mixed_references() {
        let err = FormatTemplate::parse("%1$d %(x)s").unwrap_err();
        assert_eq!(err, ParseError::MixedReference);
        let err = FormatTemplate::parse("%(x)s %d").unwrap_err();
        assert_eq!(err, ParseError::MixedReference);
        assert!(FormatTemplate::parse("%1$d %d").is_ok());
    }
}
