use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_until},
    combinator::complete,
    error::{ErrorKind, ParseError},
    multi::{many0, many1},
    sequence::delimited,
    Err, IResult,
};
use super::BlendParseError;
use std::convert::TryFrom;

/// Array dimension written as `[]` in the catalog. It has no known length and never takes part in size arithmetic.
pub const UNSIZED: i64 = -1;

#[derive(Debug)]
enum FieldParseError {
    NomError {
        kind: ErrorKind,
        other: Option<Box<FieldParseError>>,
    },
    InvalidArraySize,
}

impl ParseError<&str> for FieldParseError {
    fn from_error_kind(_input: &str, kind: ErrorKind) -> Self {
        FieldParseError::NomError { kind, other: None }
    }

    fn append(_input: &str, kind: ErrorKind, other: Self) -> Self {
        FieldParseError::NomError {
            kind,
            other: Some(Box::new(other)),
        }
    }
}

type Result<'a, T> = IResult<&'a str, T, FieldParseError>;

/// The shape of a field, derived from its declaration. Mirrors how the field would be written in C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInfo {
    Value,
    ValueArray {
        dimensions: Vec<i64>,
    },
    Pointer {
        indirection_count: usize,
    },
    PointerArray {
        indirection_count: usize,
        dimensions: Vec<i64>,
    },
    FnPointer,
}

/// A field declaration as stored in the catalog's name table (`*next`, `co[3]`, `(*func)()`), split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredName {
    /// The declaration exactly as it appears in the catalog.
    pub raw: String,
    /// The identifier without any pointer, array or parenthesis syntax. Never empty.
    pub clean_name: String,
    /// 0 for values, 1 for pointers (function pointers included), 2 for pointers to pointers.
    pub pointer_depth: usize,
    /// Array dimensions in declaration order, empty for non-arrays. `UNSIZED` marks `[]`.
    pub array_dimensions: Vec<i64>,
    pub is_fn_pointer: bool,
}

struct Parsed<'a> {
    name: &'a str,
    pointer_depth: usize,
    dimensions: Vec<i64>,
    fn_pointer: bool,
}

fn array_dimensions(input: &str) -> Result<Vec<i64>> {
    let (input, array_dimensions) =
        many0(complete(delimited(tag("["), take_until("]"), tag("]"))))(input)?;

    let mut dimensions = Vec::new();
    for dimension_str in array_dimensions {
        let dimension_str = dimension_str.trim();
        if dimension_str.is_empty() {
            dimensions.push(UNSIZED);
        } else {
            dimensions.push(
                dimension_str
                    .parse::<i64>()
                    .map_err(|_| Err::Failure(FieldParseError::InvalidArraySize))?,
            );
        }
    }

    Ok((input, dimensions))
}

fn name_and_dimensions(input: &str) -> Result<(&str, Vec<i64>)> {
    let (input, name) = take_till(|c| c == '[')(input)?;
    let (input, dimensions) = array_dimensions(input)?;
    Ok((input, (name.trim(), dimensions)))
}

fn fn_pointer(input: &str) -> Result<Parsed> {
    let (input, inner) = delimited(tag("(*"), take_until(")"), tag(")"))(input)?;
    let (input, _) = delimited(tag("("), take_until(")"), tag(")"))(input)?;

    let (rest, (name, dimensions)) = name_and_dimensions(inner)?;
    if !rest.is_empty() {
        return Err(Err::Error(FieldParseError::from_error_kind(
            rest,
            ErrorKind::Eof,
        )));
    }

    Ok((
        input,
        Parsed {
            name,
            pointer_depth: 1,
            dimensions,
            fn_pointer: true,
        },
    ))
}

fn pointer(input: &str) -> Result<Parsed> {
    let (input, asterisks) = many1(tag("*"))(input)?;
    let (input, (name, dimensions)) = name_and_dimensions(input)?;

    Ok((
        input,
        Parsed {
            name,
            pointer_depth: asterisks.len(),
            dimensions,
            fn_pointer: false,
        },
    ))
}

fn value(input: &str) -> Result<Parsed> {
    let (input, (name, dimensions)) = name_and_dimensions(input)?;

    Ok((
        input,
        Parsed {
            name,
            pointer_depth: 0,
            dimensions,
            fn_pointer: false,
        },
    ))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl DeclaredName {
    /// Parses a raw declaration. Anything that doesn't look like a C declarator becomes an opaque value field whose
    /// clean name is the raw text stripped of punctuation.
    pub fn parse<T: Into<String>>(raw: T) -> DeclaredName {
        let raw = raw.into();

        let parsed = match alt((fn_pointer, pointer, value))(raw.trim()) {
            Ok(("", parsed)) if is_identifier(parsed.name) => Some(parsed),
            _ => None,
        };

        match parsed {
            Some(parsed) => DeclaredName {
                clean_name: parsed.name.to_owned(),
                pointer_depth: parsed.pointer_depth,
                array_dimensions: parsed.dimensions,
                is_fn_pointer: parsed.fn_pointer,
                raw,
            },
            None => {
                tracing::warn!("unparseable field declaration {:?}, treating it as a value", raw);
                DeclaredName::opaque(raw)
            }
        }
    }

    fn opaque(raw: String) -> DeclaredName {
        let stripped: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        let clean_name = if !stripped.is_empty() {
            stripped
        } else if !raw.trim().is_empty() {
            raw.trim().to_owned()
        } else {
            String::from("unnamed")
        };

        DeclaredName {
            raw,
            clean_name,
            pointer_depth: 0,
            array_dimensions: Vec::new(),
            is_fn_pointer: false,
        }
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn is_array(&self) -> bool {
        !self.array_dimensions.is_empty()
    }

    /// Number of elements of a value array, ignoring `UNSIZED` dimensions. `None` if the field isn't an array or if
    /// every dimension is unsized. Fails if the count doesn't fit in a `usize`.
    pub fn element_count(&self) -> super::Result<Option<usize>> {
        let mut count: Option<usize> = None;
        for &dimension in self.array_dimensions.iter().filter(|&&d| d != UNSIZED) {
            let dimension = usize::try_from(dimension.max(0)).map_err(|_| self.too_large())?;
            let total = count.unwrap_or(1).checked_mul(dimension).ok_or_else(|| self.too_large())?;
            count = Some(total);
        }
        Ok(count)
    }

    pub(crate) fn too_large(&self) -> BlendParseError {
        BlendParseError::invalid_format(format!("field {:?} is too large", self.raw))
    }

    pub fn info(&self) -> FieldInfo {
        match (self.is_fn_pointer, self.pointer_depth, self.is_array()) {
            (true, _, _) => FieldInfo::FnPointer,
            (false, 0, false) => FieldInfo::Value,
            (false, 0, true) => FieldInfo::ValueArray {
                dimensions: self.array_dimensions.clone(),
            },
            (false, indirection_count, false) => FieldInfo::Pointer { indirection_count },
            (false, indirection_count, true) => FieldInfo::PointerArray {
                indirection_count,
                dimensions: self.array_dimensions.clone(),
            },
        }
    }
}
