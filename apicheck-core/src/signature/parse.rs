//! Parser for textual type expressions.

use super::{TypeKind, TypeSignature, PRIMITIVES};
use crate::error::TypeParseError;

/// Parse a type expression such as `java.util.Map<K, V[]>...` into a
/// [`TypeSignature`].
///
/// Bare names come back as [`TypeKind::Class`] unless they are primitives;
/// whether a name is really a type variable depends on the declaring scope
/// and is decided by the loader. The one exception is the declaration form
/// `T extends Bound`, where `T` and its occurrences inside `Bound` are
/// variables by construction.
pub fn parse(expr: &str) -> Result<TypeSignature, TypeParseError> {
    let text = expr.trim();
    if text.is_empty() {
        return Err(TypeParseError::Empty);
    }
    check_balanced(text)?;

    let (text, varargs) = match text.strip_suffix("...") {
        Some(rest) => (rest.trim_end(), true),
        None => (text, false),
    };

    let mut sig = parse_type(text, expr)?;
    sig.varargs = varargs;
    Ok(sig)
}

/// Parse a declared type-parameter list such as
/// `<K extends java.lang.Comparable<K>, V>`.
///
/// Every declared name is marked as a type variable wherever it occurs in
/// any of the bounds, so `<A, B extends java.util.List<A>>` links `A` in
/// `B`'s bound.
pub fn parse_type_parameters(list: &str) -> Result<Vec<TypeSignature>, TypeParseError> {
    let text = list.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    check_balanced(text)?;
    let inner = text
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .ok_or_else(|| TypeParseError::Unbalanced(list.to_string()))?;

    let mut params = Vec::new();
    for piece in split_top_level(inner, ',') {
        if piece.trim().is_empty() {
            return Err(TypeParseError::EmptyArgument(list.to_string()));
        }
        let mut param = parse_type(piece, list)?;
        param.kind = TypeKind::TypeVariable;
        params.push(param);
    }

    let names: Vec<String> = params.iter().map(|p| p.qualified_name.clone()).collect();
    for param in &mut params {
        for bound in param.children_mut() {
            bound.mark_type_variables(&|n| names.iter().any(|d| d == n));
        }
    }
    Ok(params)
}

/// Split a declared name such as `Box<T extends Number>` into the bare name
/// and its type-parameter list.
pub(crate) fn split_declared_name(name: &str) -> Result<(String, Vec<TypeSignature>), TypeParseError> {
    match name.find('<') {
        Some(lt) => {
            let params = parse_type_parameters(&name[lt..])?;
            Ok((name[..lt].trim().to_string(), params))
        }
        None => Ok((name.trim().to_string(), Vec::new())),
    }
}

fn parse_type(text: &str, whole: &str) -> Result<TypeSignature, TypeParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TypeParseError::EmptyArgument(whole.to_string()));
    }

    if let Some((head, keyword, tail)) = split_bound_clause(text) {
        if tail.trim().is_empty() {
            return Err(TypeParseError::DanglingBound(whole.to_string()));
        }
        let mut bounds = Vec::new();
        for piece in split_top_level(tail, '&') {
            bounds.push(parse_type(piece, whole)?);
        }

        let mut sig = if head == "?" {
            TypeSignature::named(TypeKind::Wildcard, "?")
        } else {
            let mut var = parse_type(head, whole)?;
            var.kind = TypeKind::TypeVariable;
            let name = var.qualified_name.clone();
            for bound in &mut bounds {
                bound.mark_type_variables(&|n| n == name);
            }
            var
        };
        match keyword {
            Bound::Extends => sig.extends_bounds = bounds,
            Bound::Super => sig.super_bounds = bounds,
        }
        return Ok(sig);
    }

    if text == "?" {
        return Ok(TypeSignature::named(TypeKind::Wildcard, "?"));
    }

    // `Outer<A>.Inner<B>` names `Outer.Inner`; only arguments written on the
    // innermost type are kept.
    let mut type_arguments = Vec::new();
    let mut rest = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(lt) = text[cursor..].find('<').map(|i| cursor + i) {
        let gt = matching_close(text, lt).ok_or_else(|| TypeParseError::Unbalanced(whole.to_string()))?;
        rest.push_str(&text[cursor..lt]);
        type_arguments = split_top_level(&text[lt + 1..gt], ',')
            .into_iter()
            .map(|piece| parse_type(piece, whole))
            .collect::<Result<Vec<_>, _>>()?;
        cursor = gt + 1;
    }
    let tail = &text[cursor..];
    if tail.split('[').next().is_some_and(|name| !name.trim().is_empty()) {
        // The last group belonged to an enclosing type.
        type_arguments.clear();
    }
    rest.push_str(tail);

    let (name, dimension) = match rest.find('[') {
        Some(idx) => (
            rest[..idx].trim().to_string(),
            rest[idx..].chars().filter(|c| !c.is_whitespace()).collect(),
        ),
        None => (rest.trim().to_string(), String::new()),
    };
    if name.is_empty() {
        return Err(TypeParseError::EmptyArgument(whole.to_string()));
    }

    let kind = if PRIMITIVES.contains(&name.as_str()) {
        TypeKind::Primitive
    } else {
        TypeKind::Class
    };
    let mut sig = TypeSignature::named(kind, &name);
    sig.dimension = dimension;
    sig.type_arguments = type_arguments;
    Ok(sig)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Extends,
    Super,
}

/// Find the first ` extends ` or ` super ` outside any angle brackets.
fn split_bound_clause(text: &str) -> Option<(&str, Bound, &str)> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 => {
                let tail = &text[i..];
                match tail {
                    " extends" => return Some((text[..i].trim(), Bound::Extends, "")),
                    " super" => return Some((text[..i].trim(), Bound::Super, "")),
                    _ => {}
                }
                if let Some(after) = tail.strip_prefix(" extends ") {
                    return Some((text[..i].trim(), Bound::Extends, after));
                }
                if let Some(after) = tail.strip_prefix(" super ") {
                    return Some((text[..i].trim(), Bound::Super, after));
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the `>` closing the `<` at `open`.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `sep` where it occurs outside angle brackets.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn check_balanced(text: &str) -> Result<(), TypeParseError> {
    let mut angle = 0i32;
    let mut square = 0i32;
    for c in text.chars() {
        match c {
            '<' => angle += 1,
            '>' => angle -= 1,
            '[' => square += 1,
            ']' => square -= 1,
            _ => {}
        }
        if angle < 0 || square < 0 || square > 1 {
            return Err(TypeParseError::Unbalanced(text.to_string()));
        }
    }
    if angle != 0 || square != 0 {
        return Err(TypeParseError::Unbalanced(text.to_string()));
    }
    Ok(())
}
