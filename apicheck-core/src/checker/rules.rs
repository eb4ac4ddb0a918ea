//! Compatibility predicates over (old, new) pairs.
//!
//! Each predicate answers one question and knows nothing about reporting;
//! the comparator decides which category a `true` maps to.

use crate::model::{ClassEntry, ClassKind, FieldEntry, MethodEntry, Modifiers, Visibility};

/// Unchecked exceptions commonly thrown from APIs whose classes live outside
/// any described snapshot.
const KNOWN_UNCHECKED: &[&str] = &[
    "java.lang.RuntimeException",
    "java.lang.Error",
    "java.lang.IllegalArgumentException",
    "java.lang.IllegalStateException",
    "java.lang.NullPointerException",
    "java.lang.UnsupportedOperationException",
    "java.lang.IndexOutOfBoundsException",
    "java.lang.ArrayIndexOutOfBoundsException",
    "java.lang.ClassCastException",
    "java.lang.ArithmeticException",
    "java.lang.SecurityException",
    "java.lang.NumberFormatException",
    "java.util.ConcurrentModificationException",
    "java.util.NoSuchElementException",
];

pub fn visibility_narrowed(old: Visibility, new: Visibility) -> bool {
    new < old
}

/// Class and interface shapes are not interchangeable; exception, error and
/// enum classes are still classes.
pub fn kind_incompatible(old: ClassKind, new: ClassKind) -> bool {
    old.is_interface() != new.is_interface()
}

pub fn static_changed(old: &Modifiers, new: &Modifiers) -> bool {
    old.is_static != new.is_static
}

pub fn became_final(old: &Modifiers, new: &Modifiers) -> bool {
    !old.is_final && new.is_final
}

pub fn lost_final(old: &Modifiers, new: &Modifiers) -> bool {
    old.is_final && !new.is_final
}

/// Clients could extend or instantiate the old class.
pub fn instantiable(old: &ClassEntry) -> bool {
    !old.is_interface() && old.has_exported_constructor()
}

pub fn class_became_abstract(old: &ClassEntry, new: &ClassEntry) -> bool {
    !old.is_interface() && !old.modifiers.is_abstract && new.modifiers.is_abstract
}

pub fn method_became_abstract(
    old: &MethodEntry,
    old_in_interface: bool,
    new: &MethodEntry,
    new_in_interface: bool,
) -> bool {
    !old.is_effectively_abstract(old_in_interface) && new.is_effectively_abstract(new_in_interface)
}

/// A method newly final where clients could have overridden it.
pub fn method_became_final(old_class: &ClassEntry, old: &MethodEntry, new: &MethodEntry) -> bool {
    became_final(&old.modifiers, &new.modifiers)
        && !old_class.modifiers.is_final
        && !old.modifiers.is_static
}

/// A new method that every existing implementer must now provide.
pub fn is_added_abstract(new_class: &ClassEntry, old_class: &ClassEntry, added: &MethodEntry) -> bool {
    if !added.is_effectively_abstract(new_class.is_interface()) {
        return false;
    }
    old_class.is_interface() || old_class.has_exported_constructor()
}

/// Both sides are compile-time constants and the literal differs.
pub fn constant_value_changed(old: &FieldEntry, new: &FieldEntry) -> bool {
    let is_constant = |f: &FieldEntry| f.modifiers.is_static && f.modifiers.is_final;
    match (&old.value, &new.value) {
        (Some(a), Some(b)) => is_constant(old) && is_constant(new) && a != b,
        _ => false,
    }
}

pub fn is_known_unchecked(name: &str) -> bool {
    KNOWN_UNCHECKED.contains(&name)
}

/// Unchecked when any supertype is `RuntimeException` or `Error`.
pub fn chain_is_unchecked<'a>(chain: impl IntoIterator<Item = &'a str>) -> bool {
    chain.into_iter().any(is_known_unchecked)
}
