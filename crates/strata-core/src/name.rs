//! Best-effort transformer name introspection.
//!
//! Rust has no runtime function names, so the name is recovered from the
//! transformer's type: a named `fn` item keeps its path in
//! [`std::any::type_name`], a closure does not.

/// Name given to transformers that have neither an explicit nor an
/// introspectable name.
pub const ANONYMOUS: &str = "[anonymous]";

/// Returns the name of the function item `F`, or `None` when `F` is a
/// closure, a function pointer or anything else without a usable name.
///
/// # Example
///
/// ```
/// use strata_core::name::fn_name;
///
/// fn strip_comments() {}
///
/// assert_eq!(fn_name_of(strip_comments), Some("strip_comments"));
/// assert_eq!(fn_name_of(|| ()), None);
///
/// fn fn_name_of<F>(_: F) -> Option<&'static str> {
///     fn_name::<F>()
/// }
/// ```
pub fn fn_name<F: ?Sized>() -> Option<&'static str> {
    let full = std::any::type_name::<F>();
    if full.contains("{{closure}}") || full.starts_with("fn(") || full.starts_with('&') {
        return None;
    }

    // Generic arguments would otherwise leak into the last segment.
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::")
        .next()
        .filter(|segment| !segment.is_empty() && !segment.starts_with("dyn "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of<F>(_: F) -> Option<&'static str> {
        fn_name::<F>()
    }

    fn uppercase(input: String) -> String {
        input.to_uppercase()
    }

    #[test]
    fn test_fn_item_name() {
        assert_eq!(name_of(uppercase), Some("uppercase"));
    }

    #[test]
    fn test_closure_is_anonymous() {
        let suffix = String::from("!");
        assert_eq!(name_of(move |s: String| s + &suffix), None);
        assert_eq!(name_of(|| 1), None);
    }

    #[test]
    fn test_fn_pointer_is_anonymous() {
        let ptr: fn(String) -> String = uppercase;
        assert_eq!(name_of(ptr), None);
    }
}
