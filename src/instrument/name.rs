//! Compile-time function naming.

/// Short name of the enclosing function, e.g. `"load_block"`.
///
/// Closure and async block frames are skipped, so the macro reports the
/// function that contains them.
///
/// ```
/// fn load_block() -> &'static str {
///     statter::func_name!()
/// }
/// assert_eq!(load_block(), "load_block");
/// ```
#[macro_export]
macro_rules! func_name {
    () => {{
        fn __here() {}
        $crate::instrument::short_func_name($crate::instrument::type_name_of(__here))
    }};
}

#[doc(hidden)]
pub fn type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Last meaningful segment of a Rust item path.
pub fn short_func_name(path: &'static str) -> &'static str {
    let path = path.strip_suffix("::__here").unwrap_or(path);
    path.rsplit("::")
        .find(|segment| !segment.starts_with("{{"))
        .unwrap_or(path)
}
