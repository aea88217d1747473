//! # Utility Functions Module
//!
//! This module provides utility functions that reduce boilerplate when
//! building converter command lines.

/// Converts an iterable of string-like items to `Vec<String>`.
///
/// # Example
/// ```ignore
/// use crate::utils::to_string_vec;
///
/// let args = to_string_vec([ini.display(), input.display(), output.display()]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Macro for building argument vectors without importing the function.
///
/// # Example
/// ```ignore
/// let args = args![config_file.display(), input.display(), output.display()];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item),*])
    };
}
