//! `Result` alias and early-return precondition checks.

pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns `InvalidArgument` from the enclosing function unless `$cond` holds.
///
/// The error is attributed to `$name`. Its message is the optional format
/// arguments, or the text of the condition.
#[macro_export]
macro_rules! verify_arg {
    ($name:ident, $cond:expr $(,)?) => {
        if !$cond {
            return Err(
                $crate::error::Error::invalid_arg(stringify!($name), stringify!($cond)).into(),
            );
        }
    };
    ($name:ident, $cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err($crate::error::Error::invalid_arg(stringify!($name), format!($($msg)+)).into());
        }
    };
}

/// Returns `InvalidFormat` from the enclosing function unless `$cond` holds.
/// Used for stored or received bytes rather than caller arguments.
#[macro_export]
macro_rules! verify_data {
    ($name:ident, $cond:expr $(,)?) => {
        if !$cond {
            return Err(
                $crate::error::Error::invalid_format(stringify!($name), stringify!($cond)).into(),
            );
        }
    };
    ($name:ident, $cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err(
                $crate::error::Error::invalid_format(stringify!($name), format!($($msg)+)).into(),
            );
        }
    };
}
