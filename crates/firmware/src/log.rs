//! Logging front-end.
//!
//! Forwards to `defmt` on hardware builds and to `tracing` on the simulator
//! and in unit tests; otherwise the macros only type-check their arguments.
//! Format strings must stay within the subset both back-ends accept (`{}`
//! with arguments that implement both `Display` and `defmt::Format`).

macro_rules! __log {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($($arg)+);
        #[cfg(all(any(feature = "tracing", test), not(feature = "defmt")))]
        ::tracing::$level!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing", test)))]
        {
            let _ = ::core::format_args!($($arg)+);
        }
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => { $crate::log::__log!(debug, $($arg)+) };
}

macro_rules! info {
    ($($arg:tt)+) => { $crate::log::__log!(info, $($arg)+) };
}

// `warn` itself would clash with the built-in attribute on re-export.
macro_rules! warn_ {
    ($($arg:tt)+) => { $crate::log::__log!(warn, $($arg)+) };
}

macro_rules! error {
    ($($arg:tt)+) => { $crate::log::__log!(error, $($arg)+) };
}

pub(crate) use {__log, debug, error, info, warn_ as warn};
