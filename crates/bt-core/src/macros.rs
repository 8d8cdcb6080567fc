/// Debug-build-only trace hook. The branch is constant-false without `debug_assertions`, so
/// release builds drop it entirely.
macro_rules! bt_debug {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            tracing::debug!($($arg)*);
        }
    };
}
