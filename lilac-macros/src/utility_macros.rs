/// Returns `Err($err)` from the enclosing function unless `$cond` holds.
///
/// Used at the top of state-gated engine operations, where the alternative
/// would be a repeated `if !cond { return Err(...) }` at every call site.
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
