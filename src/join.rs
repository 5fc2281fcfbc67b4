//! The `All` join combinator.

/// Join a heterogeneous set of promises into one promise of a tuple.
///
/// Expands to a direct promise whose body awaits each input in argument
/// order, resolving with the tuple of values once every input has resolved;
/// a `Promise<()>` input contributes `()` as its slot. The inputs are
/// already running, so this is a straight-line join; concurrency comes from
/// the inputs themselves, not from any scheduling here.
///
/// If an input rejects, awaiting stops right there and the join rejects with
/// that cause: the first failure *in argument order among those awaited*
/// wins, and later inputs are not consulted.
///
/// ```
/// use pledge::{all, Promise};
///
/// let joined = all!(
///     Promise::resolved(1),
///     Promise::resolved("x"),
///     Promise::resolved(()),
/// );
/// assert_eq!(joined.wait().unwrap(), (1, "x", ()));
/// ```
#[macro_export]
macro_rules! all {
    ($($promise:expr),+ $(,)?) => {
        $crate::make_promise(async move {
            ::core::result::Result::Ok(($($promise.await?,)+))
        })
    };
}
