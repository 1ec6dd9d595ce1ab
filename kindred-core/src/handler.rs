//! # Handler capability
//!
//! Handlers are the endpoints a payload is dispatched to. There are two
//! capability traits, one per execution model:
//!
//! - [`SyncHandler`]: borrows the payload and returns directly.
//! - [`Handler`]: takes a shared payload and returns a future.
//!
//! Both are parameterized by the payload shape `P` and an argument tuple
//! `A` of extra parameters passed positionally: `()`, `(A1,)`, `(A1, A2)`
//! or `(A1, A2, A3)`. "Fire-and-forget" handlers simply have
//! `Output = ()`.
//!
//! # Usage Patterns
//!
//! 1. **Closure**: `|button: &Button| render(button)` or
//!    `|button: Arc<Button>, depth: u8| async move { ... }`
//! 2. **Struct implementation**: `impl SyncHandler<Button> for ButtonRenderer`
//! 3. **Family handler**: `P = dyn Payload` accepts every payload, for
//!    registrations on a broad content type.

use std::{future::Future, sync::Arc};

/// A synchronous handler for payloads of shape `P`.
///
/// # Example
///
/// ```rust
/// use kindred_core::SyncHandler;
///
/// struct Textbox { text: String }
///
/// struct TextboxRenderer;
///
/// impl SyncHandler<Textbox> for TextboxRenderer {
///     type Output = String;
///
///     fn call(&self, payload: &Textbox, _args: ()) -> String {
///         format!("[{}]", payload.text)
///     }
/// }
///
/// let out = TextboxRenderer.call(&Textbox { text: "hi".into() }, ());
/// assert_eq!(out, "[hi]");
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot synchronously handle `{P}` with arguments `{A}`",
    label = "missing `SyncHandler<{P}, {A}>` implementation",
    note = "Closures must look like `Fn(&P, A1, .., An) -> R` with at most three extra arguments."
)]
pub trait SyncHandler<P: ?Sized, A = ()>: Send + Sync + 'static {
    /// The value returned to the dispatcher's caller.
    type Output: 'static;

    /// Executes the handler logic.
    fn call(&self, payload: &P, args: A) -> Self::Output;
}

/// An asynchronous handler for payloads of shape `P`.
///
/// The payload arrives as an `Arc` so the returned future can own it.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot asynchronously handle `{P}` with arguments `{A}`",
    label = "missing `Handler<{P}, {A}>` implementation",
    note = "Closures must look like `Fn(Arc<P>, A1, .., An) -> impl Future` with at most three extra arguments."
)]
pub trait Handler<P: ?Sized, A = ()>: Send + Sync + 'static {
    /// The value the future resolves to.
    type Output: Send + 'static;

    /// Executes the handler logic.
    fn call(&self, payload: Arc<P>, args: A) -> impl Future<Output = Self::Output> + Send;
}

macro_rules! impl_handler_fns {
    ($($arg:ident),*) => {
        impl<F, P, R, $($arg,)*> SyncHandler<P, ($($arg,)*)> for F
        where
            P: ?Sized,
            R: 'static,
            F: Fn(&P, $($arg,)*) -> R + Send + Sync + 'static,
        {
            type Output = R;

            #[allow(non_snake_case)]
            fn call(&self, payload: &P, ($($arg,)*): ($($arg,)*)) -> R {
                (self)(payload, $($arg,)*)
            }
        }

        impl<F, P, Fut, $($arg,)*> Handler<P, ($($arg,)*)> for F
        where
            P: ?Sized,
            F: Fn(Arc<P>, $($arg,)*) -> Fut + Send + Sync + 'static,
            Fut: Future + Send,
            Fut::Output: Send + 'static,
        {
            type Output = Fut::Output;

            #[allow(non_snake_case)]
            fn call(
                &self,
                payload: Arc<P>,
                ($($arg,)*): ($($arg,)*),
            ) -> impl Future<Output = Self::Output> + Send {
                (self)(payload, $($arg,)*)
            }
        }
    };
}

impl_handler_fns!();
impl_handler_fns!(A1);
impl_handler_fns!(A1, A2);
impl_handler_fns!(A1, A2, A3);

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
    }

    struct Doubler;

    impl SyncHandler<Counter> for Doubler {
        type Output = i32;

        fn call(&self, payload: &Counter, _args: ()) -> i32 {
            payload.value * 2
        }
    }

    struct AsyncAdder;

    impl Handler<Counter, (i32,)> for AsyncAdder {
        type Output = i32;

        async fn call(&self, payload: Arc<Counter>, (rhs,): (i32,)) -> i32 {
            payload.value + rhs
        }
    }

    fn call_sync<H, A>(handler: &H, payload: &Counter, args: A) -> H::Output
    where
        H: SyncHandler<Counter, A>,
    {
        handler.call(payload, args)
    }

    async fn call_async<H, A>(handler: &H, payload: Arc<Counter>, args: A) -> H::Output
    where
        H: Handler<Counter, A>,
    {
        handler.call(payload, args).await
    }

    #[test]
    fn test_struct_sync_handler() {
        assert_eq!(call_sync(&Doubler, &Counter { value: 21 }, ()), 42);
    }

    #[test]
    fn test_closure_sync_handler_arities() {
        let payload = Counter { value: 1 };
        let zero = |c: &Counter| c.value;
        let one = |c: &Counter, a: i32| c.value + a;
        let two = |c: &Counter, a: i32, b: i32| c.value + a + b;
        let three = |c: &Counter, a: i32, b: i32, d: i32| c.value + a + b + d;

        assert_eq!(call_sync(&zero, &payload, ()), 1);
        assert_eq!(call_sync(&one, &payload, (2,)), 3);
        assert_eq!(call_sync(&two, &payload, (2, 3)), 6);
        assert_eq!(call_sync(&three, &payload, (2, 3, 4)), 10);
    }

    #[test]
    fn test_fire_and_forget_closure() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let log = move |c: &Counter| sink.lock().unwrap().push(c.value);
        call_sync(&log, &Counter { value: 7 }, ());
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_struct_async_handler() {
        let out = call_async(&AsyncAdder, Arc::new(Counter { value: 40 }), (2,)).await;
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_closure_async_handler() {
        let handler = |c: Arc<Counter>, suffix: &'static str| async move {
            format!("{}{}", c.value, suffix)
        };
        let out = call_async(&handler, Arc::new(Counter { value: 5 }), ("!",)).await;
        assert_eq!(out, "5!");
    }
}
