//! Units of work wrapped by nodes.
//!
//! A [`Callable`] is built once through one of its constructors, which fixes
//! its [`CallableKind`] for the node's whole lifetime. The node never inspects
//! what a callable returned to decide how to run it next.

use core::fmt;
use core::future::Future;
use core::ops::Index;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{BoxStream, Stream, StreamExt};
use hashbrown::HashMap;

use crate::error::CallError;
use crate::signal::Signal;
use crate::value::Value;

/// Static keyword configuration handed to every execution of a callable.
pub type Kwargs = HashMap<String, Value>;

/// The result of one step of a callable.
pub type CallResult = Result<Signal, CallError>;

/// Iterator driven one step per execution by generator callables.
pub type SignalIter = Box<dyn Iterator<Item = CallResult> + Send>;

/// Stream driven one item per execution by async generator callables.
pub type SignalStream = BoxStream<'static, CallResult>;

type FunctionBody = Box<dyn FnMut(Args<'_>) -> CallResult + Send>;
type GeneratorFactory = Box<dyn FnMut(Args<'_>) -> Result<SignalIter, CallError> + Send>;
type AsyncBody = Box<dyn FnMut(Args<'_>) -> BoxFuture<'static, CallResult> + Send>;
type StreamFactory = Box<dyn FnMut(Args<'_>) -> Result<SignalStream, CallError> + Send>;
type BlockingBody = Arc<dyn Fn(&[Value], &Kwargs) -> CallResult + Send + Sync>;

/// Arguments for one execution: the active slot values in slot order, plus
/// the node's keyword configuration.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
    kwargs: &'a Kwargs,
}

impl<'a> Args<'a> {
    /// Creates a new argument view.
    #[must_use]
    pub fn new(values: &'a [Value], kwargs: &'a Kwargs) -> Self {
        Self { values, kwargs }
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no positional arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the positional argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// All positional arguments.
    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Returns a keyword argument by name.
    #[must_use]
    pub fn kwarg(&self, name: &str) -> Option<&'a Value> {
        self.kwargs.get(name)
    }

    /// All keyword arguments.
    #[must_use]
    pub fn kwargs(&self) -> &'a Kwargs {
        self.kwargs
    }
}

impl Index<usize> for Args<'_> {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// How a callable is driven, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    /// One call produces one result.
    Function,
    /// A factory builds an iterator that is advanced one step per execution.
    Generator,
    /// One call produces one future, awaited for its result.
    Async,
    /// A factory builds a stream that yields one item per execution.
    AsyncGenerator,
    /// One call runs on the runtime's blocking thread pool.
    Blocking,
    /// Permanently yields [`Signal::End`].
    Exhausted,
}

/// Outcome of one call, as seen by the node.
pub(crate) enum Step {
    /// The callable produced a candidate result.
    Yield(Signal),
    /// A generator-backed callable discarded its iterator and will rebuild it
    /// from the factory on the next execution.
    Restart(CallError),
}

enum Body {
    Function(FunctionBody),
    Generator {
        factory: GeneratorFactory,
        current: Option<SignalIter>,
    },
    Async(AsyncBody),
    AsyncGenerator {
        factory: StreamFactory,
        current: Option<SignalStream>,
    },
    Blocking(BlockingBody),
    Exhausted,
}

/// The unit of work wrapped by a node.
///
/// # Example
///
/// ```ignore
/// let double = Callable::unary(|v| v.checked_mul(&Value::Int(2)));
/// let numbers = Callable::values([1, 2, 3, 4, 5]);
/// let ticks = Callable::source(|| Ok(Value::from("tick")));
/// ```
pub struct Callable {
    body: Body,
    arity: Option<usize>,
}

impl Callable {
    fn new(body: Body, arity: Option<usize>) -> Self {
        Self { body, arity }
    }

    /// Wraps a plain function taking any number of arguments.
    pub fn function<F, S>(mut f: F) -> Self
    where
        F: FnMut(Args<'_>) -> Result<S, CallError> + Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Function(Box::new(move |args: Args<'_>| -> CallResult {
                f(args).map(Into::into)
            })),
            None,
        )
    }

    /// Wraps a function of no arguments.
    pub fn source<F, S>(mut f: F) -> Self
    where
        F: FnMut() -> Result<S, CallError> + Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Function(Box::new(move |_: Args<'_>| -> CallResult {
                f().map(Into::into)
            })),
            Some(0),
        )
    }

    /// Wraps a function of one argument.
    pub fn unary<F, S>(mut f: F) -> Self
    where
        F: FnMut(&Value) -> Result<S, CallError> + Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Function(Box::new(move |args: Args<'_>| -> CallResult {
                f(&args[0]).map(Into::into)
            })),
            Some(1),
        )
    }

    /// Wraps a function of two arguments.
    pub fn binary<F, S>(mut f: F) -> Self
    where
        F: FnMut(&Value, &Value) -> Result<S, CallError> + Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Function(Box::new(move |args: Args<'_>| -> CallResult {
                f(&args[0], &args[1]).map(Into::into)
            })),
            Some(2),
        )
    }

    /// Wraps an iterator factory.
    ///
    /// The factory runs on the first execution, with that execution's
    /// arguments. Every later execution advances the iterator by one step;
    /// exhaustion yields [`Signal::End`].
    pub fn generator<F, I>(mut f: F) -> Self
    where
        F: FnMut(Args<'_>) -> I + Send + 'static,
        I: IntoIterator,
        I::Item: Into<Signal>,
        I::IntoIter: Send + 'static,
    {
        Self::new(
            Body::Generator {
                factory: Box::new(move |args: Args<'_>| -> Result<SignalIter, CallError> {
                    let iter = f(args).into_iter().map(|item| -> CallResult { Ok(item.into()) });
                    Ok(Box::new(iter) as SignalIter)
                }),
                current: None,
            },
            None,
        )
    }

    /// Wraps a fallible iterator factory.
    ///
    /// An [`CallError::InvalidState`] from the factory or from any item
    /// discards the iterator; the factory is invoked again on the next
    /// execution.
    pub fn try_generator<F, I, S>(mut f: F) -> Self
    where
        F: FnMut(Args<'_>) -> Result<I, CallError> + Send + 'static,
        I: IntoIterator<Item = Result<S, CallError>>,
        I::IntoIter: Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Generator {
                factory: Box::new(move |args: Args<'_>| -> Result<SignalIter, CallError> {
                    let iter = f(args)?
                        .into_iter()
                        .map(|item| -> CallResult { item.map(Into::into) });
                    Ok(Box::new(iter) as SignalIter)
                }),
                current: None,
            },
            None,
        )
    }

    /// A source replaying a fixed sequence of items, one per execution.
    pub fn values<I>(items: I) -> Self
    where
        I: IntoIterator + Clone + Send + 'static,
        I::Item: Into<Signal>,
        I::IntoIter: Send + 'static,
    {
        Self::generator(move |_| items.clone()).with_arity(0)
    }

    /// Wraps an async function.
    ///
    /// The returned future must own everything it needs; clone values out of
    /// [`Args`] before the `async` block.
    pub fn future<F, Fut, S>(mut f: F) -> Self
    where
        F: FnMut(Args<'_>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<S, CallError>> + Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Async(Box::new(move |args: Args<'_>| -> BoxFuture<'static, CallResult> {
                let fut = f(args);
                async move { fut.await.map(Into::into) }.boxed()
            })),
            None,
        )
    }

    /// Wraps an async stream factory, the async counterpart of
    /// [`Callable::try_generator`].
    pub fn stream<F, St, S>(mut f: F) -> Self
    where
        F: FnMut(Args<'_>) -> St + Send + 'static,
        St: Stream<Item = Result<S, CallError>> + Send + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::AsyncGenerator {
                factory: Box::new(move |args: Args<'_>| -> Result<SignalStream, CallError> {
                    Ok(f(args)
                        .map(|item| -> CallResult { item.map(Into::into) })
                        .boxed())
                }),
                current: None,
            },
            None,
        )
    }

    /// Wraps a CPU-bound or blocking function. Each execution runs on the
    /// runtime's blocking pool.
    pub fn blocking<F, S>(f: F) -> Self
    where
        F: Fn(&[Value], &Kwargs) -> Result<S, CallError> + Send + Sync + 'static,
        S: Into<Signal>,
    {
        Self::new(
            Body::Blocking(Arc::new(move |values: &[Value], kwargs: &Kwargs| -> CallResult {
                f(values, kwargs).map(Into::into)
            })),
            None,
        )
    }

    /// Declares the number of positional arguments this callable takes.
    #[must_use]
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// The declared arity, or `None` for variadic callables.
    #[must_use]
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// How this callable is driven.
    #[must_use]
    pub fn kind(&self) -> CallableKind {
        match &self.body {
            Body::Function(_) => CallableKind::Function,
            Body::Generator { .. } => CallableKind::Generator,
            Body::Async(_) => CallableKind::Async,
            Body::AsyncGenerator { .. } => CallableKind::AsyncGenerator,
            Body::Blocking(_) => CallableKind::Blocking,
            Body::Exhausted => CallableKind::Exhausted,
        }
    }

    /// Replaces the body with one that always yields [`Signal::End`].
    pub(crate) fn exhaust(&mut self) {
        self.body = Body::Exhausted;
    }

    /// Runs one execution.
    pub(crate) async fn call(
        &mut self,
        values: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Step, CallError> {
        let args = Args::new(values, kwargs);
        match &mut self.body {
            Body::Function(f) => f(args).map(Step::Yield),
            Body::Async(f) => f(args).await.map(Step::Yield),
            Body::Blocking(f) => {
                let f = Arc::clone(f);
                let values = values.to_vec();
                let kwargs = kwargs.clone();
                tokio::task::spawn_blocking(move || f(&values, &kwargs))
                    .await
                    .map_err(|err| CallError::Panicked(err.to_string()))?
                    .map(Step::Yield)
            }
            Body::Generator { factory, current } => {
                if current.is_none() {
                    match factory(args) {
                        Ok(iter) => *current = Some(iter),
                        Err(err @ CallError::InvalidState(_)) => return Ok(Step::Restart(err)),
                        Err(err) => return Err(err),
                    }
                }
                match current.as_mut().and_then(Iterator::next) {
                    None => Ok(Step::Yield(Signal::End)),
                    Some(Ok(signal)) => Ok(Step::Yield(signal)),
                    Some(Err(err @ CallError::InvalidState(_))) => {
                        *current = None;
                        Ok(Step::Restart(err))
                    }
                    Some(Err(err)) => Err(err),
                }
            }
            Body::AsyncGenerator { factory, current } => {
                if current.is_none() {
                    match factory(args) {
                        Ok(stream) => *current = Some(stream),
                        Err(err @ CallError::InvalidState(_)) => return Ok(Step::Restart(err)),
                        Err(err) => return Err(err),
                    }
                }
                let next = match current.as_mut() {
                    Some(stream) => stream.next().await,
                    None => None,
                };
                match next {
                    None => Ok(Step::Yield(Signal::End)),
                    Some(Ok(signal)) => Ok(Step::Yield(signal)),
                    Some(Err(err @ CallError::InvalidState(_))) => {
                        *current = None;
                        Ok(Step::Restart(err))
                    }
                    Some(Err(err)) => Err(err),
                }
            }
            Body::Exhausted => Ok(Step::Yield(Signal::End)),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("kind", &self.kind())
            .field("arity", &self.arity)
            .finish()
    }
}
