//! Invocation contract for publishable handlers.

use async_trait::async_trait;

use crate::error::PublishError;
use crate::request::Request;
use crate::types::Value;

/// Declared parameter of a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// Value used when the parameter is bound neither by position nor by name.
    /// A parameter without a default is required.
    pub default: Option<Value>,
}

impl Param {
    #[must_use]
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default: None,
        }
    }

    #[must_use]
    pub fn optional(name: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            default: Some(default),
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Declared signature of a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Whether surplus positional arguments are collected into [`BoundArgs::rest`].
    pub variadic: bool,
}

impl Signature {
    #[must_use]
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params,
            variadic: false,
        }
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Arguments bound to a handler's signature, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    pub named: Vec<(String, Value)>,
    /// Surplus positional arguments, only populated for variadic handlers.
    pub rest: Vec<Value>,
}

impl BoundArgs {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Becomes the response body.
    Value(Value),
    /// The handler wrote into the request's response itself; no body is assigned.
    WroteResponse,
}

/// A publishable handler.
#[async_trait]
pub trait Callable: Send + Sync {
    fn signature(&self) -> &Signature;

    /// Invokes the handler with arguments bound to [`Callable::signature`].
    ///
    /// # Errors
    ///
    /// Any handler failure; [`PublishError::Retry`] signals a transient conflict.
    async fn call(&self, args: BoundArgs, request: &mut Request) -> Result<CallResult, PublishError>;
}

/// [`Callable`] backed by a synchronous closure.
pub struct FnCallable<F> {
    signature: Signature,
    func: F,
}

impl<F> FnCallable<F> {
    pub fn new(signature: Signature, func: F) -> Self
    where
        F: Fn(&BoundArgs, &mut Request) -> Result<CallResult, PublishError> + Send + Sync,
    {
        Self { signature, func }
    }
}

#[async_trait]
impl<F> Callable for FnCallable<F>
where
    F: Fn(&BoundArgs, &mut Request) -> Result<CallResult, PublishError> + Send + Sync,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn call(&self, args: BoundArgs, request: &mut Request) -> Result<CallResult, PublishError> {
        (self.func)(&args, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_iff_no_default() {
        assert!(Param::required("id").is_required());
        assert!(!Param::optional("page", Value::Int(1)).is_required());
    }

    #[test]
    fn bound_args_lookup_by_name() {
        let args = BoundArgs {
            named: vec![
                ("id".to_string(), Value::Int(7)),
                ("title".to_string(), Value::from("Home")),
            ],
            rest: Vec::new(),
        };
        assert_eq!(args.get("title"), Some(&Value::from("Home")));
        assert_eq!(args.get("missing"), None);
    }

    #[tokio::test]
    async fn fn_callable_invokes_closure() {
        let handler = FnCallable::new(Signature::new(vec![Param::required("name")]), |args: &BoundArgs, _req: &mut Request| {
            let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
            Ok(CallResult::Value(Value::from(format!("hello {name}"))))
        });

        let mut request = Request::builder().build();
        let args = BoundArgs {
            named: vec![("name".to_string(), Value::from("world"))],
            rest: Vec::new(),
        };
        let result = handler.call(args, &mut request).await.unwrap();
        assert_eq!(result, CallResult::Value(Value::from("hello world")));
        assert_eq!(handler.signature().params.len(), 1);
    }
}
