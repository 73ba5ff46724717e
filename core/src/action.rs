//! Actions and the targets a chain can be keyed on.
//!
//! An [`Action`] is anything carrying a type string and a payload. Chains never
//! look inside an action beyond those two accessors: the type string selects
//! handlers, the payload is handed to derivation handlers.
//!
//! Registration keys are resolved from a [`ChainTarget`], which covers both
//! literal type strings and action creators.
//!
//! # Example
//!
//! ```
//! use action_chain_core::action::{resolve_type, Action, ActionCreator, FluxAction};
//!
//! const FETCH_USER: ActionCreator<u64> = ActionCreator::new("FETCH_USER");
//!
//! let action = FETCH_USER.create(42).unwrap();
//! assert_eq!(action.action_type(), "FETCH_USER");
//! assert_eq!(action.payload_as::<u64>().unwrap(), 42);
//!
//! assert_eq!(resolve_type(&FETCH_USER), "FETCH_USER");
//! assert_eq!(resolve_type("FETCH_USER"), "FETCH_USER");
//! ```

use crate::error::ChainError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// An action flowing through the host dispatch pipeline.
///
/// # Example
///
/// ```
/// use action_chain_core::Action;
///
/// enum CounterAction {
///     Add(i64),
///     Reset,
/// }
///
/// impl Action for CounterAction {
///     type Payload = Self;
///
///     fn action_type(&self) -> &str {
///         match self {
///             Self::Add(_) => "Add",
///             Self::Reset => "Reset",
///         }
///     }
///
///     fn payload(&self) -> &Self {
///         self
///     }
/// }
///
/// assert_eq!(CounterAction::Add(1).action_type(), "Add");
/// ```
pub trait Action {
    /// Data handed to derivation handlers
    type Payload;

    /// The type string chains match on
    fn action_type(&self) -> &str;

    /// The payload carried by this action
    fn payload(&self) -> &Self::Payload;
}

/// A flux-standard action: `{ "type": ..., "payload": ..., "meta": ..., "error": ... }`.
///
/// Payload and meta are untyped JSON. Use [`FluxAction::payload_as`] or an
/// [`ActionCreator`] to work with typed payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxAction {
    /// The action type
    #[serde(rename = "type")]
    pub action_type: String,

    /// The payload (`null` when absent)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,

    /// Extra information that is not part of the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Marks the payload as an error value
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl FluxAction {
    /// Create an action with no payload
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Value::Null,
            meta: None,
            error: false,
        }
    }

    /// Set the payload
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the meta value
    #[must_use]
    pub fn with_meta(mut self, meta: impl Into<Value>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// Mark the action as carrying an error payload
    #[must_use]
    pub fn as_error(mut self) -> Self {
        self.error = true;
        self
    }

    /// Deserialize the payload into `T`
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Payload`] if the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ChainError> {
        Ok(T::deserialize(&self.payload)?)
    }
}

impl Action for FluxAction {
    type Payload = Value;

    fn action_type(&self) -> &str {
        &self.action_type
    }

    fn payload(&self) -> &Value {
        &self.payload
    }
}

/// A typed creator for [`FluxAction`]s of one type.
///
/// The creator declares its type string, so it can be passed to
/// [`ActionChain::chain`](crate::chain::ActionChain::chain) in place of a literal.
pub struct ActionCreator<P> {
    action_type: &'static str,
    _payload: PhantomData<fn(P)>,
}

impl<P> ActionCreator<P> {
    /// Create a creator for the given type string
    #[must_use]
    pub const fn new(action_type: &'static str) -> Self {
        Self {
            action_type,
            _payload: PhantomData,
        }
    }

    /// The declared type string
    #[must_use]
    pub const fn action_type(&self) -> &'static str {
        self.action_type
    }

    /// Check whether an action was produced for this creator's type
    #[must_use]
    pub fn matches<A: Action + ?Sized>(&self, action: &A) -> bool {
        action.action_type() == self.action_type
    }
}

impl<P: Serialize> ActionCreator<P> {
    /// Build an action carrying `payload`
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Payload`] if the payload cannot be serialized.
    pub fn create(&self, payload: P) -> Result<FluxAction, ChainError> {
        Ok(FluxAction::new(self.action_type).with_payload(serde_json::to_value(payload)?))
    }
}

impl<P> Clone for ActionCreator<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for ActionCreator<P> {}

impl<P> fmt::Debug for ActionCreator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionCreator").field(&self.action_type).finish()
    }
}

impl<P> fmt::Display for ActionCreator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_type)
    }
}

/// Something a chain case can be registered against.
///
/// The type string is resolved by [`resolve_type`] in this order:
///
/// 1. [`literal`](ChainTarget::literal), used verbatim
/// 2. [`declared_type`](ChainTarget::declared_type)
/// 3. the target's [`Display`](fmt::Display) output
///
/// Custom action creators either declare their type or render it through
/// `Display`.
pub trait ChainTarget: fmt::Display {
    /// The target itself when it is a plain type string
    fn literal(&self) -> Option<&str> {
        None
    }

    /// An explicitly declared type string
    fn declared_type(&self) -> Option<&str> {
        None
    }
}

impl ChainTarget for str {
    fn literal(&self) -> Option<&str> {
        Some(self)
    }
}

impl ChainTarget for String {
    fn literal(&self) -> Option<&str> {
        Some(self)
    }
}

impl<P> ChainTarget for ActionCreator<P> {
    fn declared_type(&self) -> Option<&str> {
        Some(self.action_type)
    }
}

/// Resolve the type string a target registers under.
#[must_use]
pub fn resolve_type<T: ChainTarget + ?Sized>(target: &T) -> String {
    if let Some(literal) = target.literal() {
        return literal.to_owned();
    }
    if let Some(declared) = target.declared_type() {
        return declared.to_owned();
    }
    target.to_string()
}
