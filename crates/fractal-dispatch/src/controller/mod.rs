//! Controller declarations and their type-erased registration handle.
//!
//! A controller is a plain Rust type that lists its methods explicitly. Each
//! [`Method`] pairs a handler function with the metadata the schema
//! extractor needs: parameter names and defaults, documentation, aliases and
//! whether the method is exposed on the command line. [`ControllerClass`]
//! erases the concrete controller type so that heterogeneous controllers
//! can live in one registry.

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CommandError, DispatchError};
use crate::value::{ArgValue, CallArgs, CommandResult, Namespace};

/// A group of related commands addressed by a plugin name.
pub trait Controller: Sized + 'static {
    /// Name under which the controller's commands are addressed.
    const PLUGIN_NAME: &'static str;

    /// Text listed next to the controller in the top-level help.
    #[must_use]
    fn help() -> Option<&'static str> {
        None
    }

    /// The controller's method table.
    fn methods() -> Vec<Method<Self>>;

    /// Receives the parsed namespace before the selected method runs.
    fn attach(&mut self, _namespace: &Namespace) {}
}

/// Handler that needs a controller instance.
pub type BoundHandler<C> = fn(&mut C, CallArgs) -> CommandResult;

/// Handler that runs without a controller instance.
pub type StaticHandler = fn(CallArgs) -> CommandResult;

/// Callable behind a method.
pub enum Handler<C> {
    /// Instance method.
    Bound(BoundHandler<C>),
    /// Associated function.
    Static(StaticHandler),
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handler<C> {}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound(_) => f.write_str("Handler::Bound"),
            Self::Static(_) => f.write_str("Handler::Static"),
        }
    }
}

/// A declared parameter: its name and, optionally, its default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    default: Option<ArgValue>,
}

impl Param {
    /// Declares a parameter without a default.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Declares a parameter that defaults to [`ArgValue::Unset`].
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name).default(ArgValue::Unset)
    }

    /// Declares a boolean parameter, exposed as a toggle.
    #[must_use]
    pub fn toggle(name: impl Into<String>, default: bool) -> Self {
        Self::new(name).default(ArgValue::Bool(default))
    }

    /// Sets the parameter's default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parameter name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&ArgValue> {
        self.default.as_ref()
    }
}

/// Type-independent metadata of a declared method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    name: String,
    owner: String,
    cli_enabled: bool,
    is_static: bool,
    params: Vec<Param>,
    doc: Option<String>,
    aliases: Vec<String>,
    fallbacks: Option<BTreeMap<String, ArgValue>>,
}

impl MethodSpec {
    /// Method name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified name, `<controller type>::<method>`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.owner, self.name)
    }

    /// Whether the method is exposed on the command line.
    #[must_use]
    pub const fn is_cli_enabled(&self) -> bool {
        self.cli_enabled
    }

    /// Whether the method runs without a controller instance.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared parameters in order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Raw documentation text.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Top-level shortcut names.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Framework-level defaults table, when the method declares one.
    #[must_use]
    pub const fn fallbacks(&self) -> Option<&BTreeMap<String, ArgValue>> {
        self.fallbacks.as_ref()
    }
}

/// One entry of a controller's method table.
pub struct Method<C> {
    handler: Handler<C>,
    spec: MethodSpec,
}

impl<C: Controller> Method<C> {
    /// Declares an instance method.
    #[must_use]
    pub fn new(name: &str, handler: BoundHandler<C>) -> Self {
        Self::with_handler(name, Handler::Bound(handler))
    }

    /// Declares a method that does not use the controller instance.
    #[must_use]
    pub fn new_static(name: &str, handler: StaticHandler) -> Self {
        Self::with_handler(name, Handler::Static(handler))
    }

    fn with_handler(name: &str, handler: Handler<C>) -> Self {
        Self {
            spec: MethodSpec {
                name: name.to_owned(),
                owner: type_name::<C>().to_owned(),
                cli_enabled: false,
                is_static: matches!(handler, Handler::Static(_)),
                params: Vec::new(),
                doc: None,
                aliases: Vec::new(),
                fallbacks: None,
            },
            handler,
        }
    }

    /// Exposes the method on the command line.
    #[must_use]
    pub const fn cli(mut self) -> Self {
        self.spec.cli_enabled = true;
        self
    }

    /// Attaches documentation: a summary, a `---` line, then YAML with an
    /// `Args` mapping.
    #[must_use]
    pub fn doc(mut self, doc: &str) -> Self {
        self.spec.doc = Some(doc.to_owned());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.spec.params.push(param);
        self
    }

    /// Registers top-level shortcut names for the method.
    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Declares a framework-level defaults table.
    ///
    /// Once a table is present, parameters listed in it become optional
    /// positionals falling back to the listed value, and parameters without
    /// any default become required `--flags`.
    #[must_use]
    pub fn fallbacks<I, K, V>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ArgValue>,
    {
        self.spec.fallbacks = Some(
            fallbacks
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Type-independent metadata.
    #[must_use]
    pub const fn spec(&self) -> &MethodSpec {
        &self.spec
    }
}

/// Builds and drives one controller type behind a trait object.
trait Instantiate {
    fn invoke(
        &self,
        method: &str,
        namespace: &Namespace,
        args: CallArgs,
    ) -> Result<CommandResult, DispatchError>;
}

struct Bound<C, F> {
    factory: F,
    handlers: Vec<(String, Handler<C>)>,
}

impl<C, F> Instantiate for Bound<C, F>
where
    C: Controller,
    F: Fn() -> Result<C, CommandError>,
{
    fn invoke(
        &self,
        method: &str,
        namespace: &Namespace,
        args: CallArgs,
    ) -> Result<CommandResult, DispatchError> {
        let handler = self
            .handlers
            .iter()
            .find(|(name, _)| name == method)
            .map(|(_, handler)| *handler)
            .ok_or_else(|| DispatchError::UnknownMethod {
                plugin: C::PLUGIN_NAME.to_owned(),
                method: method.to_owned(),
            })?;
        let mut instance = match (self.factory)() {
            Ok(instance) => instance,
            Err(error) => return Ok(Err(error)),
        };
        instance.attach(namespace);
        Ok(match handler {
            Handler::Bound(call) => call(&mut instance, args),
            Handler::Static(call) => call(args),
        })
    }
}

/// A registrable controller with its concrete type erased.
pub struct ControllerClass {
    type_name: &'static str,
    name: &'static str,
    help: Option<&'static str>,
    methods: Vec<MethodSpec>,
    instantiate: Box<dyn Instantiate>,
}

impl ControllerClass {
    /// Wraps a controller constructed by `factory` on every dispatch.
    #[must_use]
    pub fn new<C, F>(factory: F) -> Self
    where
        C: Controller,
        F: Fn() -> Result<C, CommandError> + 'static,
    {
        let table = C::methods();
        let methods = table.iter().map(|method| method.spec.clone()).collect();
        let handlers = table
            .into_iter()
            .map(|method| (method.spec.name, method.handler))
            .collect();
        Self {
            type_name: type_name::<C>(),
            name: C::PLUGIN_NAME,
            help: C::help(),
            methods,
            instantiate: Box::new(Bound { factory, handlers }),
        }
    }

    /// Wraps a controller built with [`Default`].
    #[must_use]
    pub fn of<C>() -> Self
    where
        C: Controller + Default,
    {
        Self::new(|| Ok(C::default()))
    }

    /// Type name of the wrapped controller.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared plugin name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared help text.
    #[must_use]
    pub const fn help(&self) -> Option<&'static str> {
        self.help
    }

    /// Every declared method, CLI-enabled or not.
    #[must_use]
    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    /// Constructs the controller, attaches `namespace` and runs `method`.
    pub(crate) fn invoke(
        &self,
        method: &str,
        namespace: &Namespace,
        args: CallArgs,
    ) -> Result<CommandResult, DispatchError> {
        self.instantiate.invoke(method, namespace, args)
    }
}

impl fmt::Debug for ControllerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClass")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
