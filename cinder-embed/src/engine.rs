// cinder-embed - Engine implementation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Engine struct - main entry point for embedding Cinder.

use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use cinder_core::{
    Backend, Caller, Context, Error, ErrorKind, EvalConfig, HeapStats, PinId, Result, TreeWalk, Value,
    evaluate, new_context,
};
use cinder_reader::{Form, read_all};
use cinder_vm::VM;

use crate::convert::{FromValue, IntoValue};

/// Which execution backend an [`Engine`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// Direct interpretation of expanded forms.
    #[default]
    TreeWalk,
    /// Bytecode compilation and the stack VM.
    Vm,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::TreeWalk, BackendKind::Vm];

    fn instantiate(self) -> Box<dyn Backend> {
        match self {
            BackendKind::TreeWalk => Box::new(TreeWalk::new()),
            BackendKind::Vm => Box::new(VM::new()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::TreeWalk => "tree-walk",
            BackendKind::Vm => "vm",
        })
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tree" | "tree-walk" | "treewalk" => Ok(BackendKind::TreeWalk),
            "vm" | "bytecode" => Ok(BackendKind::Vm),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// The Cinder scripting engine.
///
/// An `Engine` owns one evaluation context (heap, environment, attribution
/// table) and one backend. Values it hands out stay valid until the next
/// evaluation may collect; [`pin`](Engine::pin) a value or bind it with
/// [`set`](Engine::set) to keep it longer.
///
/// # Thread Safety
///
/// **`Engine` is NOT thread-safe.** Create one engine per thread; engines
/// share nothing.
///
/// # Example
///
/// ```rust
/// use cinder_embed::{BackendKind, Engine};
///
/// let mut engine = Engine::new(BackendKind::Vm).unwrap();
/// assert_eq!(engine.eval_to_string("(+ 1 2 3)").unwrap(), "6");
/// ```
pub struct Engine {
    ctx: Context,
    backend: Box<dyn Backend>,
    kind: BackendKind,
}

impl Engine {
    /// Create an engine with the default configuration and the core prelude
    /// loaded.
    pub fn new(kind: BackendKind) -> Result<Self> {
        Self::with_config(kind, EvalConfig::default())
    }

    pub fn with_config(kind: BackendKind, config: EvalConfig) -> Result<Self> {
        let mut backend = kind.instantiate();
        let ctx = new_context(config, backend.as_mut())?;
        log::debug!("engine ready on the {} backend", kind);
        Ok(Engine { ctx, backend, kind })
    }

    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// The underlying evaluation context, for direct value access.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// Evaluate every form in `code`, returning the value of the last.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cinder_embed::{BackendKind, Engine};
    ///
    /// let mut engine = Engine::new(BackendKind::TreeWalk).unwrap();
    /// let v = engine.eval("(def x 42) (* x 2)").unwrap();
    /// assert_eq!(engine.repr(v), "84");
    /// ```
    pub fn eval(&mut self, code: &str) -> Result<Value> {
        let forms = read_all(code)?;
        let mut result = Value::Nil;
        for form in &forms {
            result = self.eval_form(form)?;
        }
        Ok(result)
    }

    /// Evaluate one form that has already been read.
    pub fn eval_form(&mut self, form: &Form) -> Result<Value> {
        evaluate(&mut self.ctx, self.backend.as_mut(), form)
    }

    /// Evaluate `code` and print the result readably.
    pub fn eval_to_string(&mut self, code: &str) -> Result<String> {
        let v = self.eval(code)?;
        Ok(self.ctx.repr(v))
    }

    /// Evaluate `code` and convert the result.
    pub fn eval_as<T: FromValue>(&mut self, code: &str) -> Result<T> {
        let v = self.eval(code)?;
        T::from_value(&self.ctx, v)
    }

    /// Evaluate a file of Cinder code.
    ///
    /// # Errors
    ///
    /// Returns a `HostCallFailure` if the file cannot be read, otherwise
    /// whatever reading or evaluating it raises.
    pub fn eval_file(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::HostCallFailure,
                format!("Cannot read {}: {}", path.display(), e),
            )
        })?;
        self.eval(&code)
    }

    /// Look up a global binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let sym = self.ctx.interner.get(name)?;
        self.ctx.lookup_global(sym)
    }

    /// Look up a global binding and convert it. `Ok(None)` when unbound.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            Some(v) => T::from_value(&self.ctx, v).map(Some),
            None => Ok(None),
        }
    }

    /// Bind `name` in the root environment.
    pub fn set(&mut self, name: &str, value: impl IntoValue) -> Result<()> {
        let v = value.into_value(&mut self.ctx)?;
        self.ctx.define_global(name, v);
        Ok(())
    }

    /// Register a host function callable from evaluated code with exactly
    /// `arity` arguments.
    ///
    /// A wrong argument count raises `ArityMismatch`; any non-fatal error
    /// returned by `f` is wrapped as `HostCallFailure` naming the function.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cinder_embed::{BackendKind, Engine, Value, from_value};
    ///
    /// let mut engine = Engine::new(BackendKind::Vm).unwrap();
    /// engine
    ///     .register_fn("double", 1, |ctx, args| {
    ///         let n: i64 = from_value(ctx, args[0])?;
    ///         Ok(Value::Int(n * 2))
    ///     })
    ///     .unwrap();
    /// assert_eq!(engine.eval_to_string("(double 21)").unwrap(), "42");
    /// ```
    pub fn register_fn(
        &mut self,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Context, &[Value]) -> Result<Value> + 'static,
    ) -> Result<()> {
        let fn_name: Rc<str> = Rc::from(name);
        self.ctx.define_native_fn(
            name,
            Rc::new(move |ctx: &mut Context, _caller: &mut dyn Caller, args: &[Value]| {
                if args.len() != arity {
                    return Err(Error::arity_named(&fn_name, arity, args.len()));
                }
                f(ctx, args).map_err(|err| host_failure(&fn_name, err))
            }),
        )?;
        log::debug!("registered host function {}/{}", name, arity);
        Ok(())
    }

    /// Call the global function `name` with `args`.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let f = self.get(name).ok_or_else(|| Error::unresolved(name))?;
        self.call(f, args)
    }

    /// Call a function value with `args` on this engine's backend.
    pub fn call(&mut self, f: Value, args: &[Value]) -> Result<Value> {
        self.ctx.check_alive()?;
        let result = self.backend.call(&mut self.ctx, f, args);
        self.ctx.set_call_depth(0);
        result
    }

    /// Run a full collection now, returning the number of objects freed.
    pub fn collect_garbage(&mut self) -> usize {
        self.ctx.collect_garbage(&mut |_| {})
    }

    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.ctx.heap_stats()
    }

    /// Keep `v` alive across evaluations until unpinned.
    pub fn pin(&mut self, v: Value) -> PinId {
        self.ctx.pin(v)
    }

    pub fn unpin(&mut self, id: PinId) -> Option<Value> {
        self.ctx.unpin(id)
    }

    /// Buffer printed output instead of writing to stdout.
    pub fn capture_output(&mut self) {
        self.ctx.capture_output();
    }

    pub fn take_output(&mut self) -> String {
        self.ctx.take_output()
    }

    /// Readable printed form of `v`, as `pr-str` prints it.
    #[must_use]
    pub fn repr(&self, v: Value) -> String {
        self.ctx.repr(v)
    }

    /// Printed form of `v`, as `str` prints it.
    #[must_use]
    pub fn display(&self, v: Value) -> String {
        self.ctx.display(v)
    }
}

fn host_failure(name: &str, err: Error) -> Error {
    if err.is_fatal() || err.kind == ErrorKind::HostCallFailure {
        return err;
    }
    let wrapped = Error::host(name, &err.message);
    match err.location {
        Some(loc) => wrapped.at(loc),
        None => wrapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("vm".parse::<BackendKind>().unwrap(), BackendKind::Vm);
        assert_eq!("tree".parse::<BackendKind>().unwrap(), BackendKind::TreeWalk);
        assert!("jit".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Vm.to_string(), "vm");
    }

    #[test]
    fn test_host_failure_keeps_fatal_errors() {
        let fatal = Error::new(ErrorKind::HeapExhausted, "full");
        assert_eq!(host_failure("f", fatal).kind, ErrorKind::HeapExhausted);
        let wrapped = host_failure("f", Error::arithmetic("Divide by zero"));
        assert_eq!(wrapped.kind, ErrorKind::HostCallFailure);
        assert_eq!(wrapped.message, "Host function f failed: Divide by zero");
    }
}
