//! Extension API
//!
//! Named bundles of functions that mapping definitions can call as
//! transforms. A function receives the copied value first, followed by the
//! arguments declared next to it in the mapping.

use crate::numeric::{number_value, value_to_f64};
use dataconv_record::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Extension function: `args[0]` is the value being copied
pub type ExtensionFn = Arc<dyn Fn(&[Value]) -> crate::Result<Value> + Send + Sync>;

/// Hook run when an extension is registered
pub type HookFn = Arc<dyn Fn() -> crate::Result<()> + Send + Sync>;

/// An extension providing custom functionality
#[derive(Clone)]
pub struct Extension {
    pub name: String,
    pub version: String,
    functions: HashMap<String, ExtensionFn>,
    init_hook: Option<HookFn>,
}

impl Extension {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            functions: HashMap::new(),
            init_hook: None,
        }
    }

    /// Register a function
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> crate::Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.functions.insert(name.into(), Arc::new(func));
        self
    }

    /// Hook run when the extension is registered
    pub fn on_init(
        &mut self,
        hook: impl Fn() -> crate::Result<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.init_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn get_function(&self, name: &str) -> Option<ExtensionFn> {
        self.functions.get(name).cloned()
    }

    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered function names, sorted
    #[must_use]
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    fn initialize(&self) -> crate::Result<()> {
        self.init_hook.as_ref().map_or(Ok(()), |hook| hook())
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("functions", &self.function_names())
            .finish_non_exhaustive()
    }
}

/// Registry of extensions, shared between clones
#[derive(Debug, Default, Clone)]
pub struct ExtensionRegistry {
    extensions: Arc<Mutex<HashMap<String, Extension>>>,
}

impl ExtensionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `string_utils` and `math_utils`
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in extension fails to initialize.
    pub fn with_builtins() -> crate::Result<Self> {
        let registry = Self::new();
        registry.register(create_string_utils_extension())?;
        registry.register(create_math_utils_extension())?;
        Ok(registry)
    }

    fn lock(&self) -> crate::Result<MutexGuard<'_, HashMap<String, Extension>>> {
        self.extensions
            .lock()
            .map_err(|_| crate::Error::Extension("extension registry lock poisoned".to_string()))
    }

    /// Register an extension, replacing any extension with the same name
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or the init hook fails.
    pub fn register(&self, extension: Extension) -> crate::Result<()> {
        let mut extensions = self.lock()?;
        extension.initialize()?;
        debug!(
            extension = %extension.name,
            version = %extension.version,
            "registered extension"
        );
        extensions.insert(extension.name.clone(), extension);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn get_extension(&self, name: &str) -> crate::Result<Option<Extension>> {
        Ok(self.lock()?.get(name).cloned())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn has_extension(&self, name: &str) -> crate::Result<bool> {
        Ok(self.lock()?.contains_key(name))
    }

    /// Look up a function so it can be called later without the lock
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Extension`] if the extension or function is missing.
    pub fn function(&self, extension_name: &str, function_name: &str) -> crate::Result<ExtensionFn> {
        let extensions = self.lock()?;
        let extension = extensions.get(extension_name).ok_or_else(|| {
            crate::Error::Extension(format!("Extension '{extension_name}' not found"))
        })?;

        extension.get_function(function_name).ok_or_else(|| {
            crate::Error::Extension(format!(
                "Function '{function_name}' not found in extension '{extension_name}', \
                 available functions: {:?}",
                extension.function_names()
            ))
        })
    }

    /// Call a function from an extension
    ///
    /// # Errors
    ///
    /// Returns an error if the function is missing or fails.
    pub fn call(
        &self,
        extension_name: &str,
        function_name: &str,
        args: &[Value],
    ) -> crate::Result<Value> {
        let func = self.function(extension_name, function_name)?;
        func(args)
    }

    /// Registered extension names, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn extension_names(&self) -> crate::Result<Vec<String>> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> crate::Result<usize> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> crate::Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn text_arg(args: &[Value], position: usize, function: &str) -> crate::Result<Option<String>> {
    match args.get(position) {
        None => Err(crate::Error::Transform(format!(
            "{function} expects an argument at position {position}"
        ))),
        Some(Value::Null) => Ok(None),
        Some(value) => value.as_string().map(Some).ok_or_else(|| {
            crate::Error::Transform(format!(
                "{function} cannot use {} argument at position {position}",
                value.kind()
            ))
        }),
    }
}

/// Built-in string utilities: `reverse`, `length`, `replace`
#[must_use]
pub fn create_string_utils_extension() -> Extension {
    let mut ext = Extension::new("string_utils", "1.0.0");

    ext.register_function("reverse", |args| {
        Ok(text_arg(args, 0, "reverse")?
            .map_or(Value::Null, |s| Value::String(s.chars().rev().collect())))
    })
    .register_function("length", |args| {
        let Some(text) = text_arg(args, 0, "length")? else {
            return Ok(Value::Null);
        };
        let length = i64::try_from(text.chars().count())
            .map_err(|_| crate::Error::Transform("length does not fit".to_string()))?;
        Ok(Value::Integer(length))
    })
    .register_function("replace", |args| {
        let Some(input) = text_arg(args, 0, "replace")? else {
            return Ok(Value::Null);
        };
        let from = text_arg(args, 1, "replace")?.unwrap_or_default();
        let to = text_arg(args, 2, "replace")?.unwrap_or_default();
        if from.is_empty() {
            return Err(crate::Error::Transform(
                "replace needs a non-empty pattern".to_string(),
            ));
        }
        Ok(Value::String(input.replace(&from, &to)))
    })
    .on_init(|| {
        debug!("string_utils extension initialized");
        Ok(())
    });

    ext
}

/// Built-in math utilities: `add`, `multiply`
#[must_use]
pub fn create_math_utils_extension() -> Extension {
    let mut ext = Extension::new("math_utils", "1.0.0");

    ext.register_function("add", |args| binary_math(args, "add", |a, b| a + b))
        .register_function("multiply", |args| {
            binary_math(args, "multiply", |a, b| a * b)
        });

    ext
}

fn binary_math(args: &[Value], function: &str, op: impl Fn(f64, f64) -> f64) -> crate::Result<Value> {
    let [input, operand, ..] = args else {
        return Err(crate::Error::Transform(format!(
            "{function} requires 2 arguments, got {}",
            args.len()
        )));
    };
    if input.is_null() {
        return Ok(Value::Null);
    }
    let a = value_to_f64(input, "input")?;
    let b = value_to_f64(operand, "operand")?;
    Ok(number_value(op(a, b)))
}
