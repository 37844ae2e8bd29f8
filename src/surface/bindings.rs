//! JS <-> Rust function bindings
//!
//! Page scripts call a bound function as `window.name(...args)`, which
//! returns a Promise. The call travels to the host as an IPC message
//! (`{"id", "name", "params"}`), the handler runs on a worker thread and the
//! result is delivered back by evaluating a settle script in the page.

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handler behind a binding: JSON params in, JSON value or error message out
pub type BindingFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, String> + Send + Sync>;

/// A named function exposed to page scripts
#[derive(Clone)]
pub struct Binding {
    pub name: String,
    pub handler: BindingFn,
}

impl Binding {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Binding {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("name", &self.name).finish()
    }
}

/// Registered bindings, shared between the surface handle and the IPC handler
#[derive(Default)]
pub struct BindingRegistry {
    handlers: RwLock<HashMap<String, BindingFn>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. An existing binding with the same
    /// name is replaced.
    pub fn insert(&self, name: &str, handler: BindingFn) {
        if self
            .handlers
            .write()
            .insert(name.to_string(), handler)
            .is_some()
        {
            debug!("Binding '{}' replaced", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke a binding. The lock is released before the handler runs.
    pub fn call(&self, name: &str, params: Vec<Value>) -> Result<Value, String> {
        let handler = self.handlers.read().get(name).cloned();
        match handler {
            Some(handler) => handler(params),
            None => Err(format!("no binding named '{}'", name)),
        }
    }
}

/// Call request posted by the page
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IpcCall {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl IpcCall {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Installed before any page script runs
pub const BOOTSTRAP_SCRIPT: &str = r#"(function () {
  if (window.__glide) { return; }
  var pending = {};
  var next = 1;
  window.__glide = {
    invoke: function (name, params) {
      var id = next++;
      return new Promise(function (resolve, reject) {
        pending[id] = { resolve: resolve, reject: reject };
        window.ipc.postMessage(JSON.stringify({ id: id, name: name, params: params }));
      });
    },
    settle: function (id, ok, value) {
      var call = pending[id];
      if (!call) { return; }
      delete pending[id];
      if (ok) { call.resolve(value); } else { call.reject(value); }
    }
  };
})();"#;

/// Script defining `window[name]` as a stub forwarding to the host
pub fn stub_script(name: &str) -> String {
    let name = Value::String(name.to_string());
    format!(
        "window[{name}] = function () {{ return window.__glide.invoke({name}, Array.prototype.slice.call(arguments)); }};"
    )
}

/// Script resolving (or rejecting) the page-side promise of call `id`
pub fn settle_script(id: u64, result: &Result<Value, String>) -> String {
    let (ok, value) = match result {
        Ok(value) => (true, value.clone()),
        Err(message) => (false, Value::String(message.clone())),
    };
    format!("window.__glide && window.__glide.settle({}, {}, {});", id, ok, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_registered_binding() {
        let registry = BindingRegistry::new();
        registry.insert(
            "add",
            Arc::new(|params: Vec<Value>| {
                let sum: i64 = params.iter().filter_map(Value::as_i64).sum();
                Ok(json!(sum))
            }),
        );

        assert_eq!(registry.call("add", vec![json!(2), json!(3)]), Ok(json!(5)));
    }

    #[test]
    fn test_unknown_binding_is_error() {
        let registry = BindingRegistry::new();
        let result = registry.call("missing", vec![]);
        assert!(result.unwrap_err().contains("missing"));
    }

    #[test]
    fn test_duplicate_name_overwrites() {
        let registry = BindingRegistry::new();
        registry.insert("greet", Arc::new(|_| Ok(json!("first"))));
        registry.insert("greet", Arc::new(|_| Ok(json!("second"))));

        assert_eq!(registry.names(), vec!["greet".to_string()]);
        assert_eq!(registry.call("greet", vec![]), Ok(json!("second")));
    }

    #[test]
    fn test_parse_ipc_call() {
        let call = IpcCall::parse(r#"{"id":7,"name":"greet","params":["bob",1]}"#).unwrap();
        assert_eq!(call.id, 7);
        assert_eq!(call.name, "greet");
        assert_eq!(call.params, vec![json!("bob"), json!(1)]);

        let call = IpcCall::parse(r#"{"id":8,"name":"ping"}"#).unwrap();
        assert!(call.params.is_empty());

        assert!(IpcCall::parse("not json").is_none());
    }

    #[test]
    fn test_stub_script_quotes_name() {
        let script = stub_script("say\"hi");
        assert!(script.starts_with(r#"window["say\"hi"] = function"#));
        assert!(script.contains(r#"invoke("say\"hi""#));
    }

    #[test]
    fn test_settle_script() {
        assert_eq!(
            settle_script(3, &Ok(json!({"a": 1}))),
            r#"window.__glide && window.__glide.settle(3, true, {"a":1});"#
        );
        assert_eq!(
            settle_script(4, &Err("boom".to_string())),
            r#"window.__glide && window.__glide.settle(4, false, "boom");"#
        );
    }
}
