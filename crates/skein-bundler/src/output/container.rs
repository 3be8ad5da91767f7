//! Bundle container format.
//!
//! A bundle is one self-executing script. Every module of the closure is
//! registered as
//!
//! ```text
//! id: [function (require, module, exports) { body }, { specifier: id }]
//! ```
//!
//! and the entry roots are then required in declaration order. Bodies are
//! inserted verbatim: `require(specifier)` finds its target through the
//! module's own dependency map, so no body is rewritten.
//!
//! Development bundles key modules by their context-relative id and precede
//! each with a `// <id>` comment. Production bundles use numeric ids in
//! closure order and drop the comments.

use std::fmt::Write as _;
use std::path::Path;

use rustc_hash::FxHashMap;
use skein_graph::{EntryClosure, Mode};

use crate::loaders::js_string;

const PRELUDE: &str = r#"(function (modules, entries) {
  var cache = {};
  function load(id) {
    if (Object.prototype.hasOwnProperty.call(cache, id)) return cache[id].exports;
    var record = modules[id];
    if (!record) throw new Error("Cannot find module '" + id + "'");
    var module = (cache[id] = { exports: {} });
    record[0].call(module.exports, function (specifier) {
      var target = record[1][specifier];
      if (target === undefined) {
        throw new Error("Cannot find module '" + specifier + "' from '" + id + "'");
      }
      return load(target);
    }, module, module.exports);
    return module.exports;
  }
  for (var i = 0; i < entries.length; i++) load(entries[i]);
})({
"#;

/// Render the bundle for one entry closure.
pub fn render(closure: &EntryClosure, mode: Mode) -> String {
    let ids: FxHashMap<&Path, String> = closure
        .modules()
        .iter()
        .enumerate()
        .map(|(index, module)| {
            let id = if mode.is_production() {
                index.to_string()
            } else {
                js_string(&module.id)
            };
            (module.path.as_path(), id)
        })
        .collect();

    let mut out = String::from(PRELUDE);
    for (index, module) in closure.modules().iter().enumerate() {
        let Some(id) = ids.get(module.path.as_path()) else {
            continue;
        };
        if index > 0 {
            out.push_str(",\n");
        }
        if !mode.is_production() {
            let _ = writeln!(out, "// {}", module.id);
        }

        let _ = write!(out, "{id}: [function (require, module, exports) {{\n{}", module.body);
        if !module.body.ends_with('\n') {
            out.push('\n');
        }

        let deps: Vec<String> = module
            .dependencies
            .iter()
            .filter_map(|(specifier, path)| {
                ids.get(path.as_path())
                    .map(|target| format!("{}: {target}", js_string(specifier)))
            })
            .collect();
        let _ = write!(out, "}}, {{{}}}]", deps.join(", "));
    }

    let roots: Vec<&str> = closure
        .roots
        .iter()
        .filter_map(|root| ids.get(root.as_path()).map(String::as_str))
        .collect();
    let _ = writeln!(out, "\n}}, [{}]);", roots.join(", "));
    out
}
