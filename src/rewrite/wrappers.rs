//! Generated forwarding functions for remote calls.
//!
//! Every distinct remote procedure called from a package gets one wrapper in
//! a single generated unit. The wrapper takes the call site and definition
//! ids ahead of the procedure's own parameters, opens a runtime call record
//! and forwards to the real function.

use crate::config::RewriteConfig;
use crate::model::{Package, RpcTarget};
use crate::syntax::quote;
use std::collections::{BTreeMap, HashSet};

/// Insertion-ordered set of remote call targets for one package, keyed by
/// service and procedure name.
#[derive(Debug, Clone, Default)]
pub struct WrapperSet {
    seen: HashSet<(String, String)>,
    targets: Vec<RpcTarget>,
}

impl WrapperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `target` unless an equal key is present. Returns whether it was added.
    pub fn insert(&mut self, target: &RpcTarget) -> bool {
        let (service, name) = target.key();
        if !self.seen.insert((service.to_string(), name.to_string())) {
            return false;
        }
        self.targets.push(target.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &RpcTarget> {
        self.targets.iter()
    }
}

/// Name of the wrapper for `target`: `prefix + service + "_" + procedure`.
pub fn wrapper_name(prefix: &str, target: &RpcTarget) -> String {
    format!("{prefix}{}_{}", target.service, target.name)
}

/// A synthetic source unit added to a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: String,
    pub contents: String,
    pub wrappers: usize,
}

/// Render the wrapper unit for `set`; `None` when the set is empty.
pub fn generate(pkg: &Package, set: &WrapperSet, config: &RewriteConfig) -> Option<GeneratedFile> {
    if set.is_empty() {
        return None;
    }

    // path -> explicit local name
    let mut imports: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for target in set.iter() {
        if target.home.import_path != pkg.import_path {
            imports.insert(
                target.home.import_path.as_str(),
                Some(target.home.name.as_str()),
            );
        }
    }
    for target in set.iter() {
        for path in &target.signature.imports {
            if *path != pkg.import_path {
                imports.entry(path.as_str()).or_insert(None);
            }
        }
    }
    imports.remove(config.runtime.import_path.as_str());

    let mut out = String::new();
    out.push_str("// Code generated by go-rewrite. DO NOT EDIT.\n\n");
    out.push_str(&format!("package {}\n\nimport (\n", pkg.name));
    out.push_str(&format!(
        "\t{} {}\n",
        config.runtime.alias,
        quote(&config.runtime.import_path)
    ));
    for (path, alias) in imports {
        match alias {
            Some(alias) => out.push_str(&format!("\t{alias} {}\n", quote(path))),
            None => out.push_str(&format!("\t{}\n", quote(path))),
        }
    }
    out.push_str(")\n");

    for target in set.iter() {
        out.push('\n');
        write_wrapper(&mut out, pkg, target, config);
    }

    Some(GeneratedFile {
        file_name: config.wrappers.file_name.clone(),
        contents: out,
        wrappers: set.len(),
    })
}

fn write_wrapper(out: &mut String, pkg: &Package, target: &RpcTarget, config: &RewriteConfig) {
    let signature = &target.signature;

    let mut params = String::from("callID, rpcID uint64");
    let mut args = Vec::with_capacity(signature.params.len());
    for (idx, ty) in signature.params.iter().enumerate() {
        params.push_str(&format!(", p{idx} {ty}"));
        if ty.starts_with("...") {
            args.push(format!("p{idx}..."));
        } else {
            args.push(format!("p{idx}"));
        }
    }

    let results = match signature.results.as_slice() {
        [] => String::new(),
        [single] => format!(" {single}"),
        many => format!(" ({})", many.join(", ")),
    };

    let callee = if target.home.import_path == pkg.import_path {
        target.name.clone()
    } else {
        format!("{}.{}", target.home.name, target.name)
    };
    let call = format!("{callee}({})", args.join(", "));

    out.push_str(&format!(
        "func {}({params}){results} {{\n",
        wrapper_name(&config.wrappers.prefix, target)
    ));
    out.push_str(&format!(
        "\tdefer {}.BeginCall(callID, rpcID, {}, {}).Finish()\n",
        config.runtime.alias,
        quote(&target.service),
        quote(&target.name)
    ));
    if signature.results.is_empty() {
        out.push_str(&format!("\t{call}\n"));
    } else {
        out.push_str(&format!("\treturn {call}\n"));
    }
    out.push_str("}\n");
}
