//! Monomorphization registry.
//!
//! Inference records every generic class, method and function it sees
//! instantiated with fully concrete type arguments. Entries are keyed by the
//! canonical rendering of the instantiation (`Array<u32>`,
//! `Box<u32>.map<string>`), so repeated uses and alias chains collapse onto
//! one entry. The registry outlives cache invalidation; only [`MonoRegistry::clear`]
//! empties it.

use rustc_hash::FxHashMap;
use typec_ast::NodeId;
use typec_common::TypeckConfig;

use crate::ty::Ty;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInstantiation {
    pub declaration: NodeId,
    pub type_args: Vec<Ty>,
    pub key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInstantiation {
    /// The method declaration.
    pub declaration: NodeId,
    pub class_type_args: Vec<Ty>,
    pub method_type_args: Vec<Ty>,
    pub key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionInstantiation {
    pub declaration: NodeId,
    pub type_args: Vec<Ty>,
    pub key: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InstantiationKind {
    Class,
    Method,
    Function,
}

/// Insertion-ordered list with key lookup.
#[derive(Debug)]
struct Table<T> {
    entries: Vec<T>,
    index: FxHashMap<String, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, key: &str, make: impl FnOnce() -> T) -> bool {
        if self.index.contains_key(key) {
            return false;
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push(make());
        true
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[derive(Debug)]
pub struct MonoRegistry {
    enabled: bool,
    separator: char,
    classes: Table<ClassInstantiation>,
    methods: Table<MethodInstantiation>,
    functions: Table<FunctionInstantiation>,
}

impl Default for MonoRegistry {
    fn default() -> Self {
        MonoRegistry::new(&TypeckConfig::default())
    }
}

fn render_args(args: &[Ty]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name<args>`, or just `name` without arguments.
pub fn instantiation_key(name: &str, args: &[Ty]) -> String {
    if args.is_empty() {
        name.to_string()
    } else {
        format!("{}<{}>", name, render_args(args))
    }
}

/// Turn a canonical key into an ASCII identifier.
///
/// Alphanumerics and `_` are kept, `[]` becomes `Arr`, `?` becomes `Opt`,
/// everything else becomes `separator`. Runs of separators collapse and no
/// separator trails.
pub fn mangle(key: &str, separator: char) -> String {
    let mut out = String::with_capacity(key.len());
    let push_sep = |out: &mut String| {
        if !out.is_empty() && !out.ends_with(separator) {
            out.push(separator);
        }
    };
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
            '[' if chars.peek() == Some(&']') => {
                chars.next();
                push_sep(&mut out);
                out.push_str("Arr");
            }
            '?' => {
                push_sep(&mut out);
                out.push_str("Opt");
            }
            c if !c.is_ascii() => {
                push_sep(&mut out);
                out.push_str(&format!("u{:x}", c as u32));
            }
            _ => push_sep(&mut out),
        }
    }
    while out.ends_with(separator) {
        out.pop();
    }
    out
}

impl MonoRegistry {
    pub fn new(config: &TypeckConfig) -> Self {
        MonoRegistry {
            enabled: config.record_instantiations,
            separator: config.mangle_separator,
            classes: Table::default(),
            methods: Table::default(),
            functions: Table::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record `name<args>` for a generic class. Returns whether it was new.
    pub fn register_class(&mut self, declaration: NodeId, name: &str, args: &[Ty]) -> bool {
        if !self.enabled {
            return false;
        }
        let key = instantiation_key(name, args);
        let added = self.classes.insert(&key, || ClassInstantiation {
            declaration,
            type_args: args.to_vec(),
            key: key.clone(),
        });
        if added {
            log::debug!("[mono] class {}", key);
        }
        added
    }

    /// Record `Owner<class_args>.method<method_args>`.
    pub fn register_method(
        &mut self,
        declaration: NodeId,
        owner: &str,
        class_args: &[Ty],
        method: &str,
        method_args: &[Ty],
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let key = format!(
            "{}.{}",
            instantiation_key(owner, class_args),
            instantiation_key(method, method_args)
        );
        let added = self.methods.insert(&key, || MethodInstantiation {
            declaration,
            class_type_args: class_args.to_vec(),
            method_type_args: method_args.to_vec(),
            key: key.clone(),
        });
        if added {
            log::debug!("[mono] method {}", key);
        }
        added
    }

    pub fn register_function(&mut self, declaration: NodeId, name: &str, args: &[Ty]) -> bool {
        if !self.enabled {
            return false;
        }
        let key = instantiation_key(name, args);
        let added = self.functions.insert(&key, || FunctionInstantiation {
            declaration,
            type_args: args.to_vec(),
            key: key.clone(),
        });
        if added {
            log::debug!("[mono] function {}", key);
        }
        added
    }

    pub fn classes(&self) -> &[ClassInstantiation] {
        &self.classes.entries
    }

    pub fn methods(&self) -> &[MethodInstantiation] {
        &self.methods.entries
    }

    pub fn functions(&self) -> &[FunctionInstantiation] {
        &self.functions.entries
    }

    pub fn count(&self, kind: InstantiationKind) -> usize {
        match kind {
            InstantiationKind::Class => self.classes.entries.len(),
            InstantiationKind::Method => self.methods.entries.len(),
            InstantiationKind::Function => self.functions.entries.len(),
        }
    }

    pub fn contains(&self, kind: InstantiationKind, key: &str) -> bool {
        match kind {
            InstantiationKind::Class => self.classes.index.contains_key(key),
            InstantiationKind::Method => self.methods.index.contains_key(key),
            InstantiationKind::Function => self.functions.index.contains_key(key),
        }
    }

    /// Mangled identifier for a key, using the configured separator.
    pub fn mangled_name(&self, key: &str) -> String {
        mangle(key, self.separator)
    }

    /// All keys, classes first, then methods, then functions.
    pub fn keys(&self) -> Vec<(InstantiationKind, &str)> {
        let classes = self.classes().iter().map(|c| (InstantiationKind::Class, c.key.as_str()));
        let methods = self.methods().iter().map(|m| (InstantiationKind::Method, m.key.as_str()));
        let functions = self
            .functions()
            .iter()
            .map(|f| (InstantiationKind::Function, f.key.as_str()));
        classes.chain(methods).chain(functions).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.entries.is_empty()
            && self.methods.entries.is_empty()
            && self.functions.entries.is_empty()
    }

    pub fn clear(&mut self) {
        log::debug!("[mono] clear");
        self.classes.clear();
        self.methods.clear();
        self.functions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_to_ascii_identifiers() {
        assert_eq!(mangle("Array<u32>", '_'), "Array_u32");
        assert_eq!(mangle("Map<string, u32[]>", '_'), "Map_string_u32_Arr");
        assert_eq!(mangle("Box<u32?>.map<string>", '$'), "Box$u32$Opt$map$string");
        assert_eq!(mangle("Pair<(u32, bool)>", '_'), "Pair_u32_bool");
    }

    #[test]
    fn dedups_by_key_and_keeps_insertion_order() {
        let mut registry = MonoRegistry::default();
        assert!(registry.register_class(NodeId(1), "Array", &[Ty::u32()]));
        assert!(registry.register_class(NodeId(1), "Array", &[Ty::String]));
        assert!(!registry.register_class(NodeId(1), "Array", &[Ty::u32()]));
        assert!(registry.register_function(NodeId(5), "identity", &[Ty::i32()]));
        assert!(registry.register_method(NodeId(9), "Box", &[Ty::u32()], "map", &[Ty::String]));

        assert_eq!(registry.count(InstantiationKind::Class), 2);
        assert_eq!(registry.count(InstantiationKind::Function), 1);
        assert!(registry.contains(InstantiationKind::Method, "Box<u32>.map<string>"));
        let keys: Vec<_> = registry.keys().into_iter().map(|(_, k)| k).collect();
        assert_eq!(
            keys,
            ["Array<u32>", "Array<string>", "Box<u32>.map<string>", "identity<i32>"]
        );

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn disabled_registry_records_nothing() {
        let config = TypeckConfig {
            record_instantiations: false,
            ..TypeckConfig::default()
        };
        let mut registry = MonoRegistry::new(&config);
        assert!(!registry.register_class(NodeId(1), "Array", &[Ty::u32()]));
        assert!(registry.is_empty());
    }
}
