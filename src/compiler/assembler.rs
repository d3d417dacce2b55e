//! Source Assembler Backend
//!
//! The reference [`EffectBackend`]: resolves every fragment of a composed
//! tree through a [`ContentStorage`], emits `#define` lines for each
//! node's macros, and concatenates fragment sources in deterministic mix
//! order. The assembled text's bytes are the "bytecode".
//!
//! This backend does not parse shader source — it only assembles bytes —
//! which makes the whole pipeline testable end to end without a GPU.
//! Missing fragments become error log entries naming the fragment; the
//! caller decides whether a non-empty error log is fatal.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::compiler::backend::{
    BackendResult, CompiledOutcome, EffectBackend, EffectBytecode,
};
use crate::compiler::result::EffectLog;
use crate::params::{ParameterSet, well_known};
use crate::source::{CompositionSlot, ShaderMixinSource};
use crate::storage::{ContentStorage, SourceHash};

/// Backend assembling fragment sources into one flat text module.
pub struct SourceAssemblerBackend {
    storage: Arc<dyn ContentStorage>,
}

impl SourceAssemblerBackend {
    #[must_use]
    pub fn new(storage: Arc<dyn ContentStorage>) -> Self {
        Self { storage }
    }

    fn assemble_node(&self, node: &ShaderMixinSource, out: &mut String, log: &mut EffectLog) {
        for (name, value) in node.macros().iter_strings() {
            let _ = writeln!(out, "#define {name} {value}");
        }

        for class in node.mixins() {
            let path = class.class_name_str();
            match self.storage.read(path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        let _ = write!(out, "// fragment: {path}");
                        for arg in class.args() {
                            let _ = write!(out, " {arg}");
                        }
                        out.push('\n');
                        out.push_str(&text);
                        if !text.ends_with('\n') {
                            out.push('\n');
                        }
                    }
                    Err(_) => log.error_at("fragment source is not valid UTF-8", path),
                },
                Err(_) => log.error_at("fragment source not found in storage", path),
            }
        }

        for (slot, value) in node.compositions() {
            match value {
                CompositionSlot::Single(child) => {
                    let _ = writeln!(out, "// slot: {slot}");
                    self.assemble_node(child, out, log);
                }
                CompositionSlot::Array(children) => {
                    for (index, child) in children.iter().enumerate() {
                        let _ = writeln!(out, "// slot: {slot}[{index}]");
                        self.assemble_node(child, out, log);
                    }
                }
            }
        }
    }
}

impl EffectBackend for SourceAssemblerBackend {
    fn compile(&self, mixin: &ShaderMixinSource, parameters: &ParameterSet) -> BackendResult {
        let mut log = EffectLog::new();
        let mut out = String::new();

        let platform = parameters
            .peek(&well_known::PLATFORM)
            .unwrap_or_default();
        let profile = parameters.peek(&well_known::PROFILE).unwrap_or_default();
        let _ = writeln!(out, "// module: {}", mixin.name_str());
        let _ = writeln!(out, "// target: {platform} {profile}");
        if parameters.peek(&well_known::DEBUG).unwrap_or(false) {
            let _ = writeln!(out, "#define WEFT_DEBUG 1");
        }

        self.assemble_node(mixin, &mut out, &mut log);

        if log.has_errors() {
            BackendResult::Done(CompiledOutcome::failed(log))
        } else {
            BackendResult::Done(CompiledOutcome {
                bytecode: Some(Arc::new(EffectBytecode::new(out.into_bytes()))),
                log,
            })
        }
    }

    fn shader_source_hash(&self, fragment: &str) -> SourceHash {
        self.storage.content_hash(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ShaderClassSource;
    use crate::storage::MemoryStorage;

    fn storage_with(entries: &[(&str, &str)]) -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        for (path, text) in entries {
            storage.insert(path, *text);
        }
        storage
    }

    #[test]
    fn test_assembles_fragments_in_mix_order() {
        let storage = storage_with(&[("A", "code_a();"), ("B", "code_b();")]);
        let backend = SourceAssemblerBackend::new(storage);

        let mut tree = ShaderMixinSource::new("Module");
        tree.add_mixin(ShaderClassSource::new("A"));
        tree.add_mixin(ShaderClassSource::new("B"));
        tree.add_macro("MAX_LIGHTS", "4");

        let BackendResult::Done(outcome) = backend.compile(&tree, &ParameterSet::new()) else {
            panic!("assembler is synchronous");
        };
        let text = String::from_utf8(outcome.bytecode.unwrap().data().to_vec()).unwrap();

        assert!(text.contains("#define MAX_LIGHTS 4"));
        let a = text.find("code_a();").unwrap();
        let b = text.find("code_b();").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_missing_fragment_is_logged_not_thrown() {
        let storage = storage_with(&[]);
        let backend = SourceAssemblerBackend::new(storage);

        let mut tree = ShaderMixinSource::new("Module");
        tree.add_mixin(ShaderClassSource::new("Missing"));

        let BackendResult::Done(outcome) = backend.compile(&tree, &ParameterSet::new()) else {
            panic!("assembler is synchronous");
        };
        assert!(outcome.bytecode.is_none());
        assert!(outcome.log.has_errors());
        let entry = outcome.log.iter().next().unwrap();
        assert_eq!(entry.location.as_deref(), Some("Missing"));
    }

    #[test]
    fn test_source_hash_delegates_to_storage() {
        let storage = storage_with(&[("Frag", "body")]);
        let expected = storage.content_hash("Frag");
        let backend = SourceAssemblerBackend::new(storage);

        assert_eq!(backend.shader_source_hash("Frag"), expected);
        assert!(backend.shader_source_hash("Other").is_zero());
    }
}
