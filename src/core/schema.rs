//! Graph type declarations.
//!
//! Transformers declare the node types they create through [`SchemaApi`].
//! Declarations are additive: declaring a type twice merges its parent types
//! and fields. Conflicting field types are not detected.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A field of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    /// Field type in SDL notation (e.g. "String", "ID!")
    #[serde(rename = "type")]
    pub ty: String,
}

/// A node type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,

    /// Let the host infer fields not declared here
    #[serde(default)]
    pub infer: bool,

    /// Types allowed as parent of this type
    #[serde(default)]
    pub child_of: Vec<String>,

    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl TypeDef {
    /// A node type with just an `id: ID!` field.
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            infer: false,
            child_of: Vec::new(),
            fields: vec![FieldDef {
                name: "id".to_string(),
                ty: "ID!".to_string(),
            }],
        }
    }

    pub fn inferred(mut self) -> Self {
        self.infer = true;
        self
    }

    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        if !self.child_of.contains(&parent) {
            self.child_of.push(parent);
        }
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    fn merge(&mut self, other: TypeDef) {
        self.infer |= other.infer;
        for parent in other.child_of {
            if !self.child_of.contains(&parent) {
                self.child_of.push(parent);
            }
        }
        for field in other.fields {
            if !self.fields.iter().any(|f| f.name == field.name) {
                self.fields.push(field);
            }
        }
    }

    /// Render as an SDL type definition.
    pub fn to_sdl(&self) -> String {
        let mut out = format!("type {} implements Node", self.name);
        if self.infer {
            out.push_str(" @infer");
        }
        if !self.child_of.is_empty() {
            let parents: Vec<String> = self.child_of.iter().map(|p| format!("\"{}\"", p)).collect();
            out.push_str(&format!(" @childOf(types: [{}])", parents.join(", ")));
        }
        out.push_str(" {\n");
        for field in &self.fields {
            out.push_str(&format!("  {}: {}\n", field.name, field.ty));
        }
        out.push('}');
        out
    }
}

/// Host mechanism for declaring node types.
pub trait SchemaApi: Send {
    fn create_types(&mut self, defs: Vec<TypeDef>) -> Result<()>;
}

/// In-memory [`SchemaApi`] recording declarations in order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: Vec<TypeDef>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// All declarations as one SDL document.
    pub fn to_sdl(&self) -> String {
        self.types
            .iter()
            .map(TypeDef::to_sdl)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl SchemaApi for SchemaRegistry {
    fn create_types(&mut self, defs: Vec<TypeDef>) -> Result<()> {
        for def in defs {
            match self.types.iter_mut().find(|t| t.name == def.name) {
                Some(existing) => existing.merge(def),
                None => self.types.push(def),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_def_sdl() {
        let def = TypeDef::node("MdxThumbnail")
            .inferred()
            .child_of("Mdx")
            .field("url", "String");

        assert_eq!(
            def.to_sdl(),
            "type MdxThumbnail implements Node @infer @childOf(types: [\"Mdx\"]) {\n  id: ID!\n  url: String\n}"
        );
    }

    #[test]
    fn test_registry_merges_duplicates() {
        let mut registry = SchemaRegistry::new();
        registry
            .create_types(vec![TypeDef::node("File").inferred().child_of("A")])
            .unwrap();
        registry
            .create_types(vec![TypeDef::node("File").inferred().child_of("B")])
            .unwrap();

        assert_eq!(registry.types().len(), 1);
        let file = registry.get("File").unwrap();
        assert_eq!(file.child_of, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(file.fields.len(), 1);
    }
}
