//! Dereferenced objects.
//!
//! Java is single inheritance, so an object's storage is a straight line from its concrete class
//! up to Object. A parent and a child can declare fields with the same name that are distinct in
//! memory; flattening them into one map would hide the parent's. Each level therefore keeps its
//! own field map ([SubObjectInfo]) and lookups name the class level they want, which is exactly
//! the shadow-resolution rule the language has.

use crate::debugger::DebuggerInner;
use crate::error::DebugError;
use jdwp_client::commands::object_reference;
use jdwp_client::JdwpError;
use jdwp_types::{FieldId, ObjectId, ReferenceTypeId, Value};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::warn;

/// One inheritance level of a dereferenced object: the class at that level and the values of the
/// fields it declares
#[derive(Debug, Clone)]
pub struct SubObjectInfo {
    class_id: ReferenceTypeId,
    class_signature: String,
    fields: Vec<((FieldId, String), Value)>,
    unsafe_fields: Vec<String>,
}

impl SubObjectInfo {
    pub fn class_id(&self) -> ReferenceTypeId {
        self.class_id
    }

    pub fn class_signature(&self) -> &str {
        &self.class_signature
    }

    /// Field values in declaration order, keyed by `(fieldID, name)`
    pub fn fields(&self) -> &[((FieldId, String), Value)] {
        &self.fields
    }

    /// The first field at this level with the given name
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .iter()
            .find(|((_, field_name), _)| field_name == name)
            .map(|(_, value)| *value)
    }

    fn is_unsafe(&self, name: &str) -> bool {
        self.unsafe_fields.iter().any(|f| f == name)
    }
}

/// The loaded state of an object: its inheritance chain, concrete class first
#[derive(Debug)]
pub struct ObjectGraph {
    subobjects: Vec<SubObjectInfo>,
    by_signature: HashMap<String, usize>,
}

/// A dereferenced VM object.
///
/// Created on first deref and cached for the session; object ids are stable, so entries are never
/// proactively invalidated.
#[derive(Debug)]
pub struct ObjectInfo {
    object_id: ObjectId,
    graph: OnceCell<ObjectGraph>,
}

impl ObjectInfo {
    pub(crate) fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            graph: OnceCell::new(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// The inheritance chain, concrete class first, or `None` while unloaded
    pub fn subobjects(&self) -> Option<&[SubObjectInfo]> {
        self.graph.get().map(|g| g.subobjects.as_slice())
    }

    /// The level contributed by the class with the given signature
    pub fn subobject(&self, class_signature: &str) -> Option<&SubObjectInfo> {
        let graph = self.graph.get()?;
        let index = *graph.by_signature.get(class_signature)?;
        graph.subobjects.get(index)
    }

    /// The value of `name` as declared by `as_class_signature`.
    ///
    /// Shadowed parent fields are reachable by naming the parent's signature.
    pub fn field_value(&self, as_class_signature: &str, name: &str) -> Option<Value> {
        self.subobject(as_class_signature)?.field(name)
    }

    /// Like [ObjectInfo::field_value], but distinguishes "absent" from "refused": fields on the
    /// unsafe list error instead of dereferencing
    pub fn checked_field_value(
        &self,
        as_class_signature: &str,
        name: &str,
    ) -> Result<Value, DebugError> {
        let subobject =
            self.subobject(as_class_signature)
                .ok_or_else(|| DebugError::UnknownClass(as_class_signature.to_string()))?;
        if subobject.is_unsafe(name) {
            return Err(DebugError::UnsafeField {
                class_signature: as_class_signature.to_string(),
                name: name.to_string(),
            });
        }
        subobject.field(name).ok_or_else(|| DebugError::FieldNotFound {
            class_signature: as_class_signature.to_string(),
            name: name.to_string(),
        })
    }

    /// Resolves the object's concrete class and walks the superclass chain, fetching each level's
    /// declared field values. Idempotent; the first load wins.
    pub(crate) async fn load(&self, dbg: &DebuggerInner) -> Result<&ObjectGraph, DebugError> {
        self.graph.get_or_try_init(|| self.fetch_graph(dbg)).await
    }

    async fn fetch_graph(&self, dbg: &DebuggerInner) -> Result<ObjectGraph, DebugError> {
        let concrete = dbg
            .client()
            .send(object_reference::ReferenceType {
                object: self.object_id,
            })
            .await?;

        let mut subobjects = Vec::new();
        let mut by_signature = HashMap::new();
        let mut next = Some(concrete.type_id);
        while let Some(class_id) = next {
            let class = dbg.class_info(class_id).await?;
            let members = class.members().expect("class_info loads members");

            let field_ids: Vec<FieldId> = members.fields().iter().map(|f| f.field_id).collect();
            let values = if field_ids.is_empty() {
                Vec::new()
            } else {
                match dbg
                    .client()
                    .send(object_reference::GetValues {
                        object: self.object_id,
                        fields: field_ids.clone(),
                    })
                    .await
                {
                    Ok(reply) => reply.values,
                    Err(e @ JdwpError::Protocol { .. }) => {
                        warn!(
                            "could not fetch fields of {} as {}: {e}",
                            self.object_id.get(),
                            class.signature()
                        );
                        Vec::new()
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            let fields = members
                .fields()
                .iter()
                .zip(values)
                .map(|(info, value)| ((info.field_id, info.name.clone()), value))
                .collect();
            let level = SubObjectInfo {
                class_id,
                class_signature: class.signature().to_string(),
                fields,
                unsafe_fields: members
                    .unsafe_fields()
                    .map(|f| f.name.clone())
                    .collect(),
            };
            by_signature
                .entry(level.class_signature.clone())
                .or_insert(subobjects.len());
            subobjects.push(level);

            next = members.super_class();
        }

        Ok(ObjectGraph {
            subobjects,
            by_signature,
        })
    }
}

impl Display for ObjectInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some(graph) = self.graph.get() else {
            return write!(f, "ObjectInfo({} [unloaded])", self.object_id.get());
        };
        writeln!(f, "ObjectInfo({})", self.object_id.get())?;
        for level in graph.subobjects.iter().rev() {
            writeln!(
                f,
                "  {} (classID {})",
                level.class_signature,
                level.class_id.get()
            )?;
            for ((_, name), value) in &level.fields {
                writeln!(f, "    - {name} = {value:?}")?;
            }
        }
        Ok(())
    }
}
