//! Classes, methods and fields as the debugger caches them.
//!
//! A [ClassInfo] is created in an unloaded state (identity only) when the class shows up in the
//! bulk startup listing or in a CLASS_PREPARE event. Its membership loads lazily, once, on first
//! access, and stays immutable until a CLASS_UNLOAD removes the whole entry from the cache.

use crate::debugger::DebuggerInner;
use crate::error::DebugError;
use jdwp_client::commands::{class_type, method, reference_type};
use jdwp_client::JdwpError;
use jdwp_types::{FieldId, Int, MethodId, ReferenceTypeId, TypeTag};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{trace, warn};

/// A declared field
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub field_id: FieldId,
    pub name: String,
    pub signature: String,
    pub mod_bits: Int,
}

/// A declared method, with its bytecode cached after the first fetch
#[derive(Debug)]
pub struct MethodInfo {
    pub method_id: MethodId,
    pub name: String,
    pub signature: String,
    pub mod_bits: Int,
    pub(crate) bytecode: OnceCell<Arc<Vec<u8>>>,
}

impl MethodInfo {
    /// The `(name, signature)` pair that identifies this method within its class
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.signature.clone())
    }

    /// The cached bytecode, if it has been fetched
    pub fn bytecode(&self) -> Option<Arc<Vec<u8>>> {
        self.bytecode.get().cloned()
    }
}

/// The lazily-loaded membership of a class: methods, the safe/unsafe field partition, and the
/// superclass link (a typeID, never an owning reference)
#[derive(Debug, Default)]
pub struct ClassMembers {
    methods: Vec<Arc<MethodInfo>>,
    methods_by_id: HashMap<MethodId, Arc<MethodInfo>>,
    methods_by_key: HashMap<(String, String), Arc<MethodInfo>>,
    fields: Vec<Arc<FieldInfo>>,
    fields_by_id: HashMap<FieldId, Arc<FieldInfo>>,
    fields_by_key: HashMap<(String, String), Arc<FieldInfo>>,
    unsafe_fields_by_id: HashMap<FieldId, Arc<FieldInfo>>,
    unsafe_fields_by_name: HashMap<String, Arc<FieldInfo>>,
    super_class: Option<ReferenceTypeId>,
}

impl ClassMembers {
    /// Declared methods in declaration order
    pub fn methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    pub fn method_by_id(&self, id: MethodId) -> Option<&Arc<MethodInfo>> {
        self.methods_by_id.get(&id)
    }

    pub fn method_by_key(&self, name: &str, signature: &str) -> Option<&Arc<MethodInfo>> {
        self.methods_by_key
            .get(&(name.to_string(), signature.to_string()))
    }

    /// Declared fields in declaration order, unsafe ones excluded
    pub fn fields(&self) -> &[Arc<FieldInfo>] {
        &self.fields
    }

    pub fn field_by_id(&self, id: FieldId) -> Option<&Arc<FieldInfo>> {
        self.fields_by_id.get(&id)
    }

    pub fn field_by_key(&self, name: &str, signature: &str) -> Option<&Arc<FieldInfo>> {
        self.fields_by_key
            .get(&(name.to_string(), signature.to_string()))
    }

    /// Whether `name` names a field that must never be dereferenced
    pub fn is_unsafe_field(&self, name: &str) -> bool {
        self.unsafe_fields_by_name.contains_key(name)
    }

    /// The fields segregated as crash-prone, for display only
    pub fn unsafe_fields(&self) -> impl Iterator<Item = &Arc<FieldInfo>> {
        self.unsafe_fields_by_id.values()
    }

    /// The immediate superclass, if any
    pub fn super_class(&self) -> Option<ReferenceTypeId> {
        self.super_class
    }
}

/// One reference type known to the VM.
///
/// Identity fields are fixed at creation; membership is a load-once cell.
#[derive(Debug)]
pub struct ClassInfo {
    type_id: ReferenceTypeId,
    ref_type_tag: TypeTag,
    signature: String,
    generic: Option<String>,
    members: OnceCell<ClassMembers>,
}

/// Dereferencing these crashes the VM, so they are kept apart from regular fields.
fn is_unsafe_field(class_signature: &str, field_signature: &str) -> bool {
    class_signature.contains("java/lang/Thread")
        && (field_signature.contains("ExceptionHandler")
            || field_signature.contains("java/lang/RuntimePermission"))
}

impl ClassInfo {
    pub(crate) fn new(
        type_id: ReferenceTypeId,
        ref_type_tag: TypeTag,
        signature: String,
        generic: Option<String>,
    ) -> Self {
        Self {
            type_id,
            ref_type_tag,
            signature,
            generic,
            members: OnceCell::new(),
        }
    }

    pub fn type_id(&self) -> ReferenceTypeId {
        self.type_id
    }

    pub fn ref_type_tag(&self) -> TypeTag {
        self.ref_type_tag
    }

    /// The JNI signature, `Lsome/pkg/Name;`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn generic(&self) -> Option<&str> {
        self.generic.as_deref()
    }

    /// The membership, if it has been loaded
    pub fn members(&self) -> Option<&ClassMembers> {
        self.members.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.members.get().is_some()
    }

    /// Loads methods, fields and the superclass id, idempotently. The full superclass chain is
    /// the caller's business ([crate::Debugger::class_info] walks it).
    pub(crate) async fn load(&self, dbg: &DebuggerInner) -> Result<&ClassMembers, DebugError> {
        self.members
            .get_or_try_init(|| self.fetch_members(dbg))
            .await
    }

    async fn fetch_members(&self, dbg: &DebuggerInner) -> Result<ClassMembers, DebugError> {
        trace!("loading members of {}", self.signature);
        let mut members = ClassMembers::default();

        let declared = match dbg
            .client()
            .send(reference_type::Methods {
                ref_type: self.type_id,
            })
            .await
        {
            Ok(reply) => reply.declared,
            Err(e @ JdwpError::Protocol { .. }) => {
                warn!("could not list methods of {}: {e}", self.signature);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        for entry in declared {
            let info = Arc::new(MethodInfo {
                method_id: entry.method_id,
                name: entry.name,
                signature: entry.signature,
                mod_bits: entry.mod_bits,
                bytecode: OnceCell::new(),
            });
            members.methods_by_id.insert(info.method_id, info.clone());
            members.methods_by_key.insert(info.key(), info.clone());
            members.methods.push(info);
        }

        let declared = match dbg
            .client()
            .send(reference_type::Fields {
                ref_type: self.type_id,
            })
            .await
        {
            Ok(reply) => reply.declared,
            Err(e @ JdwpError::Protocol { .. }) => {
                warn!("could not list fields of {}: {e}", self.signature);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        for entry in declared {
            let info = Arc::new(FieldInfo {
                field_id: entry.field_id,
                name: entry.name,
                signature: entry.signature,
                mod_bits: entry.mod_bits,
            });
            if is_unsafe_field(&self.signature, &info.signature) {
                members.unsafe_fields_by_id.insert(info.field_id, info.clone());
                members
                    .unsafe_fields_by_name
                    .insert(info.name.clone(), info);
            } else {
                members.fields_by_id.insert(info.field_id, info.clone());
                members
                    .fields_by_key
                    .insert((info.name.clone(), info.signature.clone()), info.clone());
                members.fields.push(info);
            }
        }

        members.super_class = if self.ref_type_tag == TypeTag::Class {
            match dbg
                .client()
                .send(class_type::Superclass {
                    class: self.type_id.retag::<jdwp_types::Class>(),
                })
                .await
            {
                Ok(reply) if !reply.superclass.is_null() => {
                    Some(reply.superclass.retag())
                }
                Ok(_) => None,
                Err(e @ JdwpError::Protocol { .. }) => {
                    warn!("could not get superclass of {}: {e}", self.signature);
                    None
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };

        Ok(members)
    }

    /// Fetches and caches the method's bytecode; immutable once fetched
    pub(crate) async fn load_method_bytecode(
        &self,
        dbg: &DebuggerInner,
        method: &Arc<MethodInfo>,
    ) -> Result<Arc<Vec<u8>>, DebugError> {
        let bytecode = method
            .bytecode
            .get_or_try_init(|| async {
                let reply = dbg
                    .client()
                    .send(method::Bytecodes {
                        ref_type: self.type_id,
                        method: method.method_id,
                    })
                    .await?;
                Ok::<_, DebugError>(Arc::new(reply.bytecodes))
            })
            .await?;
        Ok(bytecode.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_field_filter() {
        assert!(is_unsafe_field(
            "Ljava/lang/Thread;",
            "Ljava/lang/Thread$UncaughtExceptionHandler;"
        ));
        assert!(is_unsafe_field(
            "Ljava/lang/Thread;",
            "Ljava/lang/RuntimePermission;"
        ));
        assert!(!is_unsafe_field("Ljava/lang/Thread;", "J"));
        assert!(!is_unsafe_field(
            "Lsh/kau/playground/X;",
            "Ljava/lang/RuntimePermission;"
        ));
    }
}
